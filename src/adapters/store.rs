use crate::adapters::http::{ensure_success, send_with_retry, HttpSettings};
use crate::config::toml_config::StoreConfig;
use crate::core::week::WeekKey;
use crate::domain::model::WeeklyReport;
use crate::domain::ports::ReportStore;
use crate::utils::error::{ReportError, Result};
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};

/// One pretty-printed JSON document per report: `{dir}/{id}.json`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn document_path(&self, id: &str) -> Result<PathBuf> {
        // id 必須是合法的報表 id，避免路徑穿越
        let key: WeekKey = id.parse()?;
        Ok(self.base_path.join(format!("{}.json", key.report_id())))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl ReportStore for LocalStore {
    async fn get(&self, id: &str) -> Result<Option<WeeklyReport>> {
        let path = self.document_path(id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(serde_json::from_slice(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, report: &WeeklyReport) -> Result<()> {
        let path = self.document_path(&report.id)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        let json = serde_json::to_vec_pretty(report)?;
        tokio::fs::write(&path, json).await?;
        tracing::debug!("💾 Wrote {}", path.display());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WeeklyReport>> {
        let mut entries = match tokio::fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reports = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_report = path.extension().and_then(|e| e.to_str()) == Some("json")
                && path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .is_some_and(|stem| stem.parse::<WeekKey>().is_ok());
            if !is_report {
                continue;
            }

            let data = tokio::fs::read(&path).await?;
            reports.push(serde_json::from_slice::<WeeklyReport>(&data)?);
        }

        reports.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(reports)
    }
}

/// Document database over HTTP: `{endpoint}/{collection}/{id}`.
#[derive(Debug, Clone)]
pub struct RestStore {
    endpoint: String,
    collection: String,
    token: Option<String>,
    http: HttpSettings,
    client: Client,
}

impl RestStore {
    const NAME: &'static str = "report-store";

    pub fn new(endpoint: String, collection: String, token: Option<String>, http: HttpSettings) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            collection,
            token,
            http,
            client: Client::new(),
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.endpoint, self.collection)
    }

    fn document_url(&self, id: &str) -> Result<String> {
        let key: WeekKey = id.parse()?;
        Ok(format!("{}/{}", self.collection_url(), key.report_id()))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn store_error(e: ReportError) -> ReportError {
        match e {
            ReportError::SourceError { message, .. } => ReportError::StoreError { message },
            other => other,
        }
    }
}

impl ReportStore for RestStore {
    async fn get(&self, id: &str) -> Result<Option<WeeklyReport>> {
        let url = self.document_url(id)?;
        let response = send_with_retry(Self::NAME, &self.http, || {
            self.authorize(self.client.get(&url))
        })
        .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = ensure_success(Self::NAME, response)
            .await
            .map_err(Self::store_error)?;
        Ok(Some(response.json().await?))
    }

    async fn put(&self, report: &WeeklyReport) -> Result<()> {
        let url = self.document_url(&report.id)?;
        let response = send_with_retry(Self::NAME, &self.http, || {
            self.authorize(self.client.put(&url).json(report))
        })
        .await?;

        ensure_success(Self::NAME, response)
            .await
            .map_err(Self::store_error)?;
        tracing::debug!("💾 Upserted {} to {}", report.id, self.collection);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WeeklyReport>> {
        let url = self.collection_url();
        let response = send_with_retry(Self::NAME, &self.http, || {
            self.authorize(self.client.get(&url))
        })
        .await?;

        let response = ensure_success(Self::NAME, response)
            .await
            .map_err(Self::store_error)?;
        let mut reports: Vec<WeeklyReport> = response.json().await?;
        reports.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(reports)
    }
}

/// Store selected by `[store] type` in the config file.
#[derive(Debug, Clone)]
pub enum AnyStore {
    Local(LocalStore),
    Rest(RestStore),
}

impl AnyStore {
    pub fn from_config(config: &StoreConfig, http: HttpSettings) -> Self {
        match config {
            StoreConfig::Local { path } => AnyStore::Local(LocalStore::new(path)),
            StoreConfig::Rest {
                endpoint,
                collection,
                token,
            } => AnyStore::Rest(RestStore::new(
                endpoint.clone(),
                collection.clone(),
                token.clone(),
                http,
            )),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AnyStore::Local(store) => format!("local:{}", store.base_path().display()),
            AnyStore::Rest(store) => format!("rest:{}", store.collection_url()),
        }
    }
}

impl ReportStore for AnyStore {
    async fn get(&self, id: &str) -> Result<Option<WeeklyReport>> {
        match self {
            AnyStore::Local(store) => store.get(id).await,
            AnyStore::Rest(store) => store.get(id).await,
        }
    }

    async fn put(&self, report: &WeeklyReport) -> Result<()> {
        match self {
            AnyStore::Local(store) => store.put(report).await,
            AnyStore::Rest(store) => store.put(report).await,
        }
    }

    async fn list(&self) -> Result<Vec<WeeklyReport>> {
        match self {
            AnyStore::Local(store) => store.list().await,
            AnyStore::Rest(store) => store.list().await,
        }
    }
}

use crate::adapters::http::{ensure_success, send_with_retry, HttpSettings};
use crate::adapters::rows::ColumnMap;
use crate::config::toml_config::SheetSourceConfig;
use crate::domain::model::SourceBatch;
use crate::domain::ports::ApplicantSource;
use crate::utils::error::{ReportError, Result};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

fn cell_text(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Reads applicants from a spreadsheet values endpoint
/// (`/v4/spreadsheets/{id}/values/{range}`). The first row is the header.
pub struct SheetSource {
    config: SheetSourceConfig,
    http: HttpSettings,
    client: Client,
}

impl SheetSource {
    pub fn new(config: SheetSourceConfig, http: HttpSettings) -> Self {
        Self {
            config,
            http,
            client: Client::new(),
        }
    }

    fn values_url(&self) -> Result<Url> {
        let endpoint = self.config.endpoint();
        let mut url = Url::parse(endpoint).map_err(|e| ReportError::InvalidConfigValueError {
            field: "sources.endpoint".to_string(),
            value: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        url.path_segments_mut()
            .map_err(|_| ReportError::InvalidConfigValueError {
                field: "sources.endpoint".to_string(),
                value: endpoint.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.config.spreadsheet_id.as_str(),
                "values",
                self.config.range.as_str(),
            ]);

        if let Some(key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ApplicantSource for SheetSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let url = self.values_url()?;
        tracing::debug!(
            "📡 {}: reading range '{}' of spreadsheet {}",
            self.config.name,
            self.config.range,
            self.config.spreadsheet_id
        );

        let response = send_with_retry(&self.config.name, &self.http, || {
            self.client.get(url.clone())
        })
        .await?;
        let response = ensure_success(&self.config.name, response).await?;
        let payload: ValuesResponse = response.json().await?;

        let mut rows = payload
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect::<Vec<String>>());

        let Some(header) = rows.next() else {
            tracing::warn!("⚠️ {}: sheet range is empty", self.config.name);
            return Ok(SourceBatch::default());
        };

        let columns = ColumnMap::from_header(&header, &self.config.columns, &self.config.name)?;
        // 第 1 行是標題，資料從第 2 行開始
        let batch = columns.collect_rows(rows, &self.config.name, 2);

        tracing::info!(
            "📄 {}: {} applicants ({} skipped)",
            self.config.name,
            batch.rows.len(),
            batch.skipped
        );
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::toml_config::ColumnConfig;
    use crate::domain::model::ApplicantStatus;
    use httpmock::prelude::*;
    use std::time::Duration;

    fn config(endpoint: String) -> SheetSourceConfig {
        SheetSourceConfig {
            name: "applicants-sheet".to_string(),
            endpoint: Some(endpoint),
            spreadsheet_id: "sheet-1".to_string(),
            range: "Applicants!A1:E".to_string(),
            api_key: Some("test-key".to_string()),
            columns: ColumnConfig::default(),
        }
    }

    fn no_retry() -> HttpSettings {
        HttpSettings {
            timeout: Some(Duration::from_secs(5)),
            retry_attempts: 0,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_values_url() {
        let source = SheetSource::new(config("https://sheets.example.com/".to_string()), no_retry());
        let url = source.values_url().unwrap();
        assert_eq!(url.path(), "/v4/spreadsheets/sheet-1/values/Applicants!A1:E");
        assert_eq!(url.query(), Some("key=test-key"));
    }

    #[tokio::test]
    async fn test_fetch_rows() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path_contains("/v4/spreadsheets/sheet-1/values/")
                .query_param("key", "test-key");
            then.status(200).json_body(serde_json::json!({
                "range": "Applicants!A1:E4",
                "majorDimension": "ROWS",
                "values": [
                    ["Name", "Category", "Status", "Applied"],
                    ["Ada", "Engineering", "Interview", "2025-08-04"],
                    ["Grace", "Design", "Hired", "08/05/2025"],
                    ["Linus", "Kernel", "Applied", "2025-08-05"]
                ]
            }));
        });

        let source = SheetSource::new(config(server.base_url()), no_retry());
        let batch = source.fetch().await.unwrap();

        api_mock.assert();
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.rows[0].status, ApplicantStatus::Interviewing);
        assert_eq!(batch.rows[1].source, "applicants-sheet");
    }

    #[tokio::test]
    async fn test_empty_range_yields_no_rows() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/values/");
            then.status(200).json_body(serde_json::json!({ "range": "Applicants!A1:E" }));
        });

        let source = SheetSource::new(config(server.base_url()), no_retry());
        let batch = source.fetch().await.unwrap();
        assert!(batch.rows.is_empty());
    }

    #[tokio::test]
    async fn test_forbidden_is_a_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path_contains("/values/");
            then.status(403).body("API key not valid");
        });

        let source = SheetSource::new(config(server.base_url()), no_retry());
        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, ReportError::SourceError { .. }));
    }
}

use crate::adapters::http::{ensure_success, send_with_retry, HttpSettings};
use crate::adapters::rows::{fallback_id, parse_date};
use crate::config::toml_config::WikiSourceConfig;
use crate::domain::model::{ApplicantRow, SourceBatch};
use crate::domain::ports::ApplicantSource;
use crate::utils::error::{ReportError, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

/// Upper bound on pages fetched in one sync.
const MAX_PAGES: usize = 200;

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    id: String,
    #[serde(default)]
    properties: Map<String, Value>,
}

fn join_plain_text(parts: &Value) -> Option<String> {
    let text: String = parts
        .as_array()?
        .iter()
        .filter_map(|part| part.get("plain_text").and_then(Value::as_str))
        .collect();
    Some(text)
}

/// Renders a wiki-database property value as plain text.
fn property_text(property: &Value) -> Option<String> {
    let kind = property.get("type").and_then(Value::as_str)?;
    let value = property.get(kind)?;

    let text = match kind {
        "title" | "rich_text" => join_plain_text(value)?,
        "select" | "status" => value.get("name")?.as_str()?.to_string(),
        "multi_select" => value.as_array()?.first()?.get("name")?.as_str()?.to_string(),
        "date" => value.get("start")?.as_str()?.to_string(),
        "created_time" | "email" | "phone_number" | "url" => value.as_str()?.to_string(),
        "number" => value.as_f64().map(|n| n.to_string())?,
        "unique_id" => {
            let number = value.get("number")?.as_i64()?;
            match value.get("prefix").and_then(Value::as_str) {
                Some(prefix) => format!("{}-{}", prefix, number),
                None => number.to_string(),
            }
        }
        "formula" => {
            let inner_kind = value.get("type")?.as_str()?;
            match value.get(inner_kind)? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Object(date) => date.get("start")?.as_str()?.to_string(),
                _ => return None,
            }
        }
        _ => return None,
    };

    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Reads applicants from a wiki database query endpoint
/// (`/v1/databases/{id}/query`), following `next_cursor` pagination.
pub struct WikiSource {
    config: WikiSourceConfig,
    http: HttpSettings,
    client: Client,
    max_pages: usize,
}

impl WikiSource {
    pub fn new(config: WikiSourceConfig, http: HttpSettings) -> Self {
        Self {
            config,
            http,
            client: Client::new(),
            max_pages: MAX_PAGES,
        }
    }

    fn query_url(&self) -> String {
        format!(
            "{}/v1/databases/{}/query",
            self.config.endpoint().trim_end_matches('/'),
            self.config.database_id
        )
    }

    fn page_to_row(&self, page: &Page) -> Result<ApplicantRow> {
        let columns = &self.config.properties;
        let prop = |name: &str, field: &str| {
            page.properties
                .get(name)
                .and_then(property_text)
                .ok_or_else(|| ReportError::ValidationError {
                    message: format!("page {} has no {} ('{}')", page.id, field, name),
                })
        };

        let name = prop(columns.name_column(), "name")?;
        let category = prop(columns.category_column(), "category")?.parse()?;
        let status = prop(columns.status_column(), "status")?.parse()?;
        let applied_on = parse_date(&prop(columns.applied_column(), "applied date")?)?;

        // 沒有設定 id 欄位時：用姓名+日期，讓同一人在試算表與 wiki 只算一次
        let id = match columns.id_column() {
            Some(id_prop) => prop(id_prop, "id")?,
            None => fallback_id(&name, applied_on),
        };

        Ok(ApplicantRow {
            id,
            name,
            category,
            status,
            applied_on,
            source: self.config.name.clone(),
        })
    }

    async fn query_page(&self, cursor: Option<&str>) -> Result<QueryResponse> {
        let mut body = json!({ "page_size": self.config.page_size() });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }

        let url = self.query_url();
        let response = send_with_retry(&self.config.name, &self.http, || {
            self.client
                .post(&url)
                .bearer_auth(&self.config.token)
                .header("Notion-Version", self.config.api_version())
                .json(&body)
        })
        .await?;
        let response = ensure_success(&self.config.name, response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl ApplicantSource for WikiSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        let mut batch = SourceBatch::default();
        let mut cursor: Option<String> = None;

        for page_number in 1..=self.max_pages {
            tracing::debug!("📡 {}: querying page {}", self.config.name, page_number);
            let response = self.query_page(cursor.as_deref()).await?;

            for page in &response.results {
                match self.page_to_row(page) {
                    Ok(row) => batch.rows.push(row),
                    Err(e) => {
                        tracing::warn!("⚠️ {}: skipping page: {}", self.config.name, e);
                        batch.skipped += 1;
                    }
                }
            }

            cursor = match (response.has_more, response.next_cursor) {
                (true, Some(next)) => Some(next),
                _ => break,
            };

            if page_number == self.max_pages {
                tracing::warn!(
                    "⚠️ {}: stopped after {} pages, results are incomplete",
                    self.config.name,
                    self.max_pages
                );
            }
        }

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
    use crate::domain::model::{ApplicantStatus, JobCategory};
    use httpmock::prelude::*;
    use std::time::Duration;

    fn page(id: &str, name: &str, category: &str, status: &str, applied: &str) -> Value {
        json!({
            "object": "page",
            "id": id,
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": name }] },
                "Category": { "type": "select", "select": { "name": category } },
                "Status": { "type": "status", "status": { "name": status } },
                "Applied": { "type": "date", "date": { "start": applied, "end": null } },
                "Ref": { "type": "unique_id", "unique_id": { "prefix": "APP", "number": 7 } }
            }
        })
    }

    fn source(endpoint: String, id_property: Option<&str>) -> WikiSource {
        WikiSource::new(
            WikiSourceConfig {
                name: "wiki-applicants".to_string(),
                endpoint: Some(endpoint),
                database_id: "db-1".to_string(),
                token: "secret-token".to_string(),
                api_version: None,
                page_size: Some(2),
                properties: ColumnConfig {
                    id: id_property.map(str::to_string),
                    ..ColumnConfig::default()
                },
            },
            HttpSettings {
                timeout: Some(Duration::from_secs(5)),
                retry_attempts: 0,
                retry_delay: Duration::from_millis(1),
            },
        )
    }

    #[test]
    fn test_property_text_variants() {
        let title = json!({ "type": "title", "title": [{ "plain_text": "Ada " }, { "plain_text": "Lovelace" }] });
        assert_eq!(property_text(&title).as_deref(), Some("Ada Lovelace"));

        let empty_select = json!({ "type": "select", "select": null });
        assert_eq!(property_text(&empty_select), None);

        let formula = json!({ "type": "formula", "formula": { "type": "string", "string": "Sales" } });
        assert_eq!(property_text(&formula).as_deref(), Some("Sales"));

        let id = json!({ "type": "unique_id", "unique_id": { "prefix": null, "number": 42 } });
        assert_eq!(property_text(&id).as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_fetch_follows_cursor() {
        let server = MockServer::start();

        let second = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/databases/db-1/query")
                .json_body(json!({ "page_size": 2, "start_cursor": "cursor-2" }));
            then.status(200).json_body(json!({
                "results": [page("p3", "Linus", "Astronomy", "Applied", "2025-08-06")],
                "has_more": false,
                "next_cursor": null
            }));
        });

        let first = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/databases/db-1/query")
                .header("Authorization", "Bearer secret-token")
                .header("Notion-Version", "2022-06-28")
                .json_body(json!({ "page_size": 2 }));
            then.status(200).json_body(json!({
                "results": [
                    page("p1", "Ada", "Engineering", "Interview", "2025-08-04"),
                    page("p2", "Grace", "Product", "Offer", "2025-08-05T10:00:00.000+00:00")
                ],
                "has_more": true,
                "next_cursor": "cursor-2"
            }));
        });

        let batch = source(server.base_url(), None).fetch().await.unwrap();

        first.assert();
        second.assert();
        // p3 has an unknown category
        assert_eq!(batch.rows.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.rows[0].status, ApplicantStatus::Interviewing);
        assert_eq!(batch.rows[1].id, "grace|2025-08-05");
        assert_eq!(batch.rows[1].category, JobCategory::Product);
        assert_eq!(batch.rows[1].status, ApplicantStatus::Offered);
    }

    #[tokio::test]
    async fn test_id_property() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/databases/db-1/query");
            then.status(200).json_body(json!({
                "results": [page("p1", "Ada", "Engineering", "Screening", "2025-08-04")],
                "has_more": false
            }));
        });

        let batch = source(server.base_url(), Some("Ref")).fetch().await.unwrap();
        assert_eq!(batch.rows[0].id, "APP-7");
    }

    #[tokio::test]
    async fn test_unauthorized_is_a_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/databases/db-1/query");
            then.status(401).json_body(json!({ "code": "unauthorized" }));
        });

        let err = source(server.base_url(), None).fetch().await.unwrap_err();
        assert!(matches!(err, ReportError::SourceError { .. }));
    }

    #[tokio::test]
    async fn test_pagination_stops_at_page_cap() {
        let server = MockServer::start();
        let query = server.mock(|when, then| {
            when.method(POST).path("/v1/databases/db-1/query");
            then.status(200).json_body(json!({
                "results": [page("p1", "Ada", "Engineering", "Applied", "2025-08-04")],
                "has_more": true,
                "next_cursor": "cursor-next"
            }));
        });

        let mut wiki = source(server.base_url(), None);
        assert_eq!(wiki.max_pages, 200);
        wiki.max_pages = 3;

        let batch = wiki.fetch().await.unwrap();
        assert_eq!(query.hits(), 3);
        assert_eq!(batch.rows.len(), 3);
    }
}

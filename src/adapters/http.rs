use crate::config::toml_config::HttpConfig;
use crate::utils::error::{ReportError, Result};
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout: Option<Duration>,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            retry_attempts: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl From<&HttpConfig> for HttpSettings {
    fn from(config: &HttpConfig) -> Self {
        let defaults = HttpSettings::default();
        Self {
            timeout: config
                .timeout_seconds
                .map(Duration::from_secs)
                .or(defaults.timeout),
            retry_attempts: config.retry_attempts.unwrap_or(defaults.retry_attempts),
            retry_delay: config
                .retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_delay),
        }
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Sends the request built by `build`, retrying transport errors, 429 and
/// 5xx responses. Any other response is returned as-is for the caller to
/// inspect.
pub async fn send_with_retry<F>(name: &str, settings: &HttpSettings, build: F) -> Result<Response>
where
    F: Fn() -> RequestBuilder,
{
    let mut attempt = 0;
    loop {
        let mut request = build();
        if let Some(timeout) = settings.timeout {
            request = request.timeout(timeout);
        }

        let can_retry = attempt < settings.retry_attempts;
        match request.send().await {
            Ok(response) if is_retryable(response.status()) && can_retry => {
                tracing::warn!(
                    "🔁 {}: HTTP {} (attempt {}/{}), retrying",
                    name,
                    response.status(),
                    attempt + 1,
                    settings.retry_attempts + 1
                );
            }
            Ok(response) => return Ok(response),
            Err(e) if can_retry && (e.is_timeout() || e.is_connect()) => {
                tracing::warn!(
                    "🔁 {}: {} (attempt {}/{}), retrying",
                    name,
                    e,
                    attempt + 1,
                    settings.retry_attempts + 1
                );
            }
            Err(e) => return Err(e.into()),
        }

        attempt += 1;
        tokio::time::sleep(settings.retry_delay).await;
    }
}

/// Turns a non-2xx response into a `SourceError` carrying the body.
pub async fn ensure_success(name: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    Err(ReportError::SourceError {
        source_name: name.to_string(),
        message: format!("HTTP {}: {}", status, snippet),
    })
}

use crate::core::aggregate::ReportMonth;
use crate::utils::error::{ReportError, Result};
use crate::utils::validation::{
    validate_no_unresolved_env, validate_non_empty_string, validate_path, validate_range,
    validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com";
pub const DEFAULT_WIKI_ENDPOINT: &str = "https://api.notion.com";
pub const DEFAULT_WIKI_API_VERSION: &str = "2022-06-28";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub report: ReportConfig,
    pub window: WindowConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    pub store: StoreConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    pub year: i32,
    pub months: Vec<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    pub timeout_seconds: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

/// Header names (sheet/CSV) or property names (wiki) for each field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    pub applied: Option<String>,
}

impl ColumnConfig {
    pub fn id_column(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn name_column(&self) -> &str {
        self.name.as_deref().unwrap_or("Name")
    }

    pub fn category_column(&self) -> &str {
        self.category.as_deref().unwrap_or("Category")
    }

    pub fn status_column(&self) -> &str {
        self.status.as_deref().unwrap_or("Status")
    }

    pub fn applied_column(&self) -> &str {
        self.applied.as_deref().unwrap_or("Applied")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    Sheet(SheetSourceConfig),
    Csv(CsvSourceConfig),
    Wiki(WikiSourceConfig),
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Sheet(c) => &c.name,
            SourceConfig::Csv(c) => &c.name,
            SourceConfig::Wiki(c) => &c.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Sheet(_) => "sheet",
            SourceConfig::Csv(_) => "csv",
            SourceConfig::Wiki(_) => "wiki",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSourceConfig {
    pub name: String,
    pub endpoint: Option<String>,
    pub spreadsheet_id: String,
    pub range: String,
    pub api_key: Option<String>,
    #[serde(default)]
    pub columns: ColumnConfig,
}

impl SheetSourceConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_SHEETS_ENDPOINT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvSourceConfig {
    pub name: String,
    pub path: String,
    pub delimiter: Option<char>,
    #[serde(default)]
    pub columns: ColumnConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiSourceConfig {
    pub name: String,
    pub endpoint: Option<String>,
    pub database_id: String,
    pub token: String,
    pub api_version: Option<String>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub properties: ColumnConfig,
}

impl WikiSourceConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or(DEFAULT_WIKI_ENDPOINT)
    }

    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_WIKI_API_VERSION)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(100)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    Local {
        path: String,
    },
    Rest {
        endpoint: String,
        collection: String,
        token: Option<String>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `compact` (default) or `json`
    pub format: Option<String>,
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReportError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReportError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SHEETS_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReportError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn months(&self) -> Result<Vec<ReportMonth>> {
        let mut months = self
            .window
            .months
            .iter()
            .map(|m| ReportMonth::new(self.window.year, *m))
            .collect::<Result<Vec<_>>>()?;
        months.sort();
        months.dedup();
        Ok(months)
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("report.name", &self.report.name)?;

        if self.window.months.is_empty() {
            return Err(ReportError::MissingConfigError {
                field: "window.months".to_string(),
            });
        }
        for month in &self.window.months {
            validate_range("window.months", *month, 1, 12)?;
        }
        self.months()?;

        if let Some(retries) = self.http.retry_attempts {
            validate_range("http.retry_attempts", retries, 0, 10)?;
        }
        if let Some(timeout) = self.http.timeout_seconds {
            validate_range("http.timeout_seconds", timeout, 1, 600)?;
        }

        let mut names = std::collections::HashSet::new();
        for source in &self.sources {
            validate_non_empty_string("sources.name", source.name())?;
            if !names.insert(source.name()) {
                return Err(ReportError::InvalidConfigValueError {
                    field: "sources.name".to_string(),
                    value: source.name().to_string(),
                    reason: "Source names must be unique".to_string(),
                });
            }
            validate_source(source)?;
        }

        match &self.store {
            StoreConfig::Local { path } => validate_path("store.path", path)?,
            StoreConfig::Rest {
                endpoint,
                collection,
                token,
            } => {
                validate_url("store.endpoint", endpoint)?;
                validate_non_empty_string("store.collection", collection)?;
                if let Some(token) = token {
                    validate_no_unresolved_env("store.token", token)?;
                }
            }
        }

        Ok(())
    }
}

fn validate_source(source: &SourceConfig) -> Result<()> {
    match source {
        SourceConfig::Sheet(c) => {
            validate_url("sources.endpoint", c.endpoint())?;
            validate_non_empty_string("sources.spreadsheet_id", &c.spreadsheet_id)?;
            validate_non_empty_string("sources.range", &c.range)?;
            if let Some(key) = &c.api_key {
                validate_no_unresolved_env("sources.api_key", key)?;
            }
        }
        SourceConfig::Csv(c) => validate_path("sources.path", &c.path)?,
        SourceConfig::Wiki(c) => {
            validate_url("sources.endpoint", c.endpoint())?;
            validate_non_empty_string("sources.database_id", &c.database_id)?;
            validate_non_empty_string("sources.token", &c.token)?;
            validate_no_unresolved_env("sources.token", &c.token)?;
            validate_range("sources.page_size", c.page_size(), 1, 100)?;
        }
    }
    Ok(())
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[report]
name = "hiring-weekly"

[window]
year = 2025
months = [8, 6, 8]

[[sources]]
type = "sheet"
name = "applicants-sheet"
spreadsheet_id = "sheet-1"
range = "Applicants!A1:E"
api_key = "abc"

[sources.columns]
applied = "Applied On"

[[sources]]
type = "wiki"
name = "referrals"
database_id = "db-1"
token = "secret"

[store]
type = "local"
path = "./reports"
"#;

    #[test]
    fn test_parse_basic_config() {
        let config = SyncConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.report.name, "hiring-weekly");
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].kind(), "sheet");
        match &config.sources[0] {
            SourceConfig::Sheet(sheet) => {
                assert_eq!(sheet.endpoint(), DEFAULT_SHEETS_ENDPOINT);
                assert_eq!(sheet.columns.applied_column(), "Applied On");
                assert_eq!(sheet.columns.name_column(), "Name");
            }
            other => panic!("unexpected source {:?}", other),
        }
        match &config.sources[1] {
            SourceConfig::Wiki(wiki) => {
                assert_eq!(wiki.api_version(), DEFAULT_WIKI_API_VERSION);
                assert_eq!(wiki.page_size(), 100);
            }
            other => panic!("unexpected source {:?}", other),
        }

        let months = config.months().unwrap();
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].to_string(), "2025-06");
        assert!(config.validate().is_ok());
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("RW_TEST_WIKI_TOKEN", "from-env");

        let content = BASIC.replace("token = \"secret\"", "token = \"${RW_TEST_WIKI_TOKEN}\"");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        match &config.sources[1] {
            SourceConfig::Wiki(wiki) => assert_eq!(wiki.token, "from-env"),
            other => panic!("unexpected source {:?}", other),
        }

        std::env::remove_var("RW_TEST_WIKI_TOKEN");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let content = BASIC.replace("api_key = \"abc\"", "api_key = \"${RW_TEST_SURELY_UNSET}\"");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ReportError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_invalid_month_fails_validation() {
        let content = BASIC.replace("months = [8, 6, 8]", "months = [13]");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_source_names_fail_validation() {
        let content = BASIC.replace("name = \"referrals\"", "name = \"applicants-sheet\"");
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ReportError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_rest_store_config() {
        let content = BASIC.replace(
            "type = \"local\"\npath = \"./reports\"",
            "type = \"rest\"\nendpoint = \"https://docs.example.com/api\"\ncollection = \"weekly_reports\"",
        );
        let config = SyncConfig::from_toml_str(&content).unwrap();
        assert!(matches!(config.store, StoreConfig::Rest { .. }));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = SyncConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.report.name, "hiring-weekly");
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Source '{source_name}' failed: {message}")]
    SourceError { source_name: String, message: String },

    #[error("Report store error: {message}")]
    StoreError { message: String },

    #[error("Report not found: {id}")]
    ReportNotFound { id: String },

    #[error("Invalid report id: {0}")]
    InvalidReportId(String),

    #[error("Invalid week number {week}: must be between 1 and {max}")]
    InvalidWeekNumber { week: u32, max: u32 },

    #[error("Invalid month {0}: must be between 1 and 12")]
    InvalidMonth(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown job category: {0}")]
    UnknownCategory(String),

    #[error("Unknown applicant status: {0}")]
    UnknownStatus(String),

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    Calendar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReportError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReportError::ApiError(_) | ReportError::SourceError { .. } => ErrorCategory::Network,
            ReportError::ConfigError { .. }
            | ReportError::MissingConfigError { .. }
            | ReportError::InvalidConfigValueError { .. }
            | ReportError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            ReportError::IoError(_)
            | ReportError::StoreError { .. }
            | ReportError::ReportNotFound { .. } => ErrorCategory::Storage,
            ReportError::InvalidWeekNumber { .. }
            | ReportError::InvalidMonth(_)
            | ReportError::InvalidDate(_)
            | ReportError::InvalidReportId(_) => ErrorCategory::Calendar,
            ReportError::CsvError(_)
            | ReportError::SerializationError(_)
            | ReportError::UnknownCategory(_)
            | ReportError::UnknownStatus(_)
            | ReportError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路問題通常可以重試
            ReportError::ApiError(_) | ReportError::SourceError { .. } => ErrorSeverity::Medium,
            ReportError::StoreError { .. } => ErrorSeverity::Medium,
            ReportError::ReportNotFound { .. } => ErrorSeverity::Low,
            ReportError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.category() {
            ErrorCategory::Network => {
                "Check network connectivity and source credentials, then re-run the sync".to_string()
            }
            ErrorCategory::Configuration => {
                "Review the TOML configuration file and required environment variables".to_string()
            }
            ErrorCategory::Storage => match self {
                ReportError::ReportNotFound { .. } => {
                    "Run `sync` for that month first, or list reports with `report`".to_string()
                }
                _ => "Check that the report store is reachable and writable".to_string(),
            },
            ErrorCategory::Calendar => {
                "Use a month between 1 and 12 and a week listed by the `weeks` command".to_string()
            }
            ErrorCategory::Data => {
                "Inspect the source rows for unexpected categories, statuses or dates".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReportError::ApiError(e) if e.is_timeout() => {
                "The data source did not respond in time".to_string()
            }
            ReportError::ApiError(_) => "Could not reach a data source".to_string(),
            ReportError::SourceError { source_name, .. } => {
                format!("Could not read applicants from '{}'", source_name)
            }
            ReportError::ReportNotFound { id } => format!("No report stored under '{}'", id),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calendar_errors_are_high_severity() {
        let err = ReportError::InvalidWeekNumber { week: 9, max: 6 };
        assert_eq!(err.category(), ErrorCategory::Calendar);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(
            err.to_string(),
            "Invalid week number 9: must be between 1 and 6"
        );
    }

    #[test]
    fn test_missing_report_is_low_severity() {
        let err = ReportError::ReportNotFound {
            id: "2025-08-W02".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert!(err.user_friendly_message().contains("2025-08-W02"));
        assert!(err.recovery_suggestion().contains("sync"));
    }

    #[test]
    fn test_source_errors_are_retryable() {
        let err = ReportError::SourceError {
            source_name: "applicants-sheet".to_string(),
            message: "HTTP 503".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }
}

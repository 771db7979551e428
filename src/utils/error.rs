use thiserror::Error;

#[derive(Error, Debug)]
pub enum HawkeyeError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Superset request failed ({status}): {body}")]
    SupersetError { status: u16, body: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Database,
    Storage,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl HawkeyeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HawkeyeError::ConfigError { .. }
            | HawkeyeError::MissingConfigError { .. }
            | HawkeyeError::InvalidConfigValueError { .. }
            | HawkeyeError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            HawkeyeError::ApiError(_) | HawkeyeError::SupersetError { .. } => {
                ErrorCategory::Network
            }
            HawkeyeError::DatabaseError(_) => ErrorCategory::Database,
            HawkeyeError::IoError(_) | HawkeyeError::StorageError { .. } => ErrorCategory::Storage,
            HawkeyeError::ZipError(_)
            | HawkeyeError::CsvError(_)
            | HawkeyeError::SerializationError(_)
            | HawkeyeError::ProcessingError { .. }
            | HawkeyeError::ValidationError { .. } => ErrorCategory::Data,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路類錯誤通常重試即可
            HawkeyeError::ApiError(_) => ErrorSeverity::Medium,
            HawkeyeError::SupersetError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            HawkeyeError::DatabaseError(_) | HawkeyeError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Check the configuration file, CLI flags and required environment variables"
            }
            ErrorCategory::Network => {
                "Check that the service is reachable and the credentials are valid, then retry"
            }
            ErrorCategory::Database => {
                "Check the database connection settings and whether the target database already exists"
            }
            ErrorCategory::Storage => "Check storage paths, bucket name and access permissions",
            ErrorCategory::Data => "Inspect the landing files for malformed rows or columns",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            // 資料庫錯誤原樣輸出
            HawkeyeError::DatabaseError(e) => e.to_string(),
            HawkeyeError::MissingConfigError { field } => {
                format!("Required setting '{}' is not set", field)
            }
            HawkeyeError::SupersetError { status, .. } => {
                format!("Superset rejected the request with status {}", status)
            }
            other => other.to_string(),
        }
    }

    /// 對應 CLI 結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, HawkeyeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = HawkeyeError::MissingConfigError {
            field: "POSTGRES_USER".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert!(err.user_friendly_message().contains("POSTGRES_USER"));
    }

    #[test]
    fn test_every_failure_exits_non_zero() {
        let errors = [
            HawkeyeError::ValidationError {
                message: "bad".to_string(),
            },
            HawkeyeError::SupersetError {
                status: 502,
                body: String::new(),
            },
            HawkeyeError::from(sqlx::Error::PoolTimedOut),
        ];
        for err in errors {
            assert_ne!(err.exit_code(), 0, "{:?}", err);
        }
    }

    #[test]
    fn test_database_errors_are_printed_verbatim() {
        let err = HawkeyeError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(err.category(), ErrorCategory::Database);
        assert_eq!(err.exit_code(), 3);
        assert_eq!(
            err.user_friendly_message(),
            sqlx::Error::PoolTimedOut.to_string()
        );
    }

    #[test]
    fn test_superset_server_errors_are_retryable() {
        let err = HawkeyeError::SupersetError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Medium);

        let err = HawkeyeError::SupersetError {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
    }
}

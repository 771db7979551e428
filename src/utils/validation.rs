use crate::utils::error::{HawkeyeError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(HawkeyeError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// 資料庫識別字（資料庫名稱、角色名稱）
pub fn validate_identifier(field_name: &str, value: &str) -> Result<()> {
    validate_non_empty_string(field_name, value)?;

    if value.contains('\0') {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.escape_default().to_string(),
            reason: "Identifier contains null bytes".to_string(),
        });
    }

    // PostgreSQL NAMEDATALEN - 1
    if value.len() > 63 {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Identifier is longer than 63 bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[String],
    allowed_extensions: &[&str],
) -> Result<()> {
    for file in files {
        let extension = std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if allowed_extensions.contains(&ext.as_str()) => {}
            Some(ext) => {
                return Err(HawkeyeError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        ext,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(HawkeyeError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.clone(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| HawkeyeError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(HawkeyeError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("superset.base_url", "https://example.com").is_ok());
        assert!(validate_url("superset.base_url", "http://superset:8088").is_ok());
        assert!(validate_url("superset.base_url", "").is_err());
        assert!(validate_url("superset.base_url", "invalid-url").is_err());
        assert!(validate_url("superset.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("database", "portal").is_ok());
        assert!(validate_identifier("role", "Audit \"Team\"").is_ok());
        assert!(validate_identifier("role", "").is_err());
        assert!(validate_identifier("role", "   ").is_err());
        assert!(validate_identifier("role", "bad\0name").is_err());
        assert!(validate_identifier("database", &"x".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_s3_bucket_name() {
        assert!(validate_s3_bucket_name("storage.bucket", "hawkeye").is_ok());
        assert!(validate_s3_bucket_name("storage.bucket", "ab").is_err());
        assert!(validate_s3_bucket_name("storage.bucket", "HawkEye").is_err());
        assert!(validate_s3_bucket_name("storage.bucket", "-hawkeye").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = vec!["export.csv".to_string(), "semana.ZIP".to_string()];
        assert!(validate_file_extensions("files", &files, &["csv", "zip"]).is_ok());

        let invalid = vec!["export.xlsx".to_string()];
        assert!(validate_file_extensions("files", &invalid, &["csv", "zip"]).is_err());

        let no_ext = vec!["README".to_string()];
        assert!(validate_file_extensions("files", &no_ext, &["csv", "zip"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("superset.screenshot_wait_secs", 30, 0, 600).is_ok());
        assert!(validate_range("superset.screenshot_wait_secs", 601, 0, 600).is_err());
    }
}

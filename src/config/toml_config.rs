use crate::config::storage::{AnyStorage, LocalStorage};
use crate::core::bootstrap::{DEFAULT_DATABASE, DEFAULT_ROLE_ENV};
use crate::core::superset::SupersetClient;
use crate::core::ConfigProvider;
use crate::utils::error::{HawkeyeError, Result};
use crate::utils::validation::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HawkeyeConfig {
    pub storage: StorageSettings,
    pub pipeline: PipelineSettings,
    pub superset: SupersetSettings,
    pub bootstrap: BootstrapSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Local,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub base_path: String,
    pub bucket: Option<String>,
    pub endpoint: Option<String>,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            kind: StorageKind::Local,
            base_path: "./data".to_string(),
            bucket: None,
            endpoint: None,
            region: "us-east-1".to_string(),
            access_key: None,
            secret_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// 資料分層的最上層目錄，例如 `lm`
    pub tenant: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            tenant: "lm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupersetSettings {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub screenshot_wait_secs: u64,
    pub screenshot_prefix: String,
    /// 依報表組裝順序排列
    pub charts: Vec<ChartRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRef {
    pub name: String,
    pub id: u64,
}

impl Default for SupersetSettings {
    fn default() -> Self {
        let charts = [
            ("total_vencidos", 5),
            ("total_visitas", 3),
            ("total_nao_conformidades", 4),
            ("media_nota", 6),
            ("conformidade_por_unidade", 1),
            ("media_nota_por_unidade", 7),
            ("porcentagem_conformidade", 2),
            ("conformidade_por_area", 9),
            ("itens_nao_conformes", 8),
        ]
        .into_iter()
        .map(|(name, id)| ChartRef {
            name: name.to_string(),
            id,
        })
        .collect();

        Self {
            base_url: "http://localhost:8088".to_string(),
            username: None,
            password: None,
            screenshot_wait_secs: 30,
            screenshot_prefix: "img".to_string(),
            charts,
        }
    }
}

impl SupersetSettings {
    pub fn chart_ids(&self) -> Vec<u64> {
        self.charts.iter().map(|chart| chart.id).collect()
    }

    pub fn client(&self) -> Result<SupersetClient> {
        let username = validate_required_field("superset.username", &self.username)?;
        let password = validate_required_field("superset.password", &self.password)?;
        Ok(SupersetClient::new(&self.base_url, username, password)
            .with_screenshot_wait(Duration::from_secs(self.screenshot_wait_secs)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    pub database: String,
    /// 存放角色名稱的環境變數
    pub role_env: String,
    pub database_url: Option<String>,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            role_env: DEFAULT_ROLE_ENV.to_string(),
            database_url: None,
        }
    }
}

impl HawkeyeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        let config: Self =
            toml::from_str(&processed_content).map_err(|e| HawkeyeError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;

        for placeholder in Self::unresolved_placeholders(&processed_content) {
            tracing::warn!("⚠️ Environment variable {} is not set", placeholder);
        }

        Ok(config)
    }

    /// 有指定檔案就讀檔，否則使用預設值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// 替換環境變數 (例如 ${MINIO_ACCESS_KEY})，未設定者保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = placeholder_regex()?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn unresolved_placeholders(content: &str) -> Vec<String> {
        let Ok(re) = placeholder_regex() else {
            return Vec::new();
        };
        re.captures_iter(content)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    pub async fn build_storage(&self) -> Result<AnyStorage> {
        match self.storage.kind {
            StorageKind::Local => Ok(AnyStorage::Local(LocalStorage::new(
                self.storage.base_path.clone(),
            ))),
            #[cfg(feature = "s3")]
            StorageKind::S3 => Ok(AnyStorage::S3(
                crate::config::s3::S3Storage::from_settings(&self.storage).await?,
            )),
            #[cfg(not(feature = "s3"))]
            StorageKind::S3 => Err(HawkeyeError::ConfigError {
                message: "S3 storage requires building with the `s3` feature".to_string(),
            }),
        }
    }
}

fn placeholder_regex() -> Result<Regex> {
    Regex::new(r"\$\{([^}]+)\}").map_err(|e| HawkeyeError::ConfigError {
        message: format!("Invalid placeholder pattern: {}", e),
    })
}

impl ConfigProvider for HawkeyeConfig {
    fn tenant(&self) -> &str {
        &self.pipeline.tenant
    }
}

impl Validate for HawkeyeConfig {
    fn validate(&self) -> Result<()> {
        match self.storage.kind {
            StorageKind::Local => validate_path("storage.base_path", &self.storage.base_path)?,
            StorageKind::S3 => {
                let bucket = validate_required_field("storage.bucket", &self.storage.bucket)?;
                validate_s3_bucket_name("storage.bucket", bucket)?;
                validate_non_empty_string("storage.region", &self.storage.region)?;
                if let Some(endpoint) = &self.storage.endpoint {
                    validate_url("storage.endpoint", endpoint)?;
                }
            }
        }

        validate_non_empty_string("pipeline.tenant", &self.pipeline.tenant)?;
        validate_path("pipeline.tenant", &self.pipeline.tenant)?;

        validate_url("superset.base_url", &self.superset.base_url)?;
        validate_range(
            "superset.screenshot_wait_secs",
            self.superset.screenshot_wait_secs,
            0,
            600,
        )?;

        validate_identifier("bootstrap.database", &self.bootstrap.database)?;
        validate_non_empty_string("bootstrap.role_env", &self.bootstrap.role_env)?;

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_file() {
        let config = HawkeyeConfig::load(None).unwrap();
        assert_eq!(config.storage.kind, StorageKind::Local);
        assert_eq!(config.tenant(), "lm");
        assert_eq!(config.landing_prefix(), "lm/landing/");
        assert_eq!(config.bootstrap.database, "portal");
        assert_eq!(config.bootstrap.role_env, "POSTGRES_USER");
        assert_eq!(config.superset.charts.len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_charts_keep_report_order() {
        let settings = SupersetSettings::default();
        assert_eq!(settings.chart_ids(), vec![5, 3, 4, 6, 1, 7, 2, 9, 8]);
        assert_eq!(settings.charts[0].name, "total_vencidos");
    }

    #[test]
    fn test_parse_s3_config() {
        let toml_content = r#"
[storage]
kind = "s3"
bucket = "hawkeye"
endpoint = "http://minio:9000"
access_key = "minio"
secret_key = "minio123"

[pipeline]
tenant = "rodrigues"

[superset]
base_url = "http://superset:8088"
username = "admin"
password = "admin"

[[superset.charts]]
name = "total_visitas"
id = 3

[[superset.charts]]
name = "media_nota"
id = 6
"#;

        let config = HawkeyeConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.storage.kind, StorageKind::S3);
        assert_eq!(config.storage.region, "us-east-1");
        assert_eq!(config.raw_path(), "rodrigues/raw/checklist.csv");
        assert_eq!(config.superset.chart_ids(), vec![3, 6]);
        assert_eq!(config.superset.charts[1].name, "media_nota");
        assert!(config.superset.client().is_ok());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HAWKEYE_TEST_MINIO_KEY", "access-123");

        let toml_content = r#"
[storage]
access_key = "${HAWKEYE_TEST_MINIO_KEY}"
secret_key = "${HAWKEYE_TEST_NEVER_SET}"
"#;

        let config = HawkeyeConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.storage.access_key.as_deref(), Some("access-123"));
        assert_eq!(
            config.storage.secret_key.as_deref(),
            Some("${HAWKEYE_TEST_NEVER_SET}")
        );

        std::env::remove_var("HAWKEYE_TEST_MINIO_KEY");
    }

    #[test]
    fn test_config_validation() {
        let config = HawkeyeConfig::from_toml_str(
            r#"
[storage]
kind = "s3"
bucket = "Invalid_Bucket"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = HawkeyeConfig::from_toml_str(
            r#"
[superset]
base_url = "superset"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_superset_client_requires_credentials() {
        let config = HawkeyeConfig::default();
        let err = config.superset.client().unwrap_err();
        assert!(matches!(err, HawkeyeError::MissingConfigError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[bootstrap]\ndatabase = \"prefect\"\n")
            .unwrap();

        let config = HawkeyeConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.bootstrap.database, "prefect");
        assert_eq!(config.bootstrap.role_env, "POSTGRES_USER");
    }
}

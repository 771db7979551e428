use crate::core::checklist::{
    clean_rows, cleaned_to_csv, csv_entries_from_zip, parse_csv, raw_to_csv,
};
use crate::core::{ChecklistRow, ConfigProvider, Pipeline, Storage, TransformResult};
use crate::utils::error::{HawkeyeError, Result};
use crate::utils::validation::validate_file_extensions;
use std::path::Path;

const LANDING_EXTENSIONS: [&str; 2] = ["csv", "zip"];

/// 稽核清單 ETL：landing → raw → cleaned
pub struct ChecklistPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ChecklistPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// 將本機匯出檔複製到 landing 區
    pub async fn stage(&self, files: &[String]) -> Result<Vec<String>> {
        validate_file_extensions("files", files, &LANDING_EXTENSIONS)?;

        let mut staged = Vec::with_capacity(files.len());
        for file in files {
            let name = Path::new(file)
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| HawkeyeError::ValidationError {
                    message: format!("Cannot derive a file name from '{}'", file),
                })?;
            let key = format!("{}{}", self.config.landing_prefix(), name);

            let data = tokio::fs::read(file).await?;
            self.storage.write_file(&key, &data).await?;
            tracing::info!("📥 Staged {} ({} bytes) as {}", file, data.len(), key);
            staged.push(key);
        }

        Ok(staged)
    }

    fn is_landing_file(key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        LANDING_EXTENSIONS
            .iter()
            .any(|ext| lower.ends_with(&format!(".{}", ext)))
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ChecklistPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<ChecklistRow>> {
        let prefix = self.config.landing_prefix();
        let keys: Vec<String> = self
            .storage
            .list_files(&prefix)
            .await?
            .into_iter()
            .filter(|key| Self::is_landing_file(key))
            .collect();

        if keys.is_empty() {
            return Err(HawkeyeError::ProcessingError {
                message: format!("No checklist exports found under '{}'", prefix),
            });
        }

        let mut rows = Vec::new();
        for key in &keys {
            let data = self.storage.read_file(key).await?;

            if key.to_ascii_lowercase().ends_with(".zip") {
                for (entry, content) in csv_entries_from_zip(&data)? {
                    let parsed = parse_csv(&content)?;
                    tracing::debug!("{}!{}: {} rows", key, entry, parsed.len());
                    rows.extend(parsed);
                }
            } else {
                let parsed = parse_csv(&data)?;
                tracing::debug!("{}: {} rows", key, parsed.len());
                rows.extend(parsed);
            }
        }

        tracing::info!("📂 Read {} rows from {} landing files", rows.len(), keys.len());
        Ok(rows)
    }

    async fn transform(&self, data: Vec<ChecklistRow>) -> Result<TransformResult> {
        let cleaned_records = clean_rows(&data)?;
        let raw_csv = raw_to_csv(&data)?;
        let cleaned_csv = cleaned_to_csv(&cleaned_records)?;
        let cleaned_json = serde_json::to_string_pretty(&cleaned_records)?;

        Ok(TransformResult {
            raw_rows: data,
            cleaned_records,
            raw_csv,
            cleaned_csv,
            cleaned_json,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let raw_path = self.config.raw_path();
        let cleaned_csv_path = self.config.cleaned_csv_path();
        let cleaned_json_path = self.config.cleaned_json_path();

        tracing::debug!("Writing {} raw rows to {}", result.raw_rows.len(), raw_path);
        self.storage
            .write_file(&raw_path, result.raw_csv.as_bytes())
            .await?;

        tracing::debug!(
            "Writing {} cleaned records to {}",
            result.cleaned_records.len(),
            cleaned_csv_path
        );
        self.storage
            .write_file(&cleaned_csv_path, result.cleaned_csv.as_bytes())
            .await?;
        self.storage
            .write_file(&cleaned_json_path, result.cleaned_json.as_bytes())
            .await?;

        Ok(cleaned_csv_path)
    }
}

use crate::core::Storage;
use crate::utils::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.base_path.join(path);
        let data = fs::read(full_path)?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.base_path.join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let dir = self.base_path.join(prefix);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                keys.push(format!("{}/{}", prefix.trim_end_matches('/'), name));
            }
        }

        keys.sort();
        Ok(keys)
    }
}

/// 依設定在執行期選擇的儲存後端
#[derive(Debug, Clone)]
pub enum AnyStorage {
    Local(LocalStorage),
    #[cfg(feature = "s3")]
    S3(crate::config::s3::S3Storage),
}

impl AnyStorage {
    pub fn describe(&self) -> String {
        match self {
            AnyStorage::Local(local) => format!("local:{}", local.base_path().display()),
            #[cfg(feature = "s3")]
            AnyStorage::S3(s3) => format!("s3://{}", s3.bucket()),
        }
    }
}

impl Storage for AnyStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        match self {
            AnyStorage::Local(storage) => storage.read_file(path).await,
            #[cfg(feature = "s3")]
            AnyStorage::S3(storage) => storage.read_file(path).await,
        }
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        match self {
            AnyStorage::Local(storage) => storage.write_file(path, data).await,
            #[cfg(feature = "s3")]
            AnyStorage::S3(storage) => storage.write_file(path, data).await,
        }
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        match self {
            AnyStorage::Local(storage) => storage.list_files(prefix).await,
            #[cfg(feature = "s3")]
            AnyStorage::S3(storage) => storage.list_files(prefix).await,
        }
    }
}

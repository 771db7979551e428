use crate::domain::model::{ChecklistRow, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 列出 `prefix` 底下的檔案鍵值（已排序）
    fn list_files(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// 儲存區內的資料分層路徑
pub trait ConfigProvider: Send + Sync {
    fn tenant(&self) -> &str;

    fn landing_prefix(&self) -> String {
        format!("{}/landing/", self.tenant())
    }

    fn raw_path(&self) -> String {
        format!("{}/raw/checklist.csv", self.tenant())
    }

    fn cleaned_csv_path(&self) -> String {
        format!("{}/cleaned/checklist.csv", self.tenant())
    }

    fn cleaned_json_path(&self) -> String {
        format!("{}/cleaned/checklist.json", self.tenant())
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<ChecklistRow>>;
    async fn transform(&self, data: Vec<ChecklistRow>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}

/// 逐條執行 SQL 的資料庫連線
pub trait StatementExecutor: Send {
    fn execute(&mut self, sql: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}

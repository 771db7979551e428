//! 環境初始化：建立輔助資料庫並授權給環境角色。
//!
//! 只執行兩條語句，遇到第一個錯誤即中止並原樣回傳。資料庫已存在時
//! 視為錯誤，不做重建。

use crate::core::StatementExecutor;
use crate::utils::error::{HawkeyeError, Result};
use crate::utils::validation::validate_identifier;
use sqlx::postgres::PgConnectOptions;
use sqlx::{Connection, PgConnection};

pub const DEFAULT_DATABASE: &str = "portal";
pub const DEFAULT_ROLE_ENV: &str = "POSTGRES_USER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    database: String,
    role: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub database: String,
    pub role: String,
    pub statements_executed: usize,
}

impl BootstrapPlan {
    pub fn new(database: impl Into<String>, role: impl Into<String>) -> Result<Self> {
        let database = database.into();
        let role = role.into();
        validate_identifier("bootstrap.database", &database)?;
        validate_identifier("bootstrap.role", &role)?;
        Ok(Self { database, role })
    }

    /// 從環境變數讀取角色名稱，未設定或為空時在執行任何語句前失敗
    pub fn from_env(database: impl Into<String>, role_var: &str) -> Result<Self> {
        let role = std::env::var(role_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| HawkeyeError::MissingConfigError {
                field: role_var.to_string(),
            })?;
        Self::new(database, role)
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn statements(&self) -> [String; 2] {
        let database = quote_ident(&self.database);
        [
            format!("CREATE DATABASE {}", database),
            format!(
                "GRANT ALL PRIVILEGES ON DATABASE {} TO {}",
                database,
                quote_ident(&self.role)
            ),
        ]
    }
}

/// PostgreSQL 識別字加引號，內部的 `"` 需重複
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

pub struct Bootstrapper {
    plan: BootstrapPlan,
}

impl Bootstrapper {
    pub fn new(plan: BootstrapPlan) -> Self {
        Self { plan }
    }

    pub async fn run<E: StatementExecutor>(&self, executor: &mut E) -> Result<BootstrapReport> {
        tracing::info!(
            "🗄️ Bootstrapping database '{}' for role '{}'",
            self.plan.database,
            self.plan.role
        );

        let statements = self.plan.statements();
        for (index, sql) in statements.iter().enumerate() {
            tracing::debug!("Executing statement {}/{}: {}", index + 1, statements.len(), sql);
            if let Err(e) = executor.execute(sql).await {
                tracing::error!("❌ Statement {} failed: {}", index + 1, e);
                return Err(e);
            }
        }

        tracing::info!("✅ Database '{}' ready", self.plan.database);
        Ok(BootstrapReport {
            database: self.plan.database.clone(),
            role: self.plan.role.clone(),
            statements_executed: statements.len(),
        })
    }
}

/// 先由環境變數建立計畫，成功後才連線執行；結束後關閉連線
pub async fn bootstrap_from_env(
    database: &str,
    role_var: &str,
    database_url: Option<&str>,
) -> Result<BootstrapReport> {
    let plan = BootstrapPlan::from_env(database, role_var)?;
    let mut executor = PgExecutor::connect(database_url).await?;
    let report = Bootstrapper::new(plan).run(&mut executor).await?;
    executor.close().await?;
    Ok(report)
}

/// 單一 PostgreSQL 連線
pub struct PgExecutor {
    conn: PgConnection,
}

impl PgExecutor {
    /// 未指定 URL 時沿用 libpq 環境變數（PGHOST、PGUSER、PGPASSWORD ...）
    pub async fn connect(database_url: Option<&str>) -> Result<Self> {
        let options = match database_url {
            Some(url) => url.parse::<PgConnectOptions>()?,
            None => PgConnectOptions::new(),
        };
        let conn = PgConnection::connect_with(&options).await?;
        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

impl StatementExecutor for PgExecutor {
    async fn execute(&mut self, sql: &str) -> Result<()> {
        // CREATE DATABASE 不能在交易區塊內執行，走 simple query protocol
        sqlx::Executor::execute(&mut self.conn, sqlx::raw_sql(sql)).await?;
        Ok(())
    }
}

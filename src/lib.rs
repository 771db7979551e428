pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{AnyStorage, HawkeyeConfig, LocalStorage};

pub use crate::core::{
    bootstrap::{bootstrap_from_env, BootstrapPlan, Bootstrapper, PgExecutor},
    etl::EtlEngine,
    pipeline::ChecklistPipeline,
    superset::{ChartScoper, ScreenshotCollector, SupersetClient, TimeWindow},
};
pub use utils::error::{HawkeyeError, Result};

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "s3")]
pub mod s3;
pub mod storage;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use storage::{AnyStorage, LocalStorage};
pub use toml_config::HawkeyeConfig;

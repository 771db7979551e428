use crate::config::toml_config::HawkeyeConfig;
use crate::core::superset::TimeWindow;
use crate::utils::error::{HawkeyeError, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "hawkeye")]
#[command(about = "Supermarket quality-audit automation")]
pub struct CliConfig {
    #[arg(long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log CPU and memory usage per ETL phase")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[arg(short, long, global = true, env = "HAWKEYE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the auxiliary database and grant the environment role all privileges on it
    Bootstrap(BootstrapArgs),
    /// Copy checklist exports (.csv / .zip) into the landing area
    Stage(StageArgs),
    /// Build the raw and cleaned checklist datasets from the landing area
    Etl(EtlArgs),
    /// Scope Superset charts to one unit and time window
    Charts(ChartsArgs),
    /// Download Superset chart screenshots into storage
    Screenshots(ScreenshotsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct BootstrapArgs {
    #[arg(long)]
    pub database: Option<String>,

    /// Environment variable holding the role name
    #[arg(long)]
    pub role_env: Option<String>,

    /// Connection URL; libpq PG* variables are used when omitted
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct StageArgs {
    #[arg(required = true)]
    pub files: Vec<String>,

    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct EtlArgs {
    #[arg(long)]
    pub tenant: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct ChartsArgs {
    /// Unit name as it appears in the `unidade` column
    #[arg(long)]
    pub company: String,

    /// First day of the window (YYYY-MM-DD); defaults to last week
    #[arg(long, requires = "end")]
    pub start: Option<NaiveDate>,

    /// Last day of the window, inclusive
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// Chart ids to scope; defaults to the configured chart set
    #[arg(long = "chart")]
    pub charts: Vec<u64>,
}

#[derive(Debug, Clone, Args)]
pub struct ScreenshotsArgs {
    #[arg(long = "chart")]
    pub charts: Vec<u64>,
}

impl ChartsArgs {
    pub fn window(&self) -> Result<TimeWindow> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => TimeWindow::range(start, end),
            (None, None) => Ok(TimeWindow::LastWeek),
            _ => Err(HawkeyeError::ValidationError {
                message: "--start and --end must be given together".to_string(),
            }),
        }
    }
}

impl CliConfig {
    /// 命令列參數覆寫設定檔
    pub fn apply_overrides(&self, config: &mut HawkeyeConfig) {
        match &self.command {
            Command::Bootstrap(args) => {
                if let Some(database) = &args.database {
                    config.bootstrap.database = database.clone();
                }
                if let Some(role_env) = &args.role_env {
                    config.bootstrap.role_env = role_env.clone();
                }
                if let Some(url) = &args.database_url {
                    config.bootstrap.database_url = Some(url.clone());
                }
            }
            Command::Stage(StageArgs { tenant, .. }) | Command::Etl(EtlArgs { tenant }) => {
                if let Some(tenant) = tenant {
                    config.pipeline.tenant = tenant.clone();
                }
            }
            Command::Charts(_) | Command::Screenshots(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bootstrap_overrides() {
        let cli = CliConfig::try_parse_from([
            "hawkeye",
            "--verbose",
            "bootstrap",
            "--database",
            "prefect",
            "--role-env",
            "APP_ROLE",
        ])
        .unwrap();
        assert!(cli.verbose);

        let mut config = HawkeyeConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.bootstrap.database, "prefect");
        assert_eq!(config.bootstrap.role_env, "APP_ROLE");
    }

    #[test]
    fn test_parse_stage_with_tenant() {
        let cli = CliConfig::try_parse_from([
            "hawkeye",
            "stage",
            "exports/semana.csv",
            "--tenant",
            "rodrigues",
        ])
        .unwrap();

        let mut config = HawkeyeConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.pipeline.tenant, "rodrigues");
        match cli.command {
            Command::Stage(args) => assert_eq!(args.files, vec!["exports/semana.csv"]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_charts_window() {
        let cli = CliConfig::try_parse_from([
            "hawkeye",
            "charts",
            "--company",
            "SUPERMERCADO RODRIGUES",
            "--start",
            "2025-09-21",
            "--end",
            "2025-09-28",
            "--chart",
            "5",
            "--chart",
            "3",
        ])
        .unwrap();

        let Command::Charts(args) = cli.command else {
            panic!("expected charts command");
        };
        assert_eq!(args.charts, vec![5, 3]);
        assert_eq!(args.window().unwrap().comparator(), "2025-09-21 : 2025-09-29");
    }

    #[test]
    fn test_charts_requires_both_dates() {
        let result = CliConfig::try_parse_from([
            "hawkeye",
            "charts",
            "--company",
            "LOJA",
            "--start",
            "2025-09-21",
        ]);
        assert!(result.is_err());
    }
}

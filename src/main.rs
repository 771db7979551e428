use clap::Parser;
use hawkeye::config::cli::Command;
use hawkeye::core::ConfigProvider;
use hawkeye::utils::{logger, validation::Validate};
use hawkeye::{
    bootstrap_from_env, ChartScoper, ChecklistPipeline, CliConfig, EtlEngine, HawkeyeConfig,
    Result, ScreenshotCollector,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting hawkeye CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Err(e) = run(cli).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 建議: {}", e.recovery_suggestion());

        std::process::exit(e.exit_code());
    }
}

async fn run(cli: CliConfig) -> Result<()> {
    let mut config = HawkeyeConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    match &cli.command {
        Command::Bootstrap(_) => {
            let report = bootstrap_from_env(
                &config.bootstrap.database,
                &config.bootstrap.role_env,
                config.bootstrap.database_url.as_deref(),
            )
            .await?;

            println!(
                "✅ Database '{}' created; role '{}' granted all privileges",
                report.database, report.role
            );
        }
        Command::Stage(args) => {
            let storage = config.build_storage().await?;
            tracing::info!("Staging into {}", storage.describe());
            let pipeline = ChecklistPipeline::new(storage, config.clone());
            let staged = pipeline.stage(&args.files).await?;

            println!("✅ Staged {} file(s) under {}", staged.len(), config.landing_prefix());
        }
        Command::Etl(_) => {
            if cli.monitor {
                tracing::info!("🔍 System monitoring enabled");
            }
            let storage = config.build_storage().await?;
            let pipeline = ChecklistPipeline::new(storage, config.clone());
            let engine = EtlEngine::new_with_monitoring(pipeline, cli.monitor);
            let summary = engine.run().await?;

            println!("✅ ETL process completed successfully!");
            println!(
                "📊 {} rows read, {} cleaned records written",
                summary.rows_read, summary.records_written
            );
            println!("📁 Output saved to: {}", summary.output_path);
        }
        Command::Charts(args) => {
            let window = args.window()?;
            let chart_ids = if args.charts.is_empty() {
                config.superset.chart_ids()
            } else {
                args.charts.clone()
            };

            let scoper = ChartScoper::new(config.superset.client()?, chart_ids);
            let scoped = scoper.run(&args.company, &window).await?;

            println!(
                "✅ Scoped {} chart(s) to '{}' ({})",
                scoped.len(),
                args.company,
                window.comparator()
            );
        }
        Command::Screenshots(args) => {
            let chart_ids = if args.charts.is_empty() {
                config.superset.chart_ids()
            } else {
                args.charts.clone()
            };

            let storage = config.build_storage().await?;
            let prefix = format!("{}/{}", config.tenant(), config.superset.screenshot_prefix);
            let collector = ScreenshotCollector::new(config.superset.client()?, storage, prefix);
            let keys = collector.run(&chart_ids).await?;

            println!("✅ Saved {} screenshot(s)", keys.len());
            for key in keys {
                println!("🖼️ {}", key);
            }
        }
    }

    Ok(())
}

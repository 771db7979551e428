use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtlSummary {
    pub rows_read: usize,
    pub records_written: usize,
    pub output_path: String,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<EtlSummary> {
        tracing::info!("🚀 Starting checklist ETL");

        let raw_rows = self.pipeline.extract().await?;
        let rows_read = raw_rows.len();
        tracing::info!("Extracted {} rows", rows_read);
        self.monitor.log_phase("Extract");

        let result = self.pipeline.transform(raw_rows).await?;
        let records_written = result.cleaned_records.len();
        tracing::info!(
            "Transformed {} rows into {} cleaned records",
            rows_read,
            records_written
        );
        self.monitor.log_phase("Transform");

        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Output saved to: {}", output_path);
        self.monitor.log_phase("Load");
        self.monitor.log_summary();

        Ok(EtlSummary {
            rows_read,
            records_written,
            output_path,
        })
    }
}

pub mod bootstrap;
pub mod checklist;
pub mod etl;
pub mod pipeline;
pub mod superset;

pub use crate::domain::model::{ChecklistRow, CleanedRecord, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, StatementExecutor, Storage};
pub use crate::utils::error::Result;

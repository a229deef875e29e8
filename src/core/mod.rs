pub mod aggregate;
pub mod etl;
pub mod pipeline;
pub mod query;
pub mod week;

pub use crate::domain::model::{ApplicantRow, SourceBatch, SyncBatch, SyncSummary, WeeklyReport};
pub use crate::domain::ports::{ApplicantSource, Pipeline, ReportStore};
pub use crate::utils::error::Result;

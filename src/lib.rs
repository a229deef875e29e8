pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::SyncConfig;

pub use adapters::{AnyStore, LocalStore, RestStore};
pub use core::aggregate::ReportMonth;
pub use core::week::{
    get_valid_weeks_in_month, is_cross_month_week, resolve_week, week_key_for_date, DateRange,
    WeekKey,
};
pub use core::{etl::SyncEngine, pipeline::ReportSyncPipeline};
pub use utils::error::{ReportError, Result};

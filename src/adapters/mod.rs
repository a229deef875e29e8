// Adapters layer: concrete implementations for external systems
// (spreadsheet and wiki APIs, CSV exports, report stores).

pub mod csv_file;
pub mod http;
pub mod rows;
pub mod sheet;
pub mod store;
pub mod wiki;

use crate::config::toml_config::{SourceConfig, SyncConfig};
use crate::domain::ports::ApplicantSource;
use self::http::HttpSettings;

pub use csv_file::CsvSource;
pub use sheet::SheetSource;
pub use store::{AnyStore, LocalStore, RestStore};
pub use wiki::WikiSource;

pub fn build_source(config: &SourceConfig, http: &HttpSettings) -> Box<dyn ApplicantSource> {
    match config {
        SourceConfig::Sheet(c) => Box::new(SheetSource::new(c.clone(), http.clone())),
        SourceConfig::Csv(c) => Box::new(CsvSource::new(c.clone())),
        SourceConfig::Wiki(c) => Box::new(WikiSource::new(c.clone(), http.clone())),
    }
}

pub fn build_sources(config: &SyncConfig) -> Vec<Box<dyn ApplicantSource>> {
    let http = HttpSettings::from(&config.http);
    config
        .sources
        .iter()
        .map(|source| build_source(source, &http))
        .collect()
}

pub fn build_store(config: &SyncConfig) -> AnyStore {
    AnyStore::from_config(&config.store, HttpSettings::from(&config.http))
}

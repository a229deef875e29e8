use crate::domain::model::{SourceBatch, SyncBatch, SyncSummary, WeeklyReport};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Anything that yields normalized applicant rows.
#[async_trait]
pub trait ApplicantSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self) -> Result<SourceBatch>;
}

pub trait ReportStore: Send + Sync {
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<WeeklyReport>>> + Send;
    fn put(&self, report: &WeeklyReport) -> impl std::future::Future<Output = Result<()>> + Send;
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<WeeklyReport>>> + Send;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<SourceBatch>;
    async fn transform(&self, extracted: SourceBatch) -> Result<SyncBatch>;
    async fn load(&self, batch: SyncBatch) -> Result<SyncSummary>;
}

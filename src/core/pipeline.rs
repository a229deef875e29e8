use crate::core::aggregate::{aggregate, ReportMonth};
use crate::domain::model::{SourceBatch, SyncBatch, SyncSummary};
use crate::domain::ports::{ApplicantSource, Pipeline, ReportStore};
use crate::utils::error::Result;
use chrono::Utc;

/// Sources → weekly aggregates → report store.
pub struct ReportSyncPipeline<S: ReportStore> {
    sources: Vec<Box<dyn ApplicantSource>>,
    store: S,
    months: Vec<ReportMonth>,
}

impl<S: ReportStore> ReportSyncPipeline<S> {
    pub fn new(sources: Vec<Box<dyn ApplicantSource>>, store: S, months: Vec<ReportMonth>) -> Self {
        Self {
            sources,
            store,
            months,
        }
    }

    pub fn months(&self) -> &[ReportMonth] {
        &self.months
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait::async_trait]
impl<S: ReportStore> Pipeline for ReportSyncPipeline<S> {
    async fn extract(&self) -> Result<SourceBatch> {
        let mut extracted = SourceBatch::default();

        // 依序讀取；任一來源失敗即中止，避免寫入不完整的週報
        for source in &self.sources {
            tracing::debug!("Reading source '{}'", source.name());
            let batch = source.fetch().await?;
            extracted.extend(batch);
        }

        if self.sources.is_empty() {
            tracing::warn!("No sources configured, reports will be empty");
        }
        Ok(extracted)
    }

    async fn transform(&self, extracted: SourceBatch) -> Result<SyncBatch> {
        let mut batch = aggregate(&extracted.rows, &self.months)?;
        batch.rows_skipped += extracted.skipped;

        if batch.duplicate_rows > 0 {
            tracing::info!("🔗 {} duplicate applicants merged", batch.duplicate_rows);
        }
        if batch.rows_out_of_window > 0 {
            tracing::debug!(
                "{} applicants fall outside {}",
                batch.rows_out_of_window,
                self.months
                    .iter()
                    .map(|m| m.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Ok(batch)
    }

    async fn load(&self, batch: SyncBatch) -> Result<SyncSummary> {
        let mut summary = SyncSummary {
            rows_read: batch.rows_read,
            rows_skipped: batch.rows_skipped,
            rows_out_of_window: batch.rows_out_of_window,
            duplicate_rows: batch.duplicate_rows,
            ..SyncSummary::default()
        };
        let synced_at = Utc::now();

        for mut report in batch.reports {
            // 保留使用者在既有週報上的註記
            if let Some(existing) = self.store.get(&report.id).await? {
                summary.annotations_kept += existing.annotations.len();
                report.annotations = existing.annotations;
            }
            report.synced_at = Some(synced_at);

            self.store.put(&report).await?;
            tracing::debug!("{}: {} applicants", report.id, report.total);
            summary.reports_written += 1;
        }

        Ok(summary)
    }
}

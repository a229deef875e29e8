use crate::domain::model::{SyncBatch, SyncSummary};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use std::time::Instant;

pub struct SyncEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SyncEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Extract and transform only; nothing is written.
    pub async fn preview(&self) -> Result<SyncBatch> {
        let started = Instant::now();

        tracing::info!("📥 Extracting applicants...");
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} applicants ({} skipped) in {:?}",
            extracted.rows.len(),
            extracted.skipped,
            started.elapsed()
        );

        let phase = Instant::now();
        tracing::info!("🔄 Aggregating weekly reports...");
        let batch = self.pipeline.transform(extracted).await?;
        tracing::info!(
            "🔄 Built {} weekly reports in {:?}",
            batch.reports.len(),
            phase.elapsed()
        );

        Ok(batch)
    }

    pub async fn run(&self) -> Result<SyncSummary> {
        let started = Instant::now();
        tracing::info!("🚀 Starting report sync");

        let batch = self.preview().await?;

        let phase = Instant::now();
        tracing::info!("💾 Saving reports...");
        let summary = self.pipeline.load(batch).await?;
        tracing::info!(
            "💾 Saved {} reports ({} annotations kept) in {:?}",
            summary.reports_written,
            summary.annotations_kept,
            phase.elapsed()
        );

        tracing::info!("✅ Sync finished in {:?}", started.elapsed());
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::week::WeekKey;
    use crate::domain::model::{SourceBatch, WeeklyReport};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPipeline {
        loads: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<SourceBatch> {
            Ok(SourceBatch::default())
        }

        async fn transform(&self, extracted: SourceBatch) -> Result<SyncBatch> {
            Ok(SyncBatch {
                reports: vec![WeeklyReport::empty(WeekKey::new(2025, 6, 2)?)],
                rows_read: extracted.rows.len(),
                ..SyncBatch::default()
            })
        }

        async fn load(&self, batch: SyncBatch) -> Result<SyncSummary> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(SyncSummary {
                reports_written: batch.reports.len(),
                ..SyncSummary::default()
            })
        }
    }

    #[test]
    fn test_preview_does_not_load() {
        let engine = SyncEngine::new(CountingPipeline::default());
        let batch = tokio_test::block_on(engine.preview()).unwrap();

        assert_eq!(batch.reports.len(), 1);
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_loads_once() {
        let engine = SyncEngine::new(CountingPipeline::default());
        let summary = engine.run().await.unwrap();

        assert_eq!(summary.reports_written, 1);
        assert_eq!(engine.pipeline().loads.load(Ordering::SeqCst), 1);
    }
}

use crate::adapters::rows::ColumnMap;
use crate::config::toml_config::CsvSourceConfig;
use crate::domain::model::SourceBatch;
use crate::domain::ports::ApplicantSource;
use crate::utils::error::{ReportError, Result};

/// A spreadsheet exported to CSV (or TSV with `delimiter = "\t"`).
pub struct CsvSource {
    config: CsvSourceConfig,
}

impl CsvSource {
    pub fn new(config: CsvSourceConfig) -> Self {
        Self { config }
    }

    fn parse(&self, data: &[u8]) -> Result<SourceBatch> {
        let delimiter = self.config.delimiter.unwrap_or(',');
        if !delimiter.is_ascii() {
            return Err(ReportError::InvalidConfigValueError {
                field: "sources.delimiter".to_string(),
                value: delimiter.to_string(),
                reason: "Delimiter must be a single ASCII character".to_string(),
            });
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let header: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let columns = ColumnMap::from_header(&header, &self.config.columns, &self.config.name)?;

        let records = reader
            .records()
            .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
        let rows = records
            .iter()
            .map(|record| record.iter().map(str::to_string).collect::<Vec<String>>());

        Ok(columns.collect_rows(rows, &self.config.name, 2))
    }
}

#[async_trait::async_trait]
impl ApplicantSource for CsvSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch(&self) -> Result<SourceBatch> {
        tracing::debug!("📂 {}: reading {}", self.config.name, self.config.path);
        let data = tokio::fs::read(&self.config.path).await?;
        let batch = self.parse(&data)?;

        tracing::info!(
            "📄 {}: {} applicants ({} skipped)",
            self.config.name,
            batch.rows.len(),
            batch.skipped
        );
        Ok(batch)
    }
}

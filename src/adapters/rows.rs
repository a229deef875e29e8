//! Shared row normalization for tabular sources (sheet values, CSV exports).

use crate::config::toml_config::ColumnConfig;
use crate::domain::model::{ApplicantRow, SourceBatch};
use crate::utils::error::{ReportError, Result};
use chrono::{DateTime, NaiveDate};

/// Accepts `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` and RFC 3339 timestamps.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();

    for format in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.date_naive());
    }

    // 無時區的時間戳，只取日期部分
    if trimmed.len() > 10 && trimmed.is_char_boundary(10) {
        if let Ok(date) = NaiveDate::parse_from_str(&trimmed[..10], "%Y-%m-%d") {
            return Ok(date);
        }
    }

    Err(ReportError::InvalidDate(trimmed.to_string()))
}

/// Identity used to de-duplicate applicants across sources when no id
/// column is configured.
pub fn fallback_id(name: &str, applied_on: NaiveDate) -> String {
    format!("{}|{}", name.trim().to_lowercase(), applied_on)
}

/// Column positions resolved from a header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    id: Option<usize>,
    name: usize,
    category: usize,
    status: usize,
    applied: usize,
}

impl ColumnMap {
    pub fn from_header(header: &[String], columns: &ColumnConfig, source_name: &str) -> Result<Self> {
        let find = |wanted: &str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted.trim()))
                .ok_or_else(|| ReportError::SourceError {
                    source_name: source_name.to_string(),
                    message: format!("column '{}' not found in header {:?}", wanted, header),
                })
        };

        Ok(Self {
            id: columns.id_column().map(find).transpose()?,
            name: find(columns.name_column())?,
            category: find(columns.category_column())?,
            status: find(columns.status_column())?,
            applied: find(columns.applied_column())?,
        })
    }

    pub fn parse_row(&self, cells: &[String], source_name: &str) -> Result<ApplicantRow> {
        let cell = |index: usize, field: &str| {
            cells
                .get(index)
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .ok_or_else(|| ReportError::ValidationError {
                    message: format!("missing {}", field),
                })
        };

        let name = cell(self.name, "name")?.to_string();
        let category = cell(self.category, "category")?.parse()?;
        let status = cell(self.status, "status")?.parse()?;
        let applied_on = parse_date(cell(self.applied, "applied date")?)?;

        let id = self
            .id
            .and_then(|i| cells.get(i))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| fallback_id(&name, applied_on));

        Ok(ApplicantRow {
            id,
            name,
            category,
            status,
            applied_on,
            source: source_name.to_string(),
        })
    }

    /// Parses data rows, skipping (and logging) rows that do not normalize.
    /// `first_line` is the 1-based line of the first data row.
    pub fn collect_rows<I>(&self, rows: I, source_name: &str, first_line: usize) -> SourceBatch
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut batch = SourceBatch::default();
        for (offset, cells) in rows.into_iter().enumerate() {
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            match self.parse_row(&cells, source_name) {
                Ok(row) => batch.rows.push(row),
                Err(e) => {
                    tracing::warn!(
                        "⚠️ {}: skipping line {}: {}",
                        source_name,
                        first_line + offset,
                        e
                    );
                    batch.skipped += 1;
                }
            }
        }
        batch
    }
}

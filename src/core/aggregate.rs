use crate::core::week::{valid_week_keys_in_month, week_key_for_date, WeekKey};
use crate::domain::model::{ApplicantRow, SyncBatch, WeeklyReport};
use crate::utils::error::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// A calendar month in the sync window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReportMonth {
    pub year: i32,
    pub month: u32,
}

impl ReportMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        // 驗證年月是否在可解析範圍內
        valid_week_keys_in_month(year, month)?;
        Ok(Self { year, month })
    }

    pub fn week_keys(&self) -> Result<Vec<WeekKey>> {
        valid_week_keys_in_month(self.year, self.month)
    }
}

impl fmt::Display for ReportMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for ReportMonth {
    type Err = ReportError;

    /// `YYYY-MM`
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ReportError::InvalidDate(format!("expected YYYY-MM, got '{}'", s));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        ReportMonth::new(year, month)
    }
}

/// Buckets rows into weekly reports for every valid week of `months`.
///
/// Each row lands in the canonical week of its `applied_on` date. Rows
/// outside the window are counted and dropped; an applicant id seen twice
/// (e.g. in both the sheet and the wiki) counts once, first source wins.
/// A date with no resolvable week (year 1 before the first Saturday) is
/// counted in `rows_skipped`.
pub fn aggregate(rows: &[ApplicantRow], months: &[ReportMonth]) -> Result<SyncBatch> {
    let mut reports: BTreeMap<WeekKey, WeeklyReport> = BTreeMap::new();
    for month in months {
        for key in month.week_keys()? {
            reports.entry(key).or_insert_with(|| WeeklyReport::empty(key));
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut batch = SyncBatch {
        rows_read: rows.len(),
        ..SyncBatch::default()
    };

    for row in rows {
        if !seen.insert(row.id.as_str()) {
            tracing::debug!("Skipping duplicate applicant {} from {}", row.id, row.source);
            batch.duplicate_rows += 1;
            continue;
        }

        let key = match week_key_for_date(row.applied_on) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(
                    "⚠️ Skipping applicant {} from {}: {}",
                    row.id,
                    row.source,
                    e
                );
                batch.rows_skipped += 1;
                continue;
            }
        };
        match reports.get_mut(&key) {
            Some(report) => report.record(row),
            None => batch.rows_out_of_window += 1,
        }
    }

    batch.reports = reports.into_values().collect();
    Ok(batch)
}

use crate::core::week::{DateRange, WeekKey};
use crate::utils::error::{ReportError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

fn normalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    Engineering,
    Design,
    Product,
    Sales,
    Marketing,
    Operations,
    Support,
}

impl JobCategory {
    pub const ALL: [JobCategory; 7] = [
        JobCategory::Engineering,
        JobCategory::Design,
        JobCategory::Product,
        JobCategory::Sales,
        JobCategory::Marketing,
        JobCategory::Operations,
        JobCategory::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Engineering => "engineering",
            JobCategory::Design => "design",
            JobCategory::Product => "product",
            JobCategory::Sales => "sales",
            JobCategory::Marketing => "marketing",
            JobCategory::Operations => "operations",
            JobCategory::Support => "support",
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobCategory {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let category = match normalize(s).as_str() {
            "engineering" | "eng" | "engineer" | "developer" | "dev" | "software" => {
                JobCategory::Engineering
            }
            "design" | "designer" | "ux" | "ui ux" => JobCategory::Design,
            "product" | "pm" | "product manager" => JobCategory::Product,
            "sales" | "account executive" => JobCategory::Sales,
            "marketing" | "mkt" => JobCategory::Marketing,
            "operations" | "ops" => JobCategory::Operations,
            "support" | "customer support" | "cs" => JobCategory::Support,
            _ => return Err(ReportError::UnknownCategory(s.trim().to_string())),
        };
        Ok(category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantStatus {
    Applied,
    Screening,
    Interviewing,
    Offered,
    Hired,
    Rejected,
    Withdrawn,
}

impl ApplicantStatus {
    pub const ALL: [ApplicantStatus; 7] = [
        ApplicantStatus::Applied,
        ApplicantStatus::Screening,
        ApplicantStatus::Interviewing,
        ApplicantStatus::Offered,
        ApplicantStatus::Hired,
        ApplicantStatus::Rejected,
        ApplicantStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicantStatus::Applied => "applied",
            ApplicantStatus::Screening => "screening",
            ApplicantStatus::Interviewing => "interviewing",
            ApplicantStatus::Offered => "offered",
            ApplicantStatus::Hired => "hired",
            ApplicantStatus::Rejected => "rejected",
            ApplicantStatus::Withdrawn => "withdrawn",
        }
    }

    /// Still moving through the funnel.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ApplicantStatus::Applied
                | ApplicantStatus::Screening
                | ApplicantStatus::Interviewing
                | ApplicantStatus::Offered
        )
    }
}

impl fmt::Display for ApplicantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicantStatus {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let status = match normalize(s).as_str() {
            "applied" | "new" | "application received" => ApplicantStatus::Applied,
            "screening" | "screen" | "phone screen" | "document review" => {
                ApplicantStatus::Screening
            }
            "interviewing" | "interview" | "onsite" => ApplicantStatus::Interviewing,
            "offered" | "offer" | "offer sent" => ApplicantStatus::Offered,
            "hired" | "accepted" | "joined" => ApplicantStatus::Hired,
            "rejected" | "not selected" => ApplicantStatus::Rejected,
            "withdrawn" | "withdrew" | "declined" => ApplicantStatus::Withdrawn,
            _ => return Err(ReportError::UnknownStatus(s.trim().to_string())),
        };
        Ok(status)
    }
}

/// One applicant, normalized from any source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRow {
    pub id: String,
    pub name: String,
    pub category: JobCategory,
    pub status: ApplicantStatus,
    pub applied_on: NaiveDate,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub type StatusCounts = BTreeMap<ApplicantStatus, u32>;

/// Persisted weekly aggregate, keyed by report id (`2025-08-W02`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub id: String,
    pub year: i32,
    pub month: u32,
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total: u32,
    #[serde(default)]
    pub by_status: StatusCounts,
    #[serde(default)]
    pub by_category: BTreeMap<JobCategory, StatusCounts>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub synced_at: Option<DateTime<Utc>>,
}

impl WeeklyReport {
    pub fn empty(key: WeekKey) -> Self {
        let range = key.range();
        Self {
            id: key.report_id(),
            year: key.year(),
            month: key.month(),
            week: key.week(),
            start: range.start,
            end: range.end,
            total: 0,
            by_status: StatusCounts::new(),
            by_category: BTreeMap::new(),
            sources: Vec::new(),
            annotations: Vec::new(),
            synced_at: None,
        }
    }

    pub fn key(&self) -> Result<WeekKey> {
        self.id.parse()
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
        }
    }

    pub fn record(&mut self, row: &ApplicantRow) {
        self.total += 1;
        *self.by_status.entry(row.status).or_insert(0) += 1;
        *self
            .by_category
            .entry(row.category)
            .or_default()
            .entry(row.status)
            .or_insert(0) += 1;
        if !self.sources.contains(&row.source) {
            self.sources.push(row.source.clone());
        }
    }

    pub fn status_count(&self, status: ApplicantStatus) -> u32 {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    /// Copy of the report restricted to one category's counts.
    pub fn for_category(&self, category: JobCategory) -> Self {
        let counts = self.by_category.get(&category).cloned().unwrap_or_default();
        let mut projected = self.clone();
        projected.total = counts.values().sum();
        projected.by_status = counts.clone();
        projected.by_category = BTreeMap::new();
        if !counts.is_empty() {
            projected.by_category.insert(category, counts);
        }
        projected
    }
}

/// Rows a source could normalize, plus how many it had to skip.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
    pub rows: Vec<ApplicantRow>,
    pub skipped: usize,
}

impl SourceBatch {
    pub fn extend(&mut self, other: SourceBatch) {
        self.rows.extend(other.rows);
        self.skipped += other.skipped;
    }
}

/// Output of the transform phase.
#[derive(Debug, Clone, Default)]
pub struct SyncBatch {
    pub reports: Vec<WeeklyReport>,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_out_of_window: usize,
    pub duplicate_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub reports_written: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub rows_out_of_window: usize,
    pub duplicate_rows: usize,
    pub annotations_kept: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: JobCategory, status: ApplicantStatus, source: &str) -> ApplicantRow {
        ApplicantRow {
            id: "a-1".to_string(),
            name: "Test Applicant".to_string(),
            category,
            status,
            applied_on: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_category_aliases() {
        assert_eq!("Engineering".parse::<JobCategory>().unwrap(), JobCategory::Engineering);
        assert_eq!(" dev ".parse::<JobCategory>().unwrap(), JobCategory::Engineering);
        assert_eq!("Customer-Support".parse::<JobCategory>().unwrap(), JobCategory::Support);
        assert!(matches!(
            "Astronaut".parse::<JobCategory>(),
            Err(ReportError::UnknownCategory(c)) if c == "Astronaut"
        ));
    }

    #[test]
    fn test_status_aliases() {
        assert_eq!("Phone Screen".parse::<ApplicantStatus>().unwrap(), ApplicantStatus::Screening);
        assert_eq!("offer_sent".parse::<ApplicantStatus>().unwrap(), ApplicantStatus::Offered);
        assert!("maybe".parse::<ApplicantStatus>().is_err());
        assert!(ApplicantStatus::Interviewing.is_active());
        assert!(!ApplicantStatus::Hired.is_active());
    }

    #[test]
    fn test_record_updates_all_counters() {
        let key = WeekKey::new(2025, 8, 2).unwrap();
        let mut report = WeeklyReport::empty(key);
        report.record(&row(JobCategory::Sales, ApplicantStatus::Applied, "sheet"));
        report.record(&row(JobCategory::Sales, ApplicantStatus::Hired, "wiki"));
        report.record(&row(JobCategory::Design, ApplicantStatus::Applied, "sheet"));

        assert_eq!(report.id, "2025-08-W02");
        assert_eq!(report.total, 3);
        assert_eq!(report.status_count(ApplicantStatus::Applied), 2);
        assert_eq!(report.by_category[&JobCategory::Sales][&ApplicantStatus::Hired], 1);
        assert_eq!(report.sources, vec!["sheet".to_string(), "wiki".to_string()]);

        let sales = report.for_category(JobCategory::Sales);
        assert_eq!(sales.total, 2);
        assert_eq!(sales.status_count(ApplicantStatus::Applied), 1);

        let support = report.for_category(JobCategory::Support);
        assert_eq!(support.total, 0);
        assert!(support.by_category.is_empty());
    }

    #[test]
    fn test_report_document_shape() {
        let key = WeekKey::new(2025, 6, 2).unwrap();
        let mut report = WeeklyReport::empty(key);
        report.record(&row(JobCategory::Engineering, ApplicantStatus::Screening, "sheet"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["id"], "2025-06-W02");
        assert_eq!(json["start"], "2025-06-07");
        assert_eq!(json["end"], "2025-06-13");
        assert_eq!(json["by_status"]["screening"], 1);
        assert_eq!(json["by_category"]["engineering"]["screening"], 1);

        let back: WeeklyReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
    }
}

use crate::core::week::DateRange;
use crate::domain::model::{Annotation, ApplicantStatus, JobCategory, WeeklyReport};
use crate::domain::ports::ReportStore;
use crate::utils::error::{ReportError, Result};
use chrono::Utc;

/// Dashboard-style filter over stored weekly reports.
#[derive(Debug, Clone, Default)]
pub struct ReportQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub weeks: Option<Vec<u32>>,
    pub category: Option<JobCategory>,
    pub within: Option<DateRange>,
}

impl ReportQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    pub fn weeks(mut self, weeks: Vec<u32>) -> Self {
        self.weeks = Some(weeks);
        self
    }

    pub fn category(mut self, category: JobCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn within(mut self, range: DateRange) -> Self {
        self.within = Some(range);
        self
    }

    pub fn matches(&self, report: &WeeklyReport) -> bool {
        self.year.map_or(true, |y| report.year == y)
            && self.month.map_or(true, |m| report.month == m)
            && self
                .weeks
                .as_ref()
                .map_or(true, |weeks| weeks.contains(&report.week))
            && self
                .within
                .as_ref()
                .map_or(true, |range| range.overlaps(&report.range()))
    }

    /// Matching reports sorted by id, projected onto the category filter.
    pub fn apply(&self, reports: Vec<WeeklyReport>) -> Vec<WeeklyReport> {
        let mut matched: Vec<WeeklyReport> = reports
            .into_iter()
            .filter(|r| self.matches(r))
            .map(|r| match self.category {
                Some(category) => r.for_category(category),
                None => r,
            })
            .collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        matched
    }
}

pub async fn find_reports<S: ReportStore>(store: &S, query: &ReportQuery) -> Result<Vec<WeeklyReport>> {
    let reports = store.list().await?;
    tracing::debug!("Filtering {} stored reports", reports.len());
    Ok(query.apply(reports))
}

/// Appends a note to a stored report; notes survive later syncs.
pub async fn annotate<S: ReportStore>(
    store: &S,
    id: &str,
    author: &str,
    text: &str,
) -> Result<WeeklyReport> {
    if text.trim().is_empty() {
        return Err(ReportError::ValidationError {
            message: "annotation text cannot be empty".to_string(),
        });
    }
    if author.trim().is_empty() {
        return Err(ReportError::ValidationError {
            message: "annotation author cannot be empty".to_string(),
        });
    }

    let mut report = store
        .get(id)
        .await?
        .ok_or_else(|| ReportError::ReportNotFound { id: id.to_string() })?;

    report.annotations.push(Annotation {
        author: author.trim().to_string(),
        text: text.trim().to_string(),
        created_at: Utc::now(),
    });
    store.put(&report).await?;

    tracing::info!("📝 Annotated {} ({} notes)", report.id, report.annotations.len());
    Ok(report)
}

/// `id,start,end,total,<status...>,annotations`
pub fn export_csv(reports: &[WeeklyReport]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["id", "start", "end", "total"];
    header.extend(ApplicantStatus::ALL.iter().map(|s| s.as_str()));
    header.push("annotations");
    writer.write_record(&header)?;

    for report in reports {
        let mut record = vec![
            report.id.clone(),
            report.start.to_string(),
            report.end.to_string(),
            report.total.to_string(),
        ];
        record.extend(
            ApplicantStatus::ALL
                .iter()
                .map(|s| report.status_count(*s).to_string()),
        );
        record.push(
            report
                .annotations
                .iter()
                .map(|a| format!("{}: {}", a.author, a.text))
                .collect::<Vec<_>>()
                .join(" | "),
        );
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ReportError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| ReportError::ValidationError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}

use std::sync::Arc;

use crate::{util::sanitize_text, Database, NewReport, ReportData, Result};

/// Accepts and manages user submitted reports
pub struct ReportDesk<Db> {
    db: Arc<Db>,
}

impl<Db> ReportDesk<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self { db: db.clone() }
    }

    pub async fn list(&self) -> Result<Vec<ReportData>> {
        self.db.list_reports().await
    }

    /// Files a new report. The free-form text is sanitized before it is
    /// stored, since it gets rendered back to admins.
    pub async fn file(&self, mut new_report: NewReport) -> Result<ReportData> {
        new_report.report_text = sanitize_text(&new_report.report_text);

        self.db.create_report(new_report).await
    }

    pub async fn dismiss(&self, report_id: &str) -> Result<()> {
        self.db.delete_report(report_id).await
    }
}

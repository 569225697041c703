//! Moderation endpoints.

use super::ApiClient;
use crate::error::Result;
use crate::report::Report;

impl ApiClient {
    pub async fn submit_report(&self, report: &Report) -> Result<()> {
        self.post("/moderation/reports/", &report.payload()).await?;
        Ok(())
    }
}

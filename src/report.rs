//! Content report submission.
//!
//! The reason set is closed; a report without a reason is unrepresentable.
//! Duplicate submissions while one is in flight are rejected by an atomic
//! latch, mirroring the submit-button lockout in the UI.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::ApiClient;
use crate::error::{Error, Result};

/// How long the UI shows the confirmation before auto-closing the modal.
pub const CONFIRMATION_DISMISS: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Post,
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportReason {
    Spam,
    Harassment,
    Violence,
    Misinformation,
    Hate,
    SelfHarm,
    Nsfw,
    Other,
}

#[derive(Debug, Clone)]
pub struct Report {
    pub content_type: ContentType,
    pub content_id: i64,
    pub reason: ReportReason,
    pub details: Option<String>,
}

impl Report {
    /// Wire payload: details are trimmed, and omitted entirely when empty.
    pub fn payload(&self) -> Value {
        let mut body = json!({
            "content_type": self.content_type,
            "content_id": self.content_id,
            "reason": self.reason,
        });
        if let Some(details) = self.details.as_deref() {
            let trimmed = details.trim();
            if !trimmed.is_empty() {
                body["details"] = Value::String(trimmed.to_string());
            }
        }
        body
    }
}

pub struct ReportClient {
    api: ApiClient,
    in_flight: AtomicBool,
}

impl ReportClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Submit a report. Returns `ReportInFlight` if another submission is
    /// still pending; the latch releases on completion either way.
    pub async fn submit(&self, report: &Report) -> Result<()> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(Error::ReportInFlight);
        }
        let result = self.api.submit_report(report).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ReportReason::SelfHarm).unwrap(),
            r#""self_harm""#
        );
        assert_eq!(serde_json::to_string(&ReportReason::Nsfw).unwrap(), r#""nsfw""#);
    }

    #[test]
    fn payload_trims_details() {
        let report = Report {
            content_type: ContentType::Post,
            content_id: 42,
            reason: ReportReason::Spam,
            details: Some("  obvious bot ring  ".to_string()),
        };
        let payload = report.payload();
        assert_eq!(payload["details"], "obvious bot ring");
        assert_eq!(payload["content_type"], "post");
        assert_eq!(payload["reason"], "spam");
    }

    #[test]
    fn payload_omits_blank_details() {
        let report = Report {
            content_type: ContentType::Comment,
            content_id: 7,
            reason: ReportReason::Other,
            details: Some("   ".to_string()),
        };
        assert!(report.payload().get("details").is_none());
    }

    #[test]
    fn payload_omits_missing_details() {
        let report = Report {
            content_type: ContentType::Comment,
            content_id: 7,
            reason: ReportReason::Harassment,
            details: None,
        };
        assert!(report.payload().get("details").is_none());
    }
}

//! Bounded, newest-first history of analysis outcomes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::pipeline::AnalysisResponse;

/// Entries kept before the oldest is dropped.
pub const LOG_CAPACITY: usize = 100;

/// One recorded analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisLogEntry {
    /// RFC 3339 timestamp.
    pub time: String,
    /// Image reference; inline data URLs are recorded as `base64_data`.
    pub image_url: String,
    /// Absent when the analysis failed.
    #[serde(rename = "isAIGenerated", skip_serializing_if = "Option::is_none")]
    pub is_ai_generated: Option<bool>,
    /// Absent when the analysis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub request_id: String,
}

impl AnalysisLogEntry {
    /// Records `response` at `time`.
    #[must_use]
    pub fn new(response: &AnalysisResponse, time: OffsetDateTime) -> Self {
        let verdict = &response.result;
        let failed = verdict.is_error();
        Self {
            time: time.format(&Rfc3339).unwrap_or_default(),
            image_url: display_url(&response.image),
            is_ai_generated: (!failed).then_some(verdict.is_ai_generated),
            confidence: (!failed).then_some(verdict.confidence),
            error: verdict.error.clone(),
            request_id: response.request_id.clone(),
        }
    }

    /// Records `response` now.
    #[must_use]
    pub fn now(response: &AnalysisResponse) -> Self {
        Self::new(response, OffsetDateTime::now_utc())
    }
}

fn display_url(image: &str) -> String {
    if image.starts_with("data:") {
        "base64_data".to_string()
    } else {
        image.to_string()
    }
}

/// Newest-first log, truncated at [`LOG_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisLog {
    entries: VecDeque<AnalysisLogEntry>,
}

impl AnalysisLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a log from previously saved entries (newest first).
    #[must_use]
    pub fn from_entries(entries: Vec<AnalysisLogEntry>) -> Self {
        let mut entries = VecDeque::from(entries);
        entries.truncate(LOG_CAPACITY);
        Self { entries }
    }

    /// Adds `entry` as the newest, dropping the oldest beyond capacity.
    pub fn push(&mut self, entry: AnalysisLogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(LOG_CAPACITY);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &AnalysisLogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries as a vector, newest first.
    #[must_use]
    pub fn into_entries(self) -> Vec<AnalysisLogEntry> {
        self.entries.into()
    }
}

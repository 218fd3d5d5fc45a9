//! Outcome vocabulary and the per-run report built from machine results.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::adapters::EventPlatform;
use crate::state_machine::{EventState, MachineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Published,
    Failed,
    NeedsAuth,
    Duplicate,
    Skipped,
    NeedsReview,
    /// A social post went out.
    Success,
}

impl Status {
    /// Map the state a machine stopped in to its outcome. Anything that is not
    /// one of the five terminal states is flagged for review.
    pub fn from_terminal(state: EventState) -> Self {
        match state {
            EventState::Done => Status::Published,
            EventState::Failed => Status::Failed,
            EventState::NeedsAuth => Status::NeedsAuth,
            EventState::Duplicate => Status::Duplicate,
            EventState::Skipped => Status::Skipped,
            _ => Status::NeedsReview,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Published => "PUBLISHED",
            Status::Failed => "FAILED",
            Status::NeedsAuth => "NEEDS_AUTH",
            Status::Duplicate => "DUPLICATE",
            Status::Skipped => "SKIPPED",
            Status::NeedsReview => "NEEDS_REVIEW",
            Status::Success => "SUCCESS",
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Status::Published | Status::Success)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of creating the event on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformResult {
    pub platform: String,
    pub status: Status,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub signals: BTreeMap<String, bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub screenshot: String,
    pub finished_at: DateTime<Utc>,
}

impl PlatformResult {
    pub fn from_machine(platform: &str, result: &MachineResult) -> Self {
        Self {
            platform: platform.to_string(),
            status: result.status,
            url: result.url.clone(),
            error: result.error.clone(),
            signals: result.signals.clone(),
            screenshot: result.screenshot.clone(),
            finished_at: Utc::now(),
        }
    }

    /// A platform that was never attempted.
    pub fn skipped(platform: &str, reason: impl Into<String>) -> Self {
        Self {
            platform: platform.to_string(),
            status: Status::Skipped,
            url: String::new(),
            error: reason.into(),
            signals: BTreeMap::new(),
            screenshot: String::new(),
            finished_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCreationReport {
    pub results: Vec<PlatformResult>,
    /// Best URL to promote: the first success in platform preference order.
    pub primary_url: String,
    pub summary: String,
}

impl EventCreationReport {
    pub fn new(results: Vec<PlatformResult>) -> Self {
        let primary_url = primary_url(&results);
        let attempted = results.iter().filter(|r| r.status != Status::Skipped).count();
        let ok = results.iter().filter(|r| r.status.is_ok()).count();
        Self {
            results,
            primary_url,
            summary: format!("Created on {ok}/{attempted} platforms"),
        }
    }

    pub fn get(&self, platform: &str) -> Option<&PlatformResult> {
        self.results.iter().find(|r| r.platform == platform)
    }

    pub fn any_published(&self) -> bool {
        self.results.iter().any(|r| r.status.is_ok())
    }
}

fn primary_url(results: &[PlatformResult]) -> String {
    let published = |r: &&PlatformResult| r.status.is_ok() && !r.url.is_empty();
    EventPlatform::ALL
        .iter()
        .find_map(|p| {
            results
                .iter()
                .filter(published)
                .find(|r| r.platform == p.name())
        })
        .or_else(|| results.iter().find(published))
        .map(|r| r.url.clone())
        .unwrap_or_default()
}

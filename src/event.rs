//! Event input model.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EventPilotError;
use crate::sanitize::{sanitize_input, sanitize_url};

/// The event being created and promoted. Build it with [`EventData::sanitized`]
/// or [`EventData::load`] so every field has been cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    #[serde(alias = "event_title")]
    pub title: String,
    #[serde(alias = "event_date")]
    pub date: String,
    #[serde(alias = "event_time")]
    pub time: String,
    #[serde(alias = "event_location")]
    pub location: String,
    #[serde(alias = "event_description")]
    pub description: String,
    /// RSVP URL, when the event already exists somewhere.
    #[serde(default, alias = "event_url")]
    pub url: String,
    #[serde(default)]
    pub meetup_group_url: String,
    #[serde(default)]
    pub discord_channel_id: String,
    #[serde(default)]
    pub facebook_page_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl EventData {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        location: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            time: time.into(),
            location: location.into(),
            description: description.into(),
            ..Default::default()
        }
        .sanitized()
    }

    /// Apply field length limits and prompt-injection cleaning.
    pub fn sanitized(self) -> Self {
        Self {
            title: sanitize_input(&self.title, 200),
            date: sanitize_input(&self.date, 100),
            time: sanitize_input(&self.time, 100),
            location: sanitize_input(&self.location, 500),
            description: sanitize_input(&self.description, 5000),
            url: sanitize_url(&self.url),
            meetup_group_url: sanitize_url(&self.meetup_group_url),
            ..self
        }
    }

    /// Read an event from a JSON file.
    pub fn load(path: &Path) -> Result<Self, EventPilotError> {
        let contents = std::fs::read_to_string(path)?;
        let event: EventData = serde_json::from_str(&contents)?;
        Ok(event.sanitized())
    }

    /// Missing required fields, as human-readable messages.
    pub fn validate(&self) -> Vec<String> {
        [
            (&self.title, "Event title is required"),
            (&self.date, "Event date is required"),
            (&self.time, "Event time is required"),
            (&self.location, "Event location is required"),
            (&self.description, "Event description is required"),
        ]
        .into_iter()
        .filter(|(value, _)| value.trim().is_empty())
        .map(|(_, msg)| msg.to_string())
        .collect()
    }

    pub fn formatted_datetime(&self) -> String {
        format!("{} at {}", self.date, self.time)
    }
}

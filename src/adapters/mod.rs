//! Per-platform strategies for the event-creation machine.
//!
//! A [`PlatformAdapter`] supplies URLs, the natural-language instruction for
//! each state, the success-URL predicate, per-state waits and an optional
//! post-submit cleanup instruction. Concrete adapters differ only in these
//! values; the machine never branches on which platform it is driving.

pub mod features;
mod luma;
mod meetup;
mod partiful;

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use features::{
    FeatureOptions, FeatureSupport, IntegrationConfig, RecurrencePattern, RecurringConfig,
    TicketConfig,
};
pub use luma::LumaAdapter;
pub use meetup::MeetupAdapter;
pub use partiful::PartifulAdapter;

use crate::error::EventPilotError;
use crate::event::EventData;
use crate::heuristics::contains_any;
use crate::state_machine::EventState;

/// Settle time after an action when a platform does not override it.
pub const DEFAULT_STEP_DELAY: Duration = Duration::from_millis(400);

/// Event data plus per-run extras shared by every adapter.
#[derive(Debug, Clone, Default)]
pub struct AdapterContext {
    pub event: EventData,
    /// Platform-specific descriptions keyed by platform name.
    pub descriptions: HashMap<String, String>,
    pub features: FeatureOptions,
}

impl AdapterContext {
    pub fn new(event: EventData) -> Self {
        Self {
            event,
            ..Default::default()
        }
    }

    pub fn with_descriptions(mut self, descriptions: HashMap<String, String>) -> Self {
        self.descriptions = descriptions;
        self
    }

    pub fn with_features(mut self, features: FeatureOptions) -> Self {
        self.features = features;
        self
    }

    /// The platform's tailored description, falling back to the event's own.
    pub fn description_for(&self, platform: &str) -> &str {
        self.descriptions
            .get(platform)
            .map(String::as_str)
            .unwrap_or(&self.event.description)
    }
}

pub trait PlatformAdapter: Send + Sync {
    /// Lowercase platform name, e.g. `luma`.
    fn name(&self) -> &str;

    fn context(&self) -> &AdapterContext;

    /// Where events are created. Empty means this platform cannot be
    /// attempted for this event; the machine then skips it.
    fn create_url(&self) -> String;

    /// Dashboard used for duplicate detection. Empty disables the check.
    fn home_url(&self) -> String {
        String::new()
    }

    /// Phrases that identify the creation form.
    fn form_indicators(&self) -> &[&str];

    fn is_form_page(&self, content: &str) -> bool {
        contains_any(content, self.form_indicators())
    }

    /// Instruction for the browser agent in `state`, or empty for nothing to do.
    fn prompt_for(&self, state: EventState) -> String;

    fn success_url_matches(&self, url: &str) -> bool;

    fn inter_step_delay(&self) -> Duration {
        DEFAULT_STEP_DELAY
    }

    /// Pause after acting in `state`.
    fn extra_wait(&self, _state: EventState) -> Duration {
        self.inter_step_delay()
    }

    /// Instruction to dismiss a post-submit interstitial, if the platform shows one.
    fn cleanup_prompt(&self) -> Option<String> {
        None
    }

    fn feature_support(&self) -> FeatureSupport {
        FeatureSupport::default()
    }

    fn skip_feature(&self, state: EventState) -> bool {
        self.context()
            .features
            .skips(&self.feature_support(), state)
    }

    fn event(&self) -> &EventData {
        &self.context().event
    }

    fn description(&self) -> &str {
        self.context().description_for(self.name())
    }
}

/// Generic instructions for the optional feature states, shared by adapters
/// whose UI has no quirks worth special-casing.
pub fn feature_prompt(ctx: &AdapterContext, state: EventState) -> String {
    let f = &ctx.features;
    match state {
        EventState::UploadImage => format!(
            "Find the cover image or 'add photo' area, choose to upload from a URL if offered, \
             and use this image: {}. Wait for the upload preview to appear.",
            f.image_url
        ),
        EventState::SetTickets => format!(
            "Open the tickets or registration settings and configure {}. Save the ticket settings.",
            f.ticket_summary()
        ),
        EventState::AddCohosts => format!(
            "Open the hosts or co-hosts section and invite these people as co-hosts: {}.",
            f.cohosts.join(", ")
        ),
        EventState::SetRecurring => format!(
            "Turn on the repeat or recurring option and set it to repeat {}.",
            f.recurrence_summary()
        ),
        EventState::SetIntegrations => {
            let mut wanted = Vec::new();
            if f.integrations.zoom {
                wanted.push("Zoom");
            }
            if f.integrations.google_meet {
                wanted.push("Google Meet");
            }
            format!(
                "Open the virtual event or integrations settings and add a {} link.",
                wanted.join(" and ")
            )
        }
        _ => String::new(),
    }
}

/// Platforms the machine can create events on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventPlatform {
    Luma,
    Meetup,
    Partiful,
}

impl EventPlatform {
    /// Default order; also the preference order for the primary event URL.
    pub const ALL: [EventPlatform; 3] =
        [EventPlatform::Luma, EventPlatform::Meetup, EventPlatform::Partiful];

    pub fn name(self) -> &'static str {
        match self {
            EventPlatform::Luma => "luma",
            EventPlatform::Meetup => "meetup",
            EventPlatform::Partiful => "partiful",
        }
    }

    /// Build the adapter for this platform.
    pub fn adapter(self, ctx: AdapterContext) -> Box<dyn PlatformAdapter> {
        match self {
            EventPlatform::Luma => Box::new(LumaAdapter::new(ctx)),
            EventPlatform::Meetup => {
                let group = ctx.event.meetup_group_url.clone();
                Box::new(MeetupAdapter::new(ctx, group))
            }
            EventPlatform::Partiful => Box::new(PartifulAdapter::new(ctx)),
        }
    }
}

impl fmt::Display for EventPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventPlatform {
    type Err = EventPilotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "luma" => Ok(EventPlatform::Luma),
            "meetup" => Ok(EventPlatform::Meetup),
            "partiful" => Ok(EventPlatform::Partiful),
            other => Err(EventPilotError::UnknownPlatform(other.to_string())),
        }
    }
}

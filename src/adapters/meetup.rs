use std::time::Duration;

use super::{AdapterContext, FeatureSupport, PlatformAdapter, feature_prompt};
use crate::state_machine::EventState;

const FORM_INDICATORS: &[&str] = &[
    "event details",
    "what's your event",
    "create event",
    "event title",
    "event name",
];

/// meetup.com. Events belong to a group, so without a group URL there is
/// nowhere to create one.
pub struct MeetupAdapter {
    ctx: AdapterContext,
    group_url: String,
}

impl MeetupAdapter {
    pub fn new(ctx: AdapterContext, group_url: impl Into<String>) -> Self {
        Self {
            ctx,
            group_url: group_url.into(),
        }
    }
}

impl PlatformAdapter for MeetupAdapter {
    fn name(&self) -> &str {
        "meetup"
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn create_url(&self) -> String {
        if self.group_url.is_empty() {
            return String::new();
        }
        format!("{}/events/create/", self.group_url.trim_end_matches('/'))
    }

    fn home_url(&self) -> String {
        "https://www.meetup.com/home".to_string()
    }

    fn form_indicators(&self) -> &[&str] {
        FORM_INDICATORS
    }

    fn prompt_for(&self, state: EventState) -> String {
        let event = self.event();
        match state {
            EventState::FillTitle => format!(
                "Find the event title or event name field, clear it, type exactly: {}, \
                 then click outside",
                event.title
            ),
            EventState::FillDate => format!(
                "Open the date picker and select {}. You may need to move between months.",
                event.date
            ),
            EventState::FillTime => format!("Find the start time field and enter: {}", event.time),
            EventState::FillLocation => format!(
                "Find the venue or location field, type: {}, and pick a suggestion or press Enter",
                event.location
            ),
            EventState::FillDescription => format!(
                "Find the description or 'about this event' field and type: {}",
                self.description()
            ),
            EventState::VerifyForm => {
                "Scroll through the whole form and check every required field has a value. \
                 Do not submit yet."
                    .to_string()
            }
            EventState::Submit => {
                "Click the 'Publish', 'Schedule Event' or 'Create Event' button and wait for \
                 the confirmation."
                    .to_string()
            }
            s if s.is_feature() => feature_prompt(&self.ctx, s),
            _ => String::new(),
        }
    }

    fn success_url_matches(&self, url: &str) -> bool {
        url.contains("meetup.com") && url.contains("/events/") && !url.contains("/create")
    }

    fn inter_step_delay(&self) -> Duration {
        Duration::from_secs(2)
    }

    fn feature_support(&self) -> FeatureSupport {
        FeatureSupport {
            image_upload: true,
            tickets: false,
            cohosts: true,
            recurring: true,
            integrations: false,
        }
    }
}

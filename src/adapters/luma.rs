use std::time::Duration;

use super::{AdapterContext, FeatureSupport, PlatformAdapter, feature_prompt};
use crate::state_machine::EventState;

const FORM_INDICATORS: &[&str] = &["event title", "create event", "what's your event", "add event"];

/// lu.ma. Its React date picker needs a longer settle after FILL_DATE.
pub struct LumaAdapter {
    ctx: AdapterContext,
}

impl LumaAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl PlatformAdapter for LumaAdapter {
    fn name(&self) -> &str {
        "luma"
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn create_url(&self) -> String {
        "https://lu.ma/create".to_string()
    }

    fn home_url(&self) -> String {
        "https://lu.ma/home".to_string()
    }

    fn form_indicators(&self) -> &[&str] {
        FORM_INDICATORS
    }

    fn prompt_for(&self, state: EventState) -> String {
        let event = self.event();
        match state {
            EventState::FillTitle => format!(
                "Click the event title field (it may read 'Event Title' or 'Untitled Event'), \
                 clear what is there, type exactly: {}, then click outside the field",
                event.title
            ),
            EventState::FillDate => format!(
                "Open the date field or calendar icon and pick the date: {}. \
                 Close the calendar once the date is selected",
                event.date
            ),
            EventState::FillTime => format!("Click the start time field and enter: {}", event.time),
            EventState::FillLocation => format!(
                "Click the location or venue field, type: {}, then choose the first suggestion \
                 or press Enter",
                event.location
            ),
            EventState::FillDescription => format!(
                "Click the description area (it may read 'Add a description'), clear it and type: {}",
                self.description()
            ),
            EventState::VerifyForm => {
                "Look over the form and confirm title, date, time and location are filled in. \
                 Do not submit yet."
                    .to_string()
            }
            EventState::Submit => {
                "Click the 'Create Event' or 'Publish' button and wait for the event page to load."
                    .to_string()
            }
            s if s.is_feature() => feature_prompt(&self.ctx, s),
            _ => String::new(),
        }
    }

    fn success_url_matches(&self, url: &str) -> bool {
        url.contains("lu.ma/") && !url.contains("/create") && !url.contains("/home")
    }

    fn inter_step_delay(&self) -> Duration {
        Duration::from_millis(500)
    }

    fn extra_wait(&self, state: EventState) -> Duration {
        match state {
            EventState::FillDate => Duration::from_millis(1500),
            _ => self.inter_step_delay(),
        }
    }

    fn feature_support(&self) -> FeatureSupport {
        FeatureSupport {
            image_upload: true,
            tickets: true,
            cohosts: true,
            recurring: true,
            integrations: true,
        }
    }
}

use std::time::Duration;

use super::{AdapterContext, FeatureSupport, PlatformAdapter, feature_prompt};
use crate::state_machine::EventState;

const FORM_INDICATORS: &[&str] = &[
    "untitled event",
    "event title",
    "add event",
    "create party",
    "what's the occasion",
];

/// partiful.com. Publishing usually opens a share modal that has to be
/// dismissed before the event page can be read.
pub struct PartifulAdapter {
    ctx: AdapterContext,
}

impl PartifulAdapter {
    pub fn new(ctx: AdapterContext) -> Self {
        Self { ctx }
    }
}

impl PlatformAdapter for PartifulAdapter {
    fn name(&self) -> &str {
        "partiful"
    }

    fn context(&self) -> &AdapterContext {
        &self.ctx
    }

    fn create_url(&self) -> String {
        "https://partiful.com/create".to_string()
    }

    fn home_url(&self) -> String {
        "https://partiful.com/home".to_string()
    }

    fn form_indicators(&self) -> &[&str] {
        FORM_INDICATORS
    }

    fn prompt_for(&self, state: EventState) -> String {
        let event = self.event();
        match state {
            EventState::FillTitle => format!(
                "Click the event title (it may read 'Untitled Event'), clear it, type exactly: {}, \
                 then click outside",
                event.title
            ),
            EventState::FillDate => {
                format!("Click the date or 'When' section and select: {}", event.date)
            }
            EventState::FillTime => format!("Click the time field and enter: {}", event.time),
            EventState::FillLocation => format!(
                "Click the location or 'Where' section, type: {}, and pick from the dropdown \
                 or press Enter",
                event.location
            ),
            EventState::FillDescription => format!(
                "Click the description or details field and type: {}",
                self.description()
            ),
            EventState::VerifyForm => {
                "Check that every event detail is filled in correctly. Do not publish yet."
                    .to_string()
            }
            EventState::Submit => {
                "Click the 'Save', 'Publish' or 'Create' button and wait for the page to change."
                    .to_string()
            }
            s if s.is_feature() => feature_prompt(&self.ctx, s),
            _ => String::new(),
        }
    }

    fn success_url_matches(&self, url: &str) -> bool {
        url.contains("partiful.com/e/")
    }

    fn inter_step_delay(&self) -> Duration {
        Duration::from_millis(600)
    }

    fn cleanup_prompt(&self) -> Option<String> {
        Some(
            "If a share, invite or 'tell your friends' modal is open, close it with the X button, \
             'Skip', 'Maybe later', or by clicking outside it"
                .to_string(),
        )
    }

    fn feature_support(&self) -> FeatureSupport {
        FeatureSupport {
            image_upload: true,
            tickets: true,
            cohosts: true,
            recurring: false,
            integrations: true,
        }
    }
}

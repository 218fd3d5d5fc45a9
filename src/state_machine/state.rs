use std::fmt;

use serde::{Deserialize, Serialize};

/// States of the event-creation machine.
///
/// The default flow is
/// INIT → CHECK_DUPLICATE → NAVIGATE → AUTH_CHECK → FILL_* → feature states →
/// VERIFY_FORM → SUBMIT → POST_SUBMIT → VERIFY_SUCCESS → DONE.
/// FAILED, NEEDS_AUTH, DUPLICATE and SKIPPED are terminal escapes reachable
/// from anywhere; AWAIT_2FA and RESUME_2FA are pause states outside the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventState {
    Init,
    CheckDuplicate,
    Navigate,
    AuthCheck,
    FillTitle,
    FillDate,
    FillTime,
    FillLocation,
    FillDescription,
    UploadImage,
    SetTickets,
    AddCohosts,
    SetRecurring,
    SetIntegrations,
    VerifyForm,
    Submit,
    PostSubmit,
    VerifySuccess,
    #[serde(rename = "await_2fa")]
    Await2fa,
    #[serde(rename = "resume_2fa")]
    Resume2fa,
    Done,
    Failed,
    NeedsAuth,
    Duplicate,
    Skipped,
}

/// The fixed linear flow, ending at DONE. Pause states are not part of it.
pub const STATE_FLOW: [EventState; 19] = [
    EventState::Init,
    EventState::CheckDuplicate,
    EventState::Navigate,
    EventState::AuthCheck,
    EventState::FillTitle,
    EventState::FillDate,
    EventState::FillTime,
    EventState::FillLocation,
    EventState::FillDescription,
    EventState::UploadImage,
    EventState::SetTickets,
    EventState::AddCohosts,
    EventState::SetRecurring,
    EventState::SetIntegrations,
    EventState::VerifyForm,
    EventState::Submit,
    EventState::PostSubmit,
    EventState::VerifySuccess,
    EventState::Done,
];

impl EventState {
    pub const COUNT: usize = 25;

    pub const ALL: [EventState; Self::COUNT] = [
        EventState::Init,
        EventState::CheckDuplicate,
        EventState::Navigate,
        EventState::AuthCheck,
        EventState::FillTitle,
        EventState::FillDate,
        EventState::FillTime,
        EventState::FillLocation,
        EventState::FillDescription,
        EventState::UploadImage,
        EventState::SetTickets,
        EventState::AddCohosts,
        EventState::SetRecurring,
        EventState::SetIntegrations,
        EventState::VerifyForm,
        EventState::Submit,
        EventState::PostSubmit,
        EventState::VerifySuccess,
        EventState::Await2fa,
        EventState::Resume2fa,
        EventState::Done,
        EventState::Failed,
        EventState::NeedsAuth,
        EventState::Duplicate,
        EventState::Skipped,
    ];

    /// Position in [`EventState::ALL`]; used to index per-state counters.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            EventState::Done
                | EventState::Failed
                | EventState::NeedsAuth
                | EventState::Duplicate
                | EventState::Skipped
        )
    }

    /// Waiting on a human to finish a step the automation cannot perform.
    pub fn is_pause(self) -> bool {
        matches!(self, EventState::Await2fa)
    }

    pub fn is_feature(self) -> bool {
        matches!(
            self,
            EventState::UploadImage
                | EventState::SetTickets
                | EventState::AddCohosts
                | EventState::SetRecurring
                | EventState::SetIntegrations
        )
    }

    /// Retry budget and backoff bounds for this state.
    pub fn config(self) -> StateConfig {
        use EventState::*;
        match self {
            CheckDuplicate => StateConfig::new(1, 0.5, DEFAULT_MAX_DELAY),
            Navigate => StateConfig::new(2, 1.0, DEFAULT_MAX_DELAY),
            AuthCheck => StateConfig::new(1, 0.5, DEFAULT_MAX_DELAY),
            FillTitle | FillDate | FillTime | FillLocation | FillDescription => {
                StateConfig::new(2, 0.75, DEFAULT_MAX_DELAY)
            }
            UploadImage => StateConfig::new(2, 1.5, 10.0),
            SetTickets | AddCohosts | SetRecurring | SetIntegrations => {
                StateConfig::new(2, 1.0, DEFAULT_MAX_DELAY)
            }
            VerifyForm => StateConfig::new(2, 1.0, DEFAULT_MAX_DELAY),
            // A second submit could create the event twice.
            Submit => StateConfig::new(1, 1.0, DEFAULT_MAX_DELAY),
            PostSubmit => StateConfig::new(1, 1.0, DEFAULT_MAX_DELAY),
            VerifySuccess => StateConfig::new(3, 1.5, 12.0),
            Await2fa => StateConfig::new(0, 0.0, 0.0),
            Resume2fa => StateConfig::new(1, 1.0, DEFAULT_MAX_DELAY),
            Init | Done | Failed | NeedsAuth | Duplicate | Skipped => StateConfig::default(),
        }
    }

    /// The state after this one in [`STATE_FLOW`], or `None` at the end of the
    /// flow and for states outside it.
    pub fn next(self) -> Option<EventState> {
        let idx = STATE_FLOW.iter().position(|s| *s == self)?;
        STATE_FLOW.get(idx + 1).copied()
    }
}

impl fmt::Display for EventState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventState::Init => "INIT",
            EventState::CheckDuplicate => "CHECK_DUPLICATE",
            EventState::Navigate => "NAVIGATE",
            EventState::AuthCheck => "AUTH_CHECK",
            EventState::FillTitle => "FILL_TITLE",
            EventState::FillDate => "FILL_DATE",
            EventState::FillTime => "FILL_TIME",
            EventState::FillLocation => "FILL_LOCATION",
            EventState::FillDescription => "FILL_DESCRIPTION",
            EventState::UploadImage => "UPLOAD_IMAGE",
            EventState::SetTickets => "SET_TICKETS",
            EventState::AddCohosts => "ADD_COHOSTS",
            EventState::SetRecurring => "SET_RECURRING",
            EventState::SetIntegrations => "SET_INTEGRATIONS",
            EventState::VerifyForm => "VERIFY_FORM",
            EventState::Submit => "SUBMIT",
            EventState::PostSubmit => "POST_SUBMIT",
            EventState::VerifySuccess => "VERIFY_SUCCESS",
            EventState::Await2fa => "AWAIT_2FA",
            EventState::Resume2fa => "RESUME_2FA",
            EventState::Done => "DONE",
            EventState::Failed => "FAILED",
            EventState::NeedsAuth => "NEEDS_AUTH",
            EventState::Duplicate => "DUPLICATE",
            EventState::Skipped => "SKIPPED",
        };
        f.write_str(name)
    }
}

pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_BASE_DELAY: f64 = 0.75;
pub const DEFAULT_MAX_DELAY: f64 = 8.0;
/// Jitter applied to per-state retry waits.
pub const STATE_BACKOFF_JITTER: f64 = 0.2;

/// Per-state retry configuration.
///
/// `max_retries` is the number of failed attempts the state may accumulate
/// before it is abandoned: the failure that brings the count to `max_retries`
/// escalates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    pub max_retries: u32,
    /// Seconds.
    pub base_delay: f64,
    /// Seconds.
    pub max_delay: f64,
}

impl StateConfig {
    pub const fn new(max_retries: u32, base_delay: f64, max_delay: f64) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
        }
    }
}

impl Default for StateConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY)
    }
}

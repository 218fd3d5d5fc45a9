//! The event-creation driver.
//!
//! One [`EventCreationMachine`] drives one (event, platform) pair through the
//! state flow until it reaches a terminal state. Handler failures never escape
//! [`EventCreationMachine::run`]; they are retried against the state's budget
//! and then escalated.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::observer::{MachineObserver, NoopObserver};
use super::state::{EventState, STATE_BACKOFF_JITTER, STATE_FLOW};
use crate::adapters::PlatformAdapter;
use crate::backoff::exponential_backoff;
use crate::gateway::{ActionExecutor, BrowserActions, GatewayError};
use crate::heuristics::{has_manage_affordance, has_validation_errors, needs_auth, needs_second_factor};
use crate::report::Status;

const NAVIGATE_SETTLE: Duration = Duration::from_millis(500);
const REVIEW_SETTLE: Duration = Duration::from_millis(500);
const SUBMIT_SETTLE: Duration = Duration::from_secs(2);
const CLEANUP_SETTLE: Duration = Duration::from_secs(1);

/// What a handler reports back to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateResult {
    pub success: bool,
    /// Overrides the next state in the flow. On failure this escalates
    /// immediately, whatever budget is left.
    pub next_state: Option<EventState>,
    pub error: String,
}

impl StateResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            next_state: None,
            error: String::new(),
        }
    }

    pub fn ok_to(next: EventState) -> Self {
        Self {
            next_state: Some(next),
            ..Self::ok()
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            next_state: None,
            error: error.into(),
        }
    }

    pub fn fail_to(next: EventState, error: impl Into<String>) -> Self {
        Self {
            next_state: Some(next),
            ..Self::fail(error)
        }
    }
}

impl From<GatewayError> for StateResult {
    fn from(err: GatewayError) -> Self {
        StateResult::fail(err.to_string())
    }
}

/// Final output of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineResult {
    pub status: Status,
    pub url: String,
    pub error: String,
    pub screenshot: String,
    pub signals: BTreeMap<String, bool>,
    pub final_state: EventState,
}

/// Everything needed to rebuild a machine between two loop iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub platform: String,
    pub state: EventState,
    #[serde(default)]
    pub completed_states: Vec<EventState>,
    /// Non-zero attempt counters only.
    #[serde(default)]
    pub attempts: BTreeMap<EventState, u32>,
    #[serde(default)]
    pub event_url: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub screenshot: String,
    #[serde(default)]
    pub signals: BTreeMap<String, bool>,
}

impl MachineSnapshot {
    /// The state a machine restored from this snapshot starts in.
    ///
    /// A run paused on two-factor verification resumes by re-checking the
    /// page. Anything before SUBMIT starts over from the duplicate check on a
    /// fresh page. From SUBMIT on the run only re-verifies; it never submits
    /// again.
    pub fn resume_state(&self) -> EventState {
        use EventState::*;
        match self.state {
            Await2fa | Resume2fa => Resume2fa,
            Submit | PostSubmit | VerifySuccess => VerifySuccess,
            s if s == Init || s.is_terminal() => s,
            _ => CheckDuplicate,
        }
    }
}

pub struct EventCreationMachine<'a, C> {
    client: &'a C,
    adapter: &'a dyn PlatformAdapter,
    observer: &'a dyn MachineObserver,
    state: EventState,
    attempts: [u32; EventState::COUNT],
    completed: Vec<EventState>,
    event_url: String,
    error: String,
    screenshot: String,
    signals: BTreeMap<String, bool>,
}

impl<'a, C: ActionExecutor> EventCreationMachine<'a, C> {
    pub fn new(client: &'a C, adapter: &'a dyn PlatformAdapter) -> Self {
        Self {
            client,
            adapter,
            observer: &NoopObserver,
            state: EventState::Init,
            attempts: [0; EventState::COUNT],
            completed: Vec::new(),
            event_url: String::new(),
            error: String::new(),
            screenshot: String::new(),
            signals: BTreeMap::new(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn MachineObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Rebuild a machine from a snapshot, starting at [`MachineSnapshot::resume_state`].
    ///
    /// Only progress carries over: attempt counters and the completed states
    /// ahead of the resume point. The error, screenshot, signals and URL of
    /// the earlier run start empty, and the resume state gets a fresh budget.
    pub fn restore(
        client: &'a C,
        adapter: &'a dyn PlatformAdapter,
        snapshot: &MachineSnapshot,
    ) -> Self {
        let mut machine = Self::new(client, adapter);
        let state = snapshot.resume_state();
        machine.state = state;
        for (s, count) in &snapshot.attempts {
            machine.attempts[s.index()] = *count;
        }
        machine.attempts[state.index()] = 0;
        machine.completed = match STATE_FLOW.iter().position(|s| *s == state) {
            Some(pos) => snapshot
                .completed_states
                .iter()
                .copied()
                .filter(|s| STATE_FLOW[..pos].contains(s))
                .collect(),
            None => snapshot.completed_states.clone(),
        };
        machine
    }

    pub fn state(&self) -> EventState {
        self.state
    }

    pub fn attempts(&self, state: EventState) -> u32 {
        self.attempts[state.index()]
    }

    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            platform: self.adapter.name().to_string(),
            state: self.state,
            completed_states: self.completed.clone(),
            attempts: EventState::ALL
                .into_iter()
                .filter(|s| self.attempts[s.index()] > 0)
                .map(|s| (s, self.attempts[s.index()]))
                .collect(),
            event_url: self.event_url.clone(),
            error: self.error.clone(),
            screenshot: self.screenshot.clone(),
            signals: self.signals.clone(),
        }
    }

    /// Drive the machine to a terminal state.
    pub async fn run(&mut self) -> MachineResult {
        let platform = self.adapter.name().to_string();
        info!(platform = %platform, state = %self.state, "starting event creation");

        while !self.state.is_terminal() {
            let state = self.state;
            self.observer.state_entered(&platform, state);
            debug!(platform = %platform, state = %state, "entering state");

            let result = self.handle(state).await;

            if result.success {
                let next = result
                    .next_state
                    .or_else(|| state.next())
                    .unwrap_or(EventState::Done);
                self.completed.push(state);
                self.attempts[next.index()] = 0;
                self.transition(next);
                continue;
            }

            self.attempts[state.index()] += 1;
            let attempt = self.attempts[state.index()];
            let config = state.config();

            if result.next_state.is_none() && attempt < config.max_retries {
                let delay = Duration::from_secs_f64(exponential_backoff(
                    attempt - 1,
                    config.base_delay,
                    config.max_delay,
                    STATE_BACKOFF_JITTER,
                ));
                warn!(
                    platform = %platform,
                    state = %state,
                    attempt,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %result.error,
                    "state failed, retrying"
                );
                self.observer
                    .retry_scheduled(&platform, state, attempt, delay, &result.error);
                tokio::time::sleep(delay).await;
                continue;
            }

            let next = result.next_state.unwrap_or(EventState::Failed);
            warn!(
                platform = %platform,
                state = %state,
                attempt,
                next = %next,
                error = %result.error,
                "abandoning state"
            );
            self.error = result.error;
            if !next.is_pause() {
                self.capture_screenshot(&platform, state).await;
            }
            self.observer
                .state_abandoned(&platform, state, next, &self.error);
            self.transition(next);
        }

        let result = self.result();
        info!(
            platform = %platform,
            status = %result.status,
            url = %result.url,
            "event creation finished"
        );
        self.observer.run_finished(&platform, &result);
        result
    }

    fn transition(&mut self, next: EventState) {
        self.state = next;
        self.observer.snapshot_taken(&self.snapshot());
    }

    fn result(&self) -> MachineResult {
        MachineResult {
            status: Status::from_terminal(self.state),
            url: self.event_url.clone(),
            error: self.error.clone(),
            screenshot: self.screenshot.clone(),
            signals: self.signals.clone(),
            final_state: self.state,
        }
    }

    async fn capture_screenshot(&mut self, platform: &str, state: EventState) {
        match self.client.screenshot().await {
            Ok(url) => self.screenshot = url,
            Err(e) => warn!(platform, state = %state, error = %e, "screenshot capture failed"),
        }
    }

    async fn handle(&mut self, state: EventState) -> StateResult {
        use EventState::*;
        let outcome = match state {
            Init => Ok(StateResult::ok()),
            CheckDuplicate => Ok(self.check_duplicate().await),
            Navigate => self.navigate().await,
            AuthCheck => self.auth_check().await,
            FillTitle | FillDate | FillTime | FillLocation | FillDescription => {
                self.fill(state).await
            }
            UploadImage | SetTickets | AddCohosts | SetRecurring | SetIntegrations => {
                self.feature(state).await
            }
            VerifyForm => self.verify_form().await,
            Submit => self.submit().await,
            PostSubmit => Ok(self.post_submit().await),
            VerifySuccess => self.verify_success().await,
            Await2fa => Ok(StateResult::fail_to(
                NeedsAuth,
                format!(
                    "Two-factor verification pending for {} - complete it in the browser and resume",
                    self.display_name()
                ),
            )),
            Resume2fa => self.resume_2fa().await,
            Done | Failed | NeedsAuth | Duplicate | Skipped => Ok(StateResult::fail_to(
                Failed,
                format!("{state} is terminal and has no handler"),
            )),
        };
        outcome.unwrap_or_else(StateResult::from)
    }

    fn display_name(&self) -> String {
        let name = self.adapter.name();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    async fn check_duplicate(&mut self) -> StateResult {
        let home = self.adapter.home_url();
        if home.is_empty() {
            return StateResult::ok();
        }
        let title = self.adapter.event().title.to_lowercase();
        match self.client.navigate(&home).await {
            Ok(page) if !title.is_empty() && page.content.to_lowercase().contains(&title) => {
                StateResult::fail_to(
                    EventState::Duplicate,
                    format!(
                        "Event '{}' already exists on {}",
                        self.adapter.event().title,
                        self.display_name()
                    ),
                )
            }
            Ok(_) => StateResult::ok(),
            Err(e) => {
                warn!(platform = %self.adapter.name(), error = %e, "duplicate check failed, continuing");
                StateResult::ok()
            }
        }
    }

    async fn navigate(&mut self) -> Result<StateResult, GatewayError> {
        let url = self.adapter.create_url();
        if url.is_empty() {
            return Ok(StateResult::fail_to(
                EventState::Skipped,
                format!("{} cannot be attempted for this event", self.display_name()),
            ));
        }
        self.client.navigate(&url).await?;
        tokio::time::sleep(NAVIGATE_SETTLE).await;
        Ok(StateResult::ok())
    }

    async fn auth_check(&mut self) -> Result<StateResult, GatewayError> {
        let page = self.client.get_page().await?;
        if needs_second_factor(&page.content) {
            return Ok(StateResult::fail_to(
                EventState::Await2fa,
                format!("{} is asking for two-factor verification", self.display_name()),
            ));
        }
        if needs_auth(&page.content) {
            return Ok(StateResult::fail_to(
                EventState::NeedsAuth,
                format!(
                    "Login required for {} - please log in via browser and retry",
                    self.display_name()
                ),
            ));
        }
        if !self.adapter.is_form_page(&page.content) {
            return Ok(StateResult::fail(format!(
                "Not on the {} create form",
                self.display_name()
            )));
        }
        Ok(StateResult::ok())
    }

    async fn fill(&mut self, state: EventState) -> Result<StateResult, GatewayError> {
        let prompt = self.adapter.prompt_for(state);
        if prompt.is_empty() {
            return Ok(StateResult::ok());
        }
        self.client.perform_task(&prompt).await?;
        tokio::time::sleep(self.adapter.extra_wait(state)).await;

        if state == EventState::FillTitle {
            let title = self.adapter.event().title.to_lowercase();
            match self.client.get_page().await {
                Ok(page) if page.content.to_lowercase().contains(&title) => {
                    debug!(platform = %self.adapter.name(), "title visible after fill");
                }
                Ok(_) => {
                    warn!(platform = %self.adapter.name(), "title not visible after fill");
                }
                Err(e) => {
                    debug!(platform = %self.adapter.name(), error = %e, "could not re-read page after fill");
                }
            }
        }
        Ok(StateResult::ok())
    }

    async fn feature(&mut self, state: EventState) -> Result<StateResult, GatewayError> {
        if self.adapter.skip_feature(state) {
            debug!(platform = %self.adapter.name(), state = %state, "feature not requested or unsupported");
            return Ok(StateResult::ok());
        }
        let prompt = self.adapter.prompt_for(state);
        if prompt.is_empty() {
            return Ok(StateResult::ok());
        }
        self.client.perform_task(&prompt).await?;
        tokio::time::sleep(self.adapter.extra_wait(state)).await;
        Ok(StateResult::ok())
    }

    async fn verify_form(&mut self) -> Result<StateResult, GatewayError> {
        let prompt = self.adapter.prompt_for(EventState::VerifyForm);
        if !prompt.is_empty() {
            if let Err(e) = self.client.perform_task(&prompt).await {
                debug!(platform = %self.adapter.name(), error = %e, "form review prompt failed");
            }
            tokio::time::sleep(REVIEW_SETTLE).await;
        }
        let page = self.client.get_page().await?;
        if has_validation_errors(&page.content) {
            return Ok(StateResult::fail("Form has validation errors"));
        }
        Ok(StateResult::ok())
    }

    async fn submit(&mut self) -> Result<StateResult, GatewayError> {
        let prompt = self.adapter.prompt_for(EventState::Submit);
        if prompt.is_empty() {
            return Ok(StateResult::fail(format!(
                "No submit instruction for {}",
                self.display_name()
            )));
        }
        self.client.perform_task(&prompt).await?;
        tokio::time::sleep(SUBMIT_SETTLE).await;
        Ok(StateResult::ok())
    }

    async fn post_submit(&mut self) -> StateResult {
        if let Some(prompt) = self.adapter.cleanup_prompt() {
            if let Err(e) = self.client.perform_task(&prompt).await {
                debug!(platform = %self.adapter.name(), error = %e, "post-submit cleanup failed");
            }
            tokio::time::sleep(CLEANUP_SETTLE).await;
        }
        StateResult::ok()
    }

    async fn verify_success(&mut self) -> Result<StateResult, GatewayError> {
        let page = self.client.get_page().await?;
        let title = self.adapter.event().title.to_lowercase();
        let content = page.content.to_lowercase();

        let url_success = self.adapter.success_url_matches(&page.url);
        let signals = BTreeMap::from([
            ("url_success".to_string(), url_success),
            (
                "title_visible".to_string(),
                !title.is_empty() && content.contains(&title),
            ),
            ("edit_button".to_string(), has_manage_affordance(&page.content)),
            (
                "no_create_form".to_string(),
                !self.adapter.is_form_page(&page.content),
            ),
        ]);
        let positive = signals.values().filter(|v| **v).count();
        self.signals = signals;

        debug!(
            platform = %self.adapter.name(),
            url = %page.url,
            positive,
            signals = ?self.signals,
            "verification signals"
        );

        if (url_success && positive >= 2) || positive >= 3 {
            self.event_url = page.url;
            return Ok(StateResult::ok_to(EventState::Done));
        }
        Ok(StateResult::fail(format!(
            "Could not confirm the event was created ({positive}/4 signals)"
        )))
    }

    async fn resume_2fa(&mut self) -> Result<StateResult, GatewayError> {
        let page = self.client.get_page().await?;
        if needs_auth(&page.content) {
            return Ok(StateResult::fail_to(
                EventState::NeedsAuth,
                format!("{} is still asking for verification", self.display_name()),
            ));
        }
        Ok(StateResult::ok_to(EventState::AuthCheck))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::{Value, json};

    use crate::adapters::{AdapterContext, FeatureOptions, FeatureSupport, feature_prompt};
    use crate::event::EventData;
    use crate::gateway::browser::{FETCH_WEBPAGE, NAVIGATE, PERFORM_WEB_TASK, TAKE_SCREENSHOT};

    const CREATE: &str = "https://events.test/create";
    const HOME: &str = "https://events.test/home";
    const FORM: &str = "<h1>Create Event</h1> Name your event";
    const PUBLISHED_URL: &str = "https://events.test/e/abc";

    /// Adapter whose prompts are `do {STATE}` so the fake can tell them apart.
    struct TestAdapter {
        ctx: AdapterContext,
        create_url: String,
        home_url: String,
        cleanup: Option<String>,
        support: FeatureSupport,
    }

    impl TestAdapter {
        fn new() -> Self {
            Self {
                ctx: AdapterContext::new(EventData::new(
                    "Coffee & Code",
                    "January 25, 2026",
                    "6:00 PM EST",
                    "Indy Hall",
                    "Weekly meetup",
                )),
                create_url: CREATE.into(),
                home_url: HOME.into(),
                cleanup: None,
                support: FeatureSupport::default(),
            }
        }
    }

    impl PlatformAdapter for TestAdapter {
        fn name(&self) -> &str {
            "testplatform"
        }
        fn context(&self) -> &AdapterContext {
            &self.ctx
        }
        fn create_url(&self) -> String {
            self.create_url.clone()
        }
        fn home_url(&self) -> String {
            self.home_url.clone()
        }
        fn form_indicators(&self) -> &[&str] {
            &["create event"]
        }
        fn prompt_for(&self, state: EventState) -> String {
            if state.is_feature() {
                return feature_prompt(&self.ctx, state);
            }
            format!("do {state}")
        }
        fn success_url_matches(&self, url: &str) -> bool {
            url.contains("events.test/e/")
        }
        fn cleanup_prompt(&self) -> Option<String> {
            self.cleanup.clone()
        }
        fn feature_support(&self) -> FeatureSupport {
            self.support
        }
    }

    fn page(content: &str, url: &str) -> Value {
        json!({ "content": content, "url": url })
    }

    /// In-memory browser. Serves `form` until the submit prompt runs, then
    /// `published` pages in order, repeating the last one.
    struct FakeBrowser {
        calls: Mutex<Vec<String>>,
        home_content: String,
        form: Value,
        published: Mutex<VecDeque<Value>>,
        submitted: AtomicBool,
        fail_navigate: bool,
        fail_prompt: Option<String>,
        fail_screenshot: bool,
    }

    impl FakeBrowser {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                home_content: "Your upcoming events: none".into(),
                form: page(FORM, CREATE),
                published: Mutex::new(VecDeque::from([page(
                    "Coffee & Code - Manage event - Share",
                    PUBLISHED_URL,
                )])),
                submitted: AtomicBool::new(false),
                fail_navigate: false,
                fail_prompt: None,
                fail_screenshot: false,
            }
        }

        fn with_form(mut self, content: &str) -> Self {
            self.form = page(content, CREATE);
            self
        }

        fn with_published(self, pages: Vec<Value>) -> Self {
            *self.published.lock().unwrap() = pages.into();
            self
        }

        fn count(&self, call: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn failure(action: &str) -> GatewayError {
            GatewayError::Platform {
                action: action.into(),
                message: "browser session lost".into(),
            }
        }
    }

    impl ActionExecutor for FakeBrowser {
        async fn execute(&self, action: &str, params: Value) -> Result<Value, GatewayError> {
            match action {
                NAVIGATE => {
                    let url = params["url"].as_str().unwrap_or_default().to_string();
                    self.calls.lock().unwrap().push(format!("navigate {url}"));
                    if url == HOME {
                        return Ok(page(&self.home_content, HOME));
                    }
                    if self.fail_navigate {
                        return Err(Self::failure(action));
                    }
                    Ok(page("", &url))
                }
                FETCH_WEBPAGE => {
                    self.calls.lock().unwrap().push("fetch".into());
                    if !self.submitted.load(Ordering::SeqCst) {
                        return Ok(self.form.clone());
                    }
                    let mut pages = self.published.lock().unwrap();
                    if pages.len() > 1 {
                        Ok(pages.pop_front().unwrap())
                    } else {
                        Ok(pages.front().cloned().unwrap_or(Value::Null))
                    }
                }
                PERFORM_WEB_TASK => {
                    let prompt = params["prompt"].as_str().unwrap_or_default().to_string();
                    self.calls.lock().unwrap().push(prompt.clone());
                    if self.fail_prompt.as_deref() == Some(prompt.as_str()) {
                        return Err(Self::failure(action));
                    }
                    if prompt == "do SUBMIT" {
                        self.submitted.store(true, Ordering::SeqCst);
                    }
                    Ok(json!({ "status": "done" }))
                }
                TAKE_SCREENSHOT => {
                    self.calls.lock().unwrap().push("screenshot".into());
                    if self.fail_screenshot {
                        return Err(Self::failure(action));
                    }
                    Ok(json!({ "url": "https://shots.test/1.png" }))
                }
                other => Err(GatewayError::Malformed {
                    action: other.into(),
                    message: "unexpected action".into(),
                }),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn happy_path_publishes() {
        let browser = FakeBrowser::new();
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(result.url, PUBLISHED_URL);
        assert_eq!(result.final_state, EventState::Done);
        assert!(result.error.is_empty());
        assert!(result.screenshot.is_empty());
        assert_eq!(result.signals.get("url_success"), Some(&true));
        for state in ["FILL_TITLE", "FILL_DATE", "FILL_TIME", "FILL_LOCATION", "FILL_DESCRIPTION"] {
            assert_eq!(browser.count(&format!("do {state}")), 1);
        }
        assert_eq!(browser.count("do SUBMIT"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sign_in_page_needs_auth() {
        let browser = FakeBrowser::new().with_form("Please sign in to continue");
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::NeedsAuth);
        assert!(result.error.contains("Login required for Testplatform"));
        assert_eq!(machine.attempts(EventState::AuthCheck), 1);
        assert_eq!(browser.count("fetch"), 1);
        assert!(!browser.calls().iter().any(|c| c.starts_with("do FILL")));
    }

    #[tokio::test(start_paused = true)]
    async fn title_on_home_page_is_duplicate() {
        let mut browser = FakeBrowser::new();
        browser.home_content = "Upcoming: COFFEE & CODE, Jan 25".into();
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Duplicate);
        assert_eq!(browser.count(&format!("navigate {CREATE}")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_create_url_is_skipped_without_retry() {
        let browser = FakeBrowser::new();
        let mut adapter = TestAdapter::new();
        adapter.create_url = String::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Skipped);
        assert_eq!(machine.attempts(EventState::Navigate), 1);
        assert!(!browser.calls().iter().any(|c| c.starts_with("do ")));
    }

    #[tokio::test(start_paused = true)]
    async fn url_plus_one_signal_publishes() {
        // Title visible, but still looks like the form and has no manage link.
        let browser = FakeBrowser::new()
            .with_published(vec![page("Create Event: Coffee & Code", PUBLISHED_URL)]);
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(result.signals.values().filter(|v| **v).count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn two_signals_without_url_exhausts_verification() {
        let browser = FakeBrowser::new().with_published(vec![page(
            "Coffee & Code is live",
            "https://events.test/dashboard",
        )]);
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(
            machine.attempts(EventState::VerifySuccess),
            EventState::VerifySuccess.config().max_retries
        );
        assert_eq!(result.signals.get("url_success"), Some(&false));
        assert_eq!(result.screenshot, "https://shots.test/1.png");
        assert!(result.url.is_empty());
        assert_eq!(browser.count("do SUBMIT"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_read_then_success() {
        let browser = FakeBrowser::new().with_published(vec![
            page("Processing...", CREATE),
            page("Coffee & Code - Edit event", PUBLISHED_URL),
        ]);
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(machine.attempts(EventState::VerifySuccess), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_state_runs_exactly_its_budget() {
        let mut browser = FakeBrowser::new();
        browser.fail_navigate = true;
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(
            browser.count(&format!("navigate {CREATE}")),
            EventState::Navigate.config().max_retries as usize
        );
        assert!(result.error.contains("browser session lost"));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_is_never_repeated() {
        let mut browser = FakeBrowser::new();
        browser.fail_prompt = Some("do SUBMIT".into());
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(browser.count("do SUBMIT"), 1);
        assert_eq!(browser.count("do VERIFY_SUCCESS"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn screenshot_failure_keeps_primary_error() {
        let mut browser = FakeBrowser::new();
        browser.fail_navigate = true;
        browser.fail_screenshot = true;
        let adapter = TestAdapter::new();
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Failed);
        assert!(result.screenshot.is_empty());
        assert!(result.error.contains("browser session lost"));
        assert_eq!(browser.count("screenshot"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn validation_errors_fail_verify_form() {
        let browser = FakeBrowser::new().with_form("Create Event - Title can't be blank");
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Failed);
        assert_eq!(machine.attempts(EventState::VerifyForm), 2);
        assert_eq!(browser.count("do SUBMIT"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn review_prompt_failure_is_ignored() {
        let mut browser = FakeBrowser::new();
        browser.fail_prompt = Some("do VERIFY_FORM".into());
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(machine.attempts(EventState::VerifyForm), 0);
        assert_eq!(browser.count("do VERIFY_FORM"), 1);
        assert_eq!(browser.count("do SUBMIT"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cleanup_failure_is_ignored() {
        let mut browser = FakeBrowser::new();
        browser.fail_prompt = Some("close the modal".into());
        let mut adapter = TestAdapter::new();
        adapter.cleanup = Some("close the modal".into());
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(browser.count("close the modal"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn requested_features_run_when_supported() {
        let browser = FakeBrowser::new();
        let mut adapter = TestAdapter::new();
        adapter.ctx = adapter.ctx.clone().with_features(FeatureOptions {
            image_url: "https://img.test/cover.png".into(),
            cohosts: vec!["host@x.org".into()],
            ..Default::default()
        });
        adapter.support = FeatureSupport {
            image_upload: true,
            ..Default::default()
        };
        let result = EventCreationMachine::new(&browser, &adapter).run().await;

        assert_eq!(result.status, Status::Published);
        let calls = browser.calls();
        assert!(calls.iter().any(|c| c.contains("https://img.test/cover.png")));
        assert!(!calls.iter().any(|c| c.contains("host@x.org")));
    }

    #[tokio::test(start_paused = true)]
    async fn second_factor_pauses_then_needs_auth() {
        let browser = FakeBrowser::new().with_form("Enter the verification code we sent you");
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        let result = machine.run().await;

        assert_eq!(result.status, Status::NeedsAuth);
        assert!(result.error.contains("Two-factor verification pending"));
        assert!(!machine.snapshot().completed_states.contains(&EventState::AuthCheck));
        assert_eq!(result.screenshot, "https://shots.test/1.png");
        assert_eq!(browser.count("screenshot"), 1);
        assert!(browser.calls().iter().all(|c| !c.starts_with("do FILL")));
    }

    /// Keeps every snapshot the machine reports.
    #[derive(Default)]
    struct SnapshotLog(Mutex<Vec<MachineSnapshot>>);

    impl MachineObserver for SnapshotLog {
        fn snapshot_taken(&self, snapshot: &MachineSnapshot) {
            self.0.lock().unwrap().push(snapshot.clone());
        }
    }

    fn snapshot_at(state: EventState) -> MachineSnapshot {
        MachineSnapshot {
            platform: "testplatform".into(),
            state,
            completed_states: STATE_FLOW
                .into_iter()
                .take_while(|s| *s != state)
                .collect(),
            attempts: BTreeMap::from([(state, 1)]),
            event_url: String::new(),
            error: "earlier failure".into(),
            screenshot: "https://shots.test/old.png".into(),
            signals: BTreeMap::new(),
        }
    }

    #[test]
    fn resume_points() {
        use EventState::*;
        for (saved, resumed) in [
            (Init, Init),
            (Navigate, CheckDuplicate),
            (AuthCheck, CheckDuplicate),
            (FillDate, CheckDuplicate),
            (VerifyForm, CheckDuplicate),
            (Submit, VerifySuccess),
            (PostSubmit, VerifySuccess),
            (VerifySuccess, VerifySuccess),
            (Await2fa, Resume2fa),
            (Failed, Failed),
        ] {
            assert_eq!(snapshot_at(saved).resume_state(), resumed, "saved at {saved}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn restored_2fa_snapshot_resumes_at_auth_check() {
        let gated = FakeBrowser::new().with_form("Enter the verification code we sent you");
        let adapter = TestAdapter::new();
        let log = SnapshotLog::default();
        EventCreationMachine::new(&gated, &adapter)
            .with_observer(&log)
            .run()
            .await;
        let snapshot = log
            .0
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.state == EventState::Await2fa)
            .cloned()
            .unwrap();
        assert!(!snapshot.error.is_empty());

        let browser = FakeBrowser::new();
        let mut machine = EventCreationMachine::restore(&browser, &adapter, &snapshot);
        assert_eq!(machine.state(), EventState::Resume2fa);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Published);
        assert!(result.error.is_empty());
        assert!(result.screenshot.is_empty());
        assert_eq!(browser.count(&format!("navigate {CREATE}")), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restored_submit_snapshot_only_verifies() {
        let browser = FakeBrowser::new();
        browser.submitted.store(true, Ordering::SeqCst);
        let adapter = TestAdapter::new();
        let mut machine =
            EventCreationMachine::restore(&browser, &adapter, &snapshot_at(EventState::Submit));
        assert_eq!(machine.state(), EventState::VerifySuccess);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(result.url, PUBLISHED_URL);
        assert!(result.error.is_empty());
        assert_eq!(browser.count("do SUBMIT"), 0);
        assert!(!browser.calls().iter().any(|c| c.starts_with("navigate")));
    }

    #[tokio::test(start_paused = true)]
    async fn restored_mid_fill_snapshot_starts_over() {
        let browser = FakeBrowser::new();
        let adapter = TestAdapter::new();
        let mut machine =
            EventCreationMachine::restore(&browser, &adapter, &snapshot_at(EventState::FillDate));
        assert_eq!(machine.state(), EventState::CheckDuplicate);
        assert_eq!(machine.snapshot().completed_states, vec![EventState::Init]);
        let result = machine.run().await;

        assert_eq!(result.status, Status::Published);
        assert_eq!(browser.count(&format!("navigate {HOME}")), 1);
        assert_eq!(browser.count(&format!("navigate {CREATE}")), 1);
        assert_eq!(browser.count("do FILL_TITLE"), 1);
        assert_eq!(browser.count("do SUBMIT"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn snapshot_round_trips_through_json() {
        let browser = FakeBrowser::new();
        let adapter = TestAdapter::new();
        let mut machine = EventCreationMachine::new(&browser, &adapter);
        machine.run().await;

        let snapshot = machine.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MachineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.state, EventState::Done);
        assert_eq!(back.event_url, PUBLISHED_URL);
    }
}

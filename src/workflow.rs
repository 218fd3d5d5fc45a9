//! Creating one event on several platforms.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::adapters::{AdapterContext, EventPlatform, FeatureOptions};
use crate::error::EventPilotError;
use crate::event::EventData;
use crate::gateway::ActionExecutor;
use crate::report::{EventCreationReport, PlatformResult};
use crate::state_machine::{
    CheckpointRecorder, CheckpointStore, EventCreationMachine, MachineObserver, NoopObserver,
    Observers,
};

pub const DEFAULT_TENANT: &str = "default";

/// Per-run extras beyond the event itself.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOptions {
    /// Platform-specific descriptions keyed by platform name.
    pub descriptions: HashMap<String, String>,
    pub features: FeatureOptions,
    /// Checkpoint namespace; [`DEFAULT_TENANT`] when unset.
    pub tenant: Option<String>,
}

/// Drives one machine per platform, one platform at a time so browser
/// sessions never overlap.
pub struct EventCreationWorkflow<'a, C> {
    client: &'a C,
    observer: &'a dyn MachineObserver,
    checkpoints: Option<&'a CheckpointStore>,
}

impl<'a, C: ActionExecutor> EventCreationWorkflow<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            observer: &NoopObserver,
            checkpoints: None,
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn MachineObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Record progress and resume from matching checkpoints.
    pub fn with_checkpoints(mut self, store: &'a CheckpointStore) -> Self {
        self.checkpoints = Some(store);
        self
    }

    pub async fn run(
        &self,
        event: &EventData,
        platforms: &[EventPlatform],
        skip: &[EventPlatform],
        options: &WorkflowOptions,
    ) -> Result<EventCreationReport> {
        let problems = event.validate();
        if !problems.is_empty() {
            return Err(EventPilotError::InvalidEvent(problems).into());
        }

        let tenant = options.tenant.as_deref().unwrap_or(DEFAULT_TENANT);
        let mut results = Vec::with_capacity(platforms.len());

        for &platform in platforms {
            if skip.contains(&platform) {
                info!(platform = %platform, "skipping by request");
                results.push(PlatformResult::skipped(platform.name(), "Skipped by request"));
                continue;
            }
            let ctx = AdapterContext::new(event.clone())
                .with_descriptions(options.descriptions.clone())
                .with_features(options.features.clone());
            let result = self
                .create_on(platform, ctx, tenant)
                .await
                .with_context(|| format!("creating event on {platform}"))?;
            results.push(result);
        }

        let report = EventCreationReport::new(results);
        info!(summary = %report.summary, primary_url = %report.primary_url, "event creation done");
        Ok(report)
    }

    async fn create_on(
        &self,
        platform: EventPlatform,
        ctx: AdapterContext,
        tenant: &str,
    ) -> Result<PlatformResult, EventPilotError> {
        let adapter = platform.adapter(ctx);
        let event = adapter.event().clone();

        let Some(store) = self.checkpoints else {
            let result = EventCreationMachine::new(self.client, adapter.as_ref())
                .with_observer(self.observer)
                .run()
                .await;
            return Ok(PlatformResult::from_machine(platform.name(), &result));
        };

        let existing = match store.load(tenant, platform.name())? {
            Some(cp) if cp.can_resume() && cp.event == event => Some(cp),
            Some(_) => {
                warn!(platform = %platform, "ignoring checkpoint for a different event");
                None
            }
            None => None,
        };
        let recorder = match &existing {
            Some(cp) => CheckpointRecorder::resuming(store, cp),
            None => CheckpointRecorder::new(store, tenant, event),
        };
        let observers = Observers(vec![self.observer, &recorder as &dyn MachineObserver]);

        let mut machine = match &existing {
            Some(cp) => {
                info!(
                    platform = %platform,
                    state = %cp.snapshot.resume_state(),
                    progress = cp.progress_percentage(),
                    "resuming from checkpoint"
                );
                EventCreationMachine::restore(self.client, adapter.as_ref(), &cp.snapshot)
            }
            None => EventCreationMachine::new(self.client, adapter.as_ref()),
        }
        .with_observer(&observers);

        let result = machine.run().await;
        Ok(PlatformResult::from_machine(platform.name(), &result))
    }
}

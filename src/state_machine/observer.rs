use std::time::Duration;

use super::machine::{MachineResult, MachineSnapshot};
use super::state::EventState;

/// Hooks the machine calls as it runs. Every method defaults to doing nothing,
/// so implementors only override what they display or persist.
pub trait MachineObserver: Send + Sync {
    fn state_entered(&self, _platform: &str, _state: EventState) {}

    fn retry_scheduled(
        &self,
        _platform: &str,
        _state: EventState,
        _attempt: u32,
        _delay: Duration,
        _error: &str,
    ) {
    }

    fn state_abandoned(&self, _platform: &str, _state: EventState, _next: EventState, _error: &str) {}

    /// Called after every transition with the machine's current snapshot.
    fn snapshot_taken(&self, _snapshot: &MachineSnapshot) {}

    fn run_finished(&self, _platform: &str, _result: &MachineResult) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl MachineObserver for NoopObserver {}

/// Fans out to several observers in order.
pub struct Observers<'a>(pub Vec<&'a dyn MachineObserver>);

impl MachineObserver for Observers<'_> {
    fn state_entered(&self, platform: &str, state: EventState) {
        for o in &self.0 {
            o.state_entered(platform, state);
        }
    }

    fn retry_scheduled(
        &self,
        platform: &str,
        state: EventState,
        attempt: u32,
        delay: Duration,
        error: &str,
    ) {
        for o in &self.0 {
            o.retry_scheduled(platform, state, attempt, delay, error);
        }
    }

    fn state_abandoned(&self, platform: &str, state: EventState, next: EventState, error: &str) {
        for o in &self.0 {
            o.state_abandoned(platform, state, next, error);
        }
    }

    fn snapshot_taken(&self, snapshot: &MachineSnapshot) {
        for o in &self.0 {
            o.snapshot_taken(snapshot);
        }
    }

    fn run_finished(&self, platform: &str, result: &MachineResult) {
        for o in &self.0 {
            o.run_finished(platform, result);
        }
    }
}

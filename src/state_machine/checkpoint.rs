//! Persisting machine snapshots so an interrupted or paused run can resume.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use super::machine::{MachineResult, MachineSnapshot};
use super::observer::MachineObserver;
use super::state::STATE_FLOW;
use crate::error::EventPilotError;
use crate::event::EventData;
use crate::report::Status;

/// A saved snapshot for one (tenant, platform) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub tenant: String,
    pub platform: String,
    pub event: EventData,
    pub snapshot: MachineSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(tenant: &str, event: EventData, snapshot: MachineSnapshot) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant: tenant.to_string(),
            platform: snapshot.platform.clone(),
            event,
            snapshot,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_resume(&self) -> bool {
        !self.snapshot.state.is_terminal()
    }

    /// Share of the non-terminal flow states already completed.
    pub fn progress_percentage(&self) -> f64 {
        let total = STATE_FLOW.iter().filter(|s| !s.is_terminal()).count();
        let done = self
            .snapshot
            .completed_states
            .iter()
            .filter(|s| STATE_FLOW.contains(s) && !s.is_terminal())
            .count();
        (done as f64 / total as f64 * 100.0).min(100.0)
    }
}

/// JSON files named `checkpoint_{tenant}_{platform}.json` in one directory.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, tenant: &str, platform: &str) -> PathBuf {
        let clean = |s: &str| s.replace(['/', ':'], "_");
        self.dir
            .join(format!("checkpoint_{}_{}.json", clean(tenant), clean(platform)))
    }

    pub fn save(&self, checkpoint: &Checkpoint) -> Result<PathBuf, EventPilotError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(&checkpoint.tenant, &checkpoint.platform);
        std::fs::write(&path, serde_json::to_string_pretty(checkpoint)?)?;
        debug!(path = %path.display(), state = %checkpoint.snapshot.state, "checkpoint saved");
        Ok(path)
    }

    pub fn load(&self, tenant: &str, platform: &str) -> Result<Option<Checkpoint>, EventPilotError> {
        let path = self.path_for(tenant, platform);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Returns whether a checkpoint existed.
    pub fn delete(&self, tenant: &str, platform: &str) -> Result<bool, EventPilotError> {
        let path = self.path_for(tenant, platform);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(path)?;
        Ok(true)
    }

    /// All readable checkpoints, optionally for a single tenant, newest first.
    pub fn list(&self, tenant: Option<&str>) -> Result<Vec<Checkpoint>, EventPilotError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_checkpoint = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("checkpoint_") && n.ends_with(".json"));
            if !is_checkpoint {
                continue;
            }
            let parsed = std::fs::read_to_string(&path)
                .map_err(EventPilotError::from)
                .and_then(|s| serde_json::from_str::<Checkpoint>(&s).map_err(EventPilotError::from));
            match parsed {
                Ok(cp) if tenant.is_none_or(|t| cp.tenant == t) => out.push(cp),
                Ok(_) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable checkpoint"),
            }
        }
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

/// Observer that keeps the latest resumable snapshot on disk.
///
/// Terminal snapshots are not written, so a run that stops on NEEDS_AUTH
/// leaves the last state it could resume from. Runs with nothing left to
/// resume (published, duplicate, skipped) clear their checkpoint.
pub struct CheckpointRecorder<'a> {
    store: &'a CheckpointStore,
    tenant: String,
    event: EventData,
    id: Uuid,
    created_at: DateTime<Utc>,
}

impl<'a> CheckpointRecorder<'a> {
    pub fn new(store: &'a CheckpointStore, tenant: &str, event: EventData) -> Self {
        Self {
            store,
            tenant: tenant.to_string(),
            event,
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    /// Continue recording under an existing checkpoint's identity.
    pub fn resuming(store: &'a CheckpointStore, checkpoint: &Checkpoint) -> Self {
        Self {
            store,
            tenant: checkpoint.tenant.clone(),
            event: checkpoint.event.clone(),
            id: checkpoint.id,
            created_at: checkpoint.created_at,
        }
    }
}

impl MachineObserver for CheckpointRecorder<'_> {
    fn snapshot_taken(&self, snapshot: &MachineSnapshot) {
        if snapshot.state.is_terminal() {
            return;
        }
        let checkpoint = Checkpoint {
            id: self.id,
            tenant: self.tenant.clone(),
            platform: snapshot.platform.clone(),
            event: self.event.clone(),
            snapshot: snapshot.clone(),
            created_at: self.created_at,
            updated_at: Utc::now(),
        };
        if let Err(e) = self.store.save(&checkpoint) {
            warn!(platform = %snapshot.platform, error = %e, "failed to save checkpoint");
        }
    }

    fn run_finished(&self, platform: &str, result: &MachineResult) {
        let finished = matches!(
            result.status,
            Status::Published | Status::Duplicate | Status::Skipped
        );
        if finished && let Err(e) = self.store.delete(&self.tenant, platform) {
            warn!(platform, error = %e, "failed to clear checkpoint");
        }
    }
}

//! # `Replica` – the shared replication primitive
//!
//! Every host object kind (whole value, list, keyed list) is built by
//! composing one `Replica`. It owns the authoritative value, its revision
//! counter and the bounded patch log, and makes the catch-up decision for a
//! peer that reports the last revision it holds.
//!
//! ### Invariants
//! * Revision `0` means "not yet published"; `initialize` moves it to `1`.
//! * Every successful `apply_patch` advances the revision by exactly one and
//!   logs exactly one entry, so published revisions have no gaps.
//! * A failed patch changes nothing (value, revision and log untouched).

use crate::{
    object::{
        error::ReplicaError,
        patch_log::PatchLog,
        snapshot::{PatchEntry, Snapshot},
    },
    patch::{apply::apply_ops, patch_op::PatchOp},
    registry::ack_policy::AckPolicy,
    types::{ObjectId, Revision, Value},
};

/// How to bring a peer holding some revision up to date
#[derive(Clone, Debug, PartialEq)]
pub enum CatchUp {
    Snapshot(Snapshot),
    Patches(Vec<PatchEntry>),
    UpToDate,
    Uninitialized,
}

pub struct Replica {
    id: ObjectId,
    value: Value,
    revision: Revision,
    log: PatchLog,
    policy: AckPolicy,
}

impl Replica {
    pub fn new(id: ObjectId, policy: AckPolicy, log_retention: usize) -> Self {
        Self {
            id,
            value: Value::Null,
            revision: 0,
            log: PatchLog::new(log_retention),
            policy,
        }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn policy(&self) -> &AckPolicy {
        &self.policy
    }

    pub fn log(&self) -> &PatchLog {
        &self.log
    }

    pub fn is_initialized(&self) -> bool {
        self.revision > 0
    }

    /// First publish. Fails without side effects if already published.
    pub fn initialize(&mut self, value: Value) -> Result<Revision, ReplicaError> {
        if self.is_initialized() {
            return Err(ReplicaError::AlreadyInitialized {
                id: self.id.clone(),
                revision: self.revision,
            });
        }
        self.value = value;
        self.revision = 1;
        Ok(self.revision)
    }

    /// Applies every operation or none of them, and records the step.
    pub fn apply_patch(&mut self, ops: Vec<PatchOp>) -> Result<PatchEntry, ReplicaError> {
        if !self.is_initialized() {
            return Err(ReplicaError::NotInitialized {
                id: self.id.clone(),
            });
        }
        let next = apply_ops(&self.value, &ops).map_err(|source| ReplicaError::Patch {
            id: self.id.clone(),
            source,
        })?;

        self.value = next;
        self.revision += 1;
        let entry = PatchEntry {
            rev: self.revision,
            ops,
        };
        self.log.push(entry.clone());
        Ok(entry)
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        if !self.is_initialized() {
            return None;
        }
        Some(Snapshot {
            id: self.id.clone(),
            rev: self.revision,
            value: self.value.clone(),
        })
    }

    /// `None` signals "too old, snapshot required".
    pub fn logs_since(&self, since_rev: Revision) -> Option<Vec<PatchEntry>> {
        if !self.is_initialized() {
            return None;
        }
        self.log.since(since_rev, self.revision)
    }

    pub fn catch_up(&self, since_rev: Option<Revision>) -> CatchUp {
        let Some(snapshot) = self.snapshot() else {
            return CatchUp::Uninitialized;
        };
        let Some(since_rev) = since_rev.filter(|rev| *rev > 0) else {
            return CatchUp::Snapshot(snapshot);
        };
        if since_rev == self.revision {
            return CatchUp::UpToDate;
        }
        if since_rev > self.revision {
            // peer holds a revision this host never published
            return CatchUp::Snapshot(snapshot);
        }
        if !self.policy.within_incremental(since_rev, self.revision) {
            return CatchUp::Snapshot(snapshot);
        }
        match self.log.since(since_rev, self.revision) {
            Some(entries) => CatchUp::Patches(entries),
            None => CatchUp::Snapshot(snapshot),
        }
    }
}

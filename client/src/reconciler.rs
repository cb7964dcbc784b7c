//! # `Reconciler` – client side
//!
//! Sits between the raw, possibly reordered stream of `object:replace` /
//! `object:patch` messages and the mirror objects. It keeps one track per
//! object id, created on first sight, and only surfaces a revision once
//! every revision below it has been surfaced.
//!
//! | Arrival                  | Result                                    |
//! |--------------------------|-------------------------------------------|
//! | `rev <= current`         | `Rejected`, nothing changes               |
//! | `rev == current + 1`     | `Applied`, then buffered successors cascade |
//! | `rev > current + 1`      | `Queued` until the gap closes             |
//!
//! Ready steps are pushed into an outgoing buffer drained with
//! [`Reconciler::take_ready`], in the exact order they must be applied.
//! A gap that outlives its stall timeout is reported by
//! [`Reconciler::check_stalls`] so the caller can ask the host to resync.

use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use log::{debug, warn};

use replica_shared::{Instant, ObjectId, PatchOp, Revision, Value, DEFAULT_STALL_TIMEOUT};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied,
    Queued,
    Rejected,
}

/// One revision step that is safe to hand to a mirror
#[derive(Clone, Debug, PartialEq)]
pub enum ReadyStep {
    Replace {
        id: ObjectId,
        rev: Revision,
        value: Value,
    },
    Patch {
        id: ObjectId,
        rev: Revision,
        ops: Vec<PatchOp>,
    },
}

impl ReadyStep {
    pub fn id(&self) -> &ObjectId {
        match self {
            ReadyStep::Replace { id, .. } | ReadyStep::Patch { id, .. } => id,
        }
    }

    pub fn rev(&self) -> Revision {
        match self {
            ReadyStep::Replace { rev, .. } | ReadyStep::Patch { rev, .. } => *rev,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ReconcilerConfig {
    /// Out-of-order patches held per object. Past this an incoming patch
    /// is dropped and reported as `Rejected`.
    pub max_buffered_patches: usize,
    /// Used for objects that were never given their own stall timeout
    pub stall_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_buffered_patches: 64,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }
}

struct ObjectTrack {
    revision: Revision,
    buffer: BTreeMap<Revision, Vec<PatchOp>>,
    stall_timeout: Duration,
    // when the current gap was opened, or last made progress
    gap_since: Option<Instant>,
    last_resync: Option<Instant>,
}

impl ObjectTrack {
    fn new(stall_timeout: Duration) -> Self {
        Self {
            revision: 0,
            buffer: BTreeMap::new(),
            stall_timeout,
            gap_since: None,
            last_resync: None,
        }
    }
}

pub struct Reconciler {
    config: ReconcilerConfig,
    tracks: HashMap<ObjectId, ObjectTrack>,
    ready: Vec<ReadyStep>,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}

impl Reconciler {
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            config,
            tracks: HashMap::new(),
            ready: Vec::new(),
        }
    }

    /// Gives an object its own stall timeout
    pub fn track(&mut self, id: &ObjectId, stall_timeout: Duration) {
        self.tracks
            .entry(id.clone())
            .or_insert_with(|| ObjectTrack::new(stall_timeout))
            .stall_timeout = stall_timeout;
    }

    fn track_mut(&mut self, id: &ObjectId) -> &mut ObjectTrack {
        let stall_timeout = self.config.stall_timeout;
        self.tracks
            .entry(id.clone())
            .or_insert_with(|| ObjectTrack::new(stall_timeout))
    }

    /// Highest contiguous revision surfaced for `id`; `0` if none
    pub fn revision(&self, id: &ObjectId) -> Revision {
        self.tracks.get(id).map_or(0, |track| track.revision)
    }

    pub fn buffered(&self, id: &ObjectId) -> usize {
        self.tracks.get(id).map_or(0, |track| track.buffer.len())
    }

    pub fn is_gapped(&self, id: &ObjectId) -> bool {
        self.buffered(id) > 0
    }

    /// A full snapshot. Accepted unless it is not newer than what is held;
    /// every buffered patch for the object is discarded.
    pub fn apply_replace(
        &mut self,
        id: &ObjectId,
        rev: Revision,
        value: Value,
    ) -> bool {
        let track = self.track_mut(id);
        if rev <= track.revision {
            debug!(
                "stale replace for {} at {} (holding {})",
                id, rev, track.revision
            );
            return false;
        }

        track.revision = rev;
        track.buffer.clear();
        track.gap_since = None;
        self.ready.push(ReadyStep::Replace {
            id: id.clone(),
            rev,
            value,
        });
        true
    }

    pub fn apply_patch(
        &mut self,
        id: &ObjectId,
        rev: Revision,
        ops: Vec<PatchOp>,
        now: Instant,
    ) -> PatchOutcome {
        let max_buffered = self.config.max_buffered_patches;
        let track = self.track_mut(id);

        if rev <= track.revision {
            debug!(
                "duplicate patch for {} at {} (holding {})",
                id, rev, track.revision
            );
            return PatchOutcome::Rejected;
        }

        if rev == track.revision + 1 {
            track.revision = rev;
            let mut steps = vec![ReadyStep::Patch {
                id: id.clone(),
                rev,
                ops,
            }];
            Self::cascade(id, track, now, &mut steps);
            self.ready.extend(steps);
            return PatchOutcome::Applied;
        }

        if track.buffer.contains_key(&rev) {
            return PatchOutcome::Queued;
        }
        if track.buffer.len() >= max_buffered {
            warn!(
                "patch buffer for {} is full, dropping revision {}",
                id, rev
            );
            return PatchOutcome::Rejected;
        }
        track.buffer.insert(rev, ops);
        track.gap_since.get_or_insert(now);
        debug!(
            "queued {} revision {} waiting for {}",
            id,
            rev,
            track.revision + 1
        );
        PatchOutcome::Queued
    }

    fn cascade(id: &ObjectId, track: &mut ObjectTrack, now: Instant, steps: &mut Vec<ReadyStep>) {
        while let Some(ops) = track.buffer.remove(&(track.revision + 1)) {
            track.revision += 1;
            steps.push(ReadyStep::Patch {
                id: id.clone(),
                rev: track.revision,
                ops,
            });
        }
        track.gap_since = if track.buffer.is_empty() {
            None
        } else {
            Some(now)
        };
    }

    /// Reports `(id, revision held)` for every gap older than its stall
    /// timeout. A reported gap is not reported again for another timeout.
    pub fn check_stalls<F>(&mut self, now: Instant, mut on_stall: F) -> usize
    where
        F: FnMut(&ObjectId, Revision),
    {
        let mut stalled = 0;
        for (id, track) in self.tracks.iter_mut() {
            let Some(since) = track.gap_since else {
                continue;
            };
            if now.saturating_duration_since(since) < track.stall_timeout {
                continue;
            }
            warn!(
                "object {} stalled at revision {} with {} patch(es) buffered",
                id,
                track.revision,
                track.buffer.len()
            );
            track.gap_since = Some(now);
            on_stall(id, track.revision);
            stalled += 1;
        }
        stalled
    }

    /// Whether a resync request for `id` may go out now. Records it if so.
    pub fn note_resync(&mut self, id: &ObjectId, now: Instant) -> bool {
        let track = self.track_mut(id);
        if let Some(last) = track.last_resync {
            if now.saturating_duration_since(last) < track.stall_timeout {
                return false;
            }
        }
        track.last_resync = Some(now);
        true
    }

    /// Records a request that went out without consulting the throttle
    pub fn mark_resync(&mut self, id: &ObjectId, now: Instant) {
        self.track_mut(id).last_resync = Some(now);
    }

    /// Forgets everything held for `id` so the next replace is accepted
    pub fn reset(&mut self, id: &ObjectId) {
        if let Some(track) = self.tracks.get_mut(id) {
            track.revision = 0;
            track.buffer.clear();
            track.gap_since = None;
            track.last_resync = None;
        }
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.ready.clear();
    }

    /// Steps surfaced since the last call, in application order
    pub fn take_ready(&mut self) -> Vec<ReadyStep> {
        std::mem::take(&mut self.ready)
    }
}

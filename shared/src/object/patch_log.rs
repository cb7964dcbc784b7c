use std::collections::VecDeque;

use crate::{object::snapshot::PatchEntry, types::Revision};

/// Bounded, ordered history of revision steps for one object.
///
/// Entries are always contiguous: each pushed entry is exactly one revision
/// past the previous one. Once `retention` is exceeded the oldest entry is
/// evicted, moving the catch-up horizon forward.
pub struct PatchLog {
    entries: VecDeque<PatchEntry>,
    retention: usize,
}

impl PatchLog {
    pub fn new(retention: usize) -> Self {
        let retention = retention.max(1);
        Self {
            entries: VecDeque::with_capacity(retention),
            retention,
        }
    }

    pub fn push(&mut self, entry: PatchEntry) {
        if let Some(last) = self.entries.back() {
            debug_assert_eq!(last.rev + 1, entry.rev, "patch log must stay contiguous");
        }
        while self.entries.len() >= self.retention {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn oldest_rev(&self) -> Option<Revision> {
        self.entries.front().map(|entry| entry.rev)
    }

    pub fn newest_rev(&self) -> Option<Revision> {
        self.entries.back().map(|entry| entry.rev)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    /// Entries after `since_rev` (exclusive) up to `current_rev`.
    ///
    /// Returns `None` when the log no longer reaches back to `since_rev + 1`,
    /// meaning a snapshot is required instead.
    pub fn since(&self, since_rev: Revision, current_rev: Revision) -> Option<Vec<PatchEntry>> {
        if since_rev >= current_rev {
            return Some(Vec::new());
        }
        let oldest = self.oldest_rev()?;
        if since_rev + 1 < oldest {
            return None;
        }
        Some(
            self.entries
                .iter()
                .filter(|entry| entry.rev > since_rev)
                .cloned()
                .collect(),
        )
    }
}

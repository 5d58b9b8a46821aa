//! Mark-and-sweep registration cache.
//!
//! An entry exists for every service this process registered and has not yet
//! deregistered. Each entry carries a liveness mark: a pass marks every
//! service it sees, and the sweep that ends the pass treats unmarked entries as
//! stale and resets the marked ones, so liveness has to be re-established on
//! every pass.

use std::collections::HashMap;

use crate::domain::model::ServiceRegistration;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Liveness {
    #[default]
    Unmarked,
    Marked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The payload that was sent to the catalog.
    pub registration: ServiceRegistration,
    /// Agent the registration was issued against.
    pub agent: String,
    liveness: Liveness,
}

impl CacheEntry {
    /// New entries start unmarked.
    #[must_use]
    pub fn new(registration: ServiceRegistration, agent: impl Into<String>) -> Self {
        Self {
            registration,
            agent: agent.into(),
            liveness: Liveness::Unmarked,
        }
    }

    #[must_use]
    pub fn liveness(&self) -> Liveness {
        self.liveness
    }
}

/// Service id to [`CacheEntry`].
#[derive(Debug, Default)]
pub struct RegistrationCache {
    entries: HashMap<String, CacheEntry>,
}

impl RegistrationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `entry` under its registration id, replacing any previous entry.
    pub fn insert(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.registration.id.clone(), entry);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&CacheEntry> {
        self.entries.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Flag `id` as seen in the current pass. Unknown ids are ignored.
    pub fn mark(&mut self, id: &str) {
        self.set_liveness(id, Liveness::Marked);
    }

    /// Reset `id` for the next pass. Unknown ids are ignored.
    pub fn unmark(&mut self, id: &str) {
        self.set_liveness(id, Liveness::Unmarked);
    }

    /// `true` iff `id` is tracked and was not marked since the last sweep.
    #[must_use]
    pub fn is_stale(&self, id: &str) -> bool {
        self.entries
            .get(id)
            .is_some_and(|entry| entry.liveness == Liveness::Unmarked)
    }

    /// Stop tracking `id`. Only called once the catalog confirmed the
    /// deregistration.
    pub fn remove(&mut self, id: &str) -> Option<CacheEntry> {
        self.entries.remove(id)
    }

    /// Sorted snapshot of the tracked ids.
    ///
    /// The sweep iterates this snapshot, so it may freely remove entries while
    /// walking it.
    #[must_use]
    pub fn tracked_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn set_liveness(&mut self, id: &str, liveness: Liveness) {
        if let Some(entry) = self.entries.get_mut(id) {
            entry.liveness = liveness;
        }
    }
}

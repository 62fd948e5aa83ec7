//! Per-client subscription registry.

use std::collections::HashMap;
use std::sync::Arc;

use crate::event::Event;
use crate::filter::Filter;

/// Delivery phase of a subscription.
///
/// A subscription is installed before the historical scan so no broadcast
/// can slip between scan and registration. Until EOSE is queued, live
/// matches are buffered in the entry; `promote` flushes them afterwards.
enum Phase {
    Backfill { pending: Vec<Arc<Event>> },
    Live,
}

struct Subscription {
    filters: Vec<Filter>,
    phase: Phase,
}

/// The subscriptions of one client.
///
/// Guarded by a per-client mutex; the lock is held only to snapshot or
/// buffer, never across a socket write.
#[derive(Default)]
pub struct SubscriptionTable {
    subs: HashMap<String, Subscription>,
}

impl SubscriptionTable {
    /// Install a subscription, replacing any existing one with the same
    /// id. It starts in the backfill phase.
    pub fn install(&mut self, sub_id: &str, filters: Vec<Filter>) {
        self.subs.insert(
            sub_id.to_string(),
            Subscription {
                filters,
                phase: Phase::Backfill {
                    pending: Vec::new(),
                },
            },
        );
    }

    /// Remove a subscription; no-op when absent.
    pub fn remove(&mut self, sub_id: &str) {
        self.subs.remove(sub_id);
    }

    /// Route a broadcast event through this client's subscriptions.
    ///
    /// Returns the ids of live subscriptions with at least one matching
    /// filter, each at most once. Matching backfill subscriptions buffer
    /// the event instead of emitting.
    pub fn route(&mut self, ev: &Arc<Event>) -> Vec<String> {
        let mut live = Vec::new();
        for (id, sub) in &mut self.subs {
            if !sub.filters.iter().any(|f| f.matches(ev)) {
                continue;
            }
            match &mut sub.phase {
                Phase::Backfill { pending } => pending.push(ev.clone()),
                Phase::Live => live.push(id.clone()),
            }
        }
        live
    }

    /// Switch a subscription to live, returning the events buffered while
    /// it was backfilling. Empty when the subscription is gone or already
    /// live.
    pub fn promote(&mut self, sub_id: &str) -> Vec<Arc<Event>> {
        match self.subs.get_mut(sub_id) {
            Some(sub) => match std::mem::replace(&mut sub.phase, Phase::Live) {
                Phase::Backfill { pending } => pending,
                Phase::Live => Vec::new(),
            },
            None => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

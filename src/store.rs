//! Thread-safe in-memory event store with filter indexes.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::event::Event;
use crate::filter::Filter;

/// In-memory set of accepted events.
///
/// A primary `id → event` map is layered with author, kind, and
/// time-ordered indexes so filter scans touch only candidate events.
/// Many readers may query concurrently; `add` takes the write lock, so an
/// insert is atomic with respect to every query.
#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    by_id: HashMap<String, Arc<Event>>,
    by_author: HashMap<String, Vec<String>>,
    by_kind: HashMap<u32, Vec<String>>,
    by_time: BTreeMap<i64, Vec<String>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event unless one with the same id is already present.
    pub fn add(&self, ev: Arc<Event>) -> bool {
        let mut inner = self.write();
        if inner.by_id.contains_key(&ev.id) {
            return false;
        }
        inner
            .by_author
            .entry(ev.pubkey.clone())
            .or_default()
            .push(ev.id.clone());
        inner.by_kind.entry(ev.kind).or_default().push(ev.id.clone());
        inner
            .by_time
            .entry(ev.created_at)
            .or_default()
            .push(ev.id.clone());
        inner.by_id.insert(ev.id.clone(), ev);
        true
    }

    /// All stored events matching `filter`, in unspecified order.
    ///
    /// `limit` is deliberately not applied here; capping is a REQ-scan
    /// concern and must not affect live broadcast.
    pub fn query(&self, filter: &Filter) -> Vec<Arc<Event>> {
        let inner = self.read();
        let candidates: Vec<Arc<Event>> = if let Some(ids) = &filter.ids {
            ids.iter()
                .filter_map(|id| inner.by_id.get(id).cloned())
                .collect()
        } else if let Some(authors) = &filter.authors {
            authors
                .iter()
                .filter_map(|a| inner.by_author.get(a))
                .flatten()
                .filter_map(|id| inner.by_id.get(id).cloned())
                .collect()
        } else if let Some(kinds) = &filter.kinds {
            kinds
                .iter()
                .filter_map(|k| inner.by_kind.get(k))
                .flatten()
                .filter_map(|id| inner.by_id.get(id).cloned())
                .collect()
        } else if filter.since.map_or(false, |s| s > 0) || filter.until.map_or(false, |u| u > 0) {
            let lo = filter.since.filter(|s| *s > 0).unwrap_or(i64::MIN);
            let hi = filter.until.filter(|u| *u > 0).unwrap_or(i64::MAX);
            inner
                .by_time
                .range(lo..=hi)
                .flat_map(|(_, ids)| ids)
                .filter_map(|id| inner.by_id.get(id).cloned())
                .collect()
        } else {
            inner.by_id.values().cloned().collect()
        };
        candidates
            .into_iter()
            .filter(|ev| filter.matches(ev))
            .collect()
    }

    /// Look up a stored event by id.
    pub fn get(&self, id: &str) -> Option<Arc<Event>> {
        self.read().by_id.get(id).cloned()
    }

    /// Number of stored events.
    pub fn len(&self) -> usize {
        self.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

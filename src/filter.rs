//! Subscription filters and event matching.

use serde::{Deserialize, Serialize};

use crate::event::Event;

/// A conjunction of optional predicates; a subscription holds a
/// disjunction of filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinds: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<i64>,
    /// Caps the historical scan on REQ only; live broadcast is never limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Filter {
    /// Whether an event satisfies every present predicate.
    ///
    /// An absent predicate passes unconditionally, a present-but-empty set
    /// matches nothing, and time bounds apply only when positive.
    pub fn matches(&self, ev: &Event) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &ev.id) {
                return false;
            }
        }
        if let Some(authors) = &self.authors {
            if !authors.iter().any(|a| a == &ev.pubkey) {
                return false;
            }
        }
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&ev.kind) {
                return false;
            }
        }
        self.since.map_or(true, |s| s <= 0 || ev.created_at >= s)
            && self.until.map_or(true, |u| u <= 0 || ev.created_at <= u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str, pubkey: &str, kind: u32, created_at: i64) -> Event {
        Event {
            id: id.into(),
            pubkey: pubkey.into(),
            created_at,
            kind,
            tags: vec![],
            content: String::new(),
            sig: String::new(),
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::default().matches(&sample("aa", "p1", 1, 10)));
    }

    #[test]
    fn id_author_kind_membership() {
        let ev = sample("aa", "p1", 1, 10);
        let f = Filter {
            ids: Some(vec!["aa".into()]),
            authors: Some(vec!["p1".into(), "p2".into()]),
            kinds: Some(vec![0, 1]),
            ..Default::default()
        };
        assert!(f.matches(&ev));
        assert!(!f.matches(&sample("bb", "p1", 1, 10)));
        assert!(!f.matches(&sample("aa", "p3", 1, 10)));
        assert!(!f.matches(&sample("aa", "p1", 2, 10)));
    }

    #[test]
    fn present_but_empty_set_matches_nothing() {
        let f = Filter {
            authors: Some(vec![]),
            ..Default::default()
        };
        assert!(!f.matches(&sample("aa", "p1", 1, 10)));
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let f = Filter {
            since: Some(10),
            until: Some(20),
            ..Default::default()
        };
        assert!(!f.matches(&sample("aa", "p1", 1, 9)));
        assert!(f.matches(&sample("aa", "p1", 1, 10)));
        assert!(f.matches(&sample("aa", "p1", 1, 20)));
        assert!(!f.matches(&sample("aa", "p1", 1, 21)));
    }

    #[test]
    fn zero_time_bounds_are_inert() {
        let f = Filter {
            since: Some(0),
            until: Some(0),
            ..Default::default()
        };
        assert!(f.matches(&sample("aa", "p1", 1, -3)));
    }

    #[test]
    fn removing_a_predicate_never_shrinks_the_match_set() {
        let events = [
            sample("aa", "p1", 1, 10),
            sample("bb", "p2", 2, 20),
            sample("cc", "p1", 2, 30),
        ];
        let full = Filter {
            authors: Some(vec!["p1".into()]),
            kinds: Some(vec![2]),
            ..Default::default()
        };
        let relaxed = Filter {
            kinds: Some(vec![2]),
            ..Default::default()
        };
        for ev in &events {
            if full.matches(ev) {
                assert!(relaxed.matches(ev));
            }
        }
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let f: Filter = serde_json::from_value(serde_json::json!({
            "kinds": [1],
            "#e": ["abcd"],
            "search": "word",
        }))
        .unwrap();
        assert_eq!(f.kinds, Some(vec![1]));
        assert!(f.ids.is_none());
    }
}

//! Per-connection protocol dispatch.
//!
//! One `Session` per WebSocket peer. The reader task feeds inbound text
//! frames through `handle_text` strictly in arrival order; every reply
//! goes through the connection's outbound queue, never to the socket
//! directly. Protocol errors answer with a frame and leave the
//! connection open; only transport errors tear it down.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::event::Event;
use crate::filter::Filter;
use crate::frame::{parse_client_frame, ClientFrame, RelayFrame};
use crate::hub::Hub;
use crate::outbound::Outbound;
use crate::store::EventStore;
use crate::subs::SubscriptionTable;
use crate::verify;

pub struct Session {
    store: EventStore,
    hub: Hub,
    subs: Arc<Mutex<SubscriptionTable>>,
    outbound: Outbound,
}

impl Session {
    pub fn new(
        store: EventStore,
        hub: Hub,
        subs: Arc<Mutex<SubscriptionTable>>,
        outbound: Outbound,
    ) -> Self {
        Self {
            store,
            hub,
            subs,
            outbound,
        }
    }

    /// Process one inbound text frame.
    pub fn handle_text(&self, raw: &str) {
        match parse_client_frame(raw) {
            Ok(ClientFrame::Event(ev)) => self.handle_event(ev),
            Ok(ClientFrame::Req { sub_id, filters }) => self.handle_req(&sub_id, filters),
            Ok(ClientFrame::Close { sub_id }) => self.lock_subs().remove(&sub_id),
            Err(err) => self.outbound.push(RelayFrame::Notice {
                message: err.notice(),
            }),
        }
    }

    fn handle_event(&self, ev: Event) {
        if let Err(err) = verify::validate(&ev) {
            tracing::debug!(id = %ev.id, error = %err, "event rejected");
            self.outbound.push(RelayFrame::Ok {
                id: ev.id,
                accepted: false,
                message: format!("invalid: {err}"),
            });
            return;
        }
        let ev = Arc::new(ev);
        if self.store.add(ev.clone()) {
            tracing::debug!(id = %ev.id, kind = ev.kind, "event accepted");
            self.hub.broadcast(ev.clone());
            self.outbound.push(RelayFrame::Ok {
                id: ev.id.clone(),
                accepted: true,
                message: String::new(),
            });
        } else {
            self.outbound.push(RelayFrame::Ok {
                id: ev.id.clone(),
                accepted: true,
                message: "duplicate".into(),
            });
        }
    }

    fn handle_req(&self, sub_id: &str, filters: Vec<Filter>) {
        // Install before scanning so a broadcast landing mid-scan is
        // buffered by the subscription instead of lost.
        self.lock_subs().install(sub_id, filters.clone());

        // Merged historical scan: dedupe across the subscription's
        // filters, newest first, capped by the largest per-filter limit.
        let cap = filters.iter().filter_map(|f| f.limit).max();
        let mut seen = HashSet::new();
        let mut matches: Vec<Arc<Event>> = Vec::new();
        for filter in &filters {
            for ev in self.store.query(filter) {
                if seen.insert(ev.id.clone()) {
                    matches.push(ev);
                }
            }
        }
        matches.sort_by_key(|ev| std::cmp::Reverse(ev.created_at));
        if let Some(cap) = cap {
            matches.truncate(cap);
        }
        let emitted: HashSet<String> = matches.iter().map(|ev| ev.id.clone()).collect();
        for ev in matches {
            self.outbound.push(RelayFrame::Event {
                sub_id: sub_id.to_string(),
                event: ev,
            });
        }
        self.outbound.push(RelayFrame::Eose {
            sub_id: sub_id.to_string(),
        });

        // Go live and flush whatever broadcasts arrived during the scan,
        // minus events the scan already emitted.
        let buffered = self.lock_subs().promote(sub_id);
        for ev in buffered {
            if !emitted.contains(&ev.id) {
                self.outbound.push(RelayFrame::Event {
                    sub_id: sub_id.to_string(),
                    event: ev,
                });
            }
        }
    }

    fn lock_subs(&self) -> MutexGuard<'_, SubscriptionTable> {
        self.subs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

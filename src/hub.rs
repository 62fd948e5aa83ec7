//! Relay hub: the global client registry and broadcast path.
//!
//! A single task owns the client map; register, unregister, and broadcast
//! arrive as messages on one channel, so the registry needs no lock and is
//! never touched concurrently with a broadcast walk. Clients hold only a
//! `Hub` handle, never the registry itself.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use crate::event::Event;
use crate::frame::RelayFrame;
use crate::outbound::Outbound;
use crate::subs::SubscriptionTable;

/// The narrow per-client capability the hub holds: the client's outbound
/// queue and its subscription table.
#[derive(Clone)]
pub struct ClientHandle {
    id: u64,
    subs: Arc<Mutex<SubscriptionTable>>,
    outbound: Outbound,
}

impl ClientHandle {
    pub fn new(id: u64, subs: Arc<Mutex<SubscriptionTable>>, outbound: Outbound) -> Self {
        Self { id, subs, outbound }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Deliver one broadcast event to this client: snapshot the matching
    /// live subscription ids under the mutex, then enqueue outside it.
    /// At most one frame per subscription.
    fn deliver(&self, ev: &Arc<Event>) {
        let matched = self.lock_subs().route(ev);
        for sub_id in matched {
            self.outbound.push(RelayFrame::Event {
                sub_id,
                event: ev.clone(),
            });
        }
    }

    fn lock_subs(&self) -> MutexGuard<'_, SubscriptionTable> {
        self.subs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

enum Command {
    Register(ClientHandle),
    Unregister(u64),
    Broadcast(Arc<Event>),
}

/// Cloneable handle to the hub task.
#[derive(Clone)]
pub struct Hub {
    tx: mpsc::UnboundedSender<Command>,
}

impl Hub {
    /// Spawn the hub task and return a handle to it.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(rx));
        Self { tx }
    }

    pub fn register(&self, client: ClientHandle) {
        let _ = self.tx.send(Command::Register(client));
    }

    pub fn unregister(&self, id: u64) {
        let _ = self.tx.send(Command::Unregister(id));
    }

    /// Fan an accepted event out to every matching subscription of every
    /// registered client. Never blocks the caller.
    pub fn broadcast(&self, ev: Arc<Event>) {
        let _ = self.tx.send(Command::Broadcast(ev));
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut clients: HashMap<u64, ClientHandle> = HashMap::new();
    while let Some(cmd) = rx.recv().await {
        match cmd {
            Command::Register(client) => {
                clients.insert(client.id(), client);
                tracing::info!(clients = clients.len(), "client registered");
            }
            Command::Unregister(id) => {
                if clients.remove(&id).is_some() {
                    tracing::info!(clients = clients.len(), "client unregistered");
                }
            }
            Command::Broadcast(ev) => {
                for client in clients.values() {
                    client.deliver(&ev);
                }
            }
        }
    }
}

//! NIP-01 WebSocket relay server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{ConnectInfo, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use crate::conn::Session;
use crate::hub::{ClientHandle, Hub};
use crate::outbound::Outbound;
use crate::store::EventStore;
use crate::subs::SubscriptionTable;

/// Shared server state handed to every connection.
#[derive(Clone)]
pub struct RelayState {
    store: EventStore,
    hub: Hub,
    queue_depth: usize,
    next_client_id: Arc<AtomicU64>,
}

impl RelayState {
    pub fn new(store: EventStore, hub: Hub, queue_depth: usize) -> Self {
        Self {
            store,
            hub,
            queue_depth,
            next_client_id: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }
}

/// Start the relay: WebSocket upgrades at `/`, health probe at `/healthz`.
pub async fn serve(
    addr: SocketAddr,
    state: RelayState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "relay listening");
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

fn router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(upgrade_handler))
        .route("/healthz", get(healthz))
        .with_state(state)
}

#[derive(Serialize, Deserialize)]
struct Health {
    status: String,
}

/// Health check endpoint.
async fn healthz() -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
    })
}

/// Accept the upgrade (any origin) and hand the socket to `process`.
async fn upgrade_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<RelayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| process(socket, addr, state))
}

/// Drive one connection until the socket closes.
///
/// A dedicated writer task drains the outbound queue while this task
/// reads, so no two tasks ever write the same socket.
async fn process(socket: WebSocket, addr: SocketAddr, state: RelayState) {
    let client_id = state.next_client_id.fetch_add(1, Ordering::Relaxed);
    let subs = Arc::new(Mutex::new(SubscriptionTable::default()));
    let outbound = Outbound::new(state.queue_depth);
    state
        .hub
        .register(ClientHandle::new(client_id, subs.clone(), outbound.clone()));
    tracing::info!(client = %addr, id = client_id, "client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();
    let writer_queue = outbound.clone();
    let writer = tokio::spawn(async move {
        while let Some(frame) = writer_queue.pop().await {
            if ws_tx.send(Message::Text(frame.to_text())).await.is_err() {
                break;
            }
        }
    });

    let session = Session::new(
        state.store.clone(),
        state.hub.clone(),
        subs,
        outbound.clone(),
    );
    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(txt)) => session.handle_text(&txt),
            Ok(Message::Close(_)) => break,
            // axum answers pings itself; binary frames are not NIP-01
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(client = %addr, error = %err, "read error");
                break;
            }
        }
    }

    state.hub.unregister(client_id);
    outbound.close();
    writer.abort();
    let _ = writer.await;
    tracing::info!(client = %addr, id = client_id, "client disconnected");
}

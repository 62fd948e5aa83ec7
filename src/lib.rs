//! In-memory NIP-01 Nostr relay.
//!
//! Events arrive over WebSocket, are canonically hashed and
//! Schnorr-verified, stored in an indexed in-memory set, and fanned out
//! to every live subscription whose filters match.

/// Canonical event serialization and SHA-256 hashing.
pub mod canonical;
/// `.env`-backed runtime settings.
pub mod config;
/// Per-connection protocol dispatch.
pub mod conn;
/// Event and tag data model.
pub mod event;
/// Subscription filters and matching.
pub mod filter;
/// Wire codec for client and relay frames.
pub mod frame;
/// Client registry and broadcast fan-out.
pub mod hub;
/// Bounded per-connection outbound queue.
pub mod outbound;
/// Thread-safe in-memory event store.
pub mod store;
/// Per-client subscription registry.
pub mod subs;
/// Event id and signature verification.
pub mod verify;
/// WebSocket endpoint and connection tasks.
pub mod ws;

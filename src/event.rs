//! Nostr event model.

use serde::{Deserialize, Serialize};

/// Simple tag wrapper preserving tag fields in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tag(pub Vec<String>);

/// Core Nostr event accepted over the wire and fanned out to subscribers.
///
/// Events are immutable once accepted; the store and the hub share them
/// behind `Arc` and never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    /// Event identifier (lowercase hex of the SHA-256 canonical hash).
    pub id: String,
    /// Author public key (lowercase hex, 32-byte x-only secp256k1).
    pub pubkey: String,
    /// Unix timestamp of creation, seconds, signed.
    pub created_at: i64,
    /// Kind number, e.g. `0` or `1`.
    pub kind: u32,
    /// Arbitrary tags; each inner list has at least one element.
    pub tags: Vec<Tag>,
    /// Event content body.
    pub content: String,
    /// Schnorr signature over the raw event hash (lowercase hex, 64 bytes).
    pub sig: String,
}

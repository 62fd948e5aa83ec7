//! Event identity and signature verification.

use secp256k1::schnorr::Signature;
use secp256k1::{Message, Secp256k1, XOnlyPublicKey};
use thiserror::Error;

use crate::canonical;
use crate::event::Event;

/// Why an event was rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidEvent {
    #[error("{field} must be {chars} lowercase hex characters")]
    BadHexLength { field: &'static str, chars: usize },
    #[error("id does not match the canonical event hash")]
    IdMismatch,
    #[error("pubkey is not a valid x-only secp256k1 key")]
    BadPubkey,
    #[error("sig is not a valid schnorr signature encoding")]
    BadSignature,
    #[error("schnorr signature verification failed")]
    SigVerifyFailed,
}

/// Verify an event's id and Schnorr signature.
///
/// Pure CPU work: holds no locks and touches no shared state, so it is
/// safe to run concurrently across connections.
pub fn validate(ev: &Event) -> Result<(), InvalidEvent> {
    check_hex("id", &ev.id, 32)?;
    check_hex("pubkey", &ev.pubkey, 32)?;
    check_hex("sig", &ev.sig, 64)?;

    let hash = canonical::event_hash(ev);
    if hex::encode(hash) != ev.id {
        return Err(InvalidEvent::IdMismatch);
    }

    let pk_bytes = hex::decode(&ev.pubkey).map_err(|_| InvalidEvent::BadPubkey)?;
    let pk = XOnlyPublicKey::from_slice(&pk_bytes).map_err(|_| InvalidEvent::BadPubkey)?;
    let sig_bytes = hex::decode(&ev.sig).map_err(|_| InvalidEvent::BadSignature)?;
    let sig = Signature::from_slice(&sig_bytes).map_err(|_| InvalidEvent::BadSignature)?;

    // The signature covers the raw 32 bytes of the id, which the hash
    // comparison above proved equal to the canonical digest.
    let msg = Message::from_digest(hash);
    let secp = Secp256k1::verification_only();
    secp.verify_schnorr(&sig, &msg, &pk)
        .map_err(|_| InvalidEvent::SigVerifyFailed)
}

fn check_hex(field: &'static str, s: &str, bytes: usize) -> Result<(), InvalidEvent> {
    let well_formed =
        s.len() == bytes * 2 && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
    if !well_formed {
        return Err(InvalidEvent::BadHexLength {
            field,
            chars: bytes * 2,
        });
    }
    Ok(())
}

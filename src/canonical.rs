//! Canonical NIP-01 serialization and hashing.
//!
//! An event's identity is the SHA-256 of the exact byte sequence
//! `[0,pubkey,created_at,kind,tags,content]` with no whitespace and the
//! minimal JSON escape set. Default encoders that HTML-escape `<`, `>`,
//! `&` or `\uXXXX`-escape non-ASCII would compute a different id, so the
//! writer below emits every byte itself.

use sha2::{Digest, Sha256};

use crate::event::{Event, Tag};

/// Serialize an event into the byte sequence that defines its id.
pub fn serialize_event(ev: &Event) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + ev.content.len());
    out.extend_from_slice(b"[0,");
    write_string(&mut out, &ev.pubkey);
    out.push(b',');
    out.extend_from_slice(ev.created_at.to_string().as_bytes());
    out.push(b',');
    out.extend_from_slice(ev.kind.to_string().as_bytes());
    out.push(b',');
    write_tags(&mut out, &ev.tags);
    out.push(b',');
    write_string(&mut out, &ev.content);
    out.push(b']');
    out
}

/// SHA-256 digest of the canonical serialization.
pub fn event_hash(ev: &Event) -> [u8; 32] {
    Sha256::digest(serialize_event(ev)).into()
}

fn write_tags(out: &mut Vec<u8>, tags: &[Tag]) {
    out.push(b'[');
    for (i, Tag(fields)) in tags.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.push(b'[');
        for (j, field) in fields.iter().enumerate() {
            if j > 0 {
                out.push(b',');
            }
            write_string(out, field);
        }
        out.push(b']');
    }
    out.push(b']');
}

/// Write a JSON string with the minimal escape set: two-character escapes
/// for `\b \t \n \f \r \" \\`, `\u00XX` for the remaining C0 controls,
/// raw UTF-8 for everything else. `/`, `<`, `>` and `&` pass through.
fn write_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\t' => out.extend_from_slice(b"\\t"),
            '\n' => out.extend_from_slice(b"\\n"),
            '\u{0c}' => out.extend_from_slice(b"\\f"),
            '\r' => out.extend_from_slice(b"\\r"),
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

//! NIP-01 wire codec: JSON array frames in both directions.

use std::sync::Arc;

use serde_json::{json, Value};
use thiserror::Error;

use crate::event::Event;
use crate::filter::Filter;

/// Frames a client may send.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientFrame {
    Event(Event),
    Req {
        sub_id: String,
        filters: Vec<Filter>,
    },
    Close {
        sub_id: String,
    },
}

/// Frames the relay sends.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayFrame {
    Event { sub_id: String, event: Arc<Event> },
    Ok {
        id: String,
        accepted: bool,
        message: String,
    },
    Eose { sub_id: String },
    Notice { message: String },
}

/// Why an inbound frame could not be decoded.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("invalid event data: {0}")]
    Event(String),
    #[error("invalid filter: {0}")]
    Filter(String),
    #[error("{0}")]
    Shape(&'static str),
    #[error("unknown message type: {0}")]
    Unknown(String),
}

impl FrameError {
    /// The NOTICE text a failing frame earns; the connection stays open.
    pub fn notice(&self) -> String {
        match self {
            FrameError::Unknown(tag) => format!("Unknown message type: {tag}"),
            other => format!("Error processing message: {other}"),
        }
    }
}

/// Decode one inbound text frame.
pub fn parse_client_frame(raw: &str) -> Result<ClientFrame, FrameError> {
    let value: Value = serde_json::from_str(raw).map_err(|e| FrameError::Json(e.to_string()))?;
    let arr = value
        .as_array()
        .ok_or(FrameError::Shape("message must be a JSON array"))?;
    if arr.is_empty() {
        return Err(FrameError::Shape("empty message"));
    }
    let tag = arr[0]
        .as_str()
        .ok_or(FrameError::Shape("message type must be a string"))?;
    match tag {
        "EVENT" => {
            let raw_event = arr
                .get(1)
                .ok_or(FrameError::Shape("invalid EVENT message"))?;
            let event: Event = serde_json::from_value(raw_event.clone())
                .map_err(|e| FrameError::Event(e.to_string()))?;
            if event.tags.iter().any(|t| t.0.is_empty()) {
                return Err(FrameError::Event("tag must have at least one element".into()));
            }
            Ok(ClientFrame::Event(event))
        }
        "REQ" => {
            if arr.len() < 3 {
                return Err(FrameError::Shape("invalid REQ message"));
            }
            let sub_id = arr[1]
                .as_str()
                .ok_or(FrameError::Shape("invalid subscription ID"))?
                .to_string();
            let mut filters = Vec::with_capacity(arr.len() - 2);
            for raw_filter in &arr[2..] {
                let filter: Filter = serde_json::from_value(raw_filter.clone())
                    .map_err(|e| FrameError::Filter(e.to_string()))?;
                filters.push(filter);
            }
            Ok(ClientFrame::Req { sub_id, filters })
        }
        "CLOSE" => {
            let sub_id = arr
                .get(1)
                .and_then(Value::as_str)
                .ok_or(FrameError::Shape("invalid CLOSE message"))?
                .to_string();
            Ok(ClientFrame::Close { sub_id })
        }
        other => Err(FrameError::Unknown(other.to_string())),
    }
}

impl RelayFrame {
    /// Encode for the wire as a JSON array in a text frame.
    pub fn to_text(&self) -> String {
        let value = match self {
            RelayFrame::Event { sub_id, event } => json!(["EVENT", sub_id, event.as_ref()]),
            RelayFrame::Ok {
                id,
                accepted,
                message,
            } => json!(["OK", id, accepted, message]),
            RelayFrame::Eose { sub_id } => json!(["EOSE", sub_id]),
            RelayFrame::Notice { message } => json!(["NOTICE", message]),
        };
        value.to_string()
    }
}

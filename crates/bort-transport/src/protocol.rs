//! Bridge wire format.
//!
//! Every frame is a big-endian `u32` length followed by a JSON document.
//! The front-end sends a [`Request`] and the plugin host answers each one
//! with exactly one [`Response`], in order.
//!
//! ```text
//! → {"op":"process","message":{"type":1,"context":"#bort",...}}
//! ← {"op":"processed","replies":[...],"error":null}
//! → {"op":"pull"}
//! ← {"op":"pulled","messages":[...]}
//! ```

use bort_core::{Dispatch, Message};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::BridgeError;

/// Largest frame either side accepts.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Builds the length-delimited frame codec used on both ends.
pub fn frame_codec() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder()
        .length_field_length(4)
        .max_frame_length(MAX_FRAME_LEN)
        .big_endian()
        .new_codec()
}

/// A request from the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Dispatch one inbound message.
    Process { message: Message },
    /// Drain the outbox.
    Pull,
}

/// A response from the plugin host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Response {
    /// Result of a `process` request.
    Processed {
        replies: Vec<Message>,
        /// Handler failures, one per line.
        error: Option<String>,
    },
    /// Result of a `pull` request.
    Pulled { messages: Vec<Message> },
    /// The request could not be decoded.
    Failed { reason: String },
}

impl From<Dispatch> for Response {
    fn from(dispatch: Dispatch) -> Self {
        Response::Processed {
            replies: dispatch.replies,
            error: dispatch.error.map(|e| e.to_string()),
        }
    }
}

impl Response {
    /// The `op` tag, for diagnostics.
    pub fn op(&self) -> &'static str {
        match self {
            Response::Processed { .. } => "processed",
            Response::Pulled { .. } => "pulled",
            Response::Failed { .. } => "failed",
        }
    }
}

/// The answer to a `process` call as seen by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessReply {
    /// Replies in dispatch order.
    pub replies: Vec<Message>,
    /// Handler failures reported by the plugin host.
    pub error: Option<String>,
}

/// Serializes a protocol value into a frame payload.
pub fn encode<T: Serialize>(value: &T) -> Result<Bytes, BridgeError> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Parses a frame payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, BridgeError> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bort_core::{DispatchError, MessageType};
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let request = Request::Process {
            message: Message::new(MessageType::PRIV_MSG, "#bort", "hi"),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["op"], "process");
        assert_eq!(value["message"]["type"], 1);
        assert_eq!(value["message"]["context"], "#bort");

        let pull: Request = decode(br#"{"op":"pull"}"#).unwrap();
        assert_eq!(pull, Request::Pull);
    }

    #[test]
    fn test_dispatch_error_is_flattened() {
        let dispatch = Dispatch {
            replies: vec![Message::new(MessageType::ACTION, "#bort", "waves")],
            error: Some(DispatchError::Command {
                command: "calc".into(),
                reason: "stack empty".into(),
            }),
        };
        let value = serde_json::to_value(Response::from(dispatch)).unwrap();
        assert_eq!(value["op"], "processed");
        assert_eq!(value["error"], json!("calc: stack empty"));
        assert_eq!(value["replies"][0]["type"], 2);
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        assert!(decode::<Request>(br#"{"op":"reload"}"#).is_err());
        assert!(decode::<Request>(b"not json").is_err());
    }
}

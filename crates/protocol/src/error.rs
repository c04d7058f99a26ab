//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding an inbound message.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message is not valid JSON: {0}")]
    MalformedJson(#[from] serde_json::Error),

    #[error("message has no top-level `action` string")]
    MissingAction,

    #[error("bad payload for action {action:?}: {source}")]
    BadPayload {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

//! Link-local parse errors

use thiserror::Error;

use crate::node::Protocol;

/// Why a single link was skipped
///
/// None of these abort a batch; the parser counts them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// Malformed authority or link structure
    #[error("format error: {0}")]
    Format(String),

    /// Invalid base64 or non-UTF-8 payload
    #[error("decode error: {0}")]
    Decode(String),

    /// Dialect-specific field problem
    #[error("{protocol} link rejected: {reason}")]
    Parse { protocol: String, reason: String },
}

impl LinkError {
    pub fn format(msg: impl Into<String>) -> Self {
        LinkError::Format(msg.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        LinkError::Decode(msg.into())
    }

    pub fn parse(protocol: Protocol, reason: impl Into<String>) -> Self {
        LinkError::Parse {
            protocol: protocol.label().to_string(),
            reason: reason.into(),
        }
    }

    /// For failures raised before a protocol is known (e.g. unknown scheme)
    pub fn unsupported_scheme(scheme: &str) -> Self {
        LinkError::Parse {
            protocol: scheme.to_string(),
            reason: "unsupported scheme".to_string(),
        }
    }
}

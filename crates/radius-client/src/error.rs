//! Client error types

use crate::config::ConfigError;
use radius_proto::{DictionaryError, EncodingError, PacketError};
use std::net::SocketAddr;
use thiserror::Error;

/// Errors surfaced by [`crate::Client`]
///
/// Per-datagram problems (malformed replies, bad authenticators, stray
/// sources) never appear here directly; they only count towards
/// `ProtocolViolation` once the retry budget is spent.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No reply arrived within the retry budget
    #[error("No reply from {server} after {attempts} attempts")]
    Timeout { server: SocketAddr, attempts: u32 },

    /// Replies arrived on every attempt but none passed verification
    #[error(
        "No valid reply from {server}: {rejected} replies failed verification \
         over {attempts} attempts"
    )]
    ProtocolViolation {
        server: SocketAddr,
        attempts: u32,
        rejected: u32,
    },

    /// Caller supplied an invalid attribute value
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    /// Request could not be framed
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),

    #[error("Dictionary error: {0}")]
    Dictionary(#[from] DictionaryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Every identifier is held by an outstanding request
    #[error("All 256 RADIUS identifiers are in use")]
    IdentifiersExhausted,

    #[error("Could not resolve RADIUS server {0}")]
    Resolve(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether the exchange failed for lack of a (valid) reply
    pub fn is_no_reply(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout { .. } | ClientError::ProtocolViolation { .. }
        )
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

//! Error types

mod config;
mod protocol;
mod transport;

pub use config::*;
pub use protocol::*;
pub use transport::*;

/// Top-level error returned by table operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The table is misconfigured for the requested operation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The server answered with a body that breaks the fetch contract.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The request never produced a usable response.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A persistent store failed to read or write its backing file.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Returns `true` if this is a soft failure the caller may retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns `true` if the error indicates a client/server contract mismatch.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }
}

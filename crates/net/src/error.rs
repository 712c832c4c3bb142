//! Network error types

use std::io;

use uuid::Uuid;

use crate::protocol::ErrorKind;

/// Network result type
pub type Result<T> = std::result::Result<T, Error>;

/// Network errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Not connected")]
    NotConnected,

    #[error("Server full")]
    ServerFull,

    /// The server answered with an error response
    #[error("{kind}: {message} (crid {crid})")]
    Remote {
        kind: ErrorKind,
        message: String,
        crid: Uuid,
    },
}

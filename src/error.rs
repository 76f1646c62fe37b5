//! Error types surfaced by the forward client.

use std::io;

use thiserror::Error;

/// Errors raised while delivering an envelope to the collection endpoint.
///
/// Neither variant is retried internally. A `Connection` error leaves the
/// manager disconnected so the next send reconnects from scratch; a
/// `Transport` error contaminates the current connection, which must be torn
/// down before anything else is written on it.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// Establishing the TCP connection failed.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    /// Writing or flushing an established stream failed.
    #[error("failed to write envelope: {0}")]
    Transport(#[source] io::Error),
}

/// Errors that may occur while building a client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Invalid user supplied configuration.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

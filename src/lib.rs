//! Client for the Fluentd Forward Protocol.
//!
//! Structured log records are serialised into MessagePack envelopes of the
//! shape `[tag, time, record]` and shipped over one persistent TCP
//! connection to a log-collection endpoint. The client connects lazily,
//! notices dead connections on the write path, and rebuilds them on the
//! next send; failed envelopes are surfaced to the caller and never
//! queued or retried.
//!
//! The pieces compose top-down: [`ConnectionManager`] owns the socket and
//! its [`ForwardEncoder`]; [`ForwardClient`] flattens a host framework's
//! [`LogEvent`] into a [`Record`] and drives the two. Everything is
//! synchronous and single-owner: callers sharing a client across threads
//! serialise access themselves.

mod builder;
mod client;
mod config;
mod connection;
mod encoder;
mod error;
mod event;
mod value;

pub use builder::ForwardClientBuilder;
pub use client::ForwardClient;
pub use config::{
    DEFAULT_BUFFER_SIZE, DEFAULT_HOST, DEFAULT_IO_TIMEOUT, DEFAULT_LINGER_TIMEOUT, DEFAULT_PORT,
    ForwardConfig,
};
pub use connection::ConnectionManager;
pub use encoder::ForwardEncoder;
pub use error::{BuildError, ForwardError};
pub use event::{LogEvent, STACK_TRACE_FIELD, StackFrame};
pub use value::{Decimal, FieldValue, Record};

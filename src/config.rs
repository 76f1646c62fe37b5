//! Configuration consumed by the forward client.
//!
//! [`ForwardConfig`] carries the endpoint identity, socket tuning, and
//! record-building gates. [`ForwardClientBuilder`](crate::ForwardClientBuilder)
//! constructs validated values; direct construction via [`ForwardConfig::new`]
//! is available for callers that already hold trusted settings.

use std::collections::HashSet;
use std::time::Duration;

/// Default collection endpoint host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default Forward Protocol port.
pub const DEFAULT_PORT: u16 = 24224;
/// Default socket send and receive buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;
/// Default socket send and receive timeout.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default linger duration applied when closing the socket.
pub const DEFAULT_LINGER_TIMEOUT: Duration = Duration::from_millis(1000);

/// Settings for one client instance.
#[derive(Clone, Debug)]
pub struct ForwardConfig {
    /// Hostname or IP address of the collection endpoint.
    pub host: String,
    /// TCP port of the collection endpoint.
    pub port: u16,
    /// Tag prepended to every envelope.
    pub tag: String,
    /// Disable Nagle's algorithm on the socket.
    pub no_delay: bool,
    /// SO_SNDBUF size in bytes, applied before connect.
    pub send_buffer_size: usize,
    /// SO_RCVBUF size in bytes, applied before connect.
    pub receive_buffer_size: usize,
    /// Bounds both the connect handshake and each write-and-flush.
    pub send_timeout: Duration,
    /// Bounds reads on the socket. The protocol never reads back, but the
    /// option is still applied to the stream.
    pub receive_timeout: Duration,
    /// SO_LINGER duration on close; `None` disables lingering.
    pub linger: Option<Duration>,
    /// Embed the event's captured stack trace as a nested field.
    pub emit_stack_trace: bool,
    /// Copy the event's extra properties into the record.
    pub include_all_properties: bool,
    /// Property names dropped while building the record.
    pub exclude_properties: HashSet<String>,
}

impl ForwardConfig {
    /// Build a configuration for `tag` with every other setting defaulted.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            tag: tag.into(),
            no_delay: false,
            send_buffer_size: DEFAULT_BUFFER_SIZE,
            receive_buffer_size: DEFAULT_BUFFER_SIZE,
            send_timeout: DEFAULT_IO_TIMEOUT,
            receive_timeout: DEFAULT_IO_TIMEOUT,
            linger: Some(DEFAULT_LINGER_TIMEOUT),
            emit_stack_trace: false,
            include_all_properties: false,
            exclude_properties: HashSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DEFAULT_BUFFER_SIZE, DEFAULT_IO_TIMEOUT, ForwardConfig};

    #[rstest]
    fn new_applies_documented_defaults() {
        let config = ForwardConfig::new("app.log");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 24224);
        assert_eq!(config.tag, "app.log");
        assert!(!config.no_delay);
        assert_eq!(config.send_buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.receive_buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.send_timeout, DEFAULT_IO_TIMEOUT);
        assert!(config.linger.is_some());
        assert!(!config.emit_stack_trace);
        assert!(!config.include_all_properties);
        assert!(config.exclude_properties.is_empty());
    }
}

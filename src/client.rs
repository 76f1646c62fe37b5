//! Client facade tying connection management and encoding together.

use chrono::{DateTime, TimeZone};

use crate::config::ForwardConfig;
use crate::connection::ConnectionManager;
use crate::error::ForwardError;
use crate::event::LogEvent;
use crate::value::Record;

/// Forward Protocol client bound to one collection endpoint.
///
/// The client connects lazily on the first send and replaces connections it
/// has observed failing. It holds no locks and spawns no threads: callers
/// running from several threads must serialise access themselves, or give
/// each producer its own client.
#[derive(Debug)]
pub struct ForwardClient {
    config: ForwardConfig,
    connections: ConnectionManager,
}

impl ForwardClient {
    pub fn new(config: ForwardConfig) -> Self {
        let connections = ConnectionManager::new(config.clone());
        Self {
            config,
            connections,
        }
    }

    /// Ship one event to the endpoint.
    ///
    /// The record is built from the event per the configured gates, then
    /// encoded under the configured tag. Failures are surfaced, never
    /// retried: the failed event is lost from this client's perspective and
    /// the next send starts from a fresh connection.
    pub fn send(&mut self, event: &LogEvent) -> Result<(), ForwardError> {
        let record = event.to_record(
            self.config.emit_stack_trace,
            self.config.include_all_properties,
            &self.config.exclude_properties,
        );
        self.send_record(event.timestamp, record)
    }

    /// Ship a caller-built record under the configured tag.
    pub fn send_record<Tz: TimeZone>(
        &mut self,
        timestamp: DateTime<Tz>,
        record: Record,
    ) -> Result<(), ForwardError> {
        self.connections.ensure_connected()?;
        self.connections.emit(timestamp, &self.config.tag, &record)
    }

    /// Tear down the current connection, if any.
    ///
    /// The client stays usable; the next send reconnects.
    pub fn close(&mut self) {
        self.connections.teardown();
    }
}

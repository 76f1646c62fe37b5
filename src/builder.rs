//! Builder for [`ForwardClient`].
//!
//! Covers the whole configuration surface: endpoint identity, socket
//! tuning, and the record-building gates. Settings left unset fall back to
//! the defaults documented on [`ForwardConfig`]; the tag is the one
//! required field.

use std::collections::HashSet;
use std::time::Duration;

use crate::client::ForwardClient;
use crate::config::ForwardConfig;
use crate::error::BuildError;

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(BuildError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`ForwardClient`] instances.
#[derive(Clone, Debug, Default)]
pub struct ForwardClientBuilder {
    host: Option<String>,
    port: Option<u16>,
    tag: Option<String>,
    no_delay: Option<bool>,
    send_buffer_size: Option<usize>,
    receive_buffer_size: Option<usize>,
    send_timeout_ms: Option<u64>,
    receive_timeout_ms: Option<u64>,
    linger_enabled: Option<bool>,
    linger_ms: Option<u64>,
    emit_stack_trace: Option<bool>,
    include_all_properties: Option<bool>,
    exclude_properties: HashSet<String>,
}

impl ForwardClientBuilder {
    /// Create a new builder with no tag configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag carried by every envelope. Required.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Set the collection endpoint host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Set the collection endpoint port."]
        with_port,
        port,
        u16
    );
    option_setter!(
        #[doc = "Disable Nagle's algorithm on the socket."]
        with_no_delay,
        no_delay,
        bool
    );
    option_setter!(with_send_buffer_size, send_buffer_size, usize);
    option_setter!(with_receive_buffer_size, receive_buffer_size, usize);
    option_setter!(with_send_timeout_ms, send_timeout_ms, u64);
    option_setter!(with_receive_timeout_ms, receive_timeout_ms, u64);
    option_setter!(
        #[doc = "Enable or disable lingering on close."]
        with_linger_enabled,
        linger_enabled,
        bool
    );
    option_setter!(
        #[doc = "Set the linger duration applied when lingering is enabled."]
        with_linger_ms,
        linger_ms,
        u64
    );
    option_setter!(
        #[doc = "Embed captured stack traces in outgoing records."]
        with_emit_stack_trace,
        emit_stack_trace,
        bool
    );
    option_setter!(
        #[doc = "Copy the event's extra properties into outgoing records."]
        with_include_all_properties,
        include_all_properties,
        bool
    );

    /// Drop the named property from every outgoing record.
    pub fn exclude_property(mut self, name: impl Into<String>) -> Self {
        self.exclude_properties.insert(name.into());
        self
    }

    /// Replace the exclusion set wholesale.
    pub fn with_exclude_properties(mut self, names: HashSet<String>) -> Self {
        self.exclude_properties = names;
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(&self) -> Result<ForwardClient, BuildError> {
        Ok(ForwardClient::new(self.build_config()?))
    }

    fn validate(&self) -> Result<(), BuildError> {
        self.validate_identity()?;
        self.validate_buffers()?;
        self.validate_timeouts()?;
        Ok(())
    }

    fn validate_identity(&self) -> Result<(), BuildError> {
        match &self.tag {
            None => {
                return Err(BuildError::InvalidConfig(
                    "forward client requires a tag".into(),
                ));
            }
            Some(tag) if tag.trim().is_empty() => {
                return Err(BuildError::InvalidConfig("tag must not be empty".into()));
            }
            Some(_) => {}
        }
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(BuildError::InvalidConfig("host must not be empty".into()));
        }
        Ok(())
    }

    fn validate_buffers(&self) -> Result<(), BuildError> {
        if let Some(size) = self.send_buffer_size {
            ensure_positive!(size, "send_buffer_size")?;
        }
        if let Some(size) = self.receive_buffer_size {
            ensure_positive!(size, "receive_buffer_size")?;
        }
        Ok(())
    }

    fn validate_timeouts(&self) -> Result<(), BuildError> {
        if let Some(timeout) = self.send_timeout_ms {
            ensure_positive!(timeout, "send_timeout_ms")?;
        }
        if let Some(timeout) = self.receive_timeout_ms {
            ensure_positive!(timeout, "receive_timeout_ms")?;
        }
        if let Some(linger) = self.linger_ms {
            ensure_positive!(linger, "linger_ms")?;
        }
        Ok(())
    }

    fn build_config(&self) -> Result<ForwardConfig, BuildError> {
        self.validate()?;
        let Some(tag) = &self.tag else {
            return Err(BuildError::InvalidConfig(
                "forward client requires a tag".into(),
            ));
        };
        let mut config = ForwardConfig::new(tag.clone());
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(no_delay) = self.no_delay {
            config.no_delay = no_delay;
        }
        if let Some(size) = self.send_buffer_size {
            config.send_buffer_size = size;
        }
        if let Some(size) = self.receive_buffer_size {
            config.receive_buffer_size = size;
        }
        if let Some(timeout) = self.send_timeout_ms {
            config.send_timeout = Duration::from_millis(timeout);
        }
        if let Some(timeout) = self.receive_timeout_ms {
            config.receive_timeout = Duration::from_millis(timeout);
        }
        config.linger = self.resolve_linger(config.linger);
        if let Some(emit) = self.emit_stack_trace {
            config.emit_stack_trace = emit;
        }
        if let Some(include) = self.include_all_properties {
            config.include_all_properties = include;
        }
        config.exclude_properties = self.exclude_properties.clone();
        Ok(config)
    }

    fn resolve_linger(&self, default: Option<Duration>) -> Option<Duration> {
        if self.linger_enabled == Some(false) {
            return None;
        }
        match self.linger_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => default,
        }
    }
}

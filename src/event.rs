//! Log event shape supplied by the host logging layer.
//!
//! The client does not own an event model; the host framework hands over a
//! [`LogEvent`] per log call and this module flattens it into the wire
//! [`Record`]. Once flattened, every field is opaque to the rest of the
//! client.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::value::{FieldValue, Record};

/// Reserved record field carrying the structured stack trace.
pub const STACK_TRACE_FIELD: &str = "stacktrace";

/// One frame of a captured stack trace.
#[derive(Clone, Debug)]
pub struct StackFrame {
    /// Source file, when the frame has one.
    pub filename: Option<String>,
    pub line: u32,
    pub column: u32,
    /// Human-readable description of the method or function.
    pub method: String,
    /// Offset within the compiled function body.
    pub instruction_offset: i64,
    /// Offset within the native code, where available.
    pub native_offset: i64,
}

impl StackFrame {
    fn to_value(&self) -> FieldValue {
        let mut frame = Record::new();
        frame.insert("filename", FieldValue::from(self.filename.clone()));
        frame.insert("line", self.line);
        frame.insert("column", self.column);
        frame.insert("method", self.method.as_str());
        frame.insert("instruction_offset", self.instruction_offset);
        frame.insert("native_offset", self.native_offset);
        FieldValue::Map(frame)
    }
}

/// A single event handed over by the host logging framework.
#[derive(Clone, Debug)]
pub struct LogEvent {
    /// Severity label, carried verbatim (e.g. "INFO" or "ERROR").
    pub level: String,
    /// Rendered message text.
    pub message: String,
    /// Name of the logger that produced the event.
    pub logger_name: String,
    /// Monotonically informative sequence number.
    pub sequence_id: u64,
    /// Moment the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Extra named properties, in the order the host supplied them.
    pub properties: Vec<(String, FieldValue)>,
    /// Captured stack trace, outermost frame last.
    pub stack_trace: Vec<StackFrame>,
}

impl LogEvent {
    /// Construct an event from logger `name`, `level`, and `message`,
    /// timestamped now.
    pub fn new(logger_name: &str, level: &str, message: &str) -> Self {
        Self {
            level: level.to_owned(),
            message: message.to_owned(),
            logger_name: logger_name.to_owned(),
            sequence_id: 0,
            timestamp: Utc::now(),
            properties: Vec::new(),
            stack_trace: Vec::new(),
        }
    }

    pub fn with_sequence_id(mut self, sequence_id: u64) -> Self {
        self.sequence_id = sequence_id;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach an extra named property.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.properties.push((name.into(), value.into()));
        self
    }

    pub fn with_stack_trace(mut self, frames: Vec<StackFrame>) -> Self {
        self.stack_trace = frames;
        self
    }

    /// Flatten the event into a wire record.
    ///
    /// Core fields always lead the record. The stack trace is embedded only
    /// when `emit_stack_trace` is set and frames were captured. Extra
    /// properties are copied only when `include_all_properties` is set;
    /// properties with empty names or names in `exclude` are skipped.
    pub fn to_record(
        &self,
        emit_stack_trace: bool,
        include_all_properties: bool,
        exclude: &HashSet<String>,
    ) -> Record {
        let mut record = Record::new();
        record.insert("level", self.level.as_str());
        record.insert("message", self.message.as_str());
        record.insert("logger_name", self.logger_name.as_str());
        record.insert("sequence_id", self.sequence_id);
        if emit_stack_trace && !self.stack_trace.is_empty() {
            let frames = self.stack_trace.iter().map(StackFrame::to_value).collect();
            record.insert(STACK_TRACE_FIELD, FieldValue::Seq(frames));
        }
        if include_all_properties {
            for (name, value) in &self.properties {
                if name.is_empty() || exclude.contains(name) {
                    continue;
                }
                record.insert(name.clone(), value.clone());
            }
        }
        record
    }
}

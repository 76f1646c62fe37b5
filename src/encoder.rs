//! Wire encoding for the Forward Protocol envelope.
//!
//! One envelope is the MessagePack sequence `[tag, time, record]`: a UTF-8
//! tag string, the event time as unsigned Unix epoch seconds, and the record
//! mapping. The encoder writes envelopes straight onto the stream it was
//! constructed with and flushes after each one, so nothing lingers in a
//! userspace buffer.

use std::io::{self, Write};

use chrono::{DateTime, TimeZone};
use rmp_serde::Serializer;
use serde::Serialize;

use crate::error::ForwardError;
use crate::value::Record;

/// Fixed-arity envelope; serde tuple structs encode as MessagePack arrays.
#[derive(Serialize)]
struct Envelope<'a>(&'a str, u64, &'a Record);

/// Encoder bound to the output stream of one connection.
///
/// An encoder is created when its connection is established and discarded
/// with it; it is never rebound to another stream.
#[derive(Debug)]
pub struct ForwardEncoder<W: Write> {
    destination: W,
}

impl<W: Write> ForwardEncoder<W> {
    /// Bind a new encoder to `destination`.
    pub fn new(destination: W) -> Self {
        Self { destination }
    }

    /// Serialise one envelope onto the stream and flush it out.
    ///
    /// The timestamp is truncated to whole Unix epoch seconds; instants
    /// before the epoch clamp to zero. A failed write can leave a truncated
    /// envelope behind, so after an error the connection must be torn down
    /// before anything else is sent on it.
    pub fn emit<Tz: TimeZone>(
        &mut self,
        timestamp: DateTime<Tz>,
        tag: &str,
        record: &Record,
    ) -> Result<(), ForwardError> {
        let epoch_seconds = u64::try_from(timestamp.timestamp()).unwrap_or_default();
        Envelope(tag, epoch_seconds, record)
            .serialize(&mut Serializer::new(&mut self.destination))
            .map_err(|err| ForwardError::Transport(io::Error::other(err)))?;
        self.destination.flush().map_err(ForwardError::Transport)
    }

    pub fn get_ref(&self) -> &W {
        &self.destination
    }

    pub fn into_inner(self) -> W {
        self.destination
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use chrono::{FixedOffset, TimeZone, Utc};
    use rmpv::Value;
    use rstest::rstest;

    use crate::error::ForwardError;
    use crate::value::{FieldValue, Record};

    use super::ForwardEncoder;

    fn sample_record() -> Record {
        let mut record = Record::new();
        record.insert("level", "INFO");
        record.insert("message", "hi");
        record
    }

    fn decode(bytes: &[u8]) -> Value {
        rmpv::decode::read_value(&mut &bytes[..]).expect("decode envelope")
    }

    fn map_get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
        let Value::Map(entries) = value else {
            return None;
        };
        entries
            .iter()
            .find(|(name, _)| name.as_str() == Some(key))
            .map(|(_, entry)| entry)
    }

    #[rstest]
    fn envelope_is_a_three_element_sequence() {
        let mut encoder = ForwardEncoder::new(Vec::new());
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        encoder
            .emit(timestamp, "app.log", &sample_record())
            .expect("emit envelope");

        let Value::Array(elements) = decode(encoder.get_ref()) else {
            panic!("envelope must decode to an array");
        };
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[0].as_str(), Some("app.log"));
        assert_eq!(elements[1].as_u64(), Some(timestamp.timestamp() as u64));
        assert_eq!(map_get(&elements[2], "level").and_then(Value::as_str), Some("INFO"));
        assert_eq!(map_get(&elements[2], "message").and_then(Value::as_str), Some("hi"));
    }

    #[rstest]
    fn timestamp_truncates_subseconds_and_normalises_to_utc() {
        let mut encoder = ForwardEncoder::new(Vec::new());
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let timestamp = offset
            .with_ymd_and_hms(2024, 5, 17, 17, 30, 7)
            .unwrap()
            .checked_add_signed(chrono::TimeDelta::milliseconds(999))
            .unwrap();
        encoder
            .emit(timestamp, "app.log", &sample_record())
            .expect("emit envelope");

        let Value::Array(elements) = decode(encoder.get_ref()) else {
            panic!("envelope must decode to an array");
        };
        let expected = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        assert_eq!(elements[1].as_u64(), Some(expected.timestamp() as u64));
    }

    #[rstest]
    fn nested_values_encode_with_the_same_policy_as_top_level_ones() {
        let mut frame = Record::new();
        frame.insert("detail", FieldValue::from_display(7.5f32));
        let mut record = Record::new();
        record.insert("frames", FieldValue::Seq(vec![FieldValue::Map(frame)]));
        record.insert("flat", FieldValue::from_display(7.5f32));

        let mut encoder = ForwardEncoder::new(Vec::new());
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        encoder.emit(timestamp, "app.log", &record).expect("emit envelope");

        let Value::Array(elements) = decode(encoder.get_ref()) else {
            panic!("envelope must decode to an array");
        };
        let flat = map_get(&elements[2], "flat").and_then(Value::as_str);
        let Some(Value::Array(frames)) = map_get(&elements[2], "frames") else {
            panic!("frames must decode to an array");
        };
        let nested = map_get(&frames[0], "detail").and_then(Value::as_str);
        assert_eq!(flat, nested);
        assert_eq!(flat, Some("7.5"));
    }

    #[rstest]
    fn sequential_emits_decode_in_order() {
        let mut encoder = ForwardEncoder::new(Vec::new());
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        for n in 0..3i64 {
            let mut record = Record::new();
            record.insert("n", n);
            encoder.emit(timestamp, "app.log", &record).expect("emit envelope");
        }

        let mut reader = &encoder.get_ref()[..];
        for n in 0..3i64 {
            let envelope = rmpv::decode::read_value(&mut reader).expect("decode envelope");
            let Value::Array(elements) = envelope else {
                panic!("envelope must decode to an array");
            };
            assert_eq!(map_get(&elements[2], "n").and_then(Value::as_i64), Some(n));
        }
    }

    /// Writer that fails once `limit` bytes have been accepted.
    struct FailingWriter {
        written: usize,
        limit: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written + buf.len() > self.limit {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn mid_envelope_write_failure_surfaces_as_transport_error() {
        let mut encoder = ForwardEncoder::new(FailingWriter { written: 0, limit: 4 });
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        let err = encoder
            .emit(timestamp, "app.log", &sample_record())
            .expect_err("write failure must propagate");
        assert!(matches!(err, ForwardError::Transport(_)));
    }

    struct FlushRejectingWriter;

    impl Write for FlushRejectingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::WouldBlock, "flush timed out"))
        }
    }

    #[rstest]
    fn flush_failure_surfaces_as_transport_error() {
        let mut encoder = ForwardEncoder::new(FlushRejectingWriter);
        let timestamp = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 7).unwrap();
        let err = encoder
            .emit(timestamp, "app.log", &sample_record())
            .expect_err("flush failure must propagate");
        assert!(matches!(err, ForwardError::Transport(_)));
    }
}

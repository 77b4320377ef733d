//! Recorded event logs.
//!
//! A session can be captured as a CBOR array of `{ "type": name, "data":
//! payload }` records and replayed later through the same router that handles
//! live events. The envelope mirrors the shape the transport glue uses when it
//! queues events for the client.
//!
//! Unknown event names are preserved: filtering them is the router's job, so a
//! log recorded by a newer transport still replays on an older client.
//!
//! Only the outer array is decoded strictly. A record whose envelope or
//! payload is unusable is set aside as a [`RejectedRecord`] and the rest of
//! the log still decodes.

use ciborium::value::Value as CborValue;

use crate::{
    Payload,
    errors::{ProtocolError, Result},
};

/// Maximum accepted event-log size (64 MiB).
pub const MAX_LOG_SIZE: usize = 64 * 1024 * 1024;

/// One inbound event as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Event name. May be outside [`crate::EventKind`].
    pub kind: String,
    /// Event payload.
    pub payload: Payload,
}

impl EventRecord {
    /// Create a record.
    pub fn new(kind: impl Into<String>, payload: Payload) -> Self {
        Self { kind: kind.into(), payload }
    }

    fn to_cbor(&self) -> Result<CborValue> {
        Ok(CborValue::Map(vec![
            (CborValue::Text("type".into()), CborValue::Text(self.kind.clone())),
            (CborValue::Text("data".into()), CborValue::try_from(&self.payload)?),
        ]))
    }

    fn from_cbor(index: usize, value: CborValue) -> Result<Self> {
        let CborValue::Map(entries) = value else {
            return Err(ProtocolError::MalformedRecord { index, reason: "record is not a map" });
        };

        let mut kind = None;
        let mut payload = Payload::new();
        for (key, value) in entries {
            match (key.as_text(), value) {
                (Some("type"), CborValue::Text(name)) => kind = Some(name),
                (Some("type"), _) => {
                    return Err(ProtocolError::MalformedRecord {
                        index,
                        reason: "`type` is not text",
                    });
                },
                (Some("data"), data) => payload = Payload::try_from(data)?,
                // Extra envelope fields are tolerated.
                _ => {},
            }
        }

        let kind =
            kind.ok_or(ProtocolError::MalformedRecord { index, reason: "missing `type`" })?;
        Ok(Self { kind, payload })
    }
}

/// A record that could not be decoded, with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position of the record in the log.
    pub index: usize,
    /// Why it was rejected.
    pub error: ProtocolError,
}

/// A decoded event log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    /// Usable records, in log order.
    pub records: Vec<EventRecord>,
    /// Records that were skipped, in log order.
    pub rejected: Vec<RejectedRecord>,
}

impl EventLog {
    /// Total number of entries in the log, usable or not.
    pub fn len(&self) -> usize {
        self.records.len() + self.rejected.len()
    }

    /// Whether the log had no entries at all.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.rejected.is_empty()
    }
}

/// Encode records as a CBOR array.
///
/// # Errors
///
/// - `ProtocolError::IntegerOutOfRange` if a payload integer exceeds the CBOR
///   integer range
/// - `ProtocolError::CborEncode` if serialization fails
pub fn encode_log(records: &[EventRecord]) -> Result<Vec<u8>> {
    let array =
        CborValue::Array(records.iter().map(EventRecord::to_cbor).collect::<Result<Vec<_>>>()?);

    let mut buf = Vec::new();
    ciborium::ser::into_writer(&array, &mut buf)
        .map_err(|e| ProtocolError::CborEncode(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR array of records.
///
/// The size check happens before CBOR parsing begins. Records that lack the
/// `{type, data}` shape or carry an unsupported payload value are collected in
/// [`EventLog::rejected`] instead of failing the whole log.
///
/// # Errors
///
/// - `ProtocolError::LogTooLarge` if `bytes` exceeds [`MAX_LOG_SIZE`]
/// - `ProtocolError::CborDecode` if the bytes are not valid CBOR or the top
///   level is not an array
pub fn decode_log(bytes: &[u8]) -> Result<EventLog> {
    if bytes.len() > MAX_LOG_SIZE {
        return Err(ProtocolError::LogTooLarge { size: bytes.len(), max: MAX_LOG_SIZE });
    }

    let value: CborValue =
        ciborium::de::from_reader(bytes).map_err(|e| ProtocolError::CborDecode(e.to_string()))?;

    let CborValue::Array(items) = value else {
        return Err(ProtocolError::CborDecode("event log must be an array".into()));
    };

    let mut log = EventLog::default();
    for (index, item) in items.into_iter().enumerate() {
        match EventRecord::from_cbor(index, item) {
            Ok(record) => log.records.push(record),
            Err(error) => log.rejected.push(RejectedRecord { index, error }),
        }
    }
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Value;

    #[test]
    fn log_round_trip_preserves_unknown_kinds() {
        let records = vec![
            EventRecord::new("self_joined", Payload::new().with("id", 7u64).with("name", "den")),
            EventRecord::new("future_event", Payload::new().with("flag", true)),
        ];

        let bytes = encode_log(&records).expect("encode");
        let decoded = decode_log(&bytes).expect("decode");
        assert_eq!(decoded.records, records);
        assert!(decoded.rejected.is_empty());
    }

    #[test]
    fn missing_data_decodes_as_empty_payload() {
        let raw = CborValue::Array(vec![CborValue::Map(vec![(
            CborValue::Text("type".into()),
            CborValue::Text("self_left".into()),
        )])]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&raw, &mut bytes).expect("encode");

        let decoded = decode_log(&bytes).expect("decode");
        assert_eq!(decoded.records, vec![EventRecord::new("self_left", Payload::new())]);
    }

    #[test]
    fn missing_type_is_rejected() {
        let raw = CborValue::Array(vec![CborValue::Map(vec![])]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&raw, &mut bytes).expect("encode");

        let decoded = decode_log(&bytes).expect("decode");
        assert!(decoded.records.is_empty());
        assert_eq!(decoded.rejected, vec![RejectedRecord {
            index: 0,
            error: ProtocolError::MalformedRecord { index: 0, reason: "missing `type`" },
        }]);
    }

    #[test]
    fn bad_payload_only_rejects_its_record() {
        let record = |kind: &str, data: CborValue| {
            CborValue::Map(vec![
                (CborValue::Text("type".into()), CborValue::Text(kind.into())),
                (CborValue::Text("data".into()), data),
            ])
        };
        let connected = || {
            CborValue::Map(vec![(CborValue::Text("connected".into()), CborValue::Bool(true))])
        };
        let raw = CborValue::Array(vec![
            record("connection_changed", connected()),
            record(
                "chat",
                CborValue::Map(vec![(CborValue::Text("blob".into()), CborValue::Bytes(vec![1, 2]))]),
            ),
            record("connection_changed", connected()),
            record("chat", CborValue::Bool(false)),
        ]);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&raw, &mut bytes).expect("encode");

        let decoded = decode_log(&bytes).expect("decode");
        assert_eq!(decoded.len(), 4);
        assert_eq!(decoded.records.len(), 2);
        assert!(decoded.records.iter().all(|r| r.kind == "connection_changed"));
        assert_eq!(decoded.rejected.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(decoded.rejected[0].error, ProtocolError::UnsupportedValue("byte string"));
    }

    #[test]
    fn top_level_must_be_array() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&CborValue::Bool(true), &mut bytes).expect("encode");
        assert!(matches!(decode_log(&bytes), Err(ProtocolError::CborDecode(_))));
    }

    #[test]
    fn nested_payloads_survive() {
        let member = Payload::new().with("id", 3u64).with("name", "ash");
        let payload = Payload::new()
            .with("id", 1u64)
            .with("name", "den")
            .with("members", Value::List(vec![Value::Map(member)]));
        let records = vec![EventRecord::new("self_joined", payload)];

        let decoded = decode_log(&encode_log(&records).expect("encode")).expect("decode");
        assert_eq!(decoded.records, records);
    }
}

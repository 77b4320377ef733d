//! Property-based tests for event-log encoding/decoding
//!
//! Recorded logs come from disk and may be truncated or hostile. Decoding must
//! reject bad input with an error, never a panic, and anything the encoder
//! produces must decode back to the same records. One unusable record must
//! not cost the rest of the log.

use lobbyframe_proto::{EventKind, EventRecord, Payload, Value, decode_log, encode_log};
use ciborium::value::Value as CborValue;
use proptest::prelude::*;

/// Strategy for payload values, nested up to a few levels
fn arbitrary_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-z0-9 ]{0,16}".prop_map(Value::Text),
    ];

    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                .prop_map(|fields| Value::Map(fields.into_iter().collect())),
        ]
    })
}

fn arbitrary_payload() -> impl Strategy<Value = Payload> {
    prop::collection::btree_map("[a-z_]{1,12}", arbitrary_value(), 0..6)
        .prop_map(|fields| fields.into_iter().collect())
}

/// Known kinds most of the time, occasionally a name from a newer transport
fn arbitrary_kind() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(EventKind::ALL.to_vec()).prop_map(|k| k.name().to_owned()),
        1 => "[a-z_]{1,20}",
    ]
}

fn arbitrary_record() -> impl Strategy<Value = EventRecord> {
    (arbitrary_kind(), arbitrary_payload())
        .prop_map(|(kind, payload)| EventRecord::new(kind, payload))
}

#[test]
fn prop_log_roundtrip() {
    proptest!(|(records in prop::collection::vec(arbitrary_record(), 0..16))| {
        let bytes = encode_log(&records).expect("encode should succeed");
        let decoded = decode_log(&bytes).expect("decode should succeed");

        // PROPERTY: Round-trip must be identity, unknown kinds included
        prop_assert_eq!(decoded.records, records);
        prop_assert!(decoded.rejected.is_empty());
    });
}

#[test]
fn prop_bad_record_is_isolated() {
    proptest!(|(
        records in prop::collection::vec(arbitrary_record(), 0..8),
        at in any::<prop::sample::Index>(),
    )| {
        let bytes = encode_log(&records).expect("encode should succeed");
        let value: CborValue =
            ciborium::de::from_reader(bytes.as_slice()).expect("valid cbor");
        let mut items = if let CborValue::Array(items) = value { items } else { Vec::new() };
        prop_assert_eq!(items.len(), records.len());
        let bad_index = at.index(items.len() + 1);
        items.insert(bad_index, CborValue::Map(vec![
            (CborValue::Text("type".into()), CborValue::Text("chat".into())),
            (CborValue::Text("data".into()), CborValue::Bytes(vec![0xde, 0xad])),
        ]));
        let mut spliced = Vec::new();
        ciborium::ser::into_writer(&CborValue::Array(items), &mut spliced).expect("encode");

        let decoded = decode_log(&spliced).expect("envelope is valid");

        // PROPERTY: Every good record survives, in order, around the bad one
        prop_assert_eq!(decoded.records, records);
        prop_assert_eq!(decoded.rejected.len(), 1);
        prop_assert_eq!(decoded.rejected[0].index, bad_index);
    });
}

#[test]
fn prop_decode_arbitrary_bytes_never_panics() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..512))| {
        // PROPERTY: Garbage input is an error or a valid log, never a panic
        let _ = decode_log(&bytes);
    });
}

#[test]
fn prop_truncated_log_is_rejected() {
    proptest!(|(
        records in prop::collection::vec(arbitrary_record(), 1..8),
        cut in any::<prop::sample::Index>(),
    )| {
        let bytes = encode_log(&records).expect("encode should succeed");
        let len = cut.index(bytes.len());

        // PROPERTY: Any strict prefix of a non-empty log fails to decode
        prop_assert!(decode_log(&bytes[..len]).is_err());
    });
}

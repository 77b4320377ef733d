//! Fuzz target for recorded event logs
//!
//! Logs are read from disk and may be truncated, hostile or recorded by a
//! different client version.
//!
//! # Strategy
//!
//! - Random bytes: arbitrary input straight into the decoder
//! - Deep nesting: payload values nested past any sane depth
//! - Huge lengths: CBOR headers claiming enormous arrays
//! - Wrong shapes: records that are not `{type, data}` maps
//! - Replay: anything that decodes is dispatched through a real router
//!
//! # Invariants
//!
//! - Decoding never panics and never allocates what a header merely claims
//! - A log of wrong shapes still decodes, with one entry per shape
//! - Every decoded record dispatches to an outcome without panicking

#![no_main]

use arbitrary::Arbitrary;
use ciborium::value::Value as CborValue;
use libfuzzer_sys::fuzz_target;
use lobbyframe_core::{ClientConfig, EventRouter, SessionIdentity, env::test_utils::MockEnv};
use lobbyframe_proto::decode_log;

#[derive(Debug, Clone, Arbitrary)]
enum LogAttack {
    RandomBytes { bytes: Vec<u8> },
    DeeplyNested { depth: u8, as_map: bool },
    HugeLength { exponent: u8 },
    WrongShape { records: Vec<Shape> },
}

#[derive(Debug, Clone, Arbitrary)]
enum Shape {
    NotAMap(i64),
    TypeNotText(i64),
    MissingType,
    DataNotMap(bool),
    Valid { kind: u8, id: Option<u64>, text: String },
}

const KINDS: [&str; 9] = [
    "self_joined",
    "self_left",
    "player_joined",
    "chat",
    "file_added",
    "transfer_receive_progress",
    "transfer_cancelled",
    "data_received",
    "not_a_real_event",
];

fn text(s: &str) -> CborValue {
    CborValue::Text(s.to_owned())
}

fn shape_to_cbor(shape: &Shape) -> CborValue {
    match shape {
        Shape::NotAMap(n) => CborValue::Integer((*n).into()),
        Shape::TypeNotText(n) => CborValue::Map(vec![(text("type"), CborValue::Integer((*n).into()))]),
        Shape::MissingType => CborValue::Map(vec![(text("data"), CborValue::Map(vec![]))]),
        Shape::DataNotMap(b) => {
            CborValue::Map(vec![(text("type"), text("chat")), (text("data"), CborValue::Bool(*b))])
        },
        Shape::Valid { kind, id, text: body } => {
            let mut data = vec![(text("text"), text(body)), (text("name"), text(body))];
            if let Some(id) = id {
                data.push((text("id"), CborValue::Integer((*id).into())));
            }
            CborValue::Map(vec![
                (text("type"), text(KINDS[usize::from(*kind) % KINDS.len()])),
                (text("data"), CborValue::Map(data)),
            ])
        },
    }
}

fn encode(value: &CborValue) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = ciborium::ser::into_writer(value, &mut buf);
    buf
}

fn nested(depth: usize, as_map: bool) -> Vec<u8> {
    let mut inner = CborValue::Null;
    for _ in 0..depth {
        inner = if as_map {
            CborValue::Map(vec![(text("k"), inner)])
        } else {
            CborValue::Array(vec![inner])
        };
    }
    let record = CborValue::Map(vec![
        (text("type"), text("chat")),
        (text("data"), CborValue::Map(vec![(text("text"), inner)])),
    ]);
    encode(&CborValue::Array(vec![record]))
}

fn huge_length(exponent: u8) -> Vec<u8> {
    // Array header with a 64-bit length and no elements behind it.
    let claimed = 1u64 << (exponent % 64);
    let mut bytes = vec![0x9b];
    bytes.extend_from_slice(&claimed.to_be_bytes());
    bytes
}

fuzz_target!(|attack: LogAttack| {
    let bytes = match &attack {
        LogAttack::RandomBytes { bytes } => bytes.clone(),
        LogAttack::DeeplyNested { depth, as_map } => nested(usize::from(*depth % 64), *as_map),
        LogAttack::HugeLength { exponent } => huge_length(*exponent),
        LogAttack::WrongShape { records } => {
            encode(&CborValue::Array(records.iter().map(shape_to_cbor).collect()))
        },
    };

    let Ok(log) = decode_log(&bytes) else {
        return;
    };
    if let LogAttack::WrongShape { records } = &attack {
        assert_eq!(log.len(), records.len());
    }

    let mut router = EventRouter::new(
        MockEnv::new(),
        SessionIdentity::new("fuzz", "127.0.0.1"),
        ClientConfig::default(),
    );
    for record in &log.records {
        let _ = router.dispatch(&record.kind, &record.payload);
    }
});

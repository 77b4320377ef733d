//! Dynamic payload values.
//!
//! The transport hands every event over as a map of string keys to values.
//! [`Payload`] wraps that map and offers typed accessors that report exactly
//! which field was missing or mistyped, so an event decoder can reject the
//! whole event before touching any state.
//!
//! Integers are held as `i128` so that every `u64` identifier the transport
//! produces round-trips without truncation.

use std::collections::{BTreeMap, btree_map};

use ciborium::value::{Integer, Value as CborValue};

use crate::errors::{PayloadError, ProtocolError};

/// A single payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null. Treated like an absent field by the accessors.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer (wide enough for any `u64` or `i64`).
    Int(i128),
    /// Floating point number.
    Float(f64),
    /// UTF-8 text.
    Text(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Nested string-keyed map.
    Map(Payload),
}

impl Value {
    /// Short name of the value's type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Text content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Nested map, if this is a map value.
    pub fn as_payload(&self) -> Option<&Payload> {
        match self {
            Self::Map(p) => Some(p),
            _ => None,
        }
    }

    /// Whether this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i128::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Payload> for Value {
    fn from(v: Payload) -> Self {
        Self::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<CborValue> for Value {
    type Error = ProtocolError;

    fn try_from(value: CborValue) -> Result<Self, Self::Error> {
        let converted = match value {
            CborValue::Null => Self::Null,
            CborValue::Bool(b) => Self::Bool(b),
            CborValue::Integer(i) => Self::Int(i128::from(i)),
            CborValue::Float(f) => Self::Float(f),
            CborValue::Text(s) => Self::Text(s),
            CborValue::Array(items) => {
                Self::List(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            },
            CborValue::Map(entries) => Self::Map(Payload::try_from_cbor_entries(entries)?),
            // Tags carry no meaning for payloads, keep the tagged value.
            CborValue::Tag(_, inner) => Self::try_from(*inner)?,
            CborValue::Bytes(_) => return Err(ProtocolError::UnsupportedValue("byte string")),
            _ => return Err(ProtocolError::UnsupportedValue("unknown CBOR type")),
        };
        Ok(converted)
    }
}

impl TryFrom<&Value> for CborValue {
    type Error = ProtocolError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        let converted = match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Integer(
                Integer::try_from(*i).map_err(|_| ProtocolError::IntegerOutOfRange(*i))?,
            ),
            Value::Float(f) => Self::Float(*f),
            Value::Text(s) => Self::Text(s.clone()),
            Value::List(items) => {
                Self::Array(items.iter().map(Self::try_from).collect::<Result<_, _>>()?)
            },
            Value::Map(payload) => Self::try_from(payload)?,
        };
        Ok(converted)
    }
}

/// String-keyed map of [`Value`]s carried by every event.
///
/// Accessors follow one convention: a `Null` value is the same as an absent
/// field. Required accessors fail with [`PayloadError::MissingField`], `opt_`
/// accessors return `Ok(None)`. A present value of the wrong type is always
/// an error, even for optional fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: BTreeMap<String, Value>,
}

impl Payload {
    /// Create an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw field value. Null values are returned as-is.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the payload has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    fn present(&self, field: &'static str) -> Option<&Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &'static str) -> Result<&Value, PayloadError> {
        self.present(field).ok_or(PayloadError::MissingField { field })
    }

    /// Required text field.
    pub fn str(&self, field: &'static str) -> Result<&str, PayloadError> {
        let value = self.required(field)?;
        value.as_str().ok_or(PayloadError::WrongType { field, expected: "text" })
    }

    /// Optional text field.
    pub fn opt_str(&self, field: &'static str) -> Result<Option<&str>, PayloadError> {
        self.present(field)
            .map(|v| v.as_str().ok_or(PayloadError::WrongType { field, expected: "text" }))
            .transpose()
    }

    /// Required non-negative integer field.
    pub fn u64(&self, field: &'static str) -> Result<u64, PayloadError> {
        to_u64(field, self.required(field)?)
    }

    /// Optional non-negative integer field.
    pub fn opt_u64(&self, field: &'static str) -> Result<Option<u64>, PayloadError> {
        self.present(field).map(|v| to_u64(field, v)).transpose()
    }

    /// Required 32-bit non-negative integer field.
    pub fn u32(&self, field: &'static str) -> Result<u32, PayloadError> {
        narrow_u32(field, self.u64(field)?)
    }

    /// Optional 32-bit non-negative integer field.
    pub fn opt_u32(&self, field: &'static str) -> Result<Option<u32>, PayloadError> {
        self.opt_u64(field)?.map(|v| narrow_u32(field, v)).transpose()
    }

    /// Optional signed integer field.
    pub fn opt_i64(&self, field: &'static str) -> Result<Option<i64>, PayloadError> {
        self.present(field)
            .map(|v| match v {
                Value::Int(i) => {
                    i64::try_from(*i).map_err(|_| PayloadError::OutOfRange { field, value: *i })
                },
                _ => Err(PayloadError::WrongType { field, expected: "int" }),
            })
            .transpose()
    }

    /// Required boolean field.
    pub fn bool(&self, field: &'static str) -> Result<bool, PayloadError> {
        match self.required(field)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(PayloadError::WrongType { field, expected: "bool" }),
        }
    }

    /// Optional boolean field.
    pub fn opt_bool(&self, field: &'static str) -> Result<Option<bool>, PayloadError> {
        if self.present(field).is_none() {
            return Ok(None);
        }
        self.bool(field).map(Some)
    }

    /// Optional numeric field as `f64`. Integers are accepted.
    pub fn opt_f64(&self, field: &'static str) -> Result<Option<f64>, PayloadError> {
        self.present(field)
            .map(|v| match v {
                Value::Float(f) => Ok(*f),
                Value::Int(i) => Ok(*i as f64),
                _ => Err(PayloadError::WrongType { field, expected: "number" }),
            })
            .transpose()
    }

    /// Required list field.
    pub fn list(&self, field: &'static str) -> Result<&[Value], PayloadError> {
        match self.required(field)? {
            Value::List(items) => Ok(items),
            _ => Err(PayloadError::WrongType { field, expected: "list" }),
        }
    }

    /// Optional list field, returned empty when absent.
    pub fn list_or_empty(&self, field: &'static str) -> Result<&[Value], PayloadError> {
        if self.present(field).is_none() {
            return Ok(&[]);
        }
        self.list(field)
    }

    /// Optional nested map field.
    pub fn opt_map(&self, field: &'static str) -> Result<Option<&Payload>, PayloadError> {
        self.present(field)
            .map(|v| v.as_payload().ok_or(PayloadError::WrongType { field, expected: "map" }))
            .transpose()
    }

    /// Required list field whose elements are all maps.
    pub fn maps(&self, field: &'static str) -> Result<Vec<&Payload>, PayloadError> {
        self.list(field)?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_payload().ok_or_else(|| {
                    PayloadError::WrongType { field, expected: "map" }.within(field, index)
                })
            })
            .collect()
    }

    fn try_from_cbor_entries(entries: Vec<(CborValue, CborValue)>) -> Result<Self, ProtocolError> {
        let mut fields = BTreeMap::new();
        for (key, value) in entries {
            let CborValue::Text(key) = key else {
                return Err(ProtocolError::NonTextKey);
            };
            fields.insert(key, Value::try_from(value)?);
        }
        Ok(Self { fields })
    }
}

impl TryFrom<&Payload> for CborValue {
    type Error = ProtocolError;

    fn try_from(payload: &Payload) -> Result<Self, Self::Error> {
        let entries = payload
            .iter()
            .map(|(k, v)| Ok((Self::Text(k.clone()), Self::try_from(v)?)))
            .collect::<Result<Vec<_>, ProtocolError>>()?;
        Ok(Self::Map(entries))
    }
}

impl TryFrom<CborValue> for Payload {
    type Error = ProtocolError;

    fn try_from(value: CborValue) -> Result<Self, Self::Error> {
        match value {
            CborValue::Map(entries) => Self::try_from_cbor_entries(entries),
            CborValue::Null => Ok(Self::new()),
            _ => Err(ProtocolError::UnsupportedValue("payload must be a map")),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self { fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect() }
    }
}

impl<'a> IntoIterator for &'a Payload {
    type IntoIter = btree_map::Iter<'a, String, Value>;
    type Item = (&'a String, &'a Value);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn to_u64(field: &'static str, value: &Value) -> Result<u64, PayloadError> {
    match value {
        Value::Int(i) => u64::try_from(*i).map_err(|_| PayloadError::OutOfRange { field, value: *i }),
        _ => Err(PayloadError::WrongType { field, expected: "non-negative int" }),
    }
}

fn narrow_u32(field: &'static str, value: u64) -> Result<u32, PayloadError> {
    u32::try_from(value)
        .map_err(|_| PayloadError::OutOfRange { field, value: i128::from(value) })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_counts_as_absent() {
        let payload = Payload::new().with("name", Value::Null);
        assert_eq!(payload.str("name"), Err(PayloadError::MissingField { field: "name" }));
        assert_eq!(payload.opt_str("name"), Ok(None));
    }

    #[test]
    fn wrong_type_is_reported_for_optional_fields() {
        let payload = Payload::new().with("max_players", "eight");
        assert_eq!(
            payload.opt_u32("max_players"),
            Err(PayloadError::WrongType { field: "max_players", expected: "non-negative int" })
        );
    }

    #[test]
    fn negative_ids_are_out_of_range() {
        let payload = Payload::new().with("id", -1i64);
        assert_eq!(payload.u64("id"), Err(PayloadError::OutOfRange { field: "id", value: -1 }));
    }

    #[test]
    fn u64_ids_survive_unchanged() {
        let payload = Payload::new().with("id", u64::MAX);
        assert_eq!(payload.u64("id"), Ok(u64::MAX));
    }

    #[test]
    fn u32_rejects_overflow() {
        let payload = Payload::new().with("max_players", u64::from(u32::MAX) + 1);
        assert!(matches!(payload.u32("max_players"), Err(PayloadError::OutOfRange { .. })));
    }

    #[test]
    fn float_accessor_accepts_ints() {
        let payload = Payload::new().with("percentage", 50u32);
        assert_eq!(payload.opt_f64("percentage"), Ok(Some(50.0)));
    }

    #[test]
    fn maps_reports_the_bad_index() {
        let payload = Payload::new().with(
            "lobbies",
            Value::List(vec![Value::Map(Payload::new().with("id", 1u64)), Value::from("oops")]),
        );
        let err = payload.maps("lobbies").unwrap_err();
        assert!(matches!(err, PayloadError::InItem { field: "lobbies", index: 1, .. }));
    }

    #[test]
    fn cbor_conversion_rejects_byte_strings() {
        let cbor = CborValue::Map(vec![(
            CborValue::Text("blob".into()),
            CborValue::Bytes(vec![1, 2, 3]),
        )]);
        assert!(matches!(
            Payload::try_from(cbor),
            Err(ProtocolError::UnsupportedValue("byte string"))
        ));
    }

    #[test]
    fn cbor_conversion_rejects_integer_keys() {
        let cbor = CborValue::Map(vec![(CborValue::Integer(7.into()), CborValue::Bool(true))]);
        assert_eq!(Payload::try_from(cbor), Err(ProtocolError::NonTextKey));
    }
}

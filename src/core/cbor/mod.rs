//! core/cbor — canonical CBOR value model used across the TO0 engine.
//!
//! This module is *infrastructure*, not domain-specific:
//! - [`Value`] is the closed set of field kinds a protocol message may carry.
//! - [`Composite`] is the ordered, positional container (CBOR array model)
//!   every protocol message and sub-structure is built from.
//! - `Composite::to_bytes` serializes using **ciborium** (deterministic by
//!   default); `Composite::from_bytes` is always strict (no trailing bytes)
//!   and rejects non-canonical encodings.
//!
//! 🔎 Notes:
//! - Fields are read *positionally by index*, never by name. Every accessor is
//!   fallible; callers must validate shape before trusting decoded values.
//! - Signatures and hashes are computed over `to_bytes` output, so the
//!   round-trip law `from_bytes(b).to_bytes() == b` is load-bearing, not a
//!   nicety. `from_bytes` enforces it by deterministic re-encode comparison.

use std::io::Cursor;

use ciborium::value::Value as CborValue;

/// Errors produced by the value model and codec.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Error produced during serialization.
    #[error("CBOR serialize error: {0}")]
    Ser(#[from] ciborium::ser::Error<std::io::Error>),

    /// Error produced during deserialization.
    #[error("CBOR deserialize error: {0}")]
    De(#[from] ciborium::de::Error<std::io::Error>),

    /// The input bytes were well-formed CBOR but not in deterministic form.
    #[error("CBOR input is not in canonical/deterministic form")]
    NonCanonical,

    /// A positional read addressed a field the container does not have.
    #[error("field {index} absent (container has {len} fields)")]
    Absent { index: usize, len: usize },

    /// A positional read found a field of the wrong kind.
    #[error("field {index}: expected {expected}, found {found}")]
    Kind {
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// The container holds more fields than the message shape allows.
    #[error("container allows at most {max} field(s), found {len}")]
    ExtraFields { max: usize, len: usize },

    /// Parsed CBOR contained an item kind the protocol never uses
    /// (maps, floats, tags, integers outside the i64 range, ...).
    #[error("unsupported CBOR item in protocol value")]
    UnsupportedItem,
}

/// One field of a protocol message.
///
/// The protocol's wire format only ever carries these four kinds; anything
/// else encountered while parsing is rejected with
/// [`CodecError::UnsupportedItem`]. Integers are modeled as `i64` because
/// COSE algorithm identifiers are negative while every protocol counter is
/// unsigned; unsigned reads go through [`Composite::get_uint`], which rejects
/// negative values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Integer field (protocol counters, tags, algorithm identifiers).
    Int(i64),
    /// Opaque byte-string field (nonces, hashes, signatures, key bodies).
    Bytes(Vec<u8>),
    /// Text field (rendezvous DNS names and similar).
    Text(String),
    /// Nested positional container.
    Array(Composite),
}

impl Value {
    /// Kind name used in [`CodecError::Kind`] messages.
    fn kind(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
        }
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Composite> for Value {
    fn from(v: Composite) -> Self {
        Value::Array(v)
    }
}

/// Ordered, heterogeneous protocol container (CBOR array model).
///
/// Field order is significant and fixed per message type; decoders read
/// fields positionally by index. Constructed fresh per message and treated as
/// immutable once serialized for hashing or signing.
///
/// # Examples
/// ```
/// use fdo_to0::core::cbor::Composite;
///
/// let c = Composite::new_array()
///     .set(0, 101u32)
///     .set(1, &b"guid"[..]);
/// assert_eq!(c.get_uint(0).unwrap(), 101);
/// assert_eq!(c.get_bytes(1).unwrap(), b"guid");
/// assert!(c.get_uint(2).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Composite {
    items: Vec<Value>,
}

impl Composite {
    /// Construct an empty array value.
    #[must_use]
    pub fn new_array() -> Self {
        Composite { items: Vec::new() }
    }

    /// Number of fields currently present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the container holds no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Remove all fields.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Set the field at `index`, returning `self` for builder chaining.
    ///
    /// `index < len` replaces; `index >= len` appends in call order. Sparse
    /// containers are not representable in the array model, so messages are
    /// built by setting fields in positional order.
    #[must_use]
    pub fn set(mut self, index: usize, value: impl Into<Value>) -> Self {
        let value = value.into();
        if index < self.items.len() {
            self.items[index] = value;
        } else {
            self.items.push(value);
        }
        self
    }

    /// Fail unless every present field index is `<= max`.
    ///
    /// Shape check performed *before* reading untrusted bodies whose message
    /// type fixes an upper bound on field count (ACCEPT_OWNER).
    pub fn verify_max_index(&self, max: usize) -> Result<(), CodecError> {
        if self.items.len() > max + 1 {
            return Err(CodecError::ExtraFields {
                max: max + 1,
                len: self.items.len(),
            });
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Result<&Value, CodecError> {
        self.items.get(index).ok_or(CodecError::Absent {
            index,
            len: self.items.len(),
        })
    }

    /// Read the field at `index` as a signed integer.
    pub fn get_int(&self, index: usize) -> Result<i64, CodecError> {
        match self.get(index)? {
            Value::Int(v) => Ok(*v),
            other => Err(CodecError::Kind {
                index,
                expected: "int",
                found: other.kind(),
            }),
        }
    }

    /// Read the field at `index` as an unsigned integer, rejecting negatives.
    pub fn get_uint(&self, index: usize) -> Result<u64, CodecError> {
        match self.get(index)? {
            Value::Int(v) if *v >= 0 => Ok(*v as u64),
            Value::Int(_) => Err(CodecError::Kind {
                index,
                expected: "uint",
                found: "negative int",
            }),
            other => Err(CodecError::Kind {
                index,
                expected: "uint",
                found: other.kind(),
            }),
        }
    }

    /// Read the field at `index` as a byte string.
    pub fn get_bytes(&self, index: usize) -> Result<&[u8], CodecError> {
        match self.get(index)? {
            Value::Bytes(v) => Ok(v),
            other => Err(CodecError::Kind {
                index,
                expected: "bytes",
                found: other.kind(),
            }),
        }
    }

    /// Read the field at `index` as text.
    pub fn get_text(&self, index: usize) -> Result<&str, CodecError> {
        match self.get(index)? {
            Value::Text(v) => Ok(v),
            other => Err(CodecError::Kind {
                index,
                expected: "text",
                found: other.kind(),
            }),
        }
    }

    /// Read the field at `index` as a nested container.
    pub fn get_composite(&self, index: usize) -> Result<&Composite, CodecError> {
        match self.get(index)? {
            Value::Array(v) => Ok(v),
            other => Err(CodecError::Kind {
                index,
                expected: "array",
                found: other.kind(),
            }),
        }
    }

    /// Serialize to canonical bytes (deterministic under ciborium).
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Ser`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::with_capacity(256);
        ciborium::ser::into_writer(&self.to_cbor(), &mut buf)?;
        Ok(buf)
    }

    /// Parse canonical bytes back into a value tree.
    ///
    /// Always strict:
    /// * Rejects trailing garbage after a valid item.
    /// * Rejects item kinds outside the protocol's value set.
    /// * Rejects non-canonical encodings by re-encoding deterministically and
    ///   requiring an exact byte-for-byte match to the input.
    ///
    /// # Errors
    ///
    /// * [`CodecError::De`] if deserialization fails or there are trailing bytes.
    /// * [`CodecError::UnsupportedItem`] on items outside the protocol value set.
    /// * [`CodecError::NonCanonical`] if the input is well-formed but not canonical.
    pub fn from_bytes(b: &[u8]) -> Result<Self, CodecError> {
        let mut cur = Cursor::new(b);
        let raw: CborValue = ciborium::de::from_reader(&mut cur)?;
        let pos = usize::try_from(cur.position()).map_err(|_| {
            CodecError::De(ciborium::de::Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "cursor position overflow",
            )))
        })?;
        if pos != b.len() {
            return Err(CodecError::De(ciborium::de::Error::Io(
                std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "trailing bytes after CBOR value",
                ),
            )));
        }
        let value = Self::from_cbor(&raw)?;
        // Canonical enforcement: deterministic re-encode must match input
        let canon = value.to_bytes()?;
        if canon != b {
            return Err(CodecError::NonCanonical);
        }
        Ok(value)
    }

    fn to_cbor(&self) -> CborValue {
        CborValue::Array(self.items.iter().map(Value::to_cbor).collect())
    }

    fn from_cbor(raw: &CborValue) -> Result<Self, CodecError> {
        match raw {
            CborValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(Value::from_cbor(item)?);
                }
                Ok(Composite { items: out })
            }
            _ => Err(CodecError::UnsupportedItem),
        }
    }
}

impl Value {
    fn to_cbor(&self) -> CborValue {
        match self {
            Value::Int(v) => CborValue::Integer((*v).into()),
            Value::Bytes(v) => CborValue::Bytes(v.clone()),
            Value::Text(v) => CborValue::Text(v.clone()),
            Value::Array(v) => v.to_cbor(),
        }
    }

    fn from_cbor(raw: &CborValue) -> Result<Self, CodecError> {
        match raw {
            CborValue::Integer(n) => {
                let v = i64::try_from(*n).map_err(|_| CodecError::UnsupportedItem)?;
                Ok(Value::Int(v))
            }
            CborValue::Bytes(b) => Ok(Value::Bytes(b.clone())),
            CborValue::Text(t) => Ok(Value::Text(t.clone())),
            CborValue::Array(_) => Ok(Value::Array(Composite::from_cbor(raw)?)),
            _ => Err(CodecError::UnsupportedItem),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Composite {
        Composite::new_array()
            .set(0, 20u32)
            .set(1, &[0xAA; 16][..])
            .set(2, Composite::new_array().set(0, -7i64).set(1, "rv.example"))
    }

    #[test]
    fn roundtrip_is_byte_identical() {
        let c = sample();
        let bytes = c.to_bytes().unwrap();
        let back = Composite::from_bytes(&bytes).unwrap();
        assert_eq!(back, c);
        assert_eq!(back.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn strict_rejects_trailing() {
        let mut bytes = sample().to_bytes().unwrap();
        let mut tail = Vec::new();
        ciborium::ser::into_writer(&0u8, &mut tail).unwrap();
        bytes.extend_from_slice(&tail);
        let err = Composite::from_bytes(&bytes).unwrap_err();
        assert!(format!("{err}").contains("trailing"));
    }

    #[test]
    fn rejects_non_array_top_level() {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&5u8, &mut bytes).unwrap();
        assert!(matches!(
            Composite::from_bytes(&bytes),
            Err(CodecError::UnsupportedItem)
        ));
    }

    #[test]
    fn rejects_map_items() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(1u8, 2u8);
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&vec![map], &mut bytes).unwrap();
        assert!(matches!(
            Composite::from_bytes(&bytes),
            Err(CodecError::UnsupportedItem)
        ));
    }

    #[test]
    fn accessors_enforce_kind_and_presence() {
        let c = sample();
        assert!(matches!(c.get_uint(1), Err(CodecError::Kind { index: 1, .. })));
        assert!(matches!(c.get_bytes(9), Err(CodecError::Absent { index: 9, len: 3 })));
        assert_eq!(c.get_composite(2).unwrap().get_int(0).unwrap(), -7);
        assert_eq!(c.get_composite(2).unwrap().get_text(1).unwrap(), "rv.example");
    }

    #[test]
    fn get_uint_rejects_negative() {
        let c = Composite::new_array().set(0, -1i64);
        assert!(matches!(c.get_uint(0), Err(CodecError::Kind { .. })));
    }

    #[test]
    fn verify_max_index_bounds_shape() {
        let one = Composite::new_array().set(0, 1u32);
        assert!(one.verify_max_index(0).is_ok());
        let two = Composite::new_array().set(0, 1u32).set(1, 2u32);
        assert!(matches!(
            two.verify_max_index(0),
            Err(CodecError::ExtraFields { max: 1, len: 2 })
        ));
    }

    #[test]
    fn set_replaces_in_range_and_appends_beyond() {
        let c = Composite::new_array().set(0, 1u32).set(0, 2u32).set(7, 3u32);
        assert_eq!(c.len(), 2);
        assert_eq!(c.get_uint(0).unwrap(), 2);
        assert_eq!(c.get_uint(1).unwrap(), 3);
    }

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Value::Int),
            prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Bytes),
            "[a-z0-9.]{0,16}".prop_map(Value::Text),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop::collection::vec(inner, 0..4)
                .prop_map(|items| Value::Array(items.into_iter().enumerate().fold(
                    Composite::new_array(),
                    |c, (i, v)| c.set(i, v),
                )))
        })
    }

    proptest! {
        #[test]
        fn prop_roundtrip_law(values in prop::collection::vec(value_strategy(), 0..6)) {
            let c = values
                .into_iter()
                .enumerate()
                .fold(Composite::new_array(), |c, (i, v)| c.set(i, v));
            let bytes = c.to_bytes().unwrap();
            let back = Composite::from_bytes(&bytes).unwrap();
            prop_assert_eq!(&back, &c);
            prop_assert_eq!(back.to_bytes().unwrap(), bytes);
        }
    }
}

//! The CBOR item tree: a tagged union mirroring RFC 8949's major/minor structure,
//! with structural equality and projection to [`HostValue`].

use chrono::{DateTime, TimeZone, Utc};
use url::Url;
use uuid::Uuid;

use crate::bits::{Major, INDEFINITE};
use crate::error::{CborError, ErrorCode};
use crate::host::{BigInt, HostValue};

/// One of the three widths a CBOR float head byte can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth {
    /// `0xF9`, two payload bytes.
    Half,
    /// `0xFA`, four payload bytes.
    Single,
    /// `0xFB`, eight payload bytes.
    Double,
}

/// A byte string's payload: either a single run, or a sequence of definite chunks
/// awaiting a `Break` (the indefinite form).
#[derive(Debug, Clone)]
pub enum BytesPayload {
    /// A definite-length byte string.
    Definite(Vec<u8>),
    /// An indefinite-length byte string, as the ordered chunks that compose it.
    Indefinite(Vec<Vec<u8>>),
}

/// A text string's payload; see [`BytesPayload`].
#[derive(Debug, Clone)]
pub enum TextPayload {
    /// A definite-length text string.
    Definite(String),
    /// An indefinite-length text string, as the ordered chunks that compose it.
    Indefinite(Vec<String>),
}

/// An array's children, definite or indefinite.
#[derive(Debug, Clone)]
pub enum ArrayPayload {
    /// A definite-length array.
    Definite(Vec<CborItem>),
    /// An indefinite-length array.
    Indefinite(Vec<CborItem>),
}

/// A map's key/value pairs, in insertion order, definite or indefinite.
#[derive(Debug, Clone)]
pub enum MapPayload {
    /// A definite-length map.
    Definite(Vec<(CborItem, CborItem)>),
    /// An indefinite-length map.
    Indefinite(Vec<(CborItem, CborItem)>),
}

/// A CBOR item: the wire model's tagged-union tree (RFC 8949 §3).
///
/// `major()`/`minor()` reconstruct the two-component header described in the data
/// model from whichever variant is in play; the variants themselves exist so each
/// payload shape is statically distinct rather than carried as an untyped blob.
///
/// `PartialEq` is hand-written, not derived: two maps compare equal when their
/// pairs are equal as a multiset (order-insensitive), while every other container
/// compares order-sensitively — see the `Map` arm of the `impl` below.
#[derive(Debug, Clone)]
pub enum CborItem {
    /// Major 0. The wire value `v`; the logical value is `v`.
    Unsigned(u64),
    /// Major 1. The wire value `n`; the logical value is `-1 - n`.
    Negative(u64),
    /// Major 2.
    Bytes(BytesPayload),
    /// Major 3.
    Text(TextPayload),
    /// Major 4.
    Array(ArrayPayload),
    /// Major 5.
    Map(MapPayload),
    /// Major 6: a tag number wrapping exactly one child item.
    Tag(u64, Box<CborItem>),
    /// Major 7, simple value 20/21.
    Bool(bool),
    /// Major 7, simple value 22.
    Null,
    /// Major 7, simple value 23.
    Undefined,
    /// Major 7, any other simple value (`0..=19 ∪ 32..=255`).
    Simple(u8),
    /// Major 7, a float of the given width.
    Float(FloatWidth, f64),
    /// The `0xFF` sentinel. Never stored inside a finished tree; only returned
    /// transiently by the decoder's indefinite-length loops.
    Break,
}

impl CborItem {
    /// The major type this item occupies on the wire.
    #[must_use]
    pub fn major(&self) -> Major {
        match self {
            Self::Unsigned(_) => Major::Unsigned,
            Self::Negative(_) => Major::Negative,
            Self::Bytes(_) => Major::Bytes,
            Self::Text(_) => Major::Text,
            Self::Array(_) => Major::Array,
            Self::Map(_) => Major::Map,
            Self::Tag(..) => Major::Tag,
            Self::Bool(_)
            | Self::Null
            | Self::Undefined
            | Self::Simple(_)
            | Self::Float(..)
            | Self::Break => Major::Primitive,
        }
    }

    /// The minor component: magnitude, declared length (or [`INDEFINITE`]), tag
    /// number, or simple-value/float discriminant, per variant.
    #[must_use]
    pub fn minor(&self) -> u64 {
        match self {
            Self::Unsigned(v) | Self::Negative(v) => *v,
            Self::Bytes(BytesPayload::Definite(b)) => b.len() as u64,
            Self::Bytes(BytesPayload::Indefinite(_)) => INDEFINITE,
            Self::Text(TextPayload::Definite(s)) => s.len() as u64,
            Self::Text(TextPayload::Indefinite(_)) => INDEFINITE,
            Self::Array(ArrayPayload::Definite(items)) => items.len() as u64,
            Self::Array(ArrayPayload::Indefinite(_)) => INDEFINITE,
            Self::Map(MapPayload::Definite(pairs)) => pairs.len() as u64,
            Self::Map(MapPayload::Indefinite(_)) => INDEFINITE,
            Self::Tag(tag, _) => *tag,
            Self::Bool(false) => 20,
            Self::Bool(true) => 21,
            Self::Null => 22,
            Self::Undefined => 23,
            Self::Simple(v) => u64::from(*v),
            Self::Float(FloatWidth::Half, _) => 25,
            Self::Float(FloatWidth::Single, _) => 26,
            Self::Float(FloatWidth::Double, _) => 27,
            Self::Break => 31,
        }
    }

    /// A definite-length unsigned-integer item.
    #[must_use]
    pub const fn unsigned(magnitude: u64) -> Self {
        Self::Unsigned(magnitude)
    }

    /// A definite-length negative-integer item; `wire` is the on-wire magnitude
    /// (logical value `-1 - wire`).
    #[must_use]
    pub const fn negative(wire: u64) -> Self {
        Self::Negative(wire)
    }

    /// A float item of the given width.
    #[must_use]
    pub const fn float(width: FloatWidth, value: f64) -> Self {
        Self::Float(width, value)
    }

    /// A definite-length byte string.
    #[must_use]
    pub fn bytes(payload: Vec<u8>) -> Self {
        Self::Bytes(BytesPayload::Definite(payload))
    }

    /// An indefinite-length byte string, empty until [`CborItem::append_child`] is
    /// called.
    #[must_use]
    pub fn bytes_indefinite() -> Self {
        Self::Bytes(BytesPayload::Indefinite(Vec::new()))
    }

    /// A definite-length text string.
    #[must_use]
    pub fn text(payload: impl Into<String>) -> Self {
        Self::Text(TextPayload::Definite(payload.into()))
    }

    /// An indefinite-length text string, empty until [`CborItem::append_child`] is
    /// called.
    #[must_use]
    pub fn text_indefinite() -> Self {
        Self::Text(TextPayload::Indefinite(Vec::new()))
    }

    /// A definite-length array.
    #[must_use]
    pub fn array(items: Vec<CborItem>) -> Self {
        Self::Array(ArrayPayload::Definite(items))
    }

    /// An indefinite-length array, empty until [`CborItem::append_child`] is called.
    #[must_use]
    pub fn array_indefinite() -> Self {
        Self::Array(ArrayPayload::Indefinite(Vec::new()))
    }

    /// A definite-length map from an already-assembled pair list.
    #[must_use]
    pub fn map(pairs: Vec<(CborItem, CborItem)>) -> Self {
        Self::Map(MapPayload::Definite(pairs))
    }

    /// An indefinite-length map, empty until [`CborItem::set_pair`] is called.
    #[must_use]
    pub fn map_indefinite() -> Self {
        Self::Map(MapPayload::Indefinite(Vec::new()))
    }

    /// A tag wrapping `inner`.
    #[must_use]
    pub fn tag(tag: u64, inner: CborItem) -> Self {
        Self::Tag(tag, Box::new(inner))
    }

    /// Append a child to an array, or a chunk to an indefinite byte/text string.
    ///
    /// # Errors
    /// Returns [`ErrorCode::InvalidContainerOperation`] if `self` is not one of
    /// those container shapes, or if a chunk of the wrong item kind is appended to
    /// an indefinite byte/text string.
    pub fn append_child(&mut self, child: CborItem) -> Result<(), CborError> {
        match self {
            Self::Array(ArrayPayload::Definite(items) | ArrayPayload::Indefinite(items)) => {
                items.push(child);
                Ok(())
            }
            Self::Bytes(BytesPayload::Indefinite(chunks)) => match child {
                Self::Bytes(BytesPayload::Definite(b)) => {
                    chunks.push(b);
                    Ok(())
                }
                _ => Err(CborError::new(ErrorCode::InvalidContainerOperation, 0)),
            },
            Self::Text(TextPayload::Indefinite(chunks)) => match child {
                Self::Text(TextPayload::Definite(s)) => {
                    chunks.push(s);
                    Ok(())
                }
                _ => Err(CborError::new(ErrorCode::InvalidContainerOperation, 0)),
            },
            _ => Err(CborError::new(ErrorCode::InvalidContainerOperation, 0)),
        }
    }

    /// Insert or replace a key/value pair in a map.
    ///
    /// If `key` is already present (by item-equality), its value is replaced in
    /// place, preserving insertion order; otherwise the pair is appended.
    ///
    /// # Errors
    /// Returns [`ErrorCode::NotAMap`] if `self` is not a map.
    pub fn set_pair(&mut self, key: CborItem, value: CborItem) -> Result<(), CborError> {
        let pairs = match self {
            Self::Map(MapPayload::Definite(pairs) | MapPayload::Indefinite(pairs)) => pairs,
            _ => return Err(CborError::new(ErrorCode::NotAMap, 0)),
        };
        if let Some(existing) = pairs.iter_mut().find(|(k, _)| *k == key) {
            existing.1 = value;
        } else {
            pairs.push((key, value));
        }
        Ok(())
    }

    /// Look up a value by key (by item-equality).
    ///
    /// # Errors
    /// Returns [`ErrorCode::NotAMap`] if `self` is not a map.
    pub fn get(&self, key: &CborItem) -> Result<Option<&CborItem>, CborError> {
        let pairs = match self {
            Self::Map(MapPayload::Definite(pairs) | MapPayload::Indefinite(pairs)) => pairs,
            _ => return Err(CborError::new(ErrorCode::NotAMap, 0)),
        };
        Ok(pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v))
    }

    /// Structural equality: majors and minors match, and payloads compare equal
    /// componentwise. Map equality is multiset-over-pairs, order-insensitive.
    #[must_use]
    pub fn equals(&self, other: &CborItem) -> bool {
        self == other
    }

    /// Project this item to a [`HostValue`], applying tag projection where `self`
    /// is a `Tag`.
    ///
    /// # Errors
    /// Returns [`ErrorCode::UnsupportedTag`] if a tag's inner item has the wrong
    /// shape for that tag's projection.
    pub fn to_native(&self) -> Result<HostValue, CborError> {
        match self {
            Self::Unsigned(v) => Ok(i64::try_from(*v).map_or_else(
                |_| HostValue::BigInt(BigInt::new(false, v.to_be_bytes().to_vec())),
                HostValue::Integer,
            )),
            Self::Negative(v) => {
                // Logical value is -1 - v; represent as i64 when it fits.
                if let Ok(v_i64) = i64::try_from(*v) {
                    if let Some(logical) = (-1i64).checked_sub(v_i64) {
                        return Ok(HostValue::Integer(logical));
                    }
                }
                let magnitude = v.checked_add(1).unwrap_or(u64::MAX);
                Ok(HostValue::BigInt(BigInt::new(
                    true,
                    magnitude.to_be_bytes().to_vec(),
                )))
            }
            Self::Bytes(payload) => Ok(HostValue::Bytes(flatten_bytes(payload))),
            Self::Text(payload) => Ok(HostValue::Text(flatten_text(payload))),
            Self::Array(ArrayPayload::Definite(items) | ArrayPayload::Indefinite(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_native()?);
                }
                Ok(HostValue::Array(out))
            }
            Self::Map(MapPayload::Definite(pairs) | MapPayload::Indefinite(pairs)) => {
                let mut out = Vec::with_capacity(pairs.len());
                for (k, v) in pairs {
                    out.push((k.to_native()?, v.to_native()?));
                }
                Ok(HostValue::Map(out))
            }
            Self::Tag(tag, inner) => project_tag(*tag, inner),
            Self::Bool(b) => Ok(HostValue::Bool(*b)),
            Self::Null => Ok(HostValue::Null),
            Self::Undefined => Ok(HostValue::Undefined),
            Self::Simple(v) => Ok(HostValue::Simple(*v)),
            Self::Float(_, v) => Ok(HostValue::Float(*v)),
            Self::Break => Err(CborError::new(ErrorCode::Unreachable, 0)),
        }
    }
}

impl PartialEq for CborItem {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Unsigned(a), Self::Unsigned(b)) | (Self::Negative(a), Self::Negative(b)) => {
                a == b
            }
            (Self::Bytes(BytesPayload::Definite(a)), Self::Bytes(BytesPayload::Definite(b))) => {
                a == b
            }
            (
                Self::Bytes(BytesPayload::Indefinite(_)),
                Self::Bytes(BytesPayload::Indefinite(_)),
            ) => flatten_bytes(self_bytes(self)) == flatten_bytes(self_bytes(other)),
            (Self::Text(TextPayload::Definite(a)), Self::Text(TextPayload::Definite(b))) => {
                a == b
            }
            (Self::Text(TextPayload::Indefinite(_)), Self::Text(TextPayload::Indefinite(_))) => {
                flatten_text(self_text(self)) == flatten_text(self_text(other))
            }
            (
                Self::Array(ArrayPayload::Definite(a)),
                Self::Array(ArrayPayload::Definite(b)),
            )
            | (
                Self::Array(ArrayPayload::Indefinite(a)),
                Self::Array(ArrayPayload::Indefinite(b)),
            ) => a == b,
            (Self::Map(MapPayload::Definite(a)), Self::Map(MapPayload::Definite(b)))
            | (Self::Map(MapPayload::Indefinite(a)), Self::Map(MapPayload::Indefinite(b))) => {
                pairs_equal_as_multiset(a, b)
            }
            (Self::Tag(t1, i1), Self::Tag(t2, i2)) => t1 == t2 && i1 == i2,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Null, Self::Null) | (Self::Undefined, Self::Undefined) | (Self::Break, Self::Break) => {
                true
            }
            (Self::Simple(a), Self::Simple(b)) => a == b,
            (Self::Float(w1, v1), Self::Float(w2, v2)) => w1 == w2 && v1 == v2,
            _ => false,
        }
    }
}

fn self_bytes(item: &CborItem) -> &BytesPayload {
    match item {
        CborItem::Bytes(p) => p,
        _ => unreachable!("caller matched on Bytes"),
    }
}

fn self_text(item: &CborItem) -> &TextPayload {
    match item {
        CborItem::Text(p) => p,
        _ => unreachable!("caller matched on Text"),
    }
}

fn pairs_equal_as_multiset(a: &[(CborItem, CborItem)], b: &[(CborItem, CborItem)]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    'outer: for (ak, av) in a {
        for (i, (bk, bv)) in b.iter().enumerate() {
            if !used[i] && ak == bk && av == bv {
                used[i] = true;
                continue 'outer;
            }
        }
        return false;
    }
    true
}

fn flatten_bytes(payload: &BytesPayload) -> Vec<u8> {
    match payload {
        BytesPayload::Definite(b) => b.clone(),
        BytesPayload::Indefinite(chunks) => chunks.iter().flat_map(|c| c.iter().copied()).collect(),
    }
}

fn flatten_text(payload: &TextPayload) -> String {
    match payload {
        TextPayload::Definite(s) => s.clone(),
        TextPayload::Indefinite(chunks) => chunks.concat(),
    }
}

/// Projects a tagged item to its native value. Tag 55799 (self-describe) strips
/// itself and re-dispatches on the inner item.
fn project_tag(tag: u64, inner: &CborItem) -> Result<HostValue, CborError> {
    match tag {
        0 => {
            let text = match inner.to_native()? {
                HostValue::Text(s) => s,
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            match DateTime::parse_from_str(&text, "%Y-%m-%dT%H:%M:%S%#z")
                .or_else(|_| DateTime::parse_from_rfc3339(&text))
            {
                Ok(dt) => Ok(HostValue::Date(dt.with_timezone(&Utc))),
                Err(_) => Ok(HostValue::Text(text)),
            }
        }
        1 => match inner.to_native()? {
            HostValue::Integer(secs) => Utc
                .timestamp_opt(secs, 0)
                .single()
                .map(HostValue::Date)
                .ok_or_else(|| CborError::new(ErrorCode::UnsupportedTag, 0)),
            HostValue::Float(secs) => {
                let nanos = (secs.fract() * 1e9).round() as u32;
                Utc.timestamp_opt(secs.trunc() as i64, nanos)
                    .single()
                    .map(HostValue::Date)
                    .ok_or_else(|| CborError::new(ErrorCode::UnsupportedTag, 0))
            }
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        2 | 3 => {
            let bytes = match inner {
                CborItem::Bytes(payload) => flatten_bytes(payload),
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            Ok(HostValue::BigInt(if tag == 3 {
                BigInt::from_negative_wire_bytes(&bytes)
            } else {
                BigInt::new(false, bytes)
            }))
        }
        4 | 5 => {
            let pair = match inner {
                CborItem::Array(ArrayPayload::Definite(items) | ArrayPayload::Indefinite(items))
                    if items.len() == 2 =>
                {
                    items
                }
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            let exponent = match pair[0].to_native()? {
                HostValue::Integer(e) => e,
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            let mantissa = pair[1].to_native()?;
            let mantissa = match mantissa {
                HostValue::Integer(_) | HostValue::BigInt(_) => mantissa,
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            Ok(HostValue::Decimal {
                base: if tag == 4 { 10 } else { 2 },
                exponent,
                mantissa: Box::new(mantissa),
            })
        }
        21 | 22 | 23 | 24 => {
            let bytes = match inner.to_native()? {
                HostValue::Bytes(b) => b,
                HostValue::Text(s) => s.into_bytes(),
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            Ok(HostValue::ExpectedConversion { tag, bytes })
        }
        32 => match inner.to_native()? {
            HostValue::Text(s) => Url::parse(&s)
                .map(HostValue::Uri)
                .map_err(|_| CborError::new(ErrorCode::UnsupportedTag, 0)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        33 => match inner.to_native()? {
            HostValue::Text(s) => Ok(HostValue::Base64Url(s)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        34 => match inner.to_native()? {
            HostValue::Text(s) => Ok(HostValue::Base64(s)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        35 => match inner.to_native()? {
            HostValue::Text(s) => Ok(HostValue::Regex(s)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        36 => match inner.to_native()? {
            HostValue::Text(s) => Ok(HostValue::Mime(s)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        37 => {
            let bytes = match inner {
                CborItem::Bytes(payload) => flatten_bytes(payload),
                _ => return Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
            };
            let arr: [u8; 16] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| CborError::new(ErrorCode::UnsupportedTag, 0))?;
            Ok(HostValue::Uuid(Uuid::from_bytes(arr)))
        }
        100 => match inner.to_native()? {
            HostValue::Integer(days) => Utc
                .timestamp_opt(days * 86_400, 0)
                .single()
                .map(HostValue::Date)
                .ok_or_else(|| CborError::new(ErrorCode::UnsupportedTag, 0)),
            _ => Err(CborError::new(ErrorCode::UnsupportedTag, 0)),
        },
        55799 => inner.to_native(),
        other => Ok(HostValue::Tagged {
            tag: other,
            inner: Box::new(inner.to_native()?),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equals_is_order_insensitive_for_maps() {
        let a = CborItem::map(vec![
            (CborItem::unsigned(1), CborItem::unsigned(2)),
            (CborItem::unsigned(3), CborItem::unsigned(4)),
        ]);
        let b = CborItem::map(vec![
            (CborItem::unsigned(3), CborItem::unsigned(4)),
            (CborItem::unsigned(1), CborItem::unsigned(2)),
        ]);
        assert!(a.equals(&b));
    }

    #[test]
    fn set_pair_replaces_in_place() {
        let mut m = CborItem::map(vec![(CborItem::unsigned(1), CborItem::unsigned(2))]);
        m.set_pair(CborItem::unsigned(1), CborItem::unsigned(99)).unwrap();
        assert_eq!(
            m.get(&CborItem::unsigned(1)).unwrap(),
            Some(&CborItem::unsigned(99))
        );
        if let CborItem::Map(MapPayload::Definite(pairs)) = &m {
            assert_eq!(pairs.len(), 1);
        } else {
            panic!("expected definite map");
        }
    }

    #[test]
    fn append_child_rejects_wrong_chunk_kind() {
        let mut b = CborItem::bytes_indefinite();
        let err = b.append_child(CborItem::text("oops")).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidContainerOperation);
    }

    #[test]
    fn negative_projects_to_logical_value() {
        let item = CborItem::negative(23);
        assert_eq!(item.to_native().unwrap(), HostValue::Integer(-24));
    }

    #[test]
    fn self_describe_tag_strips_and_recurses() {
        let item = CborItem::tag(55799, CborItem::unsigned(1));
        assert_eq!(item.to_native().unwrap(), HostValue::Integer(1));
    }
}

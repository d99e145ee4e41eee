//! The encoder: lifting a [`HostValue`] to a [`CborItem`], then serializing that
//! item to a minimal-encoding CBOR byte sequence.

use crate::bits::{self, Major};
use crate::error::{CborError, ErrorCode};
use crate::float16;
use crate::host::HostValue;
use crate::item::{ArrayPayload, BytesPayload, CborItem, FloatWidth, MapPayload, TextPayload};

/// Caller-supplied hints steering the lifting step.
///
/// `major` and `minor` mirror the wire's own major-type and additional-info number
/// spaces: `minor` is a tag number when `major` is `Tag`, a width-class number
/// (25/26/27) when lifting a float, or `Negative`'s wire-magnitude escape hatch when
/// `major` is `Negative`. `width` is a separate override: it forces the outermost
/// head's additional-info class to at least the given width (24/25/26/27) via
/// [`serialize_root`], regardless of how `major`/`minor` shape the lifted item.
#[derive(Debug, Clone, Copy, Default)]
pub struct EncodeHint {
    /// A major-type hint.
    pub major: Option<Major>,
    /// A minor-value hint (tag number, float width class, or similar).
    pub minor: Option<u64>,
    /// Forces the outermost head to at least this additional-info width class
    /// (one of [`bits::AI_1BYTE`], [`bits::AI_2BYTE`], [`bits::AI_4BYTE`],
    /// [`bits::AI_8BYTE`]), overriding minimal encoding for that one head.
    pub width: Option<u8>,
}

impl EncodeHint {
    /// No hint: the encoder picks the default, shortest representation.
    #[must_use]
    pub const fn none() -> Self {
        Self { major: None, minor: None, width: None }
    }

    /// Wrap the lifted value in `Tag(tag, ...)`.
    #[must_use]
    pub const fn tag(tag: u64) -> Self {
        Self { major: Some(Major::Tag), minor: Some(tag), width: None }
    }

    /// Force a specific float width (`Half`/`Single`/`Double`).
    #[must_use]
    pub const fn float_width(width: FloatWidth) -> Self {
        let minor = match width {
            FloatWidth::Half => 25,
            FloatWidth::Single => 26,
            FloatWidth::Double => 27,
        };
        Self { major: None, minor: Some(minor), width: None }
    }

    /// Force the outermost head's additional-info class to at least `class`
    /// (one of [`bits::AI_1BYTE`], [`bits::AI_2BYTE`], [`bits::AI_4BYTE`],
    /// [`bits::AI_8BYTE`]), via [`serialize_root`].
    #[must_use]
    pub const fn width_override(class: u8) -> Self {
        Self { major: None, minor: None, width: Some(class) }
    }
}

/// Lift a host value into an item tree, honoring `hint`.
///
/// # Errors
/// Returns [`ErrorCode::Unencodable`] if `value` has no CBOR lifting, or
/// [`ErrorCode::ValueOutOfRange`] if a half-float hint is given for a value outside
/// `±65504` (or otherwise not representable at the forced width).
pub fn lift(value: &HostValue, hint: EncodeHint) -> Result<CborItem, CborError> {
    match value {
        HostValue::Date(dt) => lift_date(*dt, hint.minor),
        HostValue::Uri(uri) => Ok(CborItem::tag(32, CborItem::text(uri.as_str()))),
        HostValue::Uuid(uuid) => Ok(CborItem::tag(37, CborItem::bytes(uuid.as_bytes().to_vec()))),
        _ => {
            let base = lift_base(value, hint.minor)?;
            Ok(match (hint.major, hint.minor) {
                (Some(Major::Tag), Some(tag)) => CborItem::tag(tag, base),
                _ => base,
            })
        }
    }
}

fn lift_base(value: &HostValue, minor_hint: Option<u64>) -> Result<CborItem, CborError> {
    match value {
        HostValue::Bool(b) => Ok(CborItem::Bool(*b)),
        HostValue::Null => Ok(CborItem::Null),
        HostValue::Undefined => Ok(CborItem::Undefined),
        HostValue::Integer(v) => Ok(lift_integer(*v)),
        HostValue::BigInt(big) => Ok(lift_bigint(big)),
        HostValue::Float(v) => lift_float(*v, minor_hint),
        HostValue::Bytes(b) => Ok(CborItem::bytes(b.clone())),
        HostValue::Text(s) => Ok(CborItem::text(s.clone())),
        HostValue::Array(items) => {
            let mut lifted = Vec::with_capacity(items.len());
            for item in items {
                lifted.push(lift(item, EncodeHint::none())?);
            }
            Ok(CborItem::array(lifted))
        }
        HostValue::Map(pairs) => {
            let mut lifted = Vec::with_capacity(pairs.len());
            for (k, v) in pairs {
                lifted.push((lift(k, EncodeHint::none())?, lift(v, EncodeHint::none())?));
            }
            Ok(CborItem::map(lifted))
        }
        HostValue::Simple(v) => Ok(CborItem::Simple(*v)),
        HostValue::Base64Url(s) => Ok(CborItem::tag(33, CborItem::text(s.clone()))),
        HostValue::Base64(s) => Ok(CborItem::tag(34, CborItem::text(s.clone()))),
        HostValue::Regex(s) => Ok(CborItem::tag(35, CborItem::text(s.clone()))),
        HostValue::Mime(s) => Ok(CborItem::tag(36, CborItem::text(s.clone()))),
        HostValue::ExpectedConversion { tag, bytes } => {
            Ok(CborItem::tag(*tag, CborItem::bytes(bytes.clone())))
        }
        HostValue::Decimal { base, exponent, mantissa } => {
            let tag = if *base == 10 { 4 } else { 5 };
            let e = lift_integer(*exponent);
            let m = lift_base(mantissa, None)?;
            Ok(CborItem::tag(tag, CborItem::array(vec![e, m])))
        }
        HostValue::Tagged { tag, inner } => {
            Ok(CborItem::tag(*tag, lift_base(inner, None)?))
        }
        HostValue::Date(_) | HostValue::Uri(_) | HostValue::Uuid(_) => {
            unreachable!("handled by lift() before reaching lift_base")
        }
    }
}

fn lift_integer(v: i64) -> CborItem {
    if v >= 0 {
        CborItem::Unsigned(v as u64)
    } else {
        // Logical value is -1 - wire; solve for wire without overflow at i64::MIN.
        let wire = (-1i128 - i128::from(v)) as u64;
        CborItem::Negative(wire)
    }
}

fn lift_bigint(big: &crate::host::BigInt) -> CborItem {
    if big.negative {
        if let Some(wire) = big.as_u64().and_then(|m| m.checked_sub(1)) {
            CborItem::Negative(wire)
        } else {
            CborItem::tag(3, CborItem::bytes(big.negative_wire_bytes()))
        }
    } else if let Some(v) = big.as_u64() {
        CborItem::Unsigned(v)
    } else {
        CborItem::tag(2, CborItem::bytes(big.magnitude.clone()))
    }
}

fn lift_date(dt: chrono::DateTime<chrono::Utc>, minor_hint: Option<u64>) -> Result<CborItem, CborError> {
    use chrono::Timelike;
    match minor_hint {
        Some(1) => {
            let secs = dt.timestamp();
            Ok(CborItem::tag(1, lift_integer(secs)))
        }
        Some(100) => {
            let days = dt.timestamp() / 86_400;
            Ok(CborItem::tag(100, lift_integer(days)))
        }
        _ => {
            let text = if dt.nanosecond() == 0 {
                dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
            } else {
                dt.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
            };
            Ok(CborItem::tag(0, CborItem::text(text)))
        }
    }
}

fn lift_float(v: f64, minor_hint: Option<u64>) -> Result<CborItem, CborError> {
    match minor_hint {
        Some(25) => {
            let narrowed = float16::f32_to_half_bits_forced(v as f32)
                .ok_or_else(|| CborError::new(ErrorCode::ValueOutOfRange, 0))?;
            Ok(CborItem::float(FloatWidth::Half, f64::from(float16::half_bits_to_f32(narrowed))))
        }
        Some(26) => Ok(CborItem::float(FloatWidth::Single, f64::from(v as f32))),
        Some(27) => Ok(CborItem::float(FloatWidth::Double, v)),
        _ => {
            if !v.is_finite() {
                // Inf and (canonical) NaN round-trip exactly at any width; prefer the narrowest.
                return Ok(CborItem::float(FloatWidth::Half, v));
            }
            if float16::f32_to_half_bits_exact(v as f32).is_some() && f64::from(v as f32) == v {
                Ok(CborItem::float(FloatWidth::Half, v))
            } else if f64::from(v as f32) == v {
                Ok(CborItem::float(FloatWidth::Single, v))
            } else {
                Ok(CborItem::float(FloatWidth::Double, v))
            }
        }
    }
}

/// Reorder a map's pairs per a "sequence override": keys named in `key_order` come
/// first, in that order; every other key trails in its original insertion order.
#[must_use]
pub fn reorder_map_pairs(
    pairs: Vec<(CborItem, CborItem)>,
    key_order: &[&str],
) -> Vec<(CborItem, CborItem)> {
    let mut remaining = pairs;
    let mut out = Vec::with_capacity(remaining.len());
    for &name in key_order {
        if let Some(pos) = remaining.iter().position(|(k, _)| matches_text_key(k, name)) {
            out.push(remaining.remove(pos));
        }
    }
    out.extend(remaining);
    out
}

fn matches_text_key(key: &CborItem, name: &str) -> bool {
    matches!(key, CborItem::Text(TextPayload::Definite(s)) if s == name)
}

/// Serialize an item tree to a minimal-encoding CBOR byte sequence.
/// Always uses minimal encoding; `encode_object_with_hint`'s
/// width-override hint is applied only to the outermost head, via
/// [`serialize_root`].
///
/// # Errors
/// Returns [`ErrorCode::Unreachable`] only on an internal invariant violation.
pub fn serialize(item: &CborItem) -> Result<Vec<u8>, CborError> {
    let mut out = Vec::new();
    serialize_item(item, &mut out)?;
    Ok(out)
}

/// Like [`serialize`], but the outermost item's head is forced to at least
/// `min_width` additional-info class (24/25/26/27) when it carries a length or
/// magnitude header. A `min_width` narrower than the item's own minimal class
/// is absorbed rather than rejected: the wider of the two always wins, so the
/// head is never truncated below what the value needs. Children are always
/// serialized minimally.
///
/// # Errors
/// Propagates errors from nested serialization.
pub fn serialize_root(item: &CborItem, min_width: Option<u8>) -> Result<Vec<u8>, CborError> {
    let Some(min_width) = min_width else {
        return serialize(item);
    };
    let mut out = Vec::new();
    let value = match item {
        CborItem::Unsigned(v) | CborItem::Negative(v) => *v,
        CborItem::Bytes(BytesPayload::Definite(b)) => b.len() as u64,
        CborItem::Text(TextPayload::Definite(s)) => s.len() as u64,
        CborItem::Array(ArrayPayload::Definite(items)) => items.len() as u64,
        CborItem::Map(MapPayload::Definite(pairs)) => pairs.len() as u64,
        CborItem::Tag(tag, _) => *tag,
        _ => return serialize(item),
    };
    let class = bits::minimal_class(value).max(min_width);
    write_head_forced(&mut out, item.major(), value, class);
    write_body_after_head(item, &mut out)?;
    Ok(out)
}

fn write_head_forced(out: &mut Vec<u8>, major: Major, value: u64, class: u8) {
    let major_bits = major.to_bits() << 5;
    match class {
        c if c <= bits::AI_INLINE_MAX => out.push(major_bits | c),
        bits::AI_1BYTE => {
            out.push(major_bits | bits::AI_1BYTE);
            out.push(value as u8);
        }
        bits::AI_2BYTE => {
            out.push(major_bits | bits::AI_2BYTE);
            out.extend_from_slice(&(value as u16).to_be_bytes());
        }
        bits::AI_4BYTE => {
            out.push(major_bits | bits::AI_4BYTE);
            out.extend_from_slice(&(value as u32).to_be_bytes());
        }
        _ => {
            out.push(major_bits | bits::AI_8BYTE);
            out.extend_from_slice(&value.to_be_bytes());
        }
    }
}

fn write_body_after_head(item: &CborItem, out: &mut Vec<u8>) -> Result<(), CborError> {
    match item {
        CborItem::Unsigned(_) | CborItem::Negative(_) => Ok(()),
        CborItem::Bytes(BytesPayload::Definite(b)) => {
            out.extend_from_slice(b);
            Ok(())
        }
        CborItem::Text(TextPayload::Definite(s)) => {
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        CborItem::Array(ArrayPayload::Definite(items)) => {
            for child in items {
                serialize_item(child, out)?;
            }
            Ok(())
        }
        CborItem::Map(MapPayload::Definite(pairs)) => {
            for (k, v) in pairs {
                serialize_item(k, out)?;
                serialize_item(v, out)?;
            }
            Ok(())
        }
        CborItem::Tag(_, inner) => serialize_item(inner, out),
        _ => Err(CborError::new(ErrorCode::Unreachable, out.len())),
    }
}

fn serialize_item(item: &CborItem, out: &mut Vec<u8>) -> Result<(), CborError> {
    match item {
        CborItem::Unsigned(v) => {
            write_head(out, Major::Unsigned, *v);
            Ok(())
        }
        CborItem::Negative(v) => {
            write_head(out, Major::Negative, *v);
            Ok(())
        }
        CborItem::Bytes(BytesPayload::Definite(b)) => {
            write_head(out, Major::Bytes, b.len() as u64);
            out.extend_from_slice(b);
            Ok(())
        }
        CborItem::Bytes(BytesPayload::Indefinite(chunks)) => {
            out.push((Major::Bytes.to_bits() << 5) | bits::AI_INDEFINITE);
            for chunk in chunks {
                write_head(out, Major::Bytes, chunk.len() as u64);
                out.extend_from_slice(chunk);
            }
            out.push(bits::BREAK);
            Ok(())
        }
        CborItem::Text(TextPayload::Definite(s)) => {
            write_head(out, Major::Text, s.len() as u64);
            out.extend_from_slice(s.as_bytes());
            Ok(())
        }
        CborItem::Text(TextPayload::Indefinite(chunks)) => {
            out.push((Major::Text.to_bits() << 5) | bits::AI_INDEFINITE);
            for chunk in chunks {
                write_head(out, Major::Text, chunk.len() as u64);
                out.extend_from_slice(chunk.as_bytes());
            }
            out.push(bits::BREAK);
            Ok(())
        }
        CborItem::Array(ArrayPayload::Definite(items)) => {
            write_head(out, Major::Array, items.len() as u64);
            for child in items {
                serialize_item(child, out)?;
            }
            Ok(())
        }
        CborItem::Array(ArrayPayload::Indefinite(items)) => {
            out.push((Major::Array.to_bits() << 5) | bits::AI_INDEFINITE);
            for child in items {
                serialize_item(child, out)?;
            }
            out.push(bits::BREAK);
            Ok(())
        }
        CborItem::Map(MapPayload::Definite(pairs)) => {
            write_head(out, Major::Map, pairs.len() as u64);
            for (k, v) in pairs {
                serialize_item(k, out)?;
                serialize_item(v, out)?;
            }
            Ok(())
        }
        CborItem::Map(MapPayload::Indefinite(pairs)) => {
            out.push((Major::Map.to_bits() << 5) | bits::AI_INDEFINITE);
            for (k, v) in pairs {
                serialize_item(k, out)?;
                serialize_item(v, out)?;
            }
            out.push(bits::BREAK);
            Ok(())
        }
        CborItem::Tag(tag, inner) => {
            write_head(out, Major::Tag, *tag);
            serialize_item(inner, out)
        }
        CborItem::Bool(false) => {
            out.push(0xE0 | bits::SIMPLE_FALSE);
            Ok(())
        }
        CborItem::Bool(true) => {
            out.push(0xE0 | bits::SIMPLE_TRUE);
            Ok(())
        }
        CborItem::Null => {
            out.push(0xE0 | bits::SIMPLE_NULL);
            Ok(())
        }
        CborItem::Undefined => {
            out.push(0xE0 | bits::SIMPLE_UNDEFINED);
            Ok(())
        }
        // 0..=19: plain inline simple value. 20..=23 are reserved for
        // false/true/null/undefined (handled by the arms above, never by a
        // standalone `Simple`) and must not be reachable here, or they'd
        // collide with those wire bytes. 24..=31 are likewise reserved (24 is
        // the one-byte-form marker itself, 28..=30 unused, 31 is `Break`).
        CborItem::Simple(v) if *v <= 19 => {
            out.push(0xE0 | v);
            Ok(())
        }
        CborItem::Simple(v) if *v >= 32 => {
            out.push(bits::SIMPLE_1BYTE | 0xE0);
            out.push(*v);
            Ok(())
        }
        CborItem::Simple(_) => Err(CborError::new(ErrorCode::Unencodable, out.len())),
        CborItem::Float(FloatWidth::Half, v) => {
            out.push(bits::HEAD_FLOAT16);
            let bits16 = float16::f32_to_half_bits_forced(*v as f32)
                .ok_or_else(|| CborError::new(ErrorCode::Unreachable, out.len()))?;
            out.extend_from_slice(&bits16.to_be_bytes());
            Ok(())
        }
        CborItem::Float(FloatWidth::Single, v) => {
            out.push(bits::HEAD_FLOAT32);
            out.extend_from_slice(&(*v as f32).to_bits().to_be_bytes());
            Ok(())
        }
        CborItem::Float(FloatWidth::Double, v) => {
            out.push(bits::HEAD_FLOAT64);
            out.extend_from_slice(&v.to_bits().to_be_bytes());
            Ok(())
        }
        CborItem::Break => {
            out.push(bits::BREAK);
            Ok(())
        }
    }
}

fn write_head(out: &mut Vec<u8>, major: Major, value: u64) {
    write_head_forced(out, major, value, bits::minimal_class(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_uint_boundaries() {
        assert_eq!(serialize(&CborItem::unsigned(0)).unwrap(), vec![0x00]);
        assert_eq!(serialize(&CborItem::unsigned(23)).unwrap(), vec![0x17]);
        assert_eq!(serialize(&CborItem::unsigned(24)).unwrap(), vec![0x18, 0x18]);
        assert_eq!(
            serialize(&CborItem::unsigned(1_000_000)).unwrap(),
            vec![0x1A, 0x00, 0x0F, 0x42, 0x40]
        );
    }

    #[test]
    fn serialize_negative_boundaries() {
        assert_eq!(serialize(&lift_integer(-1)).unwrap(), vec![0x20]);
        assert_eq!(serialize(&lift_integer(-24)).unwrap(), vec![0x37]);
        assert_eq!(serialize(&lift_integer(-25)).unwrap(), vec![0x38, 0x18]);
    }

    #[test]
    fn serialize_indefinite_text_chunks() {
        let mut item = CborItem::text_indefinite();
        item.append_child(CborItem::text("strea")).unwrap();
        item.append_child(CborItem::text("ming")).unwrap();
        let bytes = serialize(&item).unwrap();
        assert_eq!(
            bytes,
            vec![
                0x7F, 0x65, b's', b't', b'r', b'e', b'a', 0x64, b'm', b'i', b'n', b'g', 0xFF
            ]
        );
    }

    #[test]
    fn lift_bool_and_null() {
        assert_eq!(
            lift(&HostValue::Bool(false), EncodeHint::none()).unwrap(),
            CborItem::Bool(false)
        );
        assert_eq!(lift(&HostValue::Null, EncodeHint::none()).unwrap(), CborItem::Null);
    }

    #[test]
    fn half_float_boundary() {
        let item = lift(&HostValue::Float(1.5), EncodeHint::none()).unwrap();
        assert_eq!(serialize(&item).unwrap(), vec![0xF9, 0x3E, 0x00]);
        let item = lift(&HostValue::Float(65504.0), EncodeHint::none()).unwrap();
        assert_eq!(serialize(&item).unwrap(), vec![0xF9, 0x7B, 0xFF]);
    }

    #[test]
    fn simple_value_boundaries_stay_distinct_from_booleans() {
        assert_eq!(serialize(&CborItem::Simple(0)).unwrap(), vec![0xE0]);
        assert_eq!(serialize(&CborItem::Simple(19)).unwrap(), vec![0xF3]);
        assert_eq!(serialize(&CborItem::Simple(32)).unwrap(), vec![0xF8, 0x20]);
        assert_eq!(serialize(&CborItem::Simple(255)).unwrap(), vec![0xF8, 0xFF]);
    }

    #[test]
    fn simple_value_in_reserved_range_is_rejected() {
        for v in 20..=31u8 {
            let err = serialize(&CborItem::Simple(v)).unwrap_err();
            assert_eq!(err.code, ErrorCode::Unencodable);
        }
    }

    #[test]
    fn reorder_pairs_keeps_unmentioned_keys_at_tail() {
        let pairs = vec![
            (CborItem::text("a"), CborItem::unsigned(1)),
            (CborItem::text("b"), CborItem::unsigned(2)),
            (CborItem::text("c"), CborItem::unsigned(3)),
        ];
        let reordered = reorder_map_pairs(pairs, &["c"]);
        let keys: Vec<_> = reordered
            .iter()
            .map(|(k, _)| match k {
                CborItem::Text(TextPayload::Definite(s)) => s.clone(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }
}

//! Host-language values produced by [`crate::item::CborItem::to_native`] and accepted
//! by the encoder's lifting step.
//!
//! `chrono`, `url`, and `uuid` back the `Date`/`Uri`/`Uuid` variants.

use chrono::{DateTime, Utc};
use url::Url;
use uuid::Uuid;

/// An arbitrary-magnitude signed integer, used when a value's magnitude exceeds
/// `i64`'s range (tag 2/3 bignums, or a decoded `Negative` item past `i64::MIN`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigInt {
    /// `true` for a logically negative value.
    pub negative: bool,
    /// Big-endian magnitude, most significant byte first, no leading zero byte
    /// unless the value is zero.
    pub magnitude: Vec<u8>,
}

impl BigInt {
    /// Construct from a sign and big-endian magnitude.
    #[must_use]
    pub fn new(negative: bool, magnitude: Vec<u8>) -> Self {
        Self { negative, magnitude }
    }

    /// Build the negative-side `BigInt` for a tag-3 bignum whose wire bytes encode
    /// `n` (logical value `-1 - n`, so `magnitude = n + 1`).
    #[must_use]
    pub fn from_negative_wire_bytes(n: &[u8]) -> Self {
        Self::new(true, add_one_be(n))
    }

    /// The wire bytes (`n = magnitude - 1`) for re-encoding as a tag-3 bignum.
    /// Only meaningful when `self.negative` is `true`.
    #[must_use]
    pub fn negative_wire_bytes(&self) -> Vec<u8> {
        sub_one_be(&self.magnitude)
    }

    /// The magnitude as a `u64`, if it fits without truncation.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        be_bytes_to_u64(&self.magnitude)
    }
}

fn be_bytes_to_u64(bytes: &[u8]) -> Option<u64> {
    let trimmed = trim_leading_zeros(bytes);
    if trimmed.len() > 8 {
        return None;
    }
    let mut buf = [0u8; 8];
    buf[8 - trimmed.len()..].copy_from_slice(trimmed);
    Some(u64::from_be_bytes(buf))
}

fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[first_nonzero..]
}

fn add_one_be(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for byte in out.iter_mut().rev() {
        if *byte == 0xFF {
            *byte = 0;
        } else {
            *byte += 1;
            return out;
        }
    }
    out.insert(0, 1);
    out
}

fn sub_one_be(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    for byte in out.iter_mut().rev() {
        if *byte == 0 {
            *byte = 0xFF;
        } else {
            *byte -= 1;
            return trim_leading_zeros(&out).to_vec();
        }
    }
    trim_leading_zeros(&out).to_vec()
}

/// A host-language value: the encoder's input and the decoder's native output.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    /// CBOR `true`/`false`.
    Bool(bool),
    /// CBOR `null`.
    Null,
    /// CBOR `undefined`.
    Undefined,
    /// An integer within `i64` range.
    Integer(i64),
    /// An integer (or tag 2/3 bignum) outside `i64` range.
    BigInt(BigInt),
    /// A floating-point value, regardless of the wire width it was carried in.
    Float(f64),
    /// A byte string.
    Bytes(Vec<u8>),
    /// A UTF-8 text string.
    Text(String),
    /// An ordered sequence.
    Array(Vec<HostValue>),
    /// An ordered key/value sequence; insertion order preserved.
    Map(Vec<(HostValue, HostValue)>),
    /// Tag 0/1/100 projection: a UTC date-time.
    Date(DateTime<Utc>),
    /// Tag 4/5 projection: `mantissa * base^exponent`, `base` 10 for tag 4, 2 for tag 5.
    Decimal {
        /// `10` for a decimal fraction (tag 4), `2` for a bigfloat (tag 5).
        base: u8,
        /// The exponent `e` from the enclosed `[e, m]` pair.
        exponent: i64,
        /// The mantissa `m`, itself a plain integer or a bignum.
        mantissa: Box<HostValue>,
    },
    /// Tag 32 projection: a URI.
    Uri(Url),
    /// Tag 33 projection: text already Base64URL-encoded.
    Base64Url(String),
    /// Tag 34 projection: text already Base64-encoded.
    Base64(String),
    /// Tag 35 projection: a regular-expression source string.
    Regex(String),
    /// Tag 36 projection: a MIME message.
    Mime(String),
    /// Tag 37 projection: a UUID.
    Uuid(Uuid),
    /// Tag 21-24 projection: inner bytes passed through unchanged, with the tag kept
    /// as metadata for the caller's post-processing.
    ExpectedConversion {
        /// The originating tag number (21, 22, 23, or 24).
        tag: u64,
        /// The untransformed inner bytes.
        bytes: Vec<u8>,
    },
    /// A simple value in `0..=19 ∪ 32..=255` other than `false`/`true`/`null`/`undefined`.
    Simple(u8),
    /// An unrecognized tag, kept around its projected inner value.
    Tagged {
        /// The tag number.
        tag: u64,
        /// The projection of the tag's inner item.
        inner: Box<HostValue>,
    },
}

impl HostValue {
    /// Shorthand for `HostValue::Integer(v)`.
    #[must_use]
    pub const fn int(v: i64) -> Self {
        Self::Integer(v)
    }

    /// Shorthand for `HostValue::Text(v.into())`.
    pub fn text(v: impl Into<String>) -> Self {
        Self::Text(v.into())
    }
}

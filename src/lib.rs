//! # rfc8949-cbor
//!
//! A CBOR (Concise Binary Object Representation, RFC 8949) encoder/decoder core: a
//! typed item tree mirroring the wire's major/minor structure, a minimal-encoding
//! encoder, and a strict decoder.
//!
//! ## What this crate is
//!
//! Three tightly coupled pieces:
//!
//! - [`item::CborItem`] — the wire model: a tree of typed CBOR items.
//! - [`encode`] — lifts a [`host::HostValue`] to an item tree and serializes it to
//!   bytes, choosing the shortest legal representation unless a hint overrides it.
//! - [`decode`] — parses bytes into an item tree, handling definite- and
//!   indefinite-length items, nested tags, and half/single/double-precision floats.
//!
//! ## What this crate is not
//!
//! A higher-level "model mapping" façade that uses reflection to bind arbitrary
//! user types to CBOR keys is out of scope; [`Shape`] is the narrow interface such
//! a layer would implement against this crate, not an implementation of one. This
//! crate also does not enforce RFC 8949 §4.2's deterministic/canonical ordering
//! beyond ordinary preferred (minimal) serialization, does not implement CBOR
//! Sequences (RFC 8742), does no streaming I/O, and does not implement COSE.
//!
//! ## Feature flags
//!
//! - `std` *(default)*: implements `std::error::Error` for [`CborError`].
//! - `simdutf8`: enables SIMD-accelerated UTF-8 validation where supported.

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bits;
pub mod decode;
pub mod encode;
mod error;
pub mod float16;
pub mod host;
pub mod item;
pub mod limits;
pub mod stream;
pub(crate) mod utf8;

pub use bits::Major;
pub use encode::EncodeHint;
pub use error::{CborError, ErrorCode};
pub use host::{BigInt, HostValue};
pub use item::{CborItem, FloatWidth};
pub use limits::DecodeLimits;

/// The external mapping layer's request interface: a value shape that knows how
/// to rebuild itself from a decoded [`HostValue`].
///
/// This crate does not implement reflection-based binding; a derive macro, a
/// hand-written impl, or any other descriptor mechanism may provide `Shape`
/// implementations. [`decode_class`] is the one place this crate calls into it.
pub trait Shape: Sized {
    /// Rebuild `Self` from a decoded native value.
    ///
    /// # Errors
    /// Returns [`ErrorCode::Unencodable`] (reused here for "wrong shape") or any
    /// other [`CborError`] the implementation chooses to surface.
    fn from_host_value(value: HostValue) -> Result<Self, CborError>;
}

/// Encode a host value with no hint, choosing the shortest legal representation.
///
/// # Errors
/// See [`ErrorCode`].
pub fn encode_object(value: &HostValue) -> Result<Vec<u8>, CborError> {
    encode::serialize(&encode::lift(value, EncodeHint::none())?)
}

/// Encode a host value under a major-type hint.
///
/// # Errors
/// See [`ErrorCode`].
pub fn encode_object_with_major(value: &HostValue, major: Major) -> Result<Vec<u8>, CborError> {
    encode::serialize(&encode::lift(value, EncodeHint { major: Some(major), minor: None, width: None })?)
}

/// Encode a host value under a major-type and minor-value hint: the minor hint
/// selects a tag number (when `major` is [`Major::Tag`]), a float width class, or
/// the `Negative` wire-magnitude escape hatch. `hint.width`, if set, forces the
/// outermost head to that additional-info width class instead of the minimal
/// one; a narrower `hint.width` than the item's own minimal class is absorbed,
/// not rejected.
///
/// # Errors
/// See [`ErrorCode`].
pub fn encode_object_with_hint(value: &HostValue, hint: EncodeHint) -> Result<Vec<u8>, CborError> {
    encode::serialize_root(&encode::lift(value, hint)?, hint.width)
}

/// Decode a CBOR byte sequence straight to a native value, applying tag projection.
///
/// # Errors
/// See [`ErrorCode`]; [`ErrorCode::TrailingBytes`] if the buffer holds more than
/// one item (this crate does not implement CBOR Sequences).
pub fn decode_data(bytes: &[u8]) -> Result<HostValue, CborError> {
    decode::decode_item(bytes)?.to_native()
}

/// Decode a CBOR byte sequence to the raw item tree, without tag projection.
///
/// # Errors
/// See [`ErrorCode`].
pub fn decode_item(bytes: &[u8]) -> Result<CborItem, CborError> {
    decode::decode_item(bytes)
}

/// Decode bytes to native, then delegate to the external mapping layer's `Shape`
/// implementation for `T`.
///
/// # Errors
/// See [`ErrorCode`].
pub fn decode_class<T: Shape>(bytes: &[u8]) -> Result<T, CborError> {
    T::from_host_value(decode_data(bytes)?)
}

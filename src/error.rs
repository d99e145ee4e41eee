//! Error taxonomy for encode/decode failures.

use core::fmt;

/// A wire-distinguishable error kind.
///
/// Additional variants may be added in a minor release; match with a wildcard arm.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The cursor would have advanced past the end of the buffer.
    UnexpectedEnd,
    /// A head byte's additional-info field was 28, 29, or 30.
    MalformedHead,
    /// An indefinite-length `Bytes`/`Text` child was of the wrong major type.
    IndefiniteChunkTypeMismatch,
    /// A `Text` payload was not valid UTF-8.
    InvalidUtf8,
    /// Two identical keys appeared in one map while duplicate-key rejection was requested.
    MapKeyDuplicate,
    /// A tag's inner item had the wrong shape for that tag's projection.
    UnsupportedTag,
    /// An encode hint requested a width or value outside what that width can hold.
    ValueOutOfRange,
    /// A host value had no CBOR lifting.
    Unencodable,
    /// The decoded byte buffer had trailing bytes after one complete item.
    TrailingBytes,
    /// An arithmetic computation on a length or count would have overflowed.
    LengthOverflow,
    /// Container or tag nesting exceeded `DecodeLimits::max_depth`.
    DepthLimitExceeded,
    /// The total number of items decoded exceeded `DecodeLimits::max_total_items`.
    TotalItemsLimitExceeded,
    /// An array's declared length exceeded `DecodeLimits::max_array_len`.
    ArrayLenLimitExceeded,
    /// A map's declared pair count exceeded `DecodeLimits::max_map_len`.
    MapLenLimitExceeded,
    /// A byte string's declared length exceeded `DecodeLimits::max_bytes_len`.
    BytesLenLimitExceeded,
    /// A text string's declared length exceeded `DecodeLimits::max_text_len`.
    TextLenLimitExceeded,
    /// The input buffer itself exceeded the configured maximum message size.
    MessageLenLimitExceeded,
    /// `append_child` was called on an item that is not an array or an indefinite
    /// byte/text string.
    InvalidContainerOperation,
    /// `set_pair`/`get` was called on an item that is not a map.
    NotAMap,
    /// A library invariant was violated; this should never happen at runtime.
    Unreachable,
}

impl ErrorCode {
    fn message(self) -> &'static str {
        match self {
            Self::UnexpectedEnd => "cursor advanced past the end of the buffer",
            Self::MalformedHead => "reserved additional-info value (28, 29, or 30)",
            Self::IndefiniteChunkTypeMismatch => {
                "indefinite-length chunk did not match the outer major type"
            }
            Self::InvalidUtf8 => "text payload is not valid UTF-8",
            Self::MapKeyDuplicate => "duplicate key in map",
            Self::UnsupportedTag => "tag's inner item has the wrong shape for that tag",
            Self::ValueOutOfRange => "value out of range for the requested width",
            Self::Unencodable => "host value has no CBOR lifting",
            Self::TrailingBytes => "trailing bytes after one complete item",
            Self::LengthOverflow => "length or count computation overflowed",
            Self::DepthLimitExceeded => "nesting depth limit exceeded",
            Self::TotalItemsLimitExceeded => "total decoded item limit exceeded",
            Self::ArrayLenLimitExceeded => "array length limit exceeded",
            Self::MapLenLimitExceeded => "map length limit exceeded",
            Self::BytesLenLimitExceeded => "byte string length limit exceeded",
            Self::TextLenLimitExceeded => "text string length limit exceeded",
            Self::MessageLenLimitExceeded => "input buffer exceeds the configured maximum",
            Self::InvalidContainerOperation => "append_child called on a non-container item",
            Self::NotAMap => "map operation called on a non-map item",
            Self::Unreachable => "internal invariant violated",
        }
    }
}

/// An encode or decode failure, carrying the byte offset at which it occurred.
///
/// `offset` is the cursor position at the point of failure during decode, or the
/// position within the output buffer being built during encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CborError {
    /// The kind of failure.
    pub code: ErrorCode,
    /// Byte offset at which the failure was detected.
    pub offset: usize,
}

impl CborError {
    /// Construct an error at a given byte offset.
    #[must_use]
    pub const fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }
}

impl fmt::Display for CborError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cbor error at {}: {}", self.offset, self.code.message())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CborError {}

//! Decode-time ceilings, the crate's ambient "configuration" surface.
//!
//! `max_depth` bounds indefinite and definite container/tag nesting uniformly.

/// Default nesting-depth ceiling (containers and tags combined).
pub const DEFAULT_MAX_DEPTH: usize = 256;
/// Default ceiling on the declared length of any single array or map.
pub const DEFAULT_MAX_CONTAINER_LEN: usize = 1 << 16;

/// Ceilings applied while decoding, to bound work done against untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum container/tag nesting depth.
    pub max_depth: usize,
    /// Maximum number of items decoded across the whole call.
    pub max_total_items: usize,
    /// Maximum declared length of any single array.
    pub max_array_len: usize,
    /// Maximum declared pair count of any single map.
    pub max_map_len: usize,
    /// Maximum declared length of any single byte string.
    pub max_bytes_len: usize,
    /// Maximum declared length of any single text string.
    pub max_text_len: usize,
    /// Reject a map containing two identical keys (by item-equality) instead of
    /// keeping both. Surfaces as [`crate::ErrorCode::MapKeyDuplicate`] when strict
    /// mode is enabled.
    pub reject_duplicate_map_keys: bool,
}

impl DecodeLimits {
    /// Limits with no ceiling tighter than `usize::MAX` other than [`DEFAULT_MAX_DEPTH`].
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_total_items: usize::MAX,
            max_array_len: usize::MAX,
            max_map_len: usize::MAX,
            max_bytes_len: usize::MAX,
            max_text_len: usize::MAX,
            reject_duplicate_map_keys: false,
        }
    }

    /// Derive limits proportional to an input of `message_len` bytes: no single
    /// container or string can declare a length larger than the input that must
    /// supply its contents, and the total item count is bounded the same way.
    #[must_use]
    pub const fn for_bytes(message_len: usize) -> Self {
        let cap = if message_len < DEFAULT_MAX_CONTAINER_LEN {
            DEFAULT_MAX_CONTAINER_LEN
        } else {
            message_len
        };
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_total_items: cap,
            max_array_len: cap,
            max_map_len: cap,
            max_bytes_len: cap,
            max_text_len: cap,
            reject_duplicate_map_keys: false,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::unbounded()
    }
}

//! UTF-8 validation for decoded text bodies, with an optional SIMD-accelerated
//! path behind the `simdutf8` feature.

#[cfg(feature = "simdutf8")]
use simdutf8::basic as simd_utf8;

/// Validates UTF-8 bytes and returns a borrowed `&str` on success.
#[inline]
pub fn validate(bytes: &[u8]) -> Result<&str, ()> {
    #[cfg(feature = "simdutf8")]
    {
        simd_utf8::from_utf8(bytes).map_err(|_| ())
    }

    #[cfg(not(feature = "simdutf8"))]
    {
        core::str::from_utf8(bytes).map_err(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_utf8() {
        assert_eq!(validate("héllo".as_bytes()), Ok("héllo"));
    }

    #[test]
    fn rejects_invalid_utf8() {
        assert_eq!(validate(&[0xFF, 0xFE]), Err(()));
    }
}

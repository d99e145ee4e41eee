use rfc8949_cbor::{decode_data, decode_item, ErrorCode, HostValue};

#[test]
fn decode_uint_and_nint_boundaries() {
    assert_eq!(decode_data(&[0x00]).unwrap(), HostValue::int(0));
    assert_eq!(decode_data(&[0x18, 0x18]).unwrap(), HostValue::int(24));
    assert_eq!(decode_data(&[0x20]).unwrap(), HostValue::int(-1));
    assert_eq!(decode_data(&[0x38, 0x18]).unwrap(), HostValue::int(-25));
}

#[test]
fn decode_rejects_reserved_additional_info() {
    let err = decode_item(&[0x1C]).unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedHead);
    assert_eq!(err.offset, 0);
}

#[test]
fn decode_rejects_truncated_head_argument() {
    let err = decode_item(&[0x19, 0x01]).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnexpectedEnd);
}

#[test]
fn decode_rejects_indefinite_marker_on_unsigned() {
    let err = decode_item(&[0x1F]).unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedHead);
}

#[test]
fn decode_rejects_trailing_bytes() {
    let err = decode_item(&[0x01, 0x02]).unwrap_err();
    assert_eq!(err.code, ErrorCode::TrailingBytes);
}

#[test]
fn decode_rejects_invalid_utf8() {
    let err = decode_item(&[0x61, 0xFF]).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidUtf8);
}

#[test]
fn decode_indefinite_array_of_mixed_items() {
    let value = decode_data(&[0x9F, 0x01, 0x61, b'a', 0xFF]).unwrap();
    assert_eq!(
        value,
        HostValue::Array(vec![HostValue::int(1), HostValue::text("a")])
    );
}

#[test]
fn decode_indefinite_map() {
    let value = decode_data(&[
        0xBF, 0x61, b'a', 0x01, 0x61, b'b', 0x02, 0xFF,
    ])
    .unwrap();
    assert_eq!(
        value,
        HostValue::Map(vec![
            (HostValue::text("a"), HostValue::int(1)),
            (HostValue::text("b"), HostValue::int(2)),
        ])
    );
}

#[test]
fn decode_rejects_indefinite_byte_string_with_nested_indefinite_chunk() {
    // RFC 8949 forbids indefinite-length chunks inside an indefinite byte string.
    let err = decode_item(&[0x5F, 0x5F, 0xFF]).unwrap_err();
    assert_eq!(err.code, ErrorCode::IndefiniteChunkTypeMismatch);
}

#[test]
fn decode_simple_values() {
    assert_eq!(decode_data(&[0xF4]).unwrap(), HostValue::Bool(false));
    assert_eq!(decode_data(&[0xF5]).unwrap(), HostValue::Bool(true));
    assert_eq!(decode_data(&[0xF6]).unwrap(), HostValue::Null);
    assert_eq!(decode_data(&[0xF7]).unwrap(), HostValue::Undefined);
}

#[test]
fn decode_rejects_simple_value_below_32_in_one_byte_form() {
    let err = decode_item(&[0xF8, 0x13]).unwrap_err();
    assert_eq!(err.code, ErrorCode::MalformedHead);
}

#[test]
fn decode_float_widths_round_trip_as_f64() {
    assert_eq!(
        decode_data(&[0xF9, 0x3E, 0x00]).unwrap(),
        HostValue::Float(1.5)
    );
    assert_eq!(
        decode_data(&[0xFA, 0x47, 0xC3, 0x50, 0x00]).unwrap(),
        HostValue::Float(100_000.0)
    );
}

#[test]
fn decode_enforces_depth_limit() {
    use rfc8949_cbor::decode::decode_item_with_limits;
    use rfc8949_cbor::DecodeLimits;
    let mut bytes = Vec::new();
    for _ in 0..10 {
        bytes.push(0x81); // array of length 1
    }
    bytes.push(0x00);
    let limits = DecodeLimits { max_depth: 5, ..DecodeLimits::unbounded() };
    let err = decode_item_with_limits(&bytes, limits).unwrap_err();
    assert_eq!(err.code, ErrorCode::DepthLimitExceeded);
}

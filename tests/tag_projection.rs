use chrono::{TimeZone, Utc};
use rfc8949_cbor::{decode_data, encode_object, BigInt, HostValue};

#[test]
fn tag_0_date_string_round_trips() {
    let dt = chrono::DateTime::parse_from_rfc3339("2013-03-21T20:04:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let bytes = encode_object(&HostValue::Date(dt)).unwrap();
    assert_eq!(bytes[0], 0xC0);
    assert_eq!(decode_data(&bytes).unwrap(), HostValue::Date(dt));
}

#[test]
fn tag_1_epoch_date_decodes_to_date() {
    let bytes = [0xC1, 0x1A, 0x51, 0x4B, 0x67, 0xB0];
    let value = decode_data(&bytes).unwrap();
    let expected = Utc.timestamp_opt(1_363_896_240, 0).single().unwrap();
    assert_eq!(value, HostValue::Date(expected));
}

#[test]
fn tag_2_positive_bignum_projects_correctly() {
    let bytes = [0xC2, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let value = decode_data(&bytes).unwrap();
    match value {
        HostValue::BigInt(big) => {
            assert!(!big.negative);
            assert_eq!(big.magnitude, vec![0x01, 0, 0, 0, 0, 0, 0, 0, 0]);
        }
        other => panic!("expected BigInt, got {other:?}"),
    }
}

#[test]
fn tag_3_negative_bignum_logical_value_is_minus_one_minus_n() {
    // wire bytes represent n = 0 (empty magnitude is malformed, use 1 byte of 0x00);
    // logical value is -1 - n = -1, magnitude should come out as 1.
    let bytes = [0xC3, 0x41, 0x00];
    let value = decode_data(&bytes).unwrap();
    match value {
        HostValue::BigInt(big) => {
            assert!(big.negative);
            assert_eq!(big.magnitude, vec![0x01]);
        }
        other => panic!("expected BigInt, got {other:?}"),
    }
}

#[test]
fn tag_2_3_round_trip_through_bigint_helpers() {
    let n = vec![0x12, 0x34];
    let big = BigInt::from_negative_wire_bytes(&n);
    assert!(big.negative);
    assert_eq!(big.negative_wire_bytes(), n);
}

#[test]
fn tag_32_uri_round_trips() {
    let uri = url::Url::parse("http://www.example.com").unwrap();
    let bytes = encode_object(&HostValue::Uri(uri.clone())).unwrap();
    assert_eq!(&bytes[..3], &[0xD8, 0x20, 0x76]);
    assert_eq!(decode_data(&bytes).unwrap(), HostValue::Uri(uri));
}

#[test]
fn tag_37_uuid_round_trips() {
    let uuid = uuid::Uuid::from_bytes([0xAB; 16]);
    let bytes = encode_object(&HostValue::Uuid(uuid)).unwrap();
    assert_eq!(&bytes[..3], &[0xD8, 0x25, 0x50]);
    assert_eq!(decode_data(&bytes).unwrap(), HostValue::Uuid(uuid));
}

#[test]
fn tag_33_and_34_base64_variants_are_distinct() {
    let url_safe = decode_data(&[0xD8, 0x21, 0x64, b'a', b'b', b'c', b'd']).unwrap();
    assert_eq!(url_safe, HostValue::Base64Url("abcd".into()));

    let standard = decode_data(&[0xD8, 0x22, 0x64, b'a', b'b', b'c', b'd']).unwrap();
    assert_eq!(standard, HostValue::Base64("abcd".into()));
}

#[test]
fn tag_35_regex_and_36_mime_project_to_text_wrappers() {
    let regex = decode_data(&[0xD8, 0x23, 0x62, b'a', b'b']).unwrap();
    assert_eq!(regex, HostValue::Regex("ab".into()));

    let mime = decode_data(&[0xD8, 0x24, 0x62, b'a', b'b']).unwrap();
    assert_eq!(mime, HostValue::Mime("ab".into()));
}

#[test]
fn tag_4_decimal_fraction_with_integer_mantissa() {
    // 2.1 represented as 21e-1: [-1, 21]
    let bytes = [0xC4, 0x82, 0x20, 0x15];
    let value = decode_data(&bytes).unwrap();
    match value {
        HostValue::Decimal { base, exponent, mantissa } => {
            assert_eq!(base, 10);
            assert_eq!(exponent, -1);
            assert_eq!(*mantissa, HostValue::int(21));
        }
        other => panic!("expected Decimal, got {other:?}"),
    }
}

#[test]
fn tag_5_bigfloat_with_bignum_mantissa_projects_bignum_not_integer() {
    // [e, m] where m is itself a tag-2 bignum
    let mantissa_bytes = [0xC2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0];
    let mut bytes = vec![0xC5, 0x82, 0x01];
    bytes.extend_from_slice(&mantissa_bytes);
    let value = decode_data(&bytes).unwrap();
    match value {
        HostValue::Decimal { base, mantissa, .. } => {
            assert_eq!(base, 2);
            assert!(matches!(*mantissa, HostValue::BigInt(_)));
        }
        other => panic!("expected Decimal, got {other:?}"),
    }
}

#[test]
fn tag_100_days_since_epoch() {
    let bytes = [0xD8, 0x64, 0x00];
    let value = decode_data(&bytes).unwrap();
    assert_eq!(value, HostValue::Date(Utc.timestamp_opt(0, 0).single().unwrap()));
}

#[test]
fn self_describe_tag_strips_and_recurses() {
    let value = decode_data(&[0xD9, 0xD9, 0xF7, 0x01]).unwrap();
    assert_eq!(value, HostValue::int(1));
}

#[test]
fn unrecognized_tag_projects_to_tagged_wrapper() {
    let value = decode_data(&[0xD8, 0xFF, 0x01]).unwrap();
    match value {
        HostValue::Tagged { tag, inner } => {
            assert_eq!(tag, 255);
            assert_eq!(*inner, HostValue::int(1));
        }
        other => panic!("expected Tagged, got {other:?}"),
    }
}

//! The decoder: a byte cursor parsed into an item tree, one item at a time,
//! recursively.

use crate::bits::{self, Major};
use crate::error::{CborError, ErrorCode};
use crate::item::{ArrayPayload, BytesPayload, CborItem, FloatWidth, MapPayload, TextPayload};
use crate::limits::DecodeLimits;
use crate::stream::Cursor;

struct DecodeState {
    limits: DecodeLimits,
    depth: usize,
    total_items: usize,
}

impl DecodeState {
    fn enter_item(&mut self, offset: usize) -> Result<(), CborError> {
        self.total_items += 1;
        if self.total_items > self.limits.max_total_items {
            return Err(CborError::new(ErrorCode::TotalItemsLimitExceeded, offset));
        }
        Ok(())
    }

    fn enter_depth(&mut self, offset: usize) -> Result<(), CborError> {
        self.depth += 1;
        if self.depth > self.limits.max_depth {
            return Err(CborError::new(ErrorCode::DepthLimitExceeded, offset));
        }
        Ok(())
    }

    fn exit_depth(&mut self) {
        self.depth -= 1;
    }
}

/// Parse the single item occupying `bytes`, using size-proportional limits.
///
/// # Errors
/// See [`ErrorCode`]; [`ErrorCode::TrailingBytes`] if bytes remain after one item.
pub fn decode_item(bytes: &[u8]) -> Result<CborItem, CborError> {
    decode_item_with_limits(bytes, DecodeLimits::for_bytes(bytes.len()))
}

/// Like [`decode_item`], with explicit ceilings on nesting depth and container size.
///
/// # Errors
/// See [`ErrorCode`].
pub fn decode_item_with_limits(bytes: &[u8], limits: DecodeLimits) -> Result<CborItem, CborError> {
    let mut cursor = Cursor::new(bytes);
    let mut state = DecodeState { limits, depth: 0, total_items: 0 };
    let item = decode_one(&mut cursor, &mut state)?;
    if !cursor.at_end() {
        return Err(CborError::new(ErrorCode::TrailingBytes, cursor.position()));
    }
    Ok(item)
}

enum HeadArgument {
    Value(u64),
    Indefinite,
}

fn read_argument(cursor: &mut Cursor, minor: u8, head_pos: usize) -> Result<HeadArgument, CborError> {
    match minor {
        0..=bits::AI_INLINE_MAX => Ok(HeadArgument::Value(u64::from(minor))),
        bits::AI_1BYTE => Ok(HeadArgument::Value(u64::from(cursor.pop_u8()?))),
        bits::AI_2BYTE => Ok(HeadArgument::Value(u64::from(cursor.pop_u16()?))),
        bits::AI_4BYTE => Ok(HeadArgument::Value(u64::from(cursor.pop_u32()?))),
        bits::AI_8BYTE => Ok(HeadArgument::Value(cursor.pop_u64()?)),
        bits::AI_INDEFINITE => Ok(HeadArgument::Indefinite),
        _ => Err(CborError::new(ErrorCode::MalformedHead, head_pos)),
    }
}

fn len_to_usize(value: u64, offset: usize) -> Result<usize, CborError> {
    usize::try_from(value).map_err(|_| CborError::new(ErrorCode::LengthOverflow, offset))
}

/// Decode one item, recursing into children. Does not recognize a standalone
/// `Break` byte as valid input; that is only meaningful inside a container's
/// indefinite-length loop (see [`decode_child_or_break`]).
fn decode_one(cursor: &mut Cursor, state: &mut DecodeState) -> Result<CborItem, CborError> {
    let head_pos = cursor.position();
    state.enter_item(head_pos)?;
    let head = cursor.pop_u8()?;
    let major_bits = head >> 5;
    let minor = head & 0x1F;
    let major = Major::from_bits(major_bits);

    // Major 7's additional-info field names simple values and float widths, not a
    // length/magnitude argument; decode it directly rather than through the
    // generic length-argument reader.
    if let Major::Primitive = major {
        return decode_primitive(cursor, minor, head_pos);
    }

    let argument = read_argument(cursor, minor, head_pos)?;

    match (major, argument) {
        (Major::Unsigned, HeadArgument::Value(v)) => Ok(CborItem::Unsigned(v)),
        (Major::Unsigned, HeadArgument::Indefinite) => {
            Err(CborError::new(ErrorCode::MalformedHead, head_pos))
        }
        (Major::Negative, HeadArgument::Value(v)) => Ok(CborItem::Negative(v)),
        (Major::Negative, HeadArgument::Indefinite) => {
            Err(CborError::new(ErrorCode::MalformedHead, head_pos))
        }
        (Major::Bytes, HeadArgument::Value(v)) => {
            let len = len_to_usize(v, head_pos)?;
            if len > state.limits.max_bytes_len {
                return Err(CborError::new(ErrorCode::BytesLenLimitExceeded, head_pos));
            }
            Ok(CborItem::Bytes(BytesPayload::Definite(
                cursor.pop_bytes(len)?.to_vec(),
            )))
        }
        (Major::Bytes, HeadArgument::Indefinite) => decode_indefinite_bytes(cursor, state, head_pos),
        (Major::Text, HeadArgument::Value(v)) => {
            let len = len_to_usize(v, head_pos)?;
            if len > state.limits.max_text_len {
                return Err(CborError::new(ErrorCode::TextLenLimitExceeded, head_pos));
            }
            let bytes = cursor.pop_bytes(len)?;
            let text = crate::utf8::validate(bytes)
                .map_err(|()| CborError::new(ErrorCode::InvalidUtf8, head_pos))?;
            Ok(CborItem::Text(TextPayload::Definite(text.to_string())))
        }
        (Major::Text, HeadArgument::Indefinite) => decode_indefinite_text(cursor, state, head_pos),
        (Major::Array, HeadArgument::Value(v)) => {
            let len = len_to_usize(v, head_pos)?;
            if len > state.limits.max_array_len {
                return Err(CborError::new(ErrorCode::ArrayLenLimitExceeded, head_pos));
            }
            state.enter_depth(head_pos)?;
            let mut items = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                items.push(decode_one(cursor, state)?);
            }
            state.exit_depth();
            Ok(CborItem::Array(ArrayPayload::Definite(items)))
        }
        (Major::Array, HeadArgument::Indefinite) => {
            state.enter_depth(head_pos)?;
            let mut items = Vec::new();
            loop {
                match decode_child_or_break(cursor, state)? {
                    Some(item) => {
                        if items.len() >= state.limits.max_array_len {
                            return Err(CborError::new(ErrorCode::ArrayLenLimitExceeded, head_pos));
                        }
                        items.push(item);
                    }
                    None => break,
                }
            }
            state.exit_depth();
            Ok(CborItem::Array(ArrayPayload::Indefinite(items)))
        }
        (Major::Map, HeadArgument::Value(v)) => {
            let len = len_to_usize(v, head_pos)?;
            if len > state.limits.max_map_len {
                return Err(CborError::new(ErrorCode::MapLenLimitExceeded, head_pos));
            }
            state.enter_depth(head_pos)?;
            let mut pairs = Vec::with_capacity(len.min(1024));
            for _ in 0..len {
                let key_pos = cursor.position();
                let key = decode_one(cursor, state)?;
                let value = decode_one(cursor, state)?;
                check_duplicate_key(&pairs, &key, state, key_pos)?;
                pairs.push((key, value));
            }
            state.exit_depth();
            Ok(CborItem::Map(MapPayload::Definite(pairs)))
        }
        (Major::Map, HeadArgument::Indefinite) => {
            state.enter_depth(head_pos)?;
            let mut pairs = Vec::new();
            loop {
                let key_pos = cursor.position();
                match decode_child_or_break(cursor, state)? {
                    Some(key) => {
                        if pairs.len() >= state.limits.max_map_len {
                            return Err(CborError::new(ErrorCode::MapLenLimitExceeded, head_pos));
                        }
                        let value = decode_one(cursor, state)?;
                        check_duplicate_key(&pairs, &key, state, key_pos)?;
                        pairs.push((key, value));
                    }
                    None => break,
                }
            }
            state.exit_depth();
            Ok(CborItem::Map(MapPayload::Indefinite(pairs)))
        }
        (Major::Tag, HeadArgument::Value(tag)) => {
            state.enter_depth(head_pos)?;
            let inner = decode_one(cursor, state)?;
            state.exit_depth();
            Ok(CborItem::tag(tag, inner))
        }
        (Major::Tag, HeadArgument::Indefinite) => {
            Err(CborError::new(ErrorCode::MalformedHead, head_pos))
        }
        (Major::Primitive, _) => unreachable!("Primitive is handled before read_argument"),
    }
}

/// Decode a major-7 item directly from its raw additional-info field: unlike every
/// other major, major 7's additional info names a simple value or float width, not
/// a length/magnitude argument, so this does not go through [`read_argument`].
fn decode_primitive(cursor: &mut Cursor, minor: u8, head_pos: usize) -> Result<CborItem, CborError> {
    match minor {
        20 => Ok(CborItem::Bool(false)),
        21 => Ok(CborItem::Bool(true)),
        22 => Ok(CborItem::Null),
        23 => Ok(CborItem::Undefined),
        24 => {
            let v = cursor.pop_u8()?;
            if v < 32 {
                return Err(CborError::new(ErrorCode::MalformedHead, head_pos));
            }
            Ok(CborItem::Simple(v))
        }
        25 => Ok(CborItem::Float(FloatWidth::Half, f64::from(cursor.pop_f16()?))),
        26 => Ok(CborItem::Float(FloatWidth::Single, f64::from(cursor.pop_f32()?))),
        27 => Ok(CborItem::Float(FloatWidth::Double, cursor.pop_f64()?)),
        0..=19 => Ok(CborItem::Simple(minor)),
        // 28-30 reserved; 31 is Break, only meaningful inside a container's
        // indefinite-length loop (see `decode_child_or_break`).
        _ => Err(CborError::new(ErrorCode::MalformedHead, head_pos)),
    }
}

/// Decode one child inside an indefinite-length loop: `None` when the next byte is
/// `Break` (consumed), `Some(item)` otherwise.
fn decode_child_or_break(cursor: &mut Cursor, state: &mut DecodeState) -> Result<Option<CborItem>, CborError> {
    if cursor.peek_u8()? == bits::BREAK {
        cursor.pop_u8()?;
        return Ok(None);
    }
    Ok(Some(decode_one(cursor, state)?))
}

fn check_duplicate_key(
    pairs: &[(CborItem, CborItem)],
    key: &CborItem,
    state: &DecodeState,
    key_pos: usize,
) -> Result<(), CborError> {
    if state.limits.reject_duplicate_map_keys && pairs.iter().any(|(k, _)| k == key) {
        return Err(CborError::new(ErrorCode::MapKeyDuplicate, key_pos));
    }
    Ok(())
}

fn decode_indefinite_bytes(
    cursor: &mut Cursor,
    state: &mut DecodeState,
    head_pos: usize,
) -> Result<CborItem, CborError> {
    state.enter_depth(head_pos)?;
    let mut chunks = Vec::new();
    loop {
        let chunk_pos = cursor.position();
        match decode_child_or_break(cursor, state)? {
            Some(CborItem::Bytes(BytesPayload::Definite(b))) => chunks.push(b),
            Some(_) => {
                return Err(CborError::new(
                    ErrorCode::IndefiniteChunkTypeMismatch,
                    chunk_pos,
                ))
            }
            None => break,
        }
    }
    state.exit_depth();
    Ok(CborItem::Bytes(BytesPayload::Indefinite(chunks)))
}

fn decode_indefinite_text(
    cursor: &mut Cursor,
    state: &mut DecodeState,
    head_pos: usize,
) -> Result<CborItem, CborError> {
    state.enter_depth(head_pos)?;
    let mut chunks = Vec::new();
    loop {
        let chunk_pos = cursor.position();
        match decode_child_or_break(cursor, state)? {
            Some(CborItem::Text(TextPayload::Definite(s))) => chunks.push(s),
            Some(_) => {
                return Err(CborError::new(
                    ErrorCode::IndefiniteChunkTypeMismatch,
                    chunk_pos,
                ))
            }
            None => break,
        }
    }
    state.exit_depth();
    Ok(CborItem::Text(TextPayload::Indefinite(chunks)))
}

//! RLP reading primitives.
//!
//! These operate on a borrowed payload and a byte position, returning the
//! next position on success. They never allocate and never panic on
//! adversarial input; any out-of-bounds access or canonical-form violation
//! is reported as an [`Error`].

use core::fmt;

use txpool_types::U256;

/// A canonical-form or bounds violation in an RLP payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Error {
    /// An item or its payload runs past the end of the buffer.
    UnexpectedEof,
    /// An integer encoded with leading zero bytes.
    LeadingZero,
    /// A size prefix that is not the shortest possible form.
    NonCanonicalSize,
    /// A list where a string is required.
    ExpectedString,
    /// A string where a list is required.
    ExpectedList,
    /// An unsigned integer wider than its field allows.
    UintOverflow,
    /// A fixed-width field with an unexpected byte length.
    WrongLength,
    /// Unconsumed bytes after the end of an item.
    TrailingBytes,
    /// A decoded value outside the range the field admits.
    OutOfRange,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::UnexpectedEof => "unexpected end of payload",
            Self::LeadingZero => "integer encoding must not have leading zeros",
            Self::NonCanonicalSize => "size prefix must use the shortest form",
            Self::ExpectedString => "must be a string, not a list",
            Self::ExpectedList => "must be a list, not a string",
            Self::UintOverflow => "unsigned integer is too long",
            Self::WrongLength => "unexpected field length",
            Self::TrailingBytes => "extraneous bytes after the item",
            Self::OutOfRange => "value is out of range",
        };
        f.write_str(msg)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Parse a big-endian length from `payload[pos..pos + len]`.
fn be_int(payload: &[u8], pos: usize, len: usize) -> Result<usize, Error> {
    let end = pos.checked_add(len).ok_or(Error::UnexpectedEof)?;
    let bytes = payload.get(pos..end).ok_or(Error::UnexpectedEof)?;
    if let Some(0) = bytes.first() {
        return Err(Error::LeadingZero);
    }
    let value = bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    usize::try_from(value).map_err(|_| Error::UnexpectedEof)
}

/// Decode the type-and-length prefix at `pos`.
///
/// Returns the position of the item's payload, its length, and whether the
/// item is a list. For a single byte below 0x80 the byte is its own
/// payload, so `data_pos == pos` and `data_len == 1`.
pub fn prefix(payload: &[u8], pos: usize) -> Result<(usize, usize, bool), Error> {
    let first = *payload.get(pos).ok_or(Error::UnexpectedEof)?;
    match first {
        0x00..=0x7f => Ok((pos, 1, false)),
        0x80..=0xb7 => {
            let data_len = usize::from(first - 0x80);
            if data_len == 1 {
                // a lone byte below 0x80 must use the literal encoding
                match payload.get(pos + 1) {
                    Some(&b) if b < 0x80 => return Err(Error::NonCanonicalSize),
                    Some(_) => {}
                    None => return Err(Error::UnexpectedEof),
                }
            }
            Ok((pos + 1, data_len, false))
        }
        0xb8..=0xbf => {
            let len_of_len = usize::from(first - 0xb7);
            let data_len = be_int(payload, pos + 1, len_of_len)?;
            if data_len < 56 {
                return Err(Error::NonCanonicalSize);
            }
            Ok((pos + 1 + len_of_len, data_len, false))
        }
        0xc0..=0xf7 => Ok((pos + 1, usize::from(first - 0xc0), true)),
        0xf8..=0xff => {
            let len_of_len = usize::from(first - 0xf7);
            let data_len = be_int(payload, pos + 1, len_of_len)?;
            if data_len < 56 {
                return Err(Error::NonCanonicalSize);
            }
            Ok((pos + 1 + len_of_len, data_len, true))
        }
    }
}

/// Parse an unsigned 64-bit scalar at `pos`.
///
/// The scalar must end strictly before the last byte of the payload: every
/// u64-shaped field of a transaction is followed by at least one more item.
pub fn parse_u64(payload: &[u8], pos: usize) -> Result<(usize, u64), Error> {
    let (data_pos, data_len, is_list) = prefix(payload, pos)?;
    if is_list {
        return Err(Error::ExpectedString);
    }
    let end = data_pos.checked_add(data_len).ok_or(Error::UnexpectedEof)?;
    if end >= payload.len() {
        return Err(Error::UnexpectedEof);
    }
    if data_len > 8 {
        return Err(Error::UintOverflow);
    }
    if data_len > 0 && payload[data_pos] == 0 {
        return Err(Error::LeadingZero);
    }
    let value = payload[data_pos..end]
        .iter()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b));
    Ok((end, value))
}

/// Parse an unsigned 256-bit scalar at `pos` into `out`.
///
/// Unlike [`parse_u64`], the scalar may end exactly at the end of the
/// payload: `s`, the last item of every transaction, is a u256.
pub fn parse_u256(payload: &[u8], pos: usize, out: &mut U256) -> Result<usize, Error> {
    let (data_pos, data_len, is_list) = prefix(payload, pos)?;
    if is_list {
        return Err(Error::ExpectedString);
    }
    let end = data_pos.checked_add(data_len).ok_or(Error::UnexpectedEof)?;
    if end > payload.len() {
        return Err(Error::UnexpectedEof);
    }
    if data_len > 32 {
        return Err(Error::UintOverflow);
    }
    if data_len > 0 && payload[data_pos] == 0 {
        return Err(Error::LeadingZero);
    }
    *out = U256::from_big_endian(&payload[data_pos..end]);
    Ok(end)
}

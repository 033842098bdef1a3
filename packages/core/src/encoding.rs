//! Encoding helpers shared by the message and command class catalogs:
//! bitmask-encoded integer sets, NUL-terminated strings and variable-size
//! signed integers with minimal-size encoding.

use crate::parse::{bytes::be_u8, ParseError, ParseResult, Parser};
use crate::serialize::{ensure_capacity, Serializable};
use bytes::{Buf, Bytes, BytesMut};

/// Parses a bitmask of `num_bytes` bytes into the set of integers it encodes.
/// Bit 0 of the first byte maps to `offset`, LSB first within each byte.
pub fn parse_bitmask(i: &mut Bytes, num_bytes: usize, offset: u8) -> ParseResult<Vec<u8>> {
    if i.remaining() < num_bytes {
        return Err(ParseError::needed(num_bytes - i.remaining()));
    }
    let mut values = Vec::new();
    for byte_index in 0..num_bytes {
        let byte = i.get_u8();
        for bit in 0..8u16 {
            if byte & (1 << bit) != 0 {
                let value = offset as u16 + byte_index as u16 * 8 + bit;
                if value <= u8::MAX as u16 {
                    values.push(value as u8);
                }
            }
        }
    }
    Ok(values)
}

/// Parses a bitmask that extends to the end of the input.
pub fn parse_bitmask_rest(i: &mut Bytes, offset: u8) -> ParseResult<Vec<u8>> {
    let num_bytes = i.remaining();
    parse_bitmask(i, num_bytes, offset)
}

/// Serializes a set of integers as a bitmask. With `num_bytes == None` the
/// mask is as short as the largest value requires.
pub fn bitmask<'a>(
    values: &'a [u8],
    num_bytes: Option<usize>,
    offset: u8,
) -> impl Serializable + 'a {
    move |output: &mut BytesMut| {
        let len = num_bytes.unwrap_or_else(|| {
            values
                .iter()
                .map(|v| (v.saturating_sub(offset) as usize) / 8 + 1)
                .max()
                .unwrap_or(0)
        });
        let mut mask = vec![0u8; len];
        for value in values {
            let index = value.wrapping_sub(offset) as usize;
            if index / 8 < len {
                mask[index / 8] |= 1 << (index % 8);
            }
        }
        ensure_capacity(output, len);
        output.extend_from_slice(&mask);
    }
}

/// Reads bytes up to (and consuming) the NUL terminator.
pub fn parse_nul_terminated_string(i: &mut Bytes) -> ParseResult<String> {
    let Some(end) = i.iter().position(|b| *b == 0) else {
        return Err(ParseError::recoverable("unterminated string"));
    };
    let raw = i.split_to(end);
    i.advance(1);
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

pub fn nul_terminated_string(value: &str) -> impl Serializable + '_ {
    move |output: &mut BytesMut| {
        ensure_capacity(output, value.len() + 1);
        output.extend_from_slice(value.as_bytes());
        output.extend_from_slice(&[0]);
    }
}

/// The number of bytes needed to encode `value` as a big-endian two's
/// complement integer.
pub fn int_size(value: i64) -> usize {
    let mut size = 1;
    while size < 8 {
        let bits = size * 8 - 1;
        if -(1i64 << bits) <= value && value < (1i64 << bits) {
            break;
        }
        size += 1;
    }
    size
}

/// Reads a `size`-byte big-endian two's complement integer.
pub fn parse_int_sized(i: &mut Bytes, size: usize) -> ParseResult<i64> {
    if size == 0 || size > 8 {
        return Err(ParseError::recoverable("unsupported integer size"));
    }
    if i.remaining() < size {
        return Err(ParseError::needed(size - i.remaining()));
    }
    let mut value: i64 = (i.get_u8() as i8) as i64;
    for _ in 1..size {
        value = (value << 8) | i.get_u8() as i64;
    }
    Ok(value)
}

/// Reads a `size`-byte big-endian unsigned integer.
pub fn parse_uint_sized(i: &mut Bytes, size: usize) -> ParseResult<u64> {
    if size == 0 || size > 8 {
        return Err(ParseError::recoverable("unsupported integer size"));
    }
    if i.remaining() < size {
        return Err(ParseError::needed(size - i.remaining()));
    }
    let mut value: u64 = 0;
    for _ in 0..size {
        value = (value << 8) | i.get_u8() as u64;
    }
    Ok(value)
}

/// Writes a `size`-byte big-endian two's complement integer.
pub fn int_sized(value: i64, size: usize) -> impl Serializable {
    move |output: &mut BytesMut| {
        ensure_capacity(output, size);
        let be = value.to_be_bytes();
        output.extend_from_slice(&be[8 - size..]);
    }
}

/// Parses a bitmask whose byte count is given by the preceding length field.
pub fn length_bitmask(offset: u8) -> impl Parser<Bytes, Vec<u8>> {
    move |i: &mut Bytes| {
        let num_bytes = be_u8(i)? as usize;
        parse_bitmask(i, num_bytes, offset)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bitmask_roundtrip() {
        let values = vec![1u8, 3, 4, 6, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22];
        let mask = bitmask(&values, Some(29), 1).as_bytes();
        assert_eq!(&mask[..3], hex::decode("adff3f").unwrap().as_slice());
        assert_eq!(mask.len(), 29);

        let mut i = mask;
        let parsed = parse_bitmask(&mut i, 29, 1).unwrap();
        assert_eq!(parsed, values);
    }

    #[test]
    fn test_bitmask_minimal_width() {
        let mask = bitmask(&[10, 20, 30, 40, 50], None, 1).as_bytes();
        assert_eq!(mask.as_ref(), hex::decode("00020820800002").unwrap());
    }

    #[test]
    fn test_nul_terminated_string() {
        let mut i = Bytes::from_static(b"Z-Wave 4.05\x00\x01");
        assert_eq!(
            parse_nul_terminated_string(&mut i).unwrap(),
            "Z-Wave 4.05"
        );
        assert_eq!(i.as_ref(), &[0x01]);
        assert_eq!(
            nul_terminated_string("Z-Wave 4.05").as_bytes().as_ref(),
            b"Z-Wave 4.05\x00"
        );
    }

    #[test]
    fn test_int_size() {
        assert_eq!(int_size(0), 1);
        assert_eq!(int_size(127), 1);
        assert_eq!(int_size(128), 2);
        assert_eq!(int_size(-128), 1);
        assert_eq!(int_size(-129), 2);
        assert_eq!(int_size(2250), 2);
    }

    #[test]
    fn test_int_sized_roundtrip() {
        let mut i = Bytes::from_static(&[0xf7, 0x00]);
        assert_eq!(parse_int_sized(&mut i, 2).unwrap(), -2304);
        assert_eq!(int_sized(-2304, 2).as_bytes().as_ref(), &[0xf7, 0x00]);
    }
}

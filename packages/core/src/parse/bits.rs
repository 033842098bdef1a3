use super::{combinators::map, Needed, ParseError, ParseResult, Parser};
use bytes::{Buf, Bytes};

// Bit-level parsers operate on Bytes plus a bit-offset. The offset counts the
// bits already consumed from the first byte of the input and is always in
// [0..7]. Fields are read MSB-first.

/// Takes `count` bits (at most 8) from the input and interprets them as an
/// unsigned integer.
pub fn take(count: usize) -> impl Parser<(Bytes, usize), u8> {
    debug_assert!(count <= 8);
    move |(input, bit_offset): &mut (Bytes, usize)| {
        if count == 0 {
            return Ok(0);
        }

        let mut offset = *bit_offset;
        let needed_bytes = (count + offset).div_ceil(8);
        if input.remaining() < needed_bytes {
            return Err(ParseError::Incomplete(Needed::Size(
                needed_bytes - input.remaining(),
            )));
        }

        let mut ret: u16 = 0;
        let mut remaining = count;
        let mut skip_bytes = 0usize;

        for byte in input.iter().take(needed_bytes) {
            let avail = 8 - offset;
            // Mask off the bits left of the offset
            let val = (*byte & (0xffu8 >> offset)) as u16;
            if remaining < avail {
                // Bits on the right of this byte belong to the next field
                ret = (ret << remaining) | (val >> (avail - remaining));
                offset += remaining;
                remaining = 0;
            } else {
                ret = (ret << avail) | val;
                remaining -= avail;
                offset = 0;
                skip_bytes += 1;
            }
            if remaining == 0 {
                break;
            }
        }

        input.advance(skip_bytes);
        *bit_offset = offset;
        Ok(ret as u8)
    }
}

pub fn bool(input: &mut (Bytes, usize)) -> ParseResult<bool> {
    map(take(1), |x| x != 0).parse(input)
}

/// Wrapper around bit-level parsers to operate on Bytes. Parsing starts at
/// bit-offset 0 and discards a partially consumed final byte.
pub fn bits<O, P>(parser: P) -> impl Parser<Bytes, O>
where
    P: Parser<(Bytes, usize), O>,
{
    move |input: &mut Bytes| {
        let mut bit_input = (input.clone(), 0usize);
        let ret = parser.parse(&mut bit_input);

        let (mut bit_input, offset) = bit_input;
        if offset > 0 {
            bit_input.advance(1);
        }
        *input = bit_input;
        ret
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_take_msb_first() {
        // 0b1010_1101 -> take(3) = 0b101, take(2) = 0b01, take(3) = 0b101
        let mut input = (Bytes::from_static(&[0xad]), 0usize);
        assert_eq!(take(3).parse(&mut input), Ok(0b101));
        assert_eq!(take(2).parse(&mut input), Ok(0b01));
        assert_eq!(take(3).parse(&mut input), Ok(0b101));
        assert_eq!(input.0.len(), 0);
    }

    #[test]
    fn test_bits_discards_partial_byte() {
        let mut input = Bytes::from_static(&[0b1100_0000, 0xaa]);
        let flag = bits(bool).parse(&mut input).unwrap();
        assert!(flag);
        // The rest of the first byte is gone
        assert_eq!(input.as_ref(), &[0xaa]);
    }
}

use super::{Needed, ParseError, ParseResult, Parser};
use bytes::{Buf, Bytes};

pub fn take(count: impl Into<usize>) -> impl Parser<Bytes, Bytes> {
    let count: usize = count.into();
    move |input: &mut Bytes| {
        let needed = count.saturating_sub(input.len());
        if needed > 0 {
            Err(ParseError::Incomplete(Needed::Size(needed)))
        } else {
            Ok(input.split_to(count))
        }
    }
}

/// Requires the next byte to equal `lit`.
pub fn literal(lit: u8) -> impl Parser<Bytes, u8> {
    move |input: &mut Bytes| {
        let b = be_u8(input)?;
        if b == lit {
            Ok(lit)
        } else {
            Err(ParseError::recoverable(format!(
                "expected {:#04x}, got {:#04x}",
                lit, b
            )))
        }
    }
}

/// Consumes the given number of bytes without producing any output.
pub fn skip(count: impl Into<usize>) -> impl Parser<Bytes, ()> {
    let parser = take(count);
    move |input: &mut Bytes| {
        parser.parse(input)?;
        Ok(())
    }
}

/// Consumes and returns the remainder of the input.
pub fn rest(input: &mut Bytes) -> ParseResult<Bytes> {
    Ok(input.split_to(input.len()))
}

macro_rules! impl_int {
    ($un:ident, $bytes:literal) => {
        paste::paste! {
            pub fn [<be_ $un>](input: &mut Bytes) -> ParseResult<$un> {
                if input.remaining() < $bytes {
                    Err(ParseError::Incomplete(Needed::Size($bytes - input.remaining())))
                } else {
                    Ok(input.[<get_ $un>]())
                }
            }
        }
    };
}

impl_int!(u8, 1);
impl_int!(u16, 2);
impl_int!(u32, 4);
impl_int!(i8, 1);
impl_int!(i16, 2);
impl_int!(i32, 4);

/// Reads a 3-byte big-endian unsigned integer.
pub fn be_u24(input: &mut Bytes) -> ParseResult<u32> {
    if input.remaining() < 3 {
        return Err(ParseError::Incomplete(Needed::Size(3 - input.remaining())));
    }
    let hi = input.get_u8() as u32;
    let lo = input.get_u16() as u32;
    Ok((hi << 16) | lo)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_take_incomplete() {
        let mut input = Bytes::from_static(&[0x01, 0x02]);
        assert_eq!(
            take(4usize).parse(&mut input),
            Err(ParseError::Incomplete(Needed::Size(2)))
        );
    }

    #[test]
    fn test_be_u24() {
        let mut input = Bytes::from_static(&[0x01, 0x02, 0x03, 0xff]);
        assert_eq!(be_u24(&mut input), Ok(0x010203));
        assert_eq!(input.as_ref(), &[0xff]);
    }

    #[test]
    fn test_literal_mismatch() {
        let mut input = Bytes::from_static(&[0x02]);
        assert!(matches!(
            literal(0x01).parse(&mut input),
            Err(ParseError::Recoverable(_))
        ));
    }
}

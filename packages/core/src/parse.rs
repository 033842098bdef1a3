extern crate bytes as bytes_crate;
use bytes_crate::Bytes;

pub mod bits;
pub mod bytes;
pub mod combinators;

mod error;
pub use error::*;

pub trait Parsable
where
    Self: Sized,
{
    fn parse(i: &mut Bytes) -> ParseResult<Self>;

    /// Parses a value from a standalone buffer. Trailing bytes are left to
    /// the caller to judge.
    fn parse_complete(data: &[u8]) -> ParseResult<Self> {
        let mut i = Bytes::copy_from_slice(data);
        Self::parse(&mut i)
    }
}

pub trait Parser<I: Clone, O = Self> {
    /// Execute the parser on the input, advancing the input
    fn parse(&self, input: &mut I) -> ParseResult<O>;

    /// Execute the parser on the input, advancing the input only in case of success
    fn parse_peek(&self, input: &mut I) -> ParseResult<O> {
        let checkpoint = input.clone();
        let res = self.parse(input);
        if res.is_err() {
            *input = checkpoint;
        }
        res
    }
}

// Convenience implementation of Parser for functions
impl<I, O, F> Parser<I, O> for F
where
    I: Clone,
    F: Fn(&mut I) -> ParseResult<O>,
{
    fn parse(&self, input: &mut I) -> ParseResult<O> {
        self(input)
    }
}

// Tuples of parsers are themselves parsers, applied in sequence
macro_rules! impl_parser_for_tuple {
    ($($idx:tt $parser:ident $output:ident),+) => {
        impl<I, $($parser, $output),+> Parser<I, ($($output,)+)> for ($($parser,)+)
        where
            I: Clone,
            $($parser: Parser<I, $output>,)+
        {
            fn parse(&self, input: &mut I) -> ParseResult<($($output,)+)> {
                Ok(($(self.$idx.parse(input)?,)+))
            }
        }
    };
}

impl_parser_for_tuple!(0 P0 O0);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2, 3 P3 O3);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2, 3 P3 O3, 4 P4 O4);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2, 3 P3 O3, 4 P4 O4, 5 P5 O5);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2, 3 P3 O3, 4 P4 O4, 5 P5 O5, 6 P6 O6);
impl_parser_for_tuple!(0 P0 O0, 1 P1 O1, 2 P2 O2, 3 P3 O3, 4 P4 O4, 5 P5 O5, 6 P6 O6, 7 P7 O7);

/// Bridges the `TryFrom` implementation generated by
/// `derive_try_from_primitive` into a parser with a useful error message.
pub trait ParsableEnum
where
    Self: Sized + TryFrom<u8>,
{
    const LABEL: &'static str;
}

/// Reads one byte and lifts it into an enum implementing [`ParsableEnum`].
pub fn enum_u8<T>(i: &mut bytes_crate::Bytes) -> ParseResult<T>
where
    T: ParsableEnum,
{
    let b = bytes::be_u8(i)?;
    T::try_from(b).map_err(|_| {
        ParseError::recoverable(format!("unknown {}: {:#04x}", T::LABEL, b))
    })
}

pub trait ToLength {
    fn to_length(&self) -> usize;
}

macro_rules! impl_to_length {
    ($($t:ty),+) => {
        $(
            impl ToLength for $t {
                fn to_length(&self) -> usize {
                    *self as usize
                }
            }
        )+
    };
}

impl_to_length!(u8, u16, u32, usize);

use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

/// The first byte of every host↔controller message: whether it is a request
/// or the synchronous answer to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum MessageType {
    Request = 0x00,
    Response = 0x01,
}

impl ParsableEnum for MessageType {
    const LABEL: &'static str = "message type";
}

impl Parsable for MessageType {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for MessageType {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}

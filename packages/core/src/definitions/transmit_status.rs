use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

/// The outcome the controller reports for a correlated SEND_DATA call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum TransmitStatus {
    Ok = 0x00,
    NoAck = 0x01,
    Fail = 0x02,
    NotIdle = 0x03,
    NoRoute = 0x04,
}

impl ParsableEnum for TransmitStatus {
    const LABEL: &'static str = "transmit status";
}

impl Parsable for TransmitStatus {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for TransmitStatus {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}

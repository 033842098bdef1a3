use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

/// The status byte of an APPLICATION_UPDATE request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum UpdateState {
    SucIdReceived = 0x10,
    DeleteDone = 0x20,
    NewIdAssigned = 0x40,
    RoutingPending = 0x80,
    NodeInfoRequestFailed = 0x81,
    NodeInfoRequestDone = 0x82,
    NodeInfoReceived = 0x84,
}

impl ParsableEnum for UpdateState {
    const LABEL: &'static str = "update state";
}

impl Parsable for UpdateState {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for UpdateState {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}

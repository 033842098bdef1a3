use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum LibraryType {
    Unknown = 0,
    StaticController = 1,
    Controller = 2,
    EnhancedSlave = 3,
    Slave = 4,
    Installer = 5,
    RoutingSlave = 6,
    BridgeController = 7,
    DeviceUnderTest = 8,
    NotApplicable = 9,
    AvRemote = 10,
    AvDevice = 11,
}

impl ParsableEnum for LibraryType {
    const LABEL: &'static str = "library type";
}

impl Parsable for LibraryType {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for LibraryType {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}

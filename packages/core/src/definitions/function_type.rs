use crate::parse::{self, Parsable, ParsableEnum, ParseResult};
use crate::serialize::{self, Serializable};
use bytes::Bytes;
use derive_try_from_primitive::TryFromPrimitive;

/// The host↔controller function classes this driver speaks. The controller
/// may support more; those are tracked by their raw byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, TryFromPrimitive)]
#[repr(u8)]
pub enum FunctionType {
    GetSerialApiInitData = 0x02,
    ApplicationCommandHandler = 0x04,
    SetSerialApiTimeouts = 0x06,
    GetSerialApiCapabilities = 0x07,
    SendNodeInformation = 0x12,
    SendData = 0x13,
    GetVersion = 0x15,
    MemoryGetId = 0x20,
    GetNodeProtocolInfo = 0x41,
    DeleteReturnRoute = 0x47,
    ApplicationUpdate = 0x49,
    RequestNodeInfo = 0x60,
    GetRoutingTableLine = 0x80,
}

impl FunctionType {
    pub const ALL: [FunctionType; 13] = [
        FunctionType::GetSerialApiInitData,
        FunctionType::ApplicationCommandHandler,
        FunctionType::SetSerialApiTimeouts,
        FunctionType::GetSerialApiCapabilities,
        FunctionType::SendNodeInformation,
        FunctionType::SendData,
        FunctionType::GetVersion,
        FunctionType::MemoryGetId,
        FunctionType::GetNodeProtocolInfo,
        FunctionType::DeleteReturnRoute,
        FunctionType::ApplicationUpdate,
        FunctionType::RequestNodeInfo,
        FunctionType::GetRoutingTableLine,
    ];
}

impl ParsableEnum for FunctionType {
    const LABEL: &'static str = "function type";
}

impl Parsable for FunctionType {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        parse::enum_u8(i)
    }
}

impl Serializable for FunctionType {
    fn serialize(&self, output: &mut bytes::BytesMut) {
        serialize::bytes::be_u8(*self as u8).serialize(output);
    }
}

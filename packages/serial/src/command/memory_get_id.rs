use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::{be_u32, be_u8};
use wavez_core::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryGetIdRequest {}

impl MessageId for MemoryGetIdRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::MemoryGetId
    }
}

impl MessageRequest for MemoryGetIdRequest {}

impl Serializable for MemoryGetIdRequest {
    fn serialize(&self, output: &mut BytesMut) {
        message_header(self.message_type(), self.function_type()).serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryGetIdResponse {
    #[debug(format = "{:#010x}")]
    pub home_id: u32,
    pub controller_node_id: u8,
}

impl MessageId for MemoryGetIdResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::MemoryGetId
    }
}

impl Parsable for MemoryGetIdResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            home_id: be_u32(i)?,
            controller_node_id: be_u8(i)?,
        })
    }
}

impl Serializable for MemoryGetIdResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u32, be_u8},
            sequence::tuple,
        };

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u32(self.home_id),
            be_u8(self.controller_node_id),
        ))
        .serialize(output);
    }
}

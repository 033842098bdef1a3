use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReturnRouteRequest {
    pub node_id: NodeId,
    pub func_id: u8,
}

impl MessageId for DeleteReturnRouteRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::DeleteReturnRoute
    }
}

impl MessageRequest for DeleteReturnRouteRequest {
    fn node_id(&self) -> Option<NodeId> {
        Some(self.node_id)
    }
}

impl Serializable for DeleteReturnRouteRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.node_id,
            be_u8(self.func_id),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReturnRouteResponse {
    pub ret_val: bool,
}

impl MessageId for DeleteReturnRouteResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::DeleteReturnRoute
    }
}

impl Parsable for DeleteReturnRouteResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            ret_val: be_u8(i)? != 0,
        })
    }
}

impl Serializable for DeleteReturnRouteResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.ret_val as u8),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReturnRouteCallback {
    pub func_id: u8,
    pub status: u8,
}

impl MessageId for DeleteReturnRouteCallback {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::DeleteReturnRoute
    }
}

impl Parsable for DeleteReturnRouteCallback {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            func_id: be_u8(i)?,
            status: be_u8(i)?,
        })
    }
}

impl Serializable for DeleteReturnRouteCallback {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.func_id),
            be_u8(self.status),
        ))
        .serialize(output);
    }
}

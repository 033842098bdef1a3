use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

/// Asks a node to send its node information frame. The answer arrives as an
/// APPLICATION_UPDATE, not correlated to this request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNodeInfoRequest {
    pub node_id: NodeId,
}

impl MessageId for RequestNodeInfoRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::RequestNodeInfo
    }
}

impl MessageRequest for RequestNodeInfoRequest {}

impl Serializable for RequestNodeInfoRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.node_id,
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestNodeInfoResponse {
    pub success: bool,
}

impl MessageId for RequestNodeInfoResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::RequestNodeInfo
    }
}

impl Parsable for RequestNodeInfoResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            success: be_u8(i)? != 0,
        })
    }
}

impl Serializable for RequestNodeInfoResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.success as u8),
        ))
        .serialize(output);
    }
}

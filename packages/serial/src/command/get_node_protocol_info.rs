use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetNodeProtocolInfoRequest {
    pub node_id: NodeId,
}

impl MessageId for GetNodeProtocolInfoRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetNodeProtocolInfo
    }
}

impl MessageRequest for GetNodeProtocolInfoRequest {}

impl Serializable for GetNodeProtocolInfoRequest {
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
pub struct GetNodeProtocolInfoResponse {
    pub info: NodeProtocolInfo,
}

impl MessageId for GetNodeProtocolInfoResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetNodeProtocolInfo
    }
}

impl Parsable for GetNodeProtocolInfoResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            info: NodeProtocolInfo::parse(i)?,
        })
    }
}

impl Serializable for GetNodeProtocolInfoResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.info,
        ))
        .serialize(output);
    }
}

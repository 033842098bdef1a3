use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding;
use wavez_core::prelude::*;

const ROUTING_BITMASK_BYTES: usize = 29;

/// Reads one line of the controller's routing table: the neighbors of the
/// given node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetRoutingTableLineRequest {
    pub node_id: NodeId,
    pub remove_bad: bool,
    pub remove_non_repeaters: bool,
}

impl MessageId for GetRoutingTableLineRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetRoutingTableLine
    }
}

impl MessageRequest for GetRoutingTableLineRequest {}

impl Serializable for GetRoutingTableLineRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.node_id,
            be_u8(self.remove_bad as u8),
            be_u8(self.remove_non_repeaters as u8),
            // trailing func id slot is always zero
            be_u8(0),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetRoutingTableLineResponse {
    /// Neighbor node ids decoded from the 29-byte bitmask
    pub nodes: Vec<u8>,
}

impl MessageId for GetRoutingTableLineResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetRoutingTableLine
    }
}

impl Parsable for GetRoutingTableLineResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            nodes: encoding::parse_bitmask(i, ROUTING_BITMASK_BYTES, 1)?,
        })
    }
}

impl Serializable for GetRoutingTableLineResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;

        tuple((
            message_header(self.message_type(), self.function_type()),
            encoding::bitmask(&self.nodes, Some(ROUTING_BITMASK_BYTES), 1),
        ))
        .serialize(output);
    }
}

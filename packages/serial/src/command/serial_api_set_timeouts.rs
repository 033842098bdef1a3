use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

/// Timeout values are in units of 10 ms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialApiSetTimeoutsRequest {
    pub rx_ack_timeout: u8,
    pub rx_byte_timeout: u8,
}

impl MessageId for SerialApiSetTimeoutsRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SetSerialApiTimeouts
    }
}

impl MessageRequest for SerialApiSetTimeoutsRequest {}

impl Serializable for SerialApiSetTimeoutsRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.rx_ack_timeout),
            be_u8(self.rx_byte_timeout),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialApiSetTimeoutsResponse {
    pub old_rx_ack_timeout: u8,
    pub old_rx_byte_timeout: u8,
}

impl MessageId for SerialApiSetTimeoutsResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SetSerialApiTimeouts
    }
}

impl Parsable for SerialApiSetTimeoutsResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            old_rx_ack_timeout: be_u8(i)?,
            old_rx_byte_timeout: be_u8(i)?,
        })
    }
}

impl Serializable for SerialApiSetTimeoutsResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.old_rx_ack_timeout),
            be_u8(self.old_rx_byte_timeout),
        ))
        .serialize(output);
    }
}

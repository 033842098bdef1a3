use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::{be_u8, rest};
use wavez_core::prelude::*;

fn hex_fmt<T: AsRef<[u8]>>(n: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(n))
}

/// Broadcasts the controller's node information frame to `dest_node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendNodeInformationRequest {
    pub dest_node: NodeId,
    pub tx_options: TransmitOptions,
    pub func_id: u8,
}

impl MessageId for SendNodeInformationRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendNodeInformation
    }
}

impl MessageRequest for SendNodeInformationRequest {
    fn node_id(&self) -> Option<NodeId> {
        Some(self.dest_node)
    }
}

impl Serializable for SendNodeInformationRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.dest_node,
            self.tx_options,
            be_u8(self.func_id),
        ))
        .serialize(output);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendNodeInformationResponse {
    pub ret_val: bool,
}

impl MessageId for SendNodeInformationResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendNodeInformation
    }
}

impl Parsable for SendNodeInformationResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            ret_val: be_u8(i)? != 0,
        })
    }
}

impl Serializable for SendNodeInformationResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.ret_val as u8),
        ))
        .serialize(output);
    }
}

#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct SendNodeInformationCallback {
    pub func_id: u8,
    pub tx_status: TransmitStatus,
    #[debug(with = "hex_fmt")]
    pub extra_data: Bytes,
}

impl MessageId for SendNodeInformationCallback {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendNodeInformation
    }
}

impl Parsable for SendNodeInformationCallback {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            func_id: be_u8(i)?,
            tx_status: TransmitStatus::parse(i)?,
            extra_data: rest(i)?,
        })
    }
}

impl Serializable for SendNodeInformationCallback {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.func_id),
            self.tx_status,
            slice(&self.extra_data),
        ))
        .serialize(output);
    }
}

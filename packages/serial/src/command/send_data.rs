use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::{be_u8, rest, take};
use wavez_core::prelude::*;

fn hex_fmt<T: AsRef<[u8]>>(n: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(n))
}

/// Sends a command class payload to a node. The controller answers with a
/// synchronous accept/reject response and, once the radio transaction ends,
/// a callback correlated by `func_id`.
#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct SendDataRequest {
    pub node_id: NodeId,
    #[debug(with = "hex_fmt")]
    pub data: Bytes,
    pub tx_options: TransmitOptions,
    pub func_id: u8,
}

impl MessageId for SendDataRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendData
    }
}

impl MessageRequest for SendDataRequest {
    fn node_id(&self) -> Option<NodeId> {
        Some(self.node_id)
    }
}

impl Parsable for SendDataRequest {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let node_id = NodeId::parse(i)?;
        let data_length = be_u8(i)?;
        let data = take(data_length).parse(i)?;
        let tx_options = TransmitOptions::parse(i)?;
        let func_id = be_u8(i)?;
        Ok(Self {
            node_id,
            data,
            tx_options,
            func_id,
        })
    }
}

impl Serializable for SendDataRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.node_id,
            be_u8(self.data.len() as u8),
            slice(&self.data),
            self.tx_options,
            be_u8(self.func_id),
        ))
        .serialize(output);
    }
}

/// Whether the controller accepted the SEND_DATA for transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendDataResponse {
    pub ret_val: bool,
}

impl MessageId for SendDataResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendData
    }
}

impl Parsable for SendDataResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            ret_val: be_u8(i)? != 0,
        })
    }
}

impl Serializable for SendDataResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.ret_val as u8),
        ))
        .serialize(output);
    }
}

/// The asynchronous completion report of a SEND_DATA call.
#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct SendDataCallback {
    pub func_id: u8,
    pub tx_status: TransmitStatus,
    #[debug(with = "hex_fmt")]
    pub extra_data: Bytes,
}

impl MessageId for SendDataCallback {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::SendData
    }
}

impl Parsable for SendDataCallback {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            func_id: be_u8(i)?,
            tx_status: TransmitStatus::parse(i)?,
            extra_data: rest(i)?,
        })
    }
}

impl Serializable for SendDataCallback {
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_request_serialize() {
        let req = SendDataRequest {
            node_id: NodeId::new(9).unwrap(),
            data: Bytes::from_static(&[0x25, 0x01, 0xff]),
            tx_options: TransmitOptions::new().ack(true).auto_route(true),
            func_id: 0x17,
        };
        assert_eq!(
            req.as_bytes().as_ref(),
            hex::decode("001309032501ff0517").unwrap()
        );
    }

    #[test]
    fn test_callback_roundtrip() {
        let data = hex::decode("001317010000").unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::SendDataCallback(cb) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(cb.func_id, 0x17);
        assert_eq!(cb.tx_status, TransmitStatus::NoAck);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

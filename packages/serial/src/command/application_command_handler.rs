use crate::command::{message_header, MessageId};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::bytes::{be_u8, take};
use wavez_core::prelude::*;

fn hex_fmt<T: AsRef<[u8]>>(n: &T, f: &mut std::fmt::Formatter) -> std::fmt::Result {
    write!(f, "0x{}", hex::encode(n))
}

/// An unsolicited command from a node, carrying a raw command class payload.
#[derive(custom_debug_derive::Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCommandHandlerRequest {
    pub status: u8,
    pub node_id: u8,
    #[debug(with = "hex_fmt")]
    pub payload: Bytes,
}

impl MessageId for ApplicationCommandHandlerRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::ApplicationCommandHandler
    }
}

impl Parsable for ApplicationCommandHandlerRequest {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let status = be_u8(i)?;
        let node_id = be_u8(i)?;
        let payload_length = be_u8(i)?;
        let payload = take(payload_length).parse(i)?;
        Ok(Self {
            status,
            node_id,
            payload,
        })
    }
}

impl Serializable for ApplicationCommandHandlerRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.status),
            be_u8(self.node_id),
            be_u8(self.payload.len() as u8),
            slice(&self.payload),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_roundtrip() {
        // Node 9 reports BASIC Report value 0xff
        let data = hex::decode("010400090320 03ff".replace(' ', "")).unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::ApplicationCommandHandlerRequest(req) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(req.node_id, 9);
        assert_eq!(req.payload.as_ref(), &[0x20, 0x03, 0xff]);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

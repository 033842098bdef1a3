use crate::command::{message_header, MessageId};
use bytes::{Bytes, BytesMut};
use wavez_core::parse::{bytes::be_u8, combinators::cond, Parser};
use wavez_core::prelude::*;

/// Node information broadcast by the controller, e.g. after a node's NIF was
/// received. The basic/generic/specific triple is optional and its presence
/// is derived from the length byte; short payloads are tolerated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationUpdateRequest {
    pub status: UpdateState,
    pub node_id: u8,
    pub basic_device_class: Option<u8>,
    pub generic_device_class: Option<u8>,
    pub specific_device_class: Option<u8>,
    pub command_classes: Vec<u8>,
}

impl MessageId for ApplicationUpdateRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::ApplicationUpdate
    }
}

impl Parsable for ApplicationUpdateRequest {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let status = UpdateState::parse(i)?;
        let node_id = be_u8(i)?;
        let data_length = be_u8(i)? as usize;
        let basic_device_class = cond(data_length > 0, be_u8).parse(i)?;
        let generic_device_class = cond(data_length > 1, be_u8).parse(i)?;
        let specific_device_class = cond(data_length > 2, be_u8).parse(i)?;
        let mut command_classes = Vec::with_capacity(data_length.saturating_sub(3));
        for _ in 0..data_length.saturating_sub(3) {
            command_classes.push(be_u8(i)?);
        }
        Ok(Self {
            status,
            node_id,
            basic_device_class,
            generic_device_class,
            specific_device_class,
            command_classes,
        })
    }
}

impl Serializable for ApplicationUpdateRequest {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u8, slice},
            sequence::tuple,
        };

        let data_length = self.command_classes.len()
            + self.basic_device_class.is_some() as usize
            + self.generic_device_class.is_some() as usize
            + self.specific_device_class.is_some() as usize;

        tuple((
            message_header(self.message_type(), self.function_type()),
            self.status,
            be_u8(self.node_id),
            be_u8(data_length as u8),
            self.basic_device_class.map(be_u8),
            self.generic_device_class.map(be_u8),
            self.specific_device_class.map(be_u8),
            slice(&self.command_classes),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_node_info_received() {
        // Node 9, basic/generic/specific 04/10/01, classes 25 27 75 ef 20
        let data = hex::decode("0149840908041001252775ef20").unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::ApplicationUpdateRequest(req) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(req.status, UpdateState::NodeInfoReceived);
        assert_eq!(req.node_id, 9);
        assert_eq!(req.basic_device_class, Some(0x04));
        assert_eq!(req.generic_device_class, Some(0x10));
        assert_eq!(req.specific_device_class, Some(0x01));
        assert_eq!(req.command_classes, vec![0x25, 0x27, 0x75, 0xef, 0x20]);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }

    #[test]
    fn test_short_payload() {
        // Request-failed update with no device classes at all
        let data = hex::decode("0149810000").unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::ApplicationUpdateRequest(req) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(req.status, UpdateState::NodeInfoRequestFailed);
        assert_eq!(req.basic_device_class, None);
        assert_eq!(req.generic_device_class, None);
        assert_eq!(req.specific_device_class, None);
        assert!(req.command_classes.is_empty());
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

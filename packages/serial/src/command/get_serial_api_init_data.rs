use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding;
use wavez_core::parse::bytes::be_u8;
use wavez_core::prelude::*;

/// The number of bitmask bytes the controller reports its node list in.
const NODE_BITFIELD_BYTES: usize = 29;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetSerialApiInitDataRequest {}

impl MessageId for GetSerialApiInitDataRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetSerialApiInitData
    }
}

impl MessageRequest for GetSerialApiInitDataRequest {}

impl Serializable for GetSerialApiInitDataRequest {
    fn serialize(&self, output: &mut BytesMut) {
        message_header(self.message_type(), self.function_type()).serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSerialApiInitDataResponse {
    pub serial_api_application_version: u8,
    pub is_slave: bool,
    pub timer_support: bool,
    pub is_secondary: bool,
    pub is_sis: bool,
    /// Ids of the nodes present in the network, from the 29-byte bitmask
    pub nodes: Vec<u8>,
    pub chip_type: u8,
    pub chip_version: u8,
}

impl MessageId for GetSerialApiInitDataResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetSerialApiInitData
    }
}

impl Parsable for GetSerialApiInitDataResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        let serial_api_application_version = be_u8(i)?;
        let flags = be_u8(i)?;
        let bitfield_bytes = be_u8(i)? as usize;
        let nodes = encoding::parse_bitmask(i, bitfield_bytes, 1)?;
        let chip_type = be_u8(i)?;
        let chip_version = be_u8(i)?;

        Ok(Self {
            serial_api_application_version,
            is_slave: flags & 0x01 != 0,
            timer_support: flags & 0x02 != 0,
            is_secondary: flags & 0x04 != 0,
            is_sis: flags & 0x08 != 0,
            nodes,
            chip_type,
            chip_version,
        })
    }
}

impl Serializable for GetSerialApiInitDataResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{bytes::be_u8, sequence::tuple};

        let mut flags = 0u8;
        if self.is_slave {
            flags |= 0x01;
        }
        if self.timer_support {
            flags |= 0x02;
        }
        if self.is_secondary {
            flags |= 0x04;
        }
        if self.is_sis {
            flags |= 0x08;
        }

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.serial_api_application_version),
            be_u8(flags),
            be_u8(NODE_BITFIELD_BYTES as u8),
            encoding::bitmask(&self.nodes, Some(NODE_BITFIELD_BYTES), 1),
            be_u8(self.chip_type),
            be_u8(self.chip_version),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_init_data_response() {
        let data = hex::decode(concat!(
            "010205001dadff3f000000000000000000000000",
            "00000000000000000000000000000500",
        ))
        .unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::GetSerialApiInitDataResponse(resp) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(resp.serial_api_application_version, 5);
        assert!(!resp.is_slave);
        assert!(!resp.timer_support);
        assert!(!resp.is_secondary);
        assert!(!resp.is_sis);
        assert_eq!(
            resp.nodes,
            vec![1, 3, 4, 6, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22]
        );
        assert_eq!(resp.chip_type, 5);
        assert_eq!(resp.chip_version, 0);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

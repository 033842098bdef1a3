use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding;
use wavez_core::parse::bytes::{be_u16, be_u8};
use wavez_core::prelude::*;

const FUNCTION_BITMASK_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetSerialApiCapabilitiesRequest {}

impl MessageId for GetSerialApiCapabilitiesRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetSerialApiCapabilities
    }
}

impl MessageRequest for GetSerialApiCapabilitiesRequest {}

impl Serializable for GetSerialApiCapabilitiesRequest {
    fn serialize(&self, output: &mut BytesMut) {
        message_header(self.message_type(), self.function_type()).serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetSerialApiCapabilitiesResponse {
    pub serial_api_version: u8,
    pub serial_api_revision: u8,
    pub manufacturer_id: u16,
    pub manufacturer_product: u16,
    pub manufacturer_product_id: u16,
    /// Function class bytes the controller implements
    pub supported_functions: Vec<u8>,
}

impl MessageId for GetSerialApiCapabilitiesResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetSerialApiCapabilities
    }
}

impl Parsable for GetSerialApiCapabilitiesResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            serial_api_version: be_u8(i)?,
            serial_api_revision: be_u8(i)?,
            manufacturer_id: be_u16(i)?,
            manufacturer_product: be_u16(i)?,
            manufacturer_product_id: be_u16(i)?,
            supported_functions: encoding::parse_bitmask(i, FUNCTION_BITMASK_BYTES, 1)?,
        })
    }
}

impl Serializable for GetSerialApiCapabilitiesResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::{
            bytes::{be_u16, be_u8},
            sequence::tuple,
        };

        tuple((
            message_header(self.message_type(), self.function_type()),
            be_u8(self.serial_api_version),
            be_u8(self.serial_api_revision),
            be_u16(self.manufacturer_id),
            be_u16(self.manufacturer_product),
            be_u16(self.manufacturer_product_id),
            encoding::bitmask(
                &self.supported_functions,
                Some(FUNCTION_BITMASK_BYTES),
                1,
            ),
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_capabilities_response() {
        let data = hex::decode(concat!(
            "0107aabb12345678abcd00020820800002000000",
            "0000000000000000000000000000000000000000",
            "0000",
        ))
        .unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::GetSerialApiCapabilitiesResponse(resp) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(resp.serial_api_version, 0xaa);
        assert_eq!(resp.serial_api_revision, 0xbb);
        assert_eq!(resp.manufacturer_id, 0x1234);
        assert_eq!(resp.manufacturer_product, 0x5678);
        assert_eq!(resp.manufacturer_product_id, 0xabcd);
        assert_eq!(resp.supported_functions, vec![10, 20, 30, 40, 50]);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

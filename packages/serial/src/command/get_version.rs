use crate::command::{message_header, MessageId, MessageRequest};
use bytes::{Bytes, BytesMut};
use wavez_core::encoding;
use wavez_core::prelude::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GetVersionRequest {}

impl MessageId for GetVersionRequest {
    fn message_type(&self) -> MessageType {
        MessageType::Request
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetVersion
    }
}

impl MessageRequest for GetVersionRequest {}

impl Serializable for GetVersionRequest {
    fn serialize(&self, output: &mut BytesMut) {
        message_header(self.message_type(), self.function_type()).serialize(output);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetVersionResponse {
    pub library_version: String,
    pub library_type: LibraryType,
}

impl MessageId for GetVersionResponse {
    fn message_type(&self) -> MessageType {
        MessageType::Response
    }

    fn function_type(&self) -> FunctionType {
        FunctionType::GetVersion
    }
}

impl Parsable for GetVersionResponse {
    fn parse(i: &mut Bytes) -> ParseResult<Self> {
        Ok(Self {
            library_version: encoding::parse_nul_terminated_string(i)?,
            library_type: LibraryType::parse(i)?,
        })
    }
}

impl Serializable for GetVersionResponse {
    fn serialize(&self, output: &mut BytesMut) {
        use serialize::sequence::tuple;

        tuple((
            message_header(self.message_type(), self.function_type()),
            encoding::nul_terminated_string(&self.library_version),
            self.library_type,
        ))
        .serialize(output);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Message;

    #[test]
    fn test_get_version_response() {
        let data = hex::decode("01155a2d5761766520342e30350001").unwrap();
        let msg = Message::from_bytes(&data).unwrap();
        let Message::GetVersionResponse(resp) = &msg else {
            panic!("wrong message variant: {msg:?}");
        };
        assert_eq!(resp.library_version, "Z-Wave 4.05");
        assert_eq!(resp.library_type, LibraryType::StaticController);
        assert_eq!(msg.as_bytes().as_ref(), data.as_slice());
    }
}

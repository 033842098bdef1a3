use bytes::{Bytes, BytesMut};
use tracing::warn;
use wavez_core::prelude::*;

mod application_command_handler;
mod application_update;
mod delete_return_route;
mod get_node_protocol_info;
mod get_routing_table_line;
mod get_serial_api_capabilities;
mod get_serial_api_init_data;
mod get_version;
mod memory_get_id;
mod request_node_info;
mod send_data;
mod send_node_information;
mod serial_api_set_timeouts;

pub use application_command_handler::*;
pub use application_update::*;
pub use delete_return_route::*;
pub use get_node_protocol_info::*;
pub use get_routing_table_line::*;
pub use get_serial_api_capabilities::*;
pub use get_serial_api_init_data::*;
pub use get_version::*;
pub use memory_get_id::*;
pub use request_node_info::*;
pub use send_data::*;
pub use send_node_information::*;
pub use serial_api_set_timeouts::*;

pub trait MessageId {
    fn message_type(&self) -> MessageType;
    fn function_type(&self) -> FunctionType;
}

/// An outbound host→controller request. Serialization yields the full
/// message bytes: type, function class, payload.
pub trait MessageRequest: MessageId + Serializable + Send + Sync + std::fmt::Debug {
    /// The node this request addresses, if any
    fn node_id(&self) -> Option<NodeId> {
        None
    }
}

/// Writes the two-byte message header every message starts with.
pub(crate) fn message_header(
    message_type: MessageType,
    function_type: FunctionType,
) -> impl Serializable {
    move |output: &mut BytesMut| {
        message_type.serialize(output);
        function_type.serialize(output);
    }
}

macro_rules! message_enum {
    ( $( $variant:ident ),+ $(,)? ) => {
        /// Every inbound message the driver understands, decoded from raw
        /// frame payloads.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Message {
            $( $variant($variant), )+
        }

        impl MessageId for Message {
            fn message_type(&self) -> MessageType {
                match self { $( Message::$variant(m) => m.message_type(), )+ }
            }

            fn function_type(&self) -> FunctionType {
                match self { $( Message::$variant(m) => m.function_type(), )+ }
            }
        }

        impl Serializable for Message {
            fn serialize(&self, output: &mut BytesMut) {
                match self { $( Message::$variant(m) => m.serialize(output), )+ }
            }
        }

        $(
            impl From<$variant> for Message {
                fn from(m: $variant) -> Self {
                    Message::$variant(m)
                }
            }

            impl TryFrom<Message> for $variant {
                type Error = Message;

                fn try_from(m: Message) -> Result<Self, Message> {
                    match m {
                        Message::$variant(m) => Ok(m),
                        other => Err(other),
                    }
                }
            }
        )+
    };
}

message_enum! {
    GetSerialApiInitDataResponse,
    ApplicationCommandHandlerRequest,
    SerialApiSetTimeoutsResponse,
    GetSerialApiCapabilitiesResponse,
    SendNodeInformationResponse,
    SendNodeInformationCallback,
    SendDataResponse,
    SendDataCallback,
    GetVersionResponse,
    MemoryGetIdResponse,
    GetNodeProtocolInfoResponse,
    DeleteReturnRouteResponse,
    DeleteReturnRouteCallback,
    ApplicationUpdateRequest,
    RequestNodeInfoResponse,
    GetRoutingTableLineResponse,
}

impl Message {
    /// Decodes an inbound message from a frame payload.
    pub fn parse(i: &mut Bytes) -> ParseResult<Self> {
        use FunctionType::*;
        use MessageType::*;

        let message_type = MessageType::parse(i)?;
        let function_type = FunctionType::parse(i)?;
        let msg = match (message_type, function_type) {
            (Response, GetSerialApiInitData) => GetSerialApiInitDataResponse::parse(i)?.into(),
            (Request, ApplicationCommandHandler) => {
                ApplicationCommandHandlerRequest::parse(i)?.into()
            }
            (Response, SetSerialApiTimeouts) => SerialApiSetTimeoutsResponse::parse(i)?.into(),
            (Response, GetSerialApiCapabilities) => {
                GetSerialApiCapabilitiesResponse::parse(i)?.into()
            }
            (Response, SendNodeInformation) => SendNodeInformationResponse::parse(i)?.into(),
            (Request, SendNodeInformation) => SendNodeInformationCallback::parse(i)?.into(),
            (Response, SendData) => SendDataResponse::parse(i)?.into(),
            (Request, SendData) => SendDataCallback::parse(i)?.into(),
            (Response, GetVersion) => GetVersionResponse::parse(i)?.into(),
            (Response, MemoryGetId) => MemoryGetIdResponse::parse(i)?.into(),
            (Response, GetNodeProtocolInfo) => GetNodeProtocolInfoResponse::parse(i)?.into(),
            (Response, DeleteReturnRoute) => DeleteReturnRouteResponse::parse(i)?.into(),
            (Request, DeleteReturnRoute) => DeleteReturnRouteCallback::parse(i)?.into(),
            (Request, ApplicationUpdate) => ApplicationUpdateRequest::parse(i)?.into(),
            (Response, RequestNodeInfo) => RequestNodeInfoResponse::parse(i)?.into(),
            (Response, GetRoutingTableLine) => GetRoutingTableLineResponse::parse(i)?.into(),
            (t, f) => {
                return Err(ParseError::recoverable(format!(
                    "no inbound message for {t:?} {f:?}"
                )));
            }
        };
        Ok(msg)
    }

    /// Decodes a standalone frame payload, warning about trailing bytes.
    pub fn from_bytes(data: &[u8]) -> ParseResult<Self> {
        let mut i = Bytes::copy_from_slice(data);
        let msg = Self::parse(&mut i)?;
        if !i.is_empty() {
            warn!(
                "{} trailing bytes after {:?} message",
                i.len(),
                msg.function_type()
            );
        }
        Ok(msg)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unknown_message_class() {
        // 0x03 is not a function class this driver knows
        let data = hex::decode("010345").unwrap();
        assert!(Message::from_bytes(&data).is_err());
    }

    #[test]
    fn test_short_message() {
        assert!(Message::from_bytes(&[0x01]).is_err());
    }
}

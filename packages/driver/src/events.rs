use wavez_cc::commandclass::Command;
use wavez_core::definitions::{NodeId, NodeProtocolInfo};
use wavez_serial::command::Message;

/// Facts learned about a node, published on the controller's output stream.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeUpdate {
    ProtocolInfo {
        node_id: NodeId,
        info: NodeProtocolInfo,
    },
    CommandClass {
        node_id: NodeId,
        endpoint: u8,
        code: u8,
        version: Option<u8>,
        /// Whether the catalog can decode this class at the reported version
        decodable: bool,
    },
    ManufacturerInfo {
        node_id: NodeId,
        manufacturer_id: u16,
        product_type_id: u16,
        product_id: u16,
    },
}

/// A command from the network that no internal handler consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedCommand {
    pub node_id: NodeId,
    pub endpoint: u8,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    NodeUpdate(NodeUpdate),
    ReceivedCommand(ReceivedCommand),
    /// An inbound message nothing routed; kept for diagnostics
    Message(Message),
}

impl From<NodeUpdate> for ControllerEvent {
    fn from(update: NodeUpdate) -> Self {
        ControllerEvent::NodeUpdate(update)
    }
}

impl From<ReceivedCommand> for ControllerEvent {
    fn from(cmd: ReceivedCommand) -> Self {
        ControllerEvent::ReceivedCommand(cmd)
    }
}

impl From<Message> for ControllerEvent {
    fn from(msg: Message) -> Self {
        ControllerEvent::Message(msg)
    }
}

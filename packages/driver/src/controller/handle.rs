use crate::controller::ControllerOptions;
use crate::error::{Error, Result};
use crate::events::ControllerEvent;
use crate::func_id::FuncIdPool;
use crate::transmission::{MessageQueue, Priority, SimpleQueue, Transmission, TransmissionHandle};
use bytes::Bytes;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::Mutex as AsyncMutex;
use wavez_cc::commandclass::Command;
use wavez_core::definitions::{FunctionType, LibraryType, NodeId, TransmitOptions};
use wavez_core::event::Event;
use wavez_serial::command::{
    GetNodeProtocolInfoRequest, GetNodeProtocolInfoResponse, GetSerialApiInitDataResponse,
    Message, MessageId, MessageRequest, RequestNodeInfoRequest, RequestNodeInfoResponse,
    SendDataRequest, SendDataResponse,
};

pub(crate) type MessageTransmission = Transmission<Box<dyn MessageRequest>, Message>;
/// Node-queue items; `None` is the dispatcher-mode nudge inserted on the
/// first wake-up notification.
pub(crate) type CommandTransmission = Transmission<Option<Command>, ()>;

#[derive(Debug, Clone)]
pub(crate) struct SupportedFunctions {
    pub raw: BTreeSet<u8>,
    pub typed: BTreeSet<FunctionType>,
}

impl SupportedFunctions {
    pub fn supports(&self, function_type: FunctionType) -> bool {
        self.typed.contains(&function_type)
    }
}

/// Facts learned from the controller during bring-up. Written once by the
/// startup sequence or the init-data response handler.
#[derive(Default)]
pub(crate) struct ControllerStorage {
    pub manufacturer: OnceLock<(u16, u16, u16)>,
    pub serial_api_version: OnceLock<(u8, u8)>,
    pub supported_functions: OnceLock<SupportedFunctions>,
    pub home_id: OnceLock<Option<u32>>,
    pub controller_node_id: OnceLock<u8>,
    pub library: OnceLock<(String, LibraryType)>,
    pub api_init_data: Mutex<Option<GetSerialApiInitDataResponse>>,
}

/// State shared between the controller, its long-lived tasks and the nodes.
pub(crate) struct ControllerShared {
    pub mq: MessageQueue<MessageTransmission>,
    pub func_ids: Arc<FuncIdPool>,
    pub events: SimpleQueue<ControllerEvent>,
    pub initialization_required: Event,
    /// At most one node interviews via REQUEST_NODE_INFO at a time
    pub request_node_info_lock: AsyncMutex<()>,
    pub options: ControllerOptions,
    pub storage: ControllerStorage,
}

/// The node-facing surface of the controller: enqueue function calls, lease
/// func ids, publish events. Holding one does not keep nodes alive, so the
/// controller→node ownership stays acyclic.
#[derive(Clone)]
pub(crate) struct ControllerHandle {
    pub shared: Arc<ControllerShared>,
}

impl ControllerHandle {
    pub fn supports(&self, function_type: FunctionType) -> bool {
        self.shared
            .storage
            .supported_functions
            .get()
            .is_some_and(|s| s.supports(function_type))
    }

    /// Enqueues a request without consulting the supported-function set.
    /// Bring-up uses this before capabilities are known.
    pub fn send_message_unchecked(
        &self,
        message: Box<dyn MessageRequest>,
        priority: Priority,
    ) -> TransmissionHandle<Message> {
        let node_id = message.node_id();
        let (tx, handle) = Transmission::new(message, node_id, 0, priority);
        self.shared.mq.add(tx);
        handle
    }

    /// Enqueues a request, failing immediately when the controller did not
    /// advertise the function class.
    pub fn send_message(
        &self,
        message: Box<dyn MessageRequest>,
        priority: Priority,
    ) -> Result<TransmissionHandle<Message>> {
        let function_type = message.function_type();
        if !self.supports(function_type) {
            return Err(Error::NotImplemented(function_type));
        }
        Ok(self.send_message_unchecked(message, priority))
    }

    pub async fn call(
        &self,
        message: Box<dyn MessageRequest>,
        priority: Priority,
    ) -> Result<Message> {
        self.send_message(message, priority)?.wait().await
    }

    pub async fn call_typed<T>(
        &self,
        message: Box<dyn MessageRequest>,
        priority: Priority,
    ) -> Result<T>
    where
        T: TryFrom<Message, Error = Message>,
    {
        let response = self.call(message, priority).await?;
        T::try_from(response).map_err(|other| Error::UnexpectedResponse(other.function_type()))
    }

    pub async fn get_node_protocol_info(
        &self,
        node_id: NodeId,
    ) -> Result<GetNodeProtocolInfoResponse> {
        self.call_typed(
            Box::new(GetNodeProtocolInfoRequest { node_id }),
            Priority::DEFAULT,
        )
        .await
    }

    pub async fn request_node_info(&self, node_id: NodeId) -> Result<RequestNodeInfoResponse> {
        self.call_typed(
            Box::new(RequestNodeInfoRequest { node_id }),
            Priority::DEFAULT,
        )
        .await
    }

    pub async fn send_data(
        &self,
        node_id: NodeId,
        data: Bytes,
        tx_options: TransmitOptions,
        func_id: u8,
    ) -> Result<SendDataResponse> {
        self.call_typed(
            Box::new(SendDataRequest {
                node_id,
                data,
                tx_options,
                func_id,
            }),
            Priority::DEFAULT,
        )
        .await
    }

    /// A node reported a wake-up notification; let the interview scheduler
    /// reconsider if that node still needs initialization.
    pub fn wake_up_notification(&self, initialization_pending: bool) {
        if initialization_pending {
            self.shared.initialization_required.set();
        }
    }
}

use crate::error::{Error, Result};
use crate::events::ControllerEvent;
use crate::func_id::FuncIdPool;
use crate::node::Node;
use crate::transmission::{MessageQueue, Priority, SimpleQueue, TransmissionHandle};
use bytes::Bytes;
use handle::{ControllerHandle, ControllerShared, ControllerStorage, SupportedFunctions};
use interview_nodes::InterviewScheduler;
use main_loop::MainLoop;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;
use wavez_cc::commandclass::Command;
use wavez_core::definitions::{FunctionType, LibraryType, NodeId, TransmitOptions};
use wavez_core::event::Event;
use wavez_serial::binding::{open_serial_binding, SerialBinding};
use wavez_serial::command::{
    DeleteReturnRouteRequest, DeleteReturnRouteResponse, GetNodeProtocolInfoRequest,
    GetNodeProtocolInfoResponse, GetRoutingTableLineRequest, GetRoutingTableLineResponse,
    GetSerialApiCapabilitiesRequest, GetSerialApiCapabilitiesResponse,
    GetSerialApiInitDataRequest, GetSerialApiInitDataResponse, GetVersionRequest,
    GetVersionResponse, MemoryGetIdRequest, MemoryGetIdResponse, Message, MessageId,
    MessageRequest, RequestNodeInfoRequest, RequestNodeInfoResponse, SendDataRequest,
    SendDataResponse,
    SendNodeInformationRequest, SendNodeInformationResponse, SerialApiSetTimeoutsRequest,
    SerialApiSetTimeoutsResponse,
};
use wavez_serial::protocol::SerialProtocol;

pub(crate) mod handle;
mod interview_nodes;
mod main_loop;

/// Timeout knobs of the request/response machinery. The defaults match the
/// behaviour of the serial API.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ControllerOptions {
    /// How long the controller may take to answer an accepted REQUEST
    #[builder(default = Duration::from_secs(5))]
    pub response_timeout: Duration,
    /// Pause before resubmitting a failed message transmission
    #[builder(default = Duration::from_secs(1))]
    pub retransmit_pause: Duration,
    /// How long to wait for the SEND_DATA completion report
    #[builder(default = Duration::from_secs(65))]
    pub send_data_callback_timeout: Duration,
    /// How long a func id lease lives before the pool reclaims it
    #[builder(default = Duration::from_secs(90))]
    pub func_id_lease: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub(crate) struct NodeTable {
    nodes: Mutex<HashMap<u8, Arc<Node>>>,
}

impl NodeTable {
    fn new() -> Self {
        Self {
            nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<Arc<Node>> {
        self.nodes
            .lock()
            .expect("node table lock poisoned")
            .get(&id.get())
            .cloned()
    }

    pub fn all(&self) -> Vec<Arc<Node>> {
        self.nodes
            .lock()
            .expect("node table lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    fn insert(&self, node: Arc<Node>) -> bool {
        let mut nodes = self.nodes.lock().expect("node table lock poisoned");
        if nodes.contains_key(&node.id().get()) {
            return false;
        }
        nodes.insert(node.id().get(), node);
        true
    }
}

/// The host-side driver for a serial-attached Z-Wave controller. Constructing
/// one performs the bring-up conversation (capabilities, ids, version, node
/// list) and starts the background machinery: the controller I/O loop, the
/// node interview scheduler and one command dispatcher per node.
pub struct Controller {
    shared: Arc<ControllerShared>,
    sp: Arc<SerialProtocol>,
    nodes: Arc<NodeTable>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Opens `host:port` as a remote bridge, anything else as a local serial
    /// device.
    pub async fn connect(addr: &str) -> Result<Self> {
        let binding = open_serial_binding(addr).await.map_err(Error::Serial)?;
        Self::new(binding, ControllerOptions::default()).await
    }

    pub async fn new(binding: Box<dyn SerialBinding>, options: ControllerOptions) -> Result<Self> {
        let sp = Arc::new(SerialProtocol::new(binding));
        let shared = Arc::new(ControllerShared {
            mq: MessageQueue::new(),
            func_ids: Arc::new(FuncIdPool::new()),
            events: SimpleQueue::new(),
            initialization_required: Event::new(),
            request_node_info_lock: AsyncMutex::new(()),
            options,
            storage: ControllerStorage::default(),
        });
        let nodes = Arc::new(NodeTable::new());

        let main_loop = MainLoop::new(shared.clone(), sp.clone(), nodes.clone());
        let main_task = tokio::spawn(main_loop.run());

        let controller = Self {
            shared,
            sp,
            nodes,
            tasks: Mutex::new(vec![main_task]),
        };
        controller.identify().await?;

        let scheduler =
            InterviewScheduler::new(controller.shared.clone(), controller.nodes.clone());
        controller
            .tasks
            .lock()
            .expect("task list lock poisoned")
            .push(tokio::spawn(scheduler.run()));

        Ok(controller)
    }

    fn handle(&self) -> ControllerHandle {
        ControllerHandle {
            shared: self.shared.clone(),
        }
    }

    /// First-time bring-up: learn what the controller is and which functions
    /// it implements, then register all nodes it knows about.
    async fn identify(&self) -> Result<()> {
        let handle = self.handle();
        let storage = &self.shared.storage;

        let caps: GetSerialApiCapabilitiesResponse = {
            let response = handle
                .send_message_unchecked(
                    Box::new(GetSerialApiCapabilitiesRequest {}),
                    Priority::DEFAULT,
                )
                .wait()
                .await?;
            GetSerialApiCapabilitiesResponse::try_from(response)
                .map_err(|other| Error::UnexpectedResponse(other.function_type()))?
        };
        let _ = storage.manufacturer.set((
            caps.manufacturer_id,
            caps.manufacturer_product,
            caps.manufacturer_product_id,
        ));
        let _ = storage
            .serial_api_version
            .set((caps.serial_api_version, caps.serial_api_revision));

        let mut raw = BTreeSet::new();
        let mut typed = BTreeSet::new();
        for function in caps.supported_functions {
            raw.insert(function);
            match FunctionType::try_from(function) {
                Ok(ft) => {
                    typed.insert(ft);
                }
                Err(_) => debug!("Controller supports unknown message class {function:#04x}"),
            }
        }
        let _ = storage
            .supported_functions
            .set(SupportedFunctions { raw, typed });

        if handle.supports(FunctionType::MemoryGetId) {
            let ids: MemoryGetIdResponse = handle
                .call_typed(Box::new(MemoryGetIdRequest {}), Priority::DEFAULT)
                .await?;
            let _ = storage.home_id.set(Some(ids.home_id));
            let _ = storage.controller_node_id.set(ids.controller_node_id);
        } else {
            // best guess
            let _ = storage.home_id.set(None);
            let _ = storage.controller_node_id.set(1);
        }

        let version: GetVersionResponse = handle
            .call_typed(Box::new(GetVersionRequest {}), Priority::DEFAULT)
            .await?;
        let library_type = version.library_type;
        let _ = storage
            .library
            .set((version.library_version, library_type));

        let init_data: GetSerialApiInitDataResponse = handle
            .call_typed(Box::new(GetSerialApiInitDataRequest {}), Priority::DEFAULT)
            .await?;

        if library_type != LibraryType::BridgeController
            && handle.supports(FunctionType::SetSerialApiTimeouts)
        {
            let _: SerialApiSetTimeoutsResponse = handle
                .call_typed(
                    Box::new(SerialApiSetTimeoutsRequest {
                        rx_ack_timeout: 150,
                        rx_byte_timeout: 15,
                    }),
                    Priority::DEFAULT,
                )
                .await?;
        }

        let controller_node_id = *storage
            .controller_node_id
            .get()
            .expect("controller node id is set during identify");
        let mut ids = init_data.nodes.clone();
        ids.sort_unstable();
        for id in ids {
            if id == controller_node_id {
                continue;
            }
            match NodeId::new(id) {
                Ok(node_id) => self.add_node(node_id),
                Err(_) => warn!("Invalid node id {id}"),
            }
        }

        Ok(())
    }

    fn add_node(&self, id: NodeId) {
        let node = Node::new(id, self.handle());
        if !self.nodes.insert(node.clone()) {
            warn!("Tried to add already existing node {id}");
            node.shutdown();
            return;
        }
        self.shared.initialization_required.set();
    }

    // ---- identity -------------------------------------------------------

    pub fn home_id(&self) -> Option<u32> {
        self.shared.storage.home_id.get().copied().flatten()
    }

    pub fn controller_node_id(&self) -> u8 {
        self.shared
            .storage
            .controller_node_id
            .get()
            .copied()
            .unwrap_or(1)
    }

    pub fn library_type(&self) -> Option<LibraryType> {
        self.shared.storage.library.get().map(|(_, t)| *t)
    }

    pub fn library_version(&self) -> Option<String> {
        self.shared.storage.library.get().map(|(v, _)| v.clone())
    }

    pub fn manufacturer(&self) -> Option<(u16, u16, u16)> {
        self.shared.storage.manufacturer.get().copied()
    }

    /// The node ids present in the network per the last init data.
    pub fn node_ids(&self) -> Vec<u8> {
        self.shared
            .storage
            .api_init_data
            .lock()
            .expect("init data lock poisoned")
            .as_ref()
            .map(|d| d.nodes.clone())
            .unwrap_or_default()
    }

    pub fn supports(&self, function_type: FunctionType) -> bool {
        self.handle().supports(function_type)
    }

    // ---- function calls -------------------------------------------------

    /// Enqueues an arbitrary request at the given priority and returns the
    /// completion handle resolving to the RESPONSE. Fails immediately when
    /// the controller did not advertise the function class.
    pub fn send_message(
        &self,
        message: Box<dyn MessageRequest>,
        priority: Priority,
    ) -> Result<TransmissionHandle<Message>> {
        self.handle().send_message(message, priority)
    }

    pub async fn get_version(&self) -> Result<GetVersionResponse> {
        self.handle()
            .call_typed(Box::new(GetVersionRequest {}), Priority::DEFAULT)
            .await
    }

    pub async fn memory_get_id(&self) -> Result<MemoryGetIdResponse> {
        self.handle()
            .call_typed(Box::new(MemoryGetIdRequest {}), Priority::DEFAULT)
            .await
    }

    pub async fn get_serial_api_capabilities(&self) -> Result<GetSerialApiCapabilitiesResponse> {
        self.handle()
            .call_typed(
                Box::new(GetSerialApiCapabilitiesRequest {}),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn serial_api_get_init_data(&self) -> Result<GetSerialApiInitDataResponse> {
        self.handle()
            .call_typed(Box::new(GetSerialApiInitDataRequest {}), Priority::DEFAULT)
            .await
    }

    pub async fn serial_api_set_timeouts(
        &self,
        rx_ack_timeout: u8,
        rx_byte_timeout: u8,
    ) -> Result<SerialApiSetTimeoutsResponse> {
        self.handle()
            .call_typed(
                Box::new(SerialApiSetTimeoutsRequest {
                    rx_ack_timeout,
                    rx_byte_timeout,
                }),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn get_node_protocol_info(&self, node_id: u8) -> Result<GetNodeProtocolInfoResponse> {
        let node_id = NodeId::new(node_id)?;
        self.handle()
            .call_typed(
                Box::new(GetNodeProtocolInfoRequest { node_id }),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn request_node_info(&self, node_id: u8) -> Result<RequestNodeInfoResponse> {
        let node_id = NodeId::new(node_id)?;
        self.handle()
            .call_typed(
                Box::new(RequestNodeInfoRequest { node_id }),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn send_data(
        &self,
        node_id: u8,
        data: Bytes,
        tx_options: TransmitOptions,
        func_id: u8,
    ) -> Result<SendDataResponse> {
        let node_id = NodeId::new(node_id)?;
        self.handle()
            .call_typed(
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

    pub async fn send_node_information(
        &self,
        dest_node: u8,
        tx_options: TransmitOptions,
        func_id: u8,
    ) -> Result<SendNodeInformationResponse> {
        let dest_node = NodeId::new(dest_node)?;
        self.handle()
            .call_typed(
                Box::new(SendNodeInformationRequest {
                    dest_node,
                    tx_options,
                    func_id,
                }),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn delete_return_route(
        &self,
        node_id: u8,
        func_id: u8,
    ) -> Result<DeleteReturnRouteResponse> {
        let node_id = NodeId::new(node_id)?;
        self.handle()
            .call_typed(
                Box::new(DeleteReturnRouteRequest { node_id, func_id }),
                Priority::DEFAULT,
            )
            .await
    }

    pub async fn get_routing_table_line(
        &self,
        node_id: u8,
        remove_bad: bool,
        remove_non_repeaters: bool,
    ) -> Result<GetRoutingTableLineResponse> {
        let node_id = NodeId::new(node_id)?;
        self.handle()
            .call_typed(
                Box::new(GetRoutingTableLineRequest {
                    node_id,
                    remove_bad,
                    remove_non_repeaters,
                }),
                Priority::DEFAULT,
            )
            .await
    }

    /// Queues a command for a node. The node's dispatcher takes care of
    /// wake-up windows, multi-channel wrapping and retries.
    pub fn send_command(
        &self,
        node_id: u8,
        command: Command,
        endpoint: u8,
        priority: Priority,
    ) -> Result<TransmissionHandle<()>> {
        let node_id = NodeId::new(node_id)?;
        let node = self.nodes.get(node_id).ok_or(Error::UnknownNode(node_id))?;
        Ok(node.send_command(command, endpoint, priority))
    }

    // ---- output stream --------------------------------------------------

    pub fn has_message(&self) -> bool {
        self.shared.events.has_message()
    }

    pub async fn wait_for_message(&self) {
        self.shared.events.wait_for_message().await
    }

    pub fn take_message(&self) -> Option<ControllerEvent> {
        self.shared.events.take_message()
    }

    pub async fn next_event(&self) -> ControllerEvent {
        self.shared.events.get_message().await
    }

    /// Stops all background tasks and closes the transport.
    pub async fn shutdown(&self) {
        for task in self
            .tasks
            .lock()
            .expect("task list lock poisoned")
            .drain(..)
        {
            task.abort();
        }
        for node in self.nodes.all() {
            node.shutdown();
        }
        self.sp.close().await;
    }
}

use crate::controller::handle::{CommandTransmission, ControllerHandle};
use crate::error::{Error, Result};
use crate::events::{ControllerEvent, NodeUpdate, ReceivedCommand};
use crate::transmission::{MessageQueue, Priority, Transmission, TransmissionHandle, MAX_RETRANSMISSIONS};
use bytes::Bytes;
use rand_distr::{Distribution, Normal};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Instant};
use tracing::warn;
use wavez_cc::commandclass::{
    Command, ManufacturerSpecificCommand, ManufacturerSpecificReport, MultiChannelCmdEncap,
    MultiChannelCommand, MultiChannelEndPointReport, VersionCommand, WakeUpCommand,
    WakeUpNoMoreInformation, WakeUpNotification,
};
use wavez_core::definitions::{
    CommandClassId, NodeId, NodeProtocolInfo, TransmitOptions, TransmitStatus,
    SUPPORT_CONTROL_MARK,
};
use wavez_core::event::Event;
use wavez_core::parse::{ParseError, ParseResult};
use wavez_core::serialize::Serializable;
use wavez_serial::command::{ApplicationCommandHandlerRequest, Message};

mod interview;

/// After this many missed acknowledgements in a row the node is no longer
/// considered active.
const NO_ACK_THRESHOLD: u32 = 3;
/// Pause before retrying a failed node command.
const COMMAND_RETRY_PAUSE: Duration = Duration::from_secs(5);

pub(crate) struct Node {
    id: NodeId,
    ctrl: ControllerHandle,
    state: Mutex<NodeState>,
    command_queue: MessageQueue<CommandTransmission>,
    /// Set while the node is believed reachable
    node_active: Event,
    /// Set from a wake-up notification until NoMoreInformation is sent
    wake_up_notification: Event,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Default)]
pub(crate) struct NodeState {
    pub protocol_info: Option<NodeProtocolInfo>,
    pub manufacturer_info: Option<ManufacturerSpecificReport>,
    /// endpoint → supported command class codes (truncated at 0xEF)
    pub command_class_codes: HashMap<u8, Vec<u8>>,
    /// (endpoint, class code) → reported version
    pub command_class_versions: HashMap<(u8, u8), u8>,
    pub end_point_report: Option<MultiChannelEndPointReport>,
    pub no_ack_count: u32,
    pub sends_wake_up_notifications: bool,
    /// When to next attempt the interview; `None` once it completed
    pub attempt_initialization_time: Option<Instant>,
    /// Backoff accumulator for failed interview attempts, in seconds
    pub initialization_wait: f64,
}

impl NodeState {
    /// The version commands of this class decode with, if the catalog knows
    /// the class and the node reported a usable version.
    pub fn resolved_version(&self, endpoint: u8, cc_code: u8) -> Option<u8> {
        let version = *self.command_class_versions.get(&(endpoint, cc_code))?;
        if version == 0 || CommandClassId::try_from(cc_code).is_err() {
            return None;
        }
        Some(version)
    }

    /// Whether any known (endpoint, class) pair still lacks a version.
    pub fn needs_command_class_version(&self) -> bool {
        self.command_class_codes.iter().any(|(endpoint, codes)| {
            codes
                .iter()
                .any(|code| !self.command_class_versions.contains_key(&(*endpoint, *code)))
        })
    }
}

impl Node {
    pub fn new(id: NodeId, ctrl: ControllerHandle) -> Arc<Self> {
        let node = Arc::new(Self {
            id,
            ctrl,
            state: Mutex::new(NodeState {
                attempt_initialization_time: Some(Instant::now()),
                ..NodeState::default()
            }),
            command_queue: MessageQueue::new(),
            node_active: Event::new(),
            wake_up_notification: Event::new(),
            dispatcher: Mutex::new(None),
        });
        let task = tokio::spawn(node.clone().command_dispatcher());
        *node.dispatcher.lock().expect("dispatcher lock poisoned") = Some(task);
        node
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn shutdown(&self) {
        if let Some(task) = self
            .dispatcher
            .lock()
            .expect("dispatcher lock poisoned")
            .take()
        {
            task.abort();
        }
    }

    pub fn node_active(&self) {
        self.node_active.set();
    }

    pub(crate) fn state(&self) -> std::sync::MutexGuard<'_, NodeState> {
        self.state.lock().expect("node state lock poisoned")
    }

    pub fn sends_wake_up_notifications(&self) -> bool {
        self.state().sends_wake_up_notifications
    }

    pub fn wake_up_event(&self) -> &Event {
        &self.wake_up_notification
    }

    pub fn attempt_initialization_time(&self) -> Option<Instant> {
        self.state().attempt_initialization_time
    }

    pub fn set_attempt_initialization_time(&self, time: Option<Instant>) {
        self.state().attempt_initialization_time = time;
    }

    /// Queues a command for this node. Commands to endpoints other than the
    /// root get wrapped in a multi-channel encapsulation by the dispatcher.
    pub fn send_command(
        &self,
        command: Command,
        endpoint: u8,
        priority: Priority,
    ) -> TransmissionHandle<()> {
        let (tx, handle) = Transmission::new(Some(command), Some(self.id), endpoint, priority);
        self.command_queue.add(tx);
        handle
    }

    // ---- unsolicited message handlers -----------------------------------

    pub fn handle_application_command(
        &self,
        msg: ApplicationCommandHandlerRequest,
        out: &mut Vec<ControllerEvent>,
    ) {
        match self.parse_command(&msg.payload, 0) {
            Ok(Some(command)) => self.handle_command(command, 0, out),
            Ok(None) => out.push(Message::from(msg).into()),
            Err(e) => {
                warn!(
                    "node {}: error parsing application command {}: {e}",
                    self.id,
                    hex::encode(&msg.payload)
                );
                out.push(Message::from(msg).into());
            }
        }
        self.node_active.set();
    }

    /// Populates the endpoint's supported classes from a NIF or capability
    /// report and emits a CommandClass update per entry.
    pub fn set_command_classes(
        &self,
        endpoint: u8,
        codes: &[u8],
        out: &mut Vec<ControllerEvent>,
    ) {
        let codes: Vec<u8> = match codes.iter().position(|c| *c == SUPPORT_CONTROL_MARK) {
            Some(pos) => codes[..pos].to_vec(),
            None => codes.to_vec(),
        };

        let rearm = {
            let mut state = self.state();
            state.command_class_codes.insert(endpoint, codes.clone());
            for code in &codes {
                let version = state.command_class_versions.get(&(endpoint, *code)).copied();
                out.push(
                    NodeUpdate::CommandClass {
                        node_id: self.id,
                        endpoint,
                        code: *code,
                        version,
                        decodable: state.resolved_version(endpoint, *code).is_some(),
                    }
                    .into(),
                );
            }
            if state.attempt_initialization_time.is_none()
                && state.needs_command_class_version()
            {
                state.attempt_initialization_time = Some(Instant::now());
                true
            } else {
                false
            }
        };
        if rearm {
            self.ctrl.shared.initialization_required.set();
        }
    }

    /// Decodes a raw command payload against the version resolved for the
    /// endpoint. VERSION.CommandClassReport and WAKE_UP.Notification decode
    /// at version 1 even before any version is known; everything else stays
    /// raw (`None`) until then.
    fn parse_command(&self, payload: &[u8], endpoint: u8) -> ParseResult<Option<Command>> {
        if payload.len() < 2 {
            return Err(ParseError::recoverable("short command"));
        }
        let cc_code = payload[0];
        let cmd_code = payload[1];
        let version = match self.state().resolved_version(endpoint, cc_code) {
            Some(version) => version,
            None if (cc_code, cmd_code) == (CommandClassId::Version as u8, 0x14)
                || (cc_code, cmd_code) == (CommandClassId::WakeUp as u8, 0x07) =>
            {
                1
            }
            None => return Ok(None),
        };
        Command::from_bytes(payload, version).map(Some)
    }

    fn handle_command(&self, command: Command, endpoint: u8, out: &mut Vec<ControllerEvent>) {
        match command {
            Command::Version(VersionCommand::CommandClassReport(report)) => {
                self.version_report_handler(report.requested_command_class, report.command_class_version, endpoint, out);
            }
            Command::ManufacturerSpecific(ManufacturerSpecificCommand::Report(report)) => {
                if endpoint == 0 {
                    self.state().manufacturer_info = Some(report);
                    out.push(
                        NodeUpdate::ManufacturerInfo {
                            node_id: self.id,
                            manufacturer_id: report.manufacturer_id,
                            product_type_id: report.product_type_id,
                            product_id: report.product_id,
                        }
                        .into(),
                    );
                }
            }
            Command::MultiChannel(MultiChannelCommand::EndPointReport(report)) => {
                self.state().end_point_report = Some(report);
            }
            Command::MultiChannel(MultiChannelCommand::CapabilityReport(report)) => {
                self.set_command_classes(report.end_point, &report.command_classes, out);
            }
            Command::MultiChannel(MultiChannelCommand::CmdEncap(encap)) => {
                self.cmd_encap_handler(encap, out);
            }
            Command::WakeUp(WakeUpCommand::Notification(_)) => {
                self.wake_up_notification_handler(endpoint, out);
            }
            other => out.push(
                ReceivedCommand {
                    node_id: self.id,
                    endpoint,
                    command: other,
                }
                .into(),
            ),
        }
    }

    fn version_report_handler(
        &self,
        code: u8,
        version: u8,
        endpoint: u8,
        out: &mut Vec<ControllerEvent>,
    ) {
        let decodable = {
            let mut state = self.state();
            state.command_class_versions.insert((endpoint, code), version);
            state.resolved_version(endpoint, code).is_some()
        };
        out.push(
            NodeUpdate::CommandClass {
                node_id: self.id,
                endpoint,
                code,
                version: Some(version),
                decodable,
            }
            .into(),
        );
    }

    /// Multi-channel encapsulated command. With bit addressing the low bit of
    /// the destination decides whether it concerns the root; otherwise the
    /// destination must be 0. Commands for us re-enter handling at the source
    /// endpoint.
    fn cmd_encap_handler(&self, encap: MultiChannelCmdEncap, out: &mut Vec<ControllerEvent>) {
        let to_us = if encap.bit_address {
            encap.destination_end_point & 1 == 1
        } else {
            encap.destination_end_point == 0
        };
        if !to_us {
            out.push(
                ReceivedCommand {
                    node_id: self.id,
                    endpoint: 0,
                    command: encap.into(),
                }
                .into(),
            );
            return;
        }

        let payload = encap.inner_payload();
        let endpoint = encap.source_end_point;
        match self.parse_command(&payload, endpoint) {
            Ok(Some(command)) => self.handle_command(command, endpoint, out),
            other => {
                if let Err(e) = other {
                    warn!(
                        "node {}: error parsing encapsulated command {} at endpoint {endpoint}: {e}",
                        self.id,
                        hex::encode(&payload)
                    );
                }
                out.push(
                    ReceivedCommand {
                        node_id: self.id,
                        endpoint: 0,
                        command: encap.into(),
                    }
                    .into(),
                );
            }
        }
    }

    fn wake_up_notification_handler(&self, endpoint: u8, out: &mut Vec<ControllerEvent>) {
        let initialization_pending = {
            let mut state = self.state();
            if !state.sends_wake_up_notifications {
                state.sends_wake_up_notifications = true;
                // A dummy high-priority item flips the dispatcher into its
                // wake-up mode even while it waits on the queue
                let (nudge, _) = Transmission::new(None, Some(self.id), 0, Priority::WAKE_UP);
                self.command_queue.add(nudge);
            }
            if state.attempt_initialization_time.is_some() {
                state.attempt_initialization_time = Some(Instant::now());
            }
            state.attempt_initialization_time.is_some()
        };
        self.node_active.set();
        self.wake_up_notification.set();
        self.ctrl.wake_up_notification(initialization_pending);
        out.push(
            ReceivedCommand {
                node_id: self.id,
                endpoint,
                command: WakeUpNotification {}.into(),
            }
            .into(),
        );
    }

    // ---- command dispatcher ---------------------------------------------

    /// Sends queued commands one at a time. Always-listening nodes get
    /// commands whenever the queue has one; wake-up nodes only inside their
    /// announced listen window, which ends with a NoMoreInformation.
    async fn command_dispatcher(self: Arc<Self>) {
        let pace = Normal::new(0.2_f64, 0.04).expect("valid distribution");
        let active_wait = Normal::new(30.0_f64, 3.0).expect("valid distribution");

        loop {
            let mut cmdtx = if self.sends_wake_up_notifications() {
                self.wake_up_notification.wait().await;
                self.command_queue
                    .wait_for_message(Some(Duration::from_millis(200)))
                    .await;
                match self.command_queue.take_message() {
                    Some(cmdtx) => cmdtx,
                    None => {
                        let no_more = Command::from(WakeUpNoMoreInformation {}).as_bytes();
                        for _ in 0..3 {
                            if self.transmit_command(no_more.clone()).await {
                                break;
                            }
                        }
                        self.wake_up_notification.clear();
                        continue;
                    }
                }
            } else {
                let secs = active_wait.sample(&mut rand::thread_rng()).max(0.0);
                let _ = timeout(Duration::from_secs_f64(secs), self.node_active.wait()).await;
                self.command_queue.get_message().await
            };

            // The wake-up mode-switch nudge carries no command
            let Some(command) = cmdtx.message.clone() else {
                continue;
            };

            let payload = if cmdtx.endpoint > 0 {
                match self.multi_channel_wrap(&command, cmdtx.endpoint) {
                    Ok(payload) => payload,
                    Err(e) => {
                        cmdtx.complete(Err(e));
                        continue;
                    }
                }
            } else {
                command.as_bytes()
            };

            if self.transmit_command(payload).await {
                cmdtx.complete(Ok(()));
            } else if cmdtx.retransmission >= MAX_RETRANSMISSIONS {
                let attempts = cmdtx.retransmission + 1;
                cmdtx.complete(Err(Error::TransmitFailed(attempts)));
            } else {
                cmdtx.retransmission += 1;
                cmdtx.pause_until = Some(Instant::now() + COMMAND_RETRY_PAUSE);
                self.command_queue.add_first(cmdtx);
            }

            // Pace outgoing traffic so we do not overrun the network
            let pause = pace.sample(&mut rand::thread_rng()).abs();
            tokio::time::sleep(Duration::from_secs_f64(pause)).await;
        }
    }

    fn multi_channel_wrap(&self, command: &Command, endpoint: u8) -> Result<Bytes> {
        let version = self.state().resolved_version(0, CommandClassId::MultiChannel as u8);
        if !version.is_some_and(|v| v >= 2) {
            return Err(Error::MultiChannelNotSupported);
        }
        let bytes = command.as_bytes();
        let encap = MultiChannelCmdEncap {
            source_end_point: 0,
            destination_end_point: endpoint,
            bit_address: false,
            command_class: command.command_class() as u8,
            command: command.command_code(),
            parameter: bytes.slice(2..),
        };
        Ok(Command::from(encap).as_bytes())
    }

    /// One SEND_DATA round trip: lease a func id, issue the call, await the
    /// correlated completion report. Returns whether the node acknowledged.
    async fn transmit_command(&self, payload: Bytes) -> bool {
        let mut lease = self
            .ctrl
            .shared
            .func_ids
            .acquire(self.ctrl.shared.options.func_id_lease)
            .await;

        // Alternate the routing strategy while the node fails to answer
        let no_ack_count = self.state().no_ack_count;
        let tx_options = if no_ack_count % 2 == 1 {
            TransmitOptions::new().ack(true).explore(true)
        } else {
            TransmitOptions::new().ack(true).auto_route(true)
        };

        let accepted = match self
            .ctrl
            .send_data(self.id, payload, tx_options, lease.value())
            .await
        {
            Ok(resp) => resp.ret_val,
            Err(e) => {
                warn!("sendData(nodeId={}) failed: {e}", self.id);
                false
            }
        };
        if !accepted {
            return false;
        }

        let status = timeout(
            self.ctrl.shared.options.send_data_callback_timeout,
            lease.completion(),
        )
        .await;
        drop(lease);

        match status {
            Ok(Some(TransmitStatus::Ok)) => {
                self.state().no_ack_count = 0;
                self.node_active.set();
                true
            }
            Ok(Some(TransmitStatus::NoAck)) => {
                let mut state = self.state();
                state.no_ack_count += 1;
                if state.no_ack_count >= NO_ACK_THRESHOLD {
                    self.node_active.clear();
                }
                false
            }
            _ => false,
        }
    }
}

/// Jittered backoff for the interview: a normal around `wait` with a fifth
/// of it as deviation.
pub(crate) fn backoff_jitter(wait: f64) -> Duration {
    let normal = Normal::new(wait, wait / 5.0);
    let secs = match normal {
        Ok(normal) => normal.sample(&mut rand::thread_rng()).abs(),
        Err(_) => wait.abs(),
    };
    Duration::from_secs_f64(secs)
}

/// Shuffles interview tasks so a persistently failing one cannot starve the
/// rest.
pub(crate) fn shuffle<T>(items: &mut [T]) {
    use rand::seq::SliceRandom;
    items.shuffle(&mut rand::thread_rng());
}

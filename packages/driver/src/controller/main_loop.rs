use crate::controller::handle::{ControllerShared, MessageTransmission};
use crate::controller::NodeTable;
use crate::error::Error;
use crate::transmission::MAX_RETRANSMISSIONS;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use wavez_core::definitions::{MessageType, NodeId};
use wavez_core::serialize::Serializable;
use wavez_serial::command::{Message, MessageId};
use wavez_serial::protocol::SerialProtocol;

/// The single dispatcher that owns the request/response conversation with
/// the controller: at most one function call is in flight; its RESPONSE is
/// matched by class, unsolicited REQUESTs are routed to their handlers, and
/// failed submissions retry with a pause.
pub(crate) struct MainLoop {
    shared: Arc<ControllerShared>,
    sp: Arc<SerialProtocol>,
    nodes: Arc<NodeTable>,
}

impl MainLoop {
    pub fn new(
        shared: Arc<ControllerShared>,
        sp: Arc<SerialProtocol>,
        nodes: Arc<NodeTable>,
    ) -> Self {
        Self { shared, sp, nodes }
    }

    pub async fn run(self) {
        let mut current: Option<MessageTransmission> = None;
        let mut tx_deadline: Option<Instant> = None;

        loop {
            if current.is_none() {
                if !self.sp.message_ready() && !self.shared.mq.has_message() {
                    tokio::select! {
                        _ = self.sp.wait_for_message() => {}
                        _ = self.shared.mq.wait_for_message(None) => {}
                    }
                }
            } else if !self.sp.message_ready() {
                let deadline = tx_deadline.expect("in-flight transmission has a deadline");
                tokio::select! {
                    _ = self.sp.wait_for_message() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }

            let mut reader_finished = false;
            while self.sp.message_ready() {
                let Some(raw) = self.sp.take_message() else {
                    reader_finished = true;
                    break;
                };
                let msg = match Message::from_bytes(&raw) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(
                            "Ignoring unknown incoming message {}: {e}",
                            hex::encode(&raw)
                        );
                        continue;
                    }
                };
                debug!("msg received: {msg:?}");

                if let Some(tx) = current.as_mut() {
                    if msg.message_type() == MessageType::Response
                        && msg.function_type() == tx.message.function_type()
                    {
                        self.handle_response(&msg);
                        tx.complete(Ok(msg));
                        current = None;
                        tx_deadline = None;
                        continue;
                    }
                }

                if msg.message_type() == MessageType::Request {
                    self.handle_request(msg);
                } else {
                    // A response nothing waited for
                    self.shared.events.append(msg.into());
                }
            }
            if reader_finished {
                break;
            }

            if current.is_none() && self.shared.mq.has_message() {
                if !self.sp.idle() {
                    // The framer is busy receiving or sending. Wait for idle,
                    // but process any arriving message first.
                    tokio::select! {
                        _ = self.sp.wait_for_idle() => {}
                        _ = self.sp.wait_for_message() => {}
                    }
                    continue;
                }
                let Some(tx) = self.shared.mq.take_message() else {
                    continue;
                };
                debug!("Attempting transmission: {:?}", tx.message);
                match self.sp.send(tx.message.as_bytes()).wait().await {
                    Ok(()) => {
                        tx_deadline =
                            Some(Instant::now() + self.shared.options.response_timeout);
                        current = Some(tx);
                    }
                    Err(e) => {
                        info!("Exception while sending: {e}");
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        self.retry_or_fail(tx, Error::Serial(e));
                    }
                }
            } else if let Some(deadline) = tx_deadline {
                if Instant::now() >= deadline {
                    let tx = current
                        .take()
                        .expect("deadline implies an in-flight transmission");
                    tx_deadline = None;
                    self.retry_or_fail(tx, Error::Timeout);
                }
            }
        }

        // The transport ended; nothing pending can complete anymore
        if let Some(mut tx) = current.take() {
            tx.complete(Err(Error::Shutdown));
        }
        while let Some(mut tx) = self.shared.mq.take_message() {
            tx.complete(Err(Error::Shutdown));
        }
    }

    fn retry_or_fail(&self, mut tx: MessageTransmission, error: Error) {
        if tx.retransmission >= MAX_RETRANSMISSIONS {
            tx.complete(Err(error));
        } else {
            tx.retransmission += 1;
            tx.pause_until = Some(Instant::now() + self.shared.options.retransmit_pause);
            self.shared.mq.add(tx);
        }
    }

    /// Responses whose content the core keeps for itself.
    fn handle_response(&self, msg: &Message) {
        if let Message::GetSerialApiInitDataResponse(resp) = msg {
            *self
                .shared
                .storage
                .api_init_data
                .lock()
                .expect("init data lock poisoned") = Some(resp.clone());
        }
    }

    /// Unsolicited requests: route to the named node or publish as-is.
    fn handle_request(&self, msg: Message) {
        let mut out = Vec::new();
        match msg {
            Message::ApplicationUpdateRequest(update) => {
                let node = NodeId::new(update.node_id)
                    .ok()
                    .and_then(|id| self.nodes.get(id));
                match node {
                    Some(node) => {
                        node.set_command_classes(0, &update.command_classes, &mut out);
                        node.node_active();
                    }
                    None => out.push(Message::from(update).into()),
                }
            }
            Message::ApplicationCommandHandlerRequest(cmd) => {
                let node = NodeId::new(cmd.node_id)
                    .ok()
                    .and_then(|id| self.nodes.get(id));
                match node {
                    Some(node) => node.handle_application_command(cmd, &mut out),
                    None => out.push(Message::from(cmd).into()),
                }
            }
            Message::SendDataCallback(cb) => {
                if !self.shared.func_ids.set_result(cb.func_id, cb.tx_status) {
                    warn!(
                        "Discarding SEND_DATA report for unknown func id {}",
                        cb.func_id
                    );
                }
                out.push(Message::from(cb).into());
            }
            other => out.push(other.into()),
        }
        for event in out {
            self.shared.events.append(event);
        }
    }
}

use super::{backoff_jitter, shuffle, Node};
use crate::error::{Error, Result};
use crate::events::NodeUpdate;
use crate::transmission::{Priority, TransmissionHandle};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{debug, info};
use wavez_cc::commandclass::{
    ManufacturerSpecificGet, MultiChannelCapabilityGet, MultiChannelEndPointGet,
    VersionCommandClassGet,
};
use wavez_core::definitions::CommandClassId;

/// How long an interview step may take to submit (its transmission to
/// complete).
const ACTION_TIMEOUT: Duration = Duration::from_secs(5);
/// How long to watch for the step's observable effect afterwards.
const EFFECT_WINDOW: Duration = Duration::from_secs(2);

impl Node {
    /// One interview attempt. On completion the node marks itself
    /// initialized; on failure the next attempt time backs off with jitter,
    /// more gently after a plain timeout.
    pub(crate) async fn attempt_initialization(&self) {
        let mut add = 4.0;
        match self.attempt_initialization_impl().await {
            Ok(true) => {
                self.set_attempt_initialization_time(None);
                return;
            }
            Ok(false) => {}
            Err(Error::Timeout) => add = 2.0,
            Err(e) => debug!("node {}: interview attempt failed: {e}", self.id()),
        }
        let wait = {
            let mut state = self.state();
            let wait = (state.initialization_wait + add) * 1.5;
            state.initialization_wait = wait;
            wait
        };
        self.set_attempt_initialization_time(Some(Instant::now() + backoff_jitter(wait)));
    }

    async fn attempt_initialization_impl(&self) -> Result<bool> {
        info!("Attempt initialization: node {}", self.id());

        if self.state().protocol_info.is_none() {
            let resp = timeout(ACTION_TIMEOUT, self.ctrl.get_node_protocol_info(self.id()))
                .await
                .map_err(|_| Error::Timeout)??;
            {
                let mut state = self.state();
                state.protocol_info = Some(resp.info);
                state.initialization_wait = 0.0;
            }
            self.ctrl.shared.events.append(
                NodeUpdate::ProtocolInfo {
                    node_id: self.id(),
                    info: resp.info,
                }
                .into(),
            );
        }

        if !self.state().command_class_codes.contains_key(&0) {
            // Only one node interviews via REQUEST_NODE_INFO at a time; the
            // APPLICATION_UPDATE answer carries no node correlation
            let _guard = self.ctrl.shared.request_node_info_lock.lock().await;
            while !self.state().command_class_codes.contains_key(&0) {
                self.node_active.clear();
                let _ = timeout(ACTION_TIMEOUT, self.ctrl.request_node_info(self.id())).await;
                timeout(EFFECT_WINDOW, self.node_active.wait())
                    .await
                    .map_err(|_| Error::Timeout)?;
            }
            self.state().initialization_wait = 0.0;
        }

        loop {
            let mut tasks = self.outstanding_interview_tasks();
            if tasks.is_empty() {
                return Ok(true);
            }
            shuffle(&mut tasks);
            for task in tasks {
                if !self.run_interview_task(&task).await? {
                    return Ok(false);
                }
            }
        }
    }

    fn outstanding_interview_tasks(&self) -> Vec<InterviewTask> {
        let state = self.state();
        let mut tasks = Vec::new();

        for (endpoint, codes) in &state.command_class_codes {
            for code in codes {
                if state
                    .command_class_versions
                    .contains_key(&(*endpoint, *code))
                {
                    continue;
                }
                let weight = if *endpoint != 0 {
                    0
                } else {
                    version_priority(*code)
                };
                tasks.push(InterviewTask::CommandClassVersion {
                    endpoint: *endpoint,
                    code: *code,
                    weight,
                });
            }
        }

        let multi_channel = state.resolved_version(0, CommandClassId::MultiChannel as u8);
        if state.end_point_report.is_none() && multi_channel.is_some_and(|v| v >= 2) {
            tasks.push(InterviewTask::EndPoints);
        }

        if state.manufacturer_info.is_none()
            && state
                .resolved_version(0, CommandClassId::ManufacturerSpecific as u8)
                .is_some()
        {
            tasks.push(InterviewTask::ManufacturerInfo);
        }

        if let Some(report) = &state.end_point_report {
            for end_point in 1..=report.individual_end_points {
                if !state.command_class_codes.contains_key(&end_point) {
                    tasks.push(InterviewTask::EndPointCapability { end_point });
                }
            }
        }

        tasks
    }

    async fn run_interview_task(&self, task: &InterviewTask) -> Result<bool> {
        if !task.outstanding(self) {
            return Ok(true);
        }
        debug!("node {}: run interview task {task:?}", self.id());

        let handle = task.submit(self);
        timeout(ACTION_TIMEOUT, handle.wait())
            .await
            .map_err(|_| Error::Timeout)??;

        let deadline = Instant::now() + EFFECT_WINDOW;
        loop {
            if !task.outstanding(self) {
                return Ok(true);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            self.node_active.clear();
            let _ = timeout(deadline - now, self.node_active.wait()).await;
        }
    }
}

/// The version queries of a few classes steer how fast the rest of the
/// interview can proceed.
fn version_priority(code: u8) -> i32 {
    match CommandClassId::try_from(code) {
        Ok(CommandClassId::ManufacturerSpecific) => 2,
        Ok(CommandClassId::MultiChannel) => 1,
        Ok(CommandClassId::Version) | Ok(CommandClassId::WakeUp) => -1,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy)]
enum InterviewTask {
    CommandClassVersion { endpoint: u8, code: u8, weight: i32 },
    EndPoints,
    ManufacturerInfo,
    EndPointCapability { end_point: u8 },
}

impl InterviewTask {
    /// Whether the fact this task gathers is still missing.
    fn outstanding(&self, node: &Node) -> bool {
        let state = node.state();
        match self {
            InterviewTask::CommandClassVersion { endpoint, code, .. } => !state
                .command_class_versions
                .contains_key(&(*endpoint, *code)),
            InterviewTask::EndPoints => state.end_point_report.is_none(),
            InterviewTask::ManufacturerInfo => state.manufacturer_info.is_none(),
            InterviewTask::EndPointCapability { end_point } => {
                let still_declared = state
                    .end_point_report
                    .as_ref()
                    .is_some_and(|r| *end_point <= r.individual_end_points);
                still_declared && !state.command_class_codes.contains_key(end_point)
            }
        }
    }

    fn submit(&self, node: &Node) -> TransmissionHandle<()> {
        match self {
            InterviewTask::CommandClassVersion {
                endpoint,
                code,
                weight,
            } => node.send_command(
                VersionCommandClassGet {
                    requested_command_class: *code,
                }
                .into(),
                *endpoint,
                Priority::INITIALIZATION + *weight,
            ),
            InterviewTask::EndPoints => {
                node.send_command(MultiChannelEndPointGet {}.into(), 0, Priority::DEFAULT)
            }
            InterviewTask::ManufacturerInfo => {
                node.send_command(ManufacturerSpecificGet {}.into(), 0, Priority::DEFAULT)
            }
            InterviewTask::EndPointCapability { end_point } => node.send_command(
                MultiChannelCapabilityGet {
                    end_point: *end_point,
                }
                .into(),
                0,
                Priority::DEFAULT,
            ),
        }
    }
}

use crate::controller::handle::ControllerShared;
use crate::controller::NodeTable;
use crate::node::Node;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Picks the next node to interview. An awake wake-up node beats everything
/// and is interviewed without interruption while its listen window lasts;
/// an always-listening node's interview yields when some other pending
/// node's wake-up notification arrives.
pub(crate) struct InterviewScheduler {
    shared: Arc<ControllerShared>,
    nodes: Arc<NodeTable>,
}

impl InterviewScheduler {
    pub fn new(shared: Arc<ControllerShared>, nodes: Arc<NodeTable>) -> Self {
        Self { shared, nodes }
    }

    pub async fn run(self) {
        loop {
            let queue: Vec<Arc<Node>> = self
                .nodes
                .all()
                .into_iter()
                .filter(|n| n.attempt_initialization_time().is_some())
                .collect();

            if queue.is_empty() {
                info!("No nodes require initialization");
                self.shared.initialization_required.clear();
                self.shared.initialization_required.wait().await;
                continue;
            }
            info!("Number of nodes requiring initialization: {}", queue.len());

            let now = Instant::now();
            let mut earliest: Option<Instant> = None;
            let mut selected: Option<Arc<Node>> = None;

            // A wake-up-reporting node that is awake right now goes first
            for n in &queue {
                if !(n.sends_wake_up_notifications() && n.wake_up_event().is_set()) {
                    continue;
                }
                match n.attempt_initialization_time() {
                    Some(t) if t <= now => {
                        selected = Some(n.clone());
                        break;
                    }
                    Some(t) => {
                        if earliest.is_none_or(|e| e > t) {
                            earliest = Some(t);
                        }
                    }
                    None => {}
                }
            }

            if selected.is_none() {
                for n in &queue {
                    if n.sends_wake_up_notifications() {
                        continue;
                    }
                    match n.attempt_initialization_time() {
                        Some(t) if t <= now => {
                            selected = Some(n.clone());
                            break;
                        }
                        Some(t) => {
                            if earliest.is_none_or(|e| e > t) {
                                earliest = Some(t);
                            }
                        }
                        None => {}
                    }
                }
            }

            let Some(node) = selected else {
                // Nothing is due; sleep until the earliest backoff expires or
                // something signals new work
                self.shared.initialization_required.clear();
                match earliest {
                    Some(earliest) => {
                        tokio::select! {
                            _ = self.shared.initialization_required.wait() => {}
                            _ = tokio::time::sleep_until(earliest + Duration::from_millis(50)) => {}
                        }
                    }
                    None => self.shared.initialization_required.wait().await,
                }
                continue;
            };

            if node.sends_wake_up_notifications() {
                // The listen window is short; do not let anything interrupt
                node.attempt_initialization().await;
            } else {
                let other_wakeups: Vec<_> = queue
                    .iter()
                    .filter(|n| !Arc::ptr_eq(n, &node))
                    .map(|n| Box::pin(n.wake_up_event().wait()))
                    .collect();
                if other_wakeups.is_empty() {
                    node.attempt_initialization().await;
                } else {
                    tokio::select! {
                        biased;
                        _ = node.attempt_initialization() => {}
                        _ = futures::future::select_all(other_wakeups) => {
                            // Preempted mid-interview; let this node retry
                            // once the woken node had its turn
                            node.set_attempt_initialization_time(
                                Some(Instant::now() + Duration::from_secs(5)),
                            );
                        }
                    }
                }
            }
        }
    }
}

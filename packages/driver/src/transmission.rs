use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::ops::Add;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use wavez_core::definitions::NodeId;
use wavez_core::event::Event;
use wavez_core::util::maybe_sleep_until;

pub const MAX_RETRANSMISSIONS: u8 = 3;

/// Transmission priority bands. Higher goes first; within a band insertion
/// order decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Priority(pub i32);

impl Priority {
    pub const POLLING: Priority = Priority(-100);
    pub const INITIALIZATION: Priority = Priority(-10);
    pub const DEFAULT: Priority = Priority(0);
    pub const INTERACTIVE: Priority = Priority(100);
    pub const WAKE_UP: Priority = Priority(99999);
}

impl Add<i32> for Priority {
    type Output = Priority;

    fn add(self, rhs: i32) -> Priority {
        Priority(self.0 + rhs)
    }
}

/// A queued outbound item: its payload, addressing, retry accounting and the
/// completion future handed to the caller.
#[derive(Debug)]
pub struct Transmission<M, R> {
    pub message: M,
    pub node_id: Option<NodeId>,
    pub endpoint: u8,
    pub priority: Priority,
    pub retransmission: u8,
    pub pause_until: Option<Instant>,
    done: Option<oneshot::Sender<Result<R>>>,
    cancelled: Arc<AtomicBool>,
}

/// The caller's side of a transmission: await the outcome or cancel it.
#[derive(Debug)]
pub struct TransmissionHandle<R> {
    rx: oneshot::Receiver<Result<R>>,
    cancelled: Arc<AtomicBool>,
}

impl<M, R> Transmission<M, R> {
    pub fn new(
        message: M,
        node_id: Option<NodeId>,
        endpoint: u8,
        priority: Priority,
    ) -> (Self, TransmissionHandle<R>) {
        let (done, rx) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        (
            Self {
                message,
                node_id,
                endpoint,
                priority,
                retransmission: 0,
                pause_until: None,
                done: Some(done),
                cancelled: cancelled.clone(),
            },
            TransmissionHandle { rx, cancelled },
        )
    }

    pub fn cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Resolves the caller's future. Cancelled transmissions drop the result.
    pub fn complete(&mut self, result: Result<R>) {
        if let Some(done) = self.done.take() {
            if !self.cancelled() {
                let _ = done.send(result);
            }
        }
    }
}

impl<R> TransmissionHandle<R> {
    pub async fn wait(self) -> Result<R> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::Shutdown),
        }
    }

    /// Marks the transmission cancelled; queues will drop it unseen.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

/// Plain FIFO with a single-consumer wait, used for the public output stream.
pub struct SimpleQueue<T> {
    messages: Mutex<VecDeque<T>>,
    event: Event,
}

impl<T> SimpleQueue<T> {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(VecDeque::new()),
            event: Event::new(),
        }
    }

    pub fn append(&self, message: T) {
        self.messages
            .lock()
            .expect("queue lock poisoned")
            .push_back(message);
        self.event.set();
    }

    pub fn has_message(&self) -> bool {
        !self.messages.lock().expect("queue lock poisoned").is_empty()
    }

    pub async fn wait_for_message(&self) {
        while !self.has_message() {
            self.event.wait().await;
        }
    }

    pub fn take_message(&self) -> Option<T> {
        let mut messages = self.messages.lock().expect("queue lock poisoned");
        let message = messages.pop_front();
        if messages.is_empty() {
            self.event.clear();
        }
        message
    }

    pub async fn get_message(&self) -> T {
        loop {
            if let Some(message) = self.take_message() {
                return message;
            }
            self.event.wait().await;
        }
    }
}

impl<T> Default for SimpleQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Items a [`MessageQueue`] can order and skip.
pub trait QueueItem {
    fn priority(&self) -> Priority;
    fn pause_until(&self) -> Option<Instant>;
    fn cancelled(&self) -> bool;
}

impl<M, R> QueueItem for Transmission<M, R> {
    fn priority(&self) -> Priority {
        self.priority
    }

    fn pause_until(&self) -> Option<Instant> {
        self.pause_until
    }

    fn cancelled(&self) -> bool {
        Transmission::cancelled(self)
    }
}

/// A priority queue of transmissions. `take_message` skips cancelled items
/// and items whose pause has not yet expired; waiting accounts for the next
/// pause expiry.
pub struct MessageQueue<T> {
    messages: Mutex<Vec<T>>,
    event: Event,
}

impl<T: QueueItem> MessageQueue<T> {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            event: Event::new(),
        }
    }

    /// Inserts behind existing items of the same priority.
    pub fn add(&self, item: T) {
        let mut messages = self.messages.lock().expect("queue lock poisoned");
        let pos = messages.partition_point(|m| m.priority() >= item.priority());
        messages.insert(pos, item);
        self.event.set();
    }

    /// Inserts ahead of existing items of the same priority.
    pub fn add_first(&self, item: T) {
        let mut messages = self.messages.lock().expect("queue lock poisoned");
        let pos = messages.partition_point(|m| m.priority() > item.priority());
        messages.insert(pos, item);
        self.event.set();
    }

    pub fn has_message(&self) -> bool {
        let now = Instant::now();
        let messages = self.messages.lock().expect("queue lock poisoned");
        messages
            .iter()
            .any(|m| !m.cancelled() && m.pause_until().is_none_or(|p| p < now))
    }

    /// Waits until an item is ready to take, or the timeout expires. Returns
    /// whether an item is ready.
    pub async fn wait_for_message(&self, timeout: Option<Duration>) -> bool {
        let expires = timeout.map(|t| Instant::now() + t);
        loop {
            let now = Instant::now();
            if let Some(expires) = expires {
                if now >= expires {
                    return false;
                }
            }
            let mut next_wakeup = expires;
            {
                let messages = self.messages.lock().expect("queue lock poisoned");
                for m in messages.iter() {
                    if m.cancelled() {
                        continue;
                    }
                    match m.pause_until() {
                        None => return true,
                        Some(p) if p < now => return true,
                        Some(p) => {
                            if next_wakeup.is_none_or(|w| w > p) {
                                next_wakeup = Some(p);
                            }
                        }
                    }
                }
                self.event.clear();
            }
            tokio::select! {
                _ = self.event.wait() => {}
                _ = maybe_sleep_until(next_wakeup) => {}
            }
        }
    }

    /// Takes the highest-priority ready item. Cancelled items are dropped on
    /// the way.
    pub fn take_message(&self) -> Option<T> {
        let now = Instant::now();
        let mut messages = self.messages.lock().expect("queue lock poisoned");
        let mut idx = 0;
        while idx < messages.len() {
            if messages[idx].cancelled() {
                messages.remove(idx);
                continue;
            }
            if messages[idx].pause_until().is_none_or(|p| p < now) {
                return Some(messages.remove(idx));
            }
            idx += 1;
        }
        None
    }

    pub async fn get_message(&self) -> T {
        loop {
            if let Some(item) = self.take_message() {
                return item;
            }
            self.wait_for_message(None).await;
        }
    }
}

impl<T: QueueItem> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct Item {
        name: &'static str,
        priority: Priority,
        pause_until: Option<Instant>,
        cancelled: bool,
    }

    impl Item {
        fn new(name: &'static str, priority: Priority) -> Self {
            Self {
                name,
                priority,
                pause_until: None,
                cancelled: false,
            }
        }
    }

    impl QueueItem for Item {
        fn priority(&self) -> Priority {
            self.priority
        }

        fn pause_until(&self) -> Option<Instant> {
            self.pause_until
        }

        fn cancelled(&self) -> bool {
            self.cancelled
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_priority_order_with_fifo_ties() {
        let q = MessageQueue::new();
        q.add(Item::new("a", Priority::DEFAULT));
        q.add(Item::new("b", Priority::INTERACTIVE));
        q.add(Item::new("c", Priority::DEFAULT));
        q.add(Item::new("d", Priority::POLLING));
        q.add(Item::new("e", Priority::INTERACTIVE));

        let order: Vec<_> = std::iter::from_fn(|| q.take_message())
            .map(|i| i.name)
            .collect();
        assert_eq!(order, vec!["b", "e", "a", "c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_first_goes_ahead_of_same_priority() {
        let q = MessageQueue::new();
        q.add(Item::new("a", Priority::DEFAULT));
        q.add_first(Item::new("b", Priority::DEFAULT));
        q.add(Item::new("c", Priority::INTERACTIVE));

        let order: Vec<_> = std::iter::from_fn(|| q.take_message())
            .map(|i| i.name)
            .collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_items_are_skipped_until_due() {
        let q = MessageQueue::new();
        let mut item = Item::new("a", Priority::INTERACTIVE);
        item.pause_until = Some(Instant::now() + Duration::from_secs(1));
        q.add(item);
        q.add(Item::new("b", Priority::DEFAULT));

        assert_eq!(q.take_message().unwrap().name, "b");
        assert!(q.take_message().is_none());

        // After the pause expires the item becomes available again
        assert!(q.wait_for_message(Some(Duration::from_secs(2))).await);
        assert_eq!(q.take_message().unwrap().name, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_items_are_dropped() {
        let q = MessageQueue::new();
        let mut item = Item::new("a", Priority::INTERACTIVE);
        item.cancelled = true;
        q.add(item);
        q.add(Item::new("b", Priority::DEFAULT));

        assert_eq!(q.take_message().unwrap().name, "b");
        assert!(q.take_message().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_for_message_times_out() {
        let q: MessageQueue<Item> = MessageQueue::new();
        assert!(!q.wait_for_message(Some(Duration::from_millis(200))).await);
    }
}

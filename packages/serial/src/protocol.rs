use crate::binding::SerialBinding;
use crate::error::{Error, Result};
use crate::frame::{checksum, frame, ControlByte, ACK_BUFFER, CAN_BUFFER, NAK_BUFFER};
use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::warn;
use wavez_core::event::Event;

/// How long a frame may take to trickle in after its SOF byte.
const RECEIVE_TIMEOUT: Duration = Duration::from_millis(1500);
/// How long the controller may take to acknowledge a sent frame.
const ACK_TIMEOUT: Duration = Duration::from_millis(1600);
/// Idle time between the break condition and the initial NAK.
const STARTUP_SETTLE: Duration = Duration::from_millis(500);

/// The framing state machine over a byte transport. A single task owns the
/// transport; callers interact through the shared queues.
///
/// Frames that verify their checksum are ACKed and handed to the caller as
/// raw payload bytes; mismatches are NAKed so the peer retransmits. Sending
/// waits for the peer's ACK and loses to an incoming SOF (the incoming frame
/// is received and answered with CAN, the send job fails).
pub struct SerialProtocol {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

struct Shared {
    received: Mutex<VecDeque<Bytes>>,
    /// Set while messages are ready or the reader is finished
    reader_event: Event,
    reader_finished: AtomicBool,
    send_queue: Mutex<VecDeque<SendJob>>,
    /// Set while the send queue is non-empty
    send_event: Event,
    /// Set while the task sits between frames
    idle: Event,
    shutdown: Event,
}

struct SendJob {
    payload: Bytes,
    done: oneshot::Sender<Result<()>>,
    cancelled: Arc<AtomicBool>,
}

/// Completion handle for a queued send job.
pub struct SendHandle {
    rx: oneshot::Receiver<Result<()>>,
    cancelled: Arc<AtomicBool>,
}

impl SendHandle {
    /// Waits until the frame is ACKed or the send fails.
    pub async fn wait(self) -> Result<()> {
        match self.rx.await {
            Ok(res) => res,
            Err(_) => Err(Error::Closed),
        }
    }

    /// Marks the job cancelled; the framer will skip it.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }
}

impl SerialProtocol {
    pub fn new(binding: Box<dyn SerialBinding>) -> Self {
        let shared = Arc::new(Shared {
            received: Mutex::new(VecDeque::new()),
            reader_event: Event::new(),
            reader_finished: AtomicBool::new(false),
            send_queue: Mutex::new(VecDeque::new()),
            send_event: Event::new(),
            idle: Event::new(),
            shutdown: Event::new(),
        });

        let task = ProtocolTask {
            binding,
            rx: BytesMut::with_capacity(512),
            shared: shared.clone(),
        };
        let task = tokio::spawn(task.run());

        Self {
            shared,
            task: Mutex::new(Some(task)),
        }
    }

    /// Queues a payload for transmission and returns its completion handle.
    pub fn send(&self, payload: Bytes) -> SendHandle {
        let (done, rx) = oneshot::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let job = SendJob {
            payload,
            done,
            cancelled: cancelled.clone(),
        };
        self.shared
            .send_queue
            .lock()
            .expect("send queue lock poisoned")
            .push_back(job);
        self.shared.send_event.set();
        SendHandle { rx, cancelled }
    }

    /// Whether a received message is ready, or the reader has finished.
    pub fn message_ready(&self) -> bool {
        self.shared.message_ready()
    }

    pub async fn wait_for_message(&self) {
        while !self.message_ready() {
            self.shared.reader_event.wait().await;
        }
    }

    /// Pops the next received message without waiting.
    pub fn take_message(&self) -> Option<Bytes> {
        self.shared.take_message()
    }

    /// Waits for and takes the next message. Fails with `EndOfStream` once
    /// the reader has finished and the queue has drained.
    pub async fn next_message(&self) -> Result<Bytes> {
        loop {
            if let Some(msg) = self.take_message() {
                return Ok(msg);
            }
            if self.shared.reader_finished.load(Ordering::Acquire) {
                return Err(Error::EndOfStream);
            }
            self.shared.reader_event.wait().await;
        }
    }

    /// Whether the framer is between frames.
    pub fn idle(&self) -> bool {
        self.shared.idle.is_set()
    }

    pub async fn wait_for_idle(&self) {
        self.shared.idle.wait().await;
    }

    /// Stops the task at the next idle point and closes the transport.
    pub async fn close(&self) {
        self.shared.shutdown.set();
        let task = self
            .task
            .lock()
            .expect("task handle lock poisoned")
            .take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

impl Shared {
    fn message_ready(&self) -> bool {
        !self
            .received
            .lock()
            .expect("receive queue lock poisoned")
            .is_empty()
            || self.reader_finished.load(Ordering::Acquire)
    }

    fn take_message(&self) -> Option<Bytes> {
        let mut received = self.received.lock().expect("receive queue lock poisoned");
        let msg = received.pop_front();
        if received.is_empty() && !self.reader_finished.load(Ordering::Acquire) {
            self.reader_event.clear();
        }
        msg
    }

    fn push_message(&self, msg: Bytes) {
        self.received
            .lock()
            .expect("receive queue lock poisoned")
            .push_back(msg);
        self.reader_event.set();
    }

    /// Pops the next send job that has not been cancelled. Clears the send
    /// event when the queue drains.
    fn pop_send_job(&self) -> Option<SendJob> {
        let mut queue = self.send_queue.lock().expect("send queue lock poisoned");
        while let Some(job) = queue.pop_front() {
            if job.cancelled.load(Ordering::Relaxed) {
                let _ = job.done.send(Err(Error::Cancelled));
                continue;
            }
            return Some(job);
        }
        self.send_event.clear();
        None
    }

    /// Clears the send event while holding the queue lock, so a concurrent
    /// `send` cannot lose its wakeup.
    fn clear_send_event_if_drained(&self) {
        let queue = self.send_queue.lock().expect("send queue lock poisoned");
        if queue.is_empty() {
            self.send_event.clear();
        }
    }
}

struct ProtocolTask {
    binding: Box<dyn SerialBinding>,
    rx: BytesMut,
    shared: Arc<Shared>,
}

enum Step {
    Received,
    SendReady,
    Shutdown,
    Eof,
}

impl ProtocolTask {
    async fn run(mut self) {
        // Re-synchronize the controller: break, settle, NAK
        if let Err(e) = self.binding.send_break().await {
            warn!("send break failed: {e}");
        }
        tokio::time::sleep(STARTUP_SETTLE).await;
        let _ = self.binding.send(Bytes::from_static(&NAK_BUFFER)).await;

        loop {
            self.shared.idle.set();
            let step = self.idle_step().await;
            self.shared.idle.clear();

            match step {
                Step::Received => {
                    let byte = self.rx.get_u8();
                    if byte != ControlByte::Sof as u8 {
                        match ControlByte::try_from(byte) {
                            Ok(cb) => warn!("Skipped {cb:?} while expecting SOF"),
                            Err(_) => warn!("Skipped byte {byte:#04x} while expecting SOF"),
                        }
                        continue;
                    }
                    self.receive_msg(false).await;
                }
                Step::SendReady => self.send_msg().await,
                Step::Shutdown | Step::Eof => break,
            }
        }

        self.finish().await;
    }

    /// Waits until a byte is buffered, a send job is due, or shutdown.
    async fn idle_step(&mut self) -> Step {
        if !self.rx.is_empty() {
            return Step::Received;
        }
        let shared = self.shared.clone();
        tokio::select! {
            biased;
            _ = shared.shutdown.wait() => Step::Shutdown,
            res = Self::fill(self.binding.as_mut(), &mut self.rx, 1) => match res {
                Ok(()) => Step::Received,
                Err(_) => Step::Eof,
            },
            _ = shared.send_event.wait() => Step::SendReady,
        }
    }

    /// Buffers transport bytes until at least `n` are available.
    async fn fill(
        binding: &mut (dyn SerialBinding + '_),
        rx: &mut BytesMut,
        n: usize,
    ) -> Result<()> {
        while rx.len() < n {
            let chunk = binding.recv().await?;
            if chunk.is_empty() {
                return Err(Error::EndOfStream);
            }
            rx.extend_from_slice(&chunk);
        }
        Ok(())
    }

    /// Receives the remainder of a frame after its SOF byte. When `cancel`
    /// is set the frame is answered with CAN and discarded instead of being
    /// delivered.
    async fn receive_msg(&mut self, cancel: bool) {
        let deadline = Instant::now() + RECEIVE_TIMEOUT;
        match timeout_at(deadline, Self::fill(self.binding.as_mut(), &mut self.rx, 1)).await {
            Ok(Ok(())) => {}
            _ => {
                warn!("Timeout while receiving message (length)");
                return;
            }
        }
        let length = match self.rx.get_u8() as usize {
            0 => 256,
            n => n,
        };
        match timeout_at(deadline, Self::fill(self.binding.as_mut(), &mut self.rx, length)).await {
            Ok(Ok(())) => {}
            _ => {
                warn!("Timeout while receiving message (payload)");
                return;
            }
        }
        let mut payload = self.rx.split_to(length).freeze();
        let received_checksum = payload[payload.len() - 1];
        payload.truncate(payload.len() - 1);

        if cancel {
            let _ = self.binding.send(Bytes::from_static(&CAN_BUFFER)).await;
        } else if checksum(&payload) == received_checksum {
            let _ = self.binding.send(Bytes::from_static(&ACK_BUFFER)).await;
            self.shared.push_message(payload);
        } else {
            warn!("Checksum mismatch");
            let _ = self.binding.send(Bytes::from_static(&NAK_BUFFER)).await;
        }
    }

    async fn send_msg(&mut self) {
        let Some(job) = self.shared.pop_send_job() else {
            return;
        };
        let result = self.send_job_impl(&job).await;
        let _ = job.done.send(result);
        self.shared.clear_send_event_if_drained();
    }

    async fn send_job_impl(&mut self, job: &SendJob) -> Result<()> {
        let framed = frame(&job.payload)?;
        self.binding.send(framed).await?;

        let deadline = Instant::now() + ACK_TIMEOUT;
        loop {
            match timeout_at(deadline, Self::fill(self.binding.as_mut(), &mut self.rx, 1)).await {
                Err(_) => return Err(Error::Timeout("ACK")),
                Ok(Err(e)) => return Err(e),
                Ok(Ok(())) => {}
            }
            let byte = self.rx.get_u8();
            match ControlByte::try_from(byte) {
                Ok(ControlByte::Ack) => return Ok(()),
                Ok(cb @ (ControlByte::Nak | ControlByte::Can)) => {
                    return Err(Error::Rejected(cb));
                }
                Ok(ControlByte::Sof) => {
                    // An incoming frame won the line; take it, answer CAN,
                    // report the send as failed
                    self.receive_msg(true).await;
                    return Err(Error::Collision);
                }
                Err(_) => warn!("Skipped byte {byte:#04x} while expecting ACK"),
            }
        }
    }

    async fn finish(mut self) {
        self.shared.reader_finished.store(true, Ordering::Release);
        self.shared.reader_event.set();
        // Pending send jobs cannot complete anymore
        loop {
            let job = {
                let mut queue = self
                    .shared
                    .send_queue
                    .lock()
                    .expect("send queue lock poisoned");
                queue.pop_front()
            };
            match job {
                Some(job) => {
                    let _ = job.done.send(Err(Error::EndOfStream));
                }
                None => break,
            }
        }
        let _ = self.binding.close().await;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::binding::SerialBinding;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    /// Transport half for tests: scripted like a controller on the far end.
    pub(crate) struct MockBinding {
        pub incoming: mpsc::UnboundedReceiver<Bytes>,
        pub outgoing: mpsc::UnboundedSender<Bytes>,
    }

    pub(crate) struct MockRemote {
        pub to_host: mpsc::UnboundedSender<Bytes>,
        pub from_host: mpsc::UnboundedReceiver<Bytes>,
    }

    pub(crate) fn mock_binding() -> (MockBinding, MockRemote) {
        let (to_host, incoming) = mpsc::unbounded_channel();
        let (outgoing, from_host) = mpsc::unbounded_channel();
        (
            MockBinding { incoming, outgoing },
            MockRemote { to_host, from_host },
        )
    }

    #[async_trait]
    impl SerialBinding for MockBinding {
        async fn recv(&mut self) -> Result<Bytes> {
            Ok(self.incoming.recv().await.unwrap_or_default())
        }

        async fn send(&mut self, data: Bytes) -> Result<()> {
            let _ = self.outgoing.send(data);
            Ok(())
        }

        async fn send_break(&mut self) -> Result<()> {
            let _ = self.outgoing.send(Bytes::from_static(b"<break>"));
            Ok(())
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    async fn expect_bytes(remote: &mut MockRemote, expected: &[u8]) {
        let mut got = BytesMut::new();
        while got.len() < expected.len() {
            let chunk = remote.from_host.recv().await.expect("transport closed");
            got.extend_from_slice(&chunk);
        }
        assert_eq!(got.as_ref(), expected);
    }

    async fn startup(remote: &mut MockRemote) {
        expect_bytes(remote, b"<break>").await;
        expect_bytes(remote, &NAK_BUFFER).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_valid_frame_is_acked() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        let payload = hex::decode("0002aabb").unwrap();
        remote.to_host.send(frame(&payload).unwrap()).unwrap();

        let msg = sp.next_message().await.unwrap();
        assert_eq!(msg.as_ref(), payload.as_slice());
        expect_bytes(&mut remote, &ACK_BUFFER).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_checksum_is_naked() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        // SOF, length 3, payload AA BB, bad checksum
        remote
            .to_host
            .send(Bytes::from_static(&[0x01, 0x03, 0xaa, 0xbb, 0x00]))
            .unwrap();
        expect_bytes(&mut remote, &NAK_BUFFER).await;
        assert!(!sp.message_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_completes_on_ack() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        let payload = Bytes::from_static(&[0x00, 0x02]);
        let handle = sp.send(payload);
        expect_bytes(&mut remote, &hex::decode("01030002fe").unwrap()).await;
        remote.to_host.send(Bytes::from_static(&ACK_BUFFER)).unwrap();
        handle.wait().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_fails_on_nak() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        let handle = sp.send(Bytes::from_static(&[0x00, 0x02]));
        expect_bytes(&mut remote, &hex::decode("01030002fe").unwrap()).await;
        remote.to_host.send(Bytes::from_static(&NAK_BUFFER)).unwrap();
        assert!(matches!(
            handle.wait().await,
            Err(Error::Rejected(ControlByte::Nak))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_collision_cans_incoming_frame() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        let handle = sp.send(Bytes::from_static(&[0x00, 0x02]));
        expect_bytes(&mut remote, &hex::decode("01030002fe").unwrap()).await;

        // Instead of an ACK, the controller starts its own frame
        let incoming = hex::decode("00049901aabb").unwrap();
        remote.to_host.send(frame(&incoming).unwrap()).unwrap();

        assert!(matches!(handle.wait().await, Err(Error::Collision)));
        // The collided frame is answered with CAN and discarded
        expect_bytes(&mut remote, &CAN_BUFFER).await;
        assert!(!sp.message_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ack_timeout() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        let handle = sp.send(Bytes::from_static(&[0x00, 0x02]));
        expect_bytes(&mut remote, &hex::decode("01030002fe").unwrap()).await;
        // No ACK ever arrives; the 1.6s deadline fails the job
        assert!(matches!(handle.wait().await, Err(Error::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_eof_fails_pending_reads() {
        let (binding, mut remote) = mock_binding();
        let sp = SerialProtocol::new(Box::new(binding));
        startup(&mut remote).await;

        drop(remote.to_host);
        assert!(matches!(sp.next_message().await, Err(Error::EndOfStream)));
    }
}

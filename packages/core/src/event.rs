use tokio::sync::watch;

/// A level-triggered flag that tasks can wait on, in the spirit of the
/// `Notify`-plus-state pattern: `set` wakes all current and future waiters
/// until `clear` is called.
#[derive(Debug)]
pub struct Event {
    tx: watch::Sender<bool>,
}

impl Event {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once the flag is set. Returns immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as &self, so this cannot fail
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_set_wakes_waiter() {
        let event = Arc::new(Event::new());
        let waiter = {
            let event = event.clone();
            tokio::spawn(async move { event.wait().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());
        event.set();
        waiter.await.unwrap();
        assert!(event.is_set());
        event.clear();
        assert!(!event.is_set());
    }
}

use tokio::sync::watch;

/// Raises the shutdown signal for every [`ShutdownSignal`] cloned from the same pair.
#[derive(Debug)]
pub struct ShutdownTrigger {
    sender: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.sender.send_replace(true);
    }
}

/// Cooperative cancellation observed by in-flight detail lookups.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new() -> (ShutdownTrigger, ShutdownSignal) {
        let (sender, receiver) = watch::channel(false);
        (ShutdownTrigger { sender }, ShutdownSignal { receiver })
    }

    /// A signal that is never raised.
    pub fn never() -> Self {
        let (_trigger, signal) = Self::new();
        signal
    }

    pub fn is_raised(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the signal is raised. Pends forever if the trigger was dropped
    /// without firing.
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        loop {
            if *receiver.borrow_and_update() {
                return;
            }
            if receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

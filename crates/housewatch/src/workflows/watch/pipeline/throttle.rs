use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Fixed-interval gate: successive callers of [`RequestGate::wait`] are released at least
/// `min_interval` apart, however many tasks are waiting.
#[derive(Debug)]
pub struct RequestGate {
    min_interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestGate {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_slot: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub async fn wait(&self) {
        if self.min_interval.is_zero() {
            return;
        }

        // Held across the sleep so waiters are released one at a time.
        let mut next_slot = self.next_slot.lock().await;
        let now = Instant::now();
        let release = match *next_slot {
            Some(slot) if slot > now => {
                sleep_until(slot).await;
                slot
            }
            _ => now,
        };
        *next_slot = Some(release + self.min_interval);
    }
}

use async_trait::async_trait;
use std::cell::Cell;
use std::time::Duration;

use crate::env::Clock;

/// Clock that only moves when told to. Sleeping advances it instantly and
/// is recorded, so display-delay behavior can be asserted without waiting.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<i64>,
    slept: Cell<u64>,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: Cell::new(now_millis),
            slept: Cell::new(0),
        }
    }

    pub fn advance(&self, millis: i64) {
        self.now.set(self.now.get() + millis);
    }

    /// Total milliseconds spent in `sleep`
    pub fn slept_millis(&self) -> u64 {
        self.slept.get()
    }
}

#[async_trait(?Send)]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        self.slept.set(self.slept.get() + millis);
        self.advance(millis as i64);
    }
}

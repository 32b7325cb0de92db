use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Window {
    started_at: Instant,
    suppressed: u64,
}

/// Rate limits repetitive log lines per key.
///
/// Owned by whoever emits the noisy event; there is no process-wide instance.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    windows: Mutex<HashMap<&'static str, Window>>,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `Some(suppressed_count)` when a log for `key` should be emitted,
    /// otherwise `None` and the event is counted against the active window.
    pub fn should_emit(&self, key: &'static str) -> Option<u64> {
        let mut windows = self.windows.lock().expect("log throttle mutex poisoned");
        let now = Instant::now();

        match windows.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(Window {
                    started_at: now,
                    suppressed: 0,
                });
                Some(0)
            }
            Entry::Occupied(mut slot) => {
                let window = slot.get_mut();
                if now.duration_since(window.started_at) < self.interval {
                    window.suppressed += 1;
                    return None;
                }
                let suppressed = window.suppressed;
                window.started_at = now;
                window.suppressed = 0;
                Some(suppressed)
            }
        }
    }
}

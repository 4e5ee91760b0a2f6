//! Cancellable periodic loop for watch mode.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Longest uninterrupted sleep, so a stop request is noticed promptly.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Runs a tick immediately, then once per interval, until stopped.
#[derive(Debug, Clone)]
pub struct Periodic {
    interval: Duration,
    stop: Arc<AtomicBool>,
}

impl Periodic {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that ends the loop when set. Can be shared with a signal
    /// handler or another thread.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Call `tick` until stopped; returns the number of ticks run. The tick
    /// receives its 1-based count.
    pub fn run(&self, mut tick: impl FnMut(u64)) -> u64 {
        let mut ticks = 0;
        while !self.is_stopped() {
            ticks += 1;
            debug!(tick = ticks, "periodic tick");
            tick(ticks);

            let deadline = Instant::now() + self.interval;
            loop {
                if self.is_stopped() {
                    return ticks;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                std::thread::sleep((deadline - now).min(SLEEP_SLICE));
            }
        }
        ticks
    }
}

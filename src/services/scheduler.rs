use std::{sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

/// Whether a scheduler fires once or keeps firing until stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    /// Fire a single time after the delay.
    Once,
    /// Fire every `delay` until stopped.
    Every,
}

type Tick = Arc<dyn Fn() -> bool + Send + Sync>;

/// Single timer slot with a clear-before-set discipline.
///
/// Starting or resetting always aborts the previous task first, so a slot never has two timers
/// running. The tick callback returns `false` to end a repeating timer early (typically because
/// the receiving side of its channel is gone).
pub struct Scheduler {
    name: &'static str,
    delay: Duration,
    cadence: Cadence,
    tick: Option<Tick>,
    handle: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Timer that fires once, `delay` after each start.
    pub fn once(name: &'static str, delay: Duration) -> Self {
        Self::new(name, delay, Cadence::Once)
    }

    /// Timer that fires every `delay` after each start.
    pub fn every(name: &'static str, delay: Duration) -> Self {
        Self::new(name, delay, Cadence::Every)
    }

    fn new(name: &'static str, delay: Duration, cadence: Cadence) -> Self {
        Self {
            name,
            delay,
            cadence,
            tick: None,
            handle: None,
        }
    }

    /// Arm the timer with `tick`, replacing any pending one.
    pub fn start<F>(&mut self, tick: F)
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.tick = Some(Arc::new(tick));
        self.spawn();
    }

    /// Cancel the pending timer, if any.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!(timer = self.name, "timer cleared");
        }
    }

    /// Restart the countdown from now with the last callback. Does nothing when idle.
    pub fn reset(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.spawn();
        true
    }

    /// Whether a timer is pending.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn spawn(&mut self) {
        self.stop();
        let Some(tick) = self.tick.clone() else {
            return;
        };
        let delay = self.delay;
        let cadence = self.cadence;
        self.handle = Some(tokio::spawn(async move {
            loop {
                sleep(delay).await;
                if !tick() || cadence == Cadence::Once {
                    break;
                }
            }
        }));
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

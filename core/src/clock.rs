//! Logical tick counter.
//!
//! The clock is not a timer. It moves only when the host's tick signal is
//! delivered to [`TaskScheduler::on_tick`](crate::scheduler::TaskScheduler::on_tick),
//! which is its single writer.

/// One discrete step of the logical clock.
pub type Tick = u64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickClock {
    now: Tick,
}

impl TickClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current tick, without advancing.
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advance by exactly one tick and return the new value.
    pub fn advance(&mut self) -> Tick {
        // 20 ticks/s gives ~29 billion years before u64 overflows
        self.now += 1;
        self.now
    }
}

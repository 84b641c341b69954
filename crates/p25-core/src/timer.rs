/// Millisecond countdown timer clocked by the engine loop.
/// All engine timers are integer counters; no wall-clock reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    timeout_ms: u32,
    elapsed_ms: u32,
    running: bool,
}

impl Timer {
    pub fn new(timeout_ms: u32) -> Self {
        Timer { timeout_ms, elapsed_ms: 0, running: false }
    }

    /// Start (or restart) the countdown from zero.
    pub fn start(&mut self) {
        self.elapsed_ms = 0;
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.elapsed_ms = 0;
        self.running = false;
    }

    /// Change the timeout. Does not reset elapsed time.
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    /// Advance the timer. No effect while stopped.
    pub fn clock(&mut self, ms: u32) {
        if self.running {
            self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn has_expired(&self) -> bool {
        self.running && self.elapsed_ms >= self.timeout_ms
    }
}

pub mod components;
pub mod frame_shaper;
pub mod frame_utils;
pub mod trunk_bs;

/// Outcome of feeding one inbound frame to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessResult {
    /// The frame was decoded and acted on.
    Handled,
    /// The frame was dropped: undecodable, filtered, or not for us.
    Ignored,
}

impl ProcessResult {
    pub fn is_handled(&self) -> bool {
        matches!(self, ProcessResult::Handled)
    }
}

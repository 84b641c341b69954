/// Access control for subscriber and talkgroup IDs. The list source lives
/// outside the engine; only the decision surface is injected.
pub trait AccessControl: Send {
    /// Whether a unit ID may use system services.
    fn validate_src(&self, src_id: u32) -> bool;
    /// Whether a talkgroup ID may carry traffic.
    fn validate_tg(&self, tg_id: u32) -> bool;
}

/// Accepts every unit and talkgroup. The default for systems run without
/// an access list, and for tests.
pub struct PermitAll;

impl AccessControl for PermitAll {
    fn validate_src(&self, _src_id: u32) -> bool {
        true
    }

    fn validate_tg(&self, _tg_id: u32) -> bool {
        true
    }
}

/// Which interface an activity entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityPeer {
    Rf,
    Net,
}

/// System activity log. Distinct from tracing: these entries are the
/// operator-facing call record.
pub trait ActivityLog: Send {
    fn log(&mut self, peer: ActivityPeer, msg: &str);
}

/// Routes activity entries through the tracing subscriber.
pub struct TracingActivity;

impl ActivityLog for TracingActivity {
    fn log(&mut self, peer: ActivityPeer, msg: &str) {
        match peer {
            ActivityPeer::Rf => tracing::info!("P25 RF: {}", msg),
            ActivityPeer::Net => tracing::info!("P25 NET: {}", msg),
        }
    }
}

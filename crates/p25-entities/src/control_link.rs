use p25_core::p25_common::{NetState, RfState};
use p25_pdus::IdenTableEntry;

/// The trunking engine's view of the control process that owns it.
///
/// The engine never holds a reference back to its owner; it observes the
/// peer state it needs and pushes fully-built frames into the owner's
/// queues through this trait. Frames handed to the queue sinks carry the
/// two-byte modem tag.
pub trait ControlLink {
    // ---- observations --------------------------------------------------

    fn rf_state(&self) -> RfState;
    fn net_state(&self) -> NetState;
    /// Last talkgroup that carried RF voice traffic, 0 if none.
    fn rf_last_dst_id(&self) -> u32;
    /// Last talkgroup that carried network voice traffic, 0 if none.
    fn net_last_dst_id(&self) -> u32;
    /// Network talkgroup hang timer is running and has not expired.
    fn net_tg_hang_active(&self) -> bool;
    /// A continuous control-channel transmission is in progress.
    fn cc_running(&self) -> bool;
    /// RF transmission watchdog has expired; network writes are dropped.
    fn rf_timed_out(&self) -> bool;
    /// Channel identity table configured for this site.
    fn iden_entries(&self) -> Vec<IdenTableEntry>;

    // ---- side-effect sinks ---------------------------------------------

    /// Enqueue a frame to the modem transmit queue.
    fn write_queue_rf(&mut self, frame: &[u8]);
    /// Enqueue a frame to the network transmit queue.
    fn write_queue_net(&mut self, frame: &[u8]);
    /// Drop everything pending in the modem transmit queue.
    fn clear_queue_rf(&mut self);
    /// Transmit the modem preamble ahead of the next burst.
    fn write_preamble(&mut self);
    /// Transmit a plain terminator data unit.
    fn write_rf_tdu(&mut self);
    /// Stop the RF transmission watchdog.
    fn stop_rf_timeout(&mut self);
}

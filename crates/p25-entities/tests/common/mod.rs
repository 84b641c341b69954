//! Infrastructure for testing the trunking engine end to end: a recording
//! link that captures every outbound frame, and helpers to build inbound
//! TSDU frames and decode captured ones back into messages.

use p25_config::{ControlConfig, SharedConfig};
use p25_core::p25_common::{
    Direction, Duid, NetState, RfState, PAYLOAD_START_BIT, TSBK_FEC_LENGTH_BITS,
    TSBK_FEC_LENGTH_BYTES, TSDU_FRAME_LENGTH_BYTES, TSDU_TRIPLE_FRAME_LENGTH_BYTES,
};
use p25_entities::trunk::frame_utils;
use p25_entities::trunk::ProcessResult;
use p25_entities::{AccessControl, ControlLink, TracingActivity, TrunkBs};
use p25_pdus::edac::interleaver;
use p25_pdus::tsbk::{decode_tsbk, encode_tsbk, Tsbk};
use p25_pdus::IdenTableEntry;

/// Collects every frame and side effect the engine pushes at its owner.
pub struct RecordingLink {
    pub rf_state: RfState,
    pub net_state: NetState,
    pub rf_last_dst_id: u32,
    pub net_last_dst_id: u32,
    pub tg_hang_active: bool,
    pub cc_running: bool,
    pub rf_timed_out: bool,
    pub identities: Vec<IdenTableEntry>,

    pub rf_frames: Vec<Vec<u8>>,
    pub net_frames: Vec<Vec<u8>>,
    pub preambles: usize,
    pub queue_clears: usize,
    pub tdus: usize,
    pub rf_timeout_stops: usize,
}

impl RecordingLink {
    pub fn new() -> Self {
        RecordingLink {
            rf_state: RfState::Listening,
            net_state: NetState::Idle,
            rf_last_dst_id: 0,
            net_last_dst_id: 0,
            tg_hang_active: false,
            cc_running: false,
            rf_timed_out: false,
            identities: vec![],
            rf_frames: vec![],
            net_frames: vec![],
            preambles: 0,
            queue_clears: 0,
            tdus: 0,
            rf_timeout_stops: 0,
        }
    }
}

impl ControlLink for RecordingLink {
    fn rf_state(&self) -> RfState { self.rf_state }
    fn net_state(&self) -> NetState { self.net_state }
    fn rf_last_dst_id(&self) -> u32 { self.rf_last_dst_id }
    fn net_last_dst_id(&self) -> u32 { self.net_last_dst_id }
    fn net_tg_hang_active(&self) -> bool { self.tg_hang_active }
    fn cc_running(&self) -> bool { self.cc_running }
    fn rf_timed_out(&self) -> bool { self.rf_timed_out }
    fn iden_entries(&self) -> Vec<IdenTableEntry> { self.identities.clone() }

    fn write_queue_rf(&mut self, frame: &[u8]) { self.rf_frames.push(frame.to_vec()); }
    fn write_queue_net(&mut self, frame: &[u8]) { self.net_frames.push(frame.to_vec()); }
    fn clear_queue_rf(&mut self) { self.queue_clears += 1; }
    fn write_preamble(&mut self) { self.preambles += 1; }
    fn write_rf_tdu(&mut self) { self.tdus += 1; }
    fn stop_rf_timeout(&mut self) { self.rf_timeout_stops += 1; }
}

/// Access control with explicit deny lists.
pub struct DenyListAcl {
    pub bad_units: Vec<u32>,
    pub bad_groups: Vec<u32>,
}

impl AccessControl for DenyListAcl {
    fn validate_src(&self, src_id: u32) -> bool {
        !self.bad_units.contains(&src_id)
    }

    fn validate_tg(&self, tg_id: u32) -> bool {
        !self.bad_groups.contains(&tg_id)
    }
}

/// Default configuration for the reference test site: NET 52, SYS $293,
/// RFSS 1, site 1, control channel 1, voice pool [2, 3, 4].
pub fn default_test_config() -> ControlConfig {
    let mut cfg = ControlConfig::default();
    cfg.site.nac = 0x293;
    cfg.site.net_id = 52;
    cfg.site.sys_id = 0x293;
    cfg.site.rfss_id = 1;
    cfg.site.site_id = 1;
    cfg.site.lra = 0;
    cfg.site.channel_id = 1;
    cfg.site.channel_no = 1;
    cfg.site.callsign = "W1ABC".to_string();
    cfg.control.voice_channels = vec![2, 3, 4];
    cfg
}

pub struct TrunkHarness {
    pub engine: TrunkBs,
    pub link: RecordingLink,
}

impl TrunkHarness {
    pub fn new(cfg: ControlConfig) -> Self {
        Self::with_acl(cfg, Box::new(p25_entities::PermitAll))
    }

    pub fn with_acl(cfg: ControlConfig, acl: Box<dyn AccessControl>) -> Self {
        let shared = SharedConfig::from_config(cfg);
        let engine = TrunkBs::new(shared, acl, Box::new(TracingActivity));
        TrunkHarness { engine, link: RecordingLink::new() }
    }

    /// Encode a TSBK into a complete single-block TSDU frame as the modem
    /// would deliver it.
    pub fn build_rf_frame(&self, tsbk: &Tsbk) -> Vec<u8> {
        let mut frame = vec![0u8; TSDU_FRAME_LENGTH_BYTES];
        frame_utils::add_sync(&mut frame);
        frame_utils::encode_nid(&mut frame, 0x293, Duid::Tsdu);
        let coded = encode_tsbk(tsbk, false);
        frame_utils::place_bits(&mut frame, PAYLOAD_START_BIT, &coded, TSBK_FEC_LENGTH_BITS);
        frame
    }

    pub fn submit_rf(&mut self, tsbk: &Tsbk) -> ProcessResult {
        let frame = self.build_rf_frame(tsbk);
        self.engine.process_rf(&mut self.link, &frame)
    }

    pub fn submit_net(&mut self, tsbk: &Tsbk) -> ProcessResult {
        let frame = self.build_rf_frame(tsbk);
        self.engine.process_net(&mut self.link, &frame, Duid::Tsdu)
    }

    /// Drain and decode everything queued to the modem.
    pub fn take_rf_tsbks(&mut self) -> Vec<Tsbk> {
        let frames = std::mem::take(&mut self.link.rf_frames);
        decode_tsdu_frames(&frames)
    }

    /// Drain and decode everything queued to the network.
    pub fn take_net_tsbks(&mut self) -> Vec<Tsbk> {
        let frames = std::mem::take(&mut self.link.net_frames);
        decode_tsdu_frames(&frames)
    }
}

/// Decode tagged TSDU frames (single or triple) back into messages.
/// Non-TSDU frames are skipped.
pub fn decode_tsdu_frames(frames: &[Vec<u8>]) -> Vec<Tsbk> {
    let mut out = vec![];

    for frame in frames {
        if frame.len() < TSDU_FRAME_LENGTH_BYTES + 2 {
            continue;
        }
        let body = &frame[2..];

        let Some((_nac, duid)) = frame_utils::decode_nid(body) else {
            continue;
        };
        if duid != Duid::Tsdu {
            continue;
        }

        let blocks = if body.len() >= TSDU_TRIPLE_FRAME_LENGTH_BYTES { 3 } else { 1 };
        let mut stacked = vec![0u8; TSBK_FEC_LENGTH_BYTES * blocks];
        if blocks == 1 {
            frame_utils::extract_bits(body, PAYLOAD_START_BIT, &mut stacked,
                TSBK_FEC_LENGTH_BITS);
        } else {
            // triple bursts carry their payload permuted
            let mut extracted = vec![0u8; TSBK_FEC_LENGTH_BYTES * blocks];
            frame_utils::extract_bits(body, PAYLOAD_START_BIT, &mut extracted,
                TSBK_FEC_LENGTH_BITS * blocks);
            interleaver::deinterleave_mbf(&extracted, &mut stacked);
        }

        for i in 0..blocks {
            let mut coded = [0u8; TSBK_FEC_LENGTH_BYTES];
            frame_utils::get_bit_range(&stacked, i * TSBK_FEC_LENGTH_BITS, &mut coded,
                TSBK_FEC_LENGTH_BITS);
            if let Ok(tsbk) = decode_tsbk(&coded, Direction::Outbound) {
                out.push(tsbk);
            }
        }
    }

    out
}

//! Assembles outbound TSBKs and TDULCs into complete air frames and hands
//! them to the owning process's transmit queues.
//!
//! Single-block TSDUs (SBF) carry one TSBK; when the control channel is
//! transmitting continuously, single blocks are rerouted into the
//! multi-block assembler (MBF), which stacks three coded TSBKs into one
//! triple-length burst. The assembler's staging buffer is a fixed inline
//! array; its cursor round-robins through successive bursts.

use p25_core::p25_common::{
    Duid, TAG_DATA, TAG_EOT, TDULC_FRAME_LENGTH_BITS, TDULC_FRAME_LENGTH_BYTES,
    TDULC_LC_LENGTH_BITS, TSBK_FEC_LENGTH_BITS, TSBK_FEC_LENGTH_BYTES, TSBK_MBF_CNT,
    TSDU_FRAME_LENGTH_BITS, TSDU_FRAME_LENGTH_BYTES, TSDU_TRIPLE_FRAME_LENGTH_BITS,
    TSDU_TRIPLE_FRAME_LENGTH_BYTES, PAYLOAD_START_BIT, SS0_START,
};
use p25_core::SiteData;
use p25_pdus::edac::{interleaver, trellis};
use p25_pdus::tdulc::{encode_tdulc, Tdulc, TdulcLco};
use p25_pdus::tsbk::{encode_tsbk, Tsbk};

use crate::control_link::ControlLink;
use crate::trunk::frame_utils;

/// Advertised service class bits.
pub mod svc_cls {
    pub const REG: u8 = 0x01;
    pub const DATA: u8 = 0x08;
    pub const VOICE: u8 = 0x10;
}

const MBF_BUFFER_BYTES: usize = TSBK_FEC_LENGTH_BYTES * TSBK_MBF_CNT;

pub struct FrameShaper {
    site: SiteData,
    callsign: String,
    net_active: bool,
    site_ch_cnt: u8,
    duplex: bool,
    continuous_control: bool,
    hang_count: u32,
    verbose: bool,
    debug: bool,
    skip_sbf_preamble: bool,

    /// TDULC templates seeded from the voice path's link control
    rf_lc: Tdulc,
    net_lc: Tdulc,

    mbf: [u8; MBF_BUFFER_BYTES],
    mbf_cnt: usize,
}

impl FrameShaper {
    pub fn new(site: SiteData, duplex: bool, continuous_control: bool, hang_count: u32,
        verbose: bool, debug: bool) -> Self
    {
        FrameShaper {
            site,
            callsign: "CHANGEME".to_string(),
            net_active: false,
            site_ch_cnt: 1,
            duplex,
            continuous_control,
            hang_count,
            verbose,
            debug,
            skip_sbf_preamble: false,
            rf_lc: Tdulc::call(TdulcLco::CallTerm, 0, 0),
            net_lc: Tdulc::call(TdulcLco::CallTerm, 0, 0),
            mbf: [0u8; MBF_BUFFER_BYTES],
            mbf_cnt: 0,
        }
    }

    // ---- template state -------------------------------------------------

    /// New site identity; all subsequent outbound frames carry it.
    pub fn set_site_data(&mut self, site: SiteData) {
        self.site = site;
        self.rf_lc.site = site;
        self.net_lc.site = site;
    }

    pub fn site(&self) -> SiteData {
        self.site
    }

    pub fn set_callsign(&mut self, callsign: String) {
        self.callsign = callsign;
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn set_net_active(&mut self, active: bool) {
        self.net_active = active;
    }

    pub fn set_site_ch_cnt(&mut self, ch_cnt: u8) {
        self.site_ch_cnt = ch_cnt;
    }

    pub fn site_ch_cnt(&self) -> u8 {
        self.site_ch_cnt
    }

    pub fn set_skip_sbf_preamble(&mut self, skip: bool) {
        self.skip_sbf_preamble = skip;
    }

    /// Seed the RF TDULC template from a voice link control word.
    pub fn set_rf_lc(&mut self, lc: &Tdulc) {
        let mut tpl = lc.clone();
        tpl.encrypted = lc.emergency;
        tpl.site = self.site;
        self.rf_lc = tpl;
    }

    /// Seed the network TDULC template from a voice link control word.
    pub fn set_net_lc(&mut self, lc: &Tdulc) {
        let mut tpl = lc.clone();
        tpl.encrypted = lc.emergency;
        tpl.site = self.site;
        self.net_lc = tpl;
    }

    pub fn rf_lc(&self) -> &Tdulc {
        &self.rf_lc
    }

    pub fn net_lc(&self) -> &Tdulc {
        &self.net_lc
    }

    pub fn svc_class(&self) -> u8 {
        svc_cls::VOICE | svc_cls::DATA | svc_cls::REG
    }

    // ---- TSDU builders --------------------------------------------------

    fn build_tsdu_sbf(&self, tsbk: &Tsbk) -> [u8; TSDU_FRAME_LENGTH_BYTES] {
        let mut frame = [0u8; TSDU_FRAME_LENGTH_BYTES];
        frame_utils::add_sync(&mut frame);
        frame_utils::encode_nid(&mut frame, self.site.nac, Duid::Tsdu);

        let coded = encode_tsbk(tsbk, false);
        frame_utils::place_bits(&mut frame, PAYLOAD_START_BIT, &coded, TSBK_FEC_LENGTH_BITS);

        frame_utils::add_busy_bits(&mut frame, TSDU_FRAME_LENGTH_BITS, true, false);
        frame_utils::set_status_pair(&mut frame, SS0_START, true, true);
        frame
    }

    fn tag_frame(tag: u8, frame: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(frame.len() + 2);
        out.push(tag);
        out.push(0x00);
        out.extend_from_slice(frame);
        out
    }

    /// Write a single-block TSDU. Reroutes into the MBF when the control
    /// channel is transmitting continuously.
    pub fn write_rf_tsdu_sbf(&mut self, link: &mut dyn ControlLink, tsbk: &mut Tsbk,
        no_network: bool, clear_before_write: bool)
    {
        tsbk.last_block = true;
        let frame = self.build_tsdu_sbf(tsbk);

        if !no_network && !link.rf_timed_out() {
            link.write_queue_net(&Self::tag_frame(TAG_DATA, &frame));
        }

        if self.continuous_control || link.cc_running() {
            self.write_rf_tsdu_mbf(link, tsbk, clear_before_write);
            return;
        }

        if clear_before_write {
            link.clear_queue_rf();
        }

        if !self.skip_sbf_preamble {
            link.write_preamble();
        }
        self.skip_sbf_preamble = false;

        if self.duplex {
            link.write_queue_rf(&Self::tag_frame(TAG_DATA, &frame));
        }

        if self.debug {
            tracing::debug!("TX P25 frame (SBF) TSDU: {:02X?}", &frame[..]);
        }
    }

    /// Append a TSBK to the multi-block assembler; emits a triple-length
    /// TSDU once the third block lands. MBF requires duplex operation.
    pub fn write_rf_tsdu_mbf(&mut self, link: &mut dyn ControlLink, tsbk: &mut Tsbk,
        clear_before_write: bool)
    {
        if !self.duplex {
            self.mbf = [0u8; MBF_BUFFER_BYTES];
            self.mbf_cnt = 0;
            return;
        }

        if self.mbf_cnt == 0 {
            self.mbf = [0u8; MBF_BUFFER_BYTES];
        }

        if self.mbf_cnt + 1 == TSBK_MBF_CNT {
            tsbk.last_block = true;
            let coded = Self::code_block(tsbk);
            frame_utils::set_bit_range(&mut self.mbf, self.mbf_cnt * TSBK_FEC_LENGTH_BITS,
                &coded, TSBK_FEC_LENGTH_BITS);

            let mut frame = [0u8; TSDU_TRIPLE_FRAME_LENGTH_BYTES];
            frame_utils::add_sync(&mut frame);
            frame_utils::encode_nid(&mut frame, self.site.nac, Duid::Tsdu);

            // the stacked payload rides the burst permuted, not in block order
            let mut permuted = [0u8; MBF_BUFFER_BYTES];
            interleaver::interleave_mbf(&self.mbf, &mut permuted);
            frame_utils::place_bits(&mut frame, PAYLOAD_START_BIT, &permuted,
                TSBK_FEC_LENGTH_BITS * TSBK_MBF_CNT);
            frame_utils::add_busy_bits(&mut frame, TSDU_TRIPLE_FRAME_LENGTH_BITS, true, false);
            frame_utils::add_idle_bits(&mut frame, TSDU_TRIPLE_FRAME_LENGTH_BITS, true, true);

            if clear_before_write {
                link.clear_queue_rf();
            }
            link.write_queue_rf(&Self::tag_frame(TAG_DATA, &frame));

            if self.debug {
                tracing::debug!("TX P25 frame (MBF) TSDU: {:02X?}", &frame[..]);
            }

            self.mbf = [0u8; MBF_BUFFER_BYTES];
            self.mbf_cnt = 0;
            return;
        }

        tsbk.last_block = false;
        let coded = Self::code_block(tsbk);
        frame_utils::set_bit_range(&mut self.mbf, self.mbf_cnt * TSBK_FEC_LENGTH_BITS,
            &coded, TSBK_FEC_LENGTH_BITS);
        self.mbf_cnt += 1;
    }

    fn code_block(tsbk: &Tsbk) -> [u8; TSBK_FEC_LENGTH_BYTES] {
        let raw = encode_tsbk(tsbk, true);
        let mut block = [0u8; 12];
        block.copy_from_slice(&raw);
        trellis::encode(&block)
    }

    pub fn mbf_cnt(&self) -> usize {
        self.mbf_cnt
    }

    pub fn reset_mbf(&mut self) {
        self.mbf = [0u8; MBF_BUFFER_BYTES];
        self.mbf_cnt = 0;
    }

    // ---- TDULC builders -------------------------------------------------

    fn build_tdulc(&self, lc: &Tdulc) -> [u8; TDULC_FRAME_LENGTH_BYTES] {
        let mut frame = [0u8; TDULC_FRAME_LENGTH_BYTES];
        frame_utils::add_sync(&mut frame);
        frame_utils::encode_nid(&mut frame, self.site.nac, Duid::Tdulc);
        let word = encode_tdulc(lc);
        frame_utils::place_bits(&mut frame, PAYLOAD_START_BIT, &word, TDULC_LC_LENGTH_BITS);
        frame_utils::add_busy_bits(&mut frame, TDULC_FRAME_LENGTH_BITS, true, true);
        frame
    }

    /// Write one TDULC frame to the modem (duplex only) and, unless
    /// suppressed, to the network.
    pub fn write_rf_tdulc(&mut self, link: &mut dyn ControlLink, lc: &Tdulc, no_network: bool) {
        let frame = self.build_tdulc(lc);

        link.stop_rf_timeout();

        if !no_network {
            link.write_queue_net(&Self::tag_frame(TAG_EOT, &frame));
        }

        if self.duplex {
            link.write_queue_rf(&Self::tag_frame(TAG_EOT, &frame));
        }

        if self.debug {
            tracing::debug!("TX P25 frame TDULC: {:02X?}", &frame[..]);
        }
    }

    /// Voice channel grant terminator: four repetitions of the call LC.
    pub fn write_rf_tdulc_chan_grant(&mut self, link: &mut dyn ControlLink, grp: bool,
        src_id: u32, dst_id: u32)
    {
        link.write_rf_tdu();

        if src_id == 0 || dst_id == 0 {
            return;
        }

        let lco = if grp { TdulcLco::Group } else { TdulcLco::Private };
        for _ in 0..4 {
            let lc = Tdulc::call(lco, src_id, dst_id);
            self.write_rf_tdulc(link, &lc, true);
        }
    }

    /// Voice channel release: hang-time replay of the call LC interleaved
    /// with site broadcasts, closed by a call termination.
    pub fn write_rf_tdulc_chan_release(&mut self, link: &mut dyn ControlLink, grp: bool,
        src_id: u32, dst_id: u32)
    {
        let count = self.hang_count / 2;
        let lco = if grp { TdulcLco::Group } else { TdulcLco::Private };

        for _ in 0..count {
            if src_id != 0 && dst_id != 0 {
                let lc = Tdulc::call(lco, src_id, dst_id);
                self.write_rf_tdulc(link, &lc, true);
            }

            let lc = Tdulc::broadcast(TdulcLco::NetStsBcast, self.site);
            self.write_rf_tdulc(link, &lc, true);
            let lc = Tdulc::broadcast(TdulcLco::RfssStsBcast, self.site);
            self.write_rf_tdulc(link, &lc, true);
        }

        let (term_src, term_dst) = if src_id != 0 && dst_id != 0 {
            (src_id, dst_id)
        } else {
            (self.rf_lc.src_id, self.rf_lc.dst_id)
        };

        if self.verbose {
            tracing::info!("P25 TDULC, CALL_TERM (Call Termination), srcId = {}, dstId = {}",
                term_src, term_dst);
        }

        let lc = Tdulc::call(TdulcLco::CallTerm, term_src, term_dst);
        self.write_rf_tdulc(link, &lc, true);

        self.rf_lc = Tdulc::call(TdulcLco::CallTerm, 0, 0);
    }

    // ---- network builders -----------------------------------------------

    /// Re-serialize a TSBK to the outbound network queue.
    pub fn write_net_tsdu(&mut self, link: &mut dyn ControlLink, tsbk: &mut Tsbk) {
        tsbk.last_block = true;
        let frame = self.build_tsdu_sbf(tsbk);
        link.write_queue_net(&Self::tag_frame(TAG_DATA, &frame));
    }

    /// Terminator to the outbound network queue.
    pub fn write_net_tdulc(&mut self, link: &mut dyn ControlLink, lc: &Tdulc) {
        let frame = self.build_tdulc(lc);
        link.write_queue_net(&Self::tag_frame(TAG_EOT, &frame));
    }
}

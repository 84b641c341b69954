//! The control-channel trunking engine.
//!
//! Consumes decoded TSBKs from the RF and network directions, applies access
//! control and registry checks, produces outbound TSBKs through the frame
//! shaper, schedules the periodic control-channel broadcasts, and ages out
//! channel grants and adjacent sites. All state lives on the engine thread;
//! the owning process is reached only through the injected [`ControlLink`].

use p25_config::SharedConfig;
use p25_core::p25_common::{
    ans, deny, ext_fnct, que, rsp, Direction, Duid, NetState, RfState,
    ADJ_SITE_TIMER_TIMEOUT_MS, PAYLOAD_START_BIT, TGID_ALL, TSBK_FEC_LENGTH_BITS,
    TSBK_FEC_LENGTH_BYTES, TSDU_FRAME_LENGTH_BYTES, WUID_SYS,
};
use p25_core::{SiteData, Timer};
use p25_pdus::tdulc::Tdulc;
use p25_pdus::tsbk::{
    decode_tsbk, lco, AckRsp, AdjStsBcast, CallAlrt, CanSrvReq, DenyRsp, ExtFnct, GrpAff,
    GrpAffQ, GrpVch, MotCcBsi, MotGrgAdd, MotPshCch, MsgUpdt, NetStsBcast, QueRsp,
    RfssStsBcast, SndcpChAnn, StsUpdt, Tsbk, TsbkPayload, UDeregAck, URegCmd, UReg, UuAns,
    UuVch,
};

use crate::acl::AccessControl;
use crate::activity::{ActivityLog, ActivityPeer};
use crate::control_link::ControlLink;
use crate::trunk::components::adj_sites::AdjSites;
use crate::trunk::components::affiliations::Affiliations;
use crate::trunk::components::channel_grants::ChannelGrants;
use crate::trunk::components::status_cmd::{StatusAction, StatusCodes, StatusCommand, StatusConsume};
use crate::trunk::frame_shaper::FrameShaper;
use crate::trunk::frame_utils;
use crate::trunk::ProcessResult;

/// Broadcasts the periodic scheduler can queue into the MBF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CtrlBcast {
    IdenUp,
    RfssSts,
    NetSts,
    AdjSts,
    SndcpChAnn,
    MotPshCch,
    MotCcBsi,
}

pub struct TrunkBs {
    config: SharedConfig,
    acl: Box<dyn AccessControl>,
    activity: Box<dyn ActivityLog>,

    shaper: FrameShaper,
    affiliations: Affiliations,
    grants: ChannelGrants,
    adj_sites: AdjSites,
    status_cmd: StatusCommand,

    site: SiteData,
    adj_site_timer: Timer,
    adj_site_update_interval_ms: u32,
    mbf_iden_cnt: usize,
    mbf_adj_ss_cnt: usize,

    net_active: bool,
    voice_ch_cnt: u8,

    verbose: bool,
    debug: bool,
    control: bool,
    verify_reg: bool,
    verify_aff: bool,
    inhibit_illegal: bool,
    no_status_ack: bool,
    no_message_ack: bool,
    status_cmd_enable: bool,
    ack_rsp_swap: bool,
    patch_super_group: u16,
}

impl TrunkBs {
    pub fn new(config: SharedConfig, acl: Box<dyn AccessControl>, activity: Box<dyn ActivityLog>) -> Self {
        let cfg = config.config();
        let site = SiteData::new(
            cfg.site.net_id, cfg.site.sys_id, cfg.site.rfss_id, cfg.site.site_id,
            cfg.site.lra, cfg.site.channel_id, cfg.site.channel_no,
        ).with_nac(cfg.site.nac);

        let c = &cfg.control;
        let mut shaper = FrameShaper::new(site, c.duplex, c.continuous_control, c.hang_count,
            c.verbose, c.debug);
        shaper.set_callsign(cfg.site.callsign.clone());

        let mut grants = ChannelGrants::new();
        grants.preload(&c.voice_channels);
        let voice_ch_cnt = c.voice_channels.len() as u8;
        shaper.set_site_ch_cnt(voice_ch_cnt);

        let codes = StatusCodes {
            check: c.status_radio_check,
            inhibit: c.status_radio_inhibit,
            uninhibit: c.status_radio_uninhibit,
            force_reg: c.status_radio_force_reg,
            force_dereg: c.status_radio_force_dereg,
        };

        let adj_site_update_interval_ms = ADJ_SITE_TIMER_TIMEOUT_MS + c.cc_bcst_interval_ms;
        let mut adj_site_timer = Timer::new(adj_site_update_interval_ms);
        adj_site_timer.start();

        TrunkBs {
            acl,
            activity,
            shaper,
            affiliations: Affiliations::new(),
            grants,
            adj_sites: AdjSites::new(),
            status_cmd: StatusCommand::new(c.status_cmd_enable, codes),
            site,
            adj_site_timer,
            adj_site_update_interval_ms,
            mbf_iden_cnt: 0,
            mbf_adj_ss_cnt: 0,
            net_active: false,
            voice_ch_cnt,
            verbose: c.verbose,
            debug: c.debug,
            control: c.control,
            verify_reg: c.verify_reg,
            verify_aff: c.verify_aff,
            inhibit_illegal: c.inhibit_illegal,
            no_status_ack: c.no_status_ack,
            no_message_ack: c.no_message_ack,
            status_cmd_enable: c.status_cmd_enable,
            ack_rsp_swap: c.ack_rsp_swap,
            patch_super_group: c.patch_super_group,
            config,
        }
    }

    // ---- configuration surface ------------------------------------------

    /// Reconfigure the local site identity; propagates into the frame
    /// shaper's RF and network templates.
    pub fn set_site_data(&mut self, site: SiteData) {
        self.site = site;
        self.shaper.set_site_data(site);
    }

    pub fn set_callsign(&mut self, callsign: String) {
        self.shaper.set_callsign(callsign);
    }

    pub fn set_net_active(&mut self, active: bool) {
        self.net_active = active;
        self.shaper.set_net_active(active);
        self.config.state_write().network_active = active;
    }

    pub fn set_site_ch_cnt(&mut self, ch_cnt: u8) {
        self.shaper.set_site_ch_cnt(ch_cnt);
    }

    /// Replace the voice channel pool.
    pub fn preload_voice_pool(&mut self, channels: &[u16]) {
        self.grants.preload(channels);
        self.voice_ch_cnt = channels.len() as u8;
        self.update_site_ch_cnt();
    }

    /// Seed the RF terminator template from a voice link control word.
    pub fn set_rf_lc(&mut self, lc: &Tdulc) {
        self.shaper.set_rf_lc(lc);
    }

    /// Seed the network terminator template from a voice link control word.
    pub fn set_net_lc(&mut self, lc: &Tdulc) {
        self.shaper.set_net_lc(lc);
    }

    pub fn shaper(&self) -> &FrameShaper {
        &self.shaper
    }

    pub fn shaper_mut(&mut self) -> &mut FrameShaper {
        &mut self.shaper
    }

    // ---- registry surface -----------------------------------------------

    pub fn has_unit_reg(&self, src_id: u32) -> bool {
        self.affiliations.has_unit_reg(src_id)
    }

    pub fn has_aff(&self, src_id: u32, dst_id: u32) -> bool {
        self.affiliations.has_aff(src_id, dst_id)
    }

    pub fn has_grant(&self, dst_id: u32) -> bool {
        self.grants.has_grant(dst_id)
    }

    pub fn is_ch_busy(&self, ch_no: u16) -> bool {
        self.grants.is_ch_busy(ch_no)
    }

    pub fn granted_ch(&self, dst_id: u32) -> Option<u16> {
        self.grants.granted_ch(dst_id)
    }

    pub fn grant_count(&self) -> usize {
        self.grants.grant_count()
    }

    pub fn free_channel_count(&self) -> usize {
        self.grants.free_count()
    }

    pub fn adj_site_count(&self) -> usize {
        self.adj_sites.len()
    }

    pub fn adj_site_update_cnt(&self, site_id: u8) -> Option<u8> {
        self.adj_sites.get(site_id).map(|e| e.update_cnt)
    }

    pub fn touch_grant(&mut self, dst_id: u32) {
        self.grants.touch(dst_id);
    }

    /// Return a granted channel to the pool.
    pub fn release_grant(&mut self, dst_id: u32, release_all: bool) {
        let released = self.grants.release(dst_id, release_all);
        if !released.is_empty() {
            self.update_site_ch_cnt();
        }
    }

    /// Drop group affiliations and acknowledge each affected unit over RF.
    pub fn clear_grp_aff(&mut self, link: &mut dyn ControlLink, dst_id: u32, release_all: bool) {
        let affected = self.affiliations.clear_aff(dst_id, release_all);
        for src_id in affected {
            self.write_rf_tsdu_u_dereg_ack(link, src_id);
        }
    }

    fn update_site_ch_cnt(&mut self) {
        let advertised = self.voice_ch_cnt.saturating_add(self.grants.grant_count() as u8);
        self.shaper.set_site_ch_cnt(advertised);
    }

    // ---- inbound: RF ----------------------------------------------------

    /// Entry point for a demodulated TSDU frame.
    pub fn process_rf(&mut self, link: &mut dyn ControlLink, frame: &[u8]) -> ProcessResult {
        if frame.len() < TSDU_FRAME_LENGTH_BYTES {
            tracing::warn!("P25, short RF frame, len = {}", frame.len());
            return ProcessResult::Ignored;
        }

        let Some((nac, duid)) = frame_utils::decode_nid(frame) else {
            if link.rf_state() != RfState::Listening {
                tracing::warn!("P25, NID decode failure");
            }
            return ProcessResult::Ignored;
        };

        if nac != self.site.nac {
            tracing::warn!("P25, NAC mismatch, nac = ${:03X}", nac);
            return ProcessResult::Ignored;
        }

        if duid != Duid::Tsdu {
            tracing::error!("P25 unhandled data DUID, duid = ${:02X}", duid as u8);
            return ProcessResult::Ignored;
        }

        let mut coded = [0u8; TSBK_FEC_LENGTH_BYTES];
        frame_utils::extract_bits(frame, PAYLOAD_START_BIT, &mut coded, TSBK_FEC_LENGTH_BITS);
        let tsbk = match decode_tsbk(&coded, Direction::Inbound) {
            Ok(tsbk) => tsbk,
            Err(e) => {
                tracing::warn!("P25 TSDU, undecodable LC: {:?}", e);
                return ProcessResult::Ignored;
            }
        };

        link.clear_queue_rf();

        self.status_cmd.disarm_unless(matches!(
            tsbk.payload,
            TsbkPayload::CallAlrt(_) | TsbkPayload::ExtFnct(_)
        ));

        link.write_preamble();

        let src_id = tsbk.src_id;
        let dst_id = tsbk.dst_id;

        match tsbk.payload.clone() {
            TsbkPayload::GrpVch(p) => self.rx_grp_vch(link, src_id, dst_id, p),
            TsbkPayload::UuVch(_) => self.rx_uu_vch(link, src_id, dst_id),
            TsbkPayload::UuAns(p) => self.rx_uu_ans(link, src_id, dst_id, p),
            TsbkPayload::TeleIntAns(p) => self.rx_tele_int_ans(link, src_id, dst_id, p.response),
            TsbkPayload::StsUpdt(p) => self.rx_sts_updt(link, &tsbk, p),
            TsbkPayload::MsgUpdt(p) => self.rx_msg_updt(link, &tsbk, p),
            TsbkPayload::CallAlrt(_) => self.rx_call_alrt(link, src_id, dst_id),
            TsbkPayload::AckRsp(p) => self.rx_ack_rsp(link, &tsbk, p),
            TsbkPayload::CanSrvReq(p) => self.rx_can_srv_req(link, src_id, dst_id, p),
            TsbkPayload::ExtFnct(p) => self.rx_ext_fnct(link, &tsbk, p),
            TsbkPayload::GrpAff(_) => self.rx_grp_aff(link, src_id, dst_id),
            TsbkPayload::GrpAffQRsp(_) => self.rx_grp_aff_q_rsp(link, src_id, dst_id),
            TsbkPayload::UDeregReq(_) => self.rx_u_dereg_req(link, src_id, dst_id),
            TsbkPayload::UReg(p) => self.rx_u_reg(link, src_id, p.sys_id),
            TsbkPayload::LocRegReq(_) => self.rx_loc_reg_req(link, src_id, dst_id),
            _ => {
                tracing::error!("P25 TSDU, unhandled LCO, mfId = ${:02X}, lco = ${:02X}",
                    tsbk.mfid, tsbk.lco());
            }
        }

        ProcessResult::Handled
    }

    fn rx_grp_vch(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32, p: GrpVch) {
        const PCKT: &str = "GRP_VCH (Group Voice Channel Request)";
        if !self.check_control(link, PCKT, lco::GRP_VCH, src_id, dst_id)
            || !self.check_src(link, PCKT, lco::GRP_VCH, src_id, dst_id)
            || !self.check_tg(link, PCKT, lco::GRP_VCH, src_id, dst_id)
            || !self.check_aff(link, PCKT, lco::GRP_VCH, src_id, dst_id)
        {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received group grant request from {} to TG {}", src_id, dst_id));

        self.write_rf_tsdu_grant(link, true, false, src_id, dst_id, p.svc_opts);
    }

    fn rx_uu_vch(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "UU_VCH (Unit-to-Unit Voice Channel Request)";
        if !self.check_control(link, PCKT, lco::UU_VCH, src_id, dst_id)
            || !self.check_src(link, PCKT, lco::UU_VCH, src_id, dst_id)
            || !self.check_dst_unit(link, PCKT, lco::UU_VCH, src_id, dst_id)
            || !self.check_reg(link, PCKT, lco::UU_VCH, src_id, dst_id)
        {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received unit-to-unit grant request from {} to {}", src_id, dst_id));

        self.write_rf_tsdu_uu_ans_req(link, src_id, dst_id);
    }

    fn rx_uu_ans(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32, p: UuAns) {
        const PCKT: &str = "UU_ANS (Unit-to-Unit Answer Response)";
        if !self.check_control(link, PCKT, lco::UU_ANS, src_id, dst_id)
            || !self.check_src(link, PCKT, lco::UU_ANS, src_id, dst_id)
            || !self.check_dst_unit(link, PCKT, lco::UU_ANS, src_id, dst_id)
        {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, response = ${:02X}, srcId = {}, dstId = {}",
                PCKT, p.response, src_id, dst_id);
        }

        self.write_rf_tsdu_ack_fne(link, src_id, lco::UU_ANS, true);

        match p.response {
            ans::PROCEED => {
                self.write_rf_tsdu_grant(link, false, false, src_id, dst_id, p.svc_opts);
            }
            ans::DENY => {
                self.write_rf_tsdu_deny(link, deny::TGT_UNIT_REFUSED, lco::UU_ANS, src_id, dst_id);
            }
            ans::WAIT => {
                self.write_rf_tsdu_queue(link, que::TGT_UNIT_QUEUED, lco::UU_ANS, src_id, dst_id);
            }
            _ => {}
        }
    }

    fn rx_tele_int_ans(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32, response: u8) {
        const PCKT: &str = "TELE_INT_ANS (Telephone Interconnect Answer Response)";
        if !self.check_control(link, PCKT, lco::TELE_INT_ANS, src_id, dst_id)
            || !self.check_src(link, PCKT, lco::TELE_INT_ANS, src_id, dst_id)
        {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, response = ${:02X}, srcId = {}", PCKT, response, src_id);
        }

        self.write_rf_tsdu_ack_fne(link, src_id, lco::TELE_INT_ANS, true);

        // interconnect is not served; a proceed is denied outright, and a
        // deny from the unit answers with a second ack rather than a deny
        match response {
            ans::PROCEED => {
                self.write_rf_tsdu_deny(link, deny::SYS_UNSUPPORTED_SVC, lco::TELE_INT_ANS,
                    src_id, dst_id);
            }
            ans::DENY => {
                self.write_rf_tsdu_ack_fne(link, src_id, lco::TELE_INT_ANS, true);
            }
            ans::WAIT => {
                self.write_rf_tsdu_queue(link, que::TGT_UNIT_QUEUED, lco::TELE_INT_ANS,
                    src_id, dst_id);
            }
            _ => {}
        }
    }

    fn rx_sts_updt(&mut self, link: &mut dyn ControlLink, tsbk: &Tsbk, p: StsUpdt) {
        const PCKT: &str = "STS_UPDT (Status Update)";
        let src_id = tsbk.src_id;
        if !self.check_src(link, PCKT, lco::STS_UPDT, src_id, tsbk.dst_id) {
            return;
        }

        if self.status_cmd.is_idle() {
            let mut copy = tsbk.clone();
            self.shaper.write_net_tsdu(link, &mut copy);
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, status = ${:02X}, srcId = {}", PCKT, p.status, src_id);
        }
        self.activity.log(ActivityPeer::Rf, &format!("received status update from {}", src_id));

        if !self.no_status_ack {
            self.write_rf_tsdu_ack_fne(link, src_id, lco::STS_UPDT, false);
        }

        if self.status_cmd_enable {
            self.status_cmd.preprocess(src_id, p.unit_status());
        }
    }

    fn rx_msg_updt(&mut self, link: &mut dyn ControlLink, tsbk: &Tsbk, p: MsgUpdt) {
        const PCKT: &str = "MSG_UPDT (Message Update)";
        let src_id = tsbk.src_id;
        if !self.check_src(link, PCKT, lco::MSG_UPDT, src_id, tsbk.dst_id) {
            return;
        }

        let mut copy = tsbk.clone();
        self.shaper.write_net_tsdu(link, &mut copy);

        if self.verbose {
            tracing::info!("P25 TSDU, {}, message = ${:02X}, srcId = {}, dstId = {}",
                PCKT, p.message, src_id, tsbk.dst_id);
        }

        if !self.no_message_ack {
            self.write_rf_tsdu_ack_fne(link, src_id, lco::MSG_UPDT, false);
        }

        self.activity.log(ActivityPeer::Rf, &format!("received message update from {}", src_id));
    }

    fn rx_call_alrt(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "CALL_ALRT (Call Alert)";
        if !self.check_src(link, PCKT, lco::CALL_ALRT, src_id, dst_id) {
            return;
        }

        if self.status_cmd_enable {
            match self.status_cmd.consume(src_id, dst_id) {
                StatusConsume::Action(action) => {
                    self.exec_status_action(link, action);
                    self.write_rf_tsdu_ack_fne(link, src_id, lco::CALL_ALRT, false);
                    return;
                }
                StatusConsume::WrongSrc => {
                    return;
                }
                StatusConsume::NotArmed => {}
            }
        }

        if !self.check_dst_unit(link, PCKT, lco::CALL_ALRT, src_id, dst_id) {
            return;
        }

        self.write_rf_tsdu_call_alrt(link, src_id, dst_id);
    }

    fn rx_ack_rsp(&mut self, link: &mut dyn ControlLink, tsbk: &Tsbk, p: AckRsp) {
        const PCKT: &str = "ACK_RSP (Acknowledge Response)";
        let (src_id, dst_id) = (tsbk.src_id, tsbk.dst_id);
        if !self.check_src(link, PCKT, lco::ACK_RSP, src_id, dst_id)
            || !self.check_dst_unit(link, PCKT, lco::ACK_RSP, src_id, dst_id)
        {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, AIV = {}, serviceType = ${:02X}, srcId = {}, dstId = {}",
                PCKT, p.aiv, p.service, src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received ack response from {} to {}", src_id, dst_id));

        let mut out = tsbk.clone();
        if self.ack_rsp_swap && !p.aiv && dst_id != 0 {
            if let TsbkPayload::AckRsp(ref mut a) = out.payload {
                a.aiv = true;
            }
            out.src_id = dst_id;
            out.dst_id = src_id;
        }

        self.shaper.write_rf_tsdu_sbf(link, &mut out, false, false);
    }

    fn rx_can_srv_req(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32, p: CanSrvReq) {
        if self.verbose {
            tracing::info!(
                "P25 TSDU, CAN_SRV_REQ (Cancel Service Request), AIV = {}, serviceType = ${:02X}, reason = ${:02X}, srcId = {}, dstId = {}",
                p.aiv, p.service, p.reason, src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received cancel service request from {}", src_id));

        self.write_rf_tsdu_ack_fne(link, src_id, lco::CAN_SRV_REQ, true);
    }

    fn rx_ext_fnct(&mut self, link: &mut dyn ControlLink, tsbk: &Tsbk, p: ExtFnct) {
        const PCKT: &str = "EXT_FNCT (Extended Function)";
        if self.verbose {
            tracing::info!("P25 TSDU, {}, op = ${:02X}, arg = {}, tgt = {}",
                PCKT, p.function, tsbk.dst_id, tsbk.src_id);
        }

        let mut out = tsbk.clone();

        // an armed status command turns the response into an ack echo
        if self.status_cmd_enable && self.status_cmd.is_armed() {
            out = Tsbk::new(tsbk.src_id, tsbk.dst_id,
                TsbkPayload::AckRsp(AckRsp { aiv: true, service: lco::CALL_ALRT }));
            if self.verbose {
                tracing::info!("P25 TSDU, ACK_RSP (Acknowledge Response), serviceType = ${:02X}, srcId = {}",
                    lco::CALL_ALRT, self.status_cmd.armed_src());
            }
        }

        match p.function {
            ext_fnct::CHECK_ACK => self.activity.log(ActivityPeer::Rf,
                &format!("received radio check response from {} to {}", tsbk.dst_id, tsbk.src_id)),
            ext_fnct::INHIBIT_ACK => self.activity.log(ActivityPeer::Rf,
                &format!("received radio inhibit response from {} to {}", tsbk.dst_id, tsbk.src_id)),
            ext_fnct::UNINHIBIT_ACK => self.activity.log(ActivityPeer::Rf,
                &format!("received radio uninhibit response from {} to {}", tsbk.dst_id, tsbk.src_id)),
            _ => {}
        }

        self.shaper.write_rf_tsdu_sbf(link, &mut out, true, false);
        self.status_cmd.disarm();
    }

    fn rx_grp_aff(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "GRP_AFF (Group Affiliation Request)";
        if !self.check_control(link, PCKT, lco::GRP_AFF, src_id, dst_id) {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }

        self.write_rf_tsdu_ack_fne(link, src_id, lco::GRP_AFF, true);
        self.write_rf_tsdu_grp_aff_rsp(link, src_id, dst_id);
    }

    fn rx_grp_aff_q_rsp(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "GRP_AFF_Q_RSP (Group Affiliation Query Response)";
        if !self.check_control(link, PCKT, lco::GRP_AFF_Q_RSP, src_id, dst_id) {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received group affiliation query response from {} to TG {}", src_id, dst_id));
    }

    fn rx_u_dereg_req(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "U_DEREG_REQ (Unit Deregistration Request)";
        if !self.check_control(link, PCKT, lco::U_DEREG_REQ, src_id, dst_id)
            || !self.check_src(link, PCKT, lco::U_DEREG_REQ, src_id, dst_id)
        {
            return;
        }

        // make sure the request answers toward a real address
        let dst_id = if dst_id == 0 { WUID_SYS } else { dst_id };
        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }

        self.write_rf_tsdu_ack_fne(link, src_id, lco::U_DEREG_REQ, true);
        self.write_rf_tsdu_u_dereg_ack(link, src_id);
    }

    fn rx_u_reg(&mut self, link: &mut dyn ControlLink, src_id: u32, req_sys_id: u16) {
        const PCKT: &str = "U_REG (Unit Registration Request)";
        if !self.check_control(link, PCKT, lco::U_REG, src_id, 0) {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}", PCKT, src_id);
        }

        self.write_rf_tsdu_ack_fne(link, src_id, lco::U_REG, true);
        self.write_rf_tsdu_u_reg_rsp(link, src_id, req_sys_id);
    }

    fn rx_loc_reg_req(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        const PCKT: &str = "LOC_REG_REQ (Location Registration Request)";
        if !self.check_control(link, PCKT, lco::LOC_REG_REQ, src_id, dst_id) {
            return;
        }

        if self.verbose {
            tracing::info!("P25 TSDU, {}, srcId = {}, dstId = {}", PCKT, src_id, dst_id);
        }

        self.write_rf_tsdu_u_reg_cmd(link, src_id);
    }

    // ---- inbound: network ------------------------------------------------

    /// Entry point for a TSDU frame arriving from the backhaul.
    pub fn process_net(&mut self, link: &mut dyn ControlLink, frame: &[u8], duid: Duid) -> ProcessResult {
        if link.rf_state() != RfState::Listening && link.net_state() == NetState::Idle {
            return ProcessResult::Ignored;
        }

        if duid != Duid::Tsdu {
            return ProcessResult::Ignored;
        }
        if link.net_state() != NetState::Idle {
            return ProcessResult::Ignored;
        }

        if frame.len() < TSDU_FRAME_LENGTH_BYTES {
            return ProcessResult::Ignored;
        }
        let mut coded = [0u8; TSBK_FEC_LENGTH_BYTES];
        frame_utils::extract_bits(frame, PAYLOAD_START_BIT, &mut coded, TSBK_FEC_LENGTH_BITS);
        let tsbk = match decode_tsbk(&coded, Direction::Outbound) {
            Ok(tsbk) => tsbk,
            Err(e) => {
                tracing::warn!("P25 TSDU, undecodable network LC: {:?}", e);
                return ProcessResult::Ignored;
            }
        };

        // adjacent site bookkeeping never reflects back out
        if let TsbkPayload::AdjStsBcast(ref adj) = tsbk.payload {
            if !self.control {
                return ProcessResult::Ignored;
            }
            if adj.site_id != self.site.site_id {
                if self.verbose {
                    tracing::info!(
                        "P25 TSDU, ADJ_STS_BCAST (Adjacent Site Status Broadcast), sysId = ${:03X}, rfss = ${:02X}, site = ${:02X}, chId = {}, chNo = {}",
                        adj.sys_id, adj.rfss_id, adj.site_id, adj.ch_id, adj.ch_no);
                }
                let site = SiteData::adj_site(adj.sys_id, adj.rfss_id, adj.site_id,
                    adj.ch_id, adj.ch_no, adj.cfva);
                self.adj_sites.upsert(site);
            }
            return ProcessResult::Handled;
        }

        self.status_cmd.disarm_unless(matches!(
            tsbk.payload,
            TsbkPayload::CallAlrt(_) | TsbkPayload::ExtFnct(_)
        ));

        let src_id = tsbk.src_id;
        let dst_id = tsbk.dst_id;

        match tsbk.payload {
            TsbkPayload::UuAns(ref p) => {
                if self.verbose {
                    if p.response > 0 {
                        tracing::info!("P25 TSDU, UU_ANS (Unit-to-Unit Answer Response), response = ${:02X}, srcId = {}, dstId = {}",
                            p.response, src_id, dst_id);
                    } else {
                        tracing::info!("P25 TSDU, UU_ANS (Unit-to-Unit Answer Request), srcId = {}, dstId = {}",
                            src_id, dst_id);
                    }
                }
            }
            TsbkPayload::StsUpdt(_) => {
                if !self.check_src_net("STS_UPDT (Status Update)", src_id) {
                    return ProcessResult::Ignored;
                }
                self.activity.log(ActivityPeer::Net,
                    &format!("received status update from {}", src_id));
            }
            TsbkPayload::MsgUpdt(_) => {
                if !self.check_src_net("MSG_UPDT (Message Update)", src_id) {
                    return ProcessResult::Ignored;
                }
                self.activity.log(ActivityPeer::Net,
                    &format!("received message update from {}", src_id));
            }
            TsbkPayload::CallAlrt(_) => {
                if !self.check_src_net("CALL_ALRT (Call Alert)", src_id)
                    || !self.check_dst_net("CALL_ALRT (Call Alert)", dst_id)
                {
                    return ProcessResult::Ignored;
                }
                self.activity.log(ActivityPeer::Net,
                    &format!("received call alert request from {} to {}", src_id, dst_id));
            }
            TsbkPayload::AckRsp(_) => {
                if !self.check_src_net("ACK_RSP (Acknowledge Response)", src_id)
                    || !self.check_dst_net("ACK_RSP (Acknowledge Response)", dst_id)
                {
                    return ProcessResult::Ignored;
                }
                self.activity.log(ActivityPeer::Net,
                    &format!("received ack response from {} to {}", src_id, dst_id));
            }
            TsbkPayload::ExtFnct(_) => {
                if !self.check_dst_net("EXT_FNCT (Extended Function)", dst_id) {
                    return ProcessResult::Ignored;
                }
                self.status_cmd.disarm();
            }
            TsbkPayload::GrpAff(_) | TsbkPayload::UDeregAck(_) => {
                // mobility commands from the network are informational only
                return ProcessResult::Handled;
            }
            TsbkPayload::DenyRsp(ref p) => {
                if self.verbose {
                    tracing::info!("P25 TSDU, DENY_RSP (Deny Response), AIV = {}, reason = ${:02X}, srcId = {}, dstId = {}",
                        p.aiv, p.reason, src_id, dst_id);
                }
            }
            TsbkPayload::QueRsp(ref p) => {
                if self.verbose {
                    tracing::info!("P25 TSDU, QUE_RSP (Queue Response), AIV = {}, reason = ${:02X}, srcId = {}, dstId = {}",
                        p.aiv, p.reason, src_id, dst_id);
                }
            }
            _ => {
                tracing::error!("P25 TSDU, unhandled network LCO, mfId = ${:02X}, lco = ${:02X}",
                    tsbk.mfid, tsbk.lco());
                return ProcessResult::Ignored;
            }
        }

        let mut copy = tsbk;
        self.shaper.write_net_tsdu(link, &mut copy);
        ProcessResult::Handled
    }

    /// Announce the local site to the network as an adjacent-site broadcast.
    pub fn write_adj_ss_network(&mut self, link: &mut dyn ControlLink) {
        if !self.control || !self.net_active {
            return;
        }

        if self.verbose {
            tracing::info!(
                "P25 TSDU, ADJ_STS_BCAST (Adjacent Site Status Broadcast), network announce, {}",
                self.site);
        }

        let cfva = p25_core::p25_common::CFVA_CONV | p25_core::p25_common::CFVA_VALID;
        let payload = AdjStsBcast::from_site(&self.site, cfva, self.shaper.svc_class());
        let mut tsbk = Tsbk::new(0, 0, TsbkPayload::AdjStsBcast(payload));
        self.shaper.write_net_tsdu(link, &mut tsbk);
    }

    // ---- clocking --------------------------------------------------------

    /// Advance all engine timers. Expected on a steady cadence of at most
    /// one call per 20 ms.
    pub fn clock(&mut self, ms: u32) {
        if !self.control {
            return;
        }

        // grants whose lease ran out fall back into the pool
        let expired = self.grants.clock_expired(ms);
        for dst_id in expired {
            self.release_grant(dst_id, false);
        }
        if !self.grants.check_consistency() {
            self.update_site_ch_cnt();
        }

        self.adj_site_timer.clock(ms);
        if self.adj_site_timer.is_running() && self.adj_site_timer.has_expired() {
            for site in self.adj_sites.tick() {
                tracing::warn!(
                    "P25 TSDU, ADJ_STS_BCAST (Adjacent Site Status Broadcast), no data [FAILED], {}",
                    site);
            }

            self.adj_site_timer.set_timeout(self.adj_site_update_interval_ms);
            self.adj_site_timer.start();
        }
    }

    // ---- periodic control broadcasts --------------------------------------

    /// Queue the control-channel broadcast mix for one frame slot. `n`
    /// selects the sequence; a terminal `frame_cnt` of 255 emits the full
    /// six-sequence burst.
    pub fn write_rf_control_data(&mut self, link: &mut dyn ControlLink, frame_cnt: u8, n: u8,
        adj_ss: bool)
    {
        if !self.control {
            return;
        }

        let seq_cnt: u8 = if frame_cnt == 255 { 6 } else { 0 };
        let mut n = n;
        let mut i = 0u8;

        loop {
            if self.debug {
                tracing::debug!("writeRF_ControlData, mbfCnt = {}, frameCnt = {}, seq = {}, adjSS = {}",
                    self.shaper.mbf_cnt(), frame_cnt, n, adj_ss);
            }

            match n {
                0 => self.queue_tsbk_ctrl_mbf(link, CtrlBcast::IdenUp),
                1 => self.queue_tsbk_ctrl_mbf(link, CtrlBcast::RfssSts),
                2 => self.queue_tsbk_ctrl_mbf(link, CtrlBcast::NetSts),
                3 => self.queue_tsbk_ctrl_mbf(link, CtrlBcast::SndcpChAnn),
                4 => {
                    if adj_ss {
                        self.queue_tsbk_ctrl_mbf(link, CtrlBcast::AdjSts);
                    }
                }
                _ => {}
            }

            if seq_cnt > 0 {
                n += 1;
            }
            i += 1;
            if i > seq_cnt {
                break;
            }
        }

        let bsi = frame_cnt % 64 == 0;
        if bsi || frame_cnt == 255 {
            self.queue_tsbk_ctrl_mbf(link, CtrlBcast::MotCcBsi);
        }

        // after the terminal burst, pad the MBF out to a full triple
        if seq_cnt > 4 {
            if self.shaper.mbf_cnt() == 1 {
                self.queue_tsbk_ctrl_mbf(link, CtrlBcast::RfssSts);
                self.queue_tsbk_ctrl_mbf(link, CtrlBcast::NetSts);
                if self.debug {
                    tracing::debug!("writeRF_ControlData, have 1 pad 2, mbfCnt = {}", self.shaper.mbf_cnt());
                }
            }

            if self.shaper.mbf_cnt() == 2 {
                if link.iden_entries().len() > 1 {
                    self.queue_tsbk_ctrl_mbf(link, CtrlBcast::IdenUp);
                } else {
                    self.queue_tsbk_ctrl_mbf(link, CtrlBcast::RfssSts);
                }
                if self.debug {
                    tracing::debug!("writeRF_ControlData, have 2 pad 1, mbfCnt = {}", self.shaper.mbf_cnt());
                }
            }

            self.shaper.reset_mbf();
        }
    }

    fn queue_tsbk_ctrl_mbf(&mut self, link: &mut dyn ControlLink, bcast: CtrlBcast) {
        let svc_class = self.shaper.svc_class();

        let payload = match bcast {
            CtrlBcast::IdenUp => {
                let entries = link.iden_entries();
                if entries.is_empty() {
                    return;
                }
                if self.mbf_iden_cnt >= entries.len() {
                    self.mbf_iden_cnt = 0;
                }
                let entry = entries[self.mbf_iden_cnt];
                self.mbf_iden_cnt += 1;

                if entry.is_vhf_uhf() {
                    TsbkPayload::IdenUpVu(entry.to_iden_up_vu())
                } else {
                    TsbkPayload::IdenUp(entry.to_iden_up())
                }
            }
            CtrlBcast::NetSts => {
                TsbkPayload::NetStsBcast(NetStsBcast::from_site(&self.site, svc_class))
            }
            CtrlBcast::RfssSts => {
                TsbkPayload::RfssStsBcast(RfssStsBcast::from_site(&self.site, svc_class))
            }
            CtrlBcast::AdjSts => {
                let Some(entry) = self.adj_sites.cycle(&mut self.mbf_adj_ss_cnt) else {
                    return;
                };
                let cfva = AdjSites::cfva_for(&entry);
                TsbkPayload::AdjStsBcast(AdjStsBcast::from_site(&entry.site, cfva, svc_class))
            }
            CtrlBcast::SndcpChAnn => TsbkPayload::SndcpChAnn(SndcpChAnn::default()),
            CtrlBcast::MotPshCch => TsbkPayload::MotPshCch(MotPshCch),
            CtrlBcast::MotCcBsi => TsbkPayload::MotCcBsi(MotCcBsi {
                callsign: self.shaper.callsign().to_string(),
                ch_id: self.site.channel_id,
                ch_no: self.site.channel_no,
            }),
        };

        let mut tsbk = Tsbk::new(0, 0, payload);
        tsbk.last_block = true;
        self.shaper.write_rf_tsdu_mbf(link, &mut tsbk, false);
    }

    // ---- grant algorithm --------------------------------------------------

    /// Grant (or re-grant) a voice channel. With `skip` the collision and
    /// pool checks are bypassed and only the grant frame is produced.
    pub fn write_rf_tsdu_grant(&mut self, link: &mut dyn ControlLink, grp: bool, skip: bool,
        src_id: u32, dst_id: u32, svc_opts: u8) -> bool
    {
        // all-call has no grant
        if dst_id == TGID_ALL {
            return true;
        }

        let service = if grp { lco::GRP_VCH } else { lco::UU_VCH };

        if !skip {
            if link.rf_state() != RfState::Listening && link.rf_state() != RfState::Data {
                tracing::warn!(
                    "P25 TSDU, grant denied, traffic in progress, dstId = {}", dst_id);
                self.write_rf_tsdu_deny(link, deny::PTT_COLLIDE, service, src_id, dst_id);
                return false;
            }

            if link.net_state() != NetState::Idle && dst_id == link.net_last_dst_id() {
                tracing::warn!(
                    "P25 TSDU, grant denied, traffic in progress, dstId = {}", dst_id);
                self.write_rf_tsdu_deny(link, deny::PTT_COLLIDE, service, src_id, dst_id);
                return false;
            }

            // don't grant over a foreign talkgroup during its hang time
            if link.rf_last_dst_id() != 0
                && link.rf_last_dst_id() != dst_id
                && link.net_tg_hang_active()
            {
                return false;
            }

            if !self.grants.has_grant(dst_id) {
                if self.grants.acquire(dst_id).is_none() {
                    tracing::warn!(
                        "P25 TSDU, grant queued, no channels available, dstId = {}", dst_id);
                    self.write_rf_tsdu_queue(link, que::CHN_RESOURCE_NOT_AVAIL, service,
                        src_id, dst_id);
                    return false;
                }
                self.update_site_ch_cnt();
            } else {
                self.grants.touch(dst_id);
            }
        }

        let ch_no = self.grants.granted_ch(dst_id).unwrap_or(0);

        if self.verbose {
            tracing::info!(
                "P25 TSDU, {} (Voice Channel Grant), chNo = {}, srcId = {}, dstId = {}",
                if grp { "GRP_VCH" } else { "UU_VCH" }, ch_no, src_id, dst_id);
        }

        let payload = if grp {
            TsbkPayload::GrpVch(GrpVch { svc_opts, ch_id: self.site.channel_id, ch_no })
        } else {
            TsbkPayload::UuVch(UuVch { ch_id: self.site.channel_id, ch_no })
        };
        let mut tsbk = Tsbk::new(src_id, dst_id, payload);
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, true, true);
        true
    }

    // ---- response and command writers -------------------------------------

    fn write_rf_tsdu_uu_ans_req(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        if self.verbose {
            tracing::info!("P25 TSDU, UU_ANS (Unit-to-Unit Answer Request), srcId = {}, dstId = {}",
                src_id, dst_id);
        }

        let mut tsbk = Tsbk::new(src_id, dst_id,
            TsbkPayload::UuAns(UuAns { svc_opts: 0, response: 0 }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    fn write_rf_tsdu_ack_fne(&mut self, link: &mut dyn ControlLink, src_id: u32, service: u8,
        no_network: bool)
    {
        if self.verbose {
            tracing::info!("P25 TSDU, ACK_RSP (Acknowledge Response), serviceType = ${:02X}, srcId = {}",
                service, src_id);
        }

        let mut tsbk = Tsbk::new(src_id, 0,
            TsbkPayload::AckRsp(AckRsp { aiv: true, service }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, no_network, false);
    }

    fn write_rf_tsdu_deny(&mut self, link: &mut dyn ControlLink, reason: u8, service: u8,
        src_id: u32, dst_id: u32)
    {
        if self.verbose {
            tracing::info!("P25 TSDU, DENY_RSP (Deny Response), reason = ${:02X}, srcId = {}, dstId = {}",
                reason, src_id, dst_id);
        }

        let mut tsbk = Tsbk::new(src_id, dst_id,
            TsbkPayload::DenyRsp(DenyRsp { aiv: true, service, reason }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    fn write_rf_tsdu_queue(&mut self, link: &mut dyn ControlLink, reason: u8, service: u8,
        src_id: u32, dst_id: u32)
    {
        if self.verbose {
            tracing::info!("P25 TSDU, QUE_RSP (Queue Response), reason = ${:02X}, srcId = {}, dstId = {}",
                reason, src_id, dst_id);
        }

        let mut tsbk = Tsbk::new(src_id, dst_id,
            TsbkPayload::QueRsp(QueRsp { aiv: true, service, reason }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    fn write_rf_tsdu_call_alrt(&mut self, link: &mut dyn ControlLink, src_id: u32, dst_id: u32) {
        if self.verbose {
            tracing::info!("P25 TSDU, CALL_ALRT (Call Alert), srcId = {}, dstId = {}", src_id, dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received call alert request from {} to {}", src_id, dst_id));

        let mut tsbk = Tsbk::new(src_id, dst_id, TsbkPayload::CallAlrt(CallAlrt));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    /// Extended function command. The source field carries the argument.
    pub fn write_rf_tsdu_ext_func(&mut self, link: &mut dyn ControlLink, func: u16, arg: u32,
        dst_id: u32)
    {
        if self.verbose {
            tracing::info!("P25 TSDU, EXT_FNCT (Extended Function), op = ${:02X}, arg = {}, tgt = {}",
                func, arg, dst_id);
        }

        match func {
            ext_fnct::CHECK => self.activity.log(ActivityPeer::Rf,
                &format!("received radio check request from {} to {}", arg, dst_id)),
            ext_fnct::INHIBIT => self.activity.log(ActivityPeer::Rf,
                &format!("received radio inhibit request from {} to {}", arg, dst_id)),
            ext_fnct::UNINHIBIT => self.activity.log(ActivityPeer::Rf,
                &format!("received radio uninhibit request from {} to {}", arg, dst_id)),
            _ => {}
        }

        let mut tsbk = Tsbk::new(arg, dst_id,
            TsbkPayload::ExtFnct(ExtFnct { function: func }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    /// Group affiliation query addressed from the system.
    pub fn write_rf_tsdu_grp_aff_q(&mut self, link: &mut dyn ControlLink, dst_id: u32) {
        if self.verbose {
            tracing::info!("P25 TSDU, GRP_AFF_Q (Group Affiliation Query), dstId = {}", dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received group affiliation query command from {} to {}", WUID_SYS, dst_id));

        let mut tsbk = Tsbk::new(WUID_SYS, dst_id, TsbkPayload::GrpAffQ(GrpAffQ));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, true, false);
    }

    /// Unit registration command addressed from the system.
    pub fn write_rf_tsdu_u_reg_cmd(&mut self, link: &mut dyn ControlLink, dst_id: u32) {
        if self.verbose {
            tracing::info!("P25 TSDU, U_REG_CMD (Unit Registration Command), dstId = {}", dst_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received unit registration command from {} to {}", WUID_SYS, dst_id));

        let mut tsbk = Tsbk::new(WUID_SYS, dst_id, TsbkPayload::URegCmd(URegCmd));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, true, false);
    }

    /// Patch supergroup announcement.
    pub fn write_rf_tsdu_mot_patch(&mut self, link: &mut dyn ControlLink, group1: u16,
        group2: u16, group3: u16)
    {
        if self.verbose {
            tracing::info!(
                "P25 TSDU, MOT_GRG_ADD (Group Regroup Add - Patch Supergroup), superGrp = {}, group1 = {}, group2 = {}, group3 = {}",
                self.patch_super_group, group1, group2, group3);
        }

        let mut tsbk = Tsbk::new(0, 0, TsbkPayload::MotGrgAdd(MotGrgAdd {
            super_group: self.patch_super_group,
            group1,
            group2,
            group3,
        }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, true, false);
    }

    /// Group affiliation response; updates the affiliation table on accept.
    pub fn write_rf_tsdu_grp_aff_rsp(&mut self, link: &mut dyn ControlLink, src_id: u32,
        dst_id: u32) -> bool
    {
        let mut response = rsp::ACCEPT;

        if !self.acl.validate_src(src_id) {
            tracing::warn!(
                "P25 TSDU, GRP_AFF (Group Affiliation Response) denial, RID rejection, srcId = {}",
                src_id);
            response = rsp::DENY;
        }

        if !self.affiliations.has_unit_reg(src_id) && self.verify_reg {
            tracing::warn!(
                "P25 TSDU, GRP_AFF (Group Affiliation Response) denial, RID not registered, srcId = {}",
                src_id);
            response = rsp::DENY;
        }

        if !self.acl.validate_tg(dst_id) {
            tracing::warn!(
                "P25 TSDU, GRP_AFF (Group Affiliation Response) denial, TGID rejection, dstId = {}",
                dst_id);
            response = rsp::REFUSED;
        }

        let accepted = response == rsp::ACCEPT;
        if accepted {
            if self.verbose {
                tracing::info!(
                    "P25 TSDU, GRP_AFF (Group Affiliation Response), anncId = {}, srcId = {}, dstId = {}",
                    self.patch_super_group, src_id, dst_id);
            }
            self.activity.log(ActivityPeer::Rf,
                &format!("received group affiliation request from {} to TG {}", src_id, dst_id));

            self.affiliations.set_aff(src_id, dst_id);
        }

        let mut tsbk = Tsbk::new(src_id, dst_id, TsbkPayload::GrpAff(GrpAff {
            response,
            announce_group: self.patch_super_group,
        }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
        accepted
    }

    /// Unit registration response; updates the registration table on accept.
    /// The response addresses both source and destination with the
    /// registering unit, which deployed subscribers require.
    pub fn write_rf_tsdu_u_reg_rsp(&mut self, link: &mut dyn ControlLink, src_id: u32,
        req_sys_id: u16)
    {
        let mut response = rsp::ACCEPT;

        if req_sys_id != self.site.sys_id {
            tracing::warn!(
                "P25 TSDU, U_REG (Unit Registration Response) denial, SYSID rejection, sysId = ${:03X}",
                req_sys_id);
            response = rsp::DENY;
        }

        if !self.acl.validate_src(src_id) {
            tracing::warn!(
                "P25 TSDU, U_REG (Unit Registration Response) denial, RID rejection, srcId = {}",
                src_id);
            response = rsp::DENY;
        }

        if response == rsp::ACCEPT {
            if self.verbose {
                tracing::info!(
                    "P25 TSDU, U_REG (Unit Registration Response), srcId = {}, sysId = ${:03X}",
                    src_id, self.site.sys_id);
            }
            self.activity.log(ActivityPeer::Rf,
                &format!("received unit registration request from {}", src_id));

            self.affiliations.add_unit_reg(src_id);
        }

        let mut tsbk = Tsbk::new(src_id, src_id, TsbkPayload::UReg(UReg {
            response,
            sys_id: self.site.sys_id,
        }));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, true, false);

        if !self.acl.validate_src(src_id) {
            self.denial_inhibit(link, src_id);
        }
    }

    /// Deregistration acknowledgment; drops registration and affiliation.
    pub fn write_rf_tsdu_u_dereg_ack(&mut self, link: &mut dyn ControlLink, src_id: u32) {
        if self.verbose {
            tracing::info!("P25 TSDU, U_DEREG_ACK (Unit Deregistration Acknowledge), srcId = {}",
                src_id);
        }
        self.activity.log(ActivityPeer::Rf,
            &format!("received unit deregistration request from {}", src_id));

        self.affiliations.remove_unit_reg(src_id);

        let mut tsbk = Tsbk::new(WUID_SYS, src_id, TsbkPayload::UDeregAck(UDeregAck));
        self.shaper.write_rf_tsdu_sbf(link, &mut tsbk, false, false);
    }

    // ---- status command actions -------------------------------------------

    fn exec_status_action(&mut self, link: &mut dyn ControlLink, action: StatusAction) {
        match action {
            StatusAction::Check { src_id, dst_id } => {
                self.write_rf_tsdu_ext_func(link, ext_fnct::CHECK, src_id, dst_id);
            }
            StatusAction::Inhibit { dst_id } => {
                self.write_rf_tsdu_ext_func(link, ext_fnct::INHIBIT, WUID_SYS, dst_id);
            }
            StatusAction::Uninhibit { dst_id } => {
                self.write_rf_tsdu_ext_func(link, ext_fnct::UNINHIBIT, WUID_SYS, dst_id);
            }
            StatusAction::ForceReg { src_id, dst_id } => {
                self.affiliations.add_unit_reg(src_id);
                self.write_rf_tsdu_grp_aff_rsp(link, src_id, dst_id);
            }
            StatusAction::ForceDereg { src_id } => {
                self.write_rf_tsdu_u_dereg_ack(link, src_id);
            }
            StatusAction::Unhandled => {}
        }
    }

    // ---- precondition checks ----------------------------------------------

    fn check_control(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.control {
            tracing::warn!("P25 TSDU, {} denial, unsupported service, srcId = {}", pckt, src_id);
            self.write_rf_tsdu_deny(link, deny::SYS_UNSUPPORTED_SVC, service, src_id, dst_id);
            return false;
        }
        true
    }

    fn check_src(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.acl.validate_src(src_id) {
            tracing::warn!("P25 TSDU, {} denial, RID rejection, srcId = {}", pckt, src_id);
            self.write_rf_tsdu_deny(link, deny::REQ_UNIT_NOT_VALID, service, src_id, dst_id);
            self.denial_inhibit(link, src_id);
            return false;
        }
        true
    }

    fn check_dst_unit(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.acl.validate_src(dst_id) {
            tracing::warn!("P25 TSDU, {} denial, RID rejection, dstId = {}", pckt, dst_id);
            self.write_rf_tsdu_deny(link, deny::TGT_UNIT_NOT_VALID, service, src_id, dst_id);
            return false;
        }
        true
    }

    fn check_tg(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.acl.validate_tg(dst_id) {
            tracing::warn!("P25 TSDU, {} denial, TGID rejection, dstId = {}", pckt, dst_id);
            self.write_rf_tsdu_deny(link, deny::TGT_GROUP_NOT_VALID, service, src_id, dst_id);
            return false;
        }
        true
    }

    fn check_reg(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.affiliations.has_unit_reg(src_id) && self.verify_reg {
            tracing::warn!("P25 TSDU, {} denial, RID not registered, srcId = {}", pckt, src_id);
            self.write_rf_tsdu_deny(link, deny::REQ_UNIT_NOT_AUTH, service, src_id, dst_id);
            self.write_rf_tsdu_u_reg_cmd(link, src_id);
            return false;
        }
        true
    }

    fn check_aff(&mut self, link: &mut dyn ControlLink, pckt: &str, service: u8,
        src_id: u32, dst_id: u32) -> bool
    {
        if !self.affiliations.has_aff(src_id, dst_id) && self.verify_aff {
            tracing::warn!("P25 TSDU, {} denial, RID not affiliated to TGID, srcId = {}, dstId = {}",
                pckt, src_id, dst_id);
            self.write_rf_tsdu_deny(link, deny::REQ_UNIT_NOT_AUTH, service, src_id, dst_id);
            self.write_rf_tsdu_u_reg_cmd(link, src_id);
            return false;
        }
        true
    }

    fn check_src_net(&self, pckt: &str, src_id: u32) -> bool {
        if !self.acl.validate_src(src_id) {
            tracing::warn!("P25 TSDU, {} denial, RID rejection, srcId = {}", pckt, src_id);
            return false;
        }
        true
    }

    fn check_dst_net(&self, pckt: &str, dst_id: u32) -> bool {
        if !self.acl.validate_src(dst_id) {
            tracing::warn!("P25 TSDU, {} denial, RID rejection, dstId = {}", pckt, dst_id);
            return false;
        }
        true
    }

    /// Automatically inhibit a unit whose source ID failed access control.
    fn denial_inhibit(&mut self, link: &mut dyn ControlLink, src_id: u32) {
        if !self.inhibit_illegal {
            return;
        }

        if !self.acl.validate_src(src_id) {
            tracing::warn!("P25 TSDU, denial, system auto-inhibit RID, srcId = {}", src_id);
            self.write_rf_tsdu_ext_func(link, ext_fnct::INHIBIT, WUID_SYS, src_id);
        }
    }
}

use std::sync::{Arc, RwLock};

/// Site identity block of the configuration.
#[derive(Debug, Clone)]
pub struct CfgSite {
    /// Network access code, 12 bits
    pub nac: u16,
    /// P25 network ID (WACN), 20 bits
    pub net_id: u32,
    /// System ID, 12 bits
    pub sys_id: u16,
    pub rfss_id: u8,
    pub site_id: u8,
    /// Location registration area
    pub lra: u8,
    /// Control channel identity, 4 bits
    pub channel_id: u8,
    /// Control channel number, 12 bits
    pub channel_no: u16,
    pub callsign: String,
}

impl Default for CfgSite {
    fn default() -> Self {
        Self {
            nac: 0x293,
            net_id: 1,
            sys_id: 1,
            rfss_id: 1,
            site_id: 1,
            lra: 0,
            channel_id: 1,
            channel_no: 1,
            callsign: "CHANGEME".to_string(),
        }
    }
}

/// Trunking behavior options.
#[derive(Debug, Clone)]
pub struct CfgControl {
    /// Per-frame logging
    pub verbose: bool,
    /// Hex dumps of frames in the log
    pub debug: bool,
    /// When false every inbound service request is denied as unsupported
    pub control: bool,
    /// Gate opcodes on unit registration
    pub verify_reg: bool,
    /// Gate group traffic on affiliation
    pub verify_aff: bool,
    /// On source ACL failure, additionally inhibit the offender
    pub inhibit_illegal: bool,
    /// Suppress the FNE ack for status updates
    pub no_status_ack: bool,
    /// Suppress the FNE ack for message updates
    pub no_message_ack: bool,

    /// Status-command side channel
    pub status_cmd_enable: bool,
    pub status_radio_check: u8,
    pub status_radio_inhibit: u8,
    pub status_radio_uninhibit: u8,
    pub status_radio_force_reg: u8,
    pub status_radio_force_dereg: u8,

    /// Voice channels available for grants
    pub voice_channels: Vec<u16>,
    /// Control channel broadcast interval, added to the adjacent-site rearm
    pub cc_bcst_interval_ms: u32,
    pub patch_super_group: u16,
    /// Voice call termination replay count
    pub hang_count: u32,
    pub duplex: bool,
    pub continuous_control: bool,
    /// Swap src/dst on inbound ACK_RSP with AIV clear and a target set
    pub ack_rsp_swap: bool,
}

impl Default for CfgControl {
    fn default() -> Self {
        Self {
            verbose: false,
            debug: false,
            control: true,
            verify_reg: false,
            verify_aff: false,
            inhibit_illegal: false,
            no_status_ack: false,
            no_message_ack: true,
            status_cmd_enable: false,
            status_radio_check: 0,
            status_radio_inhibit: 0,
            status_radio_uninhibit: 0,
            status_radio_force_reg: 0,
            status_radio_force_dereg: 0,
            voice_channels: vec![],
            cc_bcst_interval_ms: 0,
            patch_super_group: 0xFFFF,
            hang_count: 12,
            duplex: true,
            continuous_control: false,
            ack_rsp_swap: true,
        }
    }
}

/// One channel identity table entry.
#[derive(Debug, Clone)]
pub struct CfgIdentity {
    pub iden: u8,
    pub base_frequency_hz: u32,
    pub tx_offset_mhz: f32,
    pub ch_bandwidth_khz: f32,
    pub ch_spacing_khz: f32,
}

/// Full engine configuration, immutable after construction.
#[derive(Debug, Clone, Default)]
pub struct ControlConfig {
    pub site: CfgSite,
    pub control: CfgControl,
    pub identities: Vec<CfgIdentity>,
    pub debug_log: Option<String>,
}

impl ControlConfig {
    /// Validate that all required configuration fields are properly set.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.site.sys_id == 0 || self.site.sys_id > 0xFFF {
            return Err("site sys_id must be a non-zero 12-bit value");
        }
        if self.site.nac == 0 || self.site.nac > 0xFFF {
            return Err("site nac must be a non-zero 12-bit value");
        }
        if self.site.net_id > 0xF_FFFF {
            return Err("site net_id must be a 20-bit value");
        }
        if self.site.channel_id > 0xF {
            return Err("site channel_id must be a 4-bit value");
        }
        if self.site.channel_no == 0 || self.site.channel_no > 0xFFF {
            return Err("site channel_no must be a non-zero 12-bit value");
        }
        if self.site.callsign.is_empty() || self.site.callsign.len() > 8 {
            return Err("callsign must be 1-8 characters");
        }
        for ch in &self.control.voice_channels {
            if *ch == 0 || *ch > 0xFFF {
                return Err("voice channel numbers must be non-zero 12-bit values");
            }
            if *ch == self.site.channel_no {
                return Err("voice channel table must not contain the control channel");
            }
        }
        if self.control.hang_count == 0 {
            return Err("hang_count must be non-zero");
        }
        for id in &self.identities {
            if id.iden > 0xF {
                return Err("identity iden must be a 4-bit value");
            }
        }
        Ok(())
    }
}

/// Mutable, engine-editable state.
#[derive(Debug, Clone)]
pub struct ControlState {
    /// Backhaul connection is up; false means fallback (RF-only) mode.
    pub network_active: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self { network_active: false }
    }
}

/// Global shared configuration: immutable config + mutable state.
#[derive(Clone)]
pub struct SharedConfig {
    cfg: Arc<ControlConfig>,
    state: Arc<RwLock<ControlState>>,
}

impl SharedConfig {
    pub fn from_config(cfg: ControlConfig) -> Self {
        Self::from_parts(cfg, ControlState::default())
    }

    pub fn from_parts(cfg: ControlConfig, state: ControlState) -> Self {
        // Check config for validity before handing out the shared handle
        if let Err(e) = cfg.validate() {
            panic!("Invalid control configuration: {}", e);
        }

        Self {
            cfg: Arc::new(cfg),
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Access immutable config.
    pub fn config(&self) -> Arc<ControlConfig> {
        Arc::clone(&self.cfg)
    }

    /// Read guard for mutable state.
    pub fn state_read(&self) -> std::sync::RwLockReadGuard<'_, ControlState> {
        self.state.read().expect("ControlState RwLock blocked")
    }

    /// Write guard for mutable state.
    pub fn state_write(&self) -> std::sync::RwLockWriteGuard<'_, ControlState> {
        self.state.write().expect("ControlState RwLock blocked")
    }
}

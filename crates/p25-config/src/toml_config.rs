use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use toml::Value;

use super::control_config::{CfgControl, CfgIdentity, CfgSite, ControlConfig, ControlState, SharedConfig};

/// Build `SharedConfig` from a TOML configuration string.
pub fn from_toml_str(toml_str: &str) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let root: TomlConfigRoot = toml::from_str(toml_str)?;

    let expected_config_version = "1.0";
    if root.config_version != expected_config_version {
        return Err(format!(
            "Unrecognized config_version: {}, expect {}",
            root.config_version, expected_config_version
        )
        .into());
    }
    if !root.extra.is_empty() {
        return Err(format!("Unrecognized top-level fields: {:?}", sorted_keys(&root.extra)).into());
    }
    if !root.site.extra.is_empty() {
        return Err(format!("Unrecognized fields in site: {:?}", sorted_keys(&root.site.extra)).into());
    }
    if let Some(ref ctrl) = root.control {
        if !ctrl.extra.is_empty() {
            return Err(format!("Unrecognized fields in control: {:?}", sorted_keys(&ctrl.extra)).into());
        }
    }
    for id in &root.identity {
        if !id.extra.is_empty() {
            return Err(format!("Unrecognized fields in identity: {:?}", sorted_keys(&id.extra)).into());
        }
    }

    let mut cfg = ControlConfig {
        site: CfgSite {
            nac: root.site.nac.unwrap_or(0x293),
            net_id: root.site.net_id,
            sys_id: root.site.sys_id,
            rfss_id: root.site.rfss_id,
            site_id: root.site.site_id,
            lra: root.site.lra.unwrap_or(0),
            channel_id: root.site.channel_id,
            channel_no: root.site.channel_no,
            callsign: root.site.callsign,
        },
        control: CfgControl::default(),
        identities: vec![],
        debug_log: root.debug_log,
    };

    if let Some(ctrl) = root.control {
        apply_control_patch(&mut cfg.control, ctrl);
    }

    for id in root.identity {
        cfg.identities.push(CfgIdentity {
            iden: id.iden,
            base_frequency_hz: id.base_frequency_hz,
            tx_offset_mhz: id.tx_offset_mhz,
            ch_bandwidth_khz: id.ch_bandwidth_khz,
            ch_spacing_khz: id.ch_spacing_khz,
        });
    }

    if let Err(e) = cfg.validate() {
        return Err(format!("Invalid configuration: {}", e).into());
    }

    Ok(SharedConfig::from_parts(cfg, ControlState::default()))
}

/// Build `SharedConfig` from any reader.
pub fn from_reader<R: Read>(reader: R) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let mut contents = String::new();
    let mut reader = BufReader::new(reader);
    reader.read_to_string(&mut contents)?;
    from_toml_str(&contents)
}

/// Build `SharedConfig` from a file path.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SharedConfig, Box<dyn std::error::Error>> {
    let f = File::open(path)?;
    from_reader(BufReader::new(f))
}

fn apply_control_patch(dst: &mut CfgControl, src: ControlDto) {
    macro_rules! patch {
        ($field:ident) => {
            if let Some(v) = src.$field {
                dst.$field = v;
            }
        };
    }

    patch!(verbose);
    patch!(debug);
    patch!(control);
    patch!(verify_reg);
    patch!(verify_aff);
    patch!(inhibit_illegal);
    patch!(no_status_ack);
    patch!(no_message_ack);
    patch!(status_cmd_enable);
    patch!(status_radio_check);
    patch!(status_radio_inhibit);
    patch!(status_radio_uninhibit);
    patch!(status_radio_force_reg);
    patch!(status_radio_force_dereg);
    patch!(voice_channels);
    patch!(cc_bcst_interval_ms);
    patch!(patch_super_group);
    patch!(hang_count);
    patch!(duplex);
    patch!(continuous_control);
    patch!(ack_rsp_swap);
}

fn sorted_keys(map: &HashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}

#[derive(Debug, Deserialize)]
struct TomlConfigRoot {
    config_version: String,
    debug_log: Option<String>,
    site: SiteDto,
    control: Option<ControlDto>,
    #[serde(default)]
    identity: Vec<IdentityDto>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SiteDto {
    nac: Option<u16>,
    net_id: u32,
    sys_id: u16,
    rfss_id: u8,
    site_id: u8,
    lra: Option<u8>,
    channel_id: u8,
    channel_no: u16,
    callsign: String,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ControlDto {
    verbose: Option<bool>,
    debug: Option<bool>,
    control: Option<bool>,
    verify_reg: Option<bool>,
    verify_aff: Option<bool>,
    inhibit_illegal: Option<bool>,
    no_status_ack: Option<bool>,
    no_message_ack: Option<bool>,
    status_cmd_enable: Option<bool>,
    status_radio_check: Option<u8>,
    status_radio_inhibit: Option<u8>,
    status_radio_uninhibit: Option<u8>,
    status_radio_force_reg: Option<u8>,
    status_radio_force_dereg: Option<u8>,
    voice_channels: Option<Vec<u16>>,
    cc_bcst_interval_ms: Option<u32>,
    patch_super_group: Option<u16>,
    hang_count: Option<u32>,
    duplex: Option<bool>,
    continuous_control: Option<bool>,
    ack_rsp_swap: Option<bool>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct IdentityDto {
    iden: u8,
    base_frequency_hz: u32,
    tx_offset_mhz: f32,
    ch_bandwidth_khz: f32,
    ch_spacing_khz: f32,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
        config_version = "1.0"

        [site]
        net_id = 52
        sys_id = 659
        rfss_id = 1
        site_id = 1
        channel_id = 1
        channel_no = 1
        callsign = "W1ABC"

        [control]
        verify_reg = true
        voice_channels = [2, 3, 4]

        [[identity]]
        iden = 1
        base_frequency_hz = 851000000
        tx_offset_mhz = -45.0
        ch_bandwidth_khz = 12.5
        ch_spacing_khz = 6.25
    "#;

    #[test]
    fn test_load_good_config() {
        let shared = from_toml_str(GOOD).unwrap();
        let cfg = shared.config();
        assert_eq!(cfg.site.sys_id, 659);
        assert!(cfg.control.verify_reg);
        assert_eq!(cfg.control.voice_channels, vec![2, 3, 4]);
        assert_eq!(cfg.identities.len(), 1);
        // unpatched fields keep their defaults
        assert!(cfg.control.ack_rsp_swap);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let bad = GOOD.replace("verify_reg = true", "verify_regg = true");
        assert!(from_toml_str(&bad).is_err());
    }

    #[test]
    fn test_config_version_checked() {
        let bad = GOOD.replace("\"1.0\"", "\"0.9\"");
        assert!(from_toml_str(&bad).is_err());
    }
}

pub mod control_config;
pub mod toml_config;

pub use control_config::{
    CfgControl, CfgIdentity, CfgSite, ControlConfig, ControlState, SharedConfig,
};

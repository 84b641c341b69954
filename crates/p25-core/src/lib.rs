//! Core utilities for the P25 TrunkStation control-channel stack
//!
//! This crate provides fundamental types and utilities used across the P25 stack

/// Git version string, set at compile time
pub const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");
/// Stack version followed by git version string, e.g., "0.1.0-aabbccdd"
pub const STACK_VERSION: &str = const_format::formatcp!("{}-{}", env!("CARGO_PKG_VERSION"), GIT_VERSION);

pub mod bitbuffer;
pub mod debug;
pub mod p25_common;
pub mod pdu_parse_error;
pub mod site_data;
pub mod timer;

// Re-export commonly used items
pub use bitbuffer::BitBuffer;
pub use p25_common::*;
pub use pdu_parse_error::PduParseErr;
pub use site_data::SiteData;
pub use timer::Timer;

//! Channel identity table entries broadcast in IDEN_UP / IDEN_UP_VU.

use crate::tsbk::{IdenUp, IdenUpVu};

/// Identities at or above this base frequency broadcast as IDEN_UP;
/// everything below is a VHF/UHF identity.
pub const IDEN_UP_FREQ_FLOOR_HZ: u32 = 762_000_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdenTableEntry {
    /// Channel identity, 4 bits
    pub iden: u8,
    /// Base frequency in Hz
    pub base_frequency_hz: u32,
    /// Transmit offset in MHz (signed)
    pub tx_offset_mhz: f32,
    /// Channel bandwidth in kHz
    pub ch_bandwidth_khz: f32,
    /// Channel spacing in kHz
    pub ch_spacing_khz: f32,
}

impl IdenTableEntry {
    pub fn is_vhf_uhf(&self) -> bool {
        self.base_frequency_hz < IDEN_UP_FREQ_FLOOR_HZ
    }

    /// 700/800/900 identity broadcast payload.
    pub fn to_iden_up(&self) -> IdenUp {
        IdenUp {
            iden: self.iden,
            bandwidth: (self.ch_bandwidth_khz * 1000.0 / 125.0) as u16,
            tx_offset: encode_offset_9(self.tx_offset_mhz),
            ch_spacing: (self.ch_spacing_khz * 1000.0 / 125.0) as u16,
            base_frequency: self.base_frequency_hz / 5,
        }
    }

    /// VHF/UHF identity broadcast payload.
    pub fn to_iden_up_vu(&self) -> IdenUpVu {
        IdenUpVu {
            iden: self.iden,
            bandwidth_vu: if self.ch_bandwidth_khz > 10.0 { 0x5 } else { 0x4 },
            tx_offset_vu: encode_offset_14(self.tx_offset_mhz),
            ch_spacing: (self.ch_spacing_khz * 1000.0 / 125.0) as u16,
            base_frequency: self.base_frequency_hz / 5,
        }
    }
}

/// Sign-magnitude transmit offset, 9 bits of 250 kHz units.
fn encode_offset_9(offset_mhz: f32) -> u16 {
    let sign = if offset_mhz >= 0.0 { 0x100 } else { 0 };
    let mag = (offset_mhz.abs() * 1000.0 / 250.0) as u16 & 0xFF;
    sign | mag
}

/// Sign-magnitude transmit offset, 14 bits of channel-spacing units.
fn encode_offset_14(offset_mhz: f32) -> u16 {
    let sign = if offset_mhz >= 0.0 { 0x2000 } else { 0 };
    let mag = (offset_mhz.abs() * 1000.0 / 12.5) as u16 & 0x1FFF;
    sign | mag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_split() {
        let uhf = IdenTableEntry {
            iden: 1, base_frequency_hz: 451_000_000,
            tx_offset_mhz: 5.0, ch_bandwidth_khz: 12.5, ch_spacing_khz: 12.5,
        };
        let p800 = IdenTableEntry {
            iden: 2, base_frequency_hz: 851_006_250,
            tx_offset_mhz: -45.0, ch_bandwidth_khz: 12.5, ch_spacing_khz: 6.25,
        };
        assert!(uhf.is_vhf_uhf());
        assert!(!p800.is_vhf_uhf());
    }

    #[test]
    fn test_iden_up_units() {
        let entry = IdenTableEntry {
            iden: 2, base_frequency_hz: 851_000_000,
            tx_offset_mhz: -45.0, ch_bandwidth_khz: 12.5, ch_spacing_khz: 6.25,
        };
        let pdu = entry.to_iden_up();
        assert_eq!(pdu.base_frequency, 851_000_000 / 5);
        assert_eq!(pdu.bandwidth, 100);
        assert_eq!(pdu.ch_spacing, 50);
        assert_eq!(pdu.tx_offset & 0x100, 0); // negative offset
    }
}

//! Protocol constants and small shared enums for the P25 FDMA common air interface.
//! Values marked bit-exact are interop-relevant and must not drift.

/// Frame sync pattern carried by every P25 burst.
pub const SYNC_PATTERN: u64 = 0x5575F5FF77FF;
/// Number of bits in the frame sync pattern.
pub const SYNC_LENGTH_BITS: usize = 48;
pub const SYNC_LENGTH_BYTES: usize = SYNC_LENGTH_BITS / 8;

/// NID = NAC (12 bits) + DUID (4 bits) + parity, 64 bits total on air.
pub const NID_LENGTH_BITS: usize = 64;

/// Single-block TSDU frame.
pub const TSDU_FRAME_LENGTH_BYTES: usize = 45;
pub const TSDU_FRAME_LENGTH_BITS: usize = TSDU_FRAME_LENGTH_BYTES * 8;
/// Triple-block (MBF) TSDU frame.
pub const TSDU_TRIPLE_FRAME_LENGTH_BYTES: usize = 90;
pub const TSDU_TRIPLE_FRAME_LENGTH_BITS: usize = TSDU_TRIPLE_FRAME_LENGTH_BYTES * 8;
/// TDU with link control frame.
pub const TDULC_FRAME_LENGTH_BYTES: usize = 54;
pub const TDULC_FRAME_LENGTH_BITS: usize = TDULC_FRAME_LENGTH_BYTES * 8;

/// Un-coded TSBK block: header + payload + CRC.
pub const TSBK_LENGTH_BYTES: usize = 12;
/// Trellis-coded TSBK block.
pub const TSBK_FEC_LENGTH_BYTES: usize = 25;
pub const TSBK_FEC_LENGTH_BITS: usize = 196;
/// TSBKs stacked into one multi-block TSDU burst.
pub const TSBK_MBF_CNT: usize = 3;

/// TDULC link-control word, un-coded.
pub const TDULC_LC_LENGTH_BYTES: usize = 9;
pub const TDULC_LC_LENGTH_BITS: usize = TDULC_LC_LENGTH_BYTES * 8;

/// First status-symbol pair position within a frame, and the stride between pairs.
pub const SS0_START: usize = 70;
pub const SS_INCREMENT: usize = 72;
/// Payload placement starts after sync + NID + the first status pair.
pub const PAYLOAD_START_BIT: usize = 114;

/// Two-byte modem tag prefixed to every outgoing frame.
pub const TAG_DATA: u8 = 0x00;
pub const TAG_EOT: u8 = 0x03;

/// Well-known unit ID representing the infrastructure itself. Bit-exact.
pub const WUID_SYS: u32 = 0xFF_FFFC;
/// Well-known registration unit ID.
pub const WUID_REG: u32 = 0xFF_FFFE;
/// All-call talkgroup.
pub const TGID_ALL: u32 = 0xFFFF;

/// Manufacturer IDs.
pub const MFG_STANDARD: u8 = 0x00;
pub const MFG_MOT: u8 = 0x90;

/// Engine timing constants. Bit-exact per system interop requirements.
pub const ADJ_SITE_TIMER_TIMEOUT_MS: u32 = 30_000;
pub const ADJ_SITE_UPDATE_CNT: u8 = 5;
pub const GRANT_TIMER_TIMEOUT_MS: u32 = 15_000;

/// CFVA flags in adjacent-site advertisements.
pub const CFVA_CONV: u8 = 0x08;
pub const CFVA_FAILURE: u8 = 0x04;
pub const CFVA_VALID: u8 = 0x02;
pub const CFVA_NETWORK: u8 = 0x01;

/// Data unit IDs carried in the NID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duid {
    Hdu = 0x0,
    Tdu = 0x3,
    Ldu1 = 0x5,
    Tsdu = 0x7,
    Ldu2 = 0xA,
    Pdu = 0xC,
    Tdulc = 0xF,
}

impl TryFrom<u8> for Duid {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, u8> {
        match v {
            0x0 => Ok(Duid::Hdu),
            0x3 => Ok(Duid::Tdu),
            0x5 => Ok(Duid::Ldu1),
            0x7 => Ok(Duid::Tsdu),
            0xA => Ok(Duid::Ldu2),
            0xC => Ok(Duid::Pdu),
            0xF => Ok(Duid::Tdulc),
            other => Err(other),
        }
    }
}

/// Signaling direction: inbound signaling packets come from subscribers,
/// outbound from the fixed network equipment. ISP and OSP opcode spaces
/// overlap numerically, so codecs are direction-aware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// RF interface state of the owning control process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfState {
    Listening,
    Audio,
    Data,
    Rejected,
}

/// Network interface state of the owning control process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetState {
    Idle,
    Audio,
    Data,
}

/// Service response values (GRP_AFF / U_REG response field).
pub mod rsp {
    pub const ACCEPT: u8 = 0x0;
    pub const FAIL: u8 = 0x1;
    pub const DENY: u8 = 0x2;
    pub const REFUSED: u8 = 0x3;
}

/// Answer responses carried by UU_ANS / TELE_INT_ANS.
pub mod ans {
    pub const PROCEED: u8 = 0x20;
    pub const DENY: u8 = 0x21;
    pub const WAIT: u8 = 0x22;
}

/// DENY_RSP reason codes. Standard-assigned values where TIA-102 defines
/// them; locally-significant conditions use the user-defined range.
pub mod deny {
    pub const REQ_UNIT_NOT_VALID: u8 = 0x10;
    pub const REQ_UNIT_NOT_AUTH: u8 = 0x11;
    pub const TGT_UNIT_NOT_VALID: u8 = 0x20;
    pub const TGT_UNIT_REFUSED: u8 = 0x21;
    pub const TGT_GROUP_NOT_VALID: u8 = 0x2F;
    pub const PTT_COLLIDE: u8 = 0xF1;
    pub const SYS_UNSUPPORTED_SVC: u8 = 0xFF;
}

/// QUE_RSP reason codes.
pub mod que {
    pub const TGT_UNIT_QUEUED: u8 = 0x2F;
    pub const CHN_RESOURCE_NOT_AVAIL: u8 = 0x40;
}

/// Extended function opcodes.
pub mod ext_fnct {
    pub const CHECK: u16 = 0x0000;
    pub const UNINHIBIT: u16 = 0x007E;
    pub const INHIBIT: u16 = 0x007F;
    pub const CHECK_ACK: u16 = 0x0080;
    pub const UNINHIBIT_ACK: u16 = 0x00FE;
    pub const INHIBIT_ACK: u16 = 0x00FF;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duid_mapping() {
        assert_eq!(Duid::try_from(0x7), Ok(Duid::Tsdu));
        assert_eq!(Duid::try_from(0xF), Ok(Duid::Tdulc));
        assert_eq!(Duid::try_from(0x1), Err(0x1));
    }

    #[test]
    fn test_frame_geometry() {
        // Payload start = sync + NID + one status pair
        assert_eq!(PAYLOAD_START_BIT, SYNC_LENGTH_BITS + NID_LENGTH_BITS + 2);
        // Three FEC blocks fit a triple frame after the preamble
        assert!(PAYLOAD_START_BIT + 3 * TSBK_FEC_LENGTH_BITS <= TSDU_TRIPLE_FRAME_LENGTH_BITS);
    }
}

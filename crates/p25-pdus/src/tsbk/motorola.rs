//! Motorola manufacturer opcodes (mfid $90) carried on the control channel.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

/// MOT_GRG_ADD — group regroup add (patch supergroup).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotGrgAdd {
    pub super_group: u16,
    pub group1: u16,
    pub group2: u16,
    pub group3: u16,
}

impl MotGrgAdd {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.super_group as u64, 16);
        buf.write_bits(self.group1 as u64, 16);
        buf.write_bits(self.group2 as u64, 16);
        buf.write_bits(self.group3 as u64, 16);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, super_group, 16);
        let_field!(buf, group1, 16);
        let_field!(buf, group2, 16);
        let_field!(buf, group3, 16);
        Ok(MotGrgAdd {
            super_group: super_group as u16,
            group1: group1 as u16,
            group2: group2 as u16,
            group3: group3 as u16,
        })
    }
}

/// MOT_PSH_CCH — planned control channel shutdown. No payload fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MotPshCch;

impl MotPshCch {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_zeroes(64);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        buf.read_field(64, "reserved")?;
        Ok(MotPshCch)
    }
}

/// MOT_CC_BSI — control channel base station identification: the site
/// callsign in 6-bit characters plus the control channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotCcBsi {
    pub callsign: String,
    pub ch_id: u8,
    pub ch_no: u16,
}

impl Default for MotCcBsi {
    fn default() -> Self {
        MotCcBsi { callsign: String::new(), ch_id: 0, ch_no: 0 }
    }
}

/// Printable ASCII range packed into 6 bits per character.
const CHAR_BASE: u8 = 0x20;
const CALLSIGN_CHARS: usize = 8;

impl MotCcBsi {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        let mut chars = self.callsign.bytes()
            .map(|c| c.to_ascii_uppercase().saturating_sub(CHAR_BASE) & 0x3F);
        for _ in 0..CALLSIGN_CHARS {
            buf.write_bits(chars.next().unwrap_or(0) as u64, 6);
        }
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let mut callsign = String::with_capacity(CALLSIGN_CHARS);
        for _ in 0..CALLSIGN_CHARS {
            let c = buf.read_field(6, "callsign")? as u8;
            if c != 0 {
                callsign.push((c + CHAR_BASE) as char);
            }
        }
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        Ok(MotCcBsi { callsign, ch_id: ch_id as u8, ch_no: ch_no as u16 })
    }
}

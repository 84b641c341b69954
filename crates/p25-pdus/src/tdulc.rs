//! TDULC — terminator data unit with link control.
//!
//! The link-control word is 9 octets: opcode, manufacturer, and an
//! opcode-specific body. Only the opcodes used to terminate voice calls
//! with grant/release semantics are modeled.

use p25_core::let_field;
use p25_core::p25_common::{MFG_STANDARD, TDULC_LC_LENGTH_BYTES};
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::{BitBuffer, SiteData};

/// Link control opcodes carried by a TDULC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdulcLco {
    Group,
    Private,
    CallTerm,
    NetStsBcast,
    RfssStsBcast,
}

impl TdulcLco {
    pub fn value(&self) -> u8 {
        match self {
            TdulcLco::Group => 0x00,
            TdulcLco::Private => 0x03,
            TdulcLco::CallTerm => 0x0F,
            TdulcLco::NetStsBcast => 0x20,
            TdulcLco::RfssStsBcast => 0x21,
        }
    }

    pub fn try_from(v: u8) -> Result<Self, PduParseErr> {
        match v {
            0x00 => Ok(TdulcLco::Group),
            0x03 => Ok(TdulcLco::Private),
            0x0F => Ok(TdulcLco::CallTerm),
            0x20 => Ok(TdulcLco::NetStsBcast),
            0x21 => Ok(TdulcLco::RfssStsBcast),
            other => Err(PduParseErr::InvalidValue { field: "tdulc_lco", value: other as u64 }),
        }
    }
}

/// One terminator link-control word. Broadcast opcodes carry site identity;
/// call opcodes carry addressing and service options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tdulc {
    pub lco: TdulcLco,
    pub mfid: u8,
    pub src_id: u32,
    pub dst_id: u32,
    pub emergency: bool,
    pub encrypted: bool,
    pub priority: u8,
    /// Site identity for the broadcast opcodes
    pub site: SiteData,
}

impl Tdulc {
    pub fn call(lco: TdulcLco, src_id: u32, dst_id: u32) -> Self {
        Tdulc {
            lco,
            mfid: MFG_STANDARD,
            src_id: src_id & 0xFF_FFFF,
            dst_id: dst_id & 0xFF_FFFF,
            emergency: false,
            encrypted: false,
            priority: 4,
            site: SiteData::default(),
        }
    }

    pub fn broadcast(lco: TdulcLco, site: SiteData) -> Self {
        Tdulc {
            lco,
            mfid: MFG_STANDARD,
            src_id: 0,
            dst_id: 0,
            emergency: false,
            encrypted: false,
            priority: 0,
            site,
        }
    }

    fn svc_opts(&self) -> u8 {
        (self.emergency as u8) << 7 | (self.encrypted as u8) << 6 | (self.priority & 0x7)
    }
}

/// Encode the 9-octet link-control word.
pub fn encode_tdulc(lc: &Tdulc) -> [u8; TDULC_LC_LENGTH_BYTES] {
    let mut buf = BitBuffer::new(TDULC_LC_LENGTH_BYTES * 8);
    buf.write_bits(0, 2);
    buf.write_bits(lc.lco.value() as u64, 6);
    buf.write_bits(lc.mfid as u64, 8);

    match lc.lco {
        TdulcLco::Group => {
            buf.write_bits(lc.svc_opts() as u64, 8);
            buf.write_zeroes(8);
            buf.write_bits((lc.dst_id & 0xFFFF) as u64, 16);
            buf.write_bits(lc.src_id as u64, 24);
        }
        TdulcLco::Private | TdulcLco::CallTerm => {
            buf.write_bits(lc.svc_opts() as u64, 8);
            buf.write_bits(lc.dst_id as u64, 24);
            buf.write_bits(lc.src_id as u64, 24);
        }
        TdulcLco::NetStsBcast => {
            buf.write_bits((lc.site.net_id & 0xF_FFFF) as u64, 20);
            buf.write_bits((lc.site.sys_id & 0xFFF) as u64, 12);
            buf.write_bits((lc.site.channel_id & 0xF) as u64, 4);
            buf.write_bits((lc.site.channel_no & 0xFFF) as u64, 12);
            buf.write_zeroes(8);
        }
        TdulcLco::RfssStsBcast => {
            buf.write_bits(lc.site.lra as u64, 8);
            buf.write_bits((lc.site.sys_id & 0xFFF) as u64, 12);
            buf.write_bits(lc.site.rfss_id as u64, 8);
            buf.write_bits(lc.site.site_id as u64, 8);
            buf.write_bits((lc.site.channel_id & 0xF) as u64, 4);
            buf.write_bits((lc.site.channel_no & 0xFFF) as u64, 12);
            buf.write_zeroes(4);
        }
    }

    let mut out = [0u8; TDULC_LC_LENGTH_BYTES];
    out.copy_from_slice(buf.as_bytes());
    out
}

/// Decode the 9-octet link-control word.
pub fn decode_tdulc(data: &[u8]) -> Result<Tdulc, PduParseErr> {
    if data.len() < TDULC_LC_LENGTH_BYTES {
        return Err(PduParseErr::Truncated { needed: TDULC_LC_LENGTH_BYTES, got: data.len() });
    }

    let mut buf = BitBuffer::from_bytes(&data[..TDULC_LC_LENGTH_BYTES]);
    buf.read_field(2, "reserved")?;
    let lco = TdulcLco::try_from(buf.read_field(6, "lco")? as u8)?;
    let mfid = buf.read_field(8, "mfid")? as u8;

    let mut lc = Tdulc::call(lco, 0, 0);
    lc.mfid = mfid;
    lc.priority = 0;

    match lco {
        TdulcLco::Group => {
            let_field!(buf, svc_opts, 8);
            buf.read_field(8, "reserved")?;
            let_field!(buf, dst_id, 16);
            let_field!(buf, src_id, 24);
            lc.emergency = svc_opts & 0x80 != 0;
            lc.encrypted = svc_opts & 0x40 != 0;
            lc.priority = (svc_opts & 0x7) as u8;
            lc.dst_id = dst_id as u32;
            lc.src_id = src_id as u32;
        }
        TdulcLco::Private | TdulcLco::CallTerm => {
            let_field!(buf, svc_opts, 8);
            let_field!(buf, dst_id, 24);
            let_field!(buf, src_id, 24);
            lc.emergency = svc_opts & 0x80 != 0;
            lc.encrypted = svc_opts & 0x40 != 0;
            lc.priority = (svc_opts & 0x7) as u8;
            lc.dst_id = dst_id as u32;
            lc.src_id = src_id as u32;
        }
        TdulcLco::NetStsBcast => {
            let_field!(buf, net_id, 20);
            let_field!(buf, sys_id, 12);
            let_field!(buf, ch_id, 4);
            let_field!(buf, ch_no, 12);
            buf.read_field(8, "reserved")?;
            lc.site = SiteData::new(net_id as u32, sys_id as u16, 0, 0, 0, ch_id as u8, ch_no as u16);
        }
        TdulcLco::RfssStsBcast => {
            let_field!(buf, lra, 8);
            let_field!(buf, sys_id, 12);
            let_field!(buf, rfss_id, 8);
            let_field!(buf, site_id, 8);
            let_field!(buf, ch_id, 4);
            let_field!(buf, ch_no, 12);
            buf.read_field(4, "reserved")?;
            lc.site = SiteData::new(0, sys_id as u16, rfss_id as u8, site_id as u8, lra as u8,
                ch_id as u8, ch_no as u16);
        }
    }

    Ok(lc)
}

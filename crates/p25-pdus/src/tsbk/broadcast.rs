//! Periodic control-channel broadcast opcodes: channel identities, network
//! and RFSS status, adjacent sites, and the SNDCP data channel announcement.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::{BitBuffer, SiteData};

/// IDEN_UP — channel identity update for 700/800/900 MHz identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdenUp {
    pub iden: u8,
    /// Channel bandwidth, 9 bits of 125 Hz units
    pub bandwidth: u16,
    /// Transmit offset, 9 bits signed-magnitude of 250 kHz units
    pub tx_offset: u16,
    /// Channel spacing, 10 bits of 125 Hz units
    pub ch_spacing: u16,
    /// Base frequency in 5 Hz units
    pub base_frequency: u32,
}

impl IdenUp {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits((self.iden & 0xF) as u64, 4);
        buf.write_bits((self.bandwidth & 0x1FF) as u64, 9);
        buf.write_bits((self.tx_offset & 0x1FF) as u64, 9);
        buf.write_bits((self.ch_spacing & 0x3FF) as u64, 10);
        buf.write_bits(self.base_frequency as u64, 32);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, iden, 4);
        let_field!(buf, bandwidth, 9);
        let_field!(buf, tx_offset, 9);
        let_field!(buf, ch_spacing, 10);
        let_field!(buf, base_frequency, 32);
        Ok(IdenUp {
            iden: iden as u8,
            bandwidth: bandwidth as u16,
            tx_offset: tx_offset as u16,
            ch_spacing: ch_spacing as u16,
            base_frequency: base_frequency as u32,
        })
    }
}

/// IDEN_UP_VU — channel identity update for VHF/UHF identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdenUpVu {
    pub iden: u8,
    pub bandwidth_vu: u8,
    /// Transmit offset, 14 bits signed-magnitude
    pub tx_offset_vu: u16,
    pub ch_spacing: u16,
    pub base_frequency: u32,
}

impl IdenUpVu {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits((self.iden & 0xF) as u64, 4);
        buf.write_bits((self.bandwidth_vu & 0xF) as u64, 4);
        buf.write_bits((self.tx_offset_vu & 0x3FFF) as u64, 14);
        buf.write_bits((self.ch_spacing & 0x3FF) as u64, 10);
        buf.write_bits(self.base_frequency as u64, 32);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, iden, 4);
        let_field!(buf, bandwidth_vu, 4);
        let_field!(buf, tx_offset_vu, 14);
        let_field!(buf, ch_spacing, 10);
        let_field!(buf, base_frequency, 32);
        Ok(IdenUpVu {
            iden: iden as u8,
            bandwidth_vu: bandwidth_vu as u8,
            tx_offset_vu: tx_offset_vu as u16,
            ch_spacing: ch_spacing as u16,
            base_frequency: base_frequency as u32,
        })
    }
}

/// NET_STS_BCAST — network status broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetStsBcast {
    pub lra: u8,
    pub net_id: u32,
    pub sys_id: u16,
    pub ch_id: u8,
    pub ch_no: u16,
    pub svc_class: u8,
}

impl NetStsBcast {
    pub fn from_site(site: &SiteData, svc_class: u8) -> Self {
        NetStsBcast {
            lra: site.lra,
            net_id: site.net_id,
            sys_id: site.sys_id,
            ch_id: site.channel_id,
            ch_no: site.channel_no,
            svc_class,
        }
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.lra as u64, 8);
        buf.write_bits((self.net_id & 0xF_FFFF) as u64, 20);
        buf.write_bits((self.sys_id & 0xFFF) as u64, 12);
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits(self.svc_class as u64, 8);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, lra, 8);
        let_field!(buf, net_id, 20);
        let_field!(buf, sys_id, 12);
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, svc_class, 8);
        Ok(NetStsBcast {
            lra: lra as u8,
            net_id: net_id as u32,
            sys_id: sys_id as u16,
            ch_id: ch_id as u8,
            ch_no: ch_no as u16,
            svc_class: svc_class as u8,
        })
    }
}

/// RFSS_STS_BCAST — RF subsystem status broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RfssStsBcast {
    pub lra: u8,
    pub sys_id: u16,
    pub rfss_id: u8,
    pub site_id: u8,
    pub ch_id: u8,
    pub ch_no: u16,
    pub svc_class: u8,
}

impl RfssStsBcast {
    pub fn from_site(site: &SiteData, svc_class: u8) -> Self {
        RfssStsBcast {
            lra: site.lra,
            sys_id: site.sys_id,
            rfss_id: site.rfss_id,
            site_id: site.site_id,
            ch_id: site.channel_id,
            ch_no: site.channel_no,
            svc_class,
        }
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.lra as u64, 8);
        buf.write_zeroes(4);
        buf.write_bits((self.sys_id & 0xFFF) as u64, 12);
        buf.write_bits(self.rfss_id as u64, 8);
        buf.write_bits(self.site_id as u64, 8);
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits(self.svc_class as u64, 8);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, lra, 8);
        buf.read_field(4, "reserved")?;
        let_field!(buf, sys_id, 12);
        let_field!(buf, rfss_id, 8);
        let_field!(buf, site_id, 8);
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, svc_class, 8);
        Ok(RfssStsBcast {
            lra: lra as u8,
            sys_id: sys_id as u16,
            rfss_id: rfss_id as u8,
            site_id: site_id as u8,
            ch_id: ch_id as u8,
            ch_no: ch_no as u16,
            svc_class: svc_class as u8,
        })
    }
}

/// ADJ_STS_BCAST — adjacent site status broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjStsBcast {
    pub lra: u8,
    pub cfva: u8,
    pub sys_id: u16,
    pub rfss_id: u8,
    pub site_id: u8,
    pub ch_id: u8,
    pub ch_no: u16,
    pub svc_class: u8,
}

impl AdjStsBcast {
    pub fn from_site(site: &SiteData, cfva: u8, svc_class: u8) -> Self {
        AdjStsBcast {
            lra: site.lra,
            cfva,
            sys_id: site.sys_id,
            rfss_id: site.rfss_id,
            site_id: site.site_id,
            ch_id: site.channel_id,
            ch_no: site.channel_no,
            svc_class,
        }
    }

    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.lra as u64, 8);
        buf.write_bits((self.cfva & 0xF) as u64, 4);
        buf.write_bits((self.sys_id & 0xFFF) as u64, 12);
        buf.write_bits(self.rfss_id as u64, 8);
        buf.write_bits(self.site_id as u64, 8);
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits(self.svc_class as u64, 8);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, lra, 8);
        let_field!(buf, cfva, 4);
        let_field!(buf, sys_id, 12);
        let_field!(buf, rfss_id, 8);
        let_field!(buf, site_id, 8);
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, svc_class, 8);
        Ok(AdjStsBcast {
            lra: lra as u8,
            cfva: cfva as u8,
            sys_id: sys_id as u16,
            rfss_id: rfss_id as u8,
            site_id: site_id as u8,
            ch_id: ch_id as u8,
            ch_no: ch_no as u16,
            svc_class: svc_class as u8,
        })
    }
}

/// SNDCP_CH_ANN — SNDCP data channel announcement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SndcpChAnn {
    pub autonomous: bool,
    pub requested: bool,
    pub ch_id: u8,
    pub ch_no: u16,
    /// Data access control
    pub dac: u16,
}

impl SndcpChAnn {
    pub fn to_bitbuf(&self, buf: &mut BitBuffer) {
        buf.write_bits(self.autonomous as u64, 1);
        buf.write_bits(self.requested as u64, 1);
        buf.write_zeroes(6);
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits(self.dac as u64, 16);
        buf.write_zeroes(24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<Self, PduParseErr> {
        let_field!(buf, autonomous, 1);
        let_field!(buf, requested, 1);
        buf.read_field(6, "reserved")?;
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, dac, 16);
        buf.read_field(24, "reserved")?;
        Ok(SndcpChAnn {
            autonomous: autonomous == 1,
            requested: requested == 1,
            ch_id: ch_id as u8,
            ch_no: ch_no as u16,
            dac: dac as u16,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p25_core::p25_common::{CFVA_CONV, CFVA_FAILURE, CFVA_NETWORK};

    #[test]
    fn test_adj_sts_bcast_from_site() {
        let site = SiteData::adj_site(0x294, 1, 2, 1, 10, 0);
        let bcast = AdjStsBcast::from_site(&site, CFVA_CONV | CFVA_NETWORK | CFVA_FAILURE, 0);
        let mut buf = BitBuffer::new(64);
        bcast.to_bitbuf(&mut buf);
        buf.seek(0);
        let decoded = AdjStsBcast::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, bcast);
        assert_eq!(decoded.cfva & CFVA_FAILURE, CFVA_FAILURE);
        assert_eq!(decoded.site_id, 2);
        assert_eq!(decoded.ch_no, 10);
    }

    #[test]
    fn test_iden_up_round_trip() {
        let iden = IdenUp {
            iden: 1,
            bandwidth: 0x64,
            tx_offset: 0x1B4,
            ch_spacing: 0x32,
            base_frequency: 851_000_000 / 5,
        };
        let mut buf = BitBuffer::new(64);
        iden.to_bitbuf(&mut buf);
        buf.seek(0);
        assert_eq!(IdenUp::from_bitbuf(&mut buf).unwrap(), iden);
    }

    #[test]
    fn test_net_sts_bcast_site_fields() {
        let site = SiteData::new(52, 0x293, 1, 1, 0, 1, 1);
        let bcast = NetStsBcast::from_site(&site, 0x11);
        let mut buf = BitBuffer::new(64);
        bcast.to_bitbuf(&mut buf);
        buf.seek(0);
        let decoded = NetStsBcast::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded.net_id, 52);
        assert_eq!(decoded.sys_id, 0x293);
        assert_eq!(decoded.svc_class, 0x11);
    }
}

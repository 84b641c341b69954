//! Mobility-management opcodes: group affiliation, unit registration and
//! deregistration, and their queries and commands.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

/// GRP_AFF — group affiliation request (inbound) / response (outbound).
/// The header target carries the talkgroup (16 significant bits).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrpAff {
    /// Affiliation response: accept, fail, deny, refused. Zero on requests.
    pub response: u8,
    /// Announcement group the talkgroup is patched under
    pub announce_group: u16,
}

impl GrpAff {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(6);
        buf.write_bits((self.response & 0x3) as u64, 2);
        buf.write_bits(self.announce_group as u64, 16);
        buf.write_bits((dst_id & 0xFFFF) as u64, 16);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(6, "reserved")?;
        let_field!(buf, response, 2);
        let_field!(buf, announce_group, 16);
        let_field!(buf, dst_id, 16);
        let_field!(buf, src_id, 24);
        Ok((
            GrpAff { response: response as u8, announce_group: announce_group as u16 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// GRP_AFF_Q — group affiliation query (outbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrpAffQ;

impl GrpAffQ {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((GrpAffQ, src_id as u32, dst_id as u32))
    }
}

/// GRP_AFF_Q_RSP — group affiliation query response (inbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrpAffQRsp {
    pub announce_group: u16,
}

impl GrpAffQRsp {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.announce_group as u64, 16);
        buf.write_bits((dst_id & 0xFFFF) as u64, 16);
        buf.write_bits(src_id as u64, 24);
        buf.write_zeroes(8);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, announce_group, 16);
        let_field!(buf, dst_id, 16);
        let_field!(buf, src_id, 24);
        buf.read_field(8, "reserved")?;
        Ok((
            GrpAffQRsp { announce_group: announce_group as u16 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// U_REG — unit registration request (inbound) / response (outbound).
/// The registering system ID rides along for the sys-ID match check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UReg {
    pub response: u8,
    pub sys_id: u16,
}

impl UReg {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(2);
        buf.write_bits((self.response & 0x3) as u64, 2);
        buf.write_bits((self.sys_id & 0xFFF) as u64, 12);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(2, "reserved")?;
        let_field!(buf, response, 2);
        let_field!(buf, sys_id, 12);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            UReg { response: response as u8, sys_id: sys_id as u16 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// U_REG_CMD — unit registration command (outbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct URegCmd;

impl URegCmd {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((URegCmd, src_id as u32, dst_id as u32))
    }
}

/// U_DEREG_REQ — unit deregistration request (inbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UDeregReq;

impl UDeregReq {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((UDeregReq, src_id as u32, dst_id as u32))
    }
}

/// U_DEREG_ACK — unit deregistration acknowledgment (outbound), sent from
/// the system well-known ID to the departing unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UDeregAck;

impl UDeregAck {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((UDeregAck, src_id as u32, dst_id as u32))
    }
}

/// LOC_REG_REQ — location registration request (inbound). Answered with a
/// full registration command; the location fields are not retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocRegReq;

impl LocRegReq {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((LocRegReq, src_id as u32, dst_id as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p25_core::p25_common::rsp;

    #[test]
    fn test_grp_aff_response_round_trip() {
        let aff = GrpAff { response: rsp::ACCEPT, announce_group: 0xFFFF };
        let mut buf = BitBuffer::new(64);
        aff.to_bitbuf(1001, 5000, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = GrpAff::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, aff);
        assert_eq!((src, dst), (1001, 5000));
    }

    #[test]
    fn test_grp_aff_group_is_16_bit() {
        let aff = GrpAff::default();
        let mut buf = BitBuffer::new(64);
        aff.to_bitbuf(1, 0x12_5000, &mut buf);
        buf.seek(0);
        let (_, _, dst) = GrpAff::from_bitbuf(&mut buf).unwrap();
        assert_eq!(dst, 0x5000);
    }

    #[test]
    fn test_u_reg_sys_id() {
        let reg = UReg { response: rsp::DENY, sys_id: 0x293 };
        let mut buf = BitBuffer::new(64);
        reg.to_bitbuf(1001, 1001, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = UReg::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, reg);
        assert_eq!((src, dst), (1001, 1001));
    }
}

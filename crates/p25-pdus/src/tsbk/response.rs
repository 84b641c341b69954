//! Control responses: service denial and queueing.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

/// DENY_RSP — deny response (outbound). `service` names the denied opcode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DenyRsp {
    pub aiv: bool,
    pub service: u8,
    pub reason: u8,
}

impl DenyRsp {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.aiv as u64, 1);
        buf.write_bits(0, 1);
        buf.write_bits((self.service & 0x3F) as u64, 6);
        buf.write_bits(self.reason as u64, 8);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, aiv, 1);
        buf.read_field(1, "reserved")?;
        let_field!(buf, service, 6);
        let_field!(buf, reason, 8);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            DenyRsp { aiv: aiv == 1, service: service as u8, reason: reason as u8 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// QUE_RSP — queued response (outbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueRsp {
    pub aiv: bool,
    pub service: u8,
    pub reason: u8,
}

impl QueRsp {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.aiv as u64, 1);
        buf.write_bits(0, 1);
        buf.write_bits((self.service & 0x3F) as u64, 6);
        buf.write_bits(self.reason as u64, 8);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, aiv, 1);
        buf.read_field(1, "reserved")?;
        let_field!(buf, service, 6);
        let_field!(buf, reason, 8);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            QueRsp { aiv: aiv == 1, service: service as u8, reason: reason as u8 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p25_core::p25_common::{deny, que};
    use crate::tsbk::lco;

    #[test]
    fn test_deny_rsp_round_trip() {
        let d = DenyRsp { aiv: true, service: lco::GRP_VCH, reason: deny::PTT_COLLIDE };
        let mut buf = BitBuffer::new(64);
        d.to_bitbuf(1001, 5000, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = DenyRsp::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, d);
        assert_eq!((src, dst), (1001, 5000));
    }

    #[test]
    fn test_que_rsp_round_trip() {
        let q = QueRsp { aiv: true, service: lco::GRP_VCH, reason: que::CHN_RESOURCE_NOT_AVAIL };
        let mut buf = BitBuffer::new(64);
        q.to_bitbuf(1004, 5003, &mut buf);
        buf.seek(0);
        let (decoded, ..) = QueRsp::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, q);
    }
}

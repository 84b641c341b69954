//! Voice-service opcodes: group/unit channel requests and grants, answer
//! responses, and the telephone interconnect answer.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

/// GRP_VCH — group voice channel request (inbound) or grant (outbound).
/// A request carries zeroed channel fields; the grant fills them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrpVch {
    /// Service options: emergency, protected, duplex, mode, priority
    pub svc_opts: u8,
    /// Granted channel identity, 4 bits
    pub ch_id: u8,
    /// Granted channel number, 12 bits
    pub ch_no: u16,
}

impl GrpVch {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.svc_opts as u64, 8);
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits((dst_id & 0xFFFF) as u64, 16);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, svc_opts, 8);
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, dst_id, 16);
        let_field!(buf, src_id, 24);
        Ok((
            GrpVch { svc_opts: svc_opts as u8, ch_id: ch_id as u8, ch_no: ch_no as u16 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// UU_VCH — unit-to-unit voice channel request/grant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UuVch {
    pub ch_id: u8,
    pub ch_no: u16,
}

impl UuVch {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits((self.ch_id & 0xF) as u64, 4);
        buf.write_bits((self.ch_no & 0xFFF) as u64, 12);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, ch_id, 4);
        let_field!(buf, ch_no, 12);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            UuVch { ch_id: ch_id as u8, ch_no: ch_no as u16 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// UU_ANS — unit-to-unit answer request (outbound) / response (inbound).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UuAns {
    pub svc_opts: u8,
    /// Answer response: proceed, deny, wait. Zero on the outbound request.
    pub response: u8,
}

impl UuAns {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.svc_opts as u64, 8);
        buf.write_bits(self.response as u64, 8);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, svc_opts, 8);
        let_field!(buf, response, 8);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            UuAns { svc_opts: svc_opts as u8, response: response as u8 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// TELE_INT_ANS — telephone interconnect answer response. Interconnect is
/// not served here; only the response code is meaningful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeleIntAns {
    pub response: u8,
}

impl TeleIntAns {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.response as u64, 8);
        buf.write_zeroes(8);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, response, 8);
        buf.read_field(8, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((TeleIntAns { response: response as u8 }, src_id as u32, dst_id as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grp_vch_grant_fields() {
        let grant = GrpVch { svc_opts: 0x80, ch_id: 1, ch_no: 2 };
        let mut buf = BitBuffer::new(64);
        grant.to_bitbuf(1001, 5000, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = GrpVch::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, grant);
        assert_eq!((src, dst), (1001, 5000));
    }

    #[test]
    fn test_uu_ans_response() {
        let ans = UuAns { svc_opts: 0, response: p25_core::p25_common::ans::PROCEED };
        let mut buf = BitBuffer::new(64);
        ans.to_bitbuf(1001, 1002, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = UuAns::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded.response, p25_core::p25_common::ans::PROCEED);
        assert_eq!((src, dst), (1001, 1002));
    }
}

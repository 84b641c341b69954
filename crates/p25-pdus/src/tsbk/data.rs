//! Short-data and acknowledgment opcodes: status/message updates, call
//! alerts, acknowledgments, service cancellation, and extended functions.

use p25_core::let_field;
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

/// STS_UPDT — status update. The low octet carries the unit status the
/// status-command side channel keys on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StsUpdt {
    pub status: u16,
}

impl StsUpdt {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.status as u64, 16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, status, 16);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((StsUpdt { status: status as u16 }, src_id as u32, dst_id as u32))
    }

    /// Unit status octet, the value the status-command channel matches on.
    pub fn unit_status(&self) -> u8 {
        (self.status & 0xFF) as u8
    }
}

/// MSG_UPDT — message update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MsgUpdt {
    pub message: u16,
}

impl MsgUpdt {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.message as u64, 16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, message, 16);
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((MsgUpdt { message: message as u16 }, src_id as u32, dst_id as u32))
    }
}

/// CALL_ALRT — call alert. Pure addressing, no extra fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallAlrt;

impl CallAlrt {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_zeroes(16);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        buf.read_field(16, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((CallAlrt, src_id as u32, dst_id as u32))
    }
}

/// ACK_RSP — acknowledge response, either from the FNE or a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AckRsp {
    /// Additional information valid
    pub aiv: bool,
    /// Opcode of the service being acknowledged
    pub service: u8,
}

impl AckRsp {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.aiv as u64, 1);
        buf.write_bits(0, 1);
        buf.write_bits((self.service & 0x3F) as u64, 6);
        buf.write_zeroes(8);
        buf.write_bits(dst_id as u64, 24);
        buf.write_bits(src_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, aiv, 1);
        buf.read_field(1, "reserved")?;
        let_field!(buf, service, 6);
        buf.read_field(8, "reserved")?;
        let_field!(buf, dst_id, 24);
        let_field!(buf, src_id, 24);
        Ok((
            AckRsp { aiv: aiv == 1, service: service as u8 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// CAN_SRV_REQ — cancel service request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanSrvReq {
    pub aiv: bool,
    pub service: u8,
    pub reason: u8,
}

impl CanSrvReq {
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
            CanSrvReq { aiv: aiv == 1, service: service as u8, reason: reason as u8 },
            src_id as u32,
            dst_id as u32,
        ))
    }
}

/// EXT_FNCT — extended function command/response. The header source carries
/// the function argument, the header target the addressed unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtFnct {
    pub function: u16,
}

impl ExtFnct {
    pub fn to_bitbuf(&self, src_id: u32, dst_id: u32, buf: &mut BitBuffer) {
        buf.write_bits(self.function as u64, 16);
        buf.write_bits(src_id as u64, 24);
        buf.write_bits(dst_id as u64, 24);
    }

    pub fn from_bitbuf(buf: &mut BitBuffer) -> Result<(Self, u32, u32), PduParseErr> {
        let_field!(buf, function, 16);
        let_field!(buf, src_id, 24);
        let_field!(buf, dst_id, 24);
        Ok((ExtFnct { function: function as u16 }, src_id as u32, dst_id as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use p25_core::p25_common::ext_fnct;

    #[test]
    fn test_sts_updt_unit_status() {
        let sts = StsUpdt { status: 0x1242 };
        assert_eq!(sts.unit_status(), 0x42);
        let mut buf = BitBuffer::new(64);
        sts.to_bitbuf(1001, 0, &mut buf);
        buf.seek(0);
        let (decoded, src, _) = StsUpdt::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, sts);
        assert_eq!(src, 1001);
    }

    #[test]
    fn test_ext_fnct_arg_target_ordering() {
        let ext = ExtFnct { function: ext_fnct::INHIBIT };
        let mut buf = BitBuffer::new(64);
        ext.to_bitbuf(p25_core::p25_common::WUID_SYS, 1002, &mut buf);
        buf.seek(0);
        let (decoded, src, dst) = ExtFnct::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded.function, ext_fnct::INHIBIT);
        assert_eq!(src, p25_core::p25_common::WUID_SYS);
        assert_eq!(dst, 1002);
    }

    #[test]
    fn test_ack_rsp_service_width() {
        let ack = AckRsp { aiv: true, service: 0x3F };
        let mut buf = BitBuffer::new(64);
        ack.to_bitbuf(7, 8, &mut buf);
        buf.seek(0);
        let (decoded, ..) = AckRsp::from_bitbuf(&mut buf).unwrap();
        assert_eq!(decoded, ack);
    }
}

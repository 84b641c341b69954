//! TSBK — trunking signaling block.
//!
//! One block is 12 octets: a common header (last-block flag, protect flag,
//! opcode, manufacturer ID), a 64-bit opcode-specific payload, and a 16-bit
//! CRC. Inbound and outbound opcode spaces overlap numerically, so decode is
//! direction-aware. Messages are modeled as a common header plus a tagged
//! payload variant; fields a variant does not name are zeroed on encode and
//! ignored on decode.

pub mod broadcast;
pub mod data;
pub mod mobility;
pub mod motorola;
pub mod response;
pub mod voice;

use p25_core::p25_common::{Direction, MFG_MOT, MFG_STANDARD, TSBK_FEC_LENGTH_BYTES, TSBK_LENGTH_BYTES};
use p25_core::pdu_parse_error::PduParseErr;
use p25_core::BitBuffer;

use crate::edac::{crc16, trellis};

pub use broadcast::{AdjStsBcast, IdenUp, IdenUpVu, NetStsBcast, RfssStsBcast, SndcpChAnn};
pub use data::{AckRsp, CallAlrt, CanSrvReq, ExtFnct, MsgUpdt, StsUpdt};
pub use mobility::{GrpAff, GrpAffQ, GrpAffQRsp, LocRegReq, UDeregAck, UDeregReq, UReg, URegCmd};
pub use motorola::{MotCcBsi, MotGrgAdd, MotPshCch};
pub use response::{DenyRsp, QueRsp};
pub use voice::{GrpVch, TeleIntAns, UuAns, UuVch};

/// Link control opcode values. ISP and OSP share values where the opcode is
/// an IOSP; direction disambiguates the rest.
pub mod lco {
    pub const GRP_VCH: u8 = 0x00;
    pub const UU_VCH: u8 = 0x04;
    pub const UU_ANS: u8 = 0x05;
    pub const TELE_INT_ANS: u8 = 0x0A;
    pub const SNDCP_CH_ANN: u8 = 0x16;
    pub const STS_UPDT: u8 = 0x18;
    pub const MSG_UPDT: u8 = 0x1C;
    pub const CALL_ALRT: u8 = 0x1F;
    pub const ACK_RSP: u8 = 0x20;
    pub const QUE_RSP: u8 = 0x21;
    pub const CAN_SRV_REQ: u8 = 0x23;
    pub const EXT_FNCT: u8 = 0x24;
    pub const DENY_RSP: u8 = 0x27;
    pub const GRP_AFF: u8 = 0x28;
    pub const GRP_AFF_Q_RSP: u8 = 0x29;
    pub const GRP_AFF_Q: u8 = 0x2A;
    pub const U_DEREG_REQ: u8 = 0x2B;
    pub const U_REG: u8 = 0x2C;
    /// OSP at 0x2D
    pub const U_REG_CMD: u8 = 0x2D;
    /// ISP at 0x2D
    pub const LOC_REG_REQ: u8 = 0x2D;
    pub const U_DEREG_ACK: u8 = 0x2F;
    pub const IDEN_UP_VU: u8 = 0x34;
    pub const RFSS_STS_BCAST: u8 = 0x3A;
    pub const NET_STS_BCAST: u8 = 0x3B;
    pub const ADJ_STS_BCAST: u8 = 0x3C;
    pub const IDEN_UP: u8 = 0x3D;

    // Motorola opcode space (mfid 0x90)
    pub const MOT_GRG_ADD: u8 = 0x00;
    pub const MOT_PSH_CCH: u8 = 0x0E;
    pub const MOT_CC_BSI: u8 = 0x3E;
}

/// Opcode-specific payload. Variants carry only the fields their opcode
/// defines; unit/group addressing lives in the [`Tsbk`] header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsbkPayload {
    GrpVch(GrpVch),
    UuVch(UuVch),
    UuAns(UuAns),
    TeleIntAns(TeleIntAns),
    StsUpdt(StsUpdt),
    MsgUpdt(MsgUpdt),
    CallAlrt(CallAlrt),
    AckRsp(AckRsp),
    CanSrvReq(CanSrvReq),
    ExtFnct(ExtFnct),
    GrpAff(GrpAff),
    GrpAffQ(GrpAffQ),
    GrpAffQRsp(GrpAffQRsp),
    UReg(UReg),
    URegCmd(URegCmd),
    UDeregReq(UDeregReq),
    UDeregAck(UDeregAck),
    LocRegReq(LocRegReq),
    DenyRsp(DenyRsp),
    QueRsp(QueRsp),
    IdenUp(IdenUp),
    IdenUpVu(IdenUpVu),
    NetStsBcast(NetStsBcast),
    RfssStsBcast(RfssStsBcast),
    AdjStsBcast(AdjStsBcast),
    SndcpChAnn(SndcpChAnn),
    MotGrgAdd(MotGrgAdd),
    MotPshCch(MotPshCch),
    MotCcBsi(MotCcBsi),
}

impl TsbkPayload {
    /// (manufacturer, opcode) pair on the wire.
    pub fn opcode(&self) -> (u8, u8) {
        match self {
            TsbkPayload::GrpVch(_) => (MFG_STANDARD, lco::GRP_VCH),
            TsbkPayload::UuVch(_) => (MFG_STANDARD, lco::UU_VCH),
            TsbkPayload::UuAns(_) => (MFG_STANDARD, lco::UU_ANS),
            TsbkPayload::TeleIntAns(_) => (MFG_STANDARD, lco::TELE_INT_ANS),
            TsbkPayload::StsUpdt(_) => (MFG_STANDARD, lco::STS_UPDT),
            TsbkPayload::MsgUpdt(_) => (MFG_STANDARD, lco::MSG_UPDT),
            TsbkPayload::CallAlrt(_) => (MFG_STANDARD, lco::CALL_ALRT),
            TsbkPayload::AckRsp(_) => (MFG_STANDARD, lco::ACK_RSP),
            TsbkPayload::CanSrvReq(_) => (MFG_STANDARD, lco::CAN_SRV_REQ),
            TsbkPayload::ExtFnct(_) => (MFG_STANDARD, lco::EXT_FNCT),
            TsbkPayload::GrpAff(_) => (MFG_STANDARD, lco::GRP_AFF),
            TsbkPayload::GrpAffQ(_) => (MFG_STANDARD, lco::GRP_AFF_Q),
            TsbkPayload::GrpAffQRsp(_) => (MFG_STANDARD, lco::GRP_AFF_Q_RSP),
            TsbkPayload::UReg(_) => (MFG_STANDARD, lco::U_REG),
            TsbkPayload::URegCmd(_) => (MFG_STANDARD, lco::U_REG_CMD),
            TsbkPayload::UDeregReq(_) => (MFG_STANDARD, lco::U_DEREG_REQ),
            TsbkPayload::UDeregAck(_) => (MFG_STANDARD, lco::U_DEREG_ACK),
            TsbkPayload::LocRegReq(_) => (MFG_STANDARD, lco::LOC_REG_REQ),
            TsbkPayload::DenyRsp(_) => (MFG_STANDARD, lco::DENY_RSP),
            TsbkPayload::QueRsp(_) => (MFG_STANDARD, lco::QUE_RSP),
            TsbkPayload::IdenUp(_) => (MFG_STANDARD, lco::IDEN_UP),
            TsbkPayload::IdenUpVu(_) => (MFG_STANDARD, lco::IDEN_UP_VU),
            TsbkPayload::NetStsBcast(_) => (MFG_STANDARD, lco::NET_STS_BCAST),
            TsbkPayload::RfssStsBcast(_) => (MFG_STANDARD, lco::RFSS_STS_BCAST),
            TsbkPayload::AdjStsBcast(_) => (MFG_STANDARD, lco::ADJ_STS_BCAST),
            TsbkPayload::SndcpChAnn(_) => (MFG_STANDARD, lco::SNDCP_CH_ANN),
            TsbkPayload::MotGrgAdd(_) => (MFG_MOT, lco::MOT_GRG_ADD),
            TsbkPayload::MotPshCch(_) => (MFG_MOT, lco::MOT_PSH_CCH),
            TsbkPayload::MotCcBsi(_) => (MFG_MOT, lco::MOT_CC_BSI),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TsbkPayload::GrpVch(_) => "GRP_VCH",
            TsbkPayload::UuVch(_) => "UU_VCH",
            TsbkPayload::UuAns(_) => "UU_ANS",
            TsbkPayload::TeleIntAns(_) => "TELE_INT_ANS",
            TsbkPayload::StsUpdt(_) => "STS_UPDT",
            TsbkPayload::MsgUpdt(_) => "MSG_UPDT",
            TsbkPayload::CallAlrt(_) => "CALL_ALRT",
            TsbkPayload::AckRsp(_) => "ACK_RSP",
            TsbkPayload::CanSrvReq(_) => "CAN_SRV_REQ",
            TsbkPayload::ExtFnct(_) => "EXT_FNCT",
            TsbkPayload::GrpAff(_) => "GRP_AFF",
            TsbkPayload::GrpAffQ(_) => "GRP_AFF_Q",
            TsbkPayload::GrpAffQRsp(_) => "GRP_AFF_Q_RSP",
            TsbkPayload::UReg(_) => "U_REG",
            TsbkPayload::URegCmd(_) => "U_REG_CMD",
            TsbkPayload::UDeregReq(_) => "U_DEREG_REQ",
            TsbkPayload::UDeregAck(_) => "U_DEREG_ACK",
            TsbkPayload::LocRegReq(_) => "LOC_REG_REQ",
            TsbkPayload::DenyRsp(_) => "DENY_RSP",
            TsbkPayload::QueRsp(_) => "QUE_RSP",
            TsbkPayload::IdenUp(_) => "IDEN_UP",
            TsbkPayload::IdenUpVu(_) => "IDEN_UP_VU",
            TsbkPayload::NetStsBcast(_) => "NET_STS_BCAST",
            TsbkPayload::RfssStsBcast(_) => "RFSS_STS_BCAST",
            TsbkPayload::AdjStsBcast(_) => "ADJ_STS_BCAST",
            TsbkPayload::SndcpChAnn(_) => "SNDCP_CH_ANN",
            TsbkPayload::MotGrgAdd(_) => "MOT_GRG_ADD",
            TsbkPayload::MotPshCch(_) => "MOT_PSH_CCH",
            TsbkPayload::MotCcBsi(_) => "MOT_CC_BSI",
        }
    }
}

/// One trunking signaling block: common header + opcode payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tsbk {
    pub mfid: u8,
    pub last_block: bool,
    pub protect: bool,
    /// Requesting/source unit, 24 bits. Zero where the opcode has no source.
    pub src_id: u32,
    /// Target unit or talkgroup, 24 bits. Zero where the opcode has no target.
    pub dst_id: u32,
    pub payload: TsbkPayload,
}

impl Tsbk {
    pub fn new(src_id: u32, dst_id: u32, payload: TsbkPayload) -> Self {
        let (mfid, _) = payload.opcode();
        Tsbk {
            mfid,
            last_block: false,
            protect: false,
            src_id: src_id & 0xFF_FFFF,
            dst_id: dst_id & 0xFF_FFFF,
            payload,
        }
    }

    pub fn lco(&self) -> u8 {
        self.payload.opcode().1
    }

    pub fn name(&self) -> &'static str {
        self.payload.name()
    }

    /// Encode into the un-coded 12-octet block: header, payload, CRC.
    pub fn encode_block(&self) -> [u8; TSBK_LENGTH_BYTES] {
        let (mfid_default, lco) = self.payload.opcode();
        let mfid = if self.mfid != MFG_STANDARD { self.mfid } else { mfid_default };

        let mut buf = BitBuffer::new(TSBK_LENGTH_BYTES * 8);
        buf.write_bits(self.last_block as u64, 1);
        buf.write_bits(self.protect as u64, 1);
        buf.write_bits(lco as u64, 6);
        buf.write_bits(mfid as u64, 8);
        self.write_payload(&mut buf);

        let mut block = [0u8; TSBK_LENGTH_BYTES];
        block.copy_from_slice(buf.as_bytes());
        let crc = crc16::crc16_tsbk(&block, 80);
        block[10] = (crc >> 8) as u8;
        block[11] = (crc & 0xFF) as u8;
        block
    }

    fn write_payload(&self, buf: &mut BitBuffer) {
        let src = self.src_id;
        let dst = self.dst_id;
        match &self.payload {
            TsbkPayload::GrpVch(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::UuVch(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::UuAns(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::TeleIntAns(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::StsUpdt(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::MsgUpdt(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::CallAlrt(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::AckRsp(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::CanSrvReq(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::ExtFnct(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::GrpAff(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::GrpAffQ(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::GrpAffQRsp(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::UReg(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::URegCmd(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::UDeregReq(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::UDeregAck(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::LocRegReq(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::DenyRsp(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::QueRsp(p) => p.to_bitbuf(src, dst, buf),
            TsbkPayload::IdenUp(p) => p.to_bitbuf(buf),
            TsbkPayload::IdenUpVu(p) => p.to_bitbuf(buf),
            TsbkPayload::NetStsBcast(p) => p.to_bitbuf(buf),
            TsbkPayload::RfssStsBcast(p) => p.to_bitbuf(buf),
            TsbkPayload::AdjStsBcast(p) => p.to_bitbuf(buf),
            TsbkPayload::SndcpChAnn(p) => p.to_bitbuf(buf),
            TsbkPayload::MotGrgAdd(p) => p.to_bitbuf(buf),
            TsbkPayload::MotPshCch(p) => p.to_bitbuf(buf),
            TsbkPayload::MotCcBsi(p) => p.to_bitbuf(buf),
        }
    }
}

/// Decode one un-coded 12-octet block. Validates the CRC, then dispatches on
/// (manufacturer, opcode, direction).
pub fn decode_tsbk_block(block: &[u8], direction: Direction) -> Result<Tsbk, PduParseErr> {
    if block.len() < TSBK_LENGTH_BYTES {
        return Err(PduParseErr::Truncated { needed: TSBK_LENGTH_BYTES, got: block.len() });
    }

    let expected = ((block[10] as u16) << 8) | block[11] as u16;
    let calculated = crc16::crc16_tsbk(block, 80);
    if calculated != expected {
        return Err(PduParseErr::Crc { calculated, expected });
    }

    let mut buf = BitBuffer::from_bytes(&block[..TSBK_LENGTH_BYTES]);
    let last_block = buf.read_field(1, "last_block")? == 1;
    let protect = buf.read_field(1, "protect")? == 1;
    let lco = buf.read_field(6, "lco")? as u8;
    let mfid = buf.read_field(8, "mfid")? as u8;

    let (payload, src_id, dst_id) = decode_payload(mfid, lco, direction, &mut buf)
        .map_err(|e| match e {
            PduParseErr::InvalidValue { field: "lco", .. } => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&block[2..10]);
                PduParseErr::UnknownLco { mfid, lco, raw }
            }
            other => other,
        })?;

    Ok(Tsbk { mfid, last_block, protect, src_id, dst_id, payload })
}

fn decode_payload(mfid: u8, lco: u8, direction: Direction, buf: &mut BitBuffer)
    -> Result<(TsbkPayload, u32, u32), PduParseErr>
{
    use Direction::*;

    if mfid == MFG_MOT {
        return match lco {
            lco::MOT_GRG_ADD => MotGrgAdd::from_bitbuf(buf).map(|p| (TsbkPayload::MotGrgAdd(p), 0, 0)),
            lco::MOT_PSH_CCH => MotPshCch::from_bitbuf(buf).map(|p| (TsbkPayload::MotPshCch(p), 0, 0)),
            lco::MOT_CC_BSI => MotCcBsi::from_bitbuf(buf).map(|p| (TsbkPayload::MotCcBsi(p), 0, 0)),
            _ => Err(PduParseErr::InvalidValue { field: "lco", value: lco as u64 }),
        };
    }

    match (lco, direction) {
        (lco::GRP_VCH, _) => GrpVch::from_bitbuf(buf).map(wrap(TsbkPayload::GrpVch)),
        (lco::UU_VCH, _) => UuVch::from_bitbuf(buf).map(wrap(TsbkPayload::UuVch)),
        (lco::UU_ANS, _) => UuAns::from_bitbuf(buf).map(wrap(TsbkPayload::UuAns)),
        (lco::TELE_INT_ANS, _) => TeleIntAns::from_bitbuf(buf).map(wrap(TsbkPayload::TeleIntAns)),
        (lco::STS_UPDT, _) => StsUpdt::from_bitbuf(buf).map(wrap(TsbkPayload::StsUpdt)),
        (lco::MSG_UPDT, _) => MsgUpdt::from_bitbuf(buf).map(wrap(TsbkPayload::MsgUpdt)),
        (lco::CALL_ALRT, _) => CallAlrt::from_bitbuf(buf).map(wrap(TsbkPayload::CallAlrt)),
        (lco::ACK_RSP, _) => AckRsp::from_bitbuf(buf).map(wrap(TsbkPayload::AckRsp)),
        (lco::EXT_FNCT, _) => ExtFnct::from_bitbuf(buf).map(wrap(TsbkPayload::ExtFnct)),
        (lco::GRP_AFF, _) => GrpAff::from_bitbuf(buf).map(wrap(TsbkPayload::GrpAff)),
        (lco::U_REG, _) => UReg::from_bitbuf(buf).map(wrap(TsbkPayload::UReg)),

        (lco::CAN_SRV_REQ, Inbound) => CanSrvReq::from_bitbuf(buf).map(wrap(TsbkPayload::CanSrvReq)),
        (lco::GRP_AFF_Q_RSP, Inbound) => GrpAffQRsp::from_bitbuf(buf).map(wrap(TsbkPayload::GrpAffQRsp)),
        (lco::U_DEREG_REQ, Inbound) => UDeregReq::from_bitbuf(buf).map(wrap(TsbkPayload::UDeregReq)),
        (lco::LOC_REG_REQ, Inbound) => LocRegReq::from_bitbuf(buf).map(wrap(TsbkPayload::LocRegReq)),

        (lco::QUE_RSP, Outbound) => QueRsp::from_bitbuf(buf).map(wrap(TsbkPayload::QueRsp)),
        (lco::DENY_RSP, Outbound) => DenyRsp::from_bitbuf(buf).map(wrap(TsbkPayload::DenyRsp)),
        (lco::GRP_AFF_Q, Outbound) => GrpAffQ::from_bitbuf(buf).map(wrap(TsbkPayload::GrpAffQ)),
        (lco::U_REG_CMD, Outbound) => URegCmd::from_bitbuf(buf).map(wrap(TsbkPayload::URegCmd)),
        (lco::U_DEREG_ACK, Outbound) => UDeregAck::from_bitbuf(buf).map(wrap(TsbkPayload::UDeregAck)),
        (lco::SNDCP_CH_ANN, Outbound) => SndcpChAnn::from_bitbuf(buf).map(|p| (TsbkPayload::SndcpChAnn(p), 0, 0)),
        (lco::IDEN_UP, Outbound) => IdenUp::from_bitbuf(buf).map(|p| (TsbkPayload::IdenUp(p), 0, 0)),
        (lco::IDEN_UP_VU, Outbound) => IdenUpVu::from_bitbuf(buf).map(|p| (TsbkPayload::IdenUpVu(p), 0, 0)),
        (lco::NET_STS_BCAST, Outbound) => NetStsBcast::from_bitbuf(buf).map(|p| (TsbkPayload::NetStsBcast(p), 0, 0)),
        (lco::RFSS_STS_BCAST, Outbound) => RfssStsBcast::from_bitbuf(buf).map(|p| (TsbkPayload::RfssStsBcast(p), 0, 0)),
        (lco::ADJ_STS_BCAST, Outbound) => AdjStsBcast::from_bitbuf(buf).map(|p| (TsbkPayload::AdjStsBcast(p), 0, 0)),

        _ => Err(PduParseErr::InvalidValue { field: "lco", value: lco as u64 }),
    }
}

fn wrap<P>(ctor: fn(P) -> TsbkPayload) -> impl Fn((P, u32, u32)) -> (TsbkPayload, u32, u32) {
    move |(p, src, dst)| (ctor(p), src, dst)
}

/// Encode a TSBK. With `raw` the un-coded 12-octet block is returned (used
/// for MBF stacking); otherwise the trellis-coded 25-octet block.
pub fn encode_tsbk(tsbk: &Tsbk, raw: bool) -> Vec<u8> {
    let block = tsbk.encode_block();
    if raw {
        block.to_vec()
    } else {
        trellis::encode(&block).to_vec()
    }
}

/// Decode a trellis-coded TSBK block: FEC first, then CRC and fields.
pub fn decode_tsbk(coded: &[u8], direction: Direction) -> Result<Tsbk, PduParseErr> {
    if coded.len() < TSBK_FEC_LENGTH_BYTES {
        return Err(PduParseErr::Truncated { needed: TSBK_FEC_LENGTH_BYTES, got: coded.len() });
    }
    let mut fec = [0u8; TSBK_FEC_LENGTH_BYTES];
    fec.copy_from_slice(&coded[..TSBK_FEC_LENGTH_BYTES]);
    let block = trellis::decode(&fec)?;
    decode_tsbk_block(&block, direction)
}

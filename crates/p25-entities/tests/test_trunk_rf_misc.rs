mod common;

use common::{default_test_config, DenyListAcl, TrunkHarness};
use p25_core::p25_common::{ans, deny, ext_fnct, Duid, PAYLOAD_START_BIT, TSBK_FEC_LENGTH_BITS,
    TSDU_FRAME_LENGTH_BYTES, WUID_SYS};
use p25_entities::trunk::frame_utils;
use p25_pdus::tsbk::{encode_tsbk, lco, AckRsp, CanSrvReq, GrpVch, TeleIntAns, Tsbk, TsbkPayload,
    UuAns, UuVch};

#[test]
fn test_ack_rsp_swap_applied() {
    let mut t = TrunkHarness::new(default_test_config());

    let inbound = Tsbk::new(1001, 1002,
        TsbkPayload::AckRsp(AckRsp { aiv: false, service: lco::CALL_ALRT }));
    t.submit_rf(&inbound);

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::AckRsp(a) => assert!(a.aiv),
        other => panic!("expected ACK_RSP, got {:?}", other),
    }
    assert_eq!(out[0].src_id, 1002);
    assert_eq!(out[0].dst_id, 1001);
}

#[test]
fn test_ack_rsp_swap_configurable_off() {
    let mut cfg = default_test_config();
    cfg.control.ack_rsp_swap = false;
    let mut t = TrunkHarness::new(cfg);

    let inbound = Tsbk::new(1001, 1002,
        TsbkPayload::AckRsp(AckRsp { aiv: false, service: lco::CALL_ALRT }));
    t.submit_rf(&inbound);

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload, TsbkPayload::AckRsp(a) if !a.aiv));
    assert_eq!(out[0].src_id, 1001);
    assert_eq!(out[0].dst_id, 1002);
}

#[test]
fn test_tele_int_ans_deny_repeats_ack() {
    // a deny answer is acknowledged twice and never denied; matches the
    // deployed behavior this engine replaces
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 0,
        TsbkPayload::TeleIntAns(TeleIntAns { response: ans::DENY })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 2);
    for tsbk in &out {
        assert!(matches!(&tsbk.payload,
            TsbkPayload::AckRsp(a) if a.service == lco::TELE_INT_ANS));
    }
}

#[test]
fn test_tele_int_ans_proceed_denied_unsupported() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 0,
        TsbkPayload::TeleIntAns(TeleIntAns { response: ans::PROCEED })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[0].payload,
        TsbkPayload::AckRsp(a) if a.service == lco::TELE_INT_ANS));
    assert!(matches!(&out[1].payload,
        TsbkPayload::DenyRsp(d) if d.reason == deny::SYS_UNSUPPORTED_SVC));
}

#[test]
fn test_can_srv_req_acknowledged() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 0, TsbkPayload::CanSrvReq(CanSrvReq {
        aiv: true,
        service: lco::GRP_VCH,
        reason: 0x10,
    })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload,
        TsbkPayload::AckRsp(a) if a.service == lco::CAN_SRV_REQ));
}

#[test]
fn test_control_disabled_rejects_service() {
    let mut cfg = default_test_config();
    cfg.control.control = false;
    let mut t = TrunkHarness::new(cfg);

    t.submit_rf(&Tsbk::new(1001, 5000, TsbkPayload::GrpVch(GrpVch::default())));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload,
        TsbkPayload::DenyRsp(d) if d.reason == deny::SYS_UNSUPPORTED_SVC));
    assert!(!t.engine.has_grant(5000));
}

#[test]
fn test_uu_vch_asks_target_to_answer() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 1002, TsbkPayload::UuVch(UuVch::default())));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload, TsbkPayload::UuAns(a) if a.response == 0));
    assert_eq!(out[0].src_id, 1001);
    assert_eq!(out[0].dst_id, 1002);
    // no channel committed until the called unit answers
    assert!(!t.engine.has_grant(1002));
}

#[test]
fn test_uu_ans_proceed_grants_channel() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 1002,
        TsbkPayload::UuAns(UuAns { svc_opts: 0, response: ans::PROCEED })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[0].payload,
        TsbkPayload::AckRsp(a) if a.service == lco::UU_ANS));
    match &out[1].payload {
        TsbkPayload::UuVch(grant) => assert_eq!(grant.ch_no, 2),
        other => panic!("expected UU_VCH grant, got {:?}", other),
    }
    assert!(t.engine.has_grant(1002));
}

#[test]
fn test_uu_ans_refusal_denied_to_caller() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 1002,
        TsbkPayload::UuAns(UuAns { svc_opts: 0, response: ans::DENY })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[1].payload,
        TsbkPayload::DenyRsp(d) if d.reason == deny::TGT_UNIT_REFUSED));
}

#[test]
fn test_msg_updt_ack_suppressed_by_default() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1001, 1002,
        TsbkPayload::MsgUpdt(p25_pdus::tsbk::MsgUpdt { message: 0x20 })));

    assert!(t.take_rf_tsbks().is_empty());
    // still reflected upstream
    assert_eq!(t.take_net_tsbks().len(), 1);

    let mut cfg = default_test_config();
    cfg.control.no_message_ack = false;
    let mut t = TrunkHarness::new(cfg);
    t.submit_rf(&Tsbk::new(1001, 1002,
        TsbkPayload::MsgUpdt(p25_pdus::tsbk::MsgUpdt { message: 0x20 })));
    let out = t.take_rf_tsbks();
    assert!(matches!(&out[0].payload,
        TsbkPayload::AckRsp(a) if a.service == lco::MSG_UPDT));
}

#[test]
fn test_nac_mismatch_ignored() {
    let mut t = TrunkHarness::new(default_test_config());

    let tsbk = Tsbk::new(1001, 5000, TsbkPayload::GrpVch(GrpVch::default()));
    let mut frame = vec![0u8; TSDU_FRAME_LENGTH_BYTES];
    frame_utils::add_sync(&mut frame);
    frame_utils::encode_nid(&mut frame, 0x123, Duid::Tsdu);
    let coded = encode_tsbk(&tsbk, false);
    frame_utils::place_bits(&mut frame, PAYLOAD_START_BIT, &coded, TSBK_FEC_LENGTH_BITS);

    let TrunkHarness { engine, link } = &mut t;
    assert!(!engine.process_rf(link, &frame).is_handled());
    assert!(t.take_rf_tsbks().is_empty());
    assert!(!t.engine.has_grant(5000));
}

#[test]
fn test_acl_denied_source_inhibited() {
    let mut cfg = default_test_config();
    cfg.control.inhibit_illegal = true;
    let acl = DenyListAcl { bad_units: vec![666], bad_groups: vec![] };
    let mut t = TrunkHarness::with_acl(cfg, Box::new(acl));

    t.submit_rf(&Tsbk::new(666, 5000, TsbkPayload::GrpVch(GrpVch::default())));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 2);
    assert!(matches!(&out[0].payload,
        TsbkPayload::DenyRsp(d) if d.reason == deny::REQ_UNIT_NOT_VALID));
    match &out[1].payload {
        TsbkPayload::ExtFnct(e) => {
            assert_eq!(e.function, ext_fnct::INHIBIT);
            assert_eq!(out[1].src_id, WUID_SYS);
            assert_eq!(out[1].dst_id, 666);
        }
        other => panic!("expected EXT_FNCT inhibit, got {:?}", other),
    }
}

#[test]
fn test_ext_fnct_response_retransmitted() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&Tsbk::new(1002, 1001, TsbkPayload::ExtFnct(p25_pdus::tsbk::ExtFnct {
        function: ext_fnct::CHECK_ACK,
    })));

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload,
        TsbkPayload::ExtFnct(e) if e.function == ext_fnct::CHECK_ACK));
}

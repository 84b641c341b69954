mod common;

use common::{default_test_config, TrunkHarness};
use p25_core::p25_common::{deny, que, NetState, RfState, TGID_ALL};
use p25_pdus::tsbk::{lco, GrpVch, Tsbk, TsbkPayload};

fn grp_vch_req(src_id: u32, dst_id: u32) -> Tsbk {
    Tsbk::new(src_id, dst_id, TsbkPayload::GrpVch(GrpVch::default()))
}

#[test]
fn test_s1_group_grant_happy_path() {
    let mut t = TrunkHarness::new(default_test_config());

    assert!(t.submit_rf(&grp_vch_req(1001, 5000)).is_handled());

    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::GrpVch(grant) => {
            assert_eq!(grant.ch_no, 2);
            assert_eq!(grant.ch_id, 1);
        }
        other => panic!("expected GRP_VCH grant, got {:?}", other),
    }
    assert_eq!(out[0].src_id, 1001);
    assert_eq!(out[0].dst_id, 5000);

    assert!(t.engine.has_grant(5000));
    assert_eq!(t.engine.granted_ch(5000), Some(2));
    assert_eq!(t.engine.free_channel_count(), 2);
}

#[test]
fn test_s2_grant_reuse_keeps_channel_and_resets_lease() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&grp_vch_req(1001, 5000));
    t.take_rf_tsbks();
    t.engine.clock(10_000);

    // second request for the same talkgroup re-uses the channel
    t.submit_rf(&grp_vch_req(1001, 5000));
    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::GrpVch(grant) => assert_eq!(grant.ch_no, 2),
        other => panic!("expected GRP_VCH grant, got {:?}", other),
    }
    assert_eq!(t.engine.free_channel_count(), 2);

    // lease was reset by the re-grant: 10s more does not expire it
    t.engine.clock(10_000);
    assert!(t.engine.has_grant(5000));
    t.engine.clock(5_000);
    assert!(!t.engine.has_grant(5000));
}

#[test]
fn test_s3_queue_on_pool_exhaustion() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&grp_vch_req(1001, 5000));
    t.submit_rf(&grp_vch_req(1002, 5001));
    t.submit_rf(&grp_vch_req(1003, 5002));
    t.take_rf_tsbks();
    assert_eq!(t.engine.free_channel_count(), 0);

    t.submit_rf(&grp_vch_req(1004, 5003));
    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::QueRsp(q) => {
            assert_eq!(q.reason, que::CHN_RESOURCE_NOT_AVAIL);
            assert_eq!(q.service, lco::GRP_VCH);
        }
        other => panic!("expected QUE_RSP, got {:?}", other),
    }
    assert!(!t.engine.has_grant(5003));
}

#[test]
fn test_grant_expires_without_touch() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&grp_vch_req(1001, 5000));
    assert!(t.engine.has_grant(5000));

    t.engine.clock(14_999);
    assert!(t.engine.has_grant(5000));
    t.engine.clock(20);
    assert!(!t.engine.has_grant(5000));
    assert_eq!(t.engine.free_channel_count(), 3);
}

#[test]
fn test_pool_closure_through_grant_cycle() {
    let mut t = TrunkHarness::new(default_test_config());

    for (src, dst) in [(1001u32, 5000u32), (1002, 5001)] {
        t.submit_rf(&grp_vch_req(src, dst));
        assert_eq!(t.engine.free_channel_count() + t.engine.grant_count(), 3);
    }

    t.engine.clock(15_020);
    assert_eq!(t.engine.grant_count(), 0);
    assert_eq!(t.engine.free_channel_count() + t.engine.grant_count(), 3);
}

#[test]
fn test_hang_time_blocks_other_talkgroup() {
    let mut t = TrunkHarness::new(default_test_config());
    t.link.rf_last_dst_id = 5000;
    t.link.tg_hang_active = true;

    t.submit_rf(&grp_vch_req(1002, 5001));

    // silently dropped: no grant, no deny, no queue
    assert!(t.take_rf_tsbks().is_empty());
    assert!(!t.engine.has_grant(5001));

    // the hung talkgroup itself can still be granted
    t.submit_rf(&grp_vch_req(1001, 5000));
    assert!(t.engine.has_grant(5000));
}

#[test]
fn test_all_call_has_no_grant() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_rf(&grp_vch_req(1001, TGID_ALL));
    assert!(t.take_rf_tsbks().is_empty());
    assert_eq!(t.engine.grant_count(), 0);
    assert_eq!(t.engine.free_channel_count(), 3);
}

#[test]
fn test_rf_traffic_collision_denied() {
    let mut t = TrunkHarness::new(default_test_config());
    t.link.rf_state = RfState::Audio;

    t.submit_rf(&grp_vch_req(1001, 5000));
    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::DenyRsp(d) => assert_eq!(d.reason, deny::PTT_COLLIDE),
        other => panic!("expected DENY_RSP, got {:?}", other),
    }
}

#[test]
fn test_net_traffic_collision_denied_for_same_group() {
    let mut t = TrunkHarness::new(default_test_config());
    t.link.net_state = NetState::Audio;
    t.link.net_last_dst_id = 5000;

    t.submit_rf(&grp_vch_req(1001, 5000));
    let out = t.take_rf_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(&out[0].payload,
        TsbkPayload::DenyRsp(d) if d.reason == deny::PTT_COLLIDE));

    // a different group is unaffected by network traffic
    t.submit_rf(&grp_vch_req(1002, 5001));
    assert!(t.engine.has_grant(5001));
}

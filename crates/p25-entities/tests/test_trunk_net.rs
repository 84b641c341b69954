mod common;

use common::{default_test_config, DenyListAcl, TrunkHarness};
use p25_core::p25_common::{CFVA_CONV, CFVA_FAILURE, CFVA_VALID, RfState};
use p25_pdus::tsbk::{AdjStsBcast, GrpAff, StsUpdt, Tsbk, TsbkPayload};

fn adj_bcast(site_id: u8) -> Tsbk {
    Tsbk::new(0, 0, TsbkPayload::AdjStsBcast(AdjStsBcast {
        lra: 0,
        cfva: CFVA_CONV | CFVA_VALID,
        sys_id: 0x294,
        rfss_id: 1,
        site_id,
        ch_id: 1,
        ch_no: 10,
        svc_class: 0,
    }))
}

fn net_sts_updt(src_id: u32) -> Tsbk {
    Tsbk::new(src_id, 0, TsbkPayload::StsUpdt(StsUpdt { status: 0x10 }))
}

/// Drive the full six-sequence burst and return the adjacent-site
/// broadcasts it put on the air.
fn adj_broadcasts(t: &mut TrunkHarness) -> Vec<AdjStsBcast> {
    let TrunkHarness { engine, link } = t;
    engine.write_rf_control_data(link, 255, 0, true);
    t.take_rf_tsbks()
        .into_iter()
        .filter_map(|tsbk| match tsbk.payload {
            TsbkPayload::AdjStsBcast(adj) => Some(adj),
            _ => None,
        })
        .collect()
}

#[test]
fn test_s4_adjacent_site_age_out() {
    let mut t = TrunkHarness::new(default_test_config());

    assert!(t.submit_net(&adj_bcast(2)).is_handled());
    assert_eq!(t.engine.adj_site_count(), 1);
    assert_eq!(t.engine.adj_site_update_cnt(2), Some(5));

    // while healthy, the site is advertised as valid
    let adv = adj_broadcasts(&mut t);
    assert_eq!(adv.len(), 1);
    assert_eq!(adv[0].site_id, 2);
    assert_eq!(adv[0].cfva & CFVA_VALID, CFVA_VALID);
    assert_eq!(adv[0].cfva & CFVA_FAILURE, 0);

    // five unanswered update intervals decay the counter to zero
    for _ in 0..5 {
        t.engine.clock(30_000);
    }
    assert_eq!(t.engine.adj_site_update_cnt(2), Some(0));

    // the entry survives, now advertised as failed
    let adv = adj_broadcasts(&mut t);
    assert_eq!(adv.len(), 1);
    assert_eq!(adv[0].site_id, 2);
    assert_eq!(adv[0].cfva & CFVA_FAILURE, CFVA_FAILURE);
}

#[test]
fn test_adjacent_refresh_resets_counter() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_net(&adj_bcast(2));
    t.engine.clock(30_000);
    t.engine.clock(30_000);
    assert_eq!(t.engine.adj_site_update_cnt(2), Some(3));

    t.submit_net(&adj_bcast(2));
    assert_eq!(t.engine.adj_site_update_cnt(2), Some(5));
    assert_eq!(t.engine.adj_site_count(), 1);
}

#[test]
fn test_own_site_broadcast_not_tracked() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_net(&adj_bcast(1));
    assert_eq!(t.engine.adj_site_count(), 0);
}

#[test]
fn test_net_status_update_reflected() {
    let mut t = TrunkHarness::new(default_test_config());

    assert!(t.submit_net(&net_sts_updt(1001)).is_handled());
    let out = t.take_net_tsbks();
    assert_eq!(out.len(), 1);
    assert!(matches!(out[0].payload, TsbkPayload::StsUpdt(_)));
    assert_eq!(out[0].src_id, 1001);
}

#[test]
fn test_net_acl_failure_drops_silently() {
    let acl = DenyListAcl { bad_units: vec![1001], bad_groups: vec![] };
    let mut t = TrunkHarness::with_acl(default_test_config(), Box::new(acl));

    assert!(!t.submit_net(&net_sts_updt(1001)).is_handled());
    assert!(t.take_net_tsbks().is_empty());
    assert!(t.take_rf_tsbks().is_empty());
}

#[test]
fn test_net_affiliation_is_informational() {
    let mut t = TrunkHarness::new(default_test_config());

    let aff = Tsbk::new(1001, 5000, TsbkPayload::GrpAff(GrpAff::default()));
    assert!(t.submit_net(&aff).is_handled());

    // no registry mutation and no reflection
    assert!(!t.engine.has_aff(1001, 5000));
    assert!(t.take_net_tsbks().is_empty());
}

#[test]
fn test_net_ignored_while_rf_busy() {
    let mut t = TrunkHarness::new(default_test_config());
    t.link.rf_state = RfState::Audio;

    assert!(!t.submit_net(&net_sts_updt(1001)).is_handled());
    assert!(t.take_net_tsbks().is_empty());
}

#[test]
fn test_write_adj_ss_network_announces_local_site() {
    let mut t = TrunkHarness::new(default_test_config());
    t.engine.set_net_active(true);

    let TrunkHarness { engine, link } = &mut t;
    engine.write_adj_ss_network(link);

    let out = t.take_net_tsbks();
    assert_eq!(out.len(), 1);
    match &out[0].payload {
        TsbkPayload::AdjStsBcast(adj) => {
            assert_eq!(adj.sys_id, 0x293);
            assert_eq!(adj.site_id, 1);
            assert_eq!(adj.ch_no, 1);
            assert_eq!(adj.cfva, CFVA_CONV | CFVA_VALID);
        }
        other => panic!("expected ADJ_STS_BCAST, got {:?}", other),
    }
}

#[test]
fn test_adj_ss_network_quiet_without_backhaul() {
    let mut t = TrunkHarness::new(default_test_config());

    let TrunkHarness { engine, link } = &mut t;
    engine.write_adj_ss_network(link);
    assert!(t.take_net_tsbks().is_empty());
}

#[test]
fn test_adjacent_round_robin_across_bursts() {
    let mut t = TrunkHarness::new(default_test_config());

    t.submit_net(&adj_bcast(2));
    t.submit_net(&adj_bcast(3));

    let first = adj_broadcasts(&mut t);
    let second = adj_broadcasts(&mut t);
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].site_id, 2);
    assert_eq!(second[0].site_id, 3);
}

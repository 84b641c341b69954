use clap::Parser;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use p25_config::{toml_config, SharedConfig};
use p25_core::p25_common::{NetState, RfState};
use p25_core::debug;
use p25_entities::{ControlLink, PermitAll, TracingActivity, TrunkBs};
use p25_pdus::IdenTableEntry;

/// Clock cadence for the engine timers.
const CLOCK_INTERVAL_MS: u64 = 10;
/// One broadcast sequence slot per interval.
const BCAST_INTERVAL_MS: u64 = 100;
/// Upstream site announcement cadence.
const ADJ_ANNOUNCE_INTERVAL_MS: u64 = 10_000;

/// Link backed by bounded channels: the engine enqueues fully-built frames,
/// the transport side drains them. A full queue drops the frame; the
/// control channel never blocks on I/O.
struct QueueLink {
    modem_tx: Sender<Vec<u8>>,
    modem_rx: Receiver<Vec<u8>>,
    network_tx: Sender<Vec<u8>>,
    identities: Vec<IdenTableEntry>,
}

impl ControlLink for QueueLink {
    fn rf_state(&self) -> RfState { RfState::Listening }
    fn net_state(&self) -> NetState { NetState::Idle }
    fn rf_last_dst_id(&self) -> u32 { 0 }
    fn net_last_dst_id(&self) -> u32 { 0 }
    fn net_tg_hang_active(&self) -> bool { false }
    fn cc_running(&self) -> bool { true }
    fn rf_timed_out(&self) -> bool { false }
    fn iden_entries(&self) -> Vec<IdenTableEntry> { self.identities.clone() }

    fn write_queue_rf(&mut self, frame: &[u8]) {
        match self.modem_tx.try_send(frame.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("modem queue full, dropping frame"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn write_queue_net(&mut self, frame: &[u8]) {
        match self.network_tx.try_send(frame.to_vec()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("network queue full, dropping frame"),
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    fn clear_queue_rf(&mut self) {
        while self.modem_rx.try_recv().is_ok() {}
    }

    fn write_preamble(&mut self) {}
    fn write_rf_tdu(&mut self) {}
    fn stop_rf_timeout(&mut self) {}
}

/// Load configuration file
fn load_config_from_toml(cfg_path: &str) -> SharedConfig {
    match toml_config::from_file(cfg_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", cfg_path, e);
            std::process::exit(1);
        }
    }
}

fn spawn_drain(name: &'static str, rx: Receiver<Vec<u8>>) {
    thread::spawn(move || {
        let mut frames: u64 = 0;
        let mut bytes: u64 = 0;
        for frame in rx.iter() {
            frames += 1;
            bytes += frame.len() as u64;
            if frames % 500 == 0 {
                tracing::info!("{}: {} frames, {} bytes", name, frames, bytes);
            }
        }
    });
}

#[derive(Parser, Debug)]
#[command(
    author,
    version = p25_core::STACK_VERSION,
    about = "P25 TrunkStation control channel",
    long_about = "Runs the P25 trunked control-channel engine using the provided TOML configuration"
)]
struct Args {
    /// TOML config with site/control parameters
    config: String,
}

fn main() {
    eprintln!("P25 TrunkStation - control channel  ({})", p25_core::STACK_VERSION);

    let args = Args::parse();
    let cfg = load_config_from_toml(&args.config);
    let _log_guard = debug::setup_logging_default(cfg.config().debug_log.clone());

    let identities: Vec<IdenTableEntry> = cfg.config().identities.iter()
        .map(|id| IdenTableEntry {
            iden: id.iden,
            base_frequency_hz: id.base_frequency_hz,
            tx_offset_mhz: id.tx_offset_mhz,
            ch_bandwidth_khz: id.ch_bandwidth_khz,
            ch_spacing_khz: id.ch_spacing_khz,
        })
        .collect();

    let (modem_tx, modem_rx) = bounded::<Vec<u8>>(64);
    let (network_tx, network_rx) = bounded::<Vec<u8>>(64);
    spawn_drain("modem-tx", modem_rx.clone());
    spawn_drain("network-tx", network_rx);

    let mut link = QueueLink { modem_tx, modem_rx, network_tx, identities };
    let mut engine = TrunkBs::new(cfg.clone(), Box::new(PermitAll), Box::new(TracingActivity));

    tracing::info!("control channel up, site {}", {
        let c = cfg.config();
        format!("sysId = ${:03X}, rfss = {}, site = {}, chNo = {}",
            c.site.sys_id, c.site.rfss_id, c.site.site_id, c.site.channel_no)
    });

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("failed to set Ctrl+C handler");

    let mut elapsed_ms: u64 = 0;
    let mut frame_cnt: u8 = 0;
    let mut seq: u8 = 0;

    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_millis(CLOCK_INTERVAL_MS));
        elapsed_ms += CLOCK_INTERVAL_MS;

        engine.clock(CLOCK_INTERVAL_MS as u32);

        if elapsed_ms % BCAST_INTERVAL_MS == 0 {
            engine.write_rf_control_data(&mut link, frame_cnt, seq, true);
            seq = (seq + 1) % 5;
            frame_cnt = frame_cnt.wrapping_add(1);
        }

        if elapsed_ms % ADJ_ANNOUNCE_INTERVAL_MS == 0 {
            engine.write_adj_ss_network(&mut link);
        }
    }

    tracing::info!("shutting down");
}

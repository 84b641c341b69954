use std::collections::HashMap;

use p25_core::p25_common::GRANT_TIMER_TIMEOUT_MS;
use p25_core::Timer;

/// The voice channel pool and active grant table.
///
/// A channel number lives in exactly one place at a time: the free pool or
/// the grant table. Every grant has a lease timer; a grant that is neither
/// touched nor released falls back into the pool when its lease runs out.
pub struct ChannelGrants {
    free: Vec<u16>,
    grants: HashMap<u32, u16>,
    timers: HashMap<u32, Timer>,
    configured: usize,
}

impl ChannelGrants {
    pub fn new() -> Self {
        ChannelGrants {
            free: Vec::new(),
            grants: HashMap::new(),
            timers: HashMap::new(),
            configured: 0,
        }
    }

    /// Seed the pool from configuration. Replaces any previous pool.
    pub fn preload(&mut self, channels: &[u16]) {
        self.free = channels.to_vec();
        self.grants.clear();
        self.timers.clear();
        self.configured = self.free.len();
    }

    pub fn has_grant(&self, dst_id: u32) -> bool {
        if dst_id == 0 {
            return false;
        }
        matches!(self.grants.get(&dst_id), Some(ch) if *ch != 0)
    }

    pub fn is_ch_busy(&self, ch_no: u16) -> bool {
        if ch_no == 0 {
            return false;
        }
        self.grants.values().any(|ch| *ch == ch_no)
    }

    pub fn granted_ch(&self, dst_id: u32) -> Option<u16> {
        self.grants.get(&dst_id).copied().filter(|ch| *ch != 0)
    }

    /// Take the first free channel for `dst_id` and start its lease.
    /// Returns None when the pool is exhausted.
    pub fn acquire(&mut self, dst_id: u32) -> Option<u16> {
        if dst_id == 0 || self.free.is_empty() {
            return None;
        }

        let ch_no = self.free.remove(0);
        self.grants.insert(dst_id, ch_no);

        let mut timer = Timer::new(GRANT_TIMER_TIMEOUT_MS);
        timer.start();
        self.timers.insert(dst_id, timer);

        Some(ch_no)
    }

    /// Reset the lease to its full timeout if the grant exists.
    pub fn touch(&mut self, dst_id: u32) {
        if dst_id == 0 || !self.has_grant(dst_id) {
            return;
        }
        if let Some(timer) = self.timers.get_mut(&dst_id) {
            timer.start();
        }
    }

    /// Return a grant's channel to the pool and stop its lease. With
    /// `release_all` every grant is released. Returns the (dstId, chNo)
    /// pairs actually released.
    pub fn release(&mut self, dst_id: u32, release_all: bool) -> Vec<(u32, u16)> {
        if dst_id == 0 && !release_all {
            return vec![];
        }

        if release_all {
            tracing::warn!("P25, force releasing all channel grants");
            let mut all: Vec<u32> = self.grants.keys().copied().collect();
            all.sort_unstable();
            let mut released = vec![];
            for dst in all {
                released.extend(self.release(dst, false));
            }
            return released;
        }

        let Some(ch_no) = self.granted_ch(dst_id) else {
            return vec![];
        };

        tracing::info!("P25, releasing channel grant, chNo = {}, dstId = {}", ch_no, dst_id);
        self.grants.remove(&dst_id);
        self.timers.remove(&dst_id);
        self.free.push(ch_no);
        vec![(dst_id, ch_no)]
    }

    /// Advance every lease timer and collect the grants whose lease ran out.
    pub fn clock_expired(&mut self, ms: u32) -> Vec<u32> {
        let mut expired: Vec<u32> = self
            .timers
            .iter_mut()
            .filter_map(|(dst, timer)| {
                timer.clock(ms);
                (timer.is_running() && timer.has_expired()).then_some(*dst)
            })
            .collect();
        expired.sort_unstable();
        expired
    }

    pub fn grant_count(&self) -> usize {
        self.grants.len()
    }

    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    pub fn free_channels(&self) -> &[u16] {
        &self.free
    }

    /// Pool closure invariant: every configured channel is free or granted,
    /// once. On violation logs an error and force-releases everything.
    pub fn check_consistency(&mut self) -> bool {
        let closed = self.free.len() + self.grants.len() == self.configured
            && self.grants.values().all(|ch| !self.free.contains(ch))
            && self.grants.keys().all(|dst| self.timers.contains_key(dst));
        if !closed {
            tracing::error!(
                "P25, channel grant table inconsistent, free = {}, granted = {}, configured = {}; force releasing",
                self.free.len(), self.grants.len(), self.configured);
            self.release(0, true);
        }
        closed
    }
}

use std::collections::{HashMap, HashSet};

/// Dynamic unit registration and group affiliation tables.
///
/// Registration is a plain set keyed by unit ID. Each registered unit may be
/// affiliated to at most one talkgroup; re-affiliating overwrites. Both
/// tables live for the process lifetime and are only touched on the engine
/// thread.
pub struct Affiliations {
    unit_reg: HashSet<u32>,
    grp_aff: HashMap<u32, u32>,
}

impl Affiliations {
    pub fn new() -> Self {
        Affiliations {
            unit_reg: HashSet::new(),
            grp_aff: HashMap::new(),
        }
    }

    pub fn has_unit_reg(&self, src_id: u32) -> bool {
        self.unit_reg.contains(&src_id)
    }

    /// Idempotent.
    pub fn add_unit_reg(&mut self, src_id: u32) {
        self.unit_reg.insert(src_id);
    }

    /// Idempotent. Also drops any group affiliation the unit held.
    pub fn remove_unit_reg(&mut self, src_id: u32) {
        self.unit_reg.remove(&src_id);
        self.grp_aff.remove(&src_id);
    }

    pub fn has_aff(&self, src_id: u32, dst_id: u32) -> bool {
        self.grp_aff.get(&src_id) == Some(&dst_id)
    }

    pub fn aff_of(&self, src_id: u32) -> Option<u32> {
        self.grp_aff.get(&src_id).copied()
    }

    /// Affiliate a unit to a talkgroup, replacing any previous affiliation.
    pub fn set_aff(&mut self, src_id: u32, dst_id: u32) {
        self.grp_aff.insert(src_id, dst_id);
    }

    /// Drop affiliations and return the affected units so the engine can
    /// acknowledge each one. With `release_all` every affiliation goes;
    /// otherwise only those on the given talkgroup.
    pub fn clear_aff(&mut self, dst_id: u32, release_all: bool) -> Vec<u32> {
        if dst_id == 0 && !release_all {
            return vec![];
        }

        let mut affected: Vec<u32> = if release_all {
            tracing::warn!("P25, releasing all group affiliations");
            self.grp_aff.keys().copied().collect()
        } else {
            tracing::warn!("P25, releasing group affiliations, dstId = {}", dst_id);
            self.grp_aff
                .iter()
                .filter(|(_, grp)| **grp == dst_id)
                .map(|(src, _)| *src)
                .collect()
        };
        affected.sort_unstable();

        for src in &affected {
            self.grp_aff.remove(src);
        }
        affected
    }

    pub fn unit_reg_count(&self) -> usize {
        self.unit_reg.len()
    }

    pub fn aff_count(&self) -> usize {
        self.grp_aff.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_unit_reg_idempotent() {
        let mut aff = Affiliations::new();
        aff.add_unit_reg(1001);
        aff.add_unit_reg(1001);
        assert_eq!(aff.unit_reg_count(), 1);
        assert!(aff.has_unit_reg(1001));
    }

    #[test]
    fn test_remove_unit_reg_drops_affiliation() {
        let mut aff = Affiliations::new();
        aff.add_unit_reg(1001);
        aff.set_aff(1001, 5000);
        aff.remove_unit_reg(1001);
        assert!(!aff.has_unit_reg(1001));
        assert!(!aff.has_aff(1001, 5000));
        // removing again is harmless
        aff.remove_unit_reg(1001);
    }

    #[test]
    fn test_affiliation_is_unique_per_unit() {
        let mut aff = Affiliations::new();
        aff.set_aff(1001, 5000);
        aff.set_aff(1001, 5001);
        assert!(!aff.has_aff(1001, 5000));
        assert!(aff.has_aff(1001, 5001));
        assert_eq!(aff.aff_count(), 1);
    }

    #[test]
    fn test_clear_aff_by_group() {
        let mut aff = Affiliations::new();
        aff.set_aff(1001, 5000);
        aff.set_aff(1002, 5000);
        aff.set_aff(1003, 5001);
        let affected = aff.clear_aff(5000, false);
        assert_eq!(affected, vec![1001, 1002]);
        assert!(aff.has_aff(1003, 5001));
    }

    #[test]
    fn test_clear_aff_release_all() {
        let mut aff = Affiliations::new();
        aff.set_aff(1001, 5000);
        aff.set_aff(1002, 5001);
        let affected = aff.clear_aff(0, true);
        assert_eq!(affected, vec![1001, 1002]);
        assert_eq!(aff.aff_count(), 0);
    }

    #[test]
    fn test_clear_aff_zero_without_release_all_is_noop() {
        let mut aff = Affiliations::new();
        aff.set_aff(1001, 5000);
        assert!(aff.clear_aff(0, false).is_empty());
        assert_eq!(aff.aff_count(), 1);
    }
}

use ahash::AHashSet;
use bloomfilter::Bloom;
use chrono::{DateTime, Utc};

use crate::domain::ListFlags;

use super::source::ListData;

/// Set of listed identifiers.
///
/// A bloom filter sits in front of the hash set: most identifiers are not
/// listed, and the filter answers those without touching the set.
#[derive(Debug)]
pub struct MemberSet {
    /// Bloom filter for fast negative check
    bloom: Bloom<str>,
    /// Definitive set for positive verification
    members: AHashSet<String>,
}

impl MemberSet {
    /// Build a set from raw entries. Entries are trimmed; blank ones dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let members: AHashSet<String> = entries
            .into_iter()
            .map(|e| e.as_ref().trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();

        let item_count = members.len().max(100);
        let mut bloom: Bloom<str> = Bloom::new_for_fp_rate(item_count, 0.01);
        for member in &members {
            bloom.set(member.as_str());
        }

        MemberSet { bloom, members }
    }

    pub fn empty() -> Self {
        MemberSet::new(std::iter::empty::<&str>())
    }

    /// Exact, case-sensitive membership test.
    #[inline]
    pub fn contains(&self, value: &str) -> bool {
        if self.members.is_empty() {
            return false;
        }

        // Fast path: bloom filter says definitely not present
        if !self.bloom.check(value) {
            return false;
        }

        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }
}

/// Entry counts of a snapshot, for logs and the reload endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapshotCounts {
    pub customer_permissive: usize,
    pub customer_restrictive: usize,
    pub ip_restrictive: usize,
    pub device_restrictive: usize,
}

/// Immutable point-in-time copy of the screening lists.
///
/// Snapshots are never modified after construction; a reload builds a new
/// one and publishes it whole.
#[derive(Debug)]
pub struct ListSnapshot {
    pub customer_permissive: MemberSet,
    pub customer_restrictive: MemberSet,
    pub ip_restrictive: MemberSet,
    pub device_restrictive: MemberSet,

    /// Monotonic load counter; 0 for the empty placeholder
    pub generation: u64,

    /// When the data was loaded (None for the empty placeholder)
    pub loaded_at: Option<DateTime<Utc>>,
}

impl ListSnapshot {
    /// Snapshot with four empty sets, active until a load succeeds.
    pub fn empty() -> Self {
        ListSnapshot {
            customer_permissive: MemberSet::empty(),
            customer_restrictive: MemberSet::empty(),
            ip_restrictive: MemberSet::empty(),
            device_restrictive: MemberSet::empty(),
            generation: 0,
            loaded_at: None,
        }
    }

    /// Build a snapshot from loaded list data.
    pub fn from_data(data: ListData, generation: u64) -> Self {
        ListSnapshot {
            customer_permissive: MemberSet::new(data.cpf_permissive_list),
            customer_restrictive: MemberSet::new(data.cpf_restrictive_list),
            ip_restrictive: MemberSet::new(data.ip_restrictive_list),
            device_restrictive: MemberSet::new(data.device_restrictive_list),
            generation,
            loaded_at: Some(Utc::now()),
        }
    }

    /// Returns true if this snapshot came from a successful load.
    pub fn is_loaded(&self) -> bool {
        self.generation > 0
    }

    /// Test each identifier against its lists.
    pub fn check(&self, customer_id: &str, ip: &str, device_id: &str) -> ListFlags {
        ListFlags {
            customer_permissive: self.customer_permissive.contains(customer_id),
            customer_restrictive: self.customer_restrictive.contains(customer_id),
            ip_restrictive: self.ip_restrictive.contains(ip),
            device_restrictive: self.device_restrictive.contains(device_id),
        }
    }

    pub fn counts(&self) -> SnapshotCounts {
        SnapshotCounts {
            customer_permissive: self.customer_permissive.len(),
            customer_restrictive: self.customer_restrictive.len(),
            ip_restrictive: self.ip_restrictive.len(),
            device_restrictive: self.device_restrictive.len(),
        }
    }

    /// Customers present on both customer lists (a data error, reported
    /// but not resolved).
    pub fn conflicting_customers(&self) -> Vec<&str> {
        self.customer_permissive
            .iter()
            .filter(|c| self.customer_restrictive.contains(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data() -> ListData {
        ListData {
            cpf_permissive_list: vec!["11111111111".to_string()],
            cpf_restrictive_list: vec!["22222222222".to_string(), " 33333333333 ".to_string()],
            ip_restrictive_list: vec!["192.168.1.100".to_string()],
            device_restrictive_list: vec!["device-bad".to_string(), "".to_string()],
        }
    }

    #[test]
    fn test_member_set_exact_match() {
        let set = MemberSet::new(["abc", "Def"]);

        assert!(set.contains("abc"));
        assert!(set.contains("Def"));
        assert!(!set.contains("def")); // Case-sensitive
        assert!(!set.contains("ab"));
    }

    #[test]
    fn test_member_set_finds_every_member_by_slice() {
        let entries: Vec<String> = (0..5_000).map(|i| format!("{:011}", i)).collect();
        let set = MemberSet::new(&entries);

        let line = entries.join(",");
        assert!(line.split(',').all(|id| set.contains(id)));
        assert!(!set.contains("99999999999"));
    }

    #[test]
    fn test_entries_trimmed_and_blank_dropped() {
        let snapshot = ListSnapshot::from_data(data(), 1);

        assert!(snapshot.customer_restrictive.contains("33333333333"));
        assert_eq!(snapshot.device_restrictive.len(), 1);
    }

    #[test]
    fn test_check_flags() {
        let snapshot = ListSnapshot::from_data(data(), 1);

        let flags = snapshot.check("22222222222", "192.168.1.100", "device-ok");
        assert!(!flags.customer_permissive);
        assert!(flags.customer_restrictive);
        assert!(flags.ip_restrictive);
        assert!(!flags.device_restrictive);

        let flags = snapshot.check("11111111111", "10.0.0.1", "device-bad");
        assert!(flags.customer_permissive);
        assert!(!flags.customer_restrictive);
        assert!(flags.device_restrictive);
    }

    #[test]
    fn test_customer_on_both_lists_reported() {
        let mut d = data();
        d.cpf_permissive_list.push("22222222222".to_string());
        let snapshot = ListSnapshot::from_data(d, 1);

        let flags = snapshot.check("22222222222", "", "");
        assert!(flags.customer_permissive && flags.customer_restrictive);
        assert_eq!(snapshot.conflicting_customers(), vec!["22222222222"]);
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = ListSnapshot::empty();

        assert!(!snapshot.is_loaded());
        assert_eq!(snapshot.check("a", "b", "c"), ListFlags::none());
        assert_eq!(snapshot.counts(), SnapshotCounts::default());
    }
}

use std::collections::{BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in milliseconds since the UNIX epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_millis() as u64
}

/// Deadlines for keys that carry a TTL.
///
/// `deadlines` answers "when does this key expire", `by_deadline` answers
/// "which keys are due" without scanning every entry. The two are always
/// updated together.
#[derive(Debug, Default)]
pub struct ExpiryIndex {
    deadlines: HashMap<String, u64>,
    by_deadline: BTreeSet<(u64, String)>,
}

impl ExpiryIndex {
    pub fn new() -> Self {
        ExpiryIndex::default()
    }

    /// Install or overwrite the deadline (unix millis) for `key`.
    pub fn set(&mut self, key: &str, deadline: u64) {
        if let Some(old) = self.deadlines.insert(key.to_string(), deadline) {
            self.by_deadline.remove(&(old, key.to_string()));
        }
        self.by_deadline.insert((deadline, key.to_string()));
    }

    /// Drop the deadline for `key`. Returns true if it had one.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.deadlines.remove(key) {
            Some(old) => {
                self.by_deadline.remove(&(old, key.to_string()));
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self, key: &str) -> Option<u64> {
        self.deadlines.get(key).copied()
    }

    /// A key is expired once `now` reaches its deadline.
    pub fn is_due(&self, key: &str, now: u64) -> bool {
        self.deadline(key).is_some_and(|d| now >= d)
    }

    /// Keys whose deadline is at or before `now`, earliest first.
    pub fn due(&self, now: u64) -> Vec<String> {
        self.by_deadline
            .iter()
            .take_while(|(deadline, _)| *deadline <= now)
            .map(|(_, key)| key.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

/// Remaining whole seconds until `deadline`, rounded up.
pub fn ttl_seconds(deadline: u64, now: u64) -> i64 {
    let remaining = deadline.saturating_sub(now);
    remaining.div_ceil(1000) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_previous_deadline() {
        let mut idx = ExpiryIndex::new();
        idx.set("k", 1_000);
        idx.set("k", 5_000);
        assert_eq!(idx.deadline("k"), Some(5_000));
        assert!(idx.due(2_000).is_empty());
        assert_eq!(idx.due(5_000), vec!["k".to_string()]);
        assert_eq!(idx.len(), 1);
    }

    #[test]
    fn test_due_is_ordered_and_bounded() {
        let mut idx = ExpiryIndex::new();
        idx.set("late", 3_000);
        idx.set("early", 1_000);
        idx.set("mid", 2_000);
        assert_eq!(idx.due(2_500), vec!["early".to_string(), "mid".to_string()]);
    }

    #[test]
    fn test_remove_clears_both_indexes() {
        let mut idx = ExpiryIndex::new();
        idx.set("k", 1_000);
        assert!(idx.remove("k"));
        assert!(!idx.remove("k"));
        assert!(idx.due(u64::MAX).is_empty());
        assert!(idx.is_empty());
    }

    #[test]
    fn test_is_due_boundary() {
        let mut idx = ExpiryIndex::new();
        idx.set("k", 1_000);
        assert!(!idx.is_due("k", 999));
        assert!(idx.is_due("k", 1_000));
        assert!(!idx.is_due("missing", u64::MAX));
    }

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(10_000, 0), 10);
        assert_eq!(ttl_seconds(10_000, 1), 10);
        assert_eq!(ttl_seconds(10_000, 9_001), 1);
        assert_eq!(ttl_seconds(10_000, 10_000), 0);
    }
}

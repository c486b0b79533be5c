use std::collections::BTreeSet;

/// Set of unique byte strings.
///
/// Members are kept ordered so a single reply always enumerates them in a
/// stable order; callers must not rely on that order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SetValue {
    members: BTreeSet<Vec<u8>>,
}

impl SetValue {
    pub fn new() -> Self {
        SetValue::default()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if the member was not already present.
    pub fn add(&mut self, member: Vec<u8>) -> bool {
        self.members.insert(member)
    }

    pub fn remove(&mut self, member: &[u8]) -> bool {
        self.members.remove(member)
    }

    pub fn contains(&self, member: &[u8]) -> bool {
        self.members.contains(member)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.members.iter()
    }
}

impl FromIterator<Vec<u8>> for SetValue {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        SetValue {
            members: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_remove_contains() {
        let mut set = SetValue::new();
        assert!(set.add(b"x".to_vec()));
        assert!(set.add(b"y".to_vec()));
        assert!(!set.add(b"x".to_vec()));
        assert_eq!(set.len(), 2);
        assert!(set.contains(b"x"));
        assert!(set.remove(b"x"));
        assert!(!set.remove(b"x"));
        assert!(!set.contains(b"x"));
    }
}

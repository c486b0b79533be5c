use std::collections::VecDeque;

/// Ordered list of byte strings; pushes and pops are O(1) at both ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListValue {
    items: VecDeque<Vec<u8>>,
}

impl ListValue {
    pub fn new() -> Self {
        ListValue::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Prepend `values` as a block, so the first one ends up at the head.
    pub fn push_front_all<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = Vec<u8>>,
        I::IntoIter: DoubleEndedIterator,
    {
        for value in values.into_iter().rev() {
            self.items.push_front(value);
        }
        self.items.len()
    }

    pub fn push_back_all<I: IntoIterator<Item = Vec<u8>>>(&mut self, values: I) -> usize {
        self.items.extend(values);
        self.items.len()
    }

    pub fn pop_front(&mut self) -> Option<Vec<u8>> {
        self.items.pop_front()
    }

    pub fn pop_back(&mut self) -> Option<Vec<u8>> {
        self.items.pop_back()
    }

    /// Inclusive range with negative indices counting from the tail.
    /// Indices are clamped into the list; an inverted range is empty.
    pub fn range(&self, start: i64, stop: i64) -> Vec<&Vec<u8>> {
        let len = self.items.len() as i64;
        if len == 0 {
            return Vec::new();
        }
        let normalize = |idx: i64| if idx < 0 { len + idx } else { idx };
        let start = normalize(start).max(0);
        let stop = normalize(stop).min(len - 1);
        if start > stop {
            return Vec::new();
        }
        self.items
            .range(start as usize..=stop as usize)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vec<u8>> {
        self.items.iter()
    }
}

impl FromIterator<Vec<u8>> for ListValue {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        ListValue {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_of(items: &[&str]) -> ListValue {
        items.iter().map(|s| s.as_bytes().to_vec()).collect()
    }

    fn range_str(list: &ListValue, start: i64, stop: i64) -> Vec<String> {
        list.range(start, stop)
            .into_iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }

    #[test]
    fn test_push_front_all_keeps_argument_order() {
        let mut list = list_of(&["x"]);
        list.push_front_all([b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
        assert_eq!(range_str(&list, 0, -1), ["a", "b", "c", "x"]);
    }

    #[test]
    fn test_range_normalization() {
        let list = list_of(&["a", "b", "c", "d"]);
        assert_eq!(range_str(&list, 0, -1), ["a", "b", "c", "d"]);
        assert_eq!(range_str(&list, -2, -1), ["c", "d"]);
        assert_eq!(range_str(&list, 1, 100), ["b", "c", "d"]);
        assert_eq!(range_str(&list, -100, 0), ["a"]);
        assert!(range_str(&list, 3, 1).is_empty());
        assert!(range_str(&list, 10, 20).is_empty());
        assert!(range_str(&list, -1, -3).is_empty());
    }

    #[test]
    fn test_range_on_empty_list() {
        assert!(ListValue::new().range(0, -1).is_empty());
    }
}

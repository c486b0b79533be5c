/// Binary-safe string value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StrValue {
    data: Vec<u8>,
}

impl StrValue {
    pub fn new(data: Vec<u8>) -> Self {
        StrValue { data }
    }

    pub fn from_i64(n: i64) -> Self {
        StrValue {
            data: n.to_string().into_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The value as a base-10 signed 64-bit integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        std::str::from_utf8(&self.data)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
    }

    /// Add `delta` in place and return the new integer.
    pub fn incr_by(&mut self, delta: i64) -> Result<i64, IncrError> {
        let current = self.as_i64().ok_or(IncrError::NotInteger)?;
        let next = current.checked_add(delta).ok_or(IncrError::Overflow)?;
        self.data = next.to_string().into_bytes();
        Ok(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrError {
    NotInteger,
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incr_by() {
        let mut s = StrValue::new(b"41".to_vec());
        assert_eq!(s.incr_by(1), Ok(42));
        assert_eq!(s.as_bytes(), b"42");
        assert_eq!(s.incr_by(-50), Ok(-8));
        assert_eq!(s.as_bytes(), b"-8");
    }

    #[test]
    fn test_incr_rejects_non_integers() {
        let mut s = StrValue::new(b"4.5".to_vec());
        assert_eq!(s.incr_by(1), Err(IncrError::NotInteger));
        let mut s = StrValue::new(b" 1".to_vec());
        assert_eq!(s.incr_by(1), Err(IncrError::NotInteger));
        assert_eq!(s.as_bytes(), b" 1");
    }

    #[test]
    fn test_incr_overflow_leaves_value() {
        let mut s = StrValue::from_i64(i64::MAX);
        assert_eq!(s.incr_by(1), Err(IncrError::Overflow));
        assert_eq!(s.as_i64(), Some(i64::MAX));
    }
}

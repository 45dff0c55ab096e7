//! Inline-capacity string used for short property names and values.

use smallvec::SmallVec;
use std::fmt;

/// UTF-8 string stored inline for up to `N` bytes, spilling to the heap past that.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct SmallString<const N: usize> {
    bytes: SmallVec<[u8; N]>,
}

impl<const N: usize> SmallString<N> {
    /// Create an empty string.
    pub fn new() -> Self {
        Self { bytes: SmallVec::new() }
    }

    /// Append a string slice.
    pub fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ever filled from `&str`, so the bytes are valid UTF-8.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// True while the contents still fit in the inline buffer.
    pub fn is_inline(&self) -> bool {
        !self.bytes.spilled()
    }
}

impl<const N: usize> From<&str> for SmallString<N> {
    fn from(s: &str) -> Self {
        let mut out = Self::new();
        out.push_str(s);
        out
    }
}

impl<const N: usize> fmt::Debug for SmallString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl<const N: usize> fmt::Display for SmallString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_string_inline() {
        let s: SmallString<16> = "texture".into();
        assert_eq!(s.as_str(), "texture");
        assert_eq!(s.len(), 7);
        assert!(s.is_inline());
    }

    #[test]
    fn test_small_string_spill() {
        let mut s = SmallString::<4>::new();
        assert!(s.is_empty());
        s.push_str("longer than four");
        assert!(!s.is_inline());
        assert_eq!(s.to_string(), "longer than four");
    }
}

use std::fmt;

/// Map a single column letter to its zero-based position (`A` → 0 … `Z` → 25).
///
/// Anything else, including multi-letter references such as `AA`, lowercase
/// letters and the empty string, is not found.
pub fn resolve(column: &str) -> Option<usize> {
    match column.as_bytes() {
        [letter @ b'A'..=b'Z'] => Some(usize::from(letter - b'A')),
        _ => None,
    }
}

/// A user-entered column reference, normalised to a trimmed uppercase name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnSpec {
    name: String,
}

impl ColumnSpec {
    pub fn parse(raw: &str) -> Self {
        Self {
            name: raw.trim().to_uppercase(),
        }
    }

    /// The normalised name used to look values up in a row.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Alphabet position of the reference, when it is a single letter.
    pub fn position(&self) -> Option<usize> {
        resolve(&self.name)
    }
}

impl fmt::Display for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

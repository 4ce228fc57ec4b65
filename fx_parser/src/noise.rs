//! Promotional and irrelevant line filter.
//!
//! Channels mix rate tables with "hot offers", contact details and addresses
//! that often contain price-like fragments. Lines matching any keyword are
//! removed before the grammar engine sees them.

/// Case-insensitive substring filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseFilter {
    /// Lower-cased, non-empty keywords.
    keywords: Vec<String>,
}

impl NoiseFilter {
    /// Builds a filter from raw keywords; blank entries are ignored.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// True if the line contains any keyword.
    pub fn is_noise(&self, line: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let line = line.to_lowercase();
        self.keywords.iter().any(|k| line.contains(k.as_str()))
    }

    /// Number of active keywords.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    /// True when the filter lets every line through.
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

use aho_corasick::{AhoCorasick, MatchKind};

use crate::errors::DangleError;

/// Case-insensitive substring set compiled into one automaton.
#[derive(Debug, Clone)]
pub struct PatternSet {
    automaton: AhoCorasick,
    patterns: Vec<String>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, DangleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::LeftmostFirst)
            .build(&patterns)
            .map_err(|e| DangleError::Config(format!("Failed to compile pattern set: {}", e)))?;
        Ok(Self { automaton, patterns })
    }

    /// Index and text of the leftmost matching pattern.
    pub fn find(&self, haystack: &str) -> Option<(usize, &str)> {
        self.automaton
            .find(haystack)
            .map(|m| (m.pattern().as_usize(), self.patterns[m.pattern().as_usize()].as_str()))
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.automaton.is_match(haystack)
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_find() {
        let set = PatternSet::new(["No such app", "NoSuchBucket"]).unwrap();
        let (idx, pat) = set.find("<h1>no SUCH app</h1>").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(pat, "No such app");
        assert!(set.is_match("Code: NOSUCHBUCKET"));
        assert!(!set.is_match("welcome"));
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let set = PatternSet::new(Vec::<String>::new()).unwrap();
        assert!(set.is_empty());
        assert!(set.find("anything").is_none());
    }

    #[test]
    fn test_blank_patterns_dropped() {
        let set = PatternSet::new(["  ", "verify"]).unwrap();
        assert_eq!(set.len(), 1);
    }
}

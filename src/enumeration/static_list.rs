use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::source::SubdomainSource;
use crate::errors::DangleError;

/// Serves a fixed list of names for any root.
#[derive(Debug, Default)]
pub struct StaticSource {
    names: Vec<String>,
    /// Number of leading calls that fail with a retryable error.
    failures: usize,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// One name per line; blank lines and `#` comments are skipped.
    pub async fn from_file(path: &Path) -> Result<Self, DangleError> {
        if !path.exists() {
            return Err(DangleError::Config(format!("Subdomain list not found: {}", path.display())));
        }
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#')),
        ))
    }

    /// The first `n` calls fail as if the tool had crashed.
    pub fn failing_first(mut self, n: usize) -> Self {
        self.failures = n;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SubdomainSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn enumerate(&self, root: &str) -> Result<Vec<String>, DangleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(DangleError::Tool(format!("static source failure {} for {}", call + 1, root)));
        }
        Ok(self.names.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_from_file_skips_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# exported list\nwww.example.com\n\n  shop.example.com  ").unwrap();

        let source = StaticSource::from_file(file.path()).await.unwrap();
        let names = source.enumerate("example.com").await.unwrap();
        assert_eq!(names, vec!["www.example.com", "shop.example.com"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_config_error() {
        let err = StaticSource::from_file(Path::new("/nonexistent/subs.txt")).await.unwrap_err();
        assert!(matches!(err, DangleError::Config(_)));
    }

    #[tokio::test]
    async fn test_failing_first_then_recovers() {
        let source = StaticSource::new(["a.example.com"]).failing_first(1);
        assert!(source.enumerate("example.com").await.is_err());
        assert_eq!(source.enumerate("example.com").await.unwrap().len(), 1);
        assert_eq!(source.call_count(), 2);
    }
}

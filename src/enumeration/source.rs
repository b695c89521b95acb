use async_trait::async_trait;

use crate::errors::DangleError;

/// Discovers subdomains of a root domain.
///
/// Returned names are raw; the pipeline normalizes, deduplicates and scopes
/// them.
#[async_trait]
pub trait SubdomainSource: Send + Sync {
    fn name(&self) -> &str;

    async fn enumerate(&self, root: &str) -> Result<Vec<String>, DangleError>;
}

use async_trait::async_trait;
use std::collections::HashMap;

use crate::errors::DangleError;
use crate::models::ProbeOutcome;

/// Bulk HTTP probing. Per-host transport failures are reported as
/// `ProbeOutcome::Failed`; `Err` means the whole call failed.
#[async_trait]
pub trait HttpProber: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self, hosts: &[String]) -> Result<HashMap<String, ProbeOutcome>, DangleError>;
}

pub mod mock;
pub mod virsh;

use crate::error::CommandError;

/// Source of raw `virsh` text. Parsing happens in the callers.
#[allow(async_fn_in_trait)] // trait is internal-only
pub trait Backend {
    /// Output of `virsh domifaddr <domain>`.
    async fn domifaddr(&self, domain: &str) -> Result<String, CommandError>;
    /// Output of `virsh list --state-running`.
    async fn list_running(&self) -> Result<String, CommandError>;
}

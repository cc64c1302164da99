pub mod clipboard;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

/// Acts on a result the user picked. Receives the result's name exactly as
/// the search provider produced it.
///
/// Anything long-running (pasting, clearing the clipboard later) should be
/// started and detached; the launcher waits for this call before it closes.
#[async_trait]
pub trait ActivationHandler: Send + Sync {
    async fn activate(&self, entry: &str) -> Result<()>;
}

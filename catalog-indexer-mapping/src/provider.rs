//! Provider capability contract.

use async_trait::async_trait;
use catalog_indexer_shared::{Document, StoreContext};

/// Error type providers return; any error can be propagated with `?`.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// A stateless unit that enriches documents of one entity type.
///
/// Providers run concurrently with their siblings on a copy of the document
/// and must not depend on each other's output or on shared mutable state.
/// They return the fields they contribute; the resolver merges those over
/// the original document in priority order.
#[async_trait]
pub trait DocumentProvider: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Class-level priority hint, used when the descriptor sets none.
    fn priority(&self) -> Option<i32> {
        None
    }

    /// Produce the fields this provider contributes to `document`.
    async fn map(
        &self,
        document: Document,
        context: &StoreContext,
    ) -> Result<Document, ProviderError>;

    /// Rewrite the fully merged document.
    ///
    /// Only called for providers whose descriptor declares
    /// [`Capability::Transform`](crate::Capability::Transform).
    fn transform(
        &self,
        document: Document,
        _context: &StoreContext,
    ) -> Result<Document, ProviderError> {
        Ok(document)
    }
}

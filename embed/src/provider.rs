use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Whether texts are search queries or documents to be indexed.
///
/// Some providers encode the two differently. Providers without the
/// distinction ignore it. [`BatchEmbedder`](crate::BatchEmbedder) only sends
/// `Query` when its query hint is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    Query,
    Document,
}

/// Provider performs the request/response exchange with one external
/// embedding service.
///
/// `embed_batch` is called with at most [`Provider::max_batch`] texts and
/// must return exactly one vector per text, in input order. Chunking,
/// ordering across chunks and retries are handled by
/// [`BatchEmbedder`](crate::BatchEmbedder).
///
/// Implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// Short provider name used in errors and logs (e.g. "openai").
    fn name(&self) -> &str;

    /// Maximum number of texts accepted by a single `embed_batch` call.
    fn max_batch(&self) -> usize;

    /// Dimensionality of the vectors this provider is configured to produce.
    /// 0 disables the per-vector size check.
    fn dimension(&self) -> usize;

    /// Embed one provider-sized batch of texts.
    async fn embed_batch(
        &self,
        cancel: &CancellationToken,
        texts: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>>;
}

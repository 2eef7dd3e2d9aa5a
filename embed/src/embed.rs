use tokio_util::sync::CancellationToken;

use crate::error::Result;

/// Embedder converts text into dense float32 vectors.
///
/// This is the provider-agnostic contract downstream components depend on.
/// Results always line up with the input: `result[i]` is the vector for
/// `texts[i]`, however the implementation splits the work.
///
/// Implementations must be safe for concurrent use (Send + Sync).
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Return the embedding vector for a single search query.
    ///
    /// `text` may be empty.
    async fn embed_query(&self, cancel: &CancellationToken, text: &str) -> Result<Vec<f32>>;

    /// Return embedding vectors for multiple documents, one per text, in order.
    ///
    /// An empty input yields an empty result without contacting the provider.
    async fn embed_documents(
        &self,
        cancel: &CancellationToken,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>>;

    /// Return the dimensionality of the output vectors, or 0 when the
    /// configured model's size is not known up front.
    fn dimension(&self) -> usize;
}

//! Chunked, order-preserving embedding over a [`Provider`].

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_CONCURRENCY;
use crate::embed::Embedder;
use crate::error::{EmbedError, Result};
use crate::provider::{InputKind, Provider};
use crate::retry::{self, RetryPolicy};

/// Embedder that splits input into provider-sized chunks, dispatches them
/// concurrently and reassembles the results in input order.
///
/// A call fails as a whole on the first chunk failure; completed chunks are
/// discarded and no further chunk requests are started. Holds no per-call
/// state, so clones and concurrent calls share nothing but the provider.
#[derive(Clone)]
pub struct BatchEmbedder {
    provider: Arc<dyn Provider>,
    batch_size: usize,
    concurrency: usize,
    retry: RetryPolicy,
    query_hint: bool,
}

impl BatchEmbedder {
    /// Creates an embedder with the provider's batch limit, the default
    /// concurrency and no retries.
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            batch_size: provider.max_batch().max(1),
            provider,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::none(),
            query_hint: false,
        }
    }

    /// Creates a builder for more configuration options.
    pub fn builder(provider: Arc<dyn Provider>) -> BatchEmbedderBuilder {
        BatchEmbedderBuilder {
            provider,
            batch_size: None,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryPolicy::none(),
            query_hint: false,
        }
    }

    /// Returns the bound provider.
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    /// Returns the number of texts sent per request.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_all(
        &self,
        cancel: &CancellationToken,
        texts: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        if cancel.is_cancelled() {
            return Err(EmbedError::Cancelled);
        }

        let chunks: Vec<&[&str]> = texts.chunks(self.batch_size).collect();
        let mut slots: Vec<Option<Vec<Vec<f32>>>> = vec![None; chunks.len()];

        // Chunks are started lazily, so returning early stops new requests
        // and drops the in-flight ones.
        let chunk_refs = &chunks;
        let mut pending = stream::iter(0..chunks.len())
            .map(move |index| async move {
                let chunk = chunk_refs[index];
                (index, self.embed_chunk(cancel, index, chunk, kind).await)
            })
            .buffer_unordered(self.concurrency);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(EmbedError::Cancelled),
                next = pending.next() => next,
            };
            let Some((index, result)) = next else {
                break;
            };
            match result {
                Ok(vecs) => slots[index] = Some(vecs),
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        chunk = index,
                        error = %e,
                        "embed: chunk failed"
                    );
                    return Err(e);
                }
            }
        }

        let name = self.provider.name();
        let mut out = Vec::with_capacity(texts.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let vecs = slot.ok_or_else(|| {
                EmbedError::protocol(name, format!("chunk {index} produced no result"))
            })?;
            out.extend(vecs);
        }

        // Without a known dimension, vectors must at least agree with each other.
        if let Some(first) = out.first() {
            let dim = first.len();
            if let Some(bad) = out.iter().find(|v| v.len() != dim) {
                return Err(EmbedError::protocol(
                    name,
                    format!("mixed embedding dimensions {dim} and {}", bad.len()),
                ));
            }
        }

        debug!(
            provider = self.provider.name(),
            texts = texts.len(),
            "embed: batch complete"
        );
        Ok(out)
    }

    async fn embed_chunk(
        &self,
        cancel: &CancellationToken,
        index: usize,
        chunk: &[&str],
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(EmbedError::Cancelled);
            }
            debug!(
                provider = self.provider.name(),
                chunk = index,
                size = chunk.len(),
                attempt,
                "embed: dispatching chunk"
            );
            match self.provider.embed_batch(cancel, chunk, kind).await {
                Ok(vecs) => return self.check_chunk(chunk.len(), vecs),
                Err(e) if attempt < self.retry.max_retries && e.is_retryable() => {
                    // A Retry-After beyond max_backoff is not worth waiting for.
                    let Some(delay) = self.retry.backoff(attempt, e.retry_after()) else {
                        return Err(e);
                    };
                    warn!(
                        provider = self.provider.name(),
                        chunk = index,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "embed: retrying chunk"
                    );
                    retry::sleep(cancel, delay).await?;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn check_chunk(&self, expected: usize, vecs: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
        let name = self.provider.name();
        if vecs.len() != expected {
            return Err(EmbedError::protocol(
                name,
                format!("got {} embeddings for {expected} texts", vecs.len()),
            ));
        }
        let dim = self.provider.dimension();
        if dim > 0 {
            if let Some(bad) = vecs.iter().find(|v| v.len() != dim) {
                return Err(EmbedError::protocol(
                    name,
                    format!(
                        "embedding dimension {} does not match expected {dim}",
                        bad.len()
                    ),
                ));
            }
        }
        Ok(vecs)
    }
}

#[async_trait::async_trait]
impl Embedder for BatchEmbedder {
    /// Same request as `embed_documents(&[text])` unless the query hint is
    /// enabled, in which case providers that support it encode `text` as a
    /// search query.
    async fn embed_query(&self, cancel: &CancellationToken, text: &str) -> Result<Vec<f32>> {
        let kind = if self.query_hint {
            InputKind::Query
        } else {
            InputKind::Document
        };
        let mut vecs = self.embed_all(cancel, &[text], kind).await?;
        vecs.pop()
            .ok_or_else(|| EmbedError::protocol(self.provider.name(), "empty embedding response"))
    }

    async fn embed_documents(
        &self,
        cancel: &CancellationToken,
        texts: &[&str],
    ) -> Result<Vec<Vec<f32>>> {
        self.embed_all(cancel, texts, InputKind::Document).await
    }

    fn dimension(&self) -> usize {
        self.provider.dimension()
    }
}

/// Builder for [`BatchEmbedder`].
pub struct BatchEmbedderBuilder {
    provider: Arc<dyn Provider>,
    batch_size: Option<usize>,
    concurrency: usize,
    retry: RetryPolicy,
    query_hint: bool,
}

impl BatchEmbedderBuilder {
    /// Sends at most `size` texts per request. Must not exceed the
    /// provider's batch limit.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Sets how many chunk requests may be in flight per call.
    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    /// Sets the retry policy for transient chunk failures.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Sends `embed_query` texts as search queries to providers that encode
    /// queries differently (Voyage, Cohere). Off by default, which keeps
    /// `embed_query(t)` identical to `embed_documents(&[t])[0]`.
    pub fn query_hint(mut self, enabled: bool) -> Self {
        self.query_hint = enabled;
        self
    }

    /// Builds the embedder.
    pub fn build(self) -> Result<BatchEmbedder> {
        let limit = self.provider.max_batch();
        if limit == 0 {
            return Err(EmbedError::config(format!(
                "{}: provider batch limit must be positive",
                self.provider.name()
            )));
        }
        let batch_size = self.batch_size.unwrap_or(limit);
        if batch_size == 0 || batch_size > limit {
            return Err(EmbedError::config(format!(
                "{}: batch_size must be in 1..={limit}, got {batch_size}",
                self.provider.name()
            )));
        }
        if self.concurrency == 0 {
            return Err(EmbedError::config("concurrency must be at least 1"));
        }

        Ok(BatchEmbedder {
            provider: self.provider,
            batch_size,
            concurrency: self.concurrency,
            retry: self.retry,
            query_hint: self.query_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    const DIM: usize = 3;

    /// Deterministic vector for a text: [len, byte sum, first byte].
    fn vector_for(text: &str) -> Vec<f32> {
        let sum: u32 = text.bytes().map(u32::from).sum();
        let first = text.bytes().next().map(f32::from).unwrap_or(0.0);
        vec![text.len() as f32, sum as f32, first]
    }

    /// In-process provider that records every request.
    #[derive(Default)]
    struct FakeProvider {
        max_batch: usize,
        /// Reported dimension; 0 means unknown.
        dim: usize,
        calls: Mutex<Vec<(Vec<String>, InputKind)>>,
        started: AtomicUsize,
        /// Per-text response delay.
        delays: HashMap<String, Duration>,
        /// Texts that make their request fail.
        fail_on: Option<String>,
        /// Number of leading requests that fail with a rate limit.
        rate_limited: AtomicUsize,
        /// Retry-After carried by the rate limit errors.
        retry_after: Option<Duration>,
        /// Drop the last vector of every response.
        short_response: bool,
        /// Respond with vectors of this length instead of DIM.
        wrong_dim: Option<usize>,
        /// Pad the vector of every text starting with "long" by one element.
        ragged: bool,
    }

    impl FakeProvider {
        fn new(max_batch: usize) -> Self {
            Self {
                max_batch,
                dim: DIM,
                ..Default::default()
            }
        }

        fn sizes(&self) -> Vec<usize> {
            self.calls.lock().unwrap().iter().map(|(t, _)| t.len()).collect()
        }

        fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            "fake"
        }

        fn max_batch(&self) -> usize {
            self.max_batch
        }

        fn dimension(&self) -> usize {
            self.dim
        }

        async fn embed_batch(
            &self,
            cancel: &CancellationToken,
            texts: &[&str],
            kind: InputKind,
        ) -> Result<Vec<Vec<f32>>> {
            self.started.fetch_add(1, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((texts.iter().map(|t| t.to_string()).collect(), kind));

            let delay = texts
                .iter()
                .filter_map(|t| self.delays.get(*t))
                .max()
                .copied()
                .unwrap_or_default();
            tokio::select! {
                _ = cancel.cancelled() => return Err(EmbedError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }

            if self
                .rate_limited
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(EmbedError::RateLimit {
                    provider: "fake".into(),
                    message: "too many requests".into(),
                    retry_after: self.retry_after,
                });
            }
            if let Some(bad) = &self.fail_on {
                if texts.contains(&bad.as_str()) {
                    return Err(EmbedError::Auth {
                        provider: "fake".into(),
                        message: "invalid api key".into(),
                    });
                }
            }

            let mut vecs: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| match self.wrong_dim {
                    Some(n) => vec![0.0; n],
                    None if self.ragged && t.starts_with("long") => {
                        let mut v = vector_for(t);
                        v.push(0.0);
                        v
                    }
                    None => vector_for(t),
                })
                .collect();
            if self.short_response {
                vecs.pop();
            }
            Ok(vecs)
        }
    }

    fn embedder(provider: &Arc<FakeProvider>) -> BatchEmbedder {
        BatchEmbedder::new(provider.clone())
    }

    const SAMPLE: [&str; 3] = ["Hello world", "The world is ending", "good bye"];

    #[tokio::test]
    async fn splits_into_ordered_chunks() {
        let provider = Arc::new(FakeProvider::new(2));
        let vecs = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &SAMPLE)
            .await
            .unwrap();

        assert_eq!(provider.sizes(), vec![2, 1]);
        assert_eq!(vecs.len(), 3);
        for (text, v) in SAMPLE.iter().zip(&vecs) {
            assert_eq!(v, &vector_for(text));
        }
    }

    #[tokio::test]
    async fn order_is_independent_of_completion_order() {
        let mut fake = FakeProvider::new(2);
        // The first chunk finishes last.
        fake.delays.insert("Hello world".into(), Duration::from_millis(80));
        let provider = Arc::new(fake);

        let vecs = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &SAMPLE)
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 2);
        let expected: Vec<Vec<f32>> = SAMPLE.iter().map(|t| vector_for(t)).collect();
        assert_eq!(vecs, expected);
    }

    #[tokio::test]
    async fn request_count_is_ceil_n_over_b() {
        for (n, b) in [(1usize, 1usize), (5, 2), (6, 3), (7, 10), (10, 10), (11, 10)] {
            let provider = Arc::new(FakeProvider::new(b));
            let texts: Vec<String> = (0..n).map(|i| format!("text-{i}")).collect();
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

            let vecs = embedder(&provider)
                .embed_documents(&CancellationToken::new(), &refs)
                .await
                .unwrap();

            assert_eq!(provider.started(), n.div_ceil(b), "n={n} b={b}");
            assert!(provider.sizes().iter().all(|&s| s <= b));
            assert_eq!(vecs.len(), n);
            for (text, v) in refs.iter().zip(&vecs) {
                assert_eq!(v, &vector_for(text));
            }
        }
    }

    #[tokio::test]
    async fn empty_input_makes_no_requests() {
        let provider = Arc::new(FakeProvider::new(2));
        let vecs = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &[])
            .await
            .unwrap();
        assert!(vecs.is_empty());
        assert_eq!(provider.started(), 0);
    }

    #[tokio::test]
    async fn query_matches_single_document() {
        let provider = Arc::new(FakeProvider::new(4));
        let e = embedder(&provider);
        let cancel = CancellationToken::new();
        for text in ["Hello world", ""] {
            let q = e.embed_query(&cancel, text).await.unwrap();
            let d = e.embed_documents(&cancel, &[text]).await.unwrap();
            assert_eq!(d.len(), 1);
            assert_eq!(q, d[0]);
        }

        // Both paths send the same request.
        let kinds: Vec<InputKind> =
            provider.calls.lock().unwrap().iter().map(|(_, k)| *k).collect();
        assert_eq!(kinds, vec![InputKind::Document; 4]);
    }

    #[tokio::test]
    async fn query_hint_marks_query_requests() {
        let provider = Arc::new(FakeProvider::new(4));
        let e = BatchEmbedder::builder(provider.clone()).query_hint(true).build().unwrap();
        let cancel = CancellationToken::new();

        e.embed_query(&cancel, "Hello world").await.unwrap();
        e.embed_documents(&cancel, &["Hello world"]).await.unwrap();

        let kinds: Vec<InputKind> =
            provider.calls.lock().unwrap().iter().map(|(_, k)| *k).collect();
        assert_eq!(kinds, vec![InputKind::Query, InputKind::Document]);
    }

    #[tokio::test]
    async fn chunk_failure_fails_whole_call() {
        let mut fake = FakeProvider::new(1);
        fake.fail_on = Some("good bye".into());
        let provider = Arc::new(fake);

        let err = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &SAMPLE)
            .await
            .unwrap_err();
        assert!(err.is_auth(), "got {err:?}");
    }

    #[tokio::test]
    async fn failure_stops_dispatching_new_chunks() {
        let mut fake = FakeProvider::new(1);
        fake.fail_on = Some("t0".into());
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone()).concurrency(1).build().unwrap();

        let texts: Vec<String> = (0..5).map(|i| format!("t{i}")).collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        assert!(e.embed_documents(&CancellationToken::new(), &refs).await.is_err());
        assert_eq!(provider.started(), 1);
    }

    #[tokio::test]
    async fn short_response_is_protocol_error() {
        let mut fake = FakeProvider::new(2);
        fake.short_response = true;
        let provider = Arc::new(fake);

        let err = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &SAMPLE)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Protocol { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn dimension_mismatch_is_protocol_error() {
        let mut fake = FakeProvider::new(2);
        fake.wrong_dim = Some(DIM + 1);
        let provider = Arc::new(fake);

        let err = embedder(&provider)
            .embed_query(&CancellationToken::new(), "Hello world")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("dimension"), "{err}");
    }

    #[tokio::test]
    async fn unknown_dimension_accepts_any_uniform_length() {
        let mut fake = FakeProvider::new(2);
        fake.dim = 0;
        fake.wrong_dim = Some(7);
        let provider = Arc::new(fake);

        let vecs = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &SAMPLE)
            .await
            .unwrap();
        assert!(vecs.iter().all(|v| v.len() == 7));
    }

    #[tokio::test]
    async fn unknown_dimension_rejects_mixed_lengths() {
        let mut fake = FakeProvider::new(1);
        fake.dim = 0;
        fake.ragged = true;
        let provider = Arc::new(fake);

        let err = embedder(&provider)
            .embed_documents(&CancellationToken::new(), &["short", "long text"])
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::Protocol { .. }), "got {err:?}");
        assert!(err.to_string().contains("mixed embedding dimensions"), "{err}");
    }

    #[tokio::test]
    async fn cancelled_before_call_makes_no_requests() {
        let provider = Arc::new(FakeProvider::new(2));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = embedder(&provider).embed_documents(&cancel, &SAMPLE).await.unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(provider.started(), 0);
    }

    #[tokio::test]
    async fn cancel_during_call_fails_promptly() {
        let mut fake = FakeProvider::new(1);
        for t in SAMPLE {
            fake.delays.insert(t.into(), Duration::from_secs(30));
        }
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone()).concurrency(1).build().unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let started = std::time::Instant::now();
        let err = e.embed_documents(&cancel, &SAMPLE).await.unwrap_err();
        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(provider.started(), 1);
    }

    #[tokio::test]
    async fn cancel_with_concurrent_chunks_starts_nothing_new() {
        let mut fake = FakeProvider::new(1);
        let texts: Vec<String> = (0..6).map(|i| format!("slow-{i}")).collect();
        for t in &texts {
            fake.delays.insert(t.clone(), Duration::from_secs(30));
        }
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone()).concurrency(3).build().unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let started = std::time::Instant::now();
        let err = e.embed_documents(&cancel, &refs).await.unwrap_err();
        assert!(err.is_cancelled(), "got {err:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(provider.started(), 3);

        // Dropped chunks never wake up to start the remaining ones.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(provider.started(), 3);
    }

    #[tokio::test]
    async fn no_retry_by_default() {
        let fake = FakeProvider::new(2);
        fake.rate_limited.store(1, Ordering::SeqCst);
        let provider = Arc::new(fake);

        let err = embedder(&provider)
            .embed_query(&CancellationToken::new(), "x")
            .await
            .unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(provider.started(), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_when_enabled() {
        let fake = FakeProvider::new(2);
        fake.rate_limited.store(2, Ordering::SeqCst);
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone())
            .retry(
                RetryPolicy::default()
                    .with_max_retries(3)
                    .with_backoff(Duration::from_millis(1), Duration::from_millis(5)),
            )
            .build()
            .unwrap();

        let v = e.embed_query(&CancellationToken::new(), "x").await.unwrap();
        assert_eq!(v, vector_for("x"));
        assert_eq!(provider.started(), 3);
    }

    #[tokio::test]
    async fn retries_give_up_after_limit() {
        let fake = FakeProvider::new(2);
        fake.rate_limited.store(10, Ordering::SeqCst);
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone())
            .retry(
                RetryPolicy::default()
                    .with_max_retries(2)
                    .with_backoff(Duration::from_millis(1), Duration::from_millis(1)),
            )
            .build()
            .unwrap();

        let err = e.embed_query(&CancellationToken::new(), "x").await.unwrap_err();
        assert!(err.is_rate_limit());
        assert_eq!(provider.started(), 3);
    }

    #[tokio::test]
    async fn retry_after_beyond_max_backoff_fails_immediately() {
        let mut fake = FakeProvider::new(2);
        fake.retry_after = Some(Duration::from_secs(3600));
        fake.rate_limited.store(1, Ordering::SeqCst);
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone())
            .retry(
                RetryPolicy::default()
                    .with_max_retries(3)
                    .with_backoff(Duration::from_millis(1), Duration::from_secs(1)),
            )
            .build()
            .unwrap();

        let started = std::time::Instant::now();
        let err = e.embed_query(&CancellationToken::new(), "x").await.unwrap_err();
        assert!(err.is_rate_limit(), "got {err:?}");
        assert_eq!(err.retry_after(), Some(Duration::from_secs(3600)));
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(provider.started(), 1);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let mut fake = FakeProvider::new(2);
        fake.fail_on = Some("x".into());
        let provider = Arc::new(fake);
        let e = BatchEmbedder::builder(provider.clone())
            .retry(RetryPolicy::default().with_max_retries(5))
            .build()
            .unwrap();

        let err = e.embed_query(&CancellationToken::new(), "x").await.unwrap_err();
        assert!(err.is_auth());
        assert_eq!(provider.started(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_do_not_interfere() {
        let mut fake = FakeProvider::new(2);
        fake.delays.insert("a0".into(), Duration::from_millis(30));
        fake.delays.insert("b3".into(), Duration::from_millis(10));
        let e = embedder(&Arc::new(fake));

        let mut handles = Vec::new();
        for prefix in ["a", "b", "c", "d"] {
            let e = e.clone();
            handles.push(tokio::spawn(async move {
                let texts: Vec<String> = (0..5).map(|i| format!("{prefix}{i}")).collect();
                let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
                let vecs = e.embed_documents(&CancellationToken::new(), &refs).await.unwrap();
                let expected: Vec<Vec<f32>> = refs.iter().map(|t| vector_for(t)).collect();
                assert_eq!(vecs, expected);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
    }

    #[test]
    fn builder_validates() {
        let provider: Arc<dyn Provider> = Arc::new(FakeProvider::new(4));
        assert!(BatchEmbedder::builder(provider.clone()).batch_size(0).build().is_err());
        assert!(BatchEmbedder::builder(provider.clone()).batch_size(5).build().is_err());
        assert!(BatchEmbedder::builder(provider.clone()).concurrency(0).build().is_err());
        let e = BatchEmbedder::builder(provider.clone()).batch_size(3).build().unwrap();
        assert_eq!(e.batch_size(), 3);
        assert_eq!(BatchEmbedder::new(provider).batch_size(), 4);

        let err = BatchEmbedder::builder(Arc::new(FakeProvider::new(0))).build().err().unwrap();
        assert!(matches!(err, EmbedError::Config(_)));
    }
}

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::batch::BatchEmbedder;
use crate::cohere::Cohere;
use crate::dashscope::DashScope;
use crate::error::{EmbedError, Result};
use crate::openai::OpenAI;
use crate::provider::Provider;
use crate::retry::RetryPolicy;
use crate::voyage::Voyage;

/// Default per-request timeout applied to the HTTP client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default number of chunk requests kept in flight per call.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Builder-style configuration for embedder implementations.
///
/// Zero or empty fields mean "use the provider default".
///
/// `dimension` asks the provider for a specific output size and is sent with
/// every request. `expected_dimension` is only checked against responses,
/// for models the crate has no size table for (e.g. a model served by an
/// OpenAI-compatible endpoint that rejects the `dimensions` parameter).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbedConfig {
    pub model: String,
    pub dimension: usize,
    pub expected_dimension: usize,
    pub base_url: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
    /// Exact timeout from [`EmbedConfig::with_timeout`]; takes precedence
    /// over `timeout_secs`.
    #[serde(skip)]
    pub timeout: Option<Duration>,
    pub concurrency: usize,
    pub max_retries: u32,
    pub query_hint: bool,
}

impl EmbedConfig {
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_dimension(mut self, dim: usize) -> Self {
        self.dimension = dim;
        self
    }

    pub fn with_expected_dimension(mut self, dim: usize) -> Self {
        self.expected_dimension = dim;
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Send `embed_query` texts as search queries where the provider
    /// distinguishes them.
    pub fn with_query_hint(mut self, enabled: bool) -> Self {
        self.query_hint = enabled;
        self
    }

    /// Fill defaults and validate against a provider's limits.
    pub(crate) fn resolve(&self, api_key: &str, defaults: &ProviderDefaults) -> Result<Settings> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(EmbedError::config(format!(
                "{}: api_key must be non-empty",
                defaults.name
            )));
        }

        let batch_size = match self.batch_size {
            0 => defaults.max_batch,
            n if n > defaults.max_batch => {
                return Err(EmbedError::config(format!(
                    "{}: batch_size {n} exceeds provider limit {}",
                    defaults.name, defaults.max_batch
                )));
            }
            n => n,
        };

        let model = if self.model.is_empty() {
            defaults.model.to_string()
        } else {
            self.model.clone()
        };

        let requested = (self.dimension != 0).then_some(self.dimension);
        let expected = (self.expected_dimension != 0).then_some(self.expected_dimension);
        if let (Some(r), Some(e)) = (requested, expected) {
            if r != e {
                return Err(EmbedError::config(format!(
                    "{}: dimension {r} conflicts with expected_dimension {e}",
                    defaults.name
                )));
            }
        }
        // 0 leaves the size unknown; vectors then only need to agree per call.
        let dimension = requested
            .or(expected)
            .or_else(|| (defaults.dimension_for)(&model))
            .unwrap_or(0);

        let base_url = if self.base_url.is_empty() {
            defaults.base_url.to_string()
        } else {
            self.base_url.trim_end_matches('/').to_string()
        };

        let timeout = match (self.timeout, self.timeout_secs) {
            (Some(t), _) => t,
            (None, 0) => DEFAULT_TIMEOUT,
            (None, secs) => Duration::from_secs(secs),
        };
        if timeout.is_zero() {
            return Err(EmbedError::config(format!(
                "{}: timeout must be positive",
                defaults.name
            )));
        }

        Ok(Settings {
            api_key: api_key.to_string(),
            model,
            dimension,
            requested_dimension: requested,
            base_url,
            batch_size,
            timeout,
        })
    }
}

/// Static facts about one provider.
pub(crate) struct ProviderDefaults {
    pub name: &'static str,
    pub base_url: &'static str,
    pub model: &'static str,
    pub max_batch: usize,
    /// Native output size of a model, `None` when unknown.
    pub dimension_for: fn(&str) -> Option<usize>,
}

/// Validated, immutable provider settings.
#[derive(Clone)]
pub(crate) struct Settings {
    pub api_key: String,
    pub model: String,
    /// Size every vector must have; 0 when unknown.
    pub dimension: usize,
    /// Set only when the caller asked for a specific output size.
    pub requested_dimension: Option<usize>,
    pub base_url: String,
    pub batch_size: usize,
    pub timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &"***")
            .field("model", &self.model)
            .field("dimension", &self.dimension)
            .field("base_url", &self.base_url)
            .field("batch_size", &self.batch_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Supported embedding providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAI,
    DashScope,
    Voyage,
    Cohere,
}

/// Complete provider selection, as loaded from YAML or JSON.
///
/// ```yaml
/// provider: voyage
/// api_key: pa-...
/// model: voyage-3.5
/// batch_size: 128
/// ```
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: String,
    #[serde(flatten)]
    pub options: EmbedConfig,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &"***")
            .field("options", &self.options)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(provider: ProviderKind, api_key: &str) -> Self {
        Self {
            provider,
            api_key: api_key.to_string(),
            options: EmbedConfig::default(),
        }
    }

    pub fn with_options(mut self, options: EmbedConfig) -> Self {
        self.options = options;
        self
    }

    /// Construct the provider backend. Performs no network I/O.
    pub fn new_provider(&self) -> Result<Arc<dyn Provider>> {
        let cfg = self.options.clone();
        Ok(match self.provider {
            ProviderKind::OpenAI => Arc::new(OpenAI::with_config(&self.api_key, cfg)?),
            ProviderKind::DashScope => Arc::new(DashScope::with_config(&self.api_key, cfg)?),
            ProviderKind::Voyage => Arc::new(Voyage::with_config(&self.api_key, cfg)?),
            ProviderKind::Cohere => Arc::new(Cohere::with_config(&self.api_key, cfg)?),
        })
    }

    /// Construct an embedder bound to the configured provider.
    pub fn build(&self) -> Result<BatchEmbedder> {
        let concurrency = if self.options.concurrency == 0 {
            DEFAULT_CONCURRENCY
        } else {
            self.options.concurrency
        };
        BatchEmbedder::builder(self.new_provider()?)
            .concurrency(concurrency)
            .retry(RetryPolicy::default().with_max_retries(self.options.max_retries))
            .query_hint(self.options.query_hint)
            .build()
    }
}

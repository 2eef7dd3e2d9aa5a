use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::config::{EmbedConfig, ProviderDefaults, Settings};
use crate::error::Result;
use crate::provider::{InputKind, Provider};

/// OpenAI embedding models.
pub const MODEL_OPENAI_3_SMALL: &str = "text-embedding-3-small";
pub const MODEL_OPENAI_3_LARGE: &str = "text-embedding-3-large";
pub const MODEL_OPENAI_ADA_002: &str = "text-embedding-ada-002";

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENAI_MAX_BATCH: usize = 2048;

/// Native output size of the known models. Compatible servers host other
/// models, whose size is learned from the first response.
fn openai_dimension(model: &str) -> Option<usize> {
    match model {
        MODEL_OPENAI_3_LARGE => Some(3072),
        MODEL_OPENAI_3_SMALL | MODEL_OPENAI_ADA_002 => Some(1536),
        _ => None,
    }
}

const DEFAULTS: ProviderDefaults = ProviderDefaults {
    name: "openai",
    base_url: OPENAI_BASE_URL,
    model: MODEL_OPENAI_3_SMALL,
    max_batch: OPENAI_MAX_BATCH,
    dimension_for: openai_dimension,
};

/// OpenAI embedder using the OpenAI embeddings API.
///
/// Also works with any OpenAI-compatible provider (e.g. SiliconFlow)
/// via `with_config` and `EmbedConfig::with_base_url`.
pub struct OpenAI {
    client: Client,
    settings: Settings,
}

impl OpenAI {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_config(api_key, EmbedConfig::default())
    }

    pub fn with_config(api_key: &str, cfg: EmbedConfig) -> Result<Self> {
        let settings = cfg.resolve(api_key, &DEFAULTS)?;
        Ok(Self {
            client: crate::http::build_client(settings.timeout)?,
            settings,
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[async_trait::async_trait]
impl Provider for OpenAI {
    fn name(&self) -> &str {
        DEFAULTS.name
    }

    fn max_batch(&self) -> usize {
        self.settings.batch_size
    }

    fn dimension(&self) -> usize {
        self.settings.dimension
    }

    async fn embed_batch(
        &self,
        cancel: &CancellationToken,
        texts: &[&str],
        _kind: InputKind,
    ) -> Result<Vec<Vec<f32>>> {
        crate::openai_compat::call_embedding_api(
            &self.client,
            DEFAULTS.name,
            &self.settings,
            texts,
            cancel,
        )
        .await
    }
}

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::config::{EmbedConfig, ProviderDefaults, Settings};
use crate::error::Result;
use crate::provider::{InputKind, Provider};

/// DashScope embedding models.
pub const MODEL_DASHSCOPE_V4: &str = "text-embedding-v4";
pub const MODEL_DASHSCOPE_V3: &str = "text-embedding-v3";
pub const MODEL_DASHSCOPE_V2: &str = "text-embedding-v2";
pub const MODEL_DASHSCOPE_V1: &str = "text-embedding-v1";

const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
const DASHSCOPE_MAX_BATCH: usize = 10;

fn dashscope_dimension(model: &str) -> Option<usize> {
    match model {
        MODEL_DASHSCOPE_V1 | MODEL_DASHSCOPE_V2 => Some(1536),
        MODEL_DASHSCOPE_V3 | MODEL_DASHSCOPE_V4 => Some(1024),
        _ => None,
    }
}

const DEFAULTS: ProviderDefaults = ProviderDefaults {
    name: "dashscope",
    base_url: DASHSCOPE_BASE_URL,
    model: MODEL_DASHSCOPE_V4,
    max_batch: DASHSCOPE_MAX_BATCH,
    dimension_for: dashscope_dimension,
};

/// DashScope embedder using Aliyun DashScope's OpenAI-compatible API.
pub struct DashScope {
    client: Client,
    settings: Settings,
}

impl DashScope {
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
impl Provider for DashScope {
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

//! Voyage AI embeddings, tuned for semantic search.
//!
//! Voyage encodes queries and documents differently; the [`InputKind`]
//! is forwarded as `input_type`. Queries only arrive as
//! [`InputKind::Query`] when the embedder's query hint is enabled.

use reqwest::Client;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{EmbedConfig, ProviderDefaults, Settings};
use crate::error::Result;
use crate::openai_compat::{EmbeddingResponse, collect_by_index};
use crate::provider::{InputKind, Provider};

/// Voyage AI embedding models.
pub const MODEL_VOYAGE_3_5: &str = "voyage-3.5";
pub const MODEL_VOYAGE_3_5_LITE: &str = "voyage-3.5-lite";
pub const MODEL_VOYAGE_3_LARGE: &str = "voyage-3-large";
pub const MODEL_VOYAGE_3_LITE: &str = "voyage-3-lite";
pub const MODEL_VOYAGE_CODE_3: &str = "voyage-code-3";

const VOYAGE_BASE_URL: &str = "https://api.voyageai.com/v1";
const VOYAGE_MAX_BATCH: usize = 1000;

fn voyage_dimension(model: &str) -> Option<usize> {
    match model {
        MODEL_VOYAGE_3_LITE => Some(512),
        MODEL_VOYAGE_3_5 | MODEL_VOYAGE_3_5_LITE | MODEL_VOYAGE_3_LARGE | MODEL_VOYAGE_CODE_3 => {
            Some(1024)
        }
        _ => None,
    }
}

const DEFAULTS: ProviderDefaults = ProviderDefaults {
    name: "voyage",
    base_url: VOYAGE_BASE_URL,
    model: MODEL_VOYAGE_3_5,
    max_batch: VOYAGE_MAX_BATCH,
    dimension_for: voyage_dimension,
};

#[derive(Serialize)]
struct VoyageRequest<'a> {
    input: &'a [&'a str],
    model: &'a str,
    input_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimension: Option<usize>,
}

fn input_type(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Query => "query",
        InputKind::Document => "document",
    }
}

/// Voyage AI embedder.
pub struct Voyage {
    client: Client,
    settings: Settings,
}

impl Voyage {
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
impl Provider for Voyage {
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
        kind: InputKind,
    ) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.settings.base_url);
        let body = VoyageRequest {
            input: texts,
            model: &self.settings.model,
            input_type: input_type(kind),
            output_dimension: self.settings.requested_dimension,
        };
        let resp: EmbeddingResponse = crate::http::post_json(
            &self.client,
            DEFAULTS.name,
            &url,
            &self.settings.api_key,
            &body,
            cancel,
        )
        .await?;
        collect_by_index(DEFAULTS.name, resp.data, texts.len())
    }
}

//! Cohere embeddings (v2 `/embed` API), built for search and reranking.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::{EmbedConfig, ProviderDefaults, Settings};
use crate::error::{EmbedError, Result};
use crate::provider::{InputKind, Provider};

/// Cohere embedding models.
pub const MODEL_COHERE_EMBED_V4: &str = "embed-v4.0";
pub const MODEL_COHERE_ENGLISH_V3: &str = "embed-english-v3.0";
pub const MODEL_COHERE_MULTILINGUAL_V3: &str = "embed-multilingual-v3.0";
pub const MODEL_COHERE_ENGLISH_LIGHT_V3: &str = "embed-english-light-v3.0";
pub const MODEL_COHERE_MULTILINGUAL_LIGHT_V3: &str = "embed-multilingual-light-v3.0";

const COHERE_BASE_URL: &str = "https://api.cohere.com/v2";
const COHERE_MAX_BATCH: usize = 96;

fn cohere_dimension(model: &str) -> Option<usize> {
    match model {
        MODEL_COHERE_EMBED_V4 => Some(1536),
        MODEL_COHERE_ENGLISH_V3 | MODEL_COHERE_MULTILINGUAL_V3 => Some(1024),
        MODEL_COHERE_ENGLISH_LIGHT_V3 | MODEL_COHERE_MULTILINGUAL_LIGHT_V3 => Some(384),
        _ => None,
    }
}

const DEFAULTS: ProviderDefaults = ProviderDefaults {
    name: "cohere",
    base_url: COHERE_BASE_URL,
    model: MODEL_COHERE_ENGLISH_V3,
    max_batch: COHERE_MAX_BATCH,
    dimension_for: cohere_dimension,
};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: &'a [&'a str],
    input_type: &'a str,
    embedding_types: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimension: Option<usize>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Embeddings,
}

#[derive(Deserialize)]
struct Embeddings {
    #[serde(default)]
    float: Vec<Vec<f32>>,
}

fn input_type(kind: InputKind) -> &'static str {
    match kind {
        InputKind::Query => "search_query",
        InputKind::Document => "search_document",
    }
}

/// Cohere embedder.
pub struct Cohere {
    client: Client,
    settings: Settings,
}

impl Cohere {
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
impl Provider for Cohere {
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
        let url = format!("{}/embed", self.settings.base_url);
        let body = EmbedRequest {
            model: &self.settings.model,
            texts,
            input_type: input_type(kind),
            embedding_types: ["float"],
            output_dimension: self.settings.requested_dimension,
        };
        let resp: EmbedResponse = crate::http::post_json(
            &self.client,
            DEFAULTS.name,
            &url,
            &self.settings.api_key,
            &body,
            cancel,
        )
        .await?;

        let vecs = resp.embeddings.float;
        if vecs.len() != texts.len() {
            return Err(EmbedError::protocol(
                DEFAULTS.name,
                format!("got {} embeddings for {} texts", vecs.len(), texts.len()),
            ));
        }
        Ok(vecs)
    }
}

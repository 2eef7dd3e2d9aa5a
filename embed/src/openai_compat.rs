use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::error::{EmbedError, Result};

/// OpenAI-compatible embedding request body.
#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
    encoding_format: &'a str,
}

/// OpenAI-compatible embedding response.
///
/// Voyage AI answers in the same shape.
#[derive(Deserialize)]
pub(crate) struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
pub(crate) struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f64>,
}

/// Call an OpenAI-compatible embedding API endpoint.
///
/// Both DashScope and OpenAI use the same request/response format.
/// The only differences are base_url, model name, and max batch size.
pub(crate) async fn call_embedding_api(
    client: &Client,
    provider: &str,
    settings: &Settings,
    texts: &[&str],
    cancel: &CancellationToken,
) -> Result<Vec<Vec<f32>>> {
    let url = format!("{}/embeddings", settings.base_url);
    let body = EmbeddingRequest {
        model: &settings.model,
        input: texts,
        dimensions: settings.requested_dimension,
        encoding_format: "float",
    };

    let resp: EmbeddingResponse =
        crate::http::post_json(client, provider, &url, &settings.api_key, &body, cancel).await?;
    collect_by_index(provider, resp.data, texts.len())
}

/// Place embeddings by their `index` field (the API may return them out of order).
pub(crate) fn collect_by_index(
    provider: &str,
    data: Vec<EmbeddingData>,
    batch_size: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut vecs: Vec<Option<Vec<f32>>> = vec![None; batch_size];
    for item in data {
        let Some(slot) = vecs.get_mut(item.index) else {
            return Err(EmbedError::protocol(
                provider,
                format!("unexpected embedding index {} for batch size {batch_size}", item.index),
            ));
        };
        if slot.is_some() {
            return Err(EmbedError::protocol(
                provider,
                format!("duplicate embedding index {}", item.index),
            ));
        }
        *slot = Some(item.embedding.iter().map(|&v| v as f32).collect());
    }

    vecs.into_iter()
        .enumerate()
        .map(|(i, v)| {
            v.ok_or_else(|| {
                EmbedError::protocol(provider, format!("missing embedding for index {i}"))
            })
        })
        .collect()
}

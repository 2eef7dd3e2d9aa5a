//! HTTP plumbing shared by all providers.

use std::time::Duration;

use reqwest::{
    Client, Response, StatusCode,
    header::{HeaderMap, RETRY_AFTER, USER_AGENT},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::sync::CancellationToken;

use crate::error::{EmbedError, Result};

const USER_AGENT_VALUE: &str = "giztoy-embed-rust/0.1";

/// Builds the pooled HTTP client owned by a provider.
pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| EmbedError::config(format!("http client: {e}")))
}

/// POST a JSON body with bearer auth and decode a JSON response.
///
/// Returns [`EmbedError::Cancelled`] as soon as `cancel` fires; the
/// in-flight request is dropped.
pub(crate) async fn post_json<B, R>(
    client: &Client,
    provider: &str,
    url: &str,
    api_key: &str,
    body: &B,
    cancel: &CancellationToken,
) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    if cancel.is_cancelled() {
        return Err(EmbedError::Cancelled);
    }

    let send = async {
        let resp = client
            .post(url)
            .bearer_auth(api_key)
            .header(USER_AGENT, USER_AGENT_VALUE)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(provider, e))?;
        handle_response(provider, resp).await
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(EmbedError::Cancelled),
        result = send => result,
    }
}

async fn handle_response<R: DeserializeOwned>(provider: &str, resp: Response) -> Result<R> {
    let status = resp.status();
    let retry_after = parse_retry_after(resp.headers());
    let body = resp.bytes().await.map_err(|e| transport(provider, e))?;

    if !status.is_success() {
        let message = error_message(&String::from_utf8_lossy(&body));
        return Err(classify_status(provider, status, retry_after, message));
    }

    serde_json::from_slice(&body)
        .map_err(|e| EmbedError::protocol(provider, format!("decode response: {e}")))
}

fn transport(provider: &str, source: reqwest::Error) -> EmbedError {
    EmbedError::Transport {
        provider: provider.to_string(),
        source,
    }
}

/// Maps a non-success HTTP status onto the error taxonomy.
pub(crate) fn classify_status(
    provider: &str,
    status: StatusCode,
    retry_after: Option<Duration>,
    message: String,
) -> EmbedError {
    let provider = provider.to_string();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => EmbedError::Auth { provider, message },
        StatusCode::TOO_MANY_REQUESTS => EmbedError::RateLimit {
            provider,
            message,
            retry_after,
        },
        _ => EmbedError::Api {
            provider,
            status: status.as_u16(),
            message,
        },
    }
}

/// Only the delay-seconds form of `Retry-After` is honored.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Pulls a human readable message out of a provider error body.
///
/// Understands `{"error": {"message": ..}}`, `{"error": ".."}`,
/// `{"message": ..}` and `{"detail": ..}`; falls back to the raw body.
fn error_message(body: &str) -> String {
    let raw = body.trim();
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return raw.to_string();
    };
    let found = value
        .pointer("/error/message")
        .or_else(|| value.get("error"))
        .or_else(|| value.get("message"))
        .or_else(|| value.get("detail"))
        .and_then(|v| v.as_str());
    match found {
        Some(msg) => msg.to_string(),
        None => raw.to_string(),
    }
}

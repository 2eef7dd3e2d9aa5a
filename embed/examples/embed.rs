//! Embed texts with any supported provider.
//!
//! ```sh
//! VOYAGE_API_KEY=... cargo run -p giztoy-embed --example embed -- \
//!     --provider voyage "Hello world" "The world is ending" "good bye"
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use giztoy_embed::{EmbedConfig, Embedder, ProviderConfig, ProviderKind};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, ValueEnum)]
enum Provider {
    Openai,
    Dashscope,
    Voyage,
    Cohere,
}

impl Provider {
    fn kind(self) -> ProviderKind {
        match self {
            Provider::Openai => ProviderKind::OpenAI,
            Provider::Dashscope => ProviderKind::DashScope,
            Provider::Voyage => ProviderKind::Voyage,
            Provider::Cohere => ProviderKind::Cohere,
        }
    }

    fn key_var(self) -> &'static str {
        match self {
            Provider::Openai => "OPENAI_API_KEY",
            Provider::Dashscope => "DASHSCOPE_API_KEY",
            Provider::Voyage => "VOYAGE_API_KEY",
            Provider::Cohere => "COHERE_API_KEY",
        }
    }
}

/// Embed texts and print one line per vector.
#[derive(Parser)]
#[command(name = "embed")]
struct Cli {
    /// Embedding provider
    #[arg(short, long, value_enum, default_value = "openai")]
    provider: Provider,

    /// Model name (provider default if unset)
    #[arg(short, long)]
    model: Option<String>,

    /// Texts per request (provider limit if unset)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Treat the single text as a search query
    #[arg(short, long)]
    query: bool,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Texts to embed
    #[arg(required = true)]
    texts: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("giztoy_embed=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let api_key = std::env::var(cli.provider.key_var()).unwrap_or_default();
    let mut options = EmbedConfig::default().with_query_hint(cli.query);
    if let Some(model) = &cli.model {
        options = options.with_model(model);
    }
    if let Some(size) = cli.batch_size {
        options = options.with_batch_size(size);
    }
    let embedder = ProviderConfig::new(cli.provider.kind(), &api_key)
        .with_options(options)
        .build()?;

    // Cancel everything once the deadline passes or on Ctrl-C.
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    let timeout = Duration::from_secs(cli.timeout);
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(timeout) => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        deadline.cancel();
    });

    let texts: Vec<&str> = cli.texts.iter().map(String::as_str).collect();
    let vecs = if cli.query && texts.len() == 1 {
        vec![embedder.embed_query(&cancel, texts[0]).await?]
    } else {
        embedder.embed_documents(&cancel, &texts).await?
    };

    for (text, v) in texts.iter().zip(&vecs) {
        let head: Vec<String> = v.iter().take(4).map(|x| format!("{x:.4}")).collect();
        println!("{text:?}\tdim={}\t[{}, ...]", v.len(), head.join(", "));
    }
    Ok(())
}

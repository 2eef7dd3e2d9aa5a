//! Provider-agnostic text embeddings.
//!
//! [`Embedder`] is the contract downstream retrieval and indexing code
//! depends on. [`BatchEmbedder`] implements it on top of any [`Provider`],
//! splitting large inputs into provider-sized chunks and keeping results in
//! input order.
//!
//! # Example
//!
//! ```rust,no_run
//! use giztoy_embed::{Embedder, ProviderConfig, ProviderKind};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> giztoy_embed::Result<()> {
//! let embedder = ProviderConfig::new(ProviderKind::Voyage, "pa-...").build()?;
//! let cancel = CancellationToken::new();
//!
//! let query = embedder.embed_query(&cancel, "what ends the world?").await?;
//! let docs = embedder
//!     .embed_documents(&cancel, &["Hello world", "The world is ending", "good bye"])
//!     .await?;
//! assert_eq!(docs.len(), 3);
//! assert_eq!(query.len(), embedder.dimension());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cohere;
pub mod config;
pub mod dashscope;
pub mod embed;
pub mod error;
pub(crate) mod http;
pub mod openai;
pub(crate) mod openai_compat;
pub mod provider;
pub mod retry;
pub mod voyage;

pub use batch::{BatchEmbedder, BatchEmbedderBuilder};
pub use cohere::Cohere;
pub use config::{EmbedConfig, ProviderConfig, ProviderKind};
pub use dashscope::DashScope;
pub use embed::Embedder;
pub use error::{EmbedError, Result};
pub use openai::OpenAI;
pub use provider::{InputKind, Provider};
pub use retry::RetryPolicy;
pub use voyage::Voyage;

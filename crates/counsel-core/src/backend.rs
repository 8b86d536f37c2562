use anyhow::Result;
use async_trait::async_trait;

/// A chat-completions endpoint: one system + user exchange, one text reply.
///
/// Both pipeline endpoints (the search-oriented model and the general-purpose
/// model) implement this; the pipeline never sees which is which beyond the
/// slot it holds them in.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

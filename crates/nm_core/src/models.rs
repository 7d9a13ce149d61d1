use std::fmt;

use async_trait::async_trait;

use crate::Result;

/// Everything the summarization service is told about one article.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRequest {
    pub title: String,
    pub content: String,
    pub model: String,
    pub language: String,
}

#[async_trait]
pub trait Summarizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Generate a summary for one article. Any error (transport, status,
    /// malformed body) means the caller falls back to non-generated text.
    async fn summarize(&self, request: &SummaryRequest) -> Result<String>;

    /// False for models that only echo feed text. Their output is shown, but
    /// the article stays eligible for a generated summary on a later run.
    fn is_generative(&self) -> bool {
        true
    }
}

use std::fmt;

use nm_core::{Result, SummaryRequest, Summarizer};

const SUMMARY_WORDS: usize = 20;

/// Produces a "summary" from the first words of the excerpt without any
/// network access.
pub struct DummyModel;

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").finish()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Summarizer for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn summarize(&self, request: &SummaryRequest) -> Result<String> {
        let source = if request.content.trim().is_empty() {
            &request.title
        } else {
            &request.content
        };
        let words: Vec<&str> = source.split_whitespace().take(SUMMARY_WORDS).collect();
        Ok(words.join(" "))
    }

    fn is_generative(&self) -> bool {
        false
    }
}

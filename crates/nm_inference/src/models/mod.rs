use std::sync::Arc;

use lazy_static::lazy_static;
use nm_core::{Error, Result, SummaryRequest, Summarizer};
use regex::Regex;

use crate::{Config, Provider};

pub mod dummy;
pub mod openrouter;

pub use dummy::DummyModel;
pub use openrouter::OpenRouterModel;

lazy_static! {
    static ref THINK_BLOCK: Regex = Regex::new(r"(?s)<think>.*?</think>").unwrap();
}

pub fn create_model(config: &Config) -> Result<Arc<dyn Summarizer>> {
    match config.provider {
        Provider::OpenRouter => Ok(Arc::new(OpenRouterModel::new(config)?)),
        Provider::Dummy => Ok(Arc::new(DummyModel::new())),
    }
}

pub(crate) fn build_prompt(request: &SummaryRequest) -> String {
    format!(
        "Write a short summary (2-3 sentences) in {} of the following news story.\n\n\
         Title: {}\nDescription: {}\n\n\
         The summary must be informative and objective. Reply with the summary only, without any extra commentary.",
        request.language, request.title, request.content
    )
}

/// Strips reasoning blocks some models emit and rejects empty answers.
pub(crate) fn clean_summary(raw: &str) -> Result<String> {
    let cleaned = THINK_BLOCK.replace_all(raw, "").trim().to_string();
    if cleaned.is_empty() {
        return Err(Error::Summarization("empty summary in response".to_string()));
    }
    Ok(cleaned)
}

use crate::error::TokenError;

/// Default context window assumed when no model-specific value is configured.
pub const DEFAULT_CONTEXT_WINDOW: usize = 128_000;

const CHARS_PER_TOKEN: usize = 4;

/// Token accounting for the content budget.
pub trait TokenCounter: Send + Sync {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenError>;

    fn context_window_size(&self) -> usize;
}

/// Character-based estimate: one token per four characters, rounded up.
#[derive(Debug, Clone, Copy)]
pub struct HeuristicTokenCounter {
    context_window: usize,
}

impl HeuristicTokenCounter {
    pub fn new(context_window: usize) -> Self {
        Self { context_window }
    }

    pub fn estimate(text: &str) -> usize {
        text.chars().count().div_ceil(CHARS_PER_TOKEN)
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> Result<usize, TokenError> {
        Ok(Self::estimate(text))
    }

    fn context_window_size(&self) -> usize {
        self.context_window
    }
}

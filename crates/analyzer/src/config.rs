use codebrief_scanner::ScanOptions;
use std::path::PathBuf;
use std::time::Duration;

/// Tokens kept free for instructions and the model's answer when the
/// ceiling is derived from the context window.
pub const DEFAULT_PROMPT_RESERVE_TOKENS: usize = 8_192;

const MIN_DERIVED_CEILING: usize = 1_024;

/// Knobs for one [`crate::ProjectAnalyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Project root. Defaults to the first analyzed path (or its parent
    /// when that path is a file).
    pub project_root: Option<PathBuf>,

    /// Explicit content budget; derived from the context window when unset.
    pub token_ceiling: Option<usize>,

    pub prompt_reserve_tokens: usize,

    /// Upper bound on in-flight extraction calls; unbounded when unset.
    pub max_concurrent_extractions: Option<usize>,

    pub write_snapshot: bool,

    /// Per-file parse limit; a file that exceeds it is left out.
    pub parse_timeout: Option<Duration>,

    pub scan: ScanOptions,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            project_root: None,
            token_ceiling: None,
            prompt_reserve_tokens: DEFAULT_PROMPT_RESERVE_TOKENS,
            max_concurrent_extractions: None,
            write_snapshot: true,
            parse_timeout: None,
            scan: ScanOptions::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Token ceiling for content assembly given the model's context window.
    pub fn effective_ceiling(&self, context_window: usize) -> usize {
        match self.token_ceiling {
            Some(ceiling) => ceiling,
            None => context_window
                .saturating_sub(self.prompt_reserve_tokens)
                .max(MIN_DERIVED_CEILING.min(context_window)),
        }
    }

    pub fn extraction_limit(&self) -> Option<usize> {
        self.max_concurrent_extractions.filter(|limit| *limit > 0)
    }
}

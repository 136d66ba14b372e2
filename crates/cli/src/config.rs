//! Layered application config: defaults, then `codebrief.toml` (or
//! `--config`), then `CODEBRIEF_*` environment variables. Flags are applied
//! last by the caller.

use anyhow::{Context, Result};
use codebrief_analyzer::{AnalyzerConfig, DEFAULT_PROMPT_RESERVE_TOKENS};
use codebrief_insights::{OpenAiCompatConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use codebrief_scanner::{ScanOptions, DEFAULT_CONTEXT_WINDOW, MAX_FILE_SIZE_BYTES};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "codebrief.toml";
pub const DEFAULT_API_KEY_ENV: &str = "CODEBRIEF_API_KEY";

const ENV_BASE_URL: &str = "CODEBRIEF_BASE_URL";
const ENV_MODEL: &str = "CODEBRIEF_MODEL";
const ENV_CONTEXT_WINDOW: &str = "CODEBRIEF_CONTEXT_WINDOW";
const ENV_TOKEN_CEILING: &str = "CODEBRIEF_TOKEN_CEILING";
const ENV_MAX_CONCURRENCY: &str = "CODEBRIEF_MAX_CONCURRENCY";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub analysis: AnalysisSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub base_url: String,
    pub model: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub context_window: usize,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            temperature: None,
            max_tokens: None,
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisSection {
    pub token_ceiling: Option<usize>,
    pub prompt_reserve_tokens: usize,
    pub max_concurrent_extractions: Option<usize>,
    pub write_snapshot: bool,
    pub snapshot_dir: Option<PathBuf>,
    /// Per-file parse limit in milliseconds
    pub parse_timeout_ms: Option<u64>,
    pub max_file_size: u64,
    /// Extra directory names to prune during discovery
    pub skip_dirs: Vec<String>,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            token_ceiling: None,
            prompt_reserve_tokens: DEFAULT_PROMPT_RESERVE_TOKENS,
            max_concurrent_extractions: None,
            write_snapshot: true,
            snapshot_dir: None,
            parse_timeout_ms: None,
            max_file_size: MAX_FILE_SIZE_BYTES,
            skip_dirs: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load `explicit` if given, otherwise `<root>/codebrief.toml` when it
    /// exists, otherwise defaults.
    pub fn load_file(explicit: Option<&Path>, root: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    log::debug!("No {} under {}, using defaults", CONFIG_FILE_NAME, root.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Overlay `CODEBRIEF_*` variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.llm.model = Some(model);
        }
        if let Some(window) = parse_env(&lookup, ENV_CONTEXT_WINDOW)? {
            self.llm.context_window = window;
        }
        if let Some(ceiling) = parse_env(&lookup, ENV_TOKEN_CEILING)? {
            self.analysis.token_ceiling = Some(ceiling);
        }
        if let Some(limit) = parse_env(&lookup, ENV_MAX_CONCURRENCY)? {
            self.analysis.max_concurrent_extractions = Some(limit);
        }
        Ok(())
    }

    /// Provider settings. The key is read from the variable named by
    /// `llm.api_key_env`.
    pub fn provider_config<F>(&self, lookup: F) -> Result<OpenAiCompatConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = self
            .llm
            .model
            .clone()
            .filter(|model| !model.trim().is_empty())
            .with_context(|| {
                format!("No model configured; set [llm] model in {CONFIG_FILE_NAME} or {ENV_MODEL}")
            })?;

        Ok(OpenAiCompatConfig {
            base_url: self.llm.base_url.clone(),
            model,
            api_key: lookup(&self.llm.api_key_env),
            timeout: Duration::from_secs(self.llm.timeout_secs),
        })
    }

    pub fn analyzer_config(&self, project_root: Option<PathBuf>) -> AnalyzerConfig {
        AnalyzerConfig {
            project_root,
            token_ceiling: self.analysis.token_ceiling,
            prompt_reserve_tokens: self.analysis.prompt_reserve_tokens,
            max_concurrent_extractions: self.analysis.max_concurrent_extractions,
            write_snapshot: self.analysis.write_snapshot,
            parse_timeout: self
                .analysis
                .parse_timeout_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            scan: self.scan_options(),
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_file_size: self.analysis.max_file_size,
            extra_skip_dirs: self.analysis.skip_dirs.clone(),
        }
    }
}

fn parse_env<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("{key} must be a number, got {raw:?}"))
        })
        .transpose()
}

//! # codebrief insights
//!
//! Structured-insight half of the pipeline. A file's syntax tree is condensed,
//! embedded in a prompt together with the [`CodeInsights`] schema and sent to
//! a [`StructuredCompletion`] service, which hands back typed JSON.
//!
//! ```text
//! GenericAstNode ─> condense ─> compact JSON ─> prompt ─> StructuredCompletion
//!                                                          │
//!                           JsonCompletion<P: LlmProvider> ┘ (fence strip, repair, parse)
//!                                      │
//!                           OpenAiCompatProvider (/chat/completions, json_schema)
//! ```
//!
//! [`CodeInsights`]: codebrief_protocol::CodeInsights

mod completion;
mod error;
mod extractor;
mod openai_compat;
mod prompt;
mod repair;

pub use completion::{
    get_structured_completion, schema_value, CompletionOptions, CompletionRequest,
    JsonCompletion, LlmProvider, ResponseFormat, StructuredCompletion,
};
pub use error::{InsightError, ProviderError, Result};
pub use extractor::InsightExtractor;
pub use openai_compat::{OpenAiCompatConfig, OpenAiCompatProvider, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use prompt::{build_prompt, insights_schema, INSIGHTS_SCHEMA_NAME};
pub use repair::parse_json_response;

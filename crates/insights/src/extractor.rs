use crate::completion::{get_structured_completion, CompletionOptions, StructuredCompletion};
use crate::error::{InsightError, Result};
use crate::prompt::{build_prompt, insights_schema, INSIGHTS_SCHEMA_NAME};
use codebrief_protocol::{serialize_json, CodeInsights};
use codebrief_syntax::{condense, GenericAstNode};
use std::sync::Arc;

/// Turns one file's syntax tree into [`CodeInsights`] via a structured
/// completion.
#[derive(Clone)]
pub struct InsightExtractor {
    completion: Arc<dyn StructuredCompletion>,
    options: CompletionOptions,
}

impl InsightExtractor {
    pub fn new(completion: Arc<dyn StructuredCompletion>) -> Self {
        Self {
            completion,
            options: CompletionOptions::named(INSIGHTS_SCHEMA_NAME),
        }
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.options.temperature = temperature;
        self.options.max_tokens = max_tokens;
        self
    }

    /// Condense, prompt and return the model's insights unchanged.
    ///
    /// A `null` answer is [`InsightError::UnexpectedAnalysis`]; provider and
    /// schema failures surface as [`InsightError::Provider`].
    pub async fn analyze(&self, ast: &GenericAstNode, file_path: &str) -> Result<CodeInsights> {
        let condensed = condense(ast);
        let payload = serialize_json(&condensed)?;
        let prompt = build_prompt(file_path, &payload)?;

        log::debug!(
            "Extracting insights for {file_path} ({} imports, {} functions, {} classes)",
            condensed.imports.len(),
            condensed.functions.len(),
            condensed.classes.len()
        );

        let insights = get_structured_completion::<CodeInsights>(
            self.completion.as_ref(),
            &prompt,
            insights_schema(),
            &self.options,
        )
        .await?;

        insights.ok_or_else(|| InsightError::UnexpectedAnalysis {
            path: file_path.to_string(),
        })
    }
}

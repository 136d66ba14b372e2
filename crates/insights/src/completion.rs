//! Structured completion: an LLM call constrained to a JSON schema.

use crate::error::ProviderError;
use crate::repair::parse_json_response;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

const JSON_SYSTEM_PROMPT: &str = "You are a precise code analysis engine. Respond with a single JSON value that matches the provided JSON schema. Do not add commentary.";

/// Per-call knobs for a structured completion.
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    /// Name reported to providers that support named response schemas.
    pub schema_name: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            schema_name: "response".to_string(),
            temperature: None,
            max_tokens: None,
        }
    }
}

impl CompletionOptions {
    pub fn named(schema_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            ..Self::default()
        }
    }
}

/// A completion service that returns parsed JSON for a schema.
///
/// Implementations own parsing and repair of the raw model output; callers
/// receive either a JSON value (possibly `null`) or a tagged error.
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, ProviderError>;
}

/// Typed structured completion.
///
/// `Ok(None)` means the model explicitly answered `null`. A value that does
/// not deserialize into `T` is an [`ProviderError::InvalidResponse`].
pub async fn get_structured_completion<T: DeserializeOwned>(
    completion: &dyn StructuredCompletion,
    prompt: &str,
    schema: &Value,
    options: &CompletionOptions,
) -> Result<Option<T>, ProviderError> {
    let value = completion
        .complete_structured(prompt, schema, options)
        .await?;
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some).map_err(|e| {
        ProviderError::InvalidResponse(format!(
            "response does not match schema {}: {e}",
            options.schema_name
        ))
    })
}

/// JSON schema of `T` as a plain JSON value.
pub fn schema_value<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

/// Schema a provider should constrain its output to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    pub name: String,
    pub schema: Value,
}

/// One raw text completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub response_format: Option<ResponseFormat>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// A text-in, text-out LLM backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError>;
}

/// [`StructuredCompletion`] over any [`LlmProvider`]: forwards the schema,
/// then parses and repairs the text the model sends back.
pub struct JsonCompletion<P> {
    provider: P,
}

impl<P: LlmProvider> JsonCompletion<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P: LlmProvider> StructuredCompletion for JsonCompletion<P> {
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &Value,
        options: &CompletionOptions,
    ) -> Result<Value, ProviderError> {
        let request = CompletionRequest {
            system: Some(JSON_SYSTEM_PROMPT.to_string()),
            prompt: prompt.to_string(),
            response_format: Some(ResponseFormat {
                name: options.schema_name.clone(),
                schema: schema.clone(),
            }),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let raw = self.provider.complete(request).await?;
        log::debug!(
            "{} returned {} bytes for schema {}",
            self.provider.name(),
            raw.len(),
            options.schema_name
        );
        parse_json_response(&raw)
    }
}

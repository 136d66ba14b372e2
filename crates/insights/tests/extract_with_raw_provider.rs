use async_trait::async_trait;
use codebrief_insights::{
    CompletionRequest, InsightError, InsightExtractor, JsonCompletion, LlmProvider, ProviderError,
    INSIGHTS_SCHEMA_NAME,
};
use codebrief_protocol::{ClassInsight, CodeInsights, FunctionInsight, ImportInsight};
use codebrief_syntax::{Language, SyntaxParser};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

/// Replies with canned text and remembers what it was asked.
struct ScriptedModel {
    reply: String,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedModel {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request);
        Ok(self.reply.clone())
    }
}

fn python_tree() -> codebrief_syntax::GenericAstNode {
    SyntaxParser::default()
        .parse(
            "import os\n\nclass Repo:\n    def load(self, key):\n        pass\n",
            Language::Python,
        )
        .unwrap()
}

#[tokio::test]
async fn fenced_model_output_becomes_typed_insights() {
    let reply = "Here is the analysis:\n```json\n{\n  \"functions\": [{\"name\": \"load\", \"parameters\": [\"key\"]}],\n  \"classes\": [{\"name\": \"Repo\"}],\n  \"imports\": [{\"source\": \"os\"}],\n}\n```";
    let extractor = InsightExtractor::new(Arc::new(JsonCompletion::new(ScriptedModel::new(reply))));

    let insights = extractor.analyze(&python_tree(), "repo.py").await.unwrap();

    assert_eq!(
        insights,
        CodeInsights {
            functions: vec![FunctionInsight {
                name: "load".into(),
                parameters: vec!["key".into()],
            }],
            classes: vec![ClassInsight {
                name: "Repo".into()
            }],
            imports: vec![ImportInsight::new("os")],
        }
    );
}

#[tokio::test]
async fn schema_is_forwarded_to_the_provider() {
    let completion = Arc::new(JsonCompletion::new(ScriptedModel::new(
        r#"{"functions":[],"classes":[],"imports":[]}"#,
    )));
    let extractor = InsightExtractor::new(completion.clone()).with_sampling(Some(0.0), Some(1024));

    extractor.analyze(&python_tree(), "repo.py").await.unwrap();

    let requests = completion.provider().requests.lock().unwrap();
    let request = &requests[0];
    let format = request.response_format.as_ref().unwrap();
    assert_eq!(format.name, INSIGHTS_SCHEMA_NAME);
    assert!(format.schema.to_string().contains("parameters"));
    assert_eq!(request.temperature, Some(0.0));
    assert_eq!(request.max_tokens, Some(1024));
    assert!(request.prompt.contains(r#""params":["key"]"#));
}

#[tokio::test]
async fn prose_only_answer_is_a_provider_error() {
    let extractor = InsightExtractor::new(Arc::new(JsonCompletion::new(ScriptedModel::new(
        "Sorry, I cannot analyze this file.",
    ))));

    let err = extractor.analyze(&python_tree(), "repo.py").await.unwrap_err();
    assert!(matches!(
        err,
        InsightError::Provider(ProviderError::InvalidResponse(_))
    ));
}

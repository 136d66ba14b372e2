use thiserror::Error;

/// Result type for syntax operations
pub type Result<T> = std::result::Result<T, SyntaxError>;

/// Errors that can occur while turning source text into a syntax tree
#[derive(Error, Debug)]
pub enum SyntaxError {
    /// The parser gave up (timeout or internal failure)
    #[error("Parse error: {0}")]
    ParseError(String),

    /// No grammar is registered for the language
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The grammar could not be loaded into a parser
    #[error("Grammar load failed for {language}: {message}")]
    GrammarLoad { language: String, message: String },

    /// Empty content
    #[error("Empty content provided")]
    EmptyContent,
}

impl SyntaxError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Create an unsupported language error
    pub fn unsupported_language(lang: impl Into<String>) -> Self {
        Self::UnsupportedLanguage(lang.into())
    }

    /// Create a grammar load error
    pub fn grammar_load(language: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::GrammarLoad {
            language: language.into(),
            message: msg.into(),
        }
    }
}

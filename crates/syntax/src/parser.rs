use crate::ast::GenericAstNode;
use crate::error::{Result, SyntaxError};
use crate::language::Language;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tree_sitter::{Parser, TreeCursor};

/// Subtrees deeper than this are cut off when converting to [`GenericAstNode`].
const MAX_TREE_DEPTH: usize = 1024;

type GrammarLoader = dyn Fn(Language) -> Result<tree_sitter::Language> + Send + Sync;

/// Lazily loaded grammars, one per language.
///
/// Entries are only ever added. A failed load leaves no entry behind, so the
/// next request for that language tries again.
pub struct GrammarCache {
    grammars: Mutex<HashMap<Language, tree_sitter::Language>>,
    loader: Box<GrammarLoader>,
}

impl Default for GrammarCache {
    fn default() -> Self {
        Self::with_loader(Language::tree_sitter_language)
    }
}

impl GrammarCache {
    /// Cache backed by a custom loader (used to simulate grammar failures).
    pub fn with_loader(
        loader: impl Fn(Language) -> Result<tree_sitter::Language> + Send + Sync + 'static,
    ) -> Self {
        Self {
            grammars: Mutex::new(HashMap::new()),
            loader: Box::new(loader),
        }
    }

    /// Return the cached grammar or load and cache it.
    pub fn get_or_load(&self, language: Language) -> Result<tree_sitter::Language> {
        if let Some(grammar) = self.lock().get(&language) {
            return Ok(grammar.clone());
        }

        // Loaded outside the lock; the first inserted grammar wins.
        let grammar = (self.loader)(language)?;
        log::debug!("Loaded {language} grammar");
        Ok(self.lock().entry(language).or_insert(grammar).clone())
    }

    #[cfg(test)]
    fn is_loaded(&self, language: Language) -> bool {
        self.lock().contains_key(&language)
    }

    #[cfg(test)]
    fn loaded_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Language, tree_sitter::Language>> {
        self.grammars.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Parses source text into a [`GenericAstNode`] tree.
#[derive(Clone)]
pub struct SyntaxParser {
    grammars: Arc<GrammarCache>,
    timeout: Option<Duration>,
}

impl Default for SyntaxParser {
    fn default() -> Self {
        Self::new(Arc::new(GrammarCache::default()))
    }
}

impl SyntaxParser {
    pub fn new(grammars: Arc<GrammarCache>) -> Self {
        Self {
            grammars,
            timeout: None,
        }
    }

    /// Abort parsing of a single file after `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse `content` resolving the language from `path`'s extension.
    pub fn parse_path(&self, content: &str, path: impl AsRef<Path>) -> Result<GenericAstNode> {
        let path = path.as_ref();
        let language = Language::from_path(path)
            .ok_or_else(|| SyntaxError::unsupported_language(path.display().to_string()))?;
        self.parse(content, language)
    }

    /// Parse `content` with the grammar for `language`.
    pub fn parse(&self, content: &str, language: Language) -> Result<GenericAstNode> {
        if content.trim().is_empty() {
            return Err(SyntaxError::EmptyContent);
        }

        let grammar = self.grammars.get_or_load(language)?;
        let mut parser = Parser::new();
        parser
            .set_language(&grammar)
            .map_err(|e| SyntaxError::grammar_load(language.as_str(), e.to_string()))?;
        if let Some(timeout) = self.timeout {
            parser.set_timeout_micros(u64::try_from(timeout.as_micros()).unwrap_or(u64::MAX));
        }

        let tree = parser.parse(content, None).ok_or_else(|| match self.timeout {
            Some(timeout) => SyntaxError::parse(format!("{language} parse exceeded {timeout:?}")),
            None => SyntaxError::parse(format!("{language} parser produced no tree")),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            log::debug!("{language} tree contains syntax errors; continuing with partial tree");
        }

        let mut cursor = tree.walk();
        Ok(convert(&mut cursor, content.as_bytes(), 0))
    }
}

fn convert(cursor: &mut TreeCursor<'_>, source: &[u8], depth: usize) -> GenericAstNode {
    let node = cursor.node();
    let field_name = cursor.field_name().map(str::to_string);

    let mut children = Vec::new();
    if depth < MAX_TREE_DEPTH {
        if cursor.goto_first_child() {
            children.reserve(node.child_count());
            loop {
                children.push(convert(cursor, source, depth + 1));
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }
    } else if node.child_count() > 0 {
        log::debug!(
            "Tree depth limit reached at {}:{}, dropping {} children",
            node.start_position().row + 1,
            node.start_position().column + 1,
            node.child_count()
        );
    }

    GenericAstNode {
        kind: node.kind().to_string(),
        text: String::from_utf8_lossy(&source[node.byte_range()]).into_owned(),
        start_position: node.start_position().into(),
        end_position: node.end_position().into(),
        is_named: node.is_named(),
        field_name,
        children,
    }
}

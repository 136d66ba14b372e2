use crate::error::CollectError;
use crate::fs::FileSystem;
use crate::tokens::TokenCounter;
use codebrief_protocol::FileMetadata;
use std::path::Path;
use std::sync::Arc;

const DELIMITER: &str = "================";

/// Concatenated file contents that fit within a token ceiling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedContent {
    pub content: String,
    /// Included files, a prefix of the input order.
    pub files: Vec<FileMetadata>,
    /// Text of each included file, parallel to `files`.
    pub sources: Vec<String>,
    pub total_tokens: usize,
}

/// Greedy, order-preserving content assembler.
#[derive(Clone)]
pub struct ContentCollector {
    fs: Arc<dyn FileSystem>,
    counter: Arc<dyn TokenCounter>,
}

impl ContentCollector {
    pub fn new(fs: Arc<dyn FileSystem>, counter: Arc<dyn TokenCounter>) -> Self {
        Self { fs, counter }
    }

    /// Append files in the given order while the running total stays within
    /// `ceiling`. The first file that would overflow ends collection, so the
    /// budget may be under-filled. Unreadable or uncountable files are
    /// skipped.
    pub async fn collect(
        &self,
        ordered: &[FileMetadata],
        root: &Path,
        ceiling: usize,
    ) -> Result<CollectedContent, CollectError> {
        let mut content = String::new();
        let mut files = Vec::new();
        let mut sources = Vec::new();
        let mut total_tokens = 0usize;

        for file in ordered {
            let path = root.join(&file.path);
            let text = match self.fs.read_file(&path).await {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("Skipping unreadable file: {e}");
                    continue;
                }
            };

            let block = format_block(&file.path, &text);
            let cost = match self.counter.count_tokens(&block) {
                Ok(cost) => cost,
                Err(e) => {
                    log::warn!("Skipping {}: {e}", file.path);
                    continue;
                }
            };

            if total_tokens + cost > ceiling {
                log::info!(
                    "Token ceiling reached at {} ({} + {} > {}); {} files not included",
                    file.path,
                    total_tokens,
                    cost,
                    ceiling,
                    ordered.len() - files.len()
                );
                break;
            }

            total_tokens += cost;
            content.push_str(&block);
            files.push(file.clone());
            sources.push(text);
        }

        if files.is_empty() {
            return Err(CollectError::NoContentCollected {
                considered: ordered.len(),
                ceiling,
            });
        }

        log::info!(
            "Collected {} of {} files ({} tokens, ceiling {})",
            files.len(),
            ordered.len(),
            total_tokens,
            ceiling
        );
        Ok(CollectedContent {
            content,
            files,
            sources,
            total_tokens,
        })
    }
}

/// Render one file with its delimiter header.
pub fn format_block(relative: &str, content: &str) -> String {
    format!("{DELIMITER}\nFile: {relative}\n{DELIMITER}\n{content}\n\n")
}

//! # codebrief scanner
//!
//! Raw-content half of the pipeline: find analyzable files, order them by
//! importance and assemble as many as fit within a token ceiling.
//!
//! ```text
//! FileScanner::discover ──> FileScanner::describe ──> prioritize ──> ContentCollector::collect
//!   (prune + filter)          (size, relative path)    (total order)   (greedy, stop on overflow)
//! ```
//!
//! All file access goes through the [`FileSystem`] trait and all token
//! accounting through [`TokenCounter`], so the pipeline runs unchanged over
//! [`MemoryFileSystem`] in tests.

mod collector;
mod error;
mod fs;
mod prioritizer;
mod scanner;
mod tokens;

pub use collector::{format_block, CollectedContent, ContentCollector};
pub use error::{CollectError, FsError, Result, ScanError, TokenError};
pub use fs::{DirEntry, EntryKind, FileSystem, FsResult, LocalFileSystem, MemoryFileSystem};
pub use prioritizer::{prioritize, priority_for};
pub use scanner::{is_analyzable_file, FileScanner, ScanOptions, MAX_FILE_SIZE_BYTES};
pub use tokens::{HeuristicTokenCounter, TokenCounter, DEFAULT_CONTEXT_WINDOW};

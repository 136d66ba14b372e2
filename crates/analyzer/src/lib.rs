//! # codebrief analyzer
//!
//! Orchestrates a full analysis run and produces a [`ProjectContext`]:
//!
//! ```text
//! discover ─> prioritize ─> collect (token ceiling) ─> manifest + tech stack
//!     ─> parse each collected file (sequential)
//!     ─> extract insights (one task per file, settle all)
//!     ─> fold into code_insights ─> snapshot (best effort)
//! ```
//!
//! Only input, discovery and budget failures abort a run. Anything that goes
//! wrong for a single file is logged and that file is left out.
//!
//! [`ProjectContext`]: codebrief_protocol::ProjectContext

mod analyzer;
mod config;
mod error;
mod manifest;
mod snapshot;
pub mod tech_stack;

pub use analyzer::ProjectAnalyzer;
pub use config::{AnalyzerConfig, DEFAULT_PROMPT_RESERVE_TOKENS};
pub use error::{AnalyzerError, Result, SnapshotError};
pub use manifest::{FsManifestReader, ManifestReader, PACKAGE_JSON};
pub use snapshot::{JsonFileSnapshotSink, SnapshotSink, SNAPSHOT_DIR_NAME, SNAPSHOT_FILE_NAME};

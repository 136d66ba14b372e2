//! # codebrief protocol
//!
//! Shared data model for the project-analysis pipeline: discovered file
//! metadata, condensed syntax trees, per-file code insights and the
//! aggregated [`ProjectContext`].
//!
//! Every type here is plain data. Producers live in the `scanner`, `syntax`,
//! `insights` and `analyzer` crates.

use serde::Serialize;

mod context;
mod insights;
pub mod paths;

pub use context::{FileMetadata, PackageJson, PriorityLevel, ProjectContext, TechStack};
pub use insights::{
    ClassInsight, CodeInsights, CondensedAst, CondensedClass, CondensedFunction, FunctionInsight,
    ImportInsight,
};

/// Version stamped into persisted context snapshots.
pub const CONTEXT_SCHEMA_VERSION: u32 = 1;

/// Compact (single line) JSON rendering used for prompt payloads.
pub fn serialize_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string(value)
}

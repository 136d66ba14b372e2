use crate::insights::CodeInsights;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Importance class of a file under a token budget (1 = most valuable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PriorityLevel(u8);

impl PriorityLevel {
    pub const HIGHEST: Self = Self(1);
    pub const LOWEST: Self = Self(5);

    /// Returns `None` outside `1..=5`.
    #[must_use]
    pub const fn new(level: u8) -> Option<Self> {
        if level >= 1 && level <= 5 {
            Some(Self(level))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl Default for PriorityLevel {
    fn default() -> Self {
        Self::LOWEST
    }
}

impl TryFrom<u8> for PriorityLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("priority level must be in 1..=5, got {value}"))
    }
}

impl From<PriorityLevel> for u8 {
    fn from(level: PriorityLevel) -> Self {
        level.0
    }
}

impl fmt::Display for PriorityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// A discovered file, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// `/`-separated path relative to the project root
    pub path: String,

    /// Size in bytes at discovery time
    pub size: u64,

    /// Attached by the prioritizer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityLevel>,
}

impl FileMetadata {
    #[must_use]
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            priority: None,
        }
    }

    #[must_use]
    pub fn with_priority(self, priority: PriorityLevel) -> Self {
        Self {
            priority: Some(priority),
            ..self
        }
    }

    /// Priority, treating an unprioritized file as the lowest class.
    #[must_use]
    pub fn priority_or_lowest(&self) -> PriorityLevel {
        self.priority.unwrap_or(PriorityLevel::LOWEST)
    }
}

/// The subset of `package.json` the pipeline cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default)]
    pub peer_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    /// Runtime, dev and peer dependency names, deduplicated and sorted.
    pub fn all_dependency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .dependencies
            .keys()
            .chain(self.dev_dependencies.keys())
            .chain(self.peer_dependencies.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Summary of the languages and tooling a project uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechStack {
    /// Languages ordered by number of discovered files, most frequent first
    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub frameworks: Vec<String>,

    #[serde(default)]
    pub build_tools: Vec<String>,

    #[serde(default)]
    pub testing: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub dev_dependencies: Vec<String>,
}

/// Root aggregate produced by one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    pub schema_version: u32,

    pub project_root_path: String,

    pub tech_stack: TechStack,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_json: Option<PackageJson>,

    /// Keyed by relative path; only files that parsed and extracted successfully
    #[serde(default)]
    pub code_insights: BTreeMap<String, CodeInsights>,

    /// Files included in `content`, in inclusion order
    #[serde(default)]
    pub files: Vec<FileMetadata>,

    /// Token-bounded digest of the included files
    #[serde(default)]
    pub content: String,

    pub total_tokens: usize,

    pub generated_at_unix_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn priority_level_rejects_out_of_range() {
        assert!(PriorityLevel::new(0).is_none());
        assert!(PriorityLevel::new(6).is_none());
        assert_eq!(PriorityLevel::new(3).map(PriorityLevel::get), Some(3));
    }

    #[test]
    fn priority_level_deserialization_validates() {
        let ok: PriorityLevel = serde_json::from_str("2").unwrap();
        assert_eq!(ok.get(), 2);
        assert!(serde_json::from_str::<PriorityLevel>("9").is_err());
    }

    #[test]
    fn file_metadata_serializes_priority_as_integer() {
        let meta = FileMetadata::new("src/a.ts", 42).with_priority(PriorityLevel::HIGHEST);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"path": "src/a.ts", "size": 42, "priority": 1})
        );
    }

    #[test]
    fn package_json_reads_camel_case_fields() {
        let raw = r#"{
            "name": "demo",
            "packageManager": "pnpm@9.0.0",
            "dependencies": {"react": "^18.0.0"},
            "devDependencies": {"vitest": "^1.0.0", "react": "^18.0.0"}
        }"#;
        let pkg: PackageJson = serde_json::from_str(raw).unwrap();
        assert_eq!(pkg.name.as_deref(), Some("demo"));
        assert_eq!(pkg.package_manager.as_deref(), Some("pnpm@9.0.0"));
        assert_eq!(pkg.all_dependency_names(), vec!["react", "vitest"]);
    }
}

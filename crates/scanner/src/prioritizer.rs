//! Priority classes for budget-constrained inclusion.
//!
//! Each level owns two glob sets: one matched against the file name, one
//! against the root-relative path. Levels are tried from 1 to 4; a file that
//! matches none of them is level 5.

use codebrief_protocol::{paths, FileMetadata, PriorityLevel};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use std::cmp::Ordering;

const CODE_EXTENSIONS: &str =
    "rs,py,pyi,js,mjs,cjs,jsx,ts,mts,cts,tsx,java,kt,kts,go,c,h,cpp,cc,cxx,hpp,cs,rb,swift,php,scala,dart,zig,lua,ex,exs,vue,svelte,astro,sh,bash,zsh,ps1,sql,graphql,gql,proto";

struct LevelRule {
    level: u8,
    names: &'static [&'static str],
    paths: &'static [&'static str],
}

const LEVEL_RULES: &[LevelRule] = &[
    // Dependency manifests and project docs.
    LevelRule {
        level: 1,
        names: &[
            "package.json",
            "cargo.toml",
            "pyproject.toml",
            "setup.py",
            "setup.cfg",
            "pipfile",
            "requirements*.txt",
            "go.mod",
            "gemfile",
            "composer.json",
            "pom.xml",
            "build.gradle",
            "build.gradle.kts",
            "deno.json",
            "tsconfig.json",
            "readme*",
        ],
        paths: &[],
    },
    // Entry points and framework/tooling config.
    LevelRule {
        level: 2,
        names: &[
            "main.*",
            "index.*",
            "app.*",
            "server.*",
            "lib.rs",
            "mod.rs",
            "__init__.py",
            "__main__.py",
            "manage.py",
            "*.config.*",
            "dockerfile",
            "docker-compose.*",
            "compose.yaml",
            "compose.yml",
            "makefile",
            "justfile",
        ],
        paths: &[],
    },
    // Source directories.
    LevelRule {
        level: 3,
        names: &[],
        paths: &[
            "**/src/**/*.{CODE}",
            "lib/**/*.{CODE}",
            "app/**/*.{CODE}",
            "pkg/**/*.{CODE}",
            "cmd/**/*.{CODE}",
            "internal/**/*.{CODE}",
        ],
    },
    // Any other code file.
    LevelRule {
        level: 4,
        names: &["*.{CODE}"],
        paths: &[],
    },
];

struct CompiledLevel {
    level: PriorityLevel,
    names: GlobSet,
    paths: GlobSet,
}

static PRIORITY_TABLE: Lazy<Vec<CompiledLevel>> = Lazy::new(|| {
    LEVEL_RULES
        .iter()
        .filter_map(|rule| {
            Some(CompiledLevel {
                level: PriorityLevel::new(rule.level)?,
                names: compile(rule.names),
                paths: compile(rule.paths),
            })
        })
        .collect()
});

fn compile(patterns: &[&str]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = pattern.replace("{CODE}", &format!("{{{CODE_EXTENSIONS}}}"));
        match GlobBuilder::new(&pattern).literal_separator(true).build() {
            Ok(glob) => {
                builder.add(glob);
            }
            Err(e) => log::error!("Invalid priority pattern {pattern:?}: {e}"),
        }
    }
    builder.build().unwrap_or_else(|e| {
        log::error!("Failed to build priority patterns: {e}");
        GlobSet::empty()
    })
}

/// Priority level of a root-relative, `/`-separated path.
pub fn priority_for(relative: &str) -> PriorityLevel {
    let path = relative.to_lowercase();
    let name = paths::file_name(&path);

    PRIORITY_TABLE
        .iter()
        .find(|rule| rule.names.is_match(name) || rule.paths.is_match(&path))
        .map(|rule| rule.level)
        .unwrap_or(PriorityLevel::LOWEST)
}

/// Attach a priority to every file and sort into inclusion order.
///
/// The order is total: level, then size, then directory depth, then path.
pub fn prioritize(files: Vec<FileMetadata>) -> Vec<FileMetadata> {
    let mut prioritized: Vec<FileMetadata> = files
        .into_iter()
        .map(|file| {
            let level = priority_for(&file.path);
            file.with_priority(level)
        })
        .collect();
    prioritized.sort_by(compare);
    prioritized
}

fn compare(a: &FileMetadata, b: &FileMetadata) -> Ordering {
    a.priority_or_lowest()
        .cmp(&b.priority_or_lowest())
        .then(a.size.cmp(&b.size))
        .then(paths::depth(&a.path).cmp(&paths::depth(&b.path)))
        .then_with(|| a.path.cmp(&b.path))
}

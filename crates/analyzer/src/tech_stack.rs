//! Tech-stack summary from discovered files and the dependency manifest.

use codebrief_protocol::{paths, FileMetadata, PackageJson, TechStack};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap};

static LANGUAGES_BY_EXTENSION: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("rs", "Rust"),
        ("py", "Python"),
        ("pyi", "Python"),
        ("js", "JavaScript"),
        ("mjs", "JavaScript"),
        ("cjs", "JavaScript"),
        ("jsx", "JavaScript"),
        ("ts", "TypeScript"),
        ("mts", "TypeScript"),
        ("cts", "TypeScript"),
        ("tsx", "TypeScript"),
        ("go", "Go"),
        ("java", "Java"),
        ("kt", "Kotlin"),
        ("kts", "Kotlin"),
        ("rb", "Ruby"),
        ("php", "PHP"),
        ("cs", "C#"),
        ("c", "C"),
        ("h", "C"),
        ("cpp", "C++"),
        ("cc", "C++"),
        ("cxx", "C++"),
        ("hpp", "C++"),
        ("swift", "Swift"),
        ("scala", "Scala"),
        ("dart", "Dart"),
        ("ex", "Elixir"),
        ("exs", "Elixir"),
        ("lua", "Lua"),
        ("zig", "Zig"),
        ("vue", "Vue"),
        ("svelte", "Svelte"),
        ("sh", "Shell"),
        ("bash", "Shell"),
        ("zsh", "Shell"),
        ("sql", "SQL"),
    ])
});

/// (dependency name, display name)
const FRAMEWORKS: &[(&str, &str)] = &[
    ("next", "Next.js"),
    ("react", "React"),
    ("vue", "Vue"),
    ("nuxt", "Nuxt"),
    ("svelte", "Svelte"),
    ("@sveltejs/kit", "SvelteKit"),
    ("@angular/core", "Angular"),
    ("solid-js", "Solid"),
    ("@remix-run/react", "Remix"),
    ("astro", "Astro"),
    ("express", "Express"),
    ("fastify", "Fastify"),
    ("koa", "Koa"),
    ("hono", "Hono"),
    ("@nestjs/core", "NestJS"),
    ("electron", "Electron"),
    ("react-native", "React Native"),
];

const BUILD_TOOLS: &[(&str, &str)] = &[
    ("typescript", "TypeScript compiler"),
    ("vite", "Vite"),
    ("webpack", "Webpack"),
    ("rollup", "Rollup"),
    ("esbuild", "esbuild"),
    ("parcel", "Parcel"),
    ("turbo", "Turborepo"),
    ("tsup", "tsup"),
    ("@swc/core", "SWC"),
    ("@babel/core", "Babel"),
];

const TESTING: &[(&str, &str)] = &[
    ("jest", "Jest"),
    ("vitest", "Vitest"),
    ("mocha", "Mocha"),
    ("ava", "AVA"),
    ("jasmine", "Jasmine"),
    ("cypress", "Cypress"),
    ("@playwright/test", "Playwright"),
    ("@testing-library/react", "Testing Library"),
];

/// Build tools implied by a manifest file name alone.
const MANIFEST_TOOLS: &[(&str, &str)] = &[
    ("cargo.toml", "Cargo"),
    ("go.mod", "Go modules"),
    ("pyproject.toml", "Python packaging"),
    ("requirements.txt", "pip"),
    ("pipfile", "Pipenv"),
    ("pom.xml", "Maven"),
    ("build.gradle", "Gradle"),
    ("build.gradle.kts", "Gradle"),
    ("gemfile", "Bundler"),
    ("composer.json", "Composer"),
    ("dockerfile", "Docker"),
    ("makefile", "Make"),
];

/// Summarize languages and tooling. `files` is every discovered file, not
/// only the budget-included ones.
pub fn summarize(files: &[FileMetadata], manifest: Option<&PackageJson>) -> TechStack {
    let mut stack = TechStack {
        languages: languages(files),
        ..TechStack::default()
    };

    let mut build_tools = BTreeSet::new();
    for file in files {
        let name = paths::file_name(&file.path).to_lowercase();
        if let Some((_, tool)) = MANIFEST_TOOLS.iter().find(|(manifest, _)| *manifest == name) {
            build_tools.insert(tool.to_string());
        }
    }

    if let Some(manifest) = manifest {
        let names = manifest.all_dependency_names();
        stack.frameworks = matches(&names, FRAMEWORKS);
        stack.testing = matches(&names, TESTING);
        build_tools.extend(matches(&names, BUILD_TOOLS));
        stack.package_manager = Some(
            manifest
                .package_manager
                .as_deref()
                .and_then(|spec| spec.split('@').next())
                .filter(|name| !name.is_empty())
                .unwrap_or("npm")
                .to_string(),
        );
        stack.dependencies = manifest.dependencies.keys().cloned().collect();
        stack.dev_dependencies = manifest.dev_dependencies.keys().cloned().collect();
    }

    stack.build_tools = build_tools.into_iter().collect();
    stack
}

fn languages(files: &[FileMetadata]) -> Vec<String> {
    let mut counts: HashMap<&'static str, usize> = HashMap::new();
    for file in files {
        let language = paths::file_name(&file.path)
            .rsplit_once('.')
            .and_then(|(_, ext)| LANGUAGES_BY_EXTENSION.get(ext.to_lowercase().as_str()));
        if let Some(language) = language {
            *counts.entry(language).or_default() += 1;
        }
    }

    let mut ranked: Vec<(&'static str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked.into_iter().map(|(name, _)| name.to_string()).collect()
}

fn matches(names: &[&str], table: &[(&str, &str)]) -> Vec<String> {
    table
        .iter()
        .filter(|(dependency, _)| names.contains(dependency))
        .map(|(_, display)| display.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    fn files(paths: &[&str]) -> Vec<FileMetadata> {
        paths.iter().map(|p| FileMetadata::new(*p, 1)).collect()
    }

    #[test]
    fn languages_are_ranked_by_file_count() {
        let stack = summarize(
            &files(&["src/a.ts", "src/b.tsx", "scripts/x.py", "README.md", "lib.rs", "c.ts"]),
            None,
        );
        assert_eq!(stack.languages, vec!["TypeScript", "Python", "Rust"]);
        assert_eq!(stack.package_manager, None);
    }

    #[test]
    fn manifest_feeds_frameworks_tools_and_tests() {
        let manifest = PackageJson {
            package_manager: Some("pnpm@9.1.0".into()),
            dependencies: BTreeMap::from([
                ("react".to_string(), "^18".to_string()),
                ("next".to_string(), "14".to_string()),
            ]),
            dev_dependencies: BTreeMap::from([
                ("vitest".to_string(), "^1".to_string()),
                ("typescript".to_string(), "^5".to_string()),
            ]),
            ..PackageJson::default()
        };

        let stack = summarize(&files(&["package.json", "Dockerfile"]), Some(&manifest));
        assert_eq!(stack.frameworks, vec!["Next.js", "React"]);
        assert_eq!(stack.testing, vec!["Vitest"]);
        assert_eq!(stack.build_tools, vec!["Docker", "TypeScript compiler"]);
        assert_eq!(stack.package_manager.as_deref(), Some("pnpm"));
        assert_eq!(stack.dependencies, vec!["next", "react"]);
        assert_eq!(stack.dev_dependencies, vec!["typescript", "vitest"]);
    }

    #[test]
    fn manifest_without_package_manager_defaults_to_npm() {
        let stack = summarize(&[], Some(&PackageJson::default()));
        assert_eq!(stack.package_manager.as_deref(), Some("npm"));
    }
}

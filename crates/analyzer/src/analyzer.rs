use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, Result};
use crate::manifest::{FsManifestReader, ManifestReader};
use crate::snapshot::{JsonFileSnapshotSink, SnapshotSink};
use crate::tech_stack;
use codebrief_insights::{InsightExtractor, StructuredCompletion};
use codebrief_protocol::{CodeInsights, FileMetadata, ProjectContext, CONTEXT_SCHEMA_VERSION};
use codebrief_scanner::{prioritize, ContentCollector, FileScanner, FileSystem, TokenCounter};
use codebrief_syntax::{GenericAstNode, Language, SyntaxParser};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::Semaphore;

/// Drives discovery, budgeting, parsing and extraction for one project.
pub struct ProjectAnalyzer {
    fs: Arc<dyn FileSystem>,
    counter: Arc<dyn TokenCounter>,
    scanner: FileScanner,
    collector: ContentCollector,
    parser: SyntaxParser,
    extractor: InsightExtractor,
    manifest: Arc<dyn ManifestReader>,
    sink: Option<Arc<dyn SnapshotSink>>,
    config: AnalyzerConfig,
}

impl ProjectAnalyzer {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        counter: Arc<dyn TokenCounter>,
        completion: Arc<dyn StructuredCompletion>,
        config: AnalyzerConfig,
    ) -> Self {
        Self {
            scanner: FileScanner::with_options(fs.clone(), config.scan.clone()),
            collector: ContentCollector::new(fs.clone(), counter.clone()),
            manifest: Arc::new(FsManifestReader::new(fs.clone())),
            sink: config
                .write_snapshot
                .then(|| Arc::new(JsonFileSnapshotSink::new()) as Arc<dyn SnapshotSink>),
            parser: match config.parse_timeout {
                Some(timeout) => SyntaxParser::default().with_timeout(timeout),
                None => SyntaxParser::default(),
            },
            extractor: InsightExtractor::new(completion),
            fs,
            counter,
            config,
        }
    }

    pub fn with_parser(mut self, parser: SyntaxParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_extractor(mut self, extractor: InsightExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_manifest_reader(mut self, manifest: Arc<dyn ManifestReader>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Replace the snapshot sink; `None` disables persistence.
    pub fn with_snapshot_sink(mut self, sink: Option<Arc<dyn SnapshotSink>>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the project containing `paths`.
    ///
    /// Fails only before extraction starts: no paths, discovery failure,
    /// nothing analyzable, or nothing fitting the token ceiling. Files that
    /// fail to parse or extract are logged and absent from `code_insights`.
    pub async fn analyze_project(&self, paths: &[PathBuf]) -> Result<ProjectContext> {
        let started = Instant::now();
        let root = self.resolve_root(paths).await?;
        log::info!("Analyzing {}", root.display());

        let discovered = if paths.len() == 1 && paths[0] == root {
            self.scanner.discover(&root).await?
        } else {
            self.scanner.discover_paths(&root, paths).await?
        };
        let described = self.scanner.describe(&root, &discovered).await;
        if described.is_empty() {
            return Err(AnalyzerError::NoAnalyzableFiles(root));
        }

        let ordered = prioritize(described);
        let ceiling = self
            .config
            .effective_ceiling(self.counter.context_window_size());
        let collected = self.collector.collect(&ordered, &root, ceiling).await?;

        let package_json = self.manifest.read_manifest(&root).await;
        let tech_stack = tech_stack::summarize(&ordered, package_json.as_ref());

        let parsed = self.parse_files(&collected.files, &collected.sources);
        log::info!(
            "Parsed {} of {} collected files",
            parsed.len(),
            collected.files.len()
        );

        let code_insights = self.extract_all(parsed).await;
        log::info!(
            "Extracted insights for {} files in {:.2?}",
            code_insights.len(),
            started.elapsed()
        );

        let context = ProjectContext {
            schema_version: CONTEXT_SCHEMA_VERSION,
            project_root_path: root.display().to_string(),
            tech_stack,
            package_json,
            code_insights,
            files: collected.files,
            content: collected.content,
            total_tokens: collected.total_tokens,
            generated_at_unix_ms: unix_now_ms(),
        };

        if let Some(sink) = &self.sink {
            match sink.persist(&context).await {
                Ok(path) => log::info!("Wrote snapshot to {}", path.display()),
                Err(e) => log::warn!("Snapshot not written: {e}"),
            }
        }

        Ok(context)
    }

    async fn resolve_root(&self, paths: &[PathBuf]) -> Result<PathBuf> {
        if let Some(root) = &self.config.project_root {
            if paths.is_empty() {
                return Err(AnalyzerError::NoPaths);
            }
            return Ok(root.clone());
        }

        let first = paths.first().ok_or(AnalyzerError::NoPaths)?;
        // A missing path becomes the root so discovery reports it.
        if !self.fs.exists(first).await || self.fs.is_directory(first).await.unwrap_or(false) {
            return Ok(first.clone());
        }
        Ok(first
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| first.clone()))
    }

    /// Sequential, over the text the collector already read. Only files
    /// with a bundled grammar are parsed.
    fn parse_files(
        &self,
        files: &[FileMetadata],
        sources: &[String],
    ) -> Vec<(String, GenericAstNode)> {
        let mut parsed = Vec::new();
        for (file, source) in files.iter().zip(sources) {
            let Some(language) = Language::from_path(&file.path) else {
                log::debug!("No grammar for {}, skipping parse", file.path);
                continue;
            };

            match self.parser.parse(source, language) {
                Ok(tree) => parsed.push((file.path.clone(), tree)),
                Err(e) => log::warn!("Failed to parse {}: {e}", file.path),
            }
        }
        parsed
    }

    /// Spawn one extraction per file, wait for all of them, then fold the
    /// successes. Results are matched to files by spawn index.
    async fn extract_all(
        &self,
        parsed: Vec<(String, GenericAstNode)>,
    ) -> BTreeMap<String, CodeInsights> {
        let limiter = self
            .config
            .extraction_limit()
            .map(|limit| Arc::new(Semaphore::new(limit)));

        let mut paths = Vec::with_capacity(parsed.len());
        let mut handles = Vec::with_capacity(parsed.len());
        for (path, tree) in parsed {
            let extractor = self.extractor.clone();
            let limiter = limiter.clone();
            let task_path = path.clone();
            handles.push(tokio::spawn(async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire_owned().await.ok(),
                    None => None,
                };
                extractor.analyze(&tree, &task_path).await
            }));
            paths.push(path);
        }

        let outcomes = join_all(handles).await;

        let mut insights = BTreeMap::new();
        for (path, outcome) in paths.into_iter().zip(outcomes) {
            match outcome {
                Ok(Ok(file_insights)) => {
                    insights.insert(path, file_insights);
                }
                Ok(Err(e)) => log::warn!("Insight extraction failed for {path}: {e}"),
                Err(e) => log::warn!("Insight extraction task for {path} aborted: {e}"),
            }
        }
        insights
    }
}

fn unix_now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

use async_trait::async_trait;
use codebrief_analyzer::{AnalyzerConfig, AnalyzerError, ProjectAnalyzer, SnapshotSink};
use codebrief_insights::{CompletionOptions, ProviderError, StructuredCompletion};
use codebrief_protocol::{CodeInsights, FunctionInsight, ImportInsight, ProjectContext};
use codebrief_scanner::{
    format_block, DirEntry, FileSystem, FsResult, HeuristicTokenCounter, LocalFileSystem,
    MemoryFileSystem,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

enum Scripted {
    Reply(Value),
    Fail(ProviderError),
    Panic,
}

/// Answers per file, keyed by the `File: <path>` line of the prompt.
#[derive(Default)]
struct StubCompletion {
    replies: HashMap<String, Scripted>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl StubCompletion {
    fn reply(mut self, path: &str, value: Value) -> Self {
        self.replies.insert(path.to_string(), Scripted::Reply(value));
        self
    }

    fn fail(mut self, path: &str, err: ProviderError) -> Self {
        self.replies.insert(path.to_string(), Scripted::Fail(err));
        self
    }

    fn panic_on(mut self, path: &str) -> Self {
        self.replies.insert(path.to_string(), Scripted::Panic);
        self
    }
}

fn prompt_path(prompt: &str) -> String {
    prompt
        .lines()
        .find_map(|line| line.strip_prefix("File: "))
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl StructuredCompletion for StubCompletion {
    async fn complete_structured(
        &self,
        prompt: &str,
        _schema: &Value,
        _options: &CompletionOptions,
    ) -> Result<Value, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(&prompt_path(prompt)) {
            Some(Scripted::Reply(value)) => Ok(value.clone()),
            Some(Scripted::Fail(err)) => Err(err.clone()),
            Some(Scripted::Panic) => panic!("stub exploded"),
            None => Ok(json!({"functions": [], "classes": [], "imports": []})),
        }
    }
}

fn config() -> AnalyzerConfig {
    AnalyzerConfig {
        write_snapshot: false,
        ..AnalyzerConfig::default()
    }
}

fn analyzer(fs: MemoryFileSystem, stub: Arc<StubCompletion>, config: AnalyzerConfig) -> ProjectAnalyzer {
    ProjectAnalyzer::new(
        Arc::new(fs),
        Arc::new(HeuristicTokenCounter::default()),
        stub,
        config,
    )
}

fn add_insights() -> Value {
    json!({
        "functions": [{"name": "add", "parameters": ["a", "b"]}],
        "classes": [],
        "imports": [{"source": "./y"}],
    })
}

const PACKAGE_JSON: &str = r#"{"name": "demo", "dependencies": {"react": "^18.2.0"}}"#;
const A_TS: &str = "import {x} from './y'\nfunction add(a,b){}\n";

#[tokio::test]
async fn manifest_and_source_file_end_to_end() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/package.json", PACKAGE_JSON)
        .with_file("/p/src/a.ts", A_TS);
    let stub = Arc::new(StubCompletion::default().reply("src/a.ts", add_insights()));

    let context = analyzer(fs, stub.clone(), config())
        .analyze_project(&[PathBuf::from("/p")])
        .await
        .unwrap();

    let included: Vec<&str> = context.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(included, vec!["package.json", "src/a.ts"]);
    assert_eq!(
        context.content,
        format!(
            "{}{}",
            format_block("package.json", PACKAGE_JSON),
            format_block("src/a.ts", A_TS)
        )
    );

    assert_eq!(context.code_insights.len(), 1);
    assert_eq!(
        context.code_insights["src/a.ts"],
        CodeInsights {
            functions: vec![FunctionInsight {
                name: "add".into(),
                parameters: vec!["a".into(), "b".into()],
            }],
            classes: vec![],
            imports: vec![ImportInsight::new("./y")],
        }
    );

    assert_eq!(context.project_root_path, "/p");
    assert_eq!(
        context.package_json.as_ref().and_then(|p| p.name.as_deref()),
        Some("demo")
    );
    assert_eq!(context.tech_stack.languages, vec!["TypeScript"]);
    assert_eq!(context.tech_stack.frameworks, vec!["React"]);
    // package.json has no grammar, so only one extraction ran.
    assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn per_file_failures_only_remove_that_file() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/src/ok.ts", "export function ok(a) {}\n")
        .with_file("/p/src/also_ok.py", "def also(x):\n    pass\n")
        .with_file("/p/src/provider_down.ts", "function down() {}\n")
        .with_file("/p/src/null_answer.ts", "function nothing() {}\n")
        .with_file("/p/src/garbage.rs", "fn garbage() {}\n")
        .with_file("/p/src/panics.js", "function boom() {}\n")
        .with_file("/p/src/blank.ts", "   \n\n")
        .with_file("/p/src/unreadable.ts", "function hidden() {}\n")
        .with_unreadable("/p/src/unreadable.ts")
        .with_file("/p/docs/notes.md", "# notes\n");

    let ok = json!({"functions": [{"name": "ok", "parameters": ["a"]}], "classes": [], "imports": []});
    let also = json!({"functions": [{"name": "also", "parameters": ["x"]}], "classes": [], "imports": []});
    let stub = Arc::new(
        StubCompletion::default()
            .reply("src/ok.ts", ok.clone())
            .reply("src/also_ok.py", also.clone())
            .fail(
                "src/provider_down.ts",
                ProviderError::ApiError {
                    status_code: 503,
                    message: "unavailable".into(),
                },
            )
            .reply("src/null_answer.ts", Value::Null)
            .reply("src/garbage.rs", json!({"functions": "not a list"}))
            .panic_on("src/panics.js"),
    );

    let context = analyzer(fs, stub.clone(), config())
        .analyze_project(&[PathBuf::from("/p")])
        .await
        .unwrap();

    let keys: Vec<&str> = context.code_insights.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["src/also_ok.py", "src/ok.ts"]);
    assert_eq!(
        serde_json::to_value(&context.code_insights["src/ok.ts"]).unwrap(),
        ok
    );
    assert_eq!(
        serde_json::to_value(&context.code_insights["src/also_ok.py"]).unwrap(),
        also
    );
    // Six files parsed (blank and unreadable did not), six extractions ran.
    assert_eq!(stub.calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn empty_path_list_is_rejected() {
    let fs = MemoryFileSystem::new().with_file("/p/a.ts", "function a() {}");
    let err = analyzer(fs, Arc::new(StubCompletion::default()), config())
        .analyze_project(&[])
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::NoPaths));
}

#[tokio::test]
async fn missing_root_is_a_discovery_error() {
    let fs = MemoryFileSystem::new().with_file("/p/a.ts", "function a() {}");
    let err = analyzer(fs, Arc::new(StubCompletion::default()), config())
        .analyze_project(&[PathBuf::from("/nowhere")])
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::Discovery(_)));
}

#[tokio::test]
async fn nothing_analyzable_is_reported() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/node_modules/react/index.js", "module.exports = {}")
        .with_file("/p/logo.png", "binary")
        .with_file("/p/yarn.lock", "lock");
    let err = analyzer(fs, Arc::new(StubCompletion::default()), config())
        .analyze_project(&[PathBuf::from("/p")])
        .await
        .unwrap_err();
    assert!(matches!(err, AnalyzerError::NoAnalyzableFiles(root) if root == Path::new("/p")));
}

#[tokio::test]
async fn ceiling_below_every_file_is_no_content() {
    let fs = MemoryFileSystem::new().with_file("/p/src/a.ts", A_TS);
    let stub = Arc::new(StubCompletion::default());
    let err = analyzer(
        fs,
        stub.clone(),
        AnalyzerConfig {
            token_ceiling: Some(3),
            ..config()
        },
    )
    .analyze_project(&[PathBuf::from("/p")])
    .await
    .unwrap_err();

    assert!(matches!(err, AnalyzerError::NoContent(_)));
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn only_budgeted_files_are_extracted() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/src/small.ts", "function s() {}\n")
        .with_file("/p/src/large.ts", format!("function l() {{}}\n{}", "// pad\n".repeat(200)));
    let stub = Arc::new(StubCompletion::default());
    let ceiling = HeuristicTokenCounter::estimate(&format_block("src/small.ts", "function s() {}\n"));

    let context = analyzer(
        fs,
        stub.clone(),
        AnalyzerConfig {
            token_ceiling: Some(ceiling),
            ..config()
        },
    )
    .analyze_project(&[PathBuf::from("/p")])
    .await
    .unwrap();

    let keys: Vec<&str> = context.code_insights.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["src/small.ts"]);
    assert_eq!(context.total_tokens, ceiling);
}

#[tokio::test]
async fn explicit_entry_points_limit_discovery() {
    let fs = MemoryFileSystem::new()
        .with_file("/p/package.json", PACKAGE_JSON)
        .with_file("/p/src/a.ts", A_TS)
        .with_file("/p/tools/gen.ts", "function gen() {}\n");
    let stub = Arc::new(StubCompletion::default());

    let context = analyzer(
        fs,
        stub,
        AnalyzerConfig {
            project_root: Some(PathBuf::from("/p")),
            ..config()
        },
    )
    .analyze_project(&[PathBuf::from("src"), PathBuf::from("package.json")])
    .await
    .unwrap();

    let included: Vec<&str> = context.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(included, vec!["package.json", "src/a.ts"]);
}

#[tokio::test]
async fn extraction_concurrency_can_be_bounded() {
    let mut fs = MemoryFileSystem::new();
    for i in 0..6 {
        fs = fs.with_file(format!("/p/src/f{i}.ts"), format!("function f{i}() {{}}\n"));
    }
    let stub = Arc::new(StubCompletion {
        delay: Some(Duration::from_millis(20)),
        ..StubCompletion::default()
    });

    let context = analyzer(
        fs,
        stub.clone(),
        AnalyzerConfig {
            max_concurrent_extractions: Some(2),
            ..config()
        },
    )
    .analyze_project(&[PathBuf::from("/p")])
    .await
    .unwrap();

    assert_eq!(context.code_insights.len(), 6);
    assert!(stub.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn file_past_the_parse_timeout_is_left_out() {
    let slow = "let total = values.map((v) => v * 2).filter(Boolean);\n".repeat(5_000);
    let fs = MemoryFileSystem::new().with_file("/p/src/slow.js", slow);
    let stub = Arc::new(StubCompletion::default());

    let context = analyzer(
        fs,
        stub.clone(),
        AnalyzerConfig {
            parse_timeout: Some(Duration::from_micros(1)),
            ..config()
        },
    )
    .analyze_project(&[PathBuf::from("/p")])
    .await
    .unwrap();

    assert_eq!(context.files.len(), 1);
    assert!(context.code_insights.is_empty());
    assert_eq!(stub.calls.load(Ordering::SeqCst), 0);
}

/// Counts `read_file` calls per path.
struct CountingFs {
    inner: MemoryFileSystem,
    reads: Mutex<HashMap<PathBuf, usize>>,
}

#[async_trait]
impl FileSystem for CountingFs {
    async fn read_file(&self, path: &Path) -> FsResult<String> {
        *self.reads.lock().unwrap().entry(path.to_path_buf()).or_default() += 1;
        self.inner.read_file(path).await
    }

    async fn read_dir(&self, path: &Path) -> FsResult<Vec<DirEntry>> {
        self.inner.read_dir(path).await
    }

    async fn is_directory(&self, path: &Path) -> FsResult<bool> {
        self.inner.is_directory(path).await
    }

    async fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path).await
    }

    async fn file_size(&self, path: &Path) -> FsResult<u64> {
        self.inner.file_size(path).await
    }
}

#[tokio::test]
async fn source_files_are_read_once() {
    let fs = Arc::new(CountingFs {
        inner: MemoryFileSystem::new()
            .with_file("/p/src/a.ts", A_TS)
            .with_file("/p/src/b.py", "def b(x):\n    pass\n"),
        reads: Mutex::new(HashMap::new()),
    });
    let stub = Arc::new(StubCompletion::default());

    let context = ProjectAnalyzer::new(
        fs.clone(),
        Arc::new(HeuristicTokenCounter::default()),
        stub,
        config(),
    )
    .analyze_project(&[PathBuf::from("/p")])
    .await
    .unwrap();

    assert_eq!(context.code_insights.len(), 2);
    let reads = fs.reads.lock().unwrap();
    assert_eq!(reads.get(Path::new("/p/src/a.ts")), Some(&1));
    assert_eq!(reads.get(Path::new("/p/src/b.py")), Some(&1));
}

#[derive(Default)]
struct RecordingSink {
    seen: Mutex<Vec<ProjectContext>>,
    fail: bool,
}

#[async_trait]
impl SnapshotSink for RecordingSink {
    async fn persist(
        &self,
        context: &ProjectContext,
    ) -> Result<PathBuf, codebrief_analyzer::SnapshotError> {
        self.seen.lock().unwrap().push(context.clone());
        if self.fail {
            return Err(codebrief_analyzer::SnapshotError::Serialize(
                serde_json::from_str::<Value>("{").unwrap_err(),
            ));
        }
        Ok(PathBuf::from("/snapshots/context.json"))
    }
}

#[tokio::test]
async fn snapshot_failure_does_not_fail_the_run() {
    let fs = MemoryFileSystem::new().with_file("/p/src/a.ts", A_TS);
    let sink = Arc::new(RecordingSink {
        fail: true,
        ..RecordingSink::default()
    });

    let context = analyzer(fs, Arc::new(StubCompletion::default()), config())
        .with_snapshot_sink(Some(sink.clone()))
        .analyze_project(&[PathBuf::from("/p")])
        .await
        .unwrap();

    let seen = sink.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0], context);
}

#[tokio::test]
async fn default_sink_writes_into_the_project() {
    let temp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(temp.path().join("src")).unwrap();
    std::fs::write(temp.path().join("package.json"), PACKAGE_JSON).unwrap();
    std::fs::write(temp.path().join("src/a.ts"), A_TS).unwrap();
    let stub = Arc::new(StubCompletion::default().reply("src/a.ts", add_insights()));

    let analyzer = ProjectAnalyzer::new(
        Arc::new(LocalFileSystem),
        Arc::new(HeuristicTokenCounter::default()),
        stub,
        AnalyzerConfig::default(),
    );
    let context = analyzer
        .analyze_project(&[temp.path().to_path_buf()])
        .await
        .unwrap();

    let snapshot = temp.path().join(".codebrief/project-context.json");
    let written: ProjectContext =
        serde_json::from_slice(&std::fs::read(snapshot).unwrap()).unwrap();
    assert_eq!(written, context);
    assert!(written.code_insights.contains_key("src/a.ts"));
}

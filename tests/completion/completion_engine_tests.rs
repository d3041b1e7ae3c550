//! 补全引擎功能测试

use async_trait::async_trait;
use cliflow_lib::completion::{
    CompletionContext, CompletionEngine, CompletionEngineConfig, CompletionResult, ShellCommand,
    ShellOutput, ShellRunner, SimpleCompletionRequest, Spec, SuggestionType,
};
use cliflow_lib::completion::metadata::parse_spec_document;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// 记录收到的命令，按固定输出应答
struct SpyRunner {
    stdout: String,
    commands: Mutex<Vec<ShellCommand>>,
}

impl SpyRunner {
    fn new(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            commands: Mutex::new(Vec::new()),
        }
    }

    fn commands(&self) -> Vec<ShellCommand> {
        self.commands.lock().clone()
    }
}

#[async_trait]
impl ShellRunner for SpyRunner {
    async fn run(&self, command: &ShellCommand) -> CompletionResult<ShellOutput> {
        self.commands.lock().push(command.clone());
        Ok(ShellOutput {
            stdout: self.stdout.clone(),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

fn engine_with(runner: Arc<SpyRunner>) -> CompletionEngine {
    CompletionEngine::with_shell_runner(CompletionEngineConfig::default(), runner).unwrap()
}

fn names(items: &[cliflow_lib::completion::Suggestion]) -> Vec<&str> {
    items.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
async fn test_subcommand_prefix_completion() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    let context = CompletionContext::from_command_line("git chec", None, "/tmp");

    let items = engine.get_completions(&context).await;

    assert_eq!(names(&items), vec!["checkout"]);
    assert_eq!(items[0].suggestion_type, Some(SuggestionType::Subcommand));
}

#[tokio::test]
async fn test_branch_generator_output() {
    let runner = Arc::new(SpyRunner::new(
        "main\tabc123\torigin/main\nfeature/login\tdef456\t\n",
    ));
    let engine = engine_with(Arc::clone(&runner));
    let context = CompletionContext::from_command_line("git checkout ", None, "/repo");

    let items = engine.get_completions(&context).await;

    // 分支在前，选项在后
    assert_eq!(
        names(&items),
        vec!["main", "feature/login", "-b", "--force"]
    );
    assert_eq!(items[0].description.as_deref(), Some("abc123 → origin/main"));
    assert_eq!(items[1].description.as_deref(), Some("def456"));
    assert_eq!(items[0].suggestion_type, Some(SuggestionType::Argument));
    assert_eq!(items[2].suggestion_type, Some(SuggestionType::Option));

    let commands = runner.commands();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].command.starts_with("git branch"));
    assert_eq!(commands[0].cwd, "/repo");
}

#[tokio::test]
async fn test_generator_results_are_cached() {
    let runner = Arc::new(SpyRunner::new("main\tabc\t\n"));
    let engine = engine_with(Arc::clone(&runner));
    let context = CompletionContext::from_command_line("git checkout ", None, "/repo");

    let first = engine.get_completions(&context).await;
    let second = engine.get_completions(&context).await;

    assert_eq!(first, second);
    assert_eq!(runner.commands().len(), 1);

    // 清空缓存后重新执行
    engine.clear_cache();
    engine.get_completions(&context).await;
    assert_eq!(runner.commands().len(), 2);
}

#[tokio::test]
async fn test_unknown_command_falls_back_to_names() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));

    let none = engine
        .get_completions(&CompletionContext::from_command_line("gti", None, "/tmp"))
        .await;
    assert!(none.is_empty());

    let items = engine
        .get_completions(&CompletionContext::from_command_line("do", None, "/tmp"))
        .await;
    assert_eq!(names(&items), vec!["docker"]);
    assert_eq!(items[0].priority, Some(100));
    assert_eq!(items[0].suggestion_type, Some(SuggestionType::Subcommand));
    assert_eq!(items[0].description.as_deref(), Some("Container runtime"));
}

#[tokio::test]
async fn test_empty_tokens_list_all_commands() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    let context = CompletionContext::new(Vec::new(), 0, "/tmp");

    let items = engine.get_completions(&context).await;
    let specs = engine.get_available_specs().await;

    assert_eq!(names(&items), specs.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(specs.contains(&"git".to_string()));
}

#[tokio::test]
async fn test_completion_is_idempotent() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    let context = CompletionContext::from_command_line("git st", None, "/tmp");

    let first = engine.get_completions(&context).await;
    let second = engine.get_completions(&context).await;

    assert_eq!(first, second);
    // 名称更短的前缀匹配得分更高
    assert_eq!(names(&first), vec!["stash", "status"]);
}

#[tokio::test]
async fn test_registered_spec_overrides_builtin() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    engine.initialize().await;
    engine.register_spec(
        Spec::new("git")
            .with_description("custom git")
            .with_subcommand(Spec::new("sync")),
    );

    let items = engine
        .get_completions(&CompletionContext::from_command_line("git ", None, "/tmp"))
        .await;
    assert_eq!(names(&items), vec!["sync"]);

    let count = engine.get_spec_count().await;
    assert_eq!(count.builtin, 8);
    assert_eq!(count.total, 8);
}

#[tokio::test]
async fn test_option_completion() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    let context = CompletionContext::from_command_line("git commit --am", None, "/tmp");

    let items = engine.get_completions(&context).await;

    assert_eq!(names(&items), vec!["--amend"]);
    assert_eq!(items[0].suggestion_type, Some(SuggestionType::Option));
}

#[tokio::test]
async fn test_simple_request() {
    let engine = engine_with(Arc::new(SpyRunner::new("")));
    let request = SimpleCompletionRequest {
        command: "npm".to_string(),
        tokens: vec!["npm".to_string(), "ins".to_string()],
        current_token: "ins".to_string(),
        cwd: "/tmp".to_string(),
        cursor_position: 7,
    };

    let items = engine.get_completions_simple(request).await;

    assert_eq!(names(&items), vec!["install", "uninstall"]);
}

#[tokio::test]
async fn test_completions_dir_is_discovered() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("deploy.json"),
        r#"{ "name": "deploy", "description": "Ship it", "subcommands": [{ "name": "staging" }, { "name": "production" }] }"#,
    )
    .unwrap();

    let config = CompletionEngineConfig::default().with_completions_dir(dir.path());
    let engine = CompletionEngine::with_shell_runner(config, Arc::new(SpyRunner::new(""))).unwrap();

    let count = engine.get_spec_count().await;
    assert_eq!(count.dynamic, 1);

    let items = engine
        .get_completions(&CompletionContext::from_command_line("deploy st", None, "/tmp"))
        .await;
    assert_eq!(names(&items), vec!["staging"]);

    // 加载后出现在已加载规范中，可提供描述
    let fallback = engine
        .get_completions(&CompletionContext::from_command_line("dep", None, "/tmp"))
        .await;
    assert_eq!(fallback[0].description.as_deref(), Some("Ship it"));
}

#[test]
fn test_config_defaults() {
    let config = CompletionEngineConfig::default();

    assert_eq!(config.generator_timeout(), Duration::from_millis(1500));
    assert_eq!(config.generator_cache_ttl(), Duration::from_millis(5000));
    assert_eq!(config.generator_cache_capacity, 1000);
    assert_eq!(config.max_output_bytes, 1024 * 1024);
    assert_eq!(config.shell, "sh");
    assert!(config.completions_dir.is_none());
}

#[tokio::test]
async fn test_config_file_overrides_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{ "generatorTimeoutMs": 250, "shell": "bash", "homeDir": "/home/u" }"#,
    )
    .unwrap();

    let config = CompletionEngineConfig::load_from_file(&path).await.unwrap();

    assert_eq!(config.generator_timeout_ms, 250);
    assert_eq!(config.shell, "bash");
    assert_eq!(config.home_dir.as_deref(), Some("/home/u"));
    // 未写出的字段保持默认值
    assert_eq!(config.generator_cache_ttl_ms, 5000);
}

#[tokio::test]
async fn test_config_file_missing() {
    let result = CompletionEngineConfig::load_from_file("/nonexistent/cliflow.json").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_generate_spec_script_adds_subcommands() {
    let runner = Arc::new(SpyRunner::new("alpha\n\nbeta\n"));
    let engine = engine_with(Arc::clone(&runner));
    let spec = parse_spec_document(
        r#"{ "name": "tool", "generateSpec": { "script": "list-stages" } }"#,
        Path::new("tool.json"),
    )
    .unwrap();
    engine.register_spec(spec);

    let all = engine
        .get_completions(&CompletionContext::from_command_line("tool ", None, "/tmp"))
        .await;
    assert_eq!(names(&all), vec!["alpha", "beta"]);
    assert!(all
        .iter()
        .all(|s| s.suggestion_type == Some(SuggestionType::Subcommand)));

    let filtered = engine
        .get_completions(&CompletionContext::from_command_line("tool al", None, "/tmp"))
        .await;
    assert_eq!(names(&filtered), vec!["alpha"]);

    // 展开结果被记忆，脚本只执行一次
    assert_eq!(runner.commands().len(), 1);
    assert_eq!(runner.commands()[0].command, "list-stages");
}

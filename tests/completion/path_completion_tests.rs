//! 路径补全测试

use async_trait::async_trait;
use cliflow_lib::completion::providers::filesystem::unescape_path;
use cliflow_lib::completion::{
    CompletionContext, CompletionEngine, CompletionEngineConfig, CompletionResult, PathCompleter,
    ShellCommand, ShellOutput, ShellRunner, SuggestionType,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

struct NoShell;

#[async_trait]
impl ShellRunner for NoShell {
    async fn run(&self, _command: &ShellCommand) -> CompletionResult<ShellOutput> {
        Ok(ShellOutput::failure("shell disabled"))
    }
}

/// 主目录结构：foo/、foobar、.env、foo/inner.txt、"my dir"/
fn home() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("foo")).unwrap();
    fs::write(dir.path().join("foo/inner.txt"), "").unwrap();
    fs::write(dir.path().join("foobar"), "").unwrap();
    fs::write(dir.path().join(".env"), "").unwrap();
    fs::create_dir(dir.path().join("my dir")).unwrap();
    dir
}

fn path_of(dir: &TempDir) -> String {
    dir.path().to_string_lossy().into_owned()
}

#[tokio::test]
async fn test_partial_name_lists_files_and_folders() {
    let home = home();
    let completer = PathCompleter::new();

    let items = completer.complete(&path_of(&home), "fo", true, true).await;

    let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["foo/", "foobar"]);
    assert_eq!(items[0].suggestion_type, Some(SuggestionType::Folder));
    assert_eq!(items[1].suggestion_type, Some(SuggestionType::File));
    assert_eq!(items[0].insert_value.as_deref(), Some("foo/"));
    assert_eq!(items[1].insert_value.as_deref(), Some("foobar"));
}

#[tokio::test]
async fn test_dotfiles_need_dot_prefix() {
    let home = home();
    let completer = PathCompleter::new();

    let all = completer.complete(&path_of(&home), "", true, true).await;
    assert!(all.iter().all(|s| !s.name.starts_with('.')));
    assert_eq!(all.len(), 3);

    let hidden = completer.complete(&path_of(&home), ".", true, true).await;
    let names: Vec<_> = hidden.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![".env"]);
}

#[tokio::test]
async fn test_folders_only() {
    let home = home();
    let completer = PathCompleter::new();

    let items = completer.complete(&path_of(&home), "fo", false, true).await;

    let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["foo/"]);
}

#[tokio::test]
async fn test_trailing_slash_lists_directory() {
    let home = home();
    let completer = PathCompleter::new();

    let items = completer.complete(&path_of(&home), "foo/", true, true).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "inner.txt");
    assert_eq!(items[0].insert_value.as_deref(), Some("foo/inner.txt"));
}

#[tokio::test]
async fn test_tilde_expands_to_home() {
    let home = home();
    let completer = PathCompleter::new().with_home_dir(path_of(&home));

    let items = completer.complete("/", "~/foob", true, true).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "foobar");
    assert_eq!(items[0].insert_value.as_deref(), Some("~/foobar"));
}

#[tokio::test]
async fn test_escaped_space_in_partial() {
    let home = home();
    let completer = PathCompleter::new();

    let items = completer.complete(&path_of(&home), "my\\ d", true, true).await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "my dir/");
    assert_eq!(unescape_path("my\\ dir"), "my dir");
}

#[tokio::test]
async fn test_missing_directory_yields_empty() {
    let completer = PathCompleter::new();

    let items = completer
        .complete("/nonexistent/cliflow", "abc", true, true)
        .await;

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_engine_path_templates() {
    let home = home();
    let config = CompletionEngineConfig::default().with_home_dir(path_of(&home));
    let engine = CompletionEngine::with_shell_runner(config, Arc::new(NoShell)).unwrap();

    let cd = engine
        .get_completions(&CompletionContext::from_command_line("cd fo", None, path_of(&home)))
        .await;
    let names: Vec<_> = cd.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["foo/"]);

    let cat = engine
        .get_completions(&CompletionContext::from_command_line("cat ~/fo", None, "/"))
        .await;
    let names: Vec<_> = cat.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["foobar"]);
}

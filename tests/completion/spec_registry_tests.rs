//! 规范注册表测试：目录发现、排除规则与延迟加载

use cliflow_lib::completion::metadata::registry::load_spec_file;
use cliflow_lib::completion::{CompletionError, Spec, SpecCount, SpecRegistry};
use futures::future::join_all;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn spec_json(name: &str) -> String {
    format!(r#"{{ "name": "{name}", "description": "{name} tool" }}"#)
}

/// 构造一个包含各种需要排除的文件的补全目录
fn completions_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "tool.json", &spec_json("tool"));
    write(root, "aws/s3.json", &spec_json("s3"));
    write(root, "broken.json", "{ \"name\": ");
    write(root, "git.json", &spec_json("git"));
    write(root, "index.json", "{}");
    write(root, "types.json", "{}");
    write(root, "_private.json", &spec_json("private"));
    write(root, ".hidden/secret.json", &spec_json("secret"));
    write(root, "_internal/helper.json", &spec_json("helper"));
    write(root, "README.md", "# completions");

    write(root, "community/kubectx.json", &spec_json("kubectx"));
    write(root, "community/index.json", "{}");
    write(root, "community/git.json", &spec_json("git"));
    write(root, "community/nested/deep.json", &spec_json("deep"));

    dir
}

fn discovered_registry(dir: &TempDir) -> SpecRegistry {
    let registry = SpecRegistry::new();
    registry.register_builtin(vec![Spec::new("git").with_description("builtin git")]);
    registry.discover(dir.path());
    registry
}

#[test]
fn test_discovery_honours_exclusions() {
    let dir = completions_dir();
    let registry = discovered_registry(&dir);

    assert_eq!(
        registry.available_specs(),
        vec!["aws/s3", "broken", "git", "kubectx", "tool"]
    );
    assert_eq!(
        registry.spec_count(),
        SpecCount {
            builtin: 1,
            dynamic: 3,
            community: 1,
            total: 5,
        }
    );
}

#[tokio::test]
async fn test_lazy_loading_moves_spec_into_memory() {
    let dir = completions_dir();
    let registry = discovered_registry(&dir);

    assert!(registry.loaded("tool").is_none());

    let tool = registry.get_spec("tool").await.unwrap();
    assert_eq!(tool.description.as_deref(), Some("tool tool"));
    assert!(registry.loaded("tool").is_some());

    let count = registry.spec_count();
    assert_eq!(count.builtin, 2);
    assert_eq!(count.dynamic, 2);
    assert_eq!(count.total, 5);

    // 再次查询返回同一个实例
    let again = registry.get_spec("tool").await.unwrap();
    assert!(Arc::ptr_eq(&tool, &again));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_lookups_never_miss_loading_spec() {
    for round in 0..50 {
        let dir = completions_dir();
        let registry = Arc::new(discovered_registry(&dir));

        let lookups = (0..16).map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let spec = registry.get_spec("tool").await;
                let listed = registry.available_specs().contains(&"tool".to_string());
                (spec, listed)
            })
        });

        let mut first: Option<Arc<Spec>> = None;
        for result in join_all(lookups).await {
            let (spec, listed) = result.unwrap();
            let spec = spec.unwrap_or_else(|| panic!("round {round}: tool not found"));
            assert!(listed, "round {round}");
            match &first {
                Some(first) => assert!(Arc::ptr_eq(first, &spec), "round {round}"),
                None => first = Some(spec),
            }
        }

        let count = registry.spec_count();
        assert_eq!(count.dynamic, 2, "round {round}");
        assert_eq!(count.total, 5, "round {round}");
    }
}

#[tokio::test]
async fn test_nested_and_community_specs() {
    let dir = completions_dir();
    let registry = discovered_registry(&dir);

    let s3 = registry.get_spec("aws/s3").await.unwrap();
    assert_eq!(s3.name, "s3");

    let kubectx = registry.get_spec("kubectx").await.unwrap();
    assert_eq!(kubectx.name, "kubectx");
    assert_eq!(registry.spec_count().community, 0);

    // 内置规范不会被目录中的同名文件替换
    let git = registry.get_spec("git").await.unwrap();
    assert_eq!(git.description.as_deref(), Some("builtin git"));

    assert!(registry.get_spec("deep").await.is_none());
    assert!(registry.get_spec("secret").await.is_none());
}

#[tokio::test]
async fn test_malformed_spec_disappears_after_lookup() {
    let dir = completions_dir();
    let registry = discovered_registry(&dir);

    assert!(registry.available_specs().contains(&"broken".to_string()));

    assert!(registry.get_spec("broken").await.is_none());

    assert!(!registry.available_specs().contains(&"broken".to_string()));
    assert!(registry.get_spec("broken").await.is_none());
    assert_eq!(registry.spec_count().dynamic, 2);
}

#[tokio::test]
async fn test_load_spec_file_errors() {
    let dir = completions_dir();

    let err = load_spec_file(&dir.path().join("broken.json")).await.unwrap_err();
    assert!(matches!(err, CompletionError::SpecParse { .. }));

    let err = load_spec_file(&dir.path().join("missing.json")).await.unwrap_err();
    assert!(matches!(err, CompletionError::Io { .. }));
}

#[test]
fn test_missing_directory_is_empty() {
    let registry = SpecRegistry::new();
    registry.discover(Path::new("/nonexistent/cliflow/completions"));

    assert!(registry.available_specs().is_empty());
    assert_eq!(registry.spec_count().total, 0);
}

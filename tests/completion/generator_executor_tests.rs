//! 生成器执行器测试：并发去重、超时与异常降级

use async_trait::async_trait;
use cliflow_lib::completion::{
    CompletionContext, CompletionResult, Generator, GeneratorExecutor, ShellCommand, ShellOutput,
    ShellRunner, Suggestion,
};
use cliflow_lib::utils::error::AppResult;
use futures::future::join_all;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// 延迟应答并记录命令
struct SlowRunner {
    delay: Duration,
    calls: AtomicUsize,
    commands: Mutex<Vec<String>>,
}

impl SlowRunner {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
            commands: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ShellRunner for SlowRunner {
    async fn run(&self, command: &ShellCommand) -> CompletionResult<ShellOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.commands.lock().push(command.command.clone());
        tokio::time::sleep(self.delay).await;
        Ok(ShellOutput {
            stdout: "alpha\nbeta\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
        })
    }
}

fn context() -> CompletionContext {
    CompletionContext::from_command_line("tool sub ", None, "/work")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_run() {
    let runner = Arc::new(SlowRunner::new(Duration::from_millis(100)));
    let executor = Arc::new(GeneratorExecutor::with_runner(runner.clone()).unwrap());
    let generator = Arc::new(Generator::script("slow-list"));

    let tasks = (0..8).map(|_| {
        let executor = Arc::clone(&executor);
        let generator = Arc::clone(&generator);
        tokio::spawn(async move { executor.execute(&generator, &context()).await })
    });
    let results: Vec<Vec<Suggestion>> = join_all(tasks)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    for items in &results {
        let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
    assert_eq!(executor.in_flight_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_fast_generator_runs_once_per_round() {
    const ROUNDS: usize = 300;
    const CALLERS: usize = 8;

    for round in 0..ROUNDS {
        let runs = Arc::new(AtomicUsize::new(0));
        let executor =
            Arc::new(GeneratorExecutor::with_runner(Arc::new(SlowRunner::new(Duration::ZERO))).unwrap());
        let counter = Arc::clone(&runs);
        let generator = Arc::new(Generator::custom(move |_tokens| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(vec![Suggestion::new("only")]) }
        }));
        let barrier = Arc::new(tokio::sync::Barrier::new(CALLERS));

        let tasks = (0..CALLERS).map(|_| {
            let executor = Arc::clone(&executor);
            let generator = Arc::clone(&generator);
            let barrier = Arc::clone(&barrier);
            tokio::spawn(async move {
                barrier.wait().await;
                executor.execute(&generator, &context()).await
            })
        });
        for result in join_all(tasks).await {
            assert_eq!(result.unwrap().len(), 1);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 1, "round {round}");
    }
}

#[tokio::test]
async fn test_cancelled_caller_does_not_abort_run() {
    let runner = Arc::new(SlowRunner::new(Duration::from_millis(50)));
    let executor = GeneratorExecutor::with_runner(runner.clone()).unwrap();
    let generator = Arc::new(Generator::script("slow-list"));

    // 调用方提前放弃
    let abandoned =
        tokio::time::timeout(Duration::from_millis(5), executor.execute(&generator, &context()))
            .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(100)).await;

    // 后台计算已经完成并写入缓存
    let items = executor.execute(&generator, &context()).await;
    assert_eq!(items.len(), 2);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_panicking_generator_yields_empty() {
    let executor =
        GeneratorExecutor::with_runner(Arc::new(SlowRunner::new(Duration::ZERO))).unwrap();
    let generator = Arc::new(Generator::custom(|_tokens| async move {
        if true {
            panic!("generator bug");
        }
        Ok(Vec::new())
    }));

    let items = executor.execute(&generator, &context()).await;

    assert!(items.is_empty());
    assert_eq!(executor.in_flight_count(), 0);
    assert_eq!(executor.cache_stats().total_entries, 0);
}

#[tokio::test]
async fn test_slow_custom_generator_times_out() {
    let executor =
        GeneratorExecutor::with_runner(Arc::new(SlowRunner::new(Duration::ZERO))).unwrap();
    let generator = Arc::new(
        Generator::custom(|_tokens| async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![Suggestion::new("late")])
        })
        .with_timeout(Duration::from_millis(30)),
    );

    let started = std::time::Instant::now();
    let items = executor.execute(&generator, &context()).await;

    assert!(items.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_custom_generator_receives_tokens() {
    let executor =
        GeneratorExecutor::with_runner(Arc::new(SlowRunner::new(Duration::ZERO))).unwrap();
    let generator = Arc::new(Generator::custom(|tokens: Vec<String>| async move {
        AppResult::Ok(tokens.into_iter().map(Suggestion::new).collect())
    }));

    let items = executor.execute(&generator, &context()).await;
    let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, vec!["tool", "sub", ""]);
}

#[tokio::test]
async fn test_script_with_context_builds_command() {
    let runner = Arc::new(SlowRunner::new(Duration::ZERO));
    let executor = GeneratorExecutor::with_runner(runner.clone()).unwrap();
    let generator = Arc::new(Generator::script_with_context(|tokens| {
        format!("describe {}", tokens[1])
    }));

    executor.execute(&generator, &context()).await;

    assert_eq!(runner.commands.lock().clone(), vec!["describe sub".to_string()]);
}

#[tokio::test]
async fn test_exec_generator_runs_through_shell() {
    let runner = Arc::new(SlowRunner::new(Duration::ZERO));
    let executor = GeneratorExecutor::with_runner(runner.clone()).unwrap();
    let generator = Arc::new(Generator::exec(|_tokens, exec| async move {
        let output = exec.run("first", None).await;
        let more = exec.run("second", Some("/elsewhere")).await;
        Ok(output
            .stdout
            .lines()
            .chain(more.stdout.lines())
            .map(Suggestion::new)
            .collect())
    }));

    let items = executor.execute(&generator, &context()).await;

    assert_eq!(items.len(), 4);
    assert_eq!(
        runner.commands.lock().clone(),
        vec!["first".to_string(), "second".to_string()]
    );
}

#[tokio::test]
async fn test_post_process_error_yields_empty() {
    let runner = Arc::new(SlowRunner::new(Duration::ZERO));
    let executor = GeneratorExecutor::with_runner(runner.clone()).unwrap();
    let generator = Arc::new(
        Generator::script("list")
            .with_post_process(|_, _| Err(anyhow::anyhow!("unexpected output"))),
    );

    assert!(executor.execute(&generator, &context()).await.is_empty());
    assert!(executor.execute(&generator, &context()).await.is_empty());
    assert_eq!(runner.calls.load(Ordering::SeqCst), 2);
}

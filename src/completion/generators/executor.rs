//! 生成器执行器
//!
//! 负责结果缓存与并发去重：同一缓存键同时只会有一次计算在进行，
//! 计算在独立任务中运行，调用方被取消不会中断它。

use super::shell::{ShellCommand, ShellExec, ShellRunner};
use super::{
    Generator, GeneratorSource, PostProcessContext, DEFAULT_GENERATOR_TIMEOUT,
    DEFAULT_GENERATOR_TTL, LINE_SUGGESTION_PRIORITY,
};
use crate::completion::cache::{CacheStats, GeneratorCache};
use crate::completion::error::{CompletionError, CompletionResult};
use crate::completion::types::{CompletionContext, Suggestion, SuggestionType};
use crate::utils::error::AppResult;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type InFlight = Shared<BoxFuture<'static, Vec<Suggestion>>>;

/// 生成器执行器
pub struct GeneratorExecutor {
    cache: Arc<GeneratorCache>,
    in_flight: Arc<DashMap<String, InFlight>>,
    runner: Arc<dyn ShellRunner>,
    default_timeout: Duration,
    max_output_bytes: usize,
}

/// 单次计算需要的全部输入
struct Job {
    key: String,
    generator: Arc<Generator>,
    tokens: Vec<String>,
    cwd: String,
    ttl: Option<Duration>,
    timeout: Duration,
    runner: Arc<dyn ShellRunner>,
    max_output_bytes: usize,
}

impl GeneratorExecutor {
    pub fn new(
        runner: Arc<dyn ShellRunner>,
        cache_capacity: usize,
        default_ttl: Duration,
        default_timeout: Duration,
        max_output_bytes: usize,
    ) -> AppResult<Self> {
        Ok(Self {
            cache: Arc::new(GeneratorCache::new(cache_capacity, default_ttl)?),
            in_flight: Arc::new(DashMap::new()),
            runner,
            default_timeout,
            max_output_bytes,
        })
    }

    /// 使用默认参数创建
    pub fn with_runner(runner: Arc<dyn ShellRunner>) -> AppResult<Self> {
        Self::new(
            runner,
            1000,
            DEFAULT_GENERATOR_TTL,
            DEFAULT_GENERATOR_TIMEOUT,
            super::shell::DEFAULT_MAX_OUTPUT_BYTES,
        )
    }

    /// 缓存键：来源标识 + 工作目录 + 词列表
    pub fn cache_key(generator: &Generator, context: &CompletionContext) -> String {
        format!(
            "gen-{}-{}-{}",
            generator.identity(),
            context.current_working_directory,
            context.tokens.join("\u{0}")
        )
    }

    /// 执行生成器，任何失败都返回空列表
    pub async fn execute(
        &self,
        generator: &Arc<Generator>,
        context: &CompletionContext,
    ) -> Vec<Suggestion> {
        let key = Self::cache_key(generator, context);

        if generator.cache.is_enabled() {
            if let Some(items) = self.cache.get(&key) {
                debug!("生成器缓存命中: {}", key);
                return items;
            }
        }

        let pending = match self.in_flight.entry(key.clone()) {
            Entry::Occupied(entry) => {
                debug!("复用进行中的生成器计算: {}", key);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                // 持有分片锁时再查一次缓存，前一次计算可能刚写完缓存并移出进行中表
                if generator.cache.is_enabled() {
                    if let Some(items) = self.cache.get(&key) {
                        return items;
                    }
                }
                let job = Job {
                    key,
                    generator: Arc::clone(generator),
                    tokens: context.tokens.clone(),
                    cwd: context.current_working_directory.clone(),
                    ttl: generator.cache.effective_ttl(self.cache.default_ttl()),
                    timeout: generator.timeout.unwrap_or(self.default_timeout),
                    runner: Arc::clone(&self.runner),
                    max_output_bytes: self.max_output_bytes,
                };
                let pending = self.spawn(job);
                entry.insert(pending.clone());
                pending
            }
        };

        pending.await
    }

    /// 在独立任务中计算，结束时写缓存并移出进行中表
    fn spawn(&self, job: Job) -> InFlight {
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            let key = job.key.clone();
            let ttl = job.ttl;
            let outcome = AssertUnwindSafe(compute(job)).catch_unwind().await;

            let items = match outcome {
                Ok(Ok(items)) => {
                    if let Some(ttl) = ttl {
                        cache.put_with_ttl(key.clone(), items.clone(), ttl);
                    }
                    items
                }
                Ok(Err(err)) => {
                    debug!("生成器执行失败 {}: {}", key, err);
                    Vec::new()
                }
                Err(_) => {
                    warn!("生成器执行时发生 panic: {}", key);
                    Vec::new()
                }
            };

            in_flight.remove(&key);
            items
        });

        async move {
            handle.await.unwrap_or_else(|err| {
                warn!("生成器任务异常结束: {}", err);
                Vec::new()
            })
        }
        .boxed()
        .shared()
    }

    /// 清空结果缓存
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// 当前进行中的计算数量
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }
}

async fn compute(job: Job) -> CompletionResult<Vec<Suggestion>> {
    let exec = ShellExec::new(
        Arc::clone(&job.runner),
        job.cwd.clone(),
        job.timeout,
        job.max_output_bytes,
    );

    let script = match &job.generator.source {
        GeneratorSource::Exec(run) => {
            return run(job.tokens.clone(), exec).await.map_err(CompletionError::from);
        }
        GeneratorSource::Custom(run) => {
            return tokio::time::timeout(job.timeout, run(job.tokens.clone()))
                .await
                .map_err(|_| CompletionError::GeneratorTimeout {
                    command: "custom generator".to_string(),
                    timeout_ms: job.timeout.as_millis() as u64,
                })?
                .map_err(CompletionError::from);
        }
        GeneratorSource::Script(script) => script.clone(),
        GeneratorSource::ScriptWithContext(build) => build(&job.tokens),
    };

    let request = ShellCommand {
        command: script,
        cwd: job.cwd.clone(),
        timeout: job.timeout,
        max_output_bytes: job.max_output_bytes,
    };
    let output = job.runner.run(&request).await?;

    if !output.success() {
        return Err(CompletionError::Generator(format!(
            "`{}` exited with code {}",
            request.command, output.exit_code
        )));
    }

    match &job.generator.post_process {
        Some(post_process) => {
            let context = PostProcessContext { cwd: job.cwd };
            post_process(&output.stdout, &context).map_err(CompletionError::from)
        }
        None => Ok(split_lines(&output.stdout)),
    }
}

/// 每个非空行生成一个参数建议
fn split_lines(stdout: &str) -> Vec<Suggestion> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            Suggestion::new(line)
                .with_type(SuggestionType::Argument)
                .with_priority(LINE_SUGGESTION_PRIORITY)
        })
        .collect()
}

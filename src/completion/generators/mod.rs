//! 动态补全生成器
//!
//! 生成器在补全时产出建议，来源有四种：固定脚本、依赖词列表的脚本、
//! 拿到 shell 执行器的异步函数、以及只看词列表的异步函数。

pub mod common;
pub mod executor;
pub mod shell;

pub use common::{get_generator, list_generators};
pub use executor::GeneratorExecutor;
pub use shell::{ShellCommand, ShellExec, ShellOutput, ShellRunner, SystemShellRunner};

use crate::completion::types::Suggestion;
use crate::utils::error::AppResult;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// 生成器默认超时
pub const DEFAULT_GENERATOR_TIMEOUT: Duration = Duration::from_millis(1500);

/// 生成器默认缓存时长
pub const DEFAULT_GENERATOR_TTL: Duration = Duration::from_millis(5000);

/// 未提供 postProcess 时按行生成的建议优先级
pub const LINE_SUGGESTION_PRIORITY: i32 = 75;

pub type SuggestionFuture = BoxFuture<'static, AppResult<Vec<Suggestion>>>;
pub type ScriptFn = Arc<dyn Fn(&[String]) -> String + Send + Sync>;
pub type ExecFn = Arc<dyn Fn(Vec<String>, ShellExec) -> SuggestionFuture + Send + Sync>;
pub type CustomFn = Arc<dyn Fn(Vec<String>) -> SuggestionFuture + Send + Sync>;
pub type PostProcessFn =
    Arc<dyn Fn(&str, &PostProcessContext) -> AppResult<Vec<Suggestion>> + Send + Sync>;

/// postProcess 可见的上下文
#[derive(Debug, Clone, Default)]
pub struct PostProcessContext {
    pub cwd: String,
}

/// 生成器的数据来源
#[derive(Clone)]
pub enum GeneratorSource {
    /// 固定脚本
    Script(String),
    /// 由词列表拼出脚本
    ScriptWithContext(ScriptFn),
    /// 自行调用 shell 的异步函数
    Exec(ExecFn),
    /// 只依赖词列表的异步函数
    Custom(CustomFn),
}

/// 结果缓存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    Disabled,
    /// `None` 使用默认 TTL
    Ttl(Option<Duration>),
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Ttl(None)
    }
}

impl CachePolicy {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// 实际生效的 TTL，零值按默认处理
    pub fn effective_ttl(&self, default_ttl: Duration) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Ttl(Some(ttl)) if !ttl.is_zero() => Some(*ttl),
            Self::Ttl(_) => Some(default_ttl),
        }
    }
}

/// 动态补全生成器
#[derive(Clone)]
pub struct Generator {
    pub source: GeneratorSource,
    pub post_process: Option<PostProcessFn>,
    pub cache: CachePolicy,
    pub timeout: Option<Duration>,
}

impl Generator {
    fn from_source(source: GeneratorSource) -> Self {
        Self {
            source,
            post_process: None,
            cache: CachePolicy::default(),
            timeout: None,
        }
    }

    /// 固定脚本生成器
    pub fn script(script: impl Into<String>) -> Self {
        Self::from_source(GeneratorSource::Script(script.into()))
    }

    /// 根据当前词列表拼出脚本
    pub fn script_with_context<F>(build: F) -> Self
    where
        F: Fn(&[String]) -> String + Send + Sync + 'static,
    {
        Self::from_source(GeneratorSource::ScriptWithContext(Arc::new(build)))
    }

    /// 拿到 shell 执行器的异步生成器
    pub fn exec<F, Fut>(run: F) -> Self
    where
        F: Fn(Vec<String>, ShellExec) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Vec<Suggestion>>> + Send + 'static,
    {
        Self::from_source(GeneratorSource::Exec(Arc::new(move |tokens, exec| {
            run(tokens, exec).boxed()
        })))
    }

    /// 只依赖词列表的异步生成器
    pub fn custom<F, Fut>(run: F) -> Self
    where
        F: Fn(Vec<String>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<Vec<Suggestion>>> + Send + 'static,
    {
        Self::from_source(GeneratorSource::Custom(Arc::new(move |tokens| {
            run(tokens).boxed()
        })))
    }

    pub fn with_post_process<F>(mut self, post_process: F) -> Self
    where
        F: Fn(&str, &PostProcessContext) -> AppResult<Vec<Suggestion>> + Send + Sync + 'static,
    {
        self.post_process = Some(Arc::new(post_process));
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = CachePolicy::Ttl(Some(ttl));
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache = CachePolicy::Disabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// 缓存键使用的来源标识：脚本文本或函数地址
    pub fn identity(&self) -> String {
        match &self.source {
            GeneratorSource::Script(script) => script.clone(),
            GeneratorSource::ScriptWithContext(f) => format!("fn@{:p}", Arc::as_ptr(f) as *const ()),
            GeneratorSource::Exec(f) => format!("fn@{:p}", Arc::as_ptr(f) as *const ()),
            GeneratorSource::Custom(f) => format!("fn@{:p}", Arc::as_ptr(f) as *const ()),
        }
    }
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match &self.source {
            GeneratorSource::Script(script) => format!("Script({script:?})"),
            GeneratorSource::ScriptWithContext(_) => "ScriptWithContext(..)".to_string(),
            GeneratorSource::Exec(_) => "Exec(..)".to_string(),
            GeneratorSource::Custom(_) => "Custom(..)".to_string(),
        };
        f.debug_struct("Generator")
            .field("source", &source)
            .field("post_process", &self.post_process.is_some())
            .field("cache", &self.cache)
            .field("timeout", &self.timeout)
            .finish()
    }
}

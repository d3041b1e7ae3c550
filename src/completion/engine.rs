//! 补全引擎核心模块
//!
//! 协调规范注册表、解析器与生成器执行器，提供统一的补全接口。
//! 对外接口从不失败，内部错误降级为空列表或命令名列表。

use crate::completion::config::CompletionEngineConfig;
use crate::completion::error::{CompletionError, CompletionResult};
use crate::completion::generators::{GeneratorExecutor, ShellRunner, SystemShellRunner};
use crate::completion::metadata::builtin::load_builtin_specs;
use crate::completion::metadata::{Spec, SpecCount, SpecRegistry, SpecResolver};
use crate::completion::providers::{ArgumentResolver, PathCompleter};
use crate::completion::types::{
    CompletionContext, ShellKind, SimpleCompletionRequest, Suggestion, SuggestionType,
};
use crate::completion::walker::{TokenWalker, DEFAULT_SUBCOMMAND_PRIORITY};
use crate::utils::error::AppResult;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// 补全引擎
pub struct CompletionEngine {
    /// 配置
    config: CompletionEngineConfig,
    registry: Arc<SpecRegistry>,
    executor: Arc<GeneratorExecutor>,
    resolver: SpecResolver,
    arguments: ArgumentResolver,
    initialized: OnceCell<()>,
}

impl CompletionEngine {
    /// 创建新的补全引擎，生成器通过系统 shell 执行
    pub fn new(config: CompletionEngineConfig) -> AppResult<Self> {
        let runner = Arc::new(SystemShellRunner::new(config.shell.clone()));
        Self::with_shell_runner(config, runner)
    }

    /// 使用指定的命令执行器创建
    pub fn with_shell_runner(
        config: CompletionEngineConfig,
        runner: Arc<dyn ShellRunner>,
    ) -> AppResult<Self> {
        let executor = Arc::new(GeneratorExecutor::new(
            runner,
            config.generator_cache_capacity,
            config.generator_cache_ttl(),
            config.generator_timeout(),
            config.max_output_bytes,
        )?);
        let registry = Arc::new(SpecRegistry::new());

        let paths = match &config.home_dir {
            Some(home) => PathCompleter::new().with_home_dir(home.clone()),
            None => PathCompleter::new(),
        };

        Ok(Self {
            resolver: SpecResolver::new(Arc::clone(&registry), Arc::clone(&executor)),
            arguments: ArgumentResolver::new(paths, Arc::clone(&executor)),
            registry,
            executor,
            config,
            initialized: OnceCell::new(),
        })
    }

    pub fn config(&self) -> &CompletionEngineConfig {
        &self.config
    }

    /// 初始化：注册内置规范并扫描补全目录，只执行一次
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| async {
                self.registry.register_builtin(load_builtin_specs());

                if let Some(dir) = self.config.completions_dir.clone() {
                    let registry = Arc::clone(&self.registry);
                    let scan = tokio::task::spawn_blocking(move || registry.discover(&dir));
                    if let Err(e) = scan.await {
                        warn!("扫描补全目录失败: {}", e);
                    }
                }

                let count = self.registry.spec_count();
                info!(
                    "补全引擎初始化完成: 内置 {} 个, 动态 {} 个, 社区 {} 个",
                    count.builtin, count.dynamic, count.community
                );
            })
            .await;
    }

    /// `initialize` 的别名
    pub async fn load_specs(&self) {
        self.initialize().await;
    }

    /// 注册规范，覆盖同名规范
    pub fn register_spec(&self, spec: Spec) {
        let spec = self.registry.register(spec);
        debug!("注册规范: {}", spec.name);
    }

    /// 获取补全建议
    pub async fn get_completions(&self, context: &CompletionContext) -> Vec<Suggestion> {
        self.initialize().await;

        let Some(command) = context.tokens.first() else {
            return self.available_commands("");
        };

        match self.lookup(command).await {
            Ok(spec) => {
                TokenWalker::new(&self.resolver, &self.arguments)
                    .walk(&spec, context)
                    .await
            }
            Err(err) => {
                debug!("{}", err);
                self.available_commands(command)
            }
        }
    }

    async fn lookup(&self, name: &str) -> CompletionResult<Arc<Spec>> {
        self.registry
            .get_spec(name)
            .await
            .ok_or_else(|| CompletionError::spec_not_found(name))
    }

    /// 简化接口，环境变量取自当前进程
    pub async fn get_completions_simple(
        &self,
        request: SimpleCompletionRequest,
    ) -> Vec<Suggestion> {
        let context = CompletionContext::new(request.tokens, request.cursor_position, request.cwd)
            .with_environment(std::env::vars().collect())
            .with_shell(ShellKind::Zsh)
            .with_git_repository(false, None);

        self.get_completions(&context).await
    }

    /// 以输入为前缀的可用命令
    fn available_commands(&self, prefix: &str) -> Vec<Suggestion> {
        self.registry
            .available_specs()
            .into_iter()
            .filter(|name| name.starts_with(prefix))
            .map(|name| {
                let description = self
                    .registry
                    .loaded(&name)
                    .and_then(|spec| spec.description.clone());
                let suggestion = Suggestion::new(name)
                    .with_type(SuggestionType::Subcommand)
                    .with_priority(DEFAULT_SUBCOMMAND_PRIORITY);
                match description {
                    Some(description) => suggestion.with_description(description),
                    None => suggestion,
                }
            })
            .collect()
    }

    /// 所有可用规范名称
    pub async fn get_available_specs(&self) -> Vec<String> {
        self.initialize().await;
        self.registry.available_specs()
    }

    pub async fn get_spec_count(&self) -> SpecCount {
        self.initialize().await;
        self.registry.spec_count()
    }

    /// 清空生成器缓存与展开结果
    pub fn clear_cache(&self) {
        self.executor.clear_cache();
        self.resolver.clear();
        debug!("补全缓存已清空");
    }
}

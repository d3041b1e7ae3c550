//! 终端补全功能模块
//!
//! 基于声明式命令规范的补全引擎，包括：
//! - 命令规范注册、目录发现与延迟加载
//! - 子命令、选项、参数的逐层解析
//! - 生成器执行、结果缓存与并发去重
//! - 文件路径补全与模糊打分

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod generators;
pub mod metadata;
pub mod providers;
pub mod scoring;
pub mod types;
pub mod walker;

pub use cache::{CacheStats, GeneratorCache};
pub use config::CompletionEngineConfig;
pub use engine::*;
pub use error::*;
pub use generators::{
    get_generator, list_generators, CachePolicy, Generator, GeneratorExecutor, GeneratorSource,
    PostProcessContext, ShellCommand, ShellExec, ShellOutput, ShellRunner, SystemShellRunner,
};
pub use metadata::{ArgSpec, OptionSpec, Spec, SpecCount, SpecRef, SpecRegistry, Template};
pub use providers::*;
pub use scoring::{fuzzy_match, rank_and_filter};
pub use types::*;

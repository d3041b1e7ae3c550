/*!
 * 补全引擎配置
 *
 * 所有字段都有默认值，JSON 配置文件中只需写出要覆盖的项。
 */

use crate::utils::error::AppResult;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 覆盖补全目录的环境变量
pub const COMPLETIONS_DIR_ENV: &str = "CLIFLOW_COMPLETIONS_DIR";

/// 补全引擎配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionEngineConfig {
    /// 规范文档目录，缺省时只使用内置规范
    pub completions_dir: Option<PathBuf>,
    /// `~` 展开使用的主目录
    pub home_dir: Option<String>,
    /// 生成器超时（毫秒）
    pub generator_timeout_ms: u64,
    /// 生成器结果缓存时长（毫秒）
    pub generator_cache_ttl_ms: u64,
    /// 生成器缓存容量
    pub generator_cache_capacity: usize,
    /// 单个命令的输出上限
    pub max_output_bytes: usize,
    /// 执行生成器脚本的 shell
    pub shell: String,
}

impl Default for CompletionEngineConfig {
    fn default() -> Self {
        Self {
            completions_dir: None,
            home_dir: None,
            generator_timeout_ms: 1500,
            generator_cache_ttl_ms: 5000,
            generator_cache_capacity: 1000,
            max_output_bytes: 1024 * 1024,
            shell: "sh".to_string(),
        }
    }
}

impl CompletionEngineConfig {
    /// 从 JSON 文件加载
    pub async fn load_from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        tracing::debug!("已加载补全配置: {}", path.display());
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var(COMPLETIONS_DIR_ENV) {
            if !dir.is_empty() {
                self.completions_dir = Some(PathBuf::from(dir));
            }
        }
        self
    }

    pub fn with_completions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.completions_dir = Some(dir.into());
        self
    }

    pub fn with_home_dir(mut self, home: impl Into<String>) -> Self {
        self.home_dir = Some(home.into());
        self
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_millis(self.generator_timeout_ms)
    }

    pub fn generator_cache_ttl(&self) -> Duration {
        Duration::from_millis(self.generator_cache_ttl_ms)
    }
}

/*!
 * 错误处理模块
 *
 * 基于 anyhow 的统一错误处理，用于规范回调（生成器、postProcess、generateSpec）
 * 和配置加载等不需要细分错误类型的场景。
 */

use anyhow::Result as AnyhowResult;

/// 统一的应用程序结果类型
pub type AppResult<T> = AnyhowResult<T>;

/// 统一的应用程序错误类型
pub type AppError = anyhow::Error;

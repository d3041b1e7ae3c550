//! 补全评分系统
//!
//! 对候选名称做模糊匹配打分，并据此过滤、排序补全建议。
//!
//! # 分档
//!
//! ```text
//! 完全匹配   EXACT_MATCH_SCORE
//!   > 前缀匹配   PREFIX_MATCH_BASE + (100 - 长度)
//!   > 词边界匹配 WORD_BOUNDARY_BASE + 10 × 命中数
//!   > 子串匹配   SUBSTRING_BASE - 位置
//!   > 子序列匹配 每字符累加
//! ```

pub mod fuzzy;
pub mod ranker;

pub use fuzzy::fuzzy_match;
pub use ranker::rank_and_filter;

/// 完全匹配分数
pub const EXACT_MATCH_SCORE: i64 = 10_000;

/// 前缀匹配基础分
pub const PREFIX_MATCH_BASE: i64 = 5_000;

/// 词边界匹配基础分
pub const WORD_BOUNDARY_BASE: i64 = 2_000;

/// 子串匹配基础分
pub const SUBSTRING_BASE: i64 = 1_000;

/// 无匹配
pub const NO_MATCH: i64 = -1;

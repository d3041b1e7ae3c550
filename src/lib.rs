//! CLIFlow 补全引擎
//!
//! 基于命令规范的 shell 补全库：根据命令行和光标位置，
//! 给出子命令、选项、参数与文件路径建议。

pub mod completion; // 补全引擎模块
pub mod utils; // 工具和错误处理模块

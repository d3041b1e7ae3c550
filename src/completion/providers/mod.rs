//! 补全提供者模块
//!
//! 参数、选项与路径三类叶子补全

pub mod arguments;
pub mod filesystem;
pub mod options;

pub use arguments::ArgumentResolver;
pub use filesystem::PathCompleter;
pub use options::OptionResolver;

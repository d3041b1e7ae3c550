//! 命令元数据模块
//!
//! 声明式命令规范、JSON 文档、注册表与延迟展开
//!

pub mod builtin;
pub mod command_spec;
pub mod document;
pub mod registry;
pub mod resolver;

pub use command_spec::{ArgSpec, GenerateSpec, OptionSpec, Spec, SpecRef, Template};
pub use document::{parse_spec_document, SpecDocument};
pub use registry::{SpecCount, SpecRegistry};
pub use resolver::SpecResolver;

//! 补全功能相关的类型定义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 补全项类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionType {
    /// 文件
    File,
    /// 目录
    Folder,
    /// 命令选项
    Option,
    /// 子命令
    Subcommand,
    /// 参数值
    Argument,
    /// 自定义
    Custom,
}

impl fmt::Display for SuggestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::File => "file",
                Self::Folder => "folder",
                Self::Option => "option",
                Self::Subcommand => "subcommand",
                Self::Argument => "argument",
                Self::Custom => "custom",
            }
        )
    }
}

/// 补全建议，引擎唯一的输出单元
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    /// 补全文本
    pub name: String,

    /// 描述信息
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 补全类型
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub suggestion_type: Option<SuggestionType>,

    /// 图标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    /// 优先级（越大越靠前）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    /// 选中时实际插入的文本
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_value: Option<String>,

    /// 选中时替换整个当前词
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replace_value: Option<String>,
}

impl Suggestion {
    /// 创建新的补全建议
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// 设置类型
    pub fn with_type(mut self, suggestion_type: SuggestionType) -> Self {
        self.suggestion_type = Some(suggestion_type);
        self
    }

    /// 设置描述
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// 设置图标
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// 设置插入值
    pub fn with_insert_value(mut self, insert_value: impl Into<String>) -> Self {
        self.insert_value = Some(insert_value.into());
        self
    }

    /// 排序用的优先级，缺省为 0
    pub fn effective_priority(&self) -> i32 {
        self.priority.unwrap_or(0)
    }
}

/// 当前使用的 shell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    Bash,
    #[default]
    Zsh,
    Fish,
}

/// 补全上下文，单次请求内不可变
#[derive(Debug, Clone, Default)]
pub struct CompletionContext {
    /// 按空格切分的词（保留空词）
    pub tokens: Vec<String>,

    /// 光标位置（字符）
    pub cursor_position: usize,

    /// 当前工作目录，原样参与路径拼接
    pub current_working_directory: String,

    /// 完整命令行
    pub command_line: String,

    /// 环境变量
    pub environment_variables: HashMap<String, String>,

    /// shell 类型
    pub shell: ShellKind,

    /// 是否位于 git 仓库
    pub is_git_repository: bool,

    /// 当前 git 分支
    pub git_branch: Option<String>,
}

impl CompletionContext {
    /// 创建新的补全上下文
    pub fn new(
        tokens: Vec<String>,
        cursor_position: usize,
        current_working_directory: impl Into<String>,
    ) -> Self {
        Self {
            command_line: tokens.join(" "),
            tokens,
            cursor_position,
            current_working_directory: current_working_directory.into(),
            ..Default::default()
        }
    }

    /// 从原始命令行创建上下文，光标默认位于行尾
    pub fn from_command_line(
        command_line: &str,
        cursor_position: Option<usize>,
        current_working_directory: impl Into<String>,
    ) -> Self {
        let cursor = cursor_position.unwrap_or_else(|| command_line.chars().count());
        let mut context = Self::new(
            tokenize(command_line),
            cursor,
            current_working_directory,
        );
        context.command_line = command_line.to_string();
        context
    }

    /// 设置环境变量
    pub fn with_environment(mut self, environment_variables: HashMap<String, String>) -> Self {
        self.environment_variables = environment_variables;
        self
    }

    /// 设置 shell
    pub fn with_shell(mut self, shell: ShellKind) -> Self {
        self.shell = shell;
        self
    }

    /// 设置 git 仓库信息
    pub fn with_git_repository(mut self, is_git_repository: bool, branch: Option<String>) -> Self {
        self.is_git_repository = is_git_repository;
        self.git_branch = branch;
        self
    }

    /// 以新的词窗口和光标派生子上下文
    pub(crate) fn narrowed(&self, tokens: Vec<String>, cursor_position: usize) -> Self {
        Self {
            command_line: tokens.join(" "),
            tokens,
            cursor_position,
            ..self.clone()
        }
    }

    /// 光标所在词的下标，光标不在任何词内时返回 `tokens.len()`
    pub fn current_token_index(&self) -> usize {
        current_token_index(&self.tokens, self.cursor_position)
    }

    /// 光标所在的词
    pub fn current_token(&self) -> &str {
        self.tokens
            .get(self.current_token_index())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// 按单个空格切分命令行，空词保留
pub fn tokenize(command_line: &str) -> Vec<String> {
    command_line.split(' ').map(str::to_string).collect()
}

/// 计算光标所在词的下标
pub fn current_token_index(tokens: &[String], cursor_position: usize) -> usize {
    let mut position = 0;

    for (index, token) in tokens.iter().enumerate() {
        let token_end = position + token.chars().count();
        if cursor_position >= position && cursor_position <= token_end {
            return index;
        }
        position = token_end + 1;
    }

    tokens.len()
}

/// 简化请求（供守护进程使用）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleCompletionRequest {
    /// 命令名
    pub command: String,

    /// 词列表
    pub tokens: Vec<String>,

    /// 当前词
    pub current_token: String,

    /// 工作目录
    pub cwd: String,

    /// 光标位置
    pub cursor_position: usize,
}

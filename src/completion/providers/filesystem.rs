//! 文件系统路径补全

use crate::completion::error::{CompletionError, CompletionResult};
use crate::completion::types::{Suggestion, SuggestionType};
use tokio::fs;
use tracing::debug;

/// 路径补全器
#[derive(Debug, Clone, Default)]
pub struct PathCompleter {
    /// 配置的主目录，缺省时读取环境
    home_dir: Option<String>,
}

impl PathCompleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置 `~` 展开使用的主目录
    pub fn with_home_dir(mut self, home_dir: impl Into<String>) -> Self {
        self.home_dir = Some(home_dir.into());
        self
    }

    fn home(&self) -> String {
        if let Some(home) = &self.home_dir {
            return home.clone();
        }
        if let Ok(home) = std::env::var("HOME") {
            if !home.is_empty() {
                return home;
            }
        }
        dirs::home_dir()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| "/".to_string())
    }

    /// 解析用户输入的路径：`~` 展开、绝对路径原样、相对路径拼接到 cwd
    pub fn resolve_path(&self, input: &str, cwd: &str) -> String {
        if input.is_empty() {
            return cwd.to_string();
        }

        let unescaped = unescape_path(input);

        if let Some(rest) = unescaped.strip_prefix('~') {
            return format!("{}{}", self.home(), rest);
        }

        if unescaped.starts_with('/') {
            return unescaped;
        }

        let relative = unescaped.strip_prefix("./").unwrap_or(&unescaped);
        if cwd.ends_with('/') {
            format!("{cwd}{relative}")
        } else {
            format!("{cwd}/{relative}")
        }
    }

    /// 补全部分路径，任何文件系统错误都返回空列表
    pub async fn complete(
        &self,
        cwd: &str,
        partial: &str,
        include_files: bool,
        include_folders: bool,
    ) -> Vec<Suggestion> {
        match self
            .list_matches(cwd, partial, include_files, include_folders)
            .await
        {
            Ok(items) => items,
            Err(err) => {
                debug!("路径补全失败 {:?}: {}", partial, err);
                Vec::new()
            }
        }
    }

    async fn list_matches(
        &self,
        cwd: &str,
        partial: &str,
        include_files: bool,
        include_folders: bool,
    ) -> CompletionResult<Vec<Suggestion>> {
        let (target_dir, filter_prefix) = if partial.is_empty() {
            (cwd.to_string(), String::new())
        } else if partial.ends_with('/') {
            (self.resolve_path(partial, cwd), String::new())
        } else {
            let resolved = self.resolve_path(partial, cwd);
            (
                dirname(&resolved).to_string(),
                basename(&resolved).to_lowercase(),
            )
        };

        let metadata = fs::metadata(&target_dir)
            .await
            .map_err(|e| CompletionError::io(format!("reading {target_dir}"), e))?;
        if !metadata.is_dir() {
            return Ok(Vec::new());
        }

        let mut reader = fs::read_dir(&target_dir)
            .await
            .map_err(|e| CompletionError::io(format!("listing {target_dir}"), e))?;

        let mut names = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| CompletionError::io(format!("listing {target_dir}"), e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();

        let show_hidden = filter_prefix.starts_with('.') || partial.contains("/.");
        let unescaped_partial = unescape_path(partial);
        let insert_prefix = match unescaped_partial.rfind('/') {
            Some(index) => &unescaped_partial[..=index],
            None => "",
        };

        let mut suggestions = Vec::new();
        for name in names {
            if name.starts_with('.') && !show_hidden {
                continue;
            }
            if !filter_prefix.is_empty() && !name.to_lowercase().starts_with(&filter_prefix) {
                continue;
            }

            let full_path = join(&target_dir, &name);
            // 跟随符号链接
            let Ok(stats) = fs::metadata(&full_path).await else {
                continue;
            };

            let is_dir = stats.is_dir();
            if (is_dir && !include_folders) || (!is_dir && !include_files) {
                continue;
            }

            let display = if is_dir { format!("{name}/") } else { name };
            let suggestion = if is_dir {
                Suggestion::new(display.clone())
                    .with_type(SuggestionType::Folder)
                    .with_description("Directory")
                    .with_icon("📁")
                    .with_priority(90)
            } else {
                Suggestion::new(display.clone())
                    .with_type(SuggestionType::File)
                    .with_description("File")
                    .with_icon("📄")
                    .with_priority(85)
            };

            suggestions.push(suggestion.with_insert_value(format!("{insert_prefix}{display}")));
        }

        Ok(suggestions)
    }
}

/// 去掉反斜杠转义：`\ ` -> ` `，`\\` -> `\`
pub fn unescape_path(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => result.push(escaped),
                None => result.push(ch),
            }
        } else {
            result.push(ch);
        }
    }

    result
}

fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(index) => &path[..index],
        None => ".",
    }
}

fn basename(path: &str) -> &str {
    match path.rfind('/') {
        Some(index) => &path[index + 1..],
        None => path,
    }
}

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

//! 参数补全
//!
//! 只看第一个参数规范：静态建议、路径模板、生成器依次拼接，不去重。

use super::filesystem::PathCompleter;
use crate::completion::generators::GeneratorExecutor;
use crate::completion::metadata::ArgSpec;
use crate::completion::types::{CompletionContext, Suggestion, SuggestionType};
use std::sync::Arc;

/// 参数补全
pub struct ArgumentResolver {
    paths: PathCompleter,
    executor: Arc<GeneratorExecutor>,
}

impl ArgumentResolver {
    pub fn new(paths: PathCompleter, executor: Arc<GeneratorExecutor>) -> Self {
        Self { paths, executor }
    }

    /// 计算参数建议，`context` 的词列表已经收窄到当前节点
    pub async fn resolve(&self, args: &[ArgSpec], context: &CompletionContext) -> Vec<Suggestion> {
        let Some(arg) = args.first() else {
            return Vec::new();
        };

        let mut suggestions: Vec<Suggestion> = arg
            .suggestions
            .iter()
            .map(|suggestion| {
                let mut suggestion = suggestion.clone();
                suggestion
                    .suggestion_type
                    .get_or_insert(SuggestionType::Argument);
                suggestion
            })
            .collect();

        let partial = context.tokens.last().map(String::as_str).unwrap_or("");
        for template in &arg.templates {
            let (include_files, include_folders) = template.includes();
            if !include_files && !include_folders {
                continue;
            }
            suggestions.extend(
                self.paths
                    .complete(
                        &context.current_working_directory,
                        partial,
                        include_files,
                        include_folders,
                    )
                    .await,
            );
        }

        for generator in &arg.generators {
            suggestions.extend(self.executor.execute(generator, context).await);
        }

        suggestions
    }
}

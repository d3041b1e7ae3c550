//! 词序列遍历
//!
//! 从根规范开始，按词逐层匹配子命令并下降，直到光标所在的节点，
//! 再在该节点上给出子命令、参数或选项建议。每次下降词窗口严格变短。

use crate::completion::metadata::{Spec, SpecResolver};
use crate::completion::providers::{ArgumentResolver, OptionResolver};
use crate::completion::scoring::rank_and_filter;
use crate::completion::types::{CompletionContext, Suggestion, SuggestionType};
use std::sync::Arc;
use tracing::debug;

/// 子命令默认优先级
pub const DEFAULT_SUBCOMMAND_PRIORITY: i32 = 100;

/// 词序列遍历器
pub struct TokenWalker<'a> {
    resolver: &'a SpecResolver,
    arguments: &'a ArgumentResolver,
    options: OptionResolver,
}

impl<'a> TokenWalker<'a> {
    pub fn new(resolver: &'a SpecResolver, arguments: &'a ArgumentResolver) -> Self {
        Self {
            resolver,
            arguments,
            options: OptionResolver,
        }
    }

    /// 计算补全建议
    pub async fn walk(&self, spec: &Arc<Spec>, context: &CompletionContext) -> Vec<Suggestion> {
        let mut node = Arc::clone(spec);
        let mut context = context.clone();
        let mut depth = 0usize;

        loop {
            let current = self.resolver.resolve_with_args(&node, &context).await;
            let start = match context.tokens.first() {
                Some(first) if *first == current.name => 1,
                _ => 0,
            };
            let cursor_index = context.current_token_index();

            let matched = context
                .tokens
                .iter()
                .enumerate()
                .skip(start)
                .find_map(|(index, token)| {
                    if token.is_empty() || token.starts_with('-') {
                        return None;
                    }
                    current
                        .find_subcommand(token)
                        .map(|sub| (index, Arc::clone(sub)))
                });

            if let Some((index, subcommand)) = matched {
                let consumed = context.tokens[..=index].join(" ").chars().count() + 1;
                let narrowed = context.narrowed(
                    context.tokens[index + 1..].to_vec(),
                    context.cursor_position.saturating_sub(consumed),
                );

                self.resolver.resolve(&subcommand, &narrowed).await;

                if index + 1 < context.tokens.len() || cursor_index > index {
                    depth += 1;
                    debug!("进入子命令 {} (深度 {})", subcommand.name, depth);
                    node = subcommand;
                    context = narrowed;
                    continue;
                }
            }

            return self.complete_at(&current, &context, start).await;
        }
    }

    /// 在终止节点上给出建议
    async fn complete_at(
        &self,
        spec: &Spec,
        context: &CompletionContext,
        subcommand_slot: usize,
    ) -> Vec<Suggestion> {
        let cursor_index = context.current_token_index();
        let current_token = context.current_token();
        let has_subcommands = !spec.subcommands.is_empty();

        if cursor_index <= subcommand_slot || context.tokens.is_empty() || current_token.is_empty()
        {
            if current_token.is_empty() && has_subcommands {
                return subcommand_suggestions(spec, "");
            }

            if has_subcommands
                && !context.tokens.is_empty()
                && !current_token.is_empty()
                && !current_token.starts_with('-')
            {
                let matches = subcommand_suggestions(spec, current_token);
                if !matches.is_empty() || spec.args.is_empty() {
                    return matches;
                }
            }
        }

        let mut suggestions = Vec::new();
        let mut path_template = false;

        if !current_token.starts_with('-') && !spec.args.is_empty() {
            suggestions.extend(self.arguments.resolve(&spec.args, context).await);
            path_template = spec.args[0].has_path_template();
        }

        suggestions.extend(self.options.resolve(&spec.options, current_token));

        // 路径建议已经按输入过滤，不再二次打分
        rank_and_filter(suggestions, if path_template { "" } else { current_token })
    }
}

/// 可见子命令，按输入打分过滤
pub fn subcommand_suggestions(spec: &Spec, input: &str) -> Vec<Suggestion> {
    let suggestions = spec
        .subcommands
        .iter()
        .filter(|sub| !sub.hidden)
        .map(|sub| {
            let suggestion = Suggestion::new(sub.name.clone())
                .with_type(SuggestionType::Subcommand)
                .with_priority(sub.priority.unwrap_or(DEFAULT_SUBCOMMAND_PRIORITY));
            match &sub.description {
                Some(description) => suggestion.with_description(description.clone()),
                None => suggestion,
            }
        })
        .collect();

    rank_and_filter(suggestions, input)
}

//! 选项补全

use crate::completion::metadata::OptionSpec;
use crate::completion::scoring::rank_and_filter;
use crate::completion::types::{Suggestion, SuggestionType};

/// 选项默认优先级
pub const DEFAULT_OPTION_PRIORITY: i32 = 80;

/// 选项补全：每个名称（含别名）各生成一条建议
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionResolver;

impl OptionResolver {
    pub fn resolve(&self, options: &[OptionSpec], current_token: &str) -> Vec<Suggestion> {
        let suggestions = options
            .iter()
            .filter(|option| !option.hidden)
            .flat_map(|option| {
                option
                    .names
                    .iter()
                    .filter(|name| !name.is_empty())
                    .map(move |name| {
                        let suggestion = Suggestion::new(name.clone())
                            .with_type(SuggestionType::Option)
                            .with_priority(option.priority.unwrap_or(DEFAULT_OPTION_PRIORITY));
                        match &option.description {
                            Some(description) => suggestion.with_description(description.clone()),
                            None => suggestion,
                        }
                    })
            })
            .collect();

        rank_and_filter(suggestions, current_token)
    }
}

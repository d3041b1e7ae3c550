//! 建议过滤与排序

use std::cmp::Ordering;

use super::fuzzy::fuzzy_match;
use crate::completion::types::Suggestion;

/// 按模糊分数过滤并排序建议
///
/// 输入为空时原样返回。否则丢弃分数不为正的项，按分数降序、
/// 优先级降序（缺省为 0）、名称升序稳定排序。
pub fn rank_and_filter(suggestions: Vec<Suggestion>, input: &str) -> Vec<Suggestion> {
    if input.is_empty() {
        return suggestions;
    }

    let mut scored: Vec<(i64, Suggestion)> = suggestions
        .into_iter()
        .map(|s| (fuzzy_match(input, &s.name), s))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| compare(*score_a, a, *score_b, b));

    scored.into_iter().map(|(_, s)| s).collect()
}

fn compare(score_a: i64, a: &Suggestion, score_b: i64, b: &Suggestion) -> Ordering {
    score_b
        .cmp(&score_a)
        .then_with(|| b.effective_priority().cmp(&a.effective_priority()))
        .then_with(|| a.name.cmp(&b.name))
}

//! 模糊匹配打分

use super::{EXACT_MATCH_SCORE, NO_MATCH, PREFIX_MATCH_BASE, SUBSTRING_BASE, WORD_BOUNDARY_BASE};

/// 计算输入与目标的匹配分数（大小写不敏感），无匹配返回 -1
pub fn fuzzy_match(input: &str, target: &str) -> i64 {
    let input_lower = input.to_lowercase();
    let target_lower = target.to_lowercase();

    if target_lower == input_lower {
        return EXACT_MATCH_SCORE;
    }

    if target_lower.starts_with(&input_lower) {
        return PREFIX_MATCH_BASE + (100 - target.chars().count() as i64);
    }

    let boundary_score = word_boundary_match(&input_lower, target);
    if boundary_score > 0 {
        return WORD_BOUNDARY_BASE + boundary_score;
    }

    if let Some(byte_index) = target_lower.find(&input_lower) {
        let index = target_lower[..byte_index].chars().count() as i64;
        return SUBSTRING_BASE - index;
    }

    let sequence_score = subsequence_match(&input_lower, &target_lower);
    if sequence_score > 0 {
        return sequence_score;
    }

    NO_MATCH
}

/// 词边界匹配：git-commit / git_commit / gitCommit 都能被 "gc" 命中
///
/// 边界取自原始大小写的目标串，这样 camelCase 的转折才能被识别。
fn word_boundary_match(input_lower: &str, target: &str) -> i64 {
    let input: Vec<char> = input_lower.chars().collect();
    if input.is_empty() {
        return 0;
    }

    let chars: Vec<char> = target.chars().collect();
    let mut boundaries = Vec::new();
    for (i, &curr) in chars.iter().enumerate() {
        if i == 0 {
            boundaries.push(curr);
            continue;
        }
        let prev = chars[i - 1];
        if matches!(prev, '-' | '_' | '.' | '/') || (prev.is_lowercase() && curr.is_uppercase()) {
            boundaries.push(curr);
        }
    }

    let mut matched = 0;
    for boundary in boundaries {
        if matched >= input.len() {
            break;
        }
        if boundary.to_lowercase().eq(std::iter::once(input[matched])) {
            matched += 1;
        }
    }

    if matched == input.len() {
        matched as i64 * 10
    } else {
        0
    }
}

/// 有序子序列匹配
fn subsequence_match(input_lower: &str, target_lower: &str) -> i64 {
    let input: Vec<char> = input_lower.chars().collect();
    let mut input_index = 0;
    let mut last_match: Option<usize> = None;
    let mut score: i64 = 0;
    let mut consecutive_bonus: i64 = 0;

    for (i, ch) in target_lower.chars().enumerate() {
        if input_index >= input.len() {
            break;
        }
        if ch != input[input_index] {
            continue;
        }

        if let Some(last) = last_match {
            if last + 1 == i {
                consecutive_bonus += 5;
            }
            score -= (i - last - 1) as i64;
        }
        if i == 0 {
            score += 10;
        }

        last_match = Some(i);
        input_index += 1;
        score += 10;
    }

    if input_index == input.len() {
        (score + consecutive_bonus).max(1)
    } else {
        0
    }
}

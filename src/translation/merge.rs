use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of reconciling up to two provider answers for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedCell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gemini_text: Option<String>,
    pub merged_text: String,
    /// `None` when fewer than two providers answered.
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub merged_text: String,
    pub confidence: Option<f64>,
}

/// Picks the final text for one item.
///
/// With two answers the one whose length is closer to the source wins
/// (ties go to `first`) and the confidence is their token Jaccard similarity.
/// This is a length heuristic, not a quality judgement.
pub fn merge_outputs(first: Option<&str>, second: Option<&str>, source_text: &str) -> MergeOutcome {
    let first = first.filter(|t| !t.is_empty());
    let second = second.filter(|t| !t.is_empty());

    match (first, second) {
        (None, None) => MergeOutcome {
            merged_text: String::new(),
            confidence: None,
        },
        (Some(only), None) | (None, Some(only)) => MergeOutcome {
            merged_text: only.to_string(),
            confidence: None,
        },
        (Some(a), Some(b)) => {
            let source_len = source_text.chars().count().max(1) as i64;
            let diff_a = (a.chars().count() as i64 - source_len).abs();
            let diff_b = (b.chars().count() as i64 - source_len).abs();
            MergeOutcome {
                merged_text: if diff_a <= diff_b { a } else { b }.to_string(),
                confidence: Some(jaccard_similarity(a, b)),
            }
        }
    }
}

fn normalize_tokens(text: &str) -> HashSet<String> {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '"'))
        .collect();
    stripped.split_whitespace().map(str::to_string).collect()
}

/// Token-set Jaccard similarity in `[0, 1]`. Identical inputs score 1.
pub fn jaccard_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    let tokens_a = normalize_tokens(a);
    let tokens_b = normalize_tokens(b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }

    let intersection = tokens_a.intersection(&tokens_b).count();
    let union = tokens_a.len() + tokens_b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_answers_give_empty_text_and_no_confidence() {
        let out = merge_outputs(None, None, "hola");
        assert_eq!(out.merged_text, "");
        assert_eq!(out.confidence, None);
    }

    #[test]
    fn empty_answers_count_as_missing() {
        let out = merge_outputs(Some(""), Some("hello"), "hola");
        assert_eq!(out.merged_text, "hello");
        assert_eq!(out.confidence, None);
    }

    #[test]
    fn single_answer_is_taken_verbatim() {
        let out = merge_outputs(None, Some("  Hello! "), "hola");
        assert_eq!(out.merged_text, "  Hello! ");
        assert_eq!(out.confidence, None);
    }

    #[test]
    fn closer_length_wins() {
        let out = merge_outputs(Some("hi there"), Some("hello"), "hola");
        assert_eq!(out.merged_text, "hello");
        assert_eq!(out.confidence, Some(0.0));
    }

    #[test]
    fn ties_favor_first() {
        let out = merge_outputs(Some("abc"), Some("xyz"), "ab");
        assert_eq!(out.merged_text, "abc");
    }

    #[test]
    fn verbatim_agreement_is_full_confidence() {
        let out = merge_outputs(Some("Good morning."), Some("Good morning."), "Buenos días.");
        assert_eq!(out.confidence, Some(1.0));
        assert_eq!(merge_outputs(Some("..."), Some("..."), "x").confidence, Some(1.0));
    }

    #[test]
    fn similarity_ignores_case_and_punctuation() {
        let score = jaccard_similarity("Hello, World!", "hello world");
        assert!((score - 1.0).abs() < f64::EPSILON);

        let partial = jaccard_similarity("the red door", "the blue door");
        assert!((partial - 0.5).abs() < 1e-9);
    }
}

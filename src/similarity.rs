//! String similarity for clarification answers
//!
//! When the policy asks the user to disambiguate, the reply is rarely a
//! full command: "the first one", "summarize please", "the script". These
//! helpers score a short reply against the recorded options so the
//! short-circuit path can pick one without a full re-parse.

use ahash::AHashSet;

/// Minimum similarity for a reply to count as choosing an option.
pub const ANSWER_THRESHOLD: f64 = 0.55;

/// Score how well a free-form reply matches one option phrase (0.0-1.0).
///
/// Staged: exact/containment fast paths first, then token overlap, then a
/// subsequence ratio only when the overlap looks promising.
pub fn answer_similarity(answer: &str, option: &str) -> f64 {
    if answer.is_empty() || option.is_empty() {
        return 0.0;
    }

    let answer = answer.to_lowercase();
    let option = option.to_lowercase();

    if answer == option {
        return 1.0;
    }
    // A reply that contains the whole option phrase ("run it please" vs
    // "run") is as good as exact.
    if answer.split_whitespace().any(|w| w == option) || answer.contains(&option) {
        return 0.95;
    }

    let answer_tokens: AHashSet<&str> = answer.split_whitespace().collect();
    let option_tokens: AHashSet<&str> = option.split_whitespace().collect();
    if option_tokens.is_empty() {
        return 0.0;
    }

    let overlap =
        answer_tokens.intersection(&option_tokens).count() as f64 / option_tokens.len() as f64;

    // Sharing a contentful word ("summarize", "script") is a strong signal
    // on its own; short replies rarely overlap on more than one token.
    let shared_content = answer_tokens
        .intersection(&option_tokens)
        .any(|w| w.len() >= 4);

    let score = if overlap < 0.3 {
        overlap * 0.6 + char_ratio(&answer, &option) * 0.2
    } else {
        overlap * 0.6 + char_ratio(&answer, &option) * 0.4
    };

    if shared_content {
        score.max(0.75)
    } else {
        score
    }
}

/// Pick the best-matching option, if any clears the threshold. A tie
/// between two options means the reply did not disambiguate; the caller
/// falls back to full re-scoring.
pub fn best_option(answer: &str, options: &[String]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    let mut tied = false;

    for (i, option) in options.iter().enumerate() {
        let score = answer_similarity(answer, option);
        match best {
            Some((_, b)) if score > b => {
                best = Some((i, score));
                tied = false;
            }
            Some((_, b)) if (score - b).abs() < f64::EPSILON => {
                tied = true;
            }
            None => {
                best = Some((i, score));
            }
            _ => {}
        }
    }

    match best {
        Some((i, score)) if score >= ANSWER_THRESHOLD && !tied => Some(i),
        _ => None,
    }
}

/// Character-level subsequence ratio, Ratcliff-Obershelp style but using
/// the longest common subsequence for speed.
fn char_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = common_subsequence_len(a, b);
    let total = a.chars().count() + b.chars().count();
    (2.0 * common as f64) / total as f64
}

fn common_subsequence_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in &a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

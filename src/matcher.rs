//! Candidate matching over annotated token sequences
//!
//! Scans every pattern in the library against the token sequence and
//! produces all satisfiable candidates. Matching is greedy per pattern:
//! the longest satisfying span wins, earliest start on ties. Overlapping
//! matches from different patterns are all retained; disambiguation belongs
//! to the resolution policy, not here. No match is an empty candidate set,
//! never an error.

use crate::annotate::AnnotatedToken;
use crate::patterns::{PatternDefinition, PatternLibrary, Quant};
use crate::types::MatchCandidate;

/// Produce every candidate the library yields for this token sequence.
pub fn find_candidates(
    tokens: &[AnnotatedToken],
    library: &PatternLibrary,
) -> Vec<MatchCandidate> {
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for pattern in library.patterns() {
        let best = if pattern.contiguous {
            best_contiguous(tokens, pattern)
        } else {
            match_subsequence(tokens, pattern)
        };
        if let Some((start, end, head_end)) = best {
            candidates.push(MatchCandidate {
                pattern: pattern.id,
                label: pattern.label,
                start,
                end,
                head_end,
                specificity: pattern.specificity,
            });
        }
    }
    candidates
}

/// Longest contiguous match for one pattern, earliest start on ties.
fn best_contiguous(
    tokens: &[AnnotatedToken],
    pattern: &PatternDefinition,
) -> Option<(usize, usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    for start in 0..tokens.len() {
        if let Some((end, head_end)) = match_at(tokens, start, pattern) {
            let longer = match best {
                Some((bs, be, _)) => end - start > be - bs,
                None => true,
            };
            if longer {
                best = Some((start, end, head_end.unwrap_or(start)));
            }
        }
    }
    best
}

/// Match the constraint sequence starting exactly at `start`. Returns the
/// span end and the index past the last token consumed by a concrete
/// (non-wildcard) constraint. Wildcards are greedy: they absorb as many
/// tokens as still allow the rest of the pattern to match.
fn match_at(
    tokens: &[AnnotatedToken],
    start: usize,
    pattern: &PatternDefinition,
) -> Option<(usize, Option<usize>)> {
    fn rec(
        tokens: &[AnnotatedToken],
        i: usize,
        constraints: &[crate::patterns::TokenConstraint],
    ) -> Option<(usize, Option<usize>)> {
        let Some(constraint) = constraints.first() else {
            return Some((i, None));
        };
        let rest = &constraints[1..];
        match constraint.quant {
            Quant::One => {
                let token = tokens.get(i)?;
                if !constraint.satisfied_by(token) {
                    return None;
                }
                let (end, head) = rec(tokens, i + 1, rest)?;
                Some((end, Some(head.map_or(i + 1, |h| h.max(i + 1)))))
            }
            Quant::ZeroOrMore => {
                // Greedy: longest absorption first, backtracking down to zero.
                for take in (0..=tokens.len() - i).rev() {
                    if !constraint.predicates.is_empty()
                        && !tokens[i..i + take].iter().all(|t| constraint.satisfied_by(t))
                    {
                        continue;
                    }
                    if let Some(result) = rec(tokens, i + take, rest) {
                        return Some(result);
                    }
                }
                None
            }
        }
    }

    rec(tokens, start, &pattern.constraints)
}

/// Order-preserving, non-contiguous match: each concrete constraint binds
/// the leftmost satisfying token after the previous one. The span runs from
/// the first bound token past the last. Wildcards are meaningless here and
/// skipped.
fn match_subsequence(
    tokens: &[AnnotatedToken],
    pattern: &PatternDefinition,
) -> Option<(usize, usize, usize)> {
    let mut first: Option<usize> = None;
    let mut cursor = 0usize;

    for constraint in pattern.constraints.iter().filter(|c| !c.is_wildcard()) {
        let found = (cursor..tokens.len()).find(|&i| constraint.satisfied_by(&tokens[i]))?;
        if first.is_none() {
            first = Some(found);
        }
        cursor = found + 1;
    }

    let start = first?;
    Some((start, cursor, cursor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{Annotator, LexiconAnnotator, PlainAnnotator, PosTag};
    use crate::patterns::{PatternLibrary, TokenConstraint, TokenPredicate};
    use crate::types::IntentLabel;

    fn lower(words: &'static [&'static str]) -> TokenConstraint {
        TokenConstraint::one(vec![TokenPredicate::LowerIn(words)])
    }

    fn annotate(s: &str) -> Vec<crate::annotate::AnnotatedToken> {
        LexiconAnnotator.annotate(s).expect("annotate")
    }

    #[test]
    fn test_simple_match_with_wildcard() {
        let mut lib = PatternLibrary::new();
        lib.add(
            IntentLabel::RunScript,
            vec![lower(&["run", "execute"]), TokenConstraint::wildcard()],
        );
        let tokens = annotate("run the security scan");
        let candidates = find_candidates(&tokens, &lib);
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.label, IntentLabel::RunScript);
        assert_eq!((c.start, c.end), (0, 4), "wildcard is greedy");
        assert_eq!(c.head_end, 1, "only the verb is concrete");
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let lib = PatternLibrary::standard();
        let tokens = annotate("xk2929 zzz");
        assert!(find_candidates(&tokens, lib).is_empty());
    }

    #[test]
    fn test_empty_input_yields_no_candidates() {
        let lib = PatternLibrary::standard();
        assert!(find_candidates(&[], lib).is_empty());
    }

    #[test]
    fn test_interior_wildcard_backtracks() {
        let mut lib = PatternLibrary::new();
        lib.add(
            IntentLabel::ListFiles,
            vec![
                lower(&["what"]),
                TokenConstraint::wildcard(),
                lower(&["files", "scripts"]),
            ],
        );
        let tokens = annotate("what are the python files");
        let candidates = find_candidates(&tokens, &lib);
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].start, candidates[0].end), (0, 5));
        assert_eq!(candidates[0].head_end, 5, "final constraint is concrete");
    }

    #[test]
    fn test_overlapping_patterns_all_retained() {
        let mut lib = PatternLibrary::new();
        lib.add(
            IntentLabel::ShowFile,
            vec![lower(&["show"]), TokenConstraint::wildcard()],
        );
        lib.add(
            IntentLabel::ListFiles,
            vec![lower(&["show"]), lower(&["me"]), TokenConstraint::wildcard()],
        );
        let tokens = annotate("show me the files");
        let candidates = find_candidates(&tokens, &lib);
        assert_eq!(candidates.len(), 2, "disambiguation is deferred");
    }

    #[test]
    fn test_longest_span_preferred_per_pattern() {
        let mut lib = PatternLibrary::new();
        lib.add(
            IntentLabel::Search,
            vec![
                lower(&["find"]),
                TokenConstraint {
                    predicates: vec![TokenPredicate::IsAlphabetic],
                    quant: crate::patterns::Quant::ZeroOrMore,
                },
            ],
        );
        // the predicate wildcard stops at the non-alphabetic token
        let tokens = annotate("find old notes 42");
        let candidates = find_candidates(&tokens, &lib);
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].start, candidates[0].end), (0, 3));
    }

    #[test]
    fn test_pos_predicate_fails_on_degraded_tokens() {
        let mut lib = PatternLibrary::new();
        lib.add(
            IntentLabel::RunScript,
            vec![TokenConstraint::one(vec![TokenPredicate::Pos(PosTag::Verb)])],
        );
        let annotated = annotate("run");
        assert_eq!(find_candidates(&annotated, &lib).len(), 1);

        let plain = PlainAnnotator.annotate("run").expect("annotate");
        assert!(
            find_candidates(&plain, &lib).is_empty(),
            "POS predicates never fire without annotations"
        );
    }

    #[test]
    fn test_text_predicates_survive_degraded_tokens() {
        let lib = PatternLibrary::standard();
        let plain = PlainAnnotator.annotate("run the scan").expect("annotate");
        let candidates = find_candidates(&plain, lib);
        assert!(candidates.iter().any(|c| c.label == IntentLabel::RunScript));
    }

    #[test]
    fn test_non_contiguous_subsequence() {
        let mut lib = PatternLibrary::new();
        lib.add_non_contiguous(
            IntentLabel::Rename,
            vec![lower(&["change"]), lower(&["name"])],
        );
        let tokens = annotate("change the file name please");
        let candidates = find_candidates(&tokens, &lib);
        assert_eq!(candidates.len(), 1);
        assert_eq!((candidates[0].start, candidates[0].end), (0, 4));
    }

    #[test]
    fn test_non_contiguous_respects_order() {
        let mut lib = PatternLibrary::new();
        lib.add_non_contiguous(
            IntentLabel::Rename,
            vec![lower(&["name"]), lower(&["change"])],
        );
        let tokens = annotate("change the file name");
        assert!(find_candidates(&tokens, &lib).is_empty());
    }
}

//! Resolution policy - dispatch, or clarify and try again next turn
//!
//! Per turn the policy moves SCORING -> DISPATCH or SCORING -> CLARIFYING.
//! A clarifying turn records the ambiguous candidate set in the
//! conversation context; the next utterance is first read as an answer to
//! that question (short-circuit, restricted to the recorded set) before
//! ordinary full re-scoring. After `max_clarification_turns` consecutive
//! clarifying turns the best available candidate is dispatched regardless
//! of threshold, so clarification can never loop forever.

use crate::annotate::AnnotatedToken;
use crate::similarity;
use crate::types::{EntityKind, Intent, IntentLabel, ScoredCandidate};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds governing the dispatch/clarify decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionPolicy {
    /// Minimum confidence for direct dispatch.
    pub dispatch_threshold: f64,
    /// The best candidate must lead the runner-up by at least this much.
    pub clarify_margin: f64,
    /// Consecutive clarifying turns tolerated before forcing dispatch.
    pub max_clarification_turns: u32,
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            dispatch_threshold: 0.6,
            clarify_margin: 0.15,
            max_clarification_turns: 2,
        }
    }
}

/// The ambiguous candidate set carried across a clarification turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingClarification {
    pub candidates: Vec<ScoredCandidate>,
    pub consecutive_turns: u32,
}

/// Per-session state. Owned by exactly one session, passed explicitly
/// through the pipeline, reset when the session ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub last_intent: Option<Intent>,
    pub pending: Option<PendingClarification>,
    pub turn: u64,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Outcome of one resolution step.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Dispatch(Intent),
    Clarify {
        prompt: String,
        options: Vec<IntentLabel>,
    },
}

impl ResolutionPolicy {
    /// Resolve one turn's scored candidates into a dispatch or a
    /// clarification. Mutates only the pending-clarification state; the
    /// caller records the dispatched intent as `last_intent`.
    pub fn resolve(
        &self,
        utterance: &str,
        tokens: &[AnnotatedToken],
        scored: Vec<ScoredCandidate>,
        ctx: &mut ConversationContext,
    ) -> Resolution {
        let ranked = rank(scored);

        if let Some(pending) = ctx.pending.take() {
            return self.resolve_pending(utterance, tokens, ranked, pending, ctx);
        }

        match self.decide(&ranked) {
            Some(idx) => self.dispatch(ranked[idx].clone(), utterance, tokens, ctx),
            None => {
                if ranked.is_empty() {
                    // No pattern matched at all: terminal default, routed to
                    // the conversational fallback by the dispatch table.
                    return Resolution::Dispatch(Intent::unknown(utterance));
                }
                self.clarify(ranked, 1, ctx)
            }
        }
    }

    fn resolve_pending(
        &self,
        utterance: &str,
        tokens: &[AnnotatedToken],
        ranked: Vec<ScoredCandidate>,
        pending: PendingClarification,
        ctx: &mut ConversationContext,
    ) -> Resolution {
        // 1. the reply names one of the offered options
        if let Some(idx) = match_answer(utterance, tokens, &pending.candidates) {
            debug!(option = %pending.candidates[idx].candidate.label, "clarification answered");
            return self.dispatch(pending.candidates[idx].clone(), utterance, tokens, ctx);
        }

        // 2. short-circuit: re-score restricted to the recorded set
        let recorded: Vec<IntentLabel> =
            pending.candidates.iter().map(|c| c.candidate.label).collect();
        let restricted: Vec<ScoredCandidate> = ranked
            .iter()
            .filter(|c| recorded.contains(&c.candidate.label))
            .cloned()
            .collect();
        if let Some(idx) = self.decide(&restricted) {
            return self.dispatch(restricted[idx].clone(), utterance, tokens, ctx);
        }

        // 3. ordinary full re-scoring
        if let Some(idx) = self.decide(&ranked) {
            return self.dispatch(ranked[idx].clone(), utterance, tokens, ctx);
        }

        // Still ambiguous. Force dispatch once the cap is reached; never
        // ask a third time.
        if pending.consecutive_turns >= self.max_clarification_turns {
            let source = if ranked.is_empty() {
                pending.candidates
            } else {
                ranked
            };
            return match source.into_iter().next() {
                Some(best) => {
                    debug!(label = %best.candidate.label, "forcing dispatch after repeated clarification");
                    self.dispatch(best, utterance, tokens, ctx)
                }
                None => Resolution::Dispatch(Intent::unknown(utterance)),
            };
        }

        let source = if ranked.is_empty() {
            pending.candidates
        } else {
            ranked
        };
        self.clarify(source, pending.consecutive_turns + 1, ctx)
    }

    /// Index of the candidate to dispatch, or `None` when the turn should
    /// clarify. Ties in both confidence and specificity are ambiguous by
    /// policy, never broken arbitrarily.
    fn decide(&self, ranked: &[ScoredCandidate]) -> Option<usize> {
        let best = ranked.first()?;
        if best.confidence < self.dispatch_threshold {
            return None;
        }
        match ranked.get(1) {
            Some(second) if best.confidence - second.confidence < self.clarify_margin => None,
            _ => Some(0),
        }
    }

    fn dispatch(
        &self,
        chosen: ScoredCandidate,
        utterance: &str,
        tokens: &[AnnotatedToken],
        ctx: &mut ConversationContext,
    ) -> Resolution {
        let mut intent = Intent::new(
            chosen.candidate.label,
            chosen.confidence,
            chosen.entities,
            utterance,
        );
        fill_anaphora(&mut intent, tokens, ctx.last_intent.as_ref());
        Resolution::Dispatch(intent)
    }

    fn clarify(
        &self,
        candidates: Vec<ScoredCandidate>,
        consecutive_turns: u32,
        ctx: &mut ConversationContext,
    ) -> Resolution {
        let options: Vec<IntentLabel> = candidates.iter().map(|c| c.candidate.label).collect();
        let prompt = clarification_prompt(&options);
        ctx.pending = Some(PendingClarification {
            candidates,
            consecutive_turns,
        });
        Resolution::Clarify { prompt, options }
    }
}

/// Keep the best-scoring candidate per label, then order by confidence
/// (specificity, then pattern id, break any remaining ties
/// deterministically).
fn rank(mut scored: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
    scored.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.candidate.specificity.cmp(&a.candidate.specificity))
            .then(a.candidate.pattern.cmp(&b.candidate.pattern))
    });
    let mut seen: Vec<IntentLabel> = Vec::new();
    scored.retain(|c| {
        if seen.contains(&c.candidate.label) {
            false
        } else {
            seen.push(c.candidate.label);
            true
        }
    });
    scored
}

/// Interpret a reply to a pending clarification. Keyword mention wins,
/// then ordinals ("the first one", "2"), then fuzzy similarity against
/// the option descriptions.
fn match_answer(
    utterance: &str,
    tokens: &[AnnotatedToken],
    candidates: &[ScoredCandidate],
) -> Option<usize> {
    // label keyword mentioned outright, and only one of them
    let mut keyword_hit: Option<usize> = None;
    for (i, c) in candidates.iter().enumerate() {
        if tokens.iter().any(|t| t.lower_is(c.candidate.label.keyword())) {
            if keyword_hit.is_some() {
                keyword_hit = None;
                break;
            }
            keyword_hit = Some(i);
        }
    }
    if let Some(i) = keyword_hit {
        return Some(i);
    }

    // ordinal reference
    const ORDINALS: &[&[&str]] = &[&["first", "1"], &["second", "2"], &["third", "3"]];
    for (i, words) in ORDINALS.iter().enumerate() {
        if i < candidates.len() && tokens.iter().any(|t| words.iter().any(|w| t.lower_is(w))) {
            return Some(i);
        }
    }

    // fuzzy match against "keyword description" phrases
    let options: Vec<String> = candidates
        .iter()
        .map(|c| {
            format!(
                "{} {}",
                c.candidate.label.keyword(),
                c.candidate.label.describe()
            )
        })
        .collect();
    similarity::best_option(utterance, &options)
}

/// Copy anaphora-resolvable kinds from the previous intent when the
/// current utterance points back at it ("do the same for that directory").
fn fill_anaphora(intent: &mut Intent, tokens: &[AnnotatedToken], last: Option<&Intent>) {
    let Some(last) = last else { return };
    const ANAPHORA: &[&str] = &["it", "that", "same", "them", "those"];
    if !tokens.iter().any(|t| ANAPHORA.iter().any(|w| t.lower_is(w))) {
        return;
    }
    for kind in [EntityKind::Target, EntityKind::Directory, EntityKind::File] {
        if !intent.has_entity(kind) {
            if let Some(value) = last.entities.get(&kind) {
                intent.entities.insert(kind, value.clone());
            }
        }
    }
}

fn clarification_prompt(options: &[IntentLabel]) -> String {
    if options.is_empty() {
        return "I didn't catch that. Could you rephrase?".to_string();
    }
    let listed: Vec<String> = options
        .iter()
        .map(|l| format!("{} ({})", l.describe(), l.keyword()))
        .collect();
    format!(
        "I could read that a few ways: {}. Which did you mean?",
        listed.join(", or ")
    )
}

//! Confidence scoring for scored candidates
//!
//! `confidence = w1·specificity + w2·coverage + w3·completeness`, clamped
//! to [0,1]. Identical input always yields an identical score: there is no
//! randomness and no hidden state.

use crate::types::{Entity, EntityKind, IntentLabel, MatchCandidate};
use serde::{Deserialize, Serialize};

/// Specificity is normalized against this cap; the standard library tops
/// out well below it.
pub const SPECIFICITY_CAP: f64 = 8.0;

/// Relative emphasis: specificity > entity completeness > span coverage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub specificity: f64,
    pub coverage: f64,
    pub completeness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            specificity: 0.50,
            coverage: 0.15,
            completeness: 0.35,
        }
    }
}

/// Entity kinds a label needs before its extraction counts as complete.
/// Labels absent here are complete with no entities at all.
pub fn required_kinds(label: IntentLabel) -> &'static [EntityKind] {
    match label {
        IntentLabel::RunScript
        | IntentLabel::Search
        | IntentLabel::Summarize
        | IntentLabel::CreateFile
        | IntentLabel::DeleteFile
        | IntentLabel::Rename
        | IntentLabel::MoveFile => &[EntityKind::Target],
        IntentLabel::ShowFile => &[EntityKind::File],
        _ => &[],
    }
}

/// Fraction of the label's required kinds that were actually extracted.
fn entity_completeness(label: IntentLabel, entities: &[Entity]) -> f64 {
    let required = required_kinds(label);
    if required.is_empty() {
        return 1.0;
    }
    let present = required
        .iter()
        .filter(|kind| entities.iter().any(|e| e.kind == **kind))
        .count();
    present as f64 / required.len() as f64
}

pub fn confidence(
    candidate: &MatchCandidate,
    entities: &[Entity],
    token_count: usize,
    weights: &ScoreWeights,
) -> f64 {
    let spec = (f64::from(candidate.specificity) / SPECIFICITY_CAP).min(1.0);
    let coverage = if token_count == 0 {
        0.0
    } else {
        candidate.span_len() as f64 / token_count as f64
    };
    let completeness = entity_completeness(candidate.label, entities);

    let score = weights.specificity * spec
        + weights.coverage * coverage
        + weights.completeness * completeness;
    score.clamp(0.0, 1.0)
}

//! Session pipeline - one utterance in, one response out
//!
//! Wires the whole turn: annotate -> match -> extract -> score -> resolve
//! -> dispatch. Annotation failure degrades to plain tokens with a logged
//! warning; nothing that happens inside a turn can escape it. One session
//! owns one conversation context and processes one turn at a time.

use crate::annotate::{Annotator, LexiconAnnotator, PlainAnnotator};
use crate::dispatch::{DispatchTable, Outcome};
use crate::entities::EntityExtractor;
use crate::matcher;
use crate::patterns::PatternLibrary;
use crate::resolve::{ConversationContext, Resolution, ResolutionPolicy};
use crate::score::{self, ScoreWeights};
use crate::types::{Intent, IntentLabel, ScoredCandidate};
use tracing::{debug, warn};

/// One interactive session: pipeline components plus its private
/// conversation context.
pub struct Session {
    annotator: Box<dyn Annotator>,
    library: PatternLibrary,
    extractor: EntityExtractor,
    weights: ScoreWeights,
    policy: ResolutionPolicy,
    table: DispatchTable,
    ctx: ConversationContext,
}

/// What one turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnResponse {
    pub text: String,
    pub kind: TurnKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnKind {
    Dispatched { intent: Intent, outcome: Outcome },
    Clarifying { options: Vec<IntentLabel> },
}

impl TurnResponse {
    /// The dispatched intent, if this turn dispatched one.
    pub fn intent(&self) -> Option<&Intent> {
        match &self.kind {
            TurnKind::Dispatched { intent, .. } => Some(intent),
            TurnKind::Clarifying { .. } => None,
        }
    }
}

impl Session {
    pub fn new(annotator: Box<dyn Annotator>, library: PatternLibrary, table: DispatchTable) -> Self {
        Self {
            annotator,
            library,
            extractor: EntityExtractor::new(),
            weights: ScoreWeights::default(),
            policy: ResolutionPolicy::default(),
            table,
            ctx: ConversationContext::new(),
        }
    }

    /// The usual setup: lexicon annotation over the standard pattern
    /// library.
    pub fn standard(table: DispatchTable) -> Self {
        Self::new(
            Box::new(LexiconAnnotator),
            PatternLibrary::standard().clone(),
            table,
        )
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn context(&self) -> &ConversationContext {
        &self.ctx
    }

    /// Drop all per-session state, as on an explicit user reset.
    pub fn reset(&mut self) {
        self.ctx.reset();
    }

    /// Process one utterance fully. Always returns a response.
    pub fn turn(&mut self, utterance: &str) -> TurnResponse {
        self.ctx.turn += 1;

        let tokens = match self.annotator.annotate(utterance) {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(
                    annotator = self.annotator.name(),
                    error = %e,
                    "annotation unavailable, degrading to plain tokens"
                );
                PlainAnnotator.annotate(utterance).unwrap_or_default()
            }
        };

        let candidates = matcher::find_candidates(&tokens, &self.library);
        let scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let entities = self.extractor.extract(&tokens, utterance, &candidate);
                let confidence =
                    score::confidence(&candidate, &entities, tokens.len(), &self.weights);
                ScoredCandidate {
                    candidate,
                    entities,
                    confidence,
                }
            })
            .collect();
        debug!(turn = self.ctx.turn, candidates = scored.len(), "scored");

        match self.policy.resolve(utterance, &tokens, scored, &mut self.ctx) {
            Resolution::Dispatch(intent) => {
                let response = self.table.dispatch(&intent, &self.ctx);
                self.ctx.last_intent = Some(intent.clone());
                TurnResponse {
                    text: response.text,
                    kind: TurnKind::Dispatched {
                        intent,
                        outcome: response.outcome,
                    },
                }
            }
            Resolution::Clarify { prompt, options } => TurnResponse {
                text: prompt,
                kind: TurnKind::Clarifying { options },
            },
        }
    }
}

//! Intent core - natural-language intent recognition and dispatch
//!
//! Turns a free-form utterance into a labeled intent with extracted
//! parameters and a confidence score, then routes it to a registered
//! handler. The pipeline per turn: annotate -> match -> extract -> score
//! -> resolve -> dispatch, with multi-turn clarification when the
//! resolution is ambiguous and a degraded text-only path when annotation
//! is unavailable.

pub mod annotate;
pub mod dispatch;
pub mod entities;
pub mod error;
pub mod matcher;
pub mod patterns;
pub mod pipeline;
pub mod resolve;
pub mod score;
pub mod similarity;
pub mod types;

pub use annotate::{AnnotatedToken, Annotator, LexiconAnnotator, PlainAnnotator};
pub use dispatch::{DispatchTable, HandlerResponse, IntentHandler, Outcome};
pub use error::{AnnotationError, HandlerError};
pub use patterns::PatternLibrary;
pub use pipeline::{Session, TurnKind, TurnResponse};
pub use resolve::{ConversationContext, ResolutionPolicy};
pub use score::ScoreWeights;
pub use types::{Entity, EntityKind, EntityValue, Intent, IntentLabel};

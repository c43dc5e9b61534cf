//! Dispatch table - routing resolved intents to handler capabilities
//!
//! The table is built once at startup and immutable afterwards. Handlers
//! are opaque to the core: the only contract is the `Intent` shape in and
//! a textual response plus an outcome back. Lookups for an unregistered
//! label fail closed onto the fallback handler; a handler error becomes a
//! failed outcome, never a crash of the turn.

use crate::error::HandlerError;
use crate::resolve::ConversationContext;
use crate::types::{Intent, IntentLabel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// How a handled turn went, fed back into the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
}

/// What a handler returns: text for the user, an outcome, and optionally a
/// structured payload for the caller to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    pub text: String,
    pub outcome: Outcome,
    pub payload: Option<serde_json::Value>,
}

impl HandlerResponse {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Success,
            payload: None,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Failure,
            payload: None,
        }
    }

    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            outcome: Outcome::Partial,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// A handler capability. Side effects are the handler's own business; the
/// core awaits exactly one response per dispatch.
pub trait IntentHandler {
    fn handle(
        &self,
        intent: &Intent,
        ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError>;
}

/// Process-lifetime mapping from label to handler. Build with
/// [`DispatchTable::builder`]; registration is additive and ends at
/// `build()`.
pub struct DispatchTable {
    handlers: HashMap<IntentLabel, Box<dyn IntentHandler>>,
    fallback: Box<dyn IntentHandler>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder {
            handlers: HashMap::new(),
            fallback: None,
        }
    }

    /// Route an intent to its handler. Total: unregistered labels go to
    /// the fallback (logged as a configuration gap), handler errors come
    /// back as failed outcomes.
    pub fn dispatch(&self, intent: &Intent, ctx: &ConversationContext) -> HandlerResponse {
        let handler = match self.handlers.get(&intent.label) {
            Some(h) => h.as_ref(),
            None => {
                if intent.label != IntentLabel::Unknown {
                    warn!(label = %intent.label, "no handler registered, using fallback");
                }
                self.fallback.as_ref()
            }
        };
        match handler.handle(intent, ctx) {
            Ok(response) => response,
            Err(e) => HandlerResponse::failure(e.to_string()),
        }
    }

    pub fn is_registered(&self, label: IntentLabel) -> bool {
        self.handlers.contains_key(&label)
    }
}

pub struct DispatchTableBuilder {
    handlers: HashMap<IntentLabel, Box<dyn IntentHandler>>,
    fallback: Option<Box<dyn IntentHandler>>,
}

impl DispatchTableBuilder {
    pub fn register(
        mut self,
        label: IntentLabel,
        handler: impl IntentHandler + 'static,
    ) -> Self {
        self.handlers.insert(label, Box::new(handler));
        self
    }

    /// Handler for `Unknown` and any label nothing was registered for.
    pub fn fallback(mut self, handler: impl IntentHandler + 'static) -> Self {
        self.fallback = Some(Box::new(handler));
        self
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            handlers: self.handlers,
            fallback: self.fallback.unwrap_or_else(|| Box::new(RephraseFallback)),
        }
    }
}

/// Built-in fallback: a gentle nudge toward `help`.
struct RephraseFallback;

impl IntentHandler for RephraseFallback {
    fn handle(
        &self,
        _intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::partial(
            "I'm not sure what you meant. Type 'help' to see what I can do.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    impl IntentHandler for Echo {
        fn handle(
            &self,
            _intent: &Intent,
            _ctx: &ConversationContext,
        ) -> Result<HandlerResponse, HandlerError> {
            Ok(HandlerResponse::success(self.0))
        }
    }

    struct Failing;

    impl IntentHandler for Failing {
        fn handle(
            &self,
            _intent: &Intent,
            _ctx: &ConversationContext,
        ) -> Result<HandlerResponse, HandlerError> {
            Err(HandlerError::failed("script exited with code 1"))
        }
    }

    #[test]
    fn test_dispatch_to_registered_handler() {
        let table = DispatchTable::builder()
            .register(IntentLabel::RunScript, Echo("ran it"))
            .build();
        let ctx = ConversationContext::new();
        let response = table.dispatch(&Intent::new(IntentLabel::RunScript, 0.9, vec![], "run"), &ctx);
        assert_eq!(response.text, "ran it");
        assert_eq!(response.outcome, Outcome::Success);
    }

    #[test]
    fn test_unregistered_label_fails_closed_to_fallback() {
        let table = DispatchTable::builder()
            .register(IntentLabel::RunScript, Echo("ran it"))
            .fallback(Echo("fallback"))
            .build();
        let ctx = ConversationContext::new();
        let response =
            table.dispatch(&Intent::new(IntentLabel::Summarize, 0.9, vec![], "tldr"), &ctx);
        assert_eq!(response.text, "fallback");
    }

    #[test]
    fn test_unknown_routes_to_fallback() {
        let table = DispatchTable::builder().fallback(Echo("chat")).build();
        let ctx = ConversationContext::new();
        let response = table.dispatch(&Intent::unknown("xk2929 zzz"), &ctx);
        assert_eq!(response.text, "chat");
    }

    #[test]
    fn test_handler_error_becomes_failed_outcome() {
        let table = DispatchTable::builder()
            .register(IntentLabel::RunScript, Failing)
            .build();
        let ctx = ConversationContext::new();
        let response = table.dispatch(&Intent::new(IntentLabel::RunScript, 0.9, vec![], "run"), &ctx);
        assert_eq!(response.outcome, Outcome::Failure);
        assert!(response.text.contains("exited with code 1"));
    }

    #[test]
    fn test_default_fallback_exists() {
        let table = DispatchTable::builder().build();
        let ctx = ConversationContext::new();
        let response = table.dispatch(&Intent::unknown("zzz"), &ctx);
        assert_eq!(response.outcome, Outcome::Partial);
    }
}

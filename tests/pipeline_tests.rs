//! End-to-end pipeline scenarios: one utterance in, one response out.

use intent_core::{
    AnnotatedToken, AnnotationError, Annotator, ConversationContext, DispatchTable, EntityKind,
    HandlerError, HandlerResponse, Intent, IntentHandler, IntentLabel, PatternLibrary, Session,
    TurnKind,
};

struct Ack;

impl IntentHandler for Ack {
    fn handle(
        &self,
        intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::success(format!("handled: {}", intent.label)))
    }
}

struct Fallback;

impl IntentHandler for Fallback {
    fn handle(
        &self,
        _intent: &Intent,
        _ctx: &ConversationContext,
    ) -> Result<HandlerResponse, HandlerError> {
        Ok(HandlerResponse::partial("let's just chat"))
    }
}

struct BrokenAnnotator;

impl Annotator for BrokenAnnotator {
    fn annotate(&self, _utterance: &str) -> Result<Vec<AnnotatedToken>, AnnotationError> {
        Err(AnnotationError::Unavailable("engine missing".into()))
    }

    fn name(&self) -> &'static str {
        "broken"
    }
}

fn table() -> DispatchTable {
    DispatchTable::builder()
        .register(IntentLabel::RunScript, Ack)
        .register(IntentLabel::ListFiles, Ack)
        .register(IntentLabel::Search, Ack)
        .register(IntentLabel::Summarize, Ack)
        .register(IntentLabel::Organize, Ack)
        .register(IntentLabel::ShowHelp, Ack)
        .register(IntentLabel::Exit, Ack)
        .fallback(Fallback)
        .build()
}

fn session() -> Session {
    Session::standard(table())
}

fn dispatched(response: &intent_core::TurnResponse) -> &Intent {
    match &response.kind {
        TurnKind::Dispatched { intent, .. } => intent,
        other => panic!("Expected dispatch, got: {:?}", other),
    }
}

#[test]
fn run_command_with_full_parameters() {
    let mut s = session();
    let response = s.turn("run the security scan on all python files in shell_scripts");
    let intent = dispatched(&response);
    assert_eq!(intent.label, IntentLabel::RunScript);
    assert!(
        intent.confidence >= 0.6,
        "confidence {} should clear the dispatch threshold",
        intent.confidence
    );
    assert_eq!(intent.entity(EntityKind::Scope), Some("all"));
    assert_eq!(intent.entity(EntityKind::FileType), Some("python"));
    assert_eq!(intent.entity(EntityKind::Directory), Some("shell_scripts"));
    assert_eq!(intent.entity(EntityKind::Target), Some("security scan"));
}

#[test]
fn summarize_with_scope_and_target() {
    let mut s = session();
    let response = s.turn("summarize the latest README");
    let intent = dispatched(&response);
    assert_eq!(intent.label, IntentLabel::Summarize);
    assert!(intent.confidence >= 0.6);
    assert_eq!(intent.entity(EntityKind::Scope), Some("latest"));
    assert_eq!(intent.entity(EntityKind::Target), Some("README"));
}

#[test]
fn gibberish_resolves_to_unknown_and_chat_fallback() {
    let mut s = session();
    let response = s.turn("xk2929 zzz");
    let intent = dispatched(&response);
    assert_eq!(intent.label, IntentLabel::Unknown);
    assert_eq!(intent.confidence, 0.0);
    assert_eq!(response.text, "let's just chat");
}

#[test]
fn ambiguous_utterance_enters_clarification_listing_both() {
    let mut s = session();
    let response = s.turn("run or summarize something");
    match &response.kind {
        TurnKind::Clarifying { options } => {
            assert!(options.contains(&IntentLabel::RunScript), "options: {:?}", options);
            assert!(options.contains(&IntentLabel::Summarize), "options: {:?}", options);
            assert!(response.text.contains("run"));
            assert!(response.text.contains("summarize"));
        }
        other => panic!("Expected clarification, got: {:?}", other),
    }
}

#[test]
fn clarification_answer_short_circuits() {
    let mut s = session();
    let first = s.turn("run or summarize something");
    assert!(matches!(first.kind, TurnKind::Clarifying { .. }));

    let second = s.turn("the second one");
    let intent = dispatched(&second);
    assert_eq!(intent.label, IntentLabel::Summarize);
}

#[test]
fn clarification_answer_by_keyword() {
    let mut s = session();
    let first = s.turn("run or summarize something");
    assert!(matches!(first.kind, TurnKind::Clarifying { .. }));

    let second = s.turn("summarize please");
    let intent = dispatched(&second);
    assert_eq!(intent.label, IntentLabel::Summarize);
}

#[test]
fn clarification_is_bounded() {
    let mut s = session();
    let first = s.turn("run or summarize something");
    assert!(matches!(first.kind, TurnKind::Clarifying { .. }));

    let second = s.turn("qqfx mmzt");
    assert!(
        matches!(second.kind, TurnKind::Clarifying { .. }),
        "one more clarifying turn is allowed"
    );

    let third = s.turn("qqfx mmzt");
    let intent = dispatched(&third);
    assert_eq!(
        intent.label,
        IntentLabel::RunScript,
        "after the cap the best available candidate is dispatched"
    );
}

#[test]
fn low_confidence_single_candidate_asks_then_accepts_keyword() {
    let mut s = session();
    // bare verb, no target: below the dispatch threshold
    let first = s.turn("run");
    match &first.kind {
        TurnKind::Clarifying { options } => {
            assert_eq!(options, &[IntentLabel::RunScript]);
        }
        other => panic!("Expected clarification, got: {:?}", other),
    }
    let second = s.turn("yes, run");
    assert_eq!(dispatched(&second).label, IntentLabel::RunScript);
}

#[test]
fn identical_input_and_context_is_deterministic() {
    let utterance = "run the security scan on all python files in shell_scripts";
    let mut a = session();
    let mut b = session();
    assert_eq!(a.turn(utterance), b.turn(utterance));

    // and again from equal, non-empty context
    let follow_up = "summarize the latest README";
    assert_eq!(a.turn(follow_up), b.turn(follow_up));
}

#[test]
fn degraded_annotation_still_recognizes_and_extracts() {
    let mut s = Session::new(
        Box::new(BrokenAnnotator),
        PatternLibrary::standard().clone(),
        table(),
    );
    let response = s.turn("run the security scan on all python files in shell_scripts");
    let intent = dispatched(&response);
    assert_eq!(intent.label, IntentLabel::RunScript);
    assert_eq!(intent.entity(EntityKind::Scope), Some("all"));
    assert_eq!(intent.entity(EntityKind::FileType), Some("python"));
    assert_eq!(intent.entity(EntityKind::Directory), Some("shell_scripts"));
    assert_eq!(intent.entity(EntityKind::Target), Some("security scan"));
}

#[test]
fn anaphora_inherits_directory_from_previous_turn() {
    let mut s = session();
    let first = s.turn("list all python files in shell_scripts");
    assert_eq!(dispatched(&first).label, IntentLabel::ListFiles);

    let second = s.turn("organize that directory");
    let intent = dispatched(&second);
    assert_eq!(intent.label, IntentLabel::Organize);
    assert_eq!(intent.entity(EntityKind::Directory), Some("shell_scripts"));
}

#[test]
fn unregistered_label_routes_to_fallback_and_stays_healthy() {
    let mut s = Session::standard(
        DispatchTable::builder()
            .register(IntentLabel::RunScript, Ack)
            .fallback(Fallback)
            .build(),
    );
    let response = s.turn("summarize the latest README");
    assert_eq!(dispatched(&response).label, IntentLabel::Summarize);
    assert_eq!(response.text, "let's just chat");

    // next turn is unaffected
    let next = s.turn("run the cleanup script");
    assert_eq!(dispatched(&next).label, IntentLabel::RunScript);
}

#[test]
fn every_turn_yields_exactly_one_resolution() {
    let mut s = session();
    for utterance in [
        "list all python files",
        "what are the available scripts",
        "help",
        "hello",
        "exit",
        "",
        "x",
    ] {
        let response = s.turn(utterance);
        assert!(!response.text.is_empty(), "utterance: {:?}", utterance);
    }
}

#[test]
fn help_question_beats_create_phrasing() {
    let mut s = session();
    let response = s.turn("how do i create a new script");
    let intent = dispatched(&response);
    assert_eq!(intent.label, IntentLabel::ShowHelp);
}

#[test]
fn exit_is_recognized() {
    let mut s = session();
    let response = s.turn("exit");
    assert_eq!(dispatched(&response).label, IntentLabel::Exit);
}

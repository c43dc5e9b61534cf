//! Intent pattern library - ordered token-constraint sequences per label
//!
//! A pattern is a sequence of per-token predicate sets. A token satisfies a
//! constraint if every predicate in the set holds; a pattern matches if all
//! constraints are satisfied in order. Wildcard constraints absorb zero or
//! more tokens. Patterns are static configuration: built once at startup,
//! read-only during matching.

use crate::annotate::{AnnotatedToken, PosTag};
use crate::types::IntentLabel;
use std::sync::OnceLock;

/// A single per-token test.
#[derive(Debug, Clone)]
pub enum TokenPredicate {
    /// Lowercased surface form is one of the given words.
    LowerIn(&'static [&'static str]),
    /// Lemma is one of the given words. Never fires on unannotated tokens,
    /// which is exactly how the degraded path loses recall.
    LemmaIn(&'static [&'static str]),
    /// Coarse part-of-speech tag. Never fires on unannotated tokens.
    Pos(PosTag),
    /// Token is purely alphabetic.
    IsAlphabetic,
    /// Lowercased surface form ends with one of the given suffixes.
    SuffixIn(&'static [&'static str]),
}

impl TokenPredicate {
    pub fn matches(&self, token: &AnnotatedToken) -> bool {
        match self {
            TokenPredicate::LowerIn(words) => words.iter().any(|w| token.lower_is(w)),
            TokenPredicate::LemmaIn(words) => words.iter().any(|w| token.lemma_is(w)),
            TokenPredicate::Pos(tag) => token.pos == Some(*tag),
            TokenPredicate::IsAlphabetic => token.is_alphabetic(),
            TokenPredicate::SuffixIn(suffixes) => {
                let lower = token.lower();
                suffixes.iter().any(|s| lower.ends_with(s))
            }
        }
    }

    /// Contribution to pattern specificity: closed word sets are narrow,
    /// structural tests are broad.
    fn weight(&self) -> u32 {
        match self {
            TokenPredicate::LowerIn(_) | TokenPredicate::LemmaIn(_) | TokenPredicate::SuffixIn(_) => 2,
            TokenPredicate::Pos(_) | TokenPredicate::IsAlphabetic => 1,
        }
    }
}

/// How many tokens one constraint position may consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quant {
    One,
    ZeroOrMore,
}

/// One position in a pattern: a predicate conjunction plus a quantifier.
#[derive(Debug, Clone)]
pub struct TokenConstraint {
    pub predicates: Vec<TokenPredicate>,
    pub quant: Quant,
}

impl TokenConstraint {
    pub fn one(predicates: Vec<TokenPredicate>) -> Self {
        Self {
            predicates,
            quant: Quant::One,
        }
    }

    /// Absorbs any run of tokens, like spaCy's `OP: "*"`.
    pub fn wildcard() -> Self {
        Self {
            predicates: Vec::new(),
            quant: Quant::ZeroOrMore,
        }
    }

    /// Conjunction: all predicates must hold. An empty set matches anything.
    pub fn satisfied_by(&self, token: &AnnotatedToken) -> bool {
        self.predicates.iter().all(|p| p.matches(token))
    }

    pub fn is_wildcard(&self) -> bool {
        self.predicates.is_empty() && self.quant == Quant::ZeroOrMore
    }

    fn weight(&self) -> u32 {
        self.predicates.iter().map(TokenPredicate::weight).sum()
    }
}

/// One intent pattern: label, constraint sequence, specificity.
#[derive(Debug, Clone)]
pub struct PatternDefinition {
    pub id: usize,
    pub label: IntentLabel,
    pub constraints: Vec<TokenConstraint>,
    /// When false, constraints match an order-preserving subsequence of the
    /// tokens rather than a contiguous run.
    pub contiguous: bool,
    pub specificity: u32,
}

/// The ordered, read-only collection of intent patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<PatternDefinition>,
}

impl PatternLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, label: IntentLabel, constraints: Vec<TokenConstraint>) -> &mut Self {
        self.push(label, constraints, true)
    }

    pub fn add_non_contiguous(
        &mut self,
        label: IntentLabel,
        constraints: Vec<TokenConstraint>,
    ) -> &mut Self {
        self.push(label, constraints, false)
    }

    fn push(
        &mut self,
        label: IntentLabel,
        constraints: Vec<TokenConstraint>,
        contiguous: bool,
    ) -> &mut Self {
        let specificity = constraints.iter().map(TokenConstraint::weight).sum();
        let id = self.patterns.len();
        self.patterns.push(PatternDefinition {
            id,
            label,
            constraints,
            contiguous,
            specificity,
        });
        self
    }

    pub fn patterns(&self) -> &[PatternDefinition] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The built-in library covering the terminal's command vocabulary.
    pub fn standard() -> &'static PatternLibrary {
        static STANDARD: OnceLock<PatternLibrary> = OnceLock::new();
        STANDARD.get_or_init(build_standard)
    }
}

fn lower(words: &'static [&'static str]) -> TokenConstraint {
    TokenConstraint::one(vec![TokenPredicate::LowerIn(words)])
}

fn lemma(words: &'static [&'static str]) -> TokenConstraint {
    TokenConstraint::one(vec![TokenPredicate::LemmaIn(words)])
}

fn wildcard() -> TokenConstraint {
    TokenConstraint::wildcard()
}

fn build_standard() -> PatternLibrary {
    use IntentLabel::*;

    let mut lib = PatternLibrary::new();

    // Listing
    lib.add(ListFiles, vec![lower(&["list", "ls", "display"]), wildcard()]);
    lib.add(
        ListFiles,
        vec![lower(&["show", "display", "get"]), lower(&["me"]), wildcard()],
    );
    lib.add(
        ListFiles,
        vec![
            lower(&["what"]),
            lemma(&["be", "have"]),
            wildcard(),
            lower(&["file", "files", "script", "scripts", "available"]),
        ],
    );

    // Script execution
    lib.add(
        RunScript,
        vec![lower(&["run", "execute", "launch", "start"]), wildcard()],
    );
    lib.add(
        RunScript,
        vec![
            lower(&["use"]),
            wildcard(),
            TokenConstraint::one(vec![
                TokenPredicate::LowerIn(&["script", "program", "tool"]),
                TokenPredicate::Pos(PosTag::Noun),
            ]),
        ],
    );

    // Search
    lib.add(
        Search,
        vec![lower(&["search", "find", "locate", "grep"]), wildcard()],
    );
    lib.add(Search, vec![lower(&["look"]), lower(&["for"]), wildcard()]);

    // Help
    lib.add(ShowHelp, vec![lower(&["help"]), wildcard()]);
    lib.add(ShowHelp, vec![lower(&["how"]), lower(&["to"]), wildcard()]);
    lib.add(
        ShowHelp,
        vec![lower(&["how"]), lower(&["do"]), lower(&["i"]), wildcard()],
    );
    lib.add(
        ShowHelp,
        vec![
            lower(&["what"]),
            lower(&["can"]),
            lower(&["i", "you"]),
            wildcard(),
        ],
    );

    // Organizing
    lib.add(
        Organize,
        vec![lower(&["organize", "sort", "arrange", "clean"]), wildcard()],
    );
    lib.add(
        Organize,
        vec![lower(&["tidy", "categorize"]), lower(&["up"]), wildcard()],
    );

    // Showing file contents
    lib.add(
        ShowFile,
        vec![lower(&["show", "open", "view", "cat"]), wildcard()],
    );
    lib.add(
        ShowFile,
        vec![
            lower(&["read"]),
            wildcard(),
            lower(&["file", "content", "contents"]),
        ],
    );

    // File management
    lib.add(
        CreateFile,
        vec![lower(&["create", "make", "new", "touch"]), wildcard()],
    );
    lib.add(
        DeleteFile,
        vec![lower(&["delete", "remove", "trash", "rm", "erase"]), wildcard()],
    );
    lib.add(
        DeleteFile,
        vec![lower(&["get"]), lower(&["rid"]), lower(&["of"]), wildcard()],
    );
    lib.add(Rename, vec![lower(&["rename"]), wildcard()]);
    lib.add(
        Rename,
        vec![lower(&["change"]), wildcard(), lower(&["name"])],
    );
    lib.add(
        MoveFile,
        vec![lower(&["move", "mv", "cp", "copy", "transfer"]), wildcard()],
    );

    // Summaries
    lib.add(
        Summarize,
        vec![
            lower(&["summarize", "summarise", "summary", "tldr"]),
            wildcard(),
        ],
    );
    lib.add(
        Summarize,
        vec![
            lower(&["give"]),
            lower(&["me"]),
            wildcard(),
            lower(&["summary"]),
        ],
    );

    // Greetings go to chat; unmatched questions fall through to Unknown and
    // reach the chat fallback that way.
    lib.add(AiChat, vec![lower(&["hi", "hello", "hey", "howdy"]), wildcard()]);

    // Session end
    lib.add(
        Exit,
        vec![lower(&["exit", "quit", "bye", "goodbye", "close"]), wildcard()],
    );
    lib.add(Exit, vec![lower(&["end"]), lower(&["session"])]);

    lib
}

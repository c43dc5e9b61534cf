//! Annotation adapter - linguistic annotation behind a capability trait
//!
//! The pipeline never depends on a concrete NLP engine. `Annotator` is the
//! boundary: utterance in, ordered annotated tokens out. `LexiconAnnotator`
//! is the full in-process implementation (embedded POS/lemma lexicon with
//! suffix heuristics, light NER, a dependency sketch). `PlainAnnotator` is
//! the degraded path used when annotation fails: token text and offsets
//! only, so pattern predicates that need POS/lemma/NER simply stop firing.

use crate::error::AnnotationError;
use ahash::{AHashMap, AHashSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Coarse part-of-speech tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PosTag {
    Noun,
    Verb,
    Adj,
    Adv,
    Pron,
    Det,
    Prep,
    Conj,
    Num,
    Other,
}

/// Dependency relation to the governing token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepRel {
    Root,
    Dobj,
    Pobj,
    Other,
}

/// Named-entity label attached by the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NerLabel {
    Date,
    Person,
    FileName,
    Number,
}

/// One annotated token. Immutable once produced; owned by the turn and
/// discarded when the turn completes. Annotation fields are `None` on the
/// degraded path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedToken {
    pub text: String,
    pub lemma: Option<String>,
    pub pos: Option<PosTag>,
    /// Fine-grained tag ("NN", "NNS", "VB", ...), derived from `pos`.
    pub tag: Option<String>,
    pub dep: Option<DepRel>,
    pub head: Option<usize>,
    pub ent: Option<NerLabel>,
    /// Character offsets into the original utterance.
    pub start: usize,
    pub end: usize,
}

impl AnnotatedToken {
    pub fn lower_is(&self, word: &str) -> bool {
        self.text.eq_ignore_ascii_case(word)
    }

    /// Lemma comparison, falling back to the surface form when the token
    /// carries no lemma (degraded path).
    pub fn lemma_is(&self, word: &str) -> bool {
        match &self.lemma {
            Some(lemma) => lemma.eq_ignore_ascii_case(word),
            None => false,
        }
    }

    pub fn is_alphabetic(&self) -> bool {
        !self.text.is_empty() && self.text.chars().all(|c| c.is_alphabetic())
    }

    pub fn lower(&self) -> String {
        self.text.to_lowercase()
    }
}

/// Capability interface for the annotation engine.
pub trait Annotator {
    fn annotate(&self, utterance: &str) -> Result<Vec<AnnotatedToken>, AnnotationError>;

    /// Short name for logging.
    fn name(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// Tokenization (shared by both annotators)
// ---------------------------------------------------------------------------

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | '~')
}

/// Split an utterance into word tokens with character offsets. Punctuation
/// and quotes act as separators; dots, slashes, and underscores stay inside
/// a token so file names and paths survive intact. A trailing dot is
/// stripped (sentence punctuation, not an extension).
pub fn tokenize(utterance: &str) -> Vec<(String, usize, usize)> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut token_start = 0usize;

    for (i, c) in utterance.char_indices() {
        if is_word_char(c) {
            if current.is_empty() {
                token_start = i;
            }
            current.push(c);
        } else if !current.is_empty() {
            push_token(&mut tokens, &mut current, token_start, i);
        }
    }
    if !current.is_empty() {
        push_token(&mut tokens, &mut current, token_start, utterance.len());
    }
    tokens
}

fn push_token(tokens: &mut Vec<(String, usize, usize)>, current: &mut String, start: usize, end: usize) {
    let mut text = std::mem::take(current);
    let mut end = end;
    while text.ends_with('.') {
        text.pop();
        end -= 1;
    }
    if !text.is_empty() {
        tokens.push((text, start, end));
    }
}

// ---------------------------------------------------------------------------
// Degraded annotator
// ---------------------------------------------------------------------------

/// Text-and-offsets-only annotator for the fallback path.
#[derive(Debug, Default)]
pub struct PlainAnnotator;

impl Annotator for PlainAnnotator {
    fn annotate(&self, utterance: &str) -> Result<Vec<AnnotatedToken>, AnnotationError> {
        Ok(tokenize(utterance)
            .into_iter()
            .map(|(text, start, end)| AnnotatedToken {
                text,
                lemma: None,
                pos: None,
                tag: None,
                dep: None,
                head: None,
                ent: None,
                start,
                end,
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        "plain"
    }
}

// ---------------------------------------------------------------------------
// Lexicon annotator
// ---------------------------------------------------------------------------

struct Lexicon {
    verbs: AHashSet<&'static str>,
    nouns: AHashSet<&'static str>,
    dets: AHashSet<&'static str>,
    preps: AHashSet<&'static str>,
    prons: AHashSet<&'static str>,
    adjs: AHashSet<&'static str>,
    advs: AHashSet<&'static str>,
    conjs: AHashSet<&'static str>,
    lemmas: AHashMap<&'static str, &'static str>,
}

static LEXICON: OnceLock<Lexicon> = OnceLock::new();

fn lexicon() -> &'static Lexicon {
    LEXICON.get_or_init(|| Lexicon {
        verbs: [
            "run", "execute", "launch", "start", "begin", "initiate", "use", "list", "show",
            "display", "ls", "get", "find", "search", "locate", "grep", "look", "help",
            "organize", "sort", "arrange", "clean", "tidy", "categorize", "open", "view", "cat",
            "read", "create", "make", "touch", "add", "delete", "remove", "trash", "rm", "erase",
            "rename", "change", "move", "mv", "copy", "cp", "transfer", "summarize", "summarise",
            "give", "exit", "quit", "close", "end", "is", "are", "was", "were", "am", "be", "do",
            "does", "did", "have", "has", "had", "can", "could", "would", "should", "will",
            "want", "need", "mean",
        ]
        .into_iter()
        .collect(),
        nouns: [
            "file", "files", "script", "scripts", "directory", "directories", "folder",
            "folders", "document", "documents", "readme", "summary", "scan", "backup", "log",
            "logs", "program", "programs", "tool", "tools", "process", "processes", "terminal",
            "command", "commands", "session", "name", "content", "contents", "item", "items",
            "text", "workspace", "everything", "password", "utilities", "things", "thing",
            "topic", "rid",
        ]
        .into_iter()
        .collect(),
        dets: [
            "the", "a", "an", "this", "that", "these", "those", "my", "your", "its", "his",
            "her", "our", "their", "some", "any", "no", "each",
        ]
        .into_iter()
        .collect(),
        preps: [
            "in", "on", "at", "to", "for", "with", "from", "of", "into", "inside", "under",
            "over", "by", "about",
        ]
        .into_iter()
        .collect(),
        prons: ["i", "you", "me", "we", "it", "they", "them", "he", "she", "us", "what", "who",
            "which"]
            .into_iter()
            .collect(),
        adjs: [
            "all", "every", "latest", "recent", "new", "newest", "old", "oldest", "last",
            "first", "second", "available", "big", "small", "same",
        ]
        .into_iter()
        .collect(),
        advs: ["quickly", "recursively", "again", "here", "there", "now", "how", "why", "when",
            "where", "up", "out"]
            .into_iter()
            .collect(),
        conjs: ["and", "or", "but"].into_iter().collect(),
        lemmas: [
            ("is", "be"),
            ("are", "be"),
            ("was", "be"),
            ("were", "be"),
            ("am", "be"),
            ("has", "have"),
            ("had", "have"),
            ("does", "do"),
            ("did", "do"),
            ("ran", "run"),
            ("summarise", "summarize"),
            ("ls", "list"),
            ("mv", "move"),
            ("cp", "copy"),
            ("rm", "delete"),
            ("files", "file"),
            ("scripts", "script"),
            ("directories", "directory"),
            ("folders", "folder"),
            ("documents", "document"),
            ("logs", "log"),
            ("contents", "content"),
            ("processes", "process"),
        ]
        .into_iter()
        .collect(),
    })
}

static FILE_RE: OnceLock<Regex> = OnceLock::new();
static DATE_RE: OnceLock<Regex> = OnceLock::new();

fn file_re() -> &'static Regex {
    FILE_RE.get_or_init(|| {
        Regex::new(r"^[\w~./-]+\.(py|sh|rs|md|txt|json|yaml|toml|csv|log|pdf|doc|docx)$")
            .expect("file name regex")
    })
}

fn date_re() -> &'static Regex {
    DATE_RE.get_or_init(|| {
        Regex::new(r"^(\d{4}-\d{2}-\d{2}|january|february|march|april|may|june|july|august|september|october|november|december|today|yesterday|tomorrow)$")
            .expect("date regex")
    })
}

/// Full in-process annotation: lexicon POS tagging with suffix heuristics,
/// lemmatization, regex NER, and a rough dependency sketch (root verb,
/// direct object, prepositional objects).
#[derive(Debug, Default)]
pub struct LexiconAnnotator;

impl LexiconAnnotator {
    fn tag_pos(&self, lower: &str) -> PosTag {
        let lex = lexicon();
        // Closed classes win over the open-class default.
        if lex.dets.contains(lower) {
            PosTag::Det
        } else if lex.preps.contains(lower) {
            PosTag::Prep
        } else if lex.prons.contains(lower) {
            PosTag::Pron
        } else if lex.conjs.contains(lower) {
            PosTag::Conj
        } else if lex.verbs.contains(lower) {
            PosTag::Verb
        } else if lex.adjs.contains(lower) {
            PosTag::Adj
        } else if lex.advs.contains(lower) {
            PosTag::Adv
        } else if lex.nouns.contains(lower) {
            PosTag::Noun
        } else if lower.chars().all(|c| c.is_ascii_digit()) {
            PosTag::Num
        } else if lower.chars().all(|c| c.is_alphabetic()) {
            // Open-class default: unknown alphabetic words behave as nouns,
            // which is what downstream noun-phrase collection wants.
            PosTag::Noun
        } else {
            PosTag::Other
        }
    }

    fn lemma_of(&self, lower: &str, pos: PosTag) -> String {
        let lex = lexicon();
        if let Some(lemma) = lex.lemmas.get(lower) {
            return (*lemma).to_string();
        }
        // Plural stripping for unknown nouns: "pdfs" -> "pdf".
        if pos == PosTag::Noun && lower.len() > 3 && lower.ends_with('s') && !lower.ends_with("ss")
        {
            return lower[..lower.len() - 1].to_string();
        }
        lower.to_string()
    }

    fn fine_tag(&self, pos: PosTag, lower: &str) -> &'static str {
        match pos {
            PosTag::Noun => {
                if lower.ends_with('s') && !lower.ends_with("ss") {
                    "NNS"
                } else {
                    "NN"
                }
            }
            PosTag::Verb => "VB",
            PosTag::Adj => "JJ",
            PosTag::Adv => "RB",
            PosTag::Pron => "PRP",
            PosTag::Det => "DT",
            PosTag::Prep => "IN",
            PosTag::Conj => "CC",
            PosTag::Num => "CD",
            PosTag::Other => "XX",
        }
    }

    fn tag_ner(&self, text: &str, lower: &str, index: usize) -> Option<NerLabel> {
        if file_re().is_match(lower) {
            return Some(NerLabel::FileName);
        }
        if date_re().is_match(lower) {
            return Some(NerLabel::Date);
        }
        if text.chars().all(|c| c.is_ascii_digit()) {
            return Some(NerLabel::Number);
        }
        // Capitalized mid-sentence word outside the lexicon reads as a name.
        if index > 0 {
            let mut chars = text.chars();
            let capitalized = chars.next().map(|c| c.is_uppercase()).unwrap_or(false)
                && chars.clone().all(|c| c.is_lowercase());
            let lex = lexicon();
            if capitalized
                && text.len() > 1
                && !lex.nouns.contains(lower)
                && !lex.verbs.contains(lower)
                && !lex.adjs.contains(lower)
            {
                return Some(NerLabel::Person);
            }
        }
        None
    }
}

impl Annotator for LexiconAnnotator {
    fn annotate(&self, utterance: &str) -> Result<Vec<AnnotatedToken>, AnnotationError> {
        let raw = tokenize(utterance);
        let mut tokens: Vec<AnnotatedToken> = Vec::with_capacity(raw.len());

        for (i, (text, start, end)) in raw.into_iter().enumerate() {
            let lower = text.to_lowercase();
            let pos = self.tag_pos(&lower);
            let lemma = self.lemma_of(&lower, pos);
            let tag = self.fine_tag(pos, &lower);
            let ent = self.tag_ner(&text, &lower, i);
            tokens.push(AnnotatedToken {
                text,
                lemma: Some(lemma),
                pos: Some(pos),
                tag: Some(tag.to_string()),
                dep: None,
                head: None,
                ent,
                start,
                end,
            });
        }

        sketch_dependencies(&mut tokens);
        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "lexicon"
    }
}

/// Rough dependency sketch: the first verb is the root; the first noun
/// after it is its direct object; a noun after a preposition attaches to
/// that preposition. Everything else hangs off the root.
fn sketch_dependencies(tokens: &mut [AnnotatedToken]) {
    let root = tokens
        .iter()
        .position(|t| t.pos == Some(PosTag::Verb))
        .unwrap_or(0);
    let mut dobj_taken = false;
    let mut last_prep: Option<usize> = None;

    for i in 0..tokens.len() {
        if i == root {
            tokens[i].dep = Some(DepRel::Root);
            tokens[i].head = Some(root);
            continue;
        }
        match tokens[i].pos {
            Some(PosTag::Prep) => {
                last_prep = Some(i);
                tokens[i].dep = Some(DepRel::Other);
                tokens[i].head = Some(root);
            }
            Some(PosTag::Noun) => {
                if let Some(p) = last_prep {
                    tokens[i].dep = Some(DepRel::Pobj);
                    tokens[i].head = Some(p);
                    last_prep = None;
                } else if i > root && !dobj_taken {
                    tokens[i].dep = Some(DepRel::Dobj);
                    tokens[i].head = Some(root);
                    dobj_taken = true;
                } else {
                    tokens[i].dep = Some(DepRel::Other);
                    tokens[i].head = Some(root);
                }
            }
            _ => {
                tokens[i].dep = Some(DepRel::Other);
                tokens[i].head = Some(root);
            }
        }
    }
}

//! Core data types for intent recognition results

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of intents the pipeline can resolve to.
///
/// New labels are additive; `Unknown` is the terminal default when no
/// pattern matches, and is always routed to the conversational fallback
/// handler rather than treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentLabel {
    RunScript,
    ListFiles,
    Search,
    ShowFile,
    CreateFile,
    DeleteFile,
    Rename,
    MoveFile,
    Organize,
    Summarize,
    ShowHelp,
    AiChat,
    Exit,
    Unknown,
}

impl IntentLabel {
    /// Short keyword used in clarification prompts and for matching
    /// clarification answers ("did you mean run or summarize?").
    pub fn keyword(&self) -> &'static str {
        match self {
            IntentLabel::RunScript => "run",
            IntentLabel::ListFiles => "list",
            IntentLabel::Search => "search",
            IntentLabel::ShowFile => "show",
            IntentLabel::CreateFile => "create",
            IntentLabel::DeleteFile => "delete",
            IntentLabel::Rename => "rename",
            IntentLabel::MoveFile => "move",
            IntentLabel::Organize => "organize",
            IntentLabel::Summarize => "summarize",
            IntentLabel::ShowHelp => "help",
            IntentLabel::AiChat => "chat",
            IntentLabel::Exit => "exit",
            IntentLabel::Unknown => "unknown",
        }
    }

    /// One-line description shown when listing clarification options.
    pub fn describe(&self) -> &'static str {
        match self {
            IntentLabel::RunScript => "run a script",
            IntentLabel::ListFiles => "list files",
            IntentLabel::Search => "search for files or content",
            IntentLabel::ShowFile => "show a file",
            IntentLabel::CreateFile => "create a file",
            IntentLabel::DeleteFile => "delete a file",
            IntentLabel::Rename => "rename a file",
            IntentLabel::MoveFile => "move or copy a file",
            IntentLabel::Organize => "organize the workspace",
            IntentLabel::Summarize => "summarize a file",
            IntentLabel::ShowHelp => "show help",
            IntentLabel::AiChat => "just chat",
            IntentLabel::Exit => "exit the terminal",
            IntentLabel::Unknown => "something else",
        }
    }
}

impl fmt::Display for IntentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Kinds of parameters an intent can carry. Kinds are unique keys within
/// one resolved intent; repeated extractions of the same kind are merged
/// into a list value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Target,
    File,
    Directory,
    Scope,
    FileType,
    Date,
    Person,
    Generic,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Target => "target",
            EntityKind::File => "file",
            EntityKind::Directory => "directory",
            EntityKind::Scope => "scope",
            EntityKind::FileType => "file_type",
            EntityKind::Date => "date",
            EntityKind::Person => "person",
            EntityKind::Generic => "generic",
        };
        f.write_str(s)
    }
}

/// An extracted parameter value with its source span (token indices).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub value: String,
    pub start: usize,
    pub end: usize,
}

impl Entity {
    pub fn new(kind: EntityKind, value: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            start,
            end,
        }
    }
}

/// Value of one entity kind inside a resolved intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    One(String),
    Many(Vec<String>),
}

impl EntityValue {
    /// The single value, or the first of a merged list.
    pub fn first(&self) -> &str {
        match self {
            EntityValue::One(v) => v,
            EntityValue::Many(vs) => vs.first().map(String::as_str).unwrap_or(""),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            EntityValue::One(v) => {
                let first = std::mem::take(v);
                *self = EntityValue::Many(vec![first, value]);
            }
            EntityValue::Many(vs) => vs.push(value),
        }
    }
}

/// A provisional pattern match before extraction and scoring.
///
/// `start..end` is the full matched span (wildcards included) and is what
/// coverage scoring uses; `head_end` is the index just past the last token
/// consumed by a concrete constraint, and is what entity extraction anchors
/// its positional heuristics to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub pattern: usize,
    pub label: IntentLabel,
    pub start: usize,
    pub end: usize,
    pub head_end: usize,
    pub specificity: u32,
}

impl MatchCandidate {
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

/// A candidate after entity extraction and confidence scoring, ready for
/// the resolution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub candidate: MatchCandidate,
    pub entities: Vec<Entity>,
    pub confidence: f64,
}

/// A fully resolved intent, produced exactly once per turn and passed by
/// value to the dispatched handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub label: IntentLabel,
    pub confidence: f64,
    pub entities: BTreeMap<EntityKind, EntityValue>,
    pub utterance: String,
}

impl Intent {
    pub fn new(
        label: IntentLabel,
        confidence: f64,
        entities: Vec<Entity>,
        utterance: impl Into<String>,
    ) -> Self {
        Self {
            label,
            confidence,
            entities: merge_entities(entities),
            utterance: utterance.into(),
        }
    }

    /// The terminal default: no pattern matched.
    pub fn unknown(utterance: impl Into<String>) -> Self {
        Self {
            label: IntentLabel::Unknown,
            confidence: 0.0,
            entities: BTreeMap::new(),
            utterance: utterance.into(),
        }
    }

    /// First value for a kind, if present.
    pub fn entity(&self, kind: EntityKind) -> Option<&str> {
        self.entities.get(&kind).map(EntityValue::first)
    }

    pub fn has_entity(&self, kind: EntityKind) -> bool {
        self.entities.contains_key(&kind)
    }
}

/// Fold extracted entities into the unique-kind map, merging duplicates of
/// a kind into a list value. Identical repeated values collapse.
pub fn merge_entities(entities: Vec<Entity>) -> BTreeMap<EntityKind, EntityValue> {
    use std::collections::btree_map::Entry;

    let mut map: BTreeMap<EntityKind, EntityValue> = BTreeMap::new();
    for entity in entities {
        match map.entry(entity.kind) {
            Entry::Vacant(slot) => {
                slot.insert(EntityValue::One(entity.value));
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                let duplicate = match &*existing {
                    EntityValue::One(v) => *v == entity.value,
                    EntityValue::Many(vs) => vs.iter().any(|v| *v == entity.value),
                };
                if !duplicate {
                    existing.push(entity.value);
                }
            }
        }
    }
    map
}

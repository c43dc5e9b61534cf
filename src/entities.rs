//! Entity extraction relative to a matched candidate
//!
//! Runs in priority order: named-entity spans from the annotator, then
//! token-text tests, then positional heuristics anchored to the candidate's
//! concrete span. Absence never raises; a missing kind is simply left unset
//! and lowers the confidence score downstream.

use crate::annotate::{AnnotatedToken, DepRel, NerLabel, PosTag};
use crate::types::{Entity, EntityKind, IntentLabel, MatchCandidate};
use regex::Regex;

/// How far past a scope keyword the extractor looks for a qualifying token.
pub const SCOPE_WINDOW: usize = 5;

const SCOPE_WORDS: &[&str] = &["all", "every", "each", "latest", "recent", "newest", "oldest"];

const TYPE_WORDS: &[(&str, &str)] = &[
    ("python", "python"),
    ("shell", "shell"),
    ("bash", "shell"),
    ("markdown", "markdown"),
    ("text", "text"),
    ("rust", "rust"),
    ("json", "json"),
    ("csv", "csv"),
    ("javascript", "javascript"),
];

const EXTENSION_MAP: &[(&str, &str)] = &[
    ("py", "python"),
    ("sh", "shell"),
    ("rs", "rust"),
    ("md", "markdown"),
    ("txt", "text"),
    ("json", "json"),
    ("csv", "csv"),
    ("log", "log"),
    ("pdf", "pdf"),
    ("yaml", "config"),
    ("toml", "config"),
];

/// Well-known directory names, matched by name alone.
const SPECIAL_DIRS: &[&str] = &[
    "desktop",
    "downloads",
    "documents",
    "docs",
    "home",
    "temp",
    "tmp",
];

const DIR_PREPS: &[&str] = &["in", "into", "inside", "under", "within"];

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "my", "your", "our", "their", "some",
    "any",
];

/// Words that end a noun phrase once collection has started.
const BOUNDARY_WORDS: &[&str] = &[
    "in", "on", "at", "to", "for", "of", "with", "from", "into", "inside", "under", "over", "by",
    "about", "within", "and", "or", "but", "please",
];

/// Container nouns too generic to be a useful target on their own.
const GENERIC_NOUNS: &[&str] = &[
    "file",
    "files",
    "script",
    "scripts",
    "folder",
    "folders",
    "directory",
    "directories",
    "item",
    "items",
    "thing",
    "things",
    "everything",
    "content",
    "contents",
    "stuff",
];

/// Clitic remnants left behind by apostrophe splitting ("what's" -> "what", "s").
const CLITICS: &[&str] = &["s", "t", "m", "d", "re", "ve", "ll"];

fn word_in(list: &[&str], token: &AnnotatedToken) -> bool {
    list.iter().any(|w| token.lower_is(w))
}

fn type_word(token: &AnnotatedToken) -> Option<&'static str> {
    let lower = token.lower();
    TYPE_WORDS
        .iter()
        .find(|(word, _)| *word == lower)
        .map(|(_, ty)| *ty)
}

fn extension_type(lower: &str) -> Option<&'static str> {
    let (_, ext) = lower.rsplit_once('.')?;
    EXTENSION_MAP
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ty)| *ty)
}

/// Extracts entities for one candidate from the annotated tokens.
pub struct EntityExtractor {
    quoted: Regex,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            quoted: Regex::new(r#""([^"]+)"|'([^']+)'"#).expect("quoted span regex"),
        }
    }

    pub fn extract(
        &self,
        tokens: &[AnnotatedToken],
        utterance: &str,
        candidate: &MatchCandidate,
    ) -> Vec<Entity> {
        let mut entities = Vec::new();
        let mut claimed = vec![false; tokens.len()];
        let mut have_target = false;

        // The concrete anchor of the match is the command itself, never a
        // parameter.
        for flag in claimed
            .iter_mut()
            .take(candidate.head_end.min(tokens.len()))
            .skip(candidate.start)
        {
            *flag = true;
        }

        // (a) named-entity spans from the annotator
        for (i, token) in tokens.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            match token.ent {
                Some(NerLabel::FileName) => {
                    entities.push(Entity::new(EntityKind::File, token.text.clone(), i, i + 1));
                    if let Some(ty) = extension_type(&token.lower()) {
                        entities.push(Entity::new(EntityKind::FileType, ty, i, i + 1));
                    }
                    claimed[i] = true;
                }
                Some(NerLabel::Date) => {
                    entities.push(Entity::new(EntityKind::Date, token.text.clone(), i, i + 1));
                    claimed[i] = true;
                }
                Some(NerLabel::Person) => {
                    entities.push(Entity::new(EntityKind::Person, token.text.clone(), i, i + 1));
                    claimed[i] = true;
                }
                Some(NerLabel::Number) => {
                    entities.push(Entity::new(EntityKind::Generic, token.text.clone(), i, i + 1));
                    claimed[i] = true;
                }
                None => {}
            }
        }

        // (b) token-text tests; these carry the degraded path, where no
        // NER labels exist at all
        if let Some(m) = self.quoted.captures(utterance) {
            let value = m
                .get(1)
                .or_else(|| m.get(2))
                .map(|g| g.as_str().to_string());
            if let Some(value) = value {
                let whole = m.get(0).map(|g| (g.start(), g.end())).unwrap_or((0, 0));
                let (ts, te) = token_span(tokens, whole.0, whole.1);
                for flag in claimed.iter_mut().take(te).skip(ts) {
                    *flag = true;
                }
                entities.push(Entity::new(EntityKind::Target, value, ts, te));
                have_target = true;
            }
        }
        for (i, token) in tokens.iter().enumerate() {
            if claimed[i] {
                continue;
            }
            let lower = token.lower();
            if let Some(ty) = extension_type(&lower) {
                entities.push(Entity::new(EntityKind::File, token.text.clone(), i, i + 1));
                entities.push(Entity::new(EntityKind::FileType, ty, i, i + 1));
                claimed[i] = true;
            } else if lower.contains('/') || lower.starts_with('~') {
                entities.push(Entity::new(EntityKind::Directory, token.text.clone(), i, i + 1));
                claimed[i] = true;
            } else if SPECIAL_DIRS.contains(&lower.as_str()) {
                entities.push(Entity::new(EntityKind::Directory, lower, i, i + 1));
                claimed[i] = true;
            } else if let Some(ty) = type_word(token) {
                entities.push(Entity::new(EntityKind::FileType, ty, i, i + 1));
                claimed[i] = true;
            }
        }

        // (c) positional heuristics, anchored to the concrete span

        // scope keywords, plus a qualifying token in the trailing window
        for i in 0..tokens.len() {
            if claimed[i] || !word_in(SCOPE_WORDS, &tokens[i]) {
                continue;
            }
            entities.push(Entity::new(EntityKind::Scope, tokens[i].lower(), i, i + 1));
            claimed[i] = true;
            for j in i + 1..tokens.len().min(i + 1 + SCOPE_WINDOW) {
                if claimed[j] {
                    continue;
                }
                if let Some(ty) = type_word(&tokens[j]) {
                    entities.push(Entity::new(EntityKind::FileType, ty, j, j + 1));
                    claimed[j] = true;
                    break;
                }
            }
        }

        // "in <directory>"
        for i in 0..tokens.len() {
            if !word_in(DIR_PREPS, &tokens[i]) {
                continue;
            }
            for j in i + 1..tokens.len().min(i + 3) {
                if claimed[j] || word_in(DETERMINERS, &tokens[j]) {
                    continue;
                }
                entities.push(Entity::new(
                    EntityKind::Directory,
                    tokens[j].text.clone(),
                    j,
                    j + 1,
                ));
                claimed[j] = true;
                break;
            }
        }

        // search terms ride the dependency sketch: the direct object of a
        // search verb is the thing being looked for
        if candidate.label == IntentLabel::Search {
            for (i, token) in tokens.iter().enumerate() {
                if claimed[i] || token.dep != Some(DepRel::Dobj) {
                    continue;
                }
                let head_is_search = token
                    .head
                    .and_then(|h| tokens.get(h))
                    .map(|h| {
                        ["find", "search", "locate", "grep", "look"]
                            .iter()
                            .any(|v| h.lemma_is(v))
                    })
                    .unwrap_or(false);
                if head_is_search {
                    entities.push(Entity::new(EntityKind::Target, token.text.clone(), i, i + 1));
                    claimed[i] = true;
                    have_target = true;
                    break;
                }
            }
        }

        // first noun phrase after the concrete span
        if !have_target {
            if let Some(entity) = self.noun_phrase_after(tokens, candidate.head_end, &claimed) {
                entities.push(entity);
                have_target = true;
            }
        }

        // a named file is a perfectly good target when nothing else claimed
        // the role
        if !have_target {
            if let Some(file) = entities.iter().find(|e| e.kind == EntityKind::File) {
                entities.push(Entity::new(
                    EntityKind::Target,
                    file.value.clone(),
                    file.start,
                    file.end,
                ));
            }
        }

        entities
    }

    /// Collect the first run of noun-ish tokens at or after `from`,
    /// skipping determiners and already-claimed tokens, stopping at the
    /// first boundary word once collection has started.
    fn noun_phrase_after(
        &self,
        tokens: &[AnnotatedToken],
        from: usize,
        claimed: &[bool],
    ) -> Option<Entity> {
        let mut words: Vec<String> = Vec::new();
        let mut span_start = 0usize;
        let mut span_end = 0usize;

        for i in from..tokens.len() {
            let token = &tokens[i];
            let started = !words.is_empty();

            if claimed[i] || word_in(BOUNDARY_WORDS, token) {
                if started {
                    break;
                }
                continue;
            }
            if word_in(DETERMINERS, token) || word_in(CLITICS, token) {
                if started {
                    break;
                }
                continue;
            }

            let noun_ish = match token.pos {
                Some(PosTag::Noun) | Some(PosTag::Adj) => true,
                Some(_) => token.ent == Some(NerLabel::FileName),
                // degraded path: plain alphabetic words qualify
                None => token.is_alphabetic(),
            };
            let generic_start = !started && word_in(GENERIC_NOUNS, token);

            if noun_ish && !generic_start {
                if !started {
                    span_start = i;
                }
                span_end = i + 1;
                words.push(token.text.clone());
            } else if started {
                break;
            }
        }

        if words.is_empty() {
            None
        } else {
            Some(Entity::new(
                EntityKind::Target,
                words.join(" "),
                span_start,
                span_end,
            ))
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a character range back to the token indices it covers.
fn token_span(tokens: &[AnnotatedToken], start: usize, end: usize) -> (usize, usize) {
    let mut ts = tokens.len();
    let mut te = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.end > start && token.start < end {
            ts = ts.min(i);
            te = te.max(i + 1);
        }
    }
    if ts > te {
        (0, 0)
    } else {
        (ts, te)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotate::{Annotator, LexiconAnnotator, PlainAnnotator};
    use crate::matcher::find_candidates;
    use crate::patterns::PatternLibrary;

    fn run_candidate(utterance: &str) -> (Vec<crate::annotate::AnnotatedToken>, MatchCandidate) {
        let tokens = LexiconAnnotator.annotate(utterance).expect("annotate");
        let candidates = find_candidates(&tokens, PatternLibrary::standard());
        let c = candidates
            .into_iter()
            .max_by_key(|c| c.specificity)
            .expect("at least one candidate");
        (tokens, c)
    }

    fn values(entities: &[Entity], kind: EntityKind) -> Vec<&str> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.value.as_str())
            .collect()
    }

    #[test]
    fn test_full_extraction_for_run_command() {
        let (tokens, c) = run_candidate("run the security scan on all python files in shell_scripts");
        assert_eq!(c.label, IntentLabel::RunScript);
        let entities =
            EntityExtractor::new().extract(&tokens, "run the security scan on all python files in shell_scripts", &c);
        assert_eq!(values(&entities, EntityKind::Scope), vec!["all"]);
        assert_eq!(values(&entities, EntityKind::FileType), vec!["python"]);
        assert_eq!(values(&entities, EntityKind::Directory), vec!["shell_scripts"]);
        assert_eq!(values(&entities, EntityKind::Target), vec!["security scan"]);
    }

    #[test]
    fn test_scope_and_target_for_summarize() {
        let (tokens, c) = run_candidate("summarize the latest README");
        let entities = EntityExtractor::new().extract(&tokens, "summarize the latest README", &c);
        assert_eq!(values(&entities, EntityKind::Scope), vec!["latest"]);
        assert_eq!(values(&entities, EntityKind::Target), vec!["README"]);
    }

    #[test]
    fn test_file_name_becomes_file_type_and_target() {
        let (tokens, c) = run_candidate("run backup.sh");
        let entities = EntityExtractor::new().extract(&tokens, "run backup.sh", &c);
        assert_eq!(values(&entities, EntityKind::File), vec!["backup.sh"]);
        assert_eq!(values(&entities, EntityKind::FileType), vec!["shell"]);
        assert_eq!(values(&entities, EntityKind::Target), vec!["backup.sh"]);
    }

    #[test]
    fn test_quoted_span_is_target() {
        let tokens = LexiconAnnotator
            .annotate("run 'nightly cleanup' now")
            .expect("annotate");
        let candidates = find_candidates(&tokens, PatternLibrary::standard());
        let c = candidates
            .iter()
            .find(|c| c.label == IntentLabel::RunScript)
            .expect("run candidate")
            .clone();
        let entities = EntityExtractor::new().extract(&tokens, "run 'nightly cleanup' now", &c);
        assert_eq!(values(&entities, EntityKind::Target), vec!["nightly cleanup"]);
    }

    #[test]
    fn test_generic_container_noun_is_not_a_target() {
        let (tokens, c) = run_candidate("list all python files");
        let entities = EntityExtractor::new().extract(&tokens, "list all python files", &c);
        assert!(values(&entities, EntityKind::Target).is_empty());
        assert_eq!(values(&entities, EntityKind::Scope), vec!["all"]);
        assert_eq!(values(&entities, EntityKind::FileType), vec!["python"]);
    }

    #[test]
    fn test_search_term_from_dependency_sketch() {
        let (tokens, c) = run_candidate("find the password in docs");
        let entities = EntityExtractor::new().extract(&tokens, "find the password in docs", &c);
        assert_eq!(values(&entities, EntityKind::Target), vec!["password"]);
        assert_eq!(values(&entities, EntityKind::Directory), vec!["docs"]);
    }

    #[test]
    fn test_degraded_tokens_still_extract() {
        let plain = PlainAnnotator
            .annotate("run the security scan on all python files in shell_scripts")
            .expect("annotate");
        let candidates = find_candidates(&plain, PatternLibrary::standard());
        let c = candidates
            .iter()
            .find(|c| c.label == IntentLabel::RunScript)
            .expect("run candidate")
            .clone();
        let entities = EntityExtractor::new().extract(
            &plain,
            "run the security scan on all python files in shell_scripts",
            &c,
        );
        assert_eq!(values(&entities, EntityKind::Scope), vec!["all"]);
        assert_eq!(values(&entities, EntityKind::FileType), vec!["python"]);
        assert_eq!(values(&entities, EntityKind::Directory), vec!["shell_scripts"]);
        assert_eq!(values(&entities, EntityKind::Target), vec!["security scan"]);
    }

    #[test]
    fn test_absence_extracts_nothing() {
        let (tokens, c) = run_candidate("organize");
        let entities = EntityExtractor::new().extract(&tokens, "organize", &c);
        assert!(entities.is_empty());
    }

    #[test]
    fn test_date_entity() {
        let (tokens, c) = run_candidate("list files from 2024-05-01");
        let entities = EntityExtractor::new().extract(&tokens, "list files from 2024-05-01", &c);
        assert_eq!(values(&entities, EntityKind::Date), vec!["2024-05-01"]);
    }
}

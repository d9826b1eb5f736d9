//! Skill Extractor: free text to a normalised, deterministic set of skill tokens.
//!
//! Three passes over lower-cased text, unioned:
//! 1. Vocabulary: Aho-Corasick over the curated list plus aliases. Every match
//!    on token boundaries is a candidate (`go` never fires inside `google`);
//!    the longest candidate wins where they overlap.
//! 2. Noun chunks: `<modifier> <head noun>` pairs such as "distributed systems".
//! 3. Acronym entities: 2-6 character upper-case tokens (`GCP`, `ETL`) that are
//!    neither part of a vocabulary match nor a common English word.
//!
//! Passes 2 and 3 only see the first `MAX_PHRASE_SCAN_CHARS` characters.

pub mod vocabulary;

use std::collections::{BTreeSet, HashMap, HashSet};

use aho_corasick::AhoCorasick;
use regex::Regex;

use crate::skills::vocabulary::{
    ACRONYM_STOPLIST, ALIASES, COMMON_WORDS, HEAD_NOUNS, SKILLS, STOP_MODIFIERS,
};

/// Upper bound on input to the phrase and acronym passes.
pub const MAX_PHRASE_SCAN_CHARS: usize = 20_000;

/// Tags longer than this are treated as prose, not skills.
const MAX_TAG_LEN: usize = 40;

/// Ordered so serialized output and test assertions are stable.
pub type SkillSet = BTreeSet<String>;

pub struct SkillExtractor {
    matcher: AhoCorasick,
    /// pattern index -> canonical skill
    canonical: Vec<&'static str>,
    /// pattern index -> surface form as written in the vocabulary
    surface: Vec<&'static str>,
    aliases: HashMap<&'static str, &'static str>,
    head_nouns: HashSet<&'static str>,
    stop_modifiers: HashSet<&'static str>,
    acronym_stoplist: HashSet<&'static str>,
    clause_split: Regex,
    word: Regex,
    acronym: Regex,
}

impl SkillExtractor {
    pub fn new() -> Result<Self, anyhow::Error> {
        let mut surface: Vec<&'static str> = SKILLS.to_vec();
        let mut canonical: Vec<&'static str> = SKILLS.to_vec();
        for &(alias, target) in ALIASES {
            surface.push(alias);
            canonical.push(target);
        }

        // Standard match kind so overlapping matches can be enumerated.
        let matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .build(&surface)?;

        Ok(Self {
            matcher,
            canonical,
            surface,
            aliases: ALIASES.iter().copied().collect(),
            head_nouns: HEAD_NOUNS.iter().copied().collect(),
            stop_modifiers: STOP_MODIFIERS.iter().copied().collect(),
            acronym_stoplist: ACRONYM_STOPLIST
                .iter()
                .chain(COMMON_WORDS)
                .copied()
                .collect(),
            clause_split: Regex::new(r"[,.;:!?()\[\]\n\r\t/|•·]+")?,
            word: Regex::new(r"[a-z][a-z0-9+#-]*")?,
            acronym: Regex::new(r"\b[A-Z][A-Z0-9]{1,5}\b")?,
        })
    }

    /// Extracts skills from `text`. Empty text yields an empty set.
    pub fn extract_skills(&self, text: &str) -> SkillSet {
        let mut skills = SkillSet::new();
        if text.trim().is_empty() {
            return skills;
        }

        let spans = self.vocabulary_spans(text);
        let mut matched_surfaces: Vec<&str> = Vec::with_capacity(spans.len());
        for span in &spans {
            skills.insert(self.canonical[span.pattern].to_string());
            matched_surfaces.push(self.surface[span.pattern]);
        }

        let capped = truncate_chars(text, MAX_PHRASE_SCAN_CHARS);
        let capped_lower = capped.to_lowercase();
        for phrase in self.noun_chunks(&capped_lower) {
            let covered = matched_surfaces
                .iter()
                .any(|s| *s == phrase || s.ends_with(&format!(" {phrase}")));
            if !covered {
                skills.insert(self.canonicalize(&phrase));
            }
        }

        for mat in self.acronym.find_iter(capped) {
            // "CI" of "CI/CD", "REST" of "REST APIs"
            if spans.iter().any(|s| mat.start() < s.end && s.start < mat.end()) {
                continue;
            }
            let token = mat.as_str().to_lowercase();
            if self.acronym_stoplist.contains(token.as_str()) {
                continue;
            }
            skills.insert(self.canonicalize(&token));
        }

        skills
    }

    /// Skills from the text plus curated tags. A tag is taken whole: known
    /// skills and aliases are canonicalised, anything else short enough is
    /// kept verbatim after normalisation.
    pub fn extract_skills_with_tags(&self, text: &str, tags: &[String]) -> SkillSet {
        let mut skills = self.extract_skills(text);
        for tag in tags {
            let normalized = normalize_skill(tag);
            if normalized.is_empty() || normalized.len() > MAX_TAG_LEN {
                continue;
            }
            skills.insert(self.canonicalize(&normalized));
        }
        skills
    }

    /// Non-overlapping vocabulary matches in `text`, leftmost first and longest
    /// at each position. Candidates failing the token-boundary check are
    /// dropped before the choice, so "react nativescript" still yields `react`.
    fn vocabulary_spans(&self, text: &str) -> Vec<VocabSpan> {
        let mut candidates: Vec<VocabSpan> = self
            .matcher
            .find_overlapping_iter(text)
            .filter(|m| on_token_boundary(text, m.start(), m.end()))
            .map(|m| VocabSpan {
                start: m.start(),
                end: m.end(),
                pattern: m.pattern().as_usize(),
            })
            .collect();
        candidates.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

        let mut spans: Vec<VocabSpan> = Vec::new();
        for candidate in candidates {
            if spans.last().map_or(true, |last| candidate.start >= last.end) {
                spans.push(candidate);
            }
        }
        spans
    }

    fn canonicalize(&self, skill: &str) -> String {
        self.aliases
            .get(skill)
            .map(|s| s.to_string())
            .unwrap_or_else(|| skill.to_string())
    }

    fn noun_chunks(&self, lower: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        for clause in self.clause_split.split(lower) {
            let words: Vec<&str> = self.word.find_iter(clause).map(|m| m.as_str()).collect();
            for pair in words.windows(2) {
                let (modifier, head) = (pair[0], pair[1]);
                if !self.head_nouns.contains(head) {
                    continue;
                }
                if modifier.len() <= 2
                    || self.stop_modifiers.contains(modifier)
                    || self.head_nouns.contains(modifier)
                {
                    continue;
                }
                chunks.push(format!("{modifier} {head}"));
            }
        }
        chunks
    }
}

#[derive(Debug, Clone, Copy)]
struct VocabSpan {
    start: usize,
    end: usize,
    pattern: usize,
}

/// Lower-cases and collapses whitespace; strips surrounding punctuation.
pub fn normalize_skill(raw: &str) -> String {
    let collapsed = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    collapsed
        .trim_matches(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .to_string()
}

fn on_token_boundary(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_word_char(c));
    let after_ok = text[end..]
        .chars()
        .next()
        .map_or(true, |c| !(is_word_char(c) || c == '+' || c == '#'));
    before_ok && after_ok
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

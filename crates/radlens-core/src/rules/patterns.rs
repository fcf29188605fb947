//! Shared keyword lists and text-matching helpers for the rules.
//!
//! Every rule matches case-insensitively. Keyword lists are plain slices so
//! a rule change is a one-line edit here; the regexes cover the few places
//! where line structure or word boundaries matter.

use lazy_static::lazy_static;
use regex::Regex;

use crate::finding::FindingSeverity;

// =========================================================================
// KEYWORD LISTS
// =========================================================================

/// At least one must appear for text to count as a medical report.
pub const MEDICAL_CONTENT_KEYWORDS: &[&str] = &[
    "patient",
    "diagnosis",
    "findings",
    "impression",
    "clinical",
    "medical",
    "radiology",
    "x-ray",
    "ct",
    "mri",
    "ultrasound",
    "scan",
    "image",
    "study",
];

/// Terms the extractor falls back to when no list items are present.
pub const FINDING_TERMS: &[&str] = &[
    "normal",
    "abnormal",
    "opacity",
    "consolidation",
    "pneumonia",
    "effusion",
    "fracture",
    "mass",
    "nodule",
    "atelectasis",
];

pub const HIGH_RISK_KEYWORDS: &[&str] = &[
    "urgent",
    "immediate",
    "critical",
    "severe",
    "acute",
    "emergency",
];

pub const MEDIUM_RISK_KEYWORDS: &[&str] = &[
    "moderate",
    "follow-up",
    "monitor",
    "consider",
    "possible",
];

/// Each occurrence lowers confidence.
pub const UNCERTAINTY_TERMS: &[&str] = &["possible", "probable", "uncertain", "unclear"];

/// Presence of either raises confidence.
pub const STRUCTURE_MARKERS: &[&str] = &["findings", "recommendations"];

/// A pathology term with the severity and location assumed when the
/// finding itself names neither.
pub struct Pathology {
    pub term: &'static str,
    pub severity: FindingSeverity,
    pub location: Option<&'static str>,
}

pub const PATHOLOGIES: &[Pathology] = &[
    Pathology { term: "pneumonia", severity: FindingSeverity::Moderate, location: Some("lung") },
    Pathology { term: "consolidation", severity: FindingSeverity::Moderate, location: Some("lung") },
    Pathology { term: "opacity", severity: FindingSeverity::Mild, location: Some("lung") },
    Pathology { term: "infiltrate", severity: FindingSeverity::Moderate, location: Some("lung") },
    Pathology { term: "effusion", severity: FindingSeverity::Moderate, location: Some("pleural") },
    Pathology { term: "pneumothorax", severity: FindingSeverity::Severe, location: Some("pleural") },
    Pathology { term: "fracture", severity: FindingSeverity::Severe, location: Some("bone") },
    Pathology { term: "dislocation", severity: FindingSeverity::Severe, location: Some("joint") },
    Pathology { term: "nodule", severity: FindingSeverity::Moderate, location: Some("lung") },
    Pathology { term: "mass", severity: FindingSeverity::Severe, location: None },
    Pathology { term: "lesion", severity: FindingSeverity::Moderate, location: None },
    Pathology { term: "cardiomegaly", severity: FindingSeverity::Moderate, location: Some("heart") },
    Pathology { term: "atelectasis", severity: FindingSeverity::Mild, location: Some("lung") },
];

/// Table entry for a lowercase pathology term.
pub fn pathology(term: &str) -> Option<&'static Pathology> {
    PATHOLOGIES.iter().find(|p| p.term == term)
}

lazy_static! {
    /// Bullet (`-`, `•`, `*`) or numbered (`1.`) list item at line start.
    pub static ref LIST_ITEM_PATTERN: Regex = Regex::new(
        r"^\s*(?:[-•*]|\d+\.)\s+(?P<item>.*)$"
    ).unwrap();

    pub static ref NORMAL_WORD: Regex = Regex::new(r"(?i)\bnormal\b").unwrap();

    pub static ref ABNORMAL_WORD: Regex = Regex::new(r"(?i)\babnormal\b").unwrap();

    /// Cues that negate a term appearing later in the same clause.
    pub static ref NEGATION_CUE: Regex = Regex::new(
        r"(?i)\b(no|not|without|negative for|free of|absence of)\b"
    ).unwrap();

    /// Contrastive words that close a negation's scope.
    pub static ref SCOPE_TERMINATOR: Regex = Regex::new(
        r"(?i)\b(but|however|although|though|yet|except)\b"
    ).unwrap();

    /// `or`/`nor` after a cue marks a negated list ("no effusion, pneumothorax
    /// or consolidation"), so its commas do not close the scope.
    pub static ref LIST_COORDINATOR: Regex = Regex::new(r"(?i)\b(or|nor)\b").unwrap();

    pub static ref PATHOLOGY_TERM: Regex = Regex::new(
        r"(?i)\b(pneumonia|consolidation|opacity|infiltrate|effusion|pneumothorax|fracture|dislocation|nodule|mass|lesion|cardiomegaly|atelectasis)\b"
    ).unwrap();

    pub static ref ANATOMICAL_LOCATION: Regex = Regex::new(
        r"(?i)\b((?:right|left)\s+(?:upper|middle|lower)\s+(?:lobe|lung)|bilateral|heart|mediastinum|pleural|costophrenic|hilum|apex|base|periphery)\b"
    ).unwrap();

    /// One named group per severity level.
    pub static ref SEVERITY_MODIFIER: Regex = Regex::new(
        r"(?i)\b(?:(?P<mild>mild|small|minimal|slight)|(?P<moderate>moderate|medium|chronic)|(?P<severe>severe|large|extensive|massive|acute))\b"
    ).unwrap();

    pub static ref DESCRIPTIVE_CUE: Regex = Regex::new(
        r"(?i)\b(consistent with|suggestive of|compatible with)\b"
    ).unwrap();

    pub static ref HEDGING_CUE: Regex = Regex::new(
        r"(?i)\b(possible|probable|likely|suspicious|questionable)\b"
    ).unwrap();

    pub static ref DEFINITIVE_CUE: Regex = Regex::new(
        r"(?i)\b(definite|clear|obvious|evident)\b"
    ).unwrap();
}

/// Check whether lowercase `haystack` contains any of `terms`.
pub fn contains_any(haystack: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| haystack.contains(term))
}

/// Non-overlapping occurrences of `term` in lowercase `haystack`.
pub fn count_occurrences(haystack: &str, term: &str) -> usize {
    if term.is_empty() {
        return 0;
    }
    haystack.matches(term).count()
}

/// Uppercase the first character.
pub fn capitalize(term: &str) -> String {
    let mut chars = term.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Split on sentence-ending punctuation. A period followed by a digit
/// (`2.5 cm`) does not end a sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    split_where(text, &['!', '?'])
}

/// Like [`split_sentences`], but also breaks on `;` and line ends. This is
/// the scope a negation cue applies to.
pub fn split_clauses(text: &str) -> Vec<&str> {
    split_where(text, &['!', '?', ';', '\n'])
}

fn split_where<'a>(text: &'a str, breaks: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        let is_break = if ch == '.' {
            !matches!(chars.peek(), Some((_, next)) if next.is_ascii_digit())
        } else {
            breaks.contains(&ch)
        };

        if is_break {
            push_trimmed(&mut parts, &text[start..idx]);
            start = idx + ch.len_utf8();
        }
    }
    push_trimmed(&mut parts, &text[start..]);

    parts
}

fn push_trimmed<'a>(parts: &mut Vec<&'a str>, part: &'a str) {
    let trimmed = part.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed);
    }
}

/// True when `term` occurs in `text` at least once outside the scope of a
/// negation cue. "No opacity noted" does not affirm opacity.
///
/// A cue's scope runs to the end of its clause, or to an earlier contrastive
/// word ("but", "however"), or to a comma unless the cue heads an `or` list.
/// "No pneumothorax, opacity at the base" affirms opacity.
pub fn mentions_affirmatively(text: &str, term: &str) -> bool {
    let term = term.to_lowercase();
    split_clauses(text).into_iter().any(|clause| {
        let clause = clause.to_lowercase();
        clause
            .match_indices(term.as_str())
            .any(|(pos, _)| !is_negated_at(&clause, pos))
    })
}

/// Whether the lowercase `clause` negates whatever starts at byte `pos`.
fn is_negated_at(clause: &str, pos: usize) -> bool {
    let Some(cue) = NEGATION_CUE.find_iter(&clause[..pos]).last() else {
        return false;
    };

    let between = &clause[cue.end()..pos];
    if SCOPE_TERMINATOR.is_match(between) {
        return false;
    }
    !(between.contains(',') && !LIST_COORDINATOR.is_match(&clause[cue.end()..]))
}

//! Document Graph
//!
//! Structural parsing of documents — `key:: value` property lines and
//! `[[Target]]` wikilinks — plus the small conjunctive query surface over
//! them. Nothing here is indexed or cached; callers scan through
//! [`crate::walker::DocWalker`] on every query.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Property-line pattern: `key:: value` at the start of a line.
fn property_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*([A-Za-z0-9_-]+)::\s*(.+?)\s*$").unwrap())
}

/// Wikilink pattern: `[[Target]]`, non-greedy, no nested brackets.
fn wikilink_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\[\]]+)\]\]").unwrap())
}

/// Extract `key:: value` properties from document content.
///
/// Later occurrences of the same key win; keys are lowercased for
/// case-insensitive lookup.
pub fn extract_properties(content: &str) -> HashMap<String, String> {
    property_regex()
        .captures_iter(content)
        .map(|cap| (cap[1].to_lowercase(), cap[2].to_string()))
        .collect()
}

/// Extract wikilink targets: deduplicated, insertion-ordered.
pub fn extract_links(content: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for cap in wikilink_regex().captures_iter(content) {
        let target = cap[1].trim().to_string();
        if seen.insert(target.to_lowercase()) {
            out.push(target);
        }
    }
    out
}

/// One matching document with human-readable descriptions of what matched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphMatch {
    pub path: String,
    pub matches: Vec<String>,
}

/// One clause of a conjunctive graph query.
#[derive(Debug, Clone, PartialEq)]
enum Predicate {
    /// `key:: value` — property equality, value match case-insensitive
    PropertyEquals { key: String, value: String },
    /// `[[Target]]` — document links to Target
    HasLink { target: String },
    /// `link:substr` — document has a link whose target contains substr
    LinkContains { substr: String },
}

/// Parse the query into predicates. `None` means the syntax was not
/// recognized; the caller yields an empty result set rather than erroring.
fn parse_query(query: &str) -> Option<Vec<Predicate>> {
    static SPLIT: OnceLock<Regex> = OnceLock::new();
    let split = SPLIT.get_or_init(|| Regex::new(r"(?i)\s+AND\s+").unwrap());

    let trimmed = query.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut predicates = Vec::new();
    for clause in split.split(trimmed) {
        let clause = clause.trim();
        if let Some(inner) = clause
            .strip_prefix("[[")
            .and_then(|rest| rest.strip_suffix("]]"))
        {
            let target = inner.trim();
            if target.is_empty() {
                return None;
            }
            predicates.push(Predicate::HasLink {
                target: target.to_string(),
            });
        } else if let Some((key, value)) = clause.split_once("::") {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                return None;
            }
            predicates.push(Predicate::PropertyEquals {
                key: key.to_lowercase(),
                value: value.to_string(),
            });
        } else if let Some(substr) = clause.strip_prefix("link:") {
            let substr = substr.trim();
            if substr.is_empty() {
                return None;
            }
            predicates.push(Predicate::LinkContains {
                substr: substr.to_string(),
            });
        } else {
            return None;
        }
    }

    Some(predicates)
}

/// Evaluate a conjunctive query against one document's content.
///
/// Returns the match descriptions when every predicate holds, `None`
/// otherwise. Unrecognized query syntax never matches.
pub fn match_document(query: &str, content: &str) -> Option<Vec<String>> {
    let predicates = parse_query(query)?;
    let properties = extract_properties(content);
    let links = extract_links(content);

    let mut descriptions = Vec::new();
    for predicate in &predicates {
        match predicate {
            Predicate::PropertyEquals { key, value } => {
                let found = properties
                    .get(key)
                    .filter(|actual| actual.eq_ignore_ascii_case(value))?;
                descriptions.push(format!("property {key}:: {found}"));
            }
            Predicate::HasLink { target } => {
                let found = links
                    .iter()
                    .find(|link| link.eq_ignore_ascii_case(target))?;
                descriptions.push(format!("links to [[{found}]]"));
            }
            Predicate::LinkContains { substr } => {
                let needle = substr.to_lowercase();
                let found = links
                    .iter()
                    .find(|link| link.to_lowercase().contains(&needle))?;
                descriptions.push(format!("link target [[{found}]] contains '{substr}'"));
            }
        }
    }
    Some(descriptions)
}

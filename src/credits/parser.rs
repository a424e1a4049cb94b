//! Parser for semicolon-delimited creator credit strings.
//!
//! Upstream credits are formatted inconsistently, for example
//! `"Writer: Stan Lee, Larry Lieber; Penciller: Jack Kirby"` or
//! `"Stan Lee (Writer); Jack Kirby (Penciller) (3)"`. Every segment is
//! tried against [`CREDIT_MATCHERS`] in order and the first hit wins.
//! Segments nothing recognises are kept under [`UNKNOWN_ROLE`], so parsing
//! never fails.

use super::RoleMap;
use lazy_static::lazy_static;
use regex::Regex;

/// Role used for segments that match none of the known credit patterns.
pub const UNKNOWN_ROLE: &str = "Unknown";

lazy_static! {
    /// Trailing issue-count annotation such as `(3)` or `[12]`.
    static ref COUNT_ANNOTATION: Regex = Regex::new(r"\s*(?:\(\s*\d+\s*\)|\[\s*\d+\s*\])\s*$")
        .expect("Failed to compile count annotation regex");

    /// `Role: Name, Name`
    static ref ROLE_COLON: Regex =
        Regex::new(r"^([^:]+?)\s*:\s*(.+)$").expect("Failed to compile role-colon regex");

    /// `Name (Role)`
    static ref NAME_PAREN: Regex =
        Regex::new(r"^(.+?)\s*\(([^()]+)\)$").expect("Failed to compile name-paren regex");
}

/// Outcome of classifying a single credit segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditMatch {
    /// `Role: Name[, Name...]`
    RoleColon { role: String, names: Vec<String> },
    /// `Name (Role)`
    TrailingParen { name: String, role: String },
    /// Anything else, kept verbatim.
    Unmatched(String),
}

type CreditMatcher = fn(&str) -> Option<CreditMatch>;

/// Matchers in priority order.
const CREDIT_MATCHERS: &[CreditMatcher] = &[match_role_colon, match_trailing_paren];

fn match_role_colon(segment: &str) -> Option<CreditMatch> {
    let captures = ROLE_COLON.captures(segment)?;
    let role = captures.get(1)?.as_str().trim();
    let names: Vec<String> = captures
        .get(2)?
        .as_str()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    if role.is_empty() || names.is_empty() {
        return None;
    }

    Some(CreditMatch::RoleColon {
        role: role.to_string(),
        names,
    })
}

fn match_trailing_paren(segment: &str) -> Option<CreditMatch> {
    let captures = NAME_PAREN.captures(segment)?;
    let name = captures.get(1)?.as_str().trim();
    let role = captures.get(2)?.as_str().trim();

    if name.is_empty() || role.is_empty() {
        return None;
    }

    Some(CreditMatch::TrailingParen {
        name: name.to_string(),
        role: role.to_string(),
    })
}

fn strip_count_annotation(segment: &str) -> &str {
    match COUNT_ANNOTATION.find(segment) {
        Some(annotation) => segment[..annotation.start()].trim_end(),
        None => segment,
    }
}

/// Classify one trimmed credit segment.
///
/// A trailing numeric annotation is removed before any pattern is tried.
pub fn classify_segment(segment: &str) -> CreditMatch {
    let segment = strip_count_annotation(segment.trim());
    CREDIT_MATCHERS
        .iter()
        .find_map(|matcher| matcher(segment))
        .unwrap_or_else(|| CreditMatch::Unmatched(segment.to_string()))
}

/// Parse a raw credit string into a role map.
///
/// Absent or blank input yields an empty map.
pub fn parse_credits(raw: Option<&str>) -> RoleMap {
    let mut role_map = RoleMap::new();
    let raw = match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return role_map,
    };

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        match classify_segment(segment) {
            CreditMatch::RoleColon { role, names } => {
                for name in names {
                    role_map.push(&role, &name);
                }
            }
            CreditMatch::TrailingParen { name, role } => role_map.push(&role, &name),
            // Nothing left once the annotation is gone.
            CreditMatch::Unmatched(text) if text.is_empty() => {}
            CreditMatch::Unmatched(text) => role_map.push(UNKNOWN_ROLE, &text),
        }
    }

    role_map
}

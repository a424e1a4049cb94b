//! Creator credit handling.
//!
//! Raw credit strings are scraped free text. [`parser`] turns them into a
//! [`RoleMap`], [`roles`] narrows that map to the authorial roles and
//! flattens it to the name set used for overlap comparisons.

pub mod parser;
pub mod roles;

pub use parser::{classify_segment, parse_credits, CreditMatch, UNKNOWN_ROLE};
pub use roles::{authorial_creators, filter_roles, flatten_names, DEFAULT_AUTHORIAL_ROLES};

use serde::Serialize;
use std::collections::BTreeMap;

/// Role name (as written in the credit) to the ordered list of credited names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RoleMap(BTreeMap<String, Vec<String>>);

impl RoleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, role: &str, name: &str) {
        self.0
            .entry(role.to_string())
            .or_default()
            .push(name.to_string());
    }

    pub fn get(&self, role: &str) -> Option<&[String]> {
        self.0.get(role).map(|names| names.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0
            .iter()
            .map(|(role, names)| (role.as_str(), names.as_slice()))
    }

    pub fn roles(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|role| role.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<R: AsRef<str>, N: AsRef<str>> FromIterator<(R, N)> for RoleMap {
    fn from_iter<T: IntoIterator<Item = (R, N)>>(iter: T) -> Self {
        let mut map = RoleMap::new();
        for (role, name) in iter {
            map.push(role.as_ref(), name.as_ref());
        }
        map
    }
}

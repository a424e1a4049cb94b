//! Authorial role filtering.

use super::{parse_credits, RoleMap};
use std::collections::BTreeSet;

/// Roles that define the creative identity of a book.
pub const DEFAULT_AUTHORIAL_ROLES: &[&str] = &["writer", "penciller"];

/// Keep only the entries whose role, case-folded, is one of `roles`.
pub fn filter_roles<S: AsRef<str>>(role_map: &RoleMap, roles: &[S]) -> RoleMap {
    let wanted: Vec<String> = roles
        .iter()
        .map(|role| role.as_ref().trim().to_lowercase())
        .collect();

    role_map
        .iter()
        .filter(|(role, _)| wanted.contains(&role.trim().to_lowercase()))
        .flat_map(|(role, names)| names.iter().map(move |name| (role, name)))
        .collect()
}

/// Every credited name, case-folded and de-duplicated. Roles are dropped.
pub fn flatten_names(role_map: &RoleMap) -> BTreeSet<String> {
    role_map
        .iter()
        .flat_map(|(_, names)| names.iter())
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Parse, filter to `roles` and flatten in one go.
pub fn authorial_creators<S: AsRef<str>>(raw: Option<&str>, roles: &[S]) -> BTreeSet<String> {
    flatten_names(&filter_roles(&parse_credits(raw), roles))
}

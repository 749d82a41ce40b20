//! `${key}` placeholder substitution for configuration values.
//!
//! Variables may reference each other; `resolve_all` substitutes until a
//! fixed point is reached and rejects self references and cycles.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// Names of all `${..}` placeholders in `text`, in order of appearance.
pub fn placeholder_names(text: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        names.push(&after[..end]);
        rest = &after[end + 1..];
    }
    names
}

/// Replace every `${key}` in `text` whose key is defined in `vars`.
///
/// Undefined placeholders are kept verbatim. Substitution is a single pass;
/// values inserted are not scanned again.
pub fn substitute(text: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        out.push_str(&rest[..start]);
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("${");
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

fn references(value: &str, key: &str) -> bool {
    placeholder_names(value).contains(&key)
}

/// Resolve all variables against each other until nothing changes.
pub fn resolve_all(vars: &BTreeMap<String, String>) -> CoreResult<BTreeMap<String, String>> {
    let mut resolved = vars.clone();

    for (key, value) in &resolved {
        if references(value, key) {
            return Err(CoreError::CircularPlaceholder { key: key.clone() });
        }
    }

    for _ in 0..=resolved.len() {
        let snapshot = resolved.clone();
        let mut changed = false;
        for (key, value) in resolved.iter_mut() {
            let next = substitute(value, &snapshot);
            if references(&next, key) {
                return Err(CoreError::CircularPlaceholder { key: key.clone() });
            }
            if next != *value {
                *value = next;
                changed = true;
            }
        }
        if !changed {
            return Ok(resolved);
        }
    }

    let key = resolved
        .iter()
        .find(|(_, v)| {
            placeholder_names(v)
                .iter()
                .any(|name| resolved.contains_key(*name))
        })
        .map(|(k, _)| k.clone())
        .unwrap_or_default();
    Err(CoreError::CircularPlaceholder { key })
}

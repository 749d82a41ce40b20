//! Shared serde helper functions used across multiple modules.

/// Serde default function that returns `true`.
pub fn default_true() -> bool {
    true
}

/// `skip_serializing_if` predicate for boolean markers that are off.
pub fn is_false(value: &bool) -> bool {
    !*value
}

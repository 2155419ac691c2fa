//! The identity fold shared by validation and matching.
//!
//! Two entries of a keyed collection describe the same thing when their folded
//! names are equal. Folding uppercases rather than lowercases so that `ß` and
//! `SS` land on the same key.

#[cfg(test)]
#[path = "identity_tests.rs"]
mod tests;

/// Folds `identity` into the form entries are compared by.
///
/// ```rust
/// use config_manager::fold_identity;
///
/// assert_eq!(fold_identity("  Octocat "), "OCTOCAT");
/// assert_eq!(fold_identity("straße"), fold_identity("STRASSE"));
/// ```
pub fn fold_identity(identity: &str) -> String {
    identity.trim().to_uppercase()
}

//! Names of the repository under reconciliation and of its owner.
//!
//! Both are checked once, before any remote call, so a typo in the spec fails
//! fast as malformed input rather than as a 404 halfway through a pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{ReconcileError, ReconcileResult};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Character and length limits for one kind of GitHub name.
struct NameRules {
    kind: &'static str,
    max_len: usize,
    extra_chars: &'static [char],
    leading_forbidden: &'static [char],
    trailing_forbidden: &'static [char],
    allow_double_hyphen: bool,
}

const REPOSITORY_RULES: NameRules = NameRules {
    kind: "repository",
    max_len: 100,
    extra_chars: &['-', '_', '.'],
    leading_forbidden: &['.', '-'],
    trailing_forbidden: &[],
    allow_double_hyphen: true,
};

const ORGANIZATION_RULES: NameRules = NameRules {
    kind: "organization",
    max_len: 39,
    extra_chars: &['-'],
    leading_forbidden: &['-'],
    trailing_forbidden: &['-'],
    allow_double_hyphen: false,
};

impl NameRules {
    fn check(&self, name: &str) -> ReconcileResult<()> {
        let kind = self.kind;
        let len = name.chars().count();
        if len == 0 {
            return Err(malformed(format!("{kind} name is empty")));
        }
        if len > self.max_len {
            return Err(malformed(format!(
                "{kind} name '{name}' has {len} characters, at most {} are allowed",
                self.max_len
            )));
        }
        if let Some(c) = name.chars().next().filter(|c| self.leading_forbidden.contains(c)) {
            return Err(malformed(format!("{kind} name '{name}' starts with '{c}'")));
        }
        if let Some(c) = name.chars().last().filter(|c| self.trailing_forbidden.contains(c)) {
            return Err(malformed(format!("{kind} name '{name}' ends with '{c}'")));
        }
        if !self.allow_double_hyphen && name.contains("--") {
            return Err(malformed(format!("{kind} name '{name}' contains '--'")));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !c.is_alphanumeric() && !self.extra_chars.contains(c))
        {
            return Err(malformed(format!(
                "{kind} name '{name}' contains the character '{c}'"
            )));
        }
        Ok(())
    }
}

fn malformed(reason: String) -> ReconcileError {
    ReconcileError::MalformedInput { reason }
}

/// A repository name: up to 100 letters, digits, `-`, `_` or `.`, not
/// starting with `.` or `-`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryName(String);

impl RepositoryName {
    pub fn new(name: impl Into<String>) -> ReconcileResult<Self> {
        let name = name.into();
        REPOSITORY_RULES.check(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An organization login: up to 39 letters, digits or single hyphens, with no
/// hyphen at either end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationName(String);

impl OrganizationName {
    pub fn new(name: impl Into<String>) -> ReconcileResult<Self> {
        let name = name.into();
        ORGANIZATION_RULES.check(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepositoryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for OrganizationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Repository domain types.
//!
//! This module contains types representing GitHub repositories and the
//! principals that hold access to them.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;

/// Represents a GitHub repository as returned by `GET /repos/{owner}/{repo}`.
///
/// Only the fields the reconciler manages are kept. Absent booleans are read
/// as `false`, matching what GitHub reports for a freshly created repository.
///
/// # Examples
///
/// ```rust
/// use github_client::Repository;
///
/// let repo: Repository = serde_json::from_str(r#"{
///     "id": 1,
///     "name": "my-repo",
///     "full_name": "my-org/my-repo",
///     "description": "desc",
///     "private": true
/// }"#).unwrap();
///
/// assert_eq!(repo.name, "my-repo");
/// assert!(repo.private);
/// assert!(!repo.archived);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// GitHub-assigned repository ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// The name of the repository
    pub name: String,

    /// The full name of the repository (owner/name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,

    /// Repository description, `None` when never set
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the repository is private
    #[serde(default)]
    pub private: bool,

    /// Whether the repository is archived (read-only)
    #[serde(default)]
    pub archived: bool,

    /// Whether the repository is a template repository
    #[serde(default)]
    pub is_template: bool,

    /// Whether the repository is a fork
    #[serde(default)]
    pub fork: bool,

    /// Name of the default branch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Permission flags GitHub reports for a collaborator or team.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFlags {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub maintain: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub triage: bool,
    #[serde(default)]
    pub pull: bool,
}

impl PermissionFlags {
    /// Returns the name of the highest permission granted, if any.
    ///
    /// Permissions are ordered `pull < triage < push < maintain < admin`.
    pub fn highest(&self) -> Option<&'static str> {
        if self.admin {
            Some("admin")
        } else if self.maintain {
            Some("maintain")
        } else if self.push {
            Some("push")
        } else if self.triage {
            Some("triage")
        } else if self.pull {
            Some("pull")
        } else {
            None
        }
    }
}

/// A user with access to a repository, from `GET /repos/{owner}/{repo}/collaborators`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collaborator {
    /// The user's login
    pub login: String,

    /// Permission flags granted to the user
    #[serde(default)]
    pub permissions: PermissionFlags,

    /// Name of the role GitHub assigned, when reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_name: Option<String>,
}

/// A team with access to a repository, from `GET /repos/{owner}/{repo}/teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPermission {
    /// The team's slug
    pub slug: String,

    /// Display name of the team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Permission level granted to the team (`pull`, `triage`, `push`, `maintain`, `admin`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,

    /// Permission flags granted to the team
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionFlags>,
}

/// Request body for granting a user or team a permission level on a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest {
    /// Permission level to grant
    pub permission: String,
}

//! Opaque identifiers and caller identity
//!
//! User and album identifiers come from outside the scheduler (Discord ids,
//! streaming-service album ids) and are treated as opaque strings.

use serde::{Deserialize, Serialize};

/// Identifier of a user who submits albums
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmitterId(pub String);

impl SubmitterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmitterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmitterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a submitted album, stable across re-submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub String);

impl AlbumId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AlbumId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AlbumId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The caller of an operation, as vouched for by the session layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: SubmitterId,
    pub is_admin: bool,
}

impl Identity {
    pub fn member(user_id: impl Into<String>) -> Self {
        Self {
            user_id: SubmitterId::new(user_id),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: SubmitterId::new(user_id),
            is_admin: true,
        }
    }

    /// Is this identity the given submitter?
    pub fn is(&self, submitter_id: &SubmitterId) -> bool {
        &self.user_id == submitter_id
    }
}

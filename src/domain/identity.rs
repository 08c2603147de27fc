//! Authenticated identities and the delete permission rule.

use std::fmt;

use crate::domain::entities::PostRecord;

/// The identity allowed to delete every post.
pub const ADMIN_IDENTITY: &str = "admin";

/// A user name verified by the authentication layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.0 == ADMIN_IDENTITY
    }

    /// True when this identity created the post.
    pub fn owns(&self, post: &PostRecord) -> bool {
        post.posted_by.as_deref() == Some(self.as_str())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner-or-admin check. Anonymous requesters own nothing, including posts
/// created anonymously.
pub fn may_delete(requester: Option<&Identity>, post: &PostRecord) -> bool {
    match requester {
        Some(identity) => identity.is_admin() || identity.owns(post),
        None => false,
    }
}

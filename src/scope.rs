//! Permission scope sets for Gmail credentials.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Scope granting permission to send mail.
pub const SCOPE_SEND: &str = "https://www.googleapis.com/auth/gmail.send";

/// Scope granting permission to modify messages (labels, read state).
pub const SCOPE_MODIFY: &str = "https://www.googleapis.com/auth/gmail.modify";

/// Scope granting read-only access to messages.
pub const SCOPE_READONLY: &str = "https://www.googleapis.com/auth/gmail.readonly";

/// An ordered set of `OAuth2` permission scopes.
///
/// A credential is only reusable for the exact scope set it was authorized
/// for; [`ScopeSet::matches`] compares membership rather than order, so two
/// sets listing the same scopes in a different order are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeSet(Vec<String>);

impl ScopeSet {
    /// Creates a scope set from a list of scope strings.
    pub fn new(scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(scopes.into_iter().map(Into::into).collect())
    }

    /// The fixed Gmail scope set used throughout this crate: send, modify,
    /// and read-only access.
    #[must_use]
    pub fn gmail() -> Self {
        Self::new([SCOPE_SEND, SCOPE_MODIFY, SCOPE_READONLY])
    }

    /// Parses a space-separated scope string as returned by the token
    /// endpoint.
    #[must_use]
    pub fn from_granted(scope: &str) -> Self {
        Self::new(scope.split_whitespace())
    }

    /// Returns the scopes as a slice, in request order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the set contains no scopes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of scopes in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Space-joined representation for authorization requests.
    #[must_use]
    pub fn join(&self) -> String {
        self.0.join(" ")
    }

    /// Compares two scope sets as sets: order is ignored, any membership
    /// difference (missing, extra, or different scopes) is a mismatch.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        let lhs: BTreeSet<&str> = self.0.iter().map(String::as_str).collect();
        let rhs: BTreeSet<&str> = other.0.iter().map(String::as_str).collect();
        lhs == rhs
    }
}

impl fmt::Display for ScopeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join())
    }
}

//! Newtype wrappers for GitHub identifiers.
//!
//! These types prevent accidental mixing of different ID types (e.g., passing an
//! organization id where a team id is expected) and make the code more
//! self-documenting.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a stored resource id is not a valid team id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unexpected ID format ({id:?}), expected numerical ID: {reason}")]
pub struct InvalidTeamId {
    /// The offending id as stored by the host.
    pub id: String,
    /// Why parsing failed.
    pub reason: String,
}

/// A GitHub team id, assigned by GitHub when the team is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub u64);

impl TeamId {
    /// Parses a team id from the string form stored in resource state.
    pub fn parse(s: &str) -> Result<Self, InvalidTeamId> {
        s.parse::<u64>().map(TeamId).map_err(|e| InvalidTeamId {
            id: s.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TeamId {
    type Err = InvalidTeamId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TeamId::parse(s)
    }
}

impl From<u64> for TeamId {
    fn from(n: u64) -> Self {
        TeamId(n)
    }
}

/// A GitHub organization id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrgId(pub u64);

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A team slug: the URL-safe name GitHub derives from the team name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamSlug(pub String);

impl TeamSlug {
    pub fn new(s: impl Into<String>) -> Self {
        TeamSlug(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TeamSlug {
    fn from(s: &str) -> Self {
        TeamSlug(s.to_string())
    }
}

/// An entity tag returned by GitHub, used for conditional re-fetches.
///
/// The value is opaque: it is stored exactly as received in the `ETag` header
/// (weak validators keep their `W/` prefix) and echoed back in `If-None-Match`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(pub String);

impl ETag {
    pub fn new(s: impl Into<String>) -> Self {
        ETag(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no tag was recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reference to a parent team, as written in configuration.
///
/// Numeric references are taken as team ids directly. Anything else is treated
/// as a slug and has to be looked up, which can fail while a concurrent applier
/// is still creating or renaming the parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ParentTeamRef {
    Id(TeamId),
    Slug(TeamSlug),
}

impl ParentTeamRef {
    pub fn parse(s: &str) -> Self {
        match s.parse::<u64>() {
            Ok(id) => ParentTeamRef::Id(TeamId(id)),
            Err(_) => ParentTeamRef::Slug(TeamSlug::new(s)),
        }
    }

    /// Parses a configured reference, treating an empty or blank string as
    /// "no parent".
    pub fn parse_optional(s: &str) -> Option<Self> {
        if s.trim().is_empty() {
            None
        } else {
            Some(Self::parse(s))
        }
    }
}

impl fmt::Display for ParentTeamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParentTeamRef::Id(id) => write!(f, "{}", id),
            ParentTeamRef::Slug(slug) => write!(f, "{}", slug),
        }
    }
}

impl From<String> for ParentTeamRef {
    fn from(s: String) -> Self {
        ParentTeamRef::parse(&s)
    }
}

impl From<ParentTeamRef> for String {
    fn from(r: ParentTeamRef) -> Self {
        r.to_string()
    }
}

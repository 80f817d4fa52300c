//! Core domain types for the team provider.
//!
//! This module contains the identifiers and state types shared by the
//! reconciler, the GitHub client and the resource record.

pub mod ids;
pub mod team;

// Re-export commonly used types at the module level
pub use ids::{ETag, InvalidTeamId, OrgId, ParentTeamRef, TeamId, TeamSlug};
pub use team::{Owner, Privacy, TeamConfig, TeamState};

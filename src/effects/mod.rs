//! Effects-as-data for GitHub operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Reconciliation logic that is independent of the HTTP client
//! - Testability via fake interpreters that simulate eventual consistency
//! - Logging/tracing of intended operations

pub mod github;
pub mod interpreter;

pub use github::{GitHubEffect, GitHubResponse, NewTeam, OrganizationData, TeamData};
pub use interpreter::GitHubInterpreter;

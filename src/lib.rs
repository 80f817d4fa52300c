//! GitHub Team Provider - reconciles declared GitHub team configuration.
//!
//! This library provides the domain types, the GitHub client and the team
//! reconciler behind the `github-team` binary.

pub mod config;
pub mod effects;
pub mod github;
pub mod reconciler;
pub mod resource;
pub mod schema;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

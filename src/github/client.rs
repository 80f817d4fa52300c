//! Octocrab client wrapper scoped to the owning organization.
//!
//! This module provides `OctocrabClient`, which wraps an `Octocrab` instance
//! and scopes all operations to one owner. This matches the design where
//! effects are organization-scoped (the `GitHubEffect` enum doesn't include
//! the organization).

use octocrab::Octocrab;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::types::Owner;

use super::error::GitHubApiError;

/// A GitHub API client scoped to a specific owner.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The account the managed teams belong to.
    owner: Owner,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given owner.
    pub fn new(client: Octocrab, owner: Owner) -> Self {
        Self { client, owner }
    }

    /// Builds an authenticated octocrab instance.
    ///
    /// `base_url` selects the API root, e.g. a GitHub Enterprise Server's
    /// `https://ghe.example.com/api/v3`.
    pub fn build_octocrab(token: impl Into<String>, base_url: &str) -> Result<Octocrab, octocrab::Error> {
        Octocrab::builder()
            .personal_token(token.into())
            .base_uri(base_url)?
            .build()
    }

    /// Creates a client from a token, resolving the owner against the API.
    ///
    /// An owner that is not an organization is accepted here; team operations
    /// reject it later.
    pub async fn connect(
        token: impl Into<String>,
        base_url: &str,
        owner: &str,
    ) -> Result<Self, GitHubApiError> {
        let client = Self::build_octocrab(token, base_url).map_err(GitHubApiError::from_octocrab)?;
        let owner = resolve_owner(&client, owner).await?;
        tracing::debug!(
            owner = %owner.name,
            org_id = %owner.id,
            is_organization = owner.is_organization,
            "resolved GitHub owner"
        );
        Ok(Self::new(client, owner))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the owner this client is scoped to.
    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    /// Returns the owner's login.
    pub fn owner_name(&self) -> &str {
        &self.owner.name
    }
}

/// Looks up `login` as an organization, falling back to a user owner on 404.
async fn resolve_owner(client: &Octocrab, login: &str) -> Result<Owner, GitHubApiError> {
    // The organization lookup does not depend on the owner scope yet.
    let probe = OctocrabClient::new(client.clone(), Owner::user(login));
    let effect = GitHubEffect::GetOrganization {
        login: login.to_string(),
    };

    match probe.interpret(effect).await {
        Ok(GitHubResponse::Organization(org)) => Ok(Owner::organization(org.login, org.id)),
        Ok(other) => Err(GitHubApiError::permanent_without_source(format!(
            "unexpected response to organization lookup: {}",
            other.name()
        ))),
        Err(e) if e.is_not_found() => Ok(Owner::user(login)),
        Err(e) => Err(e),
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}

//! Team reconciler.
//!
//! Drives a single GitHub team towards its declared configuration. The
//! reconciler is the only place that decides *which* GitHub calls to make and
//! *whether* to retry them; the calls themselves are effects handed to an
//! injected [`GitHubInterpreter`].
//!
//! # Concurrency
//!
//! Many reconcilers may run at once against one organization, each for a
//! different team, with no shared lock. Cross-team ordering problems (a parent
//! not created yet, a rename still propagating) are absorbed by bounded retries:
//!
//! - parent slug lookups retry on any error
//! - reads retry on any error except not-modified, and treat a not-found that
//!   survives every attempt as "the team is gone"
//! - creation is attempted exactly once, never retried
//!
//! Nothing is rolled back. If a step after creation fails, the team remains on
//! GitHub with its id unrecorded.

mod create;
mod delete;
mod parent;
mod read;
mod update;


use thiserror::Error;

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, TeamData};
use crate::github::{GitHubApiError, RetryConfig};
use crate::schema::SchemaError;
use crate::types::{ETag, InvalidTeamId, Owner, TeamId, TeamSlug, TeamState};

/// Errors from reconciling a team.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// A GitHub call failed. Carries the last error seen.
    #[error(transparent)]
    Api(#[from] GitHubApiError),

    /// The stored resource id is not numeric.
    #[error(transparent)]
    InvalidId(#[from] InvalidTeamId),

    /// The configuration is invalid.
    #[error("invalid team configuration: {0}")]
    Validation(#[from] SchemaError),

    /// Teams only exist in organizations.
    #[error("this resource can only be used in the context of an organization, {0:?} is a user")]
    NotAnOrganization(String),

    /// The team disappeared between a successful write and the read after it.
    #[error("team {0} no longer exists")]
    Vanished(TeamId),

    /// An import named a team that does not exist.
    #[error("cannot import non-existent team {0}")]
    ImportNotFound(TeamId),

    /// The resource has no id yet, so there is no team to act on.
    #[error("resource has no team id; create or import it first")]
    MissingId,

    /// The interpreter answered with the wrong kind of response.
    #[error("unexpected {got} response to {effect}")]
    UnexpectedResponse {
        effect: &'static str,
        got: &'static str,
    },
}

impl ReconcileError {
    /// Returns true if the underlying GitHub error was a 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::Api(e) if e.is_not_found())
    }

    fn unexpected(effect: &'static str, got: &GitHubResponse) -> Self {
        ReconcileError::UnexpectedResponse {
            effect,
            got: got.name(),
        }
    }
}

/// Result of reading a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The team exists; here is its current state.
    Found(TeamState),
    /// The team is unchanged since the entity tag that was sent.
    NotModified,
    /// The team does not exist. The caller should drop its id.
    Gone,
}

/// Reconciles GitHub teams of one owner.
pub struct TeamReconciler<G> {
    github: G,
    owner: Owner,
    retry: RetryConfig,
}

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Creates a reconciler using the default retry budget.
    pub fn new(github: G, owner: Owner) -> Self {
        Self::with_retry(github, owner, RetryConfig::DEFAULT)
    }

    /// Creates a reconciler with an explicit retry budget.
    pub fn with_retry(github: G, owner: Owner, retry: RetryConfig) -> Self {
        TeamReconciler {
            github,
            owner,
            retry,
        }
    }

    pub fn owner(&self) -> &Owner {
        &self.owner
    }

    pub fn retry_config(&self) -> RetryConfig {
        self.retry
    }

    /// Fails unless the configured owner is an organization.
    fn check_organization(&self) -> Result<(), ReconcileError> {
        if self.owner.is_organization {
            Ok(())
        } else {
            Err(ReconcileError::NotAnOrganization(self.owner.name.clone()))
        }
    }

    /// Executes one effect, without retrying.
    async fn run(&self, effect: GitHubEffect) -> Result<GitHubResponse, ReconcileError> {
        Ok(self.github.interpret(effect).await?)
    }

    /// Sets the LDAP mapping of a team.
    async fn update_ldap_mapping(&self, id: TeamId, ldap_dn: &str) -> Result<(), ReconcileError> {
        tracing::debug!(team_id = %id, ldap_dn, "updating team LDAP mapping");
        match self
            .run(GitHubEffect::UpdateLdapMapping {
                id,
                ldap_dn: ldap_dn.to_string(),
            })
            .await?
        {
            GitHubResponse::LdapMappingUpdated => Ok(()),
            other => Err(ReconcileError::unexpected("update_ldap_mapping", &other)),
        }
    }

    /// Removes every current member of a freshly created team.
    ///
    /// GitHub makes the creating user a maintainer of each new team; right after
    /// creation that user is the only member.
    async fn remove_default_maintainer(&self, slug: &TeamSlug) -> Result<(), ReconcileError> {
        let members = match self
            .run(GitHubEffect::ListTeamMembers { slug: slug.clone() })
            .await?
        {
            GitHubResponse::Members(members) => members,
            other => return Err(ReconcileError::unexpected("list_team_members", &other)),
        };

        for login in members {
            tracing::debug!(team = %slug, login = %login, "removing default maintainer from team");
            match self
                .run(GitHubEffect::RemoveTeamMember {
                    slug: slug.clone(),
                    login,
                })
                .await?
            {
                GitHubResponse::MemberRemoved => {}
                other => return Err(ReconcileError::unexpected("remove_team_member", &other)),
            }
        }
        Ok(())
    }
}

/// Converts a fetched team into resource state.
fn team_state(team: TeamData, etag: Option<ETag>) -> TeamState {
    TeamState {
        name: team.name,
        description: team.description.unwrap_or_default(),
        privacy: team.privacy,
        parent_team_id: team.parent_id.map(|id| id.to_string()).unwrap_or_default(),
        parent_team_slug: team.parent_slug.map(|s| s.0).unwrap_or_default(),
        ldap_dn: team.ldap_dn.unwrap_or_default(),
        slug: team.slug.0,
        node_id: team.node_id,
        members_count: team.members_count.unwrap_or(0),
        etag: etag.unwrap_or_default(),
    }
}

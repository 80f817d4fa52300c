//! Parent team resolution.

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::{GitHubApiError, RetryPolicy, RetryResult, retry_with_backoff};
use crate::types::{ParentTeamRef, TeamId};

use super::{ReconcileError, TeamReconciler};

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Resolves a configured parent reference to a team id.
    ///
    /// Numeric references are used as-is. Slugs are looked up, retrying on any
    /// error: the parent may be created by a concurrent applier a few seconds
    /// from now. After the retry budget the last error is returned.
    pub(super) async fn resolve_parent(&self, parent: &ParentTeamRef) -> Result<TeamId, ReconcileError> {
        let slug = match parent {
            ParentTeamRef::Id(id) => return Ok(*id),
            ParentTeamRef::Slug(slug) => slug,
        };

        let result = retry_with_backoff(
            self.retry,
            RetryPolicy::RetryAnyError,
            "fetching parent team",
            || {
                self.github
                    .interpret(GitHubEffect::GetTeamBySlug { slug: slug.clone() })
            },
        )
        .await;

        match result {
            RetryResult::Success(GitHubResponse::Team { team, .. }) => {
                tracing::debug!(parent = %slug, parent_id = %team.id, "resolved parent team");
                Ok(team.id)
            }
            RetryResult::Success(other) => Err(ReconcileError::unexpected("get_team_by_slug", &other)),
            RetryResult::ExhaustedRetries { last_error, attempts } => {
                tracing::error!(
                    parent = %slug,
                    attempts,
                    error = %last_error,
                    "unable to resolve parent team"
                );
                Err(last_error.into())
            }
            RetryResult::Stopped(e) => {
                tracing::error!(parent = %slug, error = %e, "unable to resolve parent team");
                Err(e.into())
            }
        }
    }

    /// Resolves an optional parent reference.
    pub(super) async fn resolve_optional_parent(
        &self,
        parent: Option<&ParentTeamRef>,
    ) -> Result<Option<TeamId>, ReconcileError> {
        match parent {
            Some(parent) => Ok(Some(self.resolve_parent(parent).await?)),
            None => Ok(None),
        }
    }
}

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use crate::github::{GitHubApiError, RetryPolicy, retry_with_backoff};
use crate::types::{ETag, TeamId, TeamState};

use super::{ReadOutcome, ReconcileError, TeamReconciler, team_state};

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Reads a team by id.
    ///
    /// With a non-empty `etag` the fetch is conditional, and an unchanged team
    /// yields [`ReadOutcome::NotModified`]. Every other error is retried within
    /// the retry budget, including not-found, since a team that was just
    /// renamed can briefly 404. A not-found that persists through every attempt
    /// yields [`ReadOutcome::Gone`]; any other persisting error is returned.
    pub async fn read(&self, id: TeamId, etag: Option<&ETag>) -> Result<ReadOutcome, ReconcileError> {
        self.check_organization()?;

        let etag = etag.filter(|tag| !tag.is_empty()).cloned();
        tracing::debug!(team_id = %id, conditional = etag.is_some(), "reading team");

        let response = retry_with_backoff(
            self.retry,
            RetryPolicy::RetryUnlessNotModified,
            "reading team",
            || {
                self.github.interpret(GitHubEffect::GetTeam {
                    id,
                    etag: etag.clone(),
                })
            },
        )
        .await
        .into_result();

        match response {
            Ok(GitHubResponse::Team { team, etag }) => Ok(ReadOutcome::Found(team_state(team, etag))),
            Ok(other) => Err(ReconcileError::unexpected("get_team", &other)),
            Err(e) if e.is_not_modified() => {
                tracing::debug!(team_id = %id, "team unchanged since last read");
                Ok(ReadOutcome::NotModified)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!(team_id = %id, "removing team from state because it no longer exists in GitHub");
                Ok(ReadOutcome::Gone)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a team identified by the id string stored by the host.
    pub async fn read_by_stored_id(
        &self,
        stored_id: &str,
        etag: Option<&ETag>,
    ) -> Result<ReadOutcome, ReconcileError> {
        let id = TeamId::parse(stored_id)?;
        self.read(id, etag).await
    }

    /// Adopts an existing team into management.
    ///
    /// Parses `stored_id` and reads the team unconditionally. Unlike a plain
    /// read, a missing team is an error.
    pub async fn import(&self, stored_id: &str) -> Result<(TeamId, TeamState), ReconcileError> {
        let id = TeamId::parse(stored_id)?;
        match self.read(id, None).await? {
            ReadOutcome::Found(state) => {
                tracing::info!(team_id = %id, team = %state.slug, "imported team");
                Ok((id, state))
            }
            ReadOutcome::Gone => Err(ReconcileError::ImportNotFound(id)),
            ReadOutcome::NotModified => Err(ReconcileError::UnexpectedResponse {
                effect: "get_team",
                got: "not_modified",
            }),
        }
    }
}

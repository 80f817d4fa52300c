use crate::effects::{GitHubEffect, GitHubInterpreter};
use crate::github::GitHubApiError;
use crate::types::TeamId;

use super::{ReconcileError, TeamReconciler};

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Deletes a team.
    ///
    /// Deleting a parent deletes its children too, so a child's own delete can
    /// race with the cascade. When the delete call fails the team is fetched
    /// once: if it is gone the delete counts as done, otherwise the delete's
    /// error is returned.
    pub async fn delete(&self, id: TeamId) -> Result<(), ReconcileError> {
        self.check_organization()?;
        tracing::debug!(team_id = %id, "deleting team");

        let delete_error = match self.github.interpret(GitHubEffect::DeleteTeam { id }).await {
            Ok(_) => {
                tracing::info!(team_id = %id, "deleted team");
                return Ok(());
            }
            Err(e) => e,
        };

        match self
            .github
            .interpret(GitHubEffect::GetTeam { id, etag: None })
            .await
        {
            Err(check) if check.is_not_found() => {
                tracing::warn!(
                    team_id = %id,
                    error = %delete_error,
                    "team deletion failed, but the team no longer exists"
                );
                Ok(())
            }
            _ => {
                tracing::error!(team_id = %id, error = %delete_error, "failed to delete team");
                Err(delete_error.into())
            }
        }
    }
}

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, NewTeam};
use crate::github::GitHubApiError;
use crate::schema;
use crate::types::{TeamConfig, TeamId};

use super::{ReconcileError, TeamReconciler};

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Creates a team and returns its id.
    ///
    /// The creation call is made exactly once. After it succeeds, the default
    /// maintainer is removed (unless `create_default_maintainer` is set) and the
    /// LDAP mapping applied (when `ldap_dn` is non-empty). A failure in those
    /// steps fails the operation; the team is left in place.
    ///
    /// The caller is expected to read the team afterwards to obtain its state.
    pub async fn create(&self, desired: &TeamConfig) -> Result<TeamId, ReconcileError> {
        self.check_organization()?;
        schema::validate(desired)?;

        let parent_team_id = self
            .resolve_optional_parent(desired.parent_team_id.as_ref())
            .await?;

        tracing::debug!(
            owner = %self.owner.name,
            team = %desired.name,
            parent_id = ?parent_team_id,
            "creating team"
        );

        let team = NewTeam {
            name: desired.name.clone(),
            description: desired.description.clone(),
            privacy: desired.privacy,
            parent_team_id,
        };
        let created = match self.run(GitHubEffect::CreateTeam { team }).await? {
            GitHubResponse::TeamCreated(team) => team,
            other => return Err(ReconcileError::unexpected("create_team", &other)),
        };

        if !desired.create_default_maintainer {
            if let Err(e) = self.remove_default_maintainer(&created.slug).await {
                tracing::error!(
                    team_id = %created.id,
                    team = %created.slug,
                    error = %e,
                    "team was created but removing its default maintainer failed"
                );
                return Err(e);
            }
        }

        if !desired.ldap_dn.is_empty() {
            if let Err(e) = self.update_ldap_mapping(created.id, &desired.ldap_dn).await {
                tracing::error!(
                    team_id = %created.id,
                    team = %created.slug,
                    error = %e,
                    "team was created but setting its LDAP mapping failed"
                );
                return Err(e);
            }
        }

        tracing::info!(team_id = %created.id, team = %created.slug, "created team");
        Ok(created.id)
    }
}

use crate::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse, NewTeam};
use crate::github::GitHubApiError;
use crate::schema;
use crate::types::{TeamConfig, TeamId, TeamState};

use super::{ReadOutcome, ReconcileError, TeamReconciler};

impl<G> TeamReconciler<G>
where
    G: GitHubInterpreter<Error = GitHubApiError>,
{
    /// Updates a team to match `desired` and returns its new state.
    ///
    /// `prior` is the last observed state. It decides whether the LDAP mapping
    /// needs rewriting and whether an existing parent must be detached.
    /// `create_default_maintainer` is ignored: it only applies at creation.
    pub async fn update(
        &self,
        id: TeamId,
        desired: &TeamConfig,
        prior: &TeamState,
    ) -> Result<TeamState, ReconcileError> {
        self.check_organization()?;
        schema::validate(desired)?;

        let parent_team_id = self
            .resolve_optional_parent(desired.parent_team_id.as_ref())
            .await?;
        let remove_parent = parent_team_id.is_none() && prior.has_parent();

        tracing::debug!(
            team_id = %id,
            team = %desired.name,
            parent_id = ?parent_team_id,
            remove_parent,
            "updating team"
        );

        let team = NewTeam {
            name: desired.name.clone(),
            description: desired.description.clone(),
            privacy: desired.privacy,
            parent_team_id,
        };
        let edited = match self
            .run(GitHubEffect::EditTeam {
                id,
                team,
                remove_parent,
            })
            .await?
        {
            GitHubResponse::TeamEdited(team) => team,
            other => return Err(ReconcileError::unexpected("edit_team", &other)),
        };

        if desired.ldap_dn != prior.ldap_dn {
            self.update_ldap_mapping(edited.id, &desired.ldap_dn).await?;
        }

        match self.read(edited.id, None).await? {
            ReadOutcome::Found(state) => Ok(state),
            ReadOutcome::Gone => Err(ReconcileError::Vanished(edited.id)),
            ReadOutcome::NotModified => Err(ReconcileError::UnexpectedResponse {
                effect: "get_team",
                got: "not_modified",
            }),
        }
    }
}

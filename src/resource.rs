//! The team resource record.
//!
//! A [`TeamResource`] is what the host persists between runs: the stored team
//! id, the declared configuration and the last observed state. Its lifecycle
//! operations call the reconciler and fold the outcome back into the record.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::effects::GitHubInterpreter;
use crate::github::GitHubApiError;
use crate::reconciler::{ReadOutcome, ReconcileError, TeamReconciler};
use crate::schema::{self, Plan, PlanAction};
use crate::types::{ParentTeamRef, TeamConfig, TeamId, TeamState};

/// Errors loading or saving a resource record.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a refresh did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// State was replaced with a fresh read.
    Updated,
    /// GitHub reported no change since the stored entity tag.
    Unchanged,
    /// The team no longer exists; id and state were cleared.
    Removed,
    /// The record has no id, so there was nothing to read.
    Absent,
}

/// A persisted team resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamResource {
    /// Team id. Absent until the team is created or imported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<TeamId>,

    pub config: TeamConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TeamState>,
}

impl TeamResource {
    pub fn new(config: TeamConfig) -> Self {
        TeamResource {
            id: None,
            config,
            state: None,
        }
    }

    /// Loads a record from a JSON file.
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the record as JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Returns true if the record refers to a team.
    pub fn exists(&self) -> bool {
        self.id.is_some()
    }

    /// Computes what applying the record's configuration would do.
    pub fn plan(&self) -> Plan {
        let observed = self.id.and(self.state.as_ref());
        schema::plan(&self.config, observed)
    }

    /// Creates the team and records its id and state.
    pub async fn create<G>(&mut self, reconciler: &TeamReconciler<G>) -> Result<(), ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let id = reconciler.create(&self.config).await?;
        self.id = Some(id);
        self.state = None;
        self.refresh(reconciler).await?;
        Ok(())
    }

    /// Re-reads the team, conditionally on the stored entity tag.
    pub async fn refresh<G>(&mut self, reconciler: &TeamReconciler<G>) -> Result<Refresh, ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let Some(id) = self.id else {
            return Ok(Refresh::Absent);
        };
        let etag = self.state.as_ref().map(|s| &s.etag);

        match reconciler.read(id, etag).await? {
            ReadOutcome::Found(state) => {
                self.state = Some(state);
                Ok(Refresh::Updated)
            }
            ReadOutcome::NotModified => Ok(Refresh::Unchanged),
            ReadOutcome::Gone => {
                self.id = None;
                self.state = None;
                Ok(Refresh::Removed)
            }
        }
    }

    /// Updates the team to the record's configuration.
    pub async fn update<G>(&mut self, reconciler: &TeamReconciler<G>) -> Result<(), ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let id = self.id.ok_or(ReconcileError::MissingId)?;
        let prior = self.state.clone().unwrap_or_default();
        let state = reconciler.update(id, &self.config, &prior).await?;
        self.state = Some(state);
        Ok(())
    }

    /// Deletes the team and clears id and state.
    pub async fn destroy<G>(&mut self, reconciler: &TeamReconciler<G>) -> Result<(), ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let id = self.id.ok_or(ReconcileError::MissingId)?;
        reconciler.delete(id).await?;
        self.id = None;
        self.state = None;
        Ok(())
    }

    /// Adopts an existing team by its id.
    ///
    /// The configuration is taken from the observed team, so that an
    /// immediate plan is a no-op.
    pub async fn import<G>(reconciler: &TeamReconciler<G>, stored_id: &str) -> Result<Self, ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let (id, state) = reconciler.import(stored_id).await?;
        Ok(TeamResource {
            id: Some(id),
            config: config_from_state(&state),
            state: Some(state),
        })
    }

    /// Applies the record's configuration: creates, updates or does nothing.
    ///
    /// Returns the plan that was carried out.
    pub async fn apply<G>(&mut self, reconciler: &TeamReconciler<G>) -> Result<Plan, ReconcileError>
    where
        G: GitHubInterpreter<Error = GitHubApiError>,
    {
        let plan = self.plan();
        match plan.action {
            PlanAction::Create => self.create(reconciler).await?,
            PlanAction::Update => self.update(reconciler).await?,
            PlanAction::NoOp => {}
        }
        Ok(plan)
    }
}

/// Derives a configuration matching an observed team.
fn config_from_state(state: &TeamState) -> TeamConfig {
    let mut config = TeamConfig::new(state.name.clone())
        .with_description(state.description.clone())
        .with_privacy(state.privacy)
        .with_ldap_dn(state.ldap_dn.clone());
    if state.has_parent() {
        config.parent_team_id = Some(ParentTeamRef::parse(&state.parent_team_id));
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeGitHub, org_owner};
    use crate::types::{Privacy, TeamSlug};
    use tempfile::tempdir;

    fn reconciler(fake: &FakeGitHub) -> TeamReconciler<FakeGitHub> {
        TeamReconciler::new(fake.clone(), org_owner())
    }

    #[tokio::test]
    async fn apply_creates_then_is_idempotent() {
        let fake = FakeGitHub::new();
        let r = reconciler(&fake);
        let mut resource = TeamResource::new(TeamConfig::new("core").with_privacy(Privacy::Closed));

        let first = resource.apply(&r).await.unwrap();
        assert_eq!(first.action, PlanAction::Create);
        assert!(resource.exists());
        assert_eq!(resource.state.as_ref().unwrap().slug, "core");

        let second = resource.apply(&r).await.unwrap();
        assert_eq!(second.action, PlanAction::NoOp);
        assert_eq!(fake.call_count("create_team"), 1);
        assert_eq!(fake.call_count("edit_team"), 0);
    }

    #[tokio::test]
    async fn apply_updates_changed_config() {
        let fake = FakeGitHub::new();
        let r = reconciler(&fake);
        let mut resource = TeamResource::new(TeamConfig::new("core"));
        resource.apply(&r).await.unwrap();

        resource.config.name = "Core Platform".to_string();
        let plan = resource.apply(&r).await.unwrap();

        assert_eq!(plan.action, PlanAction::Update);
        assert!(plan.recomputed.contains(&"slug"));
        assert_eq!(resource.state.as_ref().unwrap().slug, "core-platform");
    }

    #[tokio::test]
    async fn refresh_uses_stored_etag() {
        let fake = FakeGitHub::new();
        let r = reconciler(&fake);
        let mut resource = TeamResource::new(TeamConfig::new("core"));
        resource.create(&r).await.unwrap();

        assert_eq!(resource.refresh(&r).await.unwrap(), Refresh::Unchanged);

        fake.rename_out_of_band(resource.id.unwrap(), "renamed");
        assert_eq!(resource.refresh(&r).await.unwrap(), Refresh::Updated);
        assert_eq!(resource.state.as_ref().unwrap().name, "renamed");
        assert_eq!(resource.plan().action, PlanAction::Update);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_of_deleted_team_clears_record() {
        let fake = FakeGitHub::new();
        let r = reconciler(&fake);
        let mut resource = TeamResource::new(TeamConfig::new("core"));
        resource.create(&r).await.unwrap();
        fake.delete_out_of_band(resource.id.unwrap());

        assert_eq!(resource.refresh(&r).await.unwrap(), Refresh::Removed);
        assert!(!resource.exists());
        assert!(resource.state.is_none());
        assert_eq!(resource.plan().action, PlanAction::Create);
    }

    #[tokio::test]
    async fn destroy_clears_record() {
        let fake = FakeGitHub::new();
        let r = reconciler(&fake);
        let mut resource = TeamResource::new(TeamConfig::new("core"));
        resource.create(&r).await.unwrap();

        resource.destroy(&r).await.unwrap();

        assert!(!resource.exists());
        assert_eq!(fake.team_count(), 0);
        assert!(matches!(
            resource.destroy(&r).await,
            Err(ReconcileError::MissingId)
        ));
    }

    #[tokio::test]
    async fn import_then_plan_is_noop() {
        let fake = FakeGitHub::new();
        let parent = fake.seed_team(&TeamConfig::new("platform"));
        let id = fake.seed_team(
            &TeamConfig::new("core")
                .with_description("imported")
                .with_parent(ParentTeamRef::Slug(TeamSlug::new("platform")))
                .with_ldap_dn("cn=core,dc=example"),
        );
        let r = reconciler(&fake);

        let resource = TeamResource::import(&r, &id.to_string()).await.unwrap();

        assert_eq!(resource.id, Some(id));
        assert_eq!(resource.config.parent_team_id, Some(ParentTeamRef::Id(parent)));
        assert!(resource.plan().is_noop());
    }

    #[test]
    fn save_then_load_preserves_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("team.json");
        let mut resource = TeamResource::new(TeamConfig::new("core").with_description("d"));
        resource.id = Some(TeamId(7));
        resource.state = Some(TeamState {
            name: "core".to_string(),
            slug: "core".to_string(),
            ..Default::default()
        });

        resource.save(&path).unwrap();
        let loaded = TeamResource::load(&path).unwrap();

        assert_eq!(loaded, resource);
        assert!(!dir.path().join("team.json.tmp").exists());
    }

    #[test]
    fn record_without_id_omits_state() {
        let resource = TeamResource::new(TeamConfig::new("core"));
        let json = serde_json::to_value(&resource).unwrap();
        assert!(json.get("id").is_none());
        assert!(json.get("state").is_none());
        assert_eq!(json["config"]["name"], "core");
    }

    #[test]
    fn load_of_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = TeamResource::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }
}

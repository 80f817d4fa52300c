//! Shared test utilities: an in-memory GitHub organization and arbitrary
//! generators for property-based testing.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::effects::{
    GitHubEffect, GitHubInterpreter, GitHubResponse, NewTeam, OrganizationData, TeamData,
};
use crate::github::GitHubApiError;
use crate::types::{
    ETag, OrgId, Owner, ParentTeamRef, Privacy, TeamConfig, TeamId, TeamSlug,
};

pub const ORG: &str = "acme";
pub const ORG_ID: OrgId = OrgId(4242);
/// Login of the user the fake treats as authenticated.
pub const VIEWER: &str = "terraform-bot";

pub fn org_owner() -> Owner {
    Owner::organization(ORG, ORG_ID)
}

/// Derives a team slug from its name the way GitHub does for ASCII names.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

#[derive(Debug, Clone)]
struct FakeTeam {
    data: TeamData,
    members: Vec<String>,
    version: u64,
}

impl FakeTeam {
    fn etag(&self) -> ETag {
        ETag::new(format!("W/\"{}-{}\"", self.data.id, self.version))
    }

    fn touch(&mut self) {
        self.version += 1;
        self.data.members_count = Some(self.members.len() as u64);
    }
}

#[derive(Debug, Clone, Copy)]
struct ScriptedFailure {
    status: u16,
    remaining: usize,
}

#[derive(Debug, Default)]
struct FakeOrg {
    teams: BTreeMap<TeamId, FakeTeam>,
    next_id: u64,
    failures: HashMap<&'static str, VecDeque<ScriptedFailure>>,
    calls: Vec<GitHubEffect>,
}

/// An in-memory GitHub organization that interprets team effects.
///
/// Clones share the same organization, so several reconcilers (or a test
/// driving concurrent changes) can act on it at once. Every effect is logged
/// before it is applied. Failures can be scripted per effect name; a scripted
/// failure is returned instead of touching the organization.
#[derive(Debug, Clone, Default)]
pub struct FakeGitHub {
    org: Arc<Mutex<FakeOrg>>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.org.lock().unwrap().next_id = 100;
        fake
    }

    /// Adds a team directly, bypassing the effect log. Returns its id.
    pub fn seed_team(&self, config: &TeamConfig) -> TeamId {
        let mut org = self.org.lock().unwrap();
        let parent_team_id = config.parent_team_id.as_ref().map(|p| match p {
            ParentTeamRef::Id(id) => *id,
            ParentTeamRef::Slug(slug) => org
                .teams
                .values()
                .find(|t| &t.data.slug == slug)
                .map(|t| t.data.id)
                .unwrap_or_else(|| panic!("seeded parent {} does not exist", slug)),
        });
        let team = NewTeam {
            name: config.name.clone(),
            description: config.description.clone(),
            privacy: config.privacy,
            parent_team_id,
        };
        let data = org.insert_team(team).unwrap();
        if !config.ldap_dn.is_empty() {
            let t = org.teams.get_mut(&data.id).unwrap();
            t.data.ldap_dn = Some(config.ldap_dn.clone());
        }
        data.id
    }

    /// Makes the next `times` calls of effect `effect_name` fail with `status`.
    pub fn fail_times(&self, effect_name: &'static str, status: u16, times: usize) {
        if times == 0 {
            return;
        }
        self.org
            .lock()
            .unwrap()
            .failures
            .entry(effect_name)
            .or_default()
            .push_back(ScriptedFailure {
                status,
                remaining: times,
            });
    }

    /// Returns every effect interpreted so far.
    pub fn calls(&self) -> Vec<GitHubEffect> {
        self.org.lock().unwrap().calls.clone()
    }

    /// Counts interpreted effects with the given name.
    pub fn call_count(&self, effect_name: &str) -> usize {
        self.org
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|e| e.name() == effect_name)
            .count()
    }

    /// Returns the current data of a team, if it exists.
    pub fn team(&self, id: TeamId) -> Option<TeamData> {
        self.org.lock().unwrap().teams.get(&id).map(|t| t.data.clone())
    }

    /// Returns the member logins of a team.
    pub fn members(&self, id: TeamId) -> Vec<String> {
        self.org
            .lock()
            .unwrap()
            .teams
            .get(&id)
            .map(|t| t.members.clone())
            .unwrap_or_default()
    }

    pub fn team_count(&self) -> usize {
        self.org.lock().unwrap().teams.len()
    }

    /// Renames a team out of band, as another administrator would.
    pub fn rename_out_of_band(&self, id: TeamId, name: &str) {
        let mut org = self.org.lock().unwrap();
        let team = org.teams.get_mut(&id).unwrap();
        team.data.name = name.to_string();
        team.data.slug = TeamSlug::new(slugify(name));
        team.touch();
    }

    /// Deletes a team out of band, together with its descendants.
    pub fn delete_out_of_band(&self, id: TeamId) {
        self.org.lock().unwrap().remove_team(id);
    }

    fn apply(&self, effect: GitHubEffect) -> Result<GitHubResponse, GitHubApiError> {
        let mut org = self.org.lock().unwrap();
        org.calls.push(effect.clone());

        if let Some(status) = org.take_failure(effect.name()) {
            return Err(GitHubApiError::from_status(
                status,
                format!("scripted failure of {}", effect.name()),
            ));
        }

        match effect {
            GitHubEffect::GetOrganization { login } => {
                if login == ORG {
                    Ok(GitHubResponse::Organization(OrganizationData { id: ORG_ID, login }))
                } else {
                    Err(GitHubApiError::not_found("Not Found"))
                }
            }
            GitHubEffect::GetTeam { id, etag } => {
                let team = org.teams.get(&id).ok_or_else(|| GitHubApiError::not_found("Not Found"))?;
                let current = team.etag();
                if etag.as_ref() == Some(&current) {
                    return Err(GitHubApiError::not_modified("Not Modified"));
                }
                Ok(GitHubResponse::Team {
                    team: org.with_parent_slug(team.data.clone()),
                    etag: Some(current),
                })
            }
            GitHubEffect::GetTeamBySlug { slug } => {
                let team = org
                    .teams
                    .values()
                    .find(|t| t.data.slug == slug)
                    .ok_or_else(|| GitHubApiError::not_found("Not Found"))?;
                Ok(GitHubResponse::Team {
                    team: org.with_parent_slug(team.data.clone()),
                    etag: Some(team.etag()),
                })
            }
            GitHubEffect::ListTeamMembers { slug } => org
                .teams
                .values()
                .find(|t| t.data.slug == slug)
                .map(|t| GitHubResponse::Members(t.members.clone()))
                .ok_or_else(|| GitHubApiError::not_found(format!("team {} not found", slug))),
            GitHubEffect::CreateTeam { team } => {
                let data = org.insert_team(team)?;
                Ok(GitHubResponse::TeamCreated(data))
            }
            GitHubEffect::EditTeam {
                id,
                team,
                remove_parent,
            } => {
                if let Some(parent) = team.parent_team_id {
                    if !org.teams.contains_key(&parent) {
                        return Err(GitHubApiError::from_status(422, "parent team not found"));
                    }
                }
                let t = org
                    .teams
                    .get_mut(&id)
                    .ok_or_else(|| GitHubApiError::not_found("Not Found"))?;
                t.data.slug = TeamSlug::new(slugify(&team.name));
                t.data.name = team.name;
                t.data.description = Some(team.description);
                t.data.privacy = team.privacy;
                if team.parent_team_id.is_some() || remove_parent {
                    t.data.parent_id = team.parent_team_id;
                }
                t.touch();
                let data = t.data.clone();
                Ok(GitHubResponse::TeamEdited(org.with_parent_slug(data)))
            }
            GitHubEffect::DeleteTeam { id } => {
                if org.remove_team(id) {
                    Ok(GitHubResponse::TeamDeleted)
                } else {
                    Err(GitHubApiError::not_found("Not Found"))
                }
            }
            GitHubEffect::RemoveTeamMember { slug, login } => {
                let team = org
                    .teams
                    .values_mut()
                    .find(|t| t.data.slug == slug)
                    .ok_or_else(|| GitHubApiError::not_found("Not Found"))?;
                let before = team.members.len();
                team.members.retain(|m| m != &login);
                if team.members.len() == before {
                    return Err(GitHubApiError::not_found("Not Found"));
                }
                team.touch();
                Ok(GitHubResponse::MemberRemoved)
            }
            GitHubEffect::UpdateLdapMapping { id, ldap_dn } => {
                let team = org
                    .teams
                    .get_mut(&id)
                    .ok_or_else(|| GitHubApiError::not_found("Not Found"))?;
                team.data.ldap_dn = Some(ldap_dn);
                team.touch();
                Ok(GitHubResponse::LdapMappingUpdated)
            }
        }
    }
}

impl FakeOrg {
    fn take_failure(&mut self, effect_name: &str) -> Option<u16> {
        let queue = self.failures.get_mut(effect_name)?;
        let front = queue.front_mut()?;
        let status = front.status;
        front.remaining -= 1;
        if front.remaining == 0 {
            queue.pop_front();
        }
        Some(status)
    }

    fn insert_team(&mut self, team: NewTeam) -> Result<TeamData, GitHubApiError> {
        let slug = TeamSlug::new(slugify(&team.name));
        if self.teams.values().any(|t| t.data.slug == slug) {
            return Err(GitHubApiError::from_status(422, "Name must be unique for this org"));
        }
        if let Some(parent) = team.parent_team_id {
            if !self.teams.contains_key(&parent) {
                return Err(GitHubApiError::from_status(422, "parent team not found"));
            }
        }

        self.next_id += 1;
        let id = TeamId(self.next_id);
        let data = TeamData {
            id,
            node_id: format!("T_{}", id),
            name: team.name,
            slug,
            description: Some(team.description),
            privacy: team.privacy,
            parent_id: team.parent_team_id,
            parent_slug: None,
            ldap_dn: None,
            members_count: Some(1),
        };
        self.teams.insert(
            id,
            FakeTeam {
                data: data.clone(),
                members: vec![VIEWER.to_string()],
                version: 1,
            },
        );
        Ok(self.with_parent_slug(data))
    }

    /// Removes a team and, like GitHub, every team nested under it.
    fn remove_team(&mut self, id: TeamId) -> bool {
        if self.teams.remove(&id).is_none() {
            return false;
        }
        let children: Vec<TeamId> = self
            .teams
            .values()
            .filter(|t| t.data.parent_id == Some(id))
            .map(|t| t.data.id)
            .collect();
        for child in children {
            self.remove_team(child);
        }
        true
    }

    fn with_parent_slug(&self, mut data: TeamData) -> TeamData {
        data.parent_slug = data
            .parent_id
            .and_then(|p| self.teams.get(&p))
            .map(|p| p.data.slug.clone());
        data
    }
}

impl GitHubInterpreter for FakeGitHub {
    type Error = GitHubApiError;

    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
        let result = self.apply(effect);
        async move { result }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_privacy() -> impl Strategy<Value = Privacy> {
    prop_oneof![Just(Privacy::Secret), Just(Privacy::Closed)]
}

pub fn arb_team_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [A-Z][a-z]{2,10}){0,2}"
}

pub fn arb_team_config() -> impl Strategy<Value = TeamConfig> {
    (
        arb_team_name(),
        "[a-zA-Z0-9 ]{0,40}",
        arb_privacy(),
        any::<bool>(),
    )
        .prop_map(|(name, description, privacy, keep)| {
            TeamConfig::new(name)
                .with_description(description)
                .with_privacy(privacy)
                .with_default_maintainer(keep)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_matches_github_for_ascii_names() {
        assert_eq!(slugify("Core Team"), "core-team");
        assert_eq!(slugify("  Platform / Infra  "), "platform-infra");
        assert_eq!(slugify("ci_bots"), "ci_bots");
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let fake = FakeGitHub::new();
        let id = fake.seed_team(&TeamConfig::new("core"));
        fake.fail_times("get_team", 404, 2);

        for _ in 0..2 {
            let err = fake
                .interpret(GitHubEffect::GetTeam { id, etag: None })
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
        assert!(
            fake.interpret(GitHubEffect::GetTeam { id, etag: None })
                .await
                .is_ok()
        );
        assert_eq!(fake.call_count("get_team"), 3);
    }

    #[tokio::test]
    async fn matching_etag_is_not_modified() {
        let fake = FakeGitHub::new();
        let id = fake.seed_team(&TeamConfig::new("core"));
        let etag = match fake
            .interpret(GitHubEffect::GetTeam { id, etag: None })
            .await
            .unwrap()
        {
            GitHubResponse::Team { etag, .. } => etag,
            other => panic!("unexpected response: {:?}", other),
        };

        let err = fake
            .interpret(GitHubEffect::GetTeam { id, etag })
            .await
            .unwrap_err();
        assert!(err.is_not_modified());
    }

    #[test]
    fn deleting_a_parent_deletes_children() {
        let fake = FakeGitHub::new();
        let parent = fake.seed_team(&TeamConfig::new("platform"));
        let child = fake.seed_team(&TeamConfig::new("core").with_parent(ParentTeamRef::Id(parent)));
        fake.delete_out_of_band(parent);
        assert!(fake.team(child).is_none());
        assert_eq!(fake.team_count(), 0);
    }
}

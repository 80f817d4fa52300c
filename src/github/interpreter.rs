//! GitHub effect interpreter using octocrab.
//!
//! This module implements the `GitHubInterpreter` trait, executing GitHub effects
//! against the real GitHub API via octocrab.
//!
//! Key implementation details:
//! - Team reads by id are conditional (`If-None-Match`) when an entity tag is
//!   known, and a 304 answer surfaces as a `NotModified` error
//! - Uses GraphQL for team membership listing
//! - Every effect is executed exactly once; retry decisions belong to the caller

use http::StatusCode;
use http::header::{ETAG, HeaderMap, HeaderValue, IF_NONE_MATCH};
use serde::{Deserialize, Serialize};

use crate::effects::{
    GitHubEffect, GitHubInterpreter, GitHubResponse, NewTeam, OrganizationData, TeamData,
};
use crate::types::{ETag, OrgId, Privacy, TeamId, TeamSlug};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

// ─── GraphQL Types ────────────────────────────────────────────────────────────

/// GraphQL query for the members of a team.
const TEAM_MEMBERS_QUERY: &str = r#"
query($login: String!, $slug: String!) {
    organization(login: $login) {
        team(slug: $slug) {
            members(first: 100) {
                nodes {
                    login
                }
            }
        }
    }
}
"#;

/// Envelope of every GraphQL response.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct TeamMembersQueryData {
    organization: Option<TeamMembersOrganization>,
}

#[derive(Debug, Deserialize)]
struct TeamMembersOrganization {
    team: Option<TeamMembersTeam>,
}

#[derive(Debug, Deserialize)]
struct TeamMembersTeam {
    members: TeamMembersConnection,
}

#[derive(Debug, Deserialize)]
struct TeamMembersConnection {
    nodes: Vec<TeamMemberNode>,
}

#[derive(Debug, Deserialize)]
struct TeamMemberNode {
    login: String,
}

// ─── REST Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawOrganization {
    id: u64,
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawTeam {
    id: u64,
    #[serde(default)]
    node_id: String,
    name: String,
    slug: String,
    description: Option<String>,
    privacy: Option<String>,
    parent: Option<RawParentTeam>,
    ldap_dn: Option<String>,
    members_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawParentTeam {
    id: u64,
    slug: Option<String>,
}

impl RawTeam {
    fn into_team_data(self) -> Result<TeamData, GitHubApiError> {
        let privacy = match self.privacy.as_deref() {
            None => Privacy::default(),
            Some(p) => p.parse::<Privacy>().map_err(|e| {
                GitHubApiError::permanent_without_source(format!("team {}: {}", self.id, e))
            })?,
        };

        Ok(TeamData {
            id: TeamId(self.id),
            node_id: self.node_id,
            name: self.name,
            slug: TeamSlug(self.slug),
            description: self.description,
            privacy,
            parent_id: self.parent.as_ref().map(|p| TeamId(p.id)),
            parent_slug: self.parent.and_then(|p| p.slug).map(TeamSlug),
            ldap_dn: self.ldap_dn,
            members_count: self.members_count,
        })
    }
}

/// Body of `POST /orgs/{org}/teams` and `PATCH /organizations/{org_id}/team/{id}`.
///
/// `parent_team_id` is omitted when `None` and sent as `null` for `Some(None)`.
#[derive(Debug, Serialize)]
struct TeamRequest<'a> {
    name: &'a str,
    description: &'a str,
    privacy: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_team_id: Option<Option<u64>>,
}

impl<'a> TeamRequest<'a> {
    fn new(team: &'a NewTeam, remove_parent: bool) -> Self {
        let parent_team_id = match (team.parent_team_id, remove_parent) {
            (Some(parent), _) => Some(Some(parent.0)),
            (None, true) => Some(None),
            (None, false) => None,
        };
        TeamRequest {
            name: &team.name,
            description: &team.description,
            privacy: team.privacy.as_api_str(),
            parent_team_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct LdapMappingRequest<'a> {
    ldap_dn: &'a str,
}

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl GitHubInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: GitHubEffect) -> Result<GitHubResponse, Self::Error> {
        interpret_github_effect(self, effect).await
    }
}

/// Interprets a GitHub effect, executing it against the GitHub API once.
pub async fn interpret_github_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    let name = effect.name();
    let result = execute_effect(client, effect).await;
    if let Err(e) = &result {
        tracing::debug!(effect = name, error = %e, "GitHub call failed");
    }
    result
}

async fn execute_effect(
    client: &OctocrabClient,
    effect: GitHubEffect,
) -> Result<GitHubResponse, GitHubApiError> {
    match effect {
        GitHubEffect::GetOrganization { login } => get_organization(client, login).await,
        GitHubEffect::GetTeam { id, etag } => get_team(client, id, etag).await,
        GitHubEffect::GetTeamBySlug { slug } => get_team_by_slug(client, slug).await,
        GitHubEffect::ListTeamMembers { slug } => list_team_members(client, slug).await,
        GitHubEffect::CreateTeam { team } => create_team(client, team).await,
        GitHubEffect::EditTeam {
            id,
            team,
            remove_parent,
        } => edit_team(client, id, team, remove_parent).await,
        GitHubEffect::DeleteTeam { id } => delete_team(client, id).await,
        GitHubEffect::RemoveTeamMember { slug, login } => {
            remove_team_member(client, slug, login).await
        }
        GitHubEffect::UpdateLdapMapping { id, ldap_dn } => {
            update_ldap_mapping(client, id, ldap_dn).await
        }
    }
}

fn team_route(client: &OctocrabClient, id: TeamId) -> String {
    format!("/organizations/{}/team/{}", client.owner().id, id)
}

// ─── Owner ────────────────────────────────────────────────────────────────────

async fn get_organization(
    client: &OctocrabClient,
    login: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/orgs/{}", login);
    let result: Result<RawOrganization, _> = client.inner().get(&url, None::<&()>).await;

    match result {
        Ok(org) => Ok(GitHubResponse::Organization(OrganizationData {
            id: OrgId(org.id),
            login: org.login,
        })),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Team Queries ─────────────────────────────────────────────────────────────

async fn get_team(
    client: &OctocrabClient,
    id: TeamId,
    etag: Option<ETag>,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = team_route(client, id);

    let mut headers = HeaderMap::new();
    if let Some(tag) = etag.as_ref().filter(|t| !t.is_empty()) {
        let value = HeaderValue::from_str(tag.as_str()).map_err(|e| {
            GitHubApiError::permanent_without_source(format!(
                "invalid entity tag {:?}: {}",
                tag.as_str(),
                e
            ))
        })?;
        headers.insert(IF_NONE_MATCH, value);
    }

    let response = client
        .inner()
        ._get_with_headers(url.as_str(), Some(headers))
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    if response.status() == StatusCode::NOT_MODIFIED {
        return Err(GitHubApiError::not_modified(format!(
            "team {} has not changed",
            id
        )));
    }

    let response = octocrab::map_github_error(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let etag = response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(ETag::new);

    let body = client
        .inner()
        .body_to_string(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let raw: RawTeam = serde_json::from_str(&body).map_err(|e| {
        GitHubApiError::permanent_without_source(format!("invalid team {} response: {}", id, e))
    })?;

    Ok(GitHubResponse::Team {
        team: raw.into_team_data()?,
        etag,
    })
}

async fn get_team_by_slug(
    client: &OctocrabClient,
    slug: TeamSlug,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/orgs/{}/teams/{}", client.owner_name(), slug);
    let result: Result<RawTeam, _> = client.inner().get(&url, None::<&()>).await;

    match result {
        Ok(team) => Ok(GitHubResponse::Team {
            team: team.into_team_data()?,
            etag: None,
        }),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn list_team_members(
    client: &OctocrabClient,
    slug: TeamSlug,
) -> Result<GitHubResponse, GitHubApiError> {
    #[derive(Serialize)]
    struct Variables<'a> {
        login: &'a str,
        slug: &'a str,
    }

    let variables = Variables {
        login: client.owner_name(),
        slug: slug.as_str(),
    };

    let result: Result<GraphQlResponse<TeamMembersQueryData>, _> = client
        .inner()
        .graphql(&serde_json::json!({
            "query": TEAM_MEMBERS_QUERY,
            "variables": variables,
        }))
        .await;

    match result {
        Ok(response) => {
            if let Some(error) = response.errors.first() {
                return Err(GitHubApiError::permanent_without_source(format!(
                    "GraphQL query for team {} members failed: {}",
                    slug, error.message
                )));
            }

            let team = response
                .data
                .and_then(|d| d.organization)
                .and_then(|o| o.team)
                .ok_or_else(|| {
                    GitHubApiError::not_found(format!(
                        "team {} not found in organization {}",
                        slug,
                        client.owner_name()
                    ))
                })?;

            let logins = team.members.nodes.into_iter().map(|n| n.login).collect();
            Ok(GitHubResponse::Members(logins))
        }
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

// ─── Team Mutations ───────────────────────────────────────────────────────────

async fn create_team(
    client: &OctocrabClient,
    team: NewTeam,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/orgs/{}/teams", client.owner_name());
    let request = TeamRequest::new(&team, false);

    let result: Result<RawTeam, _> = client.inner().post(&url, Some(&request)).await;

    match result {
        Ok(created) => Ok(GitHubResponse::TeamCreated(created.into_team_data()?)),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn edit_team(
    client: &OctocrabClient,
    id: TeamId,
    team: NewTeam,
    remove_parent: bool,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = team_route(client, id);
    let request = TeamRequest::new(&team, remove_parent);

    let result: Result<RawTeam, _> = client.inner().patch(&url, Some(&request)).await;

    match result {
        Ok(edited) => Ok(GitHubResponse::TeamEdited(edited.into_team_data()?)),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

async fn delete_team(client: &OctocrabClient, id: TeamId) -> Result<GitHubResponse, GitHubApiError> {
    let url = team_route(client, id);
    delete_route(client, &url).await?;
    Ok(GitHubResponse::TeamDeleted)
}

async fn remove_team_member(
    client: &OctocrabClient,
    slug: TeamSlug,
    login: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!(
        "/orgs/{}/teams/{}/memberships/{}",
        client.owner_name(),
        slug,
        login
    );
    delete_route(client, &url).await?;
    Ok(GitHubResponse::MemberRemoved)
}

async fn update_ldap_mapping(
    client: &OctocrabClient,
    id: TeamId,
    ldap_dn: String,
) -> Result<GitHubResponse, GitHubApiError> {
    let url = format!("/admin/ldap/teams/{}/mapping", id);
    let request = LdapMappingRequest { ldap_dn: &ldap_dn };

    let result: Result<serde_json::Value, _> = client.inner().patch(&url, Some(&request)).await;

    match result {
        Ok(_) => Ok(GitHubResponse::LdapMappingUpdated),
        Err(e) => Err(GitHubApiError::from_octocrab(e)),
    }
}

/// Issues a DELETE whose success response has no body (HTTP 204).
async fn delete_route(client: &OctocrabClient, url: &str) -> Result<(), GitHubApiError> {
    let response = client
        .inner()
        ._delete(url, None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    octocrab::map_github_error(response)
        .await
        .map(|_| ())
        .map_err(GitHubApiError::from_octocrab)
}

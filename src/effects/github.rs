//! GitHub API effect types.
//!
//! These types describe GitHub API operations as data, without executing them.
//! The interpreter in `crate::github` executes them against the real API; tests
//! substitute a scripted fake.

use serde::{Deserialize, Serialize};

use crate::types::{ETag, OrgId, Privacy, TeamId, TeamSlug};

/// The body of a team create or edit request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewTeam {
    pub name: String,
    pub description: String,
    pub privacy: Privacy,
    /// Resolved parent team id, if the team is nested.
    pub parent_team_id: Option<TeamId>,
}

/// A GitHub API effect.
///
/// Effects are organization-scoped: the interpreter is constructed with the
/// owning organization, so effects don't include it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GitHubEffect {
    // ─── Owner ────────────────────────────────────────────────────────────────
    /// Look up an organization by login.
    GetOrganization { login: String },

    // ─── Team Queries ─────────────────────────────────────────────────────────
    /// Fetch a team by id.
    ///
    /// When `etag` is set the request is conditional and GitHub may answer
    /// 304 Not Modified, which surfaces as a `NotModified` error.
    GetTeam { id: TeamId, etag: Option<ETag> },

    /// Fetch a team by slug.
    GetTeamBySlug { slug: TeamSlug },

    /// List the logins of a team's current members (via GraphQL).
    ListTeamMembers { slug: TeamSlug },

    // ─── Team Mutations ───────────────────────────────────────────────────────
    /// Create a team.
    CreateTeam { team: NewTeam },

    /// Edit a team by id.
    ///
    /// `remove_parent` sends an explicit `null` parent when `team` has none,
    /// detaching a nested team. Otherwise an absent parent is left untouched.
    EditTeam {
        id: TeamId,
        team: NewTeam,
        remove_parent: bool,
    },

    /// Delete a team by id. GitHub deletes child teams along with it.
    DeleteTeam { id: TeamId },

    /// Remove a user's membership from a team.
    RemoveTeamMember { slug: TeamSlug, login: String },

    /// Set the LDAP mapping of a team (GitHub Enterprise Server).
    UpdateLdapMapping { id: TeamId, ldap_dn: String },
}

impl GitHubEffect {
    /// Returns a short name for the effect, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubEffect::GetOrganization { .. } => "get_organization",
            GitHubEffect::GetTeam { .. } => "get_team",
            GitHubEffect::GetTeamBySlug { .. } => "get_team_by_slug",
            GitHubEffect::ListTeamMembers { .. } => "list_team_members",
            GitHubEffect::CreateTeam { .. } => "create_team",
            GitHubEffect::EditTeam { .. } => "edit_team",
            GitHubEffect::DeleteTeam { .. } => "delete_team",
            GitHubEffect::RemoveTeamMember { .. } => "remove_team_member",
            GitHubEffect::UpdateLdapMapping { .. } => "update_ldap_mapping",
        }
    }
}

// ─── Response Types ───────────────────────────────────────────────────────────

/// Organization data returned from the GitHub API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationData {
    pub id: OrgId,
    pub login: String,
}

/// Team data returned from the GitHub API.
///
/// Optional fields are absent from some endpoints: `members_count` is only
/// part of the full team representation and `ldap_dn` only exists on GitHub
/// Enterprise Server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamData {
    pub id: TeamId,
    pub node_id: String,
    pub name: String,
    pub slug: TeamSlug,
    pub description: Option<String>,
    pub privacy: Privacy,
    pub parent_id: Option<TeamId>,
    pub parent_slug: Option<TeamSlug>,
    pub ldap_dn: Option<String>,
    pub members_count: Option<u64>,
}

/// Response from a GitHub effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum GitHubResponse {
    /// Response to `GetOrganization`.
    Organization(OrganizationData),

    /// Response to `GetTeam` and `GetTeamBySlug`.
    Team {
        team: TeamData,
        /// The `ETag` header of the response, if GitHub sent one.
        etag: Option<ETag>,
    },

    /// Response to `ListTeamMembers`.
    Members(Vec<String>),

    /// Response to `CreateTeam`.
    TeamCreated(TeamData),

    /// Response to `EditTeam`.
    TeamEdited(TeamData),

    /// Response to `DeleteTeam`.
    TeamDeleted,

    /// Response to `RemoveTeamMember`.
    MemberRemoved,

    /// Response to `UpdateLdapMapping`.
    LdapMappingUpdated,
}

impl GitHubResponse {
    /// Returns a short name for the response variant, for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            GitHubResponse::Organization(_) => "organization",
            GitHubResponse::Team { .. } => "team",
            GitHubResponse::Members(_) => "members",
            GitHubResponse::TeamCreated(_) => "team_created",
            GitHubResponse::TeamEdited(_) => "team_edited",
            GitHubResponse::TeamDeleted => "team_deleted",
            GitHubResponse::MemberRemoved => "member_removed",
            GitHubResponse::LdapMappingUpdated => "ldap_mapping_updated",
        }
    }
}

//! Desired and observed state of a GitHub team.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ETag, OrgId, ParentTeamRef};

/// Team visibility within the organization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Privacy {
    /// Only visible to organization owners and team members.
    #[default]
    Secret,
    /// Visible to every member of the organization.
    Closed,
}

impl Privacy {
    /// Returns the GitHub API string for this privacy level.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Privacy::Secret => "secret",
            Privacy::Closed => "closed",
        }
    }
}

impl fmt::Display for Privacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

impl FromStr for Privacy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "secret" => Ok(Privacy::Secret),
            "closed" => Ok(Privacy::Closed),
            other => Err(format!(
                "expected privacy to be one of [\"secret\" \"closed\"], got {:?}",
                other
            )),
        }
    }
}

/// The desired state of a team, as declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub privacy: Privacy,

    /// Id or slug of the parent team. An empty string means no parent.
    #[serde(
        default,
        deserialize_with = "deserialize_parent",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_team_id: Option<ParentTeamRef>,

    /// LDAP distinguished name to map the team to (GitHub Enterprise Server).
    #[serde(default)]
    pub ldap_dn: String,

    /// Keep the creating user as a maintainer of the new team.
    ///
    /// GitHub adds the authenticated user to every team it creates. When this is
    /// false, that implicit member is removed right after creation.
    #[serde(default)]
    pub create_default_maintainer: bool,
}

impl TeamConfig {
    pub fn new(name: impl Into<String>) -> Self {
        TeamConfig {
            name: name.into(),
            description: String::new(),
            privacy: Privacy::default(),
            parent_team_id: None,
            ldap_dn: String::new(),
            create_default_maintainer: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_privacy(mut self, privacy: Privacy) -> Self {
        self.privacy = privacy;
        self
    }

    pub fn with_parent(mut self, parent: ParentTeamRef) -> Self {
        self.parent_team_id = Some(parent);
        self
    }

    pub fn with_ldap_dn(mut self, ldap_dn: impl Into<String>) -> Self {
        self.ldap_dn = ldap_dn.into();
        self
    }

    pub fn with_default_maintainer(mut self, keep: bool) -> Self {
        self.create_default_maintainer = keep;
        self
    }
}

fn deserialize_parent<'de, D>(deserializer: D) -> Result<Option<ParentTeamRef>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(ParentTeamRef::parse_optional))
}

/// The state of a team as last observed from GitHub.
///
/// `parent_team_id` and `ldap_dn` use the empty string for "none", matching how
/// the values are stored by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamState {
    pub name: String,
    pub description: String,
    pub privacy: Privacy,
    pub parent_team_id: String,
    /// Slug of the parent team, empty when none. Lets a slug reference in
    /// configuration be compared without a lookup.
    pub parent_team_slug: String,
    pub ldap_dn: String,
    pub slug: String,
    pub node_id: String,
    pub members_count: u64,
    pub etag: ETag,
}

impl TeamState {
    /// Returns true if the observed team has a parent.
    pub fn has_parent(&self) -> bool {
        !self.parent_team_id.is_empty()
    }
}

/// The account that owns the managed teams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    /// Login of the owner (organization name).
    pub name: String,
    /// Organization id. Meaningless when `is_organization` is false.
    pub id: OrgId,
    pub is_organization: bool,
}

impl Owner {
    pub fn organization(name: impl Into<String>, id: OrgId) -> Self {
        Owner {
            name: name.into(),
            id,
            is_organization: true,
        }
    }

    pub fn user(name: impl Into<String>) -> Self {
        Owner {
            name: name.into(),
            id: OrgId(0),
            is_organization: false,
        }
    }
}

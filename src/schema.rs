//! Attribute schema of the team resource.
//!
//! The host hands configuration over as a flat attribute map. This module owns
//! the field table, turns an attribute map into a [`TeamConfig`], validates it,
//! and computes the difference between desired and observed state.

use std::fmt;

use serde_json::{Map, Value};

use crate::types::{ParentTeamRef, Privacy, TeamConfig, TeamState};

/// Value type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    Integer,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::String => f.write_str("string"),
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Integer => f.write_str("integer"),
        }
    }
}

/// Who sets a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be set in configuration.
    Required,
    /// May be set in configuration; a default applies otherwise.
    Optional,
    /// Set by the provider from what GitHub reports. Never configurable.
    Computed,
}

/// One attribute of the team resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    /// Value used when an optional field is absent, rendered as text.
    pub default: Option<&'static str>,
    pub description: &'static str,
}

/// The attributes of the team resource.
pub const TEAM_FIELDS: &[FieldSchema] = &[
    FieldSchema {
        name: "name",
        kind: FieldKind::String,
        presence: Presence::Required,
        default: None,
        description: "The name of the team.",
    },
    FieldSchema {
        name: "description",
        kind: FieldKind::String,
        presence: Presence::Optional,
        default: Some(""),
        description: "A description of the team.",
    },
    FieldSchema {
        name: "privacy",
        kind: FieldKind::String,
        presence: Presence::Optional,
        default: Some("secret"),
        description: "The level of privacy for the team. Must be one of 'secret' or 'closed'.",
    },
    FieldSchema {
        name: "parent_team_id",
        kind: FieldKind::String,
        presence: Presence::Optional,
        default: None,
        description: "The ID or slug of the parent team, if this is a nested team.",
    },
    FieldSchema {
        name: "ldap_dn",
        kind: FieldKind::String,
        presence: Presence::Optional,
        default: Some(""),
        description: "The LDAP Distinguished Name of the group where membership will be synchronized. Only available in GitHub Enterprise Server.",
    },
    FieldSchema {
        name: "create_default_maintainer",
        kind: FieldKind::Bool,
        presence: Presence::Optional,
        default: Some("false"),
        description: "Adds a default maintainer to the team. Only takes effect when the team is created.",
    },
    FieldSchema {
        name: "slug",
        kind: FieldKind::String,
        presence: Presence::Computed,
        default: None,
        description: "The slug of the created team.",
    },
    FieldSchema {
        name: "etag",
        kind: FieldKind::String,
        presence: Presence::Computed,
        default: None,
        description: "Entity tag of the last observed team representation.",
    },
    FieldSchema {
        name: "node_id",
        kind: FieldKind::String,
        presence: Presence::Computed,
        default: None,
        description: "The node ID of the created team.",
    },
    FieldSchema {
        name: "members_count",
        kind: FieldKind::Integer,
        presence: Presence::Computed,
        default: None,
        description: "Number of members of the team.",
    },
    FieldSchema {
        name: "parent_team_slug",
        kind: FieldKind::String,
        presence: Presence::Computed,
        default: None,
        description: "The slug of the parent team, if any.",
    },
];

/// Looks up a field by name.
pub fn field(name: &str) -> Option<&'static FieldSchema> {
    TEAM_FIELDS.iter().find(|f| f.name == name)
}

/// A problem with one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        FieldError {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub errors: Vec<FieldError>,
}

impl SchemaError {
    /// Returns true if any error concerns `field`.
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaError {}

/// Decodes an attribute map into a team configuration.
///
/// All problems are reported at once. Unknown attributes and attempts to set
/// computed attributes are errors; absent optional attributes take their
/// defaults. A `null` value counts as absent.
pub fn decode(attrs: &Map<String, Value>) -> Result<TeamConfig, SchemaError> {
    let mut errors = Vec::new();

    for (key, value) in attrs {
        match field(key) {
            None => errors.push(FieldError::new(key, "unknown attribute")),
            Some(schema) if schema.presence == Presence::Computed && !value.is_null() => {
                errors.push(FieldError::new(key, "computed attribute cannot be set"))
            }
            Some(_) => {}
        }
    }

    let name = string_attr(attrs, "name", &mut errors);
    if name.is_none() && !errors.iter().any(|e| e.field == "name") {
        errors.push(FieldError::new("name", "required attribute is missing"));
    }
    let description = string_attr(attrs, "description", &mut errors);
    let privacy = string_attr(attrs, "privacy", &mut errors).and_then(|p| {
        p.parse::<Privacy>()
            .map_err(|msg| errors.push(FieldError::new("privacy", msg)))
            .ok()
    });
    let parent = string_attr(attrs, "parent_team_id", &mut errors);
    let ldap_dn = string_attr(attrs, "ldap_dn", &mut errors);
    let create_default_maintainer = bool_attr(attrs, "create_default_maintainer", &mut errors);

    let mut config = TeamConfig::new(name.unwrap_or_default());
    config.description = description.unwrap_or_default();
    config.privacy = privacy.unwrap_or_default();
    config.parent_team_id = parent.as_deref().and_then(ParentTeamRef::parse_optional);
    config.ldap_dn = ldap_dn.unwrap_or_default();
    config.create_default_maintainer = create_default_maintainer.unwrap_or(false);

    if let Err(e) = validate(&config) {
        for error in e.errors {
            if !errors.iter().any(|existing| existing.field == error.field) {
                errors.push(error);
            }
        }
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(SchemaError { errors })
    }
}

fn string_attr(attrs: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match attrs.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => {
            errors.push(FieldError::new(key, format!("expected string, got {}", other)));
            None
        }
    }
}

fn bool_attr(attrs: &Map<String, Value>, key: &str, errors: &mut Vec<FieldError>) -> Option<bool> {
    match attrs.get(key) {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(other) => {
            errors.push(FieldError::new(key, format!("expected bool, got {}", other)));
            None
        }
    }
}

/// Checks invariants serde cannot express.
pub fn validate(config: &TeamConfig) -> Result<(), SchemaError> {
    let mut errors = Vec::new();

    if config.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if let Some(ParentTeamRef::Slug(slug)) = &config.parent_team_id {
        if slug.as_str().trim().is_empty() {
            errors.push(FieldError::new("parent_team_id", "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { errors })
    }
}

// ─── Planning ─────────────────────────────────────────────────────────────────

/// What applying a configuration would do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanAction {
    Create,
    Update,
    NoOp,
}

/// A configured attribute whose desired value differs from the observed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: &'static str,
    pub old: String,
    pub new: String,
}

/// The difference between desired and observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub action: PlanAction,
    pub changes: Vec<FieldChange>,
    /// Computed attributes whose value will only be known after applying.
    pub recomputed: Vec<&'static str>,
}

impl Plan {
    pub fn is_noop(&self) -> bool {
        self.action == PlanAction::NoOp
    }

    /// Returns true if `field` changes.
    pub fn changes_field(&self, field: &str) -> bool {
        self.changes.iter().any(|c| c.field == field)
    }
}

/// Computes the plan for moving `observed` towards `desired`.
///
/// Without observed state the team is created. `create_default_maintainer`
/// never produces a change: it is only consulted at creation. A name change
/// marks `slug` as recomputed, since GitHub derives it from the name.
pub fn plan(desired: &TeamConfig, observed: Option<&TeamState>) -> Plan {
    let Some(state) = observed else {
        return Plan {
            action: PlanAction::Create,
            changes: Vec::new(),
            recomputed: TEAM_FIELDS
                .iter()
                .filter(|f| f.presence == Presence::Computed)
                .map(|f| f.name)
                .collect(),
        };
    };

    let mut changes = Vec::new();
    let mut push = |field: &'static str, old: &str, new: &str| {
        if old != new {
            changes.push(FieldChange {
                field,
                old: old.to_string(),
                new: new.to_string(),
            });
        }
    };

    push("name", &state.name, &desired.name);
    push("description", &state.description, &desired.description);
    push(
        "privacy",
        state.privacy.as_api_str(),
        desired.privacy.as_api_str(),
    );
    push("ldap_dn", &state.ldap_dn, &desired.ldap_dn);

    let parent_matches = match &desired.parent_team_id {
        None => !state.has_parent(),
        Some(ParentTeamRef::Id(id)) => state.parent_team_id == id.to_string(),
        Some(ParentTeamRef::Slug(slug)) => state.parent_team_slug == slug.as_str(),
    };
    if !parent_matches {
        let new = desired
            .parent_team_id
            .as_ref()
            .map(|p| p.to_string())
            .unwrap_or_default();
        changes.push(FieldChange {
            field: "parent_team_id",
            old: state.parent_team_id.clone(),
            new,
        });
    }

    let mut recomputed = Vec::new();
    if changes.iter().any(|c| c.field == "name") {
        recomputed.push("slug");
    }
    if !changes.is_empty() {
        recomputed.push("etag");
    }

    let action = if changes.is_empty() {
        PlanAction::NoOp
    } else {
        PlanAction::Update
    };

    Plan {
        action,
        changes,
        recomputed,
    }
}

//! Grants model and its JSON shape
//!
//! ```json
//! {
//!   "user":  { "video": { "read:any": ["*", "!views"], "update:own": ["title"] } },
//!   "admin": { "video": { "delete:any": ["*"] }, "$extend": ["user"] }
//! }
//! ```

use crate::error::{AccessError, Result};
use crate::types::{validate_attributes, validate_name, AccessInfo, ActionKey, EXTEND_KEY};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute lists of one resource, keyed by action-possession
pub type ResourceGrants = BTreeMap<ActionKey, Vec<String>>;

/// Full grants model: role name to role entry
pub type Grants = BTreeMap<String, RoleGrants>;

/// Grants of a single role plus the roles it extends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleGrants {
    /// Resource name to its action-possession entries
    pub resources: BTreeMap<String, ResourceGrants>,

    /// Extended roles, in declaration order, without duplicates
    pub extends: Vec<String>,
}

impl RoleGrants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource entry (builder style, mostly for tests and fixtures)
    pub fn with_resource(
        mut self,
        resource: impl Into<String>,
        key: ActionKey,
        attributes: Vec<String>,
    ) -> Self {
        self.resources
            .entry(resource.into())
            .or_default()
            .insert(key, attributes);
        self
    }

    pub fn with_extends(mut self, roles: Vec<String>) -> Self {
        self.extends = roles;
        self
    }

    /// Attribute list stored for `resource` under `key`, if any
    pub fn attributes(&self, resource: &str, key: &ActionKey) -> Option<&Vec<String>> {
        self.resources.get(resource).and_then(|r| r.get(key))
    }

    /// Parse a role entry from its JSON shape
    pub fn from_json(role: &str, value: &Value) -> Result<Self> {
        let object = value.as_object().ok_or_else(|| {
            AccessError::InvalidShape(format!("Invalid role definition for \"{}\"", role))
        })?;

        let mut entry = RoleGrants::new();
        for (name, resource) in object {
            let name = name.trim();
            if name == EXTEND_KEY {
                entry.extends = parse_extends(role, resource)?;
                continue;
            }
            validate_name("resource", name)?;
            entry
                .resources
                .insert(name.to_string(), parse_resource(name, resource)?);
        }
        Ok(entry)
    }
}

fn parse_extends(role: &str, value: &Value) -> Result<Vec<String>> {
    let invalid = || {
        AccessError::InvalidShape(format!(
            "Invalid extend value for role \"{}\": {}",
            role, value
        ))
    };
    let list = value.as_array().filter(|l| !l.is_empty()).ok_or_else(invalid)?;

    let mut extends: Vec<String> = Vec::with_capacity(list.len());
    for item in list {
        let name = item.as_str().map(str::trim).filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if !extends.iter().any(|e| e == name) {
            extends.push(name.to_string());
        }
    }
    Ok(extends)
}

fn parse_resource(resource: &str, value: &Value) -> Result<ResourceGrants> {
    let object = value.as_object().ok_or_else(|| {
        AccessError::InvalidShape(format!("Invalid resource definition for \"{}\"", resource))
    })?;

    let mut entry = ResourceGrants::new();
    for (key, attributes) in object {
        let action_key: ActionKey = key.parse()?;
        let list = attributes.as_array().ok_or_else(|| {
            AccessError::InvalidAttributes(format!(
                "Invalid resource attributes for action \"{}\"",
                key
            ))
        })?;
        let attributes = list
            .iter()
            .map(|a| {
                a.as_str().map(str::to_string).ok_or_else(|| {
                    AccessError::InvalidAttributes(format!(
                        "Invalid resource attributes for action \"{}\"",
                        key
                    ))
                })
            })
            .collect::<Result<Vec<String>>>()?;
        validate_attributes(key, &attributes)?;
        entry.insert(action_key, attributes);
    }
    Ok(entry)
}

/// Parse a full grants model from its JSON shape
pub fn grants_from_json(value: &Value) -> Result<Grants> {
    let object = value.as_object().ok_or_else(|| {
        AccessError::InvalidShape("Invalid grants object, expected a role mapping".to_string())
    })?;
    let mut grants = Grants::new();
    for (role, entry) in object {
        let role = role.trim();
        validate_name("role", role)?;
        grants.insert(role.to_string(), RoleGrants::from_json(role, entry)?);
    }
    Ok(grants)
}

impl Serialize for RoleGrants {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let extra = usize::from(!self.extends.is_empty());
        let mut map = serializer.serialize_map(Some(self.resources.len() + extra))?;
        for (resource, entry) in &self.resources {
            map.serialize_entry(resource, entry)?;
        }
        if !self.extends.is_empty() {
            map.serialize_entry(EXTEND_KEY, &self.extends)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RoleGrants {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        RoleGrants::from_json("<role>", &value).map_err(serde::de::Error::custom)
    }
}

/// Bulk input accepted by [`GrantStore::set_grants`](crate::store::GrantStore::set_grants)
#[derive(Debug, Clone, PartialEq)]
pub enum GrantsInput {
    /// Nested role mapping, validated in place
    Mapping(Grants),
    /// Flat grant records, committed one by one into an empty model
    Records(Vec<AccessInfo>),
}

impl GrantsInput {
    /// Dispatch raw JSON on its shape: object → mapping, array → records
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(_) => Ok(GrantsInput::Mapping(grants_from_json(&value)?)),
            Value::Array(items) => {
                let records = items
                    .into_iter()
                    .map(serde_json::from_value::<AccessInfo>)
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|e| AccessError::InvalidShape(format!("Invalid grant record: {}", e)))?;
                Ok(GrantsInput::Records(records))
            }
            other => Err(AccessError::InvalidShape(format!(
                "Invalid grants, expected an object (role mapping) or an array (grant records), got: {}",
                other
            ))),
        }
    }
}

impl From<Grants> for GrantsInput {
    fn from(grants: Grants) -> Self {
        GrantsInput::Mapping(grants)
    }
}

impl From<Vec<AccessInfo>> for GrantsInput {
    fn from(records: Vec<AccessInfo>) -> Self {
        GrantsInput::Records(records)
    }
}

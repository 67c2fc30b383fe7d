//! Permission: the resolved outcome of a query

use crate::error::Result;
use crate::grants::Grants;
use crate::hierarchy::RoleHierarchy;
use crate::notation;
use crate::types::{ActionKey, NormalizedQuery, Possession, QueryInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Resolved permission for a set of roles on one resource and action key
///
/// # Example
///
/// ```
/// use cretoai_access::AccessControl;
/// use serde_json::json;
///
/// let mut ac = AccessControl::new();
/// ac.grant("user")?.attributes(["*", "!password"]).read_any("account")?;
///
/// let permission = ac.can("user").read_own("account")?;
/// assert!(permission.granted());
///
/// let visible = permission.filter(&json!({ "id": 1, "password": "x" }))?;
/// assert_eq!(visible, json!({ "id": 1 }));
/// # Ok::<(), cretoai_access::AccessError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Roles as queried (not flattened)
    roles: Vec<String>,

    /// Queried resource
    resource: String,

    /// Queried action key
    key: ActionKey,

    /// Union of the attributes of every effective role
    attributes: Vec<String>,
}

impl Permission {
    /// Resolve a query against a grants model
    pub fn resolve(grants: &Grants, query: &QueryInfo) -> Result<Self> {
        Self::resolve_with(grants, query, true)
    }

    pub(crate) fn resolve_with(grants: &Grants, query: &QueryInfo, trace: bool) -> Result<Self> {
        let query = query.normalize()?;
        let attributes = union_attributes_of_roles(grants, &query)?;
        if trace {
            debug!(
                roles = ?query.roles,
                resource = %query.resource,
                key = %query.key,
                granted = !attributes.is_empty(),
                "Resolved permission"
            );
        }
        Ok(Self {
            roles: query.roles,
            resource: query.resource,
            key: query.key,
            attributes,
        })
    }

    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn action_key(&self) -> ActionKey {
        self.key
    }

    /// Granted attribute globs, free of duplicates and redundant entries
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Access is granted when at least one attribute is granted
    pub fn granted(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Keep only the granted fields of `data` (an object or an array of objects)
    pub fn filter(&self, data: &Value) -> Result<Value> {
        Ok(notation::filter_all(data, &self.attributes)?)
    }
}

/// Attributes granted to the flattened roles of `query`.
///
/// Each role contributes the list stored under the exact key; for an `own`
/// query with no `own` entry the role's `any` entry is used instead. The
/// per-role lists are then unioned left to right. A single list goes through
/// the same union, so duplicate and redundant globs never reach the result.
fn union_attributes_of_roles(grants: &Grants, query: &NormalizedQuery) -> Result<Vec<String>> {
    let roles = RoleHierarchy::new(grants).flatten_roles(&query.roles)?;

    let mut lists: Vec<&[String]> = Vec::new();
    for role in &roles {
        let Some(entry) = grants.get(role) else {
            continue;
        };
        let Some(resource) = entry.resources.get(&query.resource) else {
            continue;
        };
        let attributes = resource.get(&query.key).or_else(|| {
            (query.key.possession == Possession::Own)
                .then(|| resource.get(&query.key.as_any()))
                .flatten()
        });
        lists.push(attributes.map(Vec::as_slice).unwrap_or(&[]));
    }

    let mut lists = lists.into_iter();
    let Some(first) = lists.next() else {
        return Ok(Vec::new());
    };
    let mut merged = notation::union_strs(first, &[])?;
    for next in lists {
        merged = notation::union_strs(&merged, next)?;
    }
    Ok(merged)
}

//! AccessControl facade
//!
//! Owns the [`GrantStore`] and hands out [`Access`] builders (mutable borrow)
//! and [`Query`] builders (shared borrow) over it.

use crate::access::Access;
use crate::error::Result;
use crate::grants::{Grants, GrantsInput};
use crate::notation;
use crate::permission::Permission;
use crate::query::Query;
use crate::store::GrantStore;
use crate::types::{AccessInfo, IntoNames, QueryInfo};
use serde_json::Value;

/// AccessControl configuration
#[derive(Debug, Clone)]
pub struct AccessControlConfig {
    /// Lock the grants model right after loading the initial grants
    pub lock: bool,

    /// Emit a `debug!` event for every resolved permission
    pub trace_decisions: bool,
}

impl Default for AccessControlConfig {
    fn default() -> Self {
        Self {
            lock: false,
            trace_decisions: true,
        }
    }
}

/// Role based access control over an in-memory grants model
///
/// # Example
///
/// ```
/// use cretoai_access::{AccessControl, GrantsInput};
/// use serde_json::json;
///
/// let grants = GrantsInput::from_json(json!({
///     "user": { "video": { "read:any": ["*", "!views"] } }
/// }))?;
/// let mut ac = AccessControl::with_grants(grants)?;
/// ac.grant("admin")?.extend("user")?.update_any("video")?;
/// ac.lock()?;
///
/// let permission = ac.can("admin").read_any("video")?;
/// assert_eq!(permission.attributes(), &["*", "!views"]);
/// assert!(ac.grant("guest").unwrap_err().is_locked());
/// # Ok::<(), cretoai_access::AccessError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    store: GrantStore,
    config: AccessControlConfig,
}

impl AccessControl {
    /// Empty, unlocked instance with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Instance initialised from a role mapping or a list of grant records
    pub fn with_grants(input: impl Into<GrantsInput>) -> Result<Self> {
        Self::with_config(input, AccessControlConfig::default())
    }

    pub fn with_config(input: impl Into<GrantsInput>, config: AccessControlConfig) -> Result<Self> {
        let mut store = GrantStore::from_input(input)?;
        if config.lock {
            store.lock()?;
        }
        Ok(Self { store, config })
    }

    pub fn config(&self) -> &AccessControlConfig {
        &self.config
    }

    /// Underlying grant store
    pub fn store(&self) -> &GrantStore {
        &self.store
    }

    /// Current grants model
    pub fn get_grants(&self) -> &Grants {
        self.store.grants()
    }

    /// Current grants model in its JSON shape
    pub fn grants_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.store.grants())?)
    }

    /// Replace the grants model
    pub fn set_grants(&mut self, input: impl Into<GrantsInput>) -> Result<&mut Self> {
        self.store.set_grants(input)?;
        Ok(self)
    }

    /// Replace the grants model from raw JSON (role mapping or record array)
    pub fn set_grants_json(&mut self, value: Value) -> Result<&mut Self> {
        self.store.ensure_unlocked()?;
        let input = GrantsInput::from_json(value)?;
        self.set_grants(input)
    }

    /// Remove every grant
    pub fn reset(&mut self) -> Result<&mut Self> {
        self.store.reset()?;
        Ok(self)
    }

    /// Permanently freeze the grants model
    pub fn lock(&mut self) -> Result<&mut Self> {
        self.store.lock()?;
        Ok(self)
    }

    pub fn is_locked(&self) -> bool {
        self.store.is_locked()
    }

    /// Make `roles` inherit the grants of `extenders`. Missing `roles` are created.
    pub fn extend_role(&mut self, roles: impl IntoNames, extenders: impl IntoNames) -> Result<&mut Self> {
        self.store
            .extend_role(&roles.into_names(), &extenders.into_names(), false)?;
        Ok(self)
    }

    /// Remove roles and prune them from every inheritance list
    pub fn remove_roles(&mut self, roles: impl IntoNames) -> Result<&mut Self> {
        self.store.remove_roles(&roles.into_names())?;
        Ok(self)
    }

    /// Remove resources from `roles`, or from every role when `roles` is `None`
    pub fn remove_resources(&mut self, resources: impl IntoNames, roles: Option<Vec<String>>) -> Result<&mut Self> {
        self.store
            .remove_resources(&resources.into_names(), roles.as_deref())?;
        Ok(self)
    }

    pub fn get_roles(&self) -> Vec<String> {
        self.store.roles()
    }

    pub fn get_resources(&self) -> Vec<String> {
        self.store.resources()
    }

    /// Every role `role` inherits from, directly or not
    pub fn get_inherited_roles_of(&self, role: &str) -> Result<Vec<String>> {
        self.store.hierarchy().inherited_roles_of(role)
    }

    pub fn get_extended_roles_of(&self, role: &str) -> Result<Vec<String>> {
        self.get_inherited_roles_of(role)
    }

    /// Whether every given role exists
    pub fn has_role(&self, roles: impl IntoNames) -> bool {
        self.store.has_role(&roles.into_names())
    }

    /// Whether every given resource is granted on by at least one role
    pub fn has_resource(&self, resources: impl IntoNames) -> bool {
        self.store.has_resource(&resources.into_names())
    }

    /// Start a grant chain for `roles`
    pub fn grant(&mut self, roles: impl IntoNames) -> Result<Access<'_>> {
        Access::new(&mut self.store, roles, false)
    }

    /// Start a grant chain from a record; a complete record is committed at once
    pub fn grant_info(&mut self, info: AccessInfo) -> Result<Access<'_>> {
        Access::from_info(&mut self.store, info, false)
    }

    pub fn allow(&mut self, roles: impl IntoNames) -> Result<Access<'_>> {
        self.grant(roles)
    }

    /// Start a deny chain for `roles`
    pub fn deny(&mut self, roles: impl IntoNames) -> Result<Access<'_>> {
        Access::new(&mut self.store, roles, true)
    }

    pub fn deny_info(&mut self, info: AccessInfo) -> Result<Access<'_>> {
        Access::from_info(&mut self.store, info, true)
    }

    pub fn reject(&mut self, roles: impl IntoNames) -> Result<Access<'_>> {
        self.deny(roles)
    }

    /// Start a permission query for `roles`
    pub fn can(&self, roles: impl IntoNames) -> Query<'_> {
        Query::new(&self.store, roles, self.config.trace_decisions)
    }

    pub fn can_info(&self, info: QueryInfo) -> Result<Query<'_>> {
        Query::from_info(&self.store, info, self.config.trace_decisions)
    }

    pub fn query(&self, roles: impl IntoNames) -> Query<'_> {
        self.can(roles)
    }

    /// Resolve a complete query record in one step
    pub fn permission(&self, info: &QueryInfo) -> Result<Permission> {
        Permission::resolve_with(self.store.grants(), info, self.config.trace_decisions)
    }

    /// Keep only the fields of `data` allowed by `attributes`
    pub fn filter<S: AsRef<str>>(data: &Value, attributes: &[S]) -> Result<Value> {
        Ok(notation::filter_all(data, attributes)?)
    }
}

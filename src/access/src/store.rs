//! Grant store: the canonical grants model plus its lock state
//!
//! Every mutation validates its whole input before touching the model, so a
//! failed call leaves the store exactly as it was. Once locked, the store is
//! permanently read-only.

use crate::error::{AccessError, Result};
use crate::grants::{Grants, GrantsInput, RoleGrants};
use crate::hierarchy::{self, RoleHierarchy};
use crate::types::{validate_attributes, validate_name, validate_names, AccessInfo, ActionKey, NormalizedAccess};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Owned grants model with a one-way lock
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GrantStore {
    grants: Grants,
    locked: bool,
}

impl GrantStore {
    /// Create an empty, unlocked store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from bulk input
    pub fn from_input(input: impl Into<GrantsInput>) -> Result<Self> {
        let mut store = Self::new();
        store.set_grants(input)?;
        Ok(store)
    }

    /// Current grants model
    pub fn grants(&self) -> &Grants {
        &self.grants
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Inheritance view over the current model
    pub fn hierarchy(&self) -> RoleHierarchy<'_> {
        RoleHierarchy::new(&self.grants)
    }

    pub(crate) fn ensure_unlocked(&self) -> Result<()> {
        if self.locked {
            return Err(AccessError::Locked);
        }
        Ok(())
    }

    /// Replace the whole model with `input`.
    ///
    /// A mapping is validated (names, attribute lists, extend lists) and then
    /// adopted; records are committed one at a time into an empty model.
    pub fn set_grants(&mut self, input: impl Into<GrantsInput>) -> Result<()> {
        self.ensure_unlocked()?;

        let grants = match input.into() {
            GrantsInput::Mapping(mut grants) => {
                Self::validate(&mut grants)?;
                grants
            }
            GrantsInput::Records(records) => {
                let mut grants = Grants::new();
                for record in &records {
                    commit_record(&mut grants, record)?;
                }
                grants
            }
        };

        info!(roles = grants.len(), "Loaded grants");
        self.grants = grants;
        Ok(())
    }

    /// Validate a structured model in place.
    ///
    /// Extend lists are re-applied through the extend algorithm, so missing
    /// roles, self-extension and cycles are all rejected here.
    pub fn validate(grants: &mut Grants) -> Result<()> {
        for (role, entry) in grants.iter() {
            validate_name("role", role)?;
            for (resource, actions) in &entry.resources {
                validate_name("resource", resource)?;
                for (key, attributes) in actions {
                    validate_attributes(&format!("{}:{}", resource, key), attributes)?;
                }
            }
        }

        let extending: Vec<(String, Vec<String>)> = grants
            .iter()
            .filter(|(_, entry)| !entry.extends.is_empty())
            .map(|(role, entry)| (role.clone(), entry.extends.clone()))
            .collect();
        for (role, extends) in extending {
            hierarchy::extend_role(grants, &[role], &extends, true)?;
        }

        Ok(())
    }

    /// Drop every grant
    pub fn reset(&mut self) -> Result<()> {
        self.ensure_unlocked()?;
        self.grants.clear();
        info!("Grants reset");
        Ok(())
    }

    /// Permanently freeze the model. Locking an already locked store is a
    /// no-op; locking an empty or inconsistent model fails.
    pub fn lock(&mut self) -> Result<()> {
        if self.grants.is_empty() {
            return Err(AccessError::EmptyGrants);
        }
        if self.locked {
            return Ok(());
        }

        let mut check = self.grants.clone();
        Self::validate(&mut check)?;

        self.locked = true;
        info!(roles = self.grants.len(), "Grants locked");
        Ok(())
    }

    /// Commit a full grant record. The record must name an action.
    pub fn commit(&mut self, info: &AccessInfo) -> Result<()> {
        self.ensure_unlocked()?;
        commit_record(&mut self.grants, info)
    }

    /// Commit a record whose action key was fixed by the caller
    pub(crate) fn commit_with_key(&mut self, access: &NormalizedAccess, key: ActionKey) -> Result<()> {
        self.ensure_unlocked()?;
        write_grant(&mut self.grants, access, key);
        Ok(())
    }

    /// Create empty entries for roles that do not exist yet
    pub fn pre_create_roles(&mut self, roles: &[String]) -> Result<()> {
        self.ensure_unlocked()?;
        validate_names("role", roles)?;
        for role in roles {
            self.grants.entry(role.clone()).or_default();
        }
        Ok(())
    }

    /// Make `roles` extend `extenders`, creating missing `roles` entries.
    /// Nothing is created when the extension is rejected.
    pub fn extend_role(&mut self, roles: &[String], extenders: &[String], replace: bool) -> Result<()> {
        self.ensure_unlocked()?;
        validate_names("role", roles)?;

        let mut candidate = self.grants.clone();
        for role in roles {
            candidate.entry(role.clone()).or_insert_with(RoleGrants::new);
        }
        hierarchy::extend_role(&mut candidate, roles, extenders, replace)?;
        self.grants = candidate;
        Ok(())
    }

    /// Remove roles entirely and prune them from every remaining extend list
    pub fn remove_roles(&mut self, roles: &[String]) -> Result<()> {
        self.ensure_unlocked()?;
        validate_names("role", roles)?;
        if let Some(missing) = roles.iter().find(|r| !self.grants.contains_key(r.as_str())) {
            return Err(AccessError::RoleNotFound(format!(
                "Cannot remove a non-existing role: \"{}\"",
                missing
            )));
        }

        for role in roles {
            self.grants.remove(role);
        }
        for (name, entry) in self.grants.iter_mut() {
            let before = entry.extends.len();
            entry.extends.retain(|r| !roles.contains(r));
            if entry.extends.len() != before {
                warn!(role = %name, removed = ?roles, "Pruned removed roles from extend list");
            }
        }
        debug!(roles = ?roles, "Removed roles");
        Ok(())
    }

    /// Remove resource entries, for every role or only for `roles`
    pub fn remove_resources(&mut self, resources: &[String], roles: Option<&[String]>) -> Result<()> {
        self.remove_permission(resources, roles, None)
    }

    /// Remove a single action key (or, with `key == None`, whole resource
    /// entries) from every matching role/resource pair
    pub fn remove_permission(
        &mut self,
        resources: &[String],
        roles: Option<&[String]>,
        key: Option<ActionKey>,
    ) -> Result<()> {
        self.ensure_unlocked()?;
        validate_names("resource", resources)?;
        if let Some(roles) = roles {
            validate_names("role", roles)?;
        }

        for (role, entry) in self.grants.iter_mut() {
            if roles.is_some_and(|filter| !filter.contains(role)) {
                continue;
            }
            for resource in resources {
                match key {
                    Some(key) => {
                        if let Some(actions) = entry.resources.get_mut(resource) {
                            actions.remove(&key);
                        }
                    }
                    None => {
                        entry.resources.remove(resource);
                    }
                }
            }
        }
        debug!(resources = ?resources, roles = ?roles, key = ?key.map(|k| k.to_string()), "Removed permission");
        Ok(())
    }

    /// All role names
    pub fn roles(&self) -> Vec<String> {
        self.grants.keys().cloned().collect()
    }

    /// All distinct resource names, across every role
    pub fn resources(&self) -> Vec<String> {
        self.grants
            .values()
            .flat_map(|entry| entry.resources.keys().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether every named role exists
    pub fn has_role(&self, roles: &[String]) -> bool {
        !roles.is_empty() && roles.iter().all(|r| self.grants.contains_key(r))
    }

    /// Whether every named resource is granted on by some role
    pub fn has_resource(&self, resources: &[String]) -> bool {
        !resources.is_empty()
            && resources
                .iter()
                .all(|res| self.grants.values().any(|entry| entry.resources.contains_key(res)))
    }
}

fn commit_record(grants: &mut Grants, info: &AccessInfo) -> Result<()> {
    let access = info.normalize()?;
    let key = access.key.ok_or_else(|| {
        AccessError::InvalidAction(format!("no action given for role(s) {:?}", access.roles))
    })?;
    write_grant(grants, &access, key);
    Ok(())
}

/// Write `attributes` under `key` for every role × resource, creating entries
/// as needed. Last write wins.
fn write_grant(grants: &mut Grants, access: &NormalizedAccess, key: ActionKey) {
    for role in &access.roles {
        let entry = grants.entry(role.clone()).or_default();
        for resource in &access.resources {
            entry
                .resources
                .entry(resource.clone())
                .or_default()
                .insert(key, access.attributes.clone());
        }
    }
    debug!(
        roles = ?access.roles,
        resources = ?access.resources,
        key = %key,
        attributes = access.attributes.len(),
        "Committed grant"
    );
}

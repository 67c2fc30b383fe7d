//! Query builder: resolves permissions against a grant store

use crate::error::{AccessError, Result};
use crate::permission::Permission;
use crate::store::GrantStore;
use crate::types::{Action, IntoNames, Possession, QueryInfo};

/// Permission query bound to a grant store
///
/// Each action method resolves a [`Permission`] from the current draft
/// without consuming the query, so one query can answer several questions.
#[derive(Debug, Clone)]
pub struct Query<'a> {
    store: &'a GrantStore,
    draft: QueryInfo,
    trace: bool,
}

impl<'a> Query<'a> {
    pub(crate) fn new(store: &'a GrantStore, roles: impl IntoNames, trace: bool) -> Self {
        Self {
            store,
            draft: QueryInfo {
                role: roles.into_names(),
                ..Default::default()
            },
            trace,
        }
    }

    pub(crate) fn from_info(store: &'a GrantStore, info: QueryInfo, trace: bool) -> Result<Self> {
        if info.is_empty() {
            return Err(AccessError::InvalidShape(
                "Invalid query: no role, resource or action given".to_string(),
            ));
        }
        Ok(Self {
            store,
            draft: info,
            trace,
        })
    }

    pub fn role(mut self, roles: impl IntoNames) -> Self {
        self.draft.role = roles.into_names();
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.draft.resource = Some(resource.into());
        self
    }

    pub fn create_own(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Create, Possession::Own)
    }

    pub fn create_any(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Create, Possession::Any)
    }

    pub fn read_own(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Read, Possession::Own)
    }

    pub fn read_any(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Read, Possession::Any)
    }

    pub fn update_own(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Update, Possession::Own)
    }

    pub fn update_any(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Update, Possession::Any)
    }

    pub fn delete_own(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Delete, Possession::Own)
    }

    pub fn delete_any(&self, resource: &str) -> Result<Permission> {
        self.resolve(Some(resource), Action::Delete, Possession::Any)
    }

    pub fn create(&self, resource: &str) -> Result<Permission> {
        self.create_any(resource)
    }

    pub fn read(&self, resource: &str) -> Result<Permission> {
        self.read_any(resource)
    }

    pub fn update(&self, resource: &str) -> Result<Permission> {
        self.update_any(resource)
    }

    pub fn delete(&self, resource: &str) -> Result<Permission> {
        self.delete_any(resource)
    }

    /// Resolve `action` / `possession` on the draft's resource
    pub fn execute(&self, action: Action, possession: Possession) -> Result<Permission> {
        self.resolve(None, action, possession)
    }

    fn resolve(&self, resource: Option<&str>, action: Action, possession: Possession) -> Result<Permission> {
        let mut query = self.draft.clone();
        if let Some(resource) = resource {
            query.resource = Some(resource.to_string());
        }
        query.action = Some(action.as_str().to_string());
        query.possession = Some(possession.as_str().to_string());
        Permission::resolve_with(self.store.grants(), &query, self.trace)
    }
}

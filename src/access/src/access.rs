//! Access builder: fluent grant / deny chains
//!
//! ```
//! use cretoai_access::AccessControl;
//!
//! let mut ac = AccessControl::new();
//! ac.grant("user")?
//!     .read_any("video")?
//!     .attributes(["title", "description"])
//!     .update_own("video")?
//!     .grant("admin")?
//!     .extend("user")?
//!     .delete_any("video")?
//!     .deny("guest")?
//!     .read_any("video")?;
//!
//! assert!(ac.can("admin").update_own("video")?.granted());
//! assert!(!ac.can("guest").read_any("video")?.granted());
//! # Ok::<(), cretoai_access::AccessError>(())
//! ```

use crate::error::{AccessError, Result};
use crate::store::GrantStore;
use crate::types::{validate_names, AccessInfo, Action, ActionKey, IntoNames, Possession};

/// Grant (or deny) chain bound to a grant store
///
/// Action methods commit the current draft and hand the same builder back with
/// its attributes cleared. [`grant`](Access::grant) and [`deny`](Access::deny)
/// hand back a fresh builder for another role on the same store.
#[derive(Debug)]
pub struct Access<'a> {
    store: &'a mut GrantStore,
    denied: bool,
    draft: AccessInfo,
}

impl<'a> Access<'a> {
    /// Builder for `roles`; roles that do not exist yet are created empty
    pub(crate) fn new(store: &'a mut GrantStore, roles: impl IntoNames, denied: bool) -> Result<Self> {
        let access = Self {
            store,
            denied,
            draft: AccessInfo::default(),
        };
        access.role(roles)
    }

    /// Builder seeded with a full record; a fulfilled record is committed at once
    pub(crate) fn from_info(store: &'a mut GrantStore, info: AccessInfo, denied: bool) -> Result<Self> {
        if info.is_empty() {
            return Err(AccessError::InvalidShape(
                "Invalid grant record: no role, resource or action given".to_string(),
            ));
        }
        store.ensure_unlocked()?;

        let mut draft = info;
        draft.denied = denied;
        if draft.is_fulfilled() {
            store.commit(&draft)?;
        }

        Ok(Self {
            store,
            denied,
            draft,
        })
    }

    /// Whether this chain denies rather than grants
    pub fn is_denied(&self) -> bool {
        self.denied
    }

    /// Current role(s) of the chain
    pub fn roles(&self) -> &[String] {
        &self.draft.role
    }

    /// Switch the chain to `roles`, creating them if needed
    pub fn role(mut self, roles: impl IntoNames) -> Result<Self> {
        let roles = roles.into_names();
        self.store.pre_create_roles(&roles)?;
        self.draft.role = roles;
        Ok(self)
    }

    /// Set the resource(s) the next action applies to
    pub fn resource(mut self, resources: impl IntoNames) -> Result<Self> {
        let resources = resources.into_names();
        validate_names("resource", &resources)?;
        self.draft.resource = resources;
        Ok(self)
    }

    /// Attributes for the next action only. Ignored when denying.
    pub fn attributes(mut self, attributes: impl IntoNames) -> Self {
        self.draft.attributes = Some(attributes.into_names());
        self
    }

    /// Make the current role(s) inherit the grants of `roles`
    pub fn extend(self, roles: impl IntoNames) -> Result<Self> {
        let extenders = roles.into_names();
        self.store.extend_role(&self.draft.role, &extenders, false)?;
        Ok(self)
    }

    pub fn inherit(self, roles: impl IntoNames) -> Result<Self> {
        self.extend(roles)
    }

    /// Lock the underlying store. The chain can no longer commit afterwards.
    pub fn lock(self) -> Result<Self> {
        self.store.lock()?;
        Ok(self)
    }

    /// Start a grant chain for other role(s) on the same store
    pub fn grant(self, roles: impl IntoNames) -> Result<Access<'a>> {
        Access::new(self.store, roles, false)
    }

    /// Start a deny chain for other role(s) on the same store
    pub fn deny(self, roles: impl IntoNames) -> Result<Access<'a>> {
        Access::new(self.store, roles, true)
    }

    pub fn create_own(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Create, Possession::Own)
    }

    pub fn create_any(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Create, Possession::Any)
    }

    pub fn read_own(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Read, Possession::Own)
    }

    pub fn read_any(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Read, Possession::Any)
    }

    pub fn update_own(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Update, Possession::Own)
    }

    pub fn update_any(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Update, Possession::Any)
    }

    pub fn delete_own(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Delete, Possession::Own)
    }

    pub fn delete_any(self, resource: impl IntoNames) -> Result<Self> {
        self.resource(resource)?.execute(Action::Delete, Possession::Any)
    }

    /// Same as [`create_any`](Access::create_any)
    pub fn create(self, resource: impl IntoNames) -> Result<Self> {
        self.create_any(resource)
    }

    /// Same as [`read_any`](Access::read_any)
    pub fn read(self, resource: impl IntoNames) -> Result<Self> {
        self.read_any(resource)
    }

    /// Same as [`update_any`](Access::update_any)
    pub fn update(self, resource: impl IntoNames) -> Result<Self> {
        self.update_any(resource)
    }

    /// Same as [`delete_any`](Access::delete_any)
    pub fn delete(self, resource: impl IntoNames) -> Result<Self> {
        self.delete_any(resource)
    }

    /// Commit the draft for `action` / `possession` on the draft's resource(s).
    ///
    /// Denials always commit an empty attribute list. The draft attributes are
    /// cleared afterwards, whether or not they were used.
    pub fn execute(mut self, action: Action, possession: Possession) -> Result<Self> {
        self.store.ensure_unlocked()?;

        self.draft.action = Some(action.as_str().to_string());
        self.draft.possession = Some(possession.as_str().to_string());
        self.draft.denied = self.denied;

        let access = self.draft.normalize()?;
        self.store
            .commit_with_key(&access, ActionKey::new(action, possession))?;

        self.draft.attributes = None;
        Ok(self)
    }
}

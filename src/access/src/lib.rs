//! # CretoAI Access Control
//!
//! Role and attribute based access control over an in-memory grants model.
//!
//! ## Features
//!
//! - **Fluent grant / deny chains** bound to a single owned grant store
//! - **Role inheritance** with cycle and self-extension rejection
//! - **Own / any possession** with `any` grants satisfying `own` queries
//! - **Attribute globs** (`*`, `a.b.*`, `!secret`) merged across roles
//! - **Data filtering** of JSON values by granted attributes
//! - **One-way lock** turning the model read-only
//!
//! ## Example
//!
//! ```rust
//! use cretoai_access::AccessControl;
//! use serde_json::json;
//!
//! let mut ac = AccessControl::new();
//! ac.grant("user")?
//!     .attributes(["*", "!password"])
//!     .read_own("profile")?
//!     .grant("admin")?
//!     .extend("user")?
//!     .read_any("profile")?
//!     .delete_any("profile")?;
//!
//! let permission = ac.can("user").read_own("profile")?;
//! assert!(permission.granted());
//! assert!(!ac.can("user").read_any("profile")?.granted());
//!
//! let profile = json!({ "id": 7, "name": "ada", "password": "secret" });
//! assert_eq!(permission.filter(&profile)?, json!({ "id": 7, "name": "ada" }));
//! # Ok::<(), cretoai_access::AccessError>(())
//! ```

pub mod access;
pub mod control;
pub mod error;
pub mod grants;
pub mod hierarchy;
pub mod notation;
pub mod permission;
pub mod query;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use access::Access;
pub use control::{AccessControl, AccessControlConfig};
pub use error::{AccessError, Result};
pub use grants::{Grants, GrantsInput, ResourceGrants, RoleGrants};
pub use hierarchy::RoleHierarchy;
pub use notation::{AttributeGlob, NotationError};
pub use permission::Permission;
pub use query::Query;
pub use store::GrantStore;
pub use types::{AccessInfo, Action, ActionKey, IntoNames, Possession, QueryInfo};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

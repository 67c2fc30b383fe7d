//! Glob attribute notation
//!
//! Attribute globs name the data fields a permission grants. This module
//! provides the two primitives the permission engine builds on:
//!
//! - [`union`] of two glob lists (used to merge the attributes of several roles)
//! - [`filter`] / [`filter_all`] of JSON data by a glob list
//!
//! # Examples
//!
//! ```
//! use cretoai_access::notation;
//! use serde_json::json;
//!
//! let merged = notation::union_strs(&["*", "!secret"], &["secret"]).unwrap();
//! assert_eq!(merged, vec!["*"]);
//!
//! let data = json!({ "id": 1, "password": "x" });
//! let filtered = notation::filter(&data, &["*", "!password"]).unwrap();
//! assert_eq!(filtered, json!({ "id": 1 }));
//! ```

mod filter;
mod glob;
mod set;

pub use filter::{filter, filter_all};
pub use glob::{AttributeGlob, NotationError, Specificity, WILDCARD};
pub use set::{governing, is_allowed, parse_all, union, union_strs};

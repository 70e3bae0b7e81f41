//! # Accessgate
//!
//! Role and attribute based access control for the Relay platform.
//!
//! ## Overview
//!
//! Grants map roles to resources, and resources to the attributes each
//! `action:possession` pair may touch:
//!
//! ```text
//! Grants
//!   └─ admin ($extend: [user])
//!   │    └─ video: { "delete:any": ["*"] }
//!   └─ user
//!        └─ video: { "read:any": ["*", "!views"], "update:own": ["title"] }
//! ```
//!
//! This crate handles:
//! - **Grants**: building, importing, exporting and removing grants
//! - **Inheritance**: role extension with cycle detection
//! - **Queries**: attribute union across inherited roles
//! - **Filtering**: redacting data to the granted attributes
//! - **Locking**: freezing grants after setup
//!
//! ## Usage
//!
//! ```rust
//! use accessgate::AccessControl;
//! use serde_json::json;
//!
//! let mut ac = AccessControl::new();
//! ac.grant("user")?
//!     .attributes(["*", "!views"])
//!     .read_any("video")?
//!     .attributes(["title"])
//!     .update_own("video")?;
//! ac.grant("admin")?.extend("user")?.delete_any("video")?;
//! ac.lock()?;
//!
//! let permission = ac.can("admin").read_any("video")?;
//! assert!(permission.granted());
//!
//! let video = json!({ "title": "Intro", "views": 1200 });
//! assert_eq!(permission.filter(&video), json!({ "title": "Intro" }));
//! # Ok::<(), accessgate::AccessControlError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `shared`: [`SharedAccessControl`], a thread-safe handle (enabled by default)

pub mod access;
pub mod actions;
pub mod config;
pub mod control;
pub mod error;
pub mod grants;
pub mod hierarchy;
pub mod import;
pub mod names;
pub mod permission;
pub mod query;
#[cfg(feature = "shared")]
pub mod shared;

// Re-export main types for convenience
pub use access::{Access, AccessInfo};
pub use actions::{Action, ActionPossession, Possession};
pub use config::AccessControlConfig;
pub use control::AccessControl;
pub use error::{AccessControlError, AccessControlResult};
pub use grants::{Grants, ResourceRecord, RoleRecord};
pub use names::{to_string_array, IntoNames};
pub use permission::Permission;
pub use query::{Query, QueryInfo};
#[cfg(feature = "shared")]
pub use shared::SharedAccessControl;

pub use accessgate_notation::{filter, filter_all};

//! # Accessgate Notation
//!
//! Attribute glob algebra and field filtering for the accessgate engine.
//!
//! ## Overview
//!
//! Permissions carry a list of attribute globs describing which fields of
//! a resource are visible:
//!
//! ```text
//! ["*", "!account.id", "!secret"]
//!   *            every field
//!   !account.id  except account.id
//!   !secret      and except secret (with everything below it)
//! ```
//!
//! This crate handles:
//! - **Globs**: parsing and matching dotted-path globs ([`Glob`])
//! - **Algebra**: union and difference of glob lists across roles
//! - **Filtering**: redacting JSON data down to the granted fields
//!
//! ## Usage
//!
//! ```rust
//! use accessgate_notation::{filter, union};
//! use serde_json::json;
//!
//! let granted = union(&["*", "!pwd", "title"], &["*", "!id", "!pwd"]);
//! assert_eq!(granted, vec!["*", "!pwd"]);
//!
//! let user = json!({ "id": 7, "name": "ada", "pwd": "hunter2" });
//! assert_eq!(filter(&user, &granted), json!({ "id": 7, "name": "ada" }));
//! ```

pub mod algebra;
pub mod filter;
pub mod glob;

pub use algebra::{difference, normalize, union, union_all};
pub use filter::{filter, filter_all};
pub use glob::Glob;

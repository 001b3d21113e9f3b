//! Record data model shared by the form components.
//!
//! Components never own canonical record state. They receive values from
//! the host, report edits through commit callbacks addressed by path, and
//! are refreshed by the host after it applies the change. This module
//! provides the pieces of that contract:
//!
//! - [`path`] - Paths addressing fields and repeating instances
//! - [`value`] - Value normalization rules for repeating fields
//! - [`tree`] - Host-side operations on the record tree

/// Paths addressing fields and repeating instances.
pub mod path;

/// Value normalization rules for repeating fields.
pub mod value;

/// Host-side operations on the record tree.
pub mod tree;

pub use path::{Path, PathSeg};
pub use tree::TreeError;
pub use value::normalize_repeating_value;

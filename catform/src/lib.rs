//! # catform
//!
//! A ratatui-based form input component library for record cataloging UIs.
//!
//! Catform renders editable record fields in the terminal: repeating
//! multi-value fields, controlled-vocabulary pickers, and the option
//! menus behind them. Components hold only interaction state; the host
//! owns the record as a [`serde_json::Value`] tree and hears about edits
//! through commit callbacks addressed by [`Path`].
//!
//! ## Features
//!
//! - Option [`Menu`] with wrap-around keyboard focus, mouse selection,
//!   and exact scroll-into-view tracking
//! - [`RepeatingInput`] repeating any [`FormInput`] template per value
//!   instance, with add, remove, and move-to-top controls
//! - [`DropdownMenuInput`] with case-insensitive prefix filtering
//! - [`VocabularyInput`] building its dropdown from a serde-loadable
//!   vocabulary mapping
//! - [`LineInput`] single-line editor with Enter/blur commit discipline
//! - Host-side value tree helpers in [`data::tree`] for applying
//!   committed edits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catform::{InstanceTemplate, Label, Path, RepeatingInput, Value};
//!
//! let mut titles = RepeatingInput::new(
//!     Path::from_key("titles"),
//!     InstanceTemplate::line().with_label(Label::new("Title")),
//! )
//! .with_value(&Value::Null);
//!
//! titles.set_on_commit(|path, value| {
//!     println!("commit {path} = {value}");
//! });
//! ```
//!
//! ## Modules
//!
//! - [`data`] - Value paths and the host-side record tree helpers
//! - [`ui`] - Form input components and their shared traits

/// Value paths and the host-side record tree helpers.
///
/// This module provides the addressing and mutation primitives the
/// components' commit callbacks are written against.
pub mod data;

/// Form input components and their shared traits.
pub mod ui;

pub use data::{normalize_repeating_value, Path, PathSeg, TreeError};
pub use ui::components::{
    DropdownMenuInput, InstanceProps, InstanceTemplate, LineInput, Menu, MenuOption, MenuStyle,
    NavDirection, RepeatingInput, VocabularyConfig, VocabularyInput,
};
pub use ui::{FormInput, Label};

/// Record values are plain serde_json values.
pub use serde_json::Value;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! The form input components.
//!
//! - [`menu`] - Option list with keyboard focus and scroll tracking
//! - [`line`] - Single-line text input
//! - [`dropdown`] - Closed input that opens a filtering option popup
//! - [`repeating`] - Wrapper repeating a template input per instance
//! - [`vocabulary`] - Dropdown preconfigured from a vocabulary set

/// Option list with keyboard focus and scroll tracking.
pub mod menu;

/// Single-line text input.
pub mod line;

/// Closed input that opens a filtering option popup.
pub mod dropdown;

/// Wrapper repeating a template input per instance.
pub mod repeating;

/// Dropdown preconfigured from a vocabulary set.
pub mod vocabulary;

pub use dropdown::{DropdownMenuInput, DropdownStyle};
pub use line::{LineInput, LineStyle};
pub use menu::{Menu, MenuOption, MenuStyle, NavDirection};
pub use repeating::{InstanceProps, InstanceTemplate, RepeatingInput, RepeatingStyle};
pub use vocabulary::{
    build_vocabulary_options, format_vocabulary_label, VocabularyConfig, VocabularyInput,
    VocabularyOptions, ROOT_VOCABULARY,
};

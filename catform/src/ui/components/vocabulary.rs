use std::collections::BTreeMap;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{buffer::Buffer, layout::Rect};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::path::Path;
use crate::ui::components::dropdown::DropdownMenuInput;
use crate::ui::components::menu::MenuOption;
use crate::ui::{CommitCallback, FormInput};

/// Name of the vocabulary that spans all others.
pub const ROOT_VOCABULARY: &str = "all";

/// One vocabulary entry, as hosts load it from TOML or JSON config.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// Display label; the vocabulary name is used when absent.
    pub label: Option<String>,
    /// Excluded from the picker entirely.
    pub disabled: bool,
    /// Primary sort key; unset sorts after every set value.
    pub sort_order: Option<f64>,
    /// Marks the initial pick when the host supplies no value.
    pub default_for_search: bool,
}

/// Options and initial value derived from a vocabulary mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabularyOptions {
    pub options: Vec<MenuOption>,
    pub default_value: Option<String>,
}

/// The configured label, else the vocabulary name.
pub fn format_vocabulary_label(name: &str, config: &VocabularyConfig) -> String {
    config
        .label
        .clone()
        .unwrap_or_else(|| name.to_string())
}

/// Build the picker option list from a vocabulary mapping.
///
/// The root vocabulary leads when present and enabled. The remaining
/// enabled vocabularies follow, ordered by `sort_order` (unset sorts
/// last) and then by case-insensitive label, indented one level under
/// the root. The default value is the first option whose config is
/// flagged `default_for_search`, else the first option.
pub fn build_vocabulary_options<F>(
    vocabularies: &BTreeMap<String, VocabularyConfig>,
    root: &str,
    format_label: F,
) -> VocabularyOptions
where
    F: Fn(&str, &VocabularyConfig) -> String,
{
    let mut named: Vec<(&str, &VocabularyConfig, String)> = vocabularies
        .iter()
        .filter(|(name, config)| name.as_str() != root && !config.disabled)
        .map(|(name, config)| (name.as_str(), config, format_label(name, config)))
        .collect();
    named.sort_by(|a, b| {
        let order_a = a.1.sort_order.unwrap_or(f64::INFINITY);
        let order_b = b.1.sort_order.unwrap_or(f64::INFINITY);
        order_a
            .total_cmp(&order_b)
            .then_with(|| a.2.to_lowercase().cmp(&b.2.to_lowercase()))
    });

    let mut options = Vec::new();
    if let Some(config) = vocabularies.get(root) {
        if !config.disabled {
            options.push(MenuOption::new(root, format_label(root, config)));
        }
    }
    options.extend(
        named
            .into_iter()
            .map(|(name, _, label)| MenuOption::new(name, label).with_indent(1)),
    );

    let default_value = options
        .iter()
        .find(|option| {
            vocabularies
                .get(&option.value)
                .is_some_and(|config| config.default_for_search)
        })
        .or(options.first())
        .map(|option| option.value.clone());

    VocabularyOptions {
        options,
        default_value,
    }
}

/// Vocabulary picker: a filtering dropdown over a vocabulary mapping.
///
/// A mapping that yields no options renders nothing and consumes no
/// events. The picker never offers a blank choice; a search always
/// targets some vocabulary.
pub struct VocabularyInput {
    dropdown: DropdownMenuInput,
    empty: bool,
}

impl VocabularyInput {
    pub fn new(path: Path, vocabularies: &BTreeMap<String, VocabularyConfig>) -> Self {
        Self::with_formatter(path, vocabularies, format_vocabulary_label)
    }

    /// Build with a custom label formatter, e.g. for localization.
    pub fn with_formatter<F>(
        path: Path,
        vocabularies: &BTreeMap<String, VocabularyConfig>,
        format_label: F,
    ) -> Self
    where
        F: Fn(&str, &VocabularyConfig) -> String,
    {
        let built = build_vocabulary_options(vocabularies, ROOT_VOCABULARY, format_label);
        let empty = built.options.is_empty();
        let dropdown = DropdownMenuInput::new(path, built.options)
            .with_blankable(false)
            .with_value(built.default_value);
        VocabularyInput { dropdown, empty }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        if value.is_some() {
            self.dropdown.set_value(value);
        }
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.dropdown = self.dropdown.with_read_only(read_only);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn value(&self) -> Option<&str> {
        self.dropdown.value()
    }

    pub fn is_open(&self) -> bool {
        self.dropdown.is_open()
    }

    /// Adopt the host-supplied value.
    pub fn set_value(&mut self, value: Option<String>) {
        self.dropdown.set_value(value);
    }

    pub fn set_on_commit<F: Fn(&Path, &Value) + 'static>(&mut self, callback: F) {
        self.dropdown.set_on_commit(callback);
    }

    /// Install an already shared commit callback.
    pub fn set_commit_callback(&mut self, callback: CommitCallback) {
        self.dropdown.set_commit_callback(callback);
    }

    /// Draw the open popup over the already drawn frame.
    pub fn render_popup(&mut self, frame: Rect, buf: &mut Buffer) {
        if self.empty {
            return;
        }
        self.dropdown.render_popup(frame, buf);
    }
}

impl FormInput for VocabularyInput {
    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if self.empty {
            return;
        }
        self.dropdown.render(area, buf);
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.empty {
            return false;
        }
        self.dropdown.handle_key(key)
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, area: Rect) -> bool {
        if self.empty {
            return false;
        }
        self.dropdown.handle_mouse(mouse, area)
    }

    fn set_focused(&mut self, focused: bool) {
        self.dropdown.set_focused(focused);
    }

    fn is_focused(&self) -> bool {
        self.dropdown.is_focused()
    }
}

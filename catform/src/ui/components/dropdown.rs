use std::cell::RefCell;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, trace};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Clear, Widget},
};
use serde_json::Value;

use crate::data::path::Path;
use crate::ui::components::menu::{Menu, MenuOption, MenuStyle, SelectCallback};
use crate::ui::{CommitCallback, FormInput};

/// Styling for the closed row of a dropdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropdownStyle {
    pub closed: Style,
    /// Patched over `closed` when the input is read only.
    pub read_only: Style,
    /// Patched over `closed` while the input has focus.
    pub focused: Style,
}

impl Default for DropdownStyle {
    fn default() -> Self {
        DropdownStyle {
            closed: Style::new(),
            read_only: Style::new().add_modifier(Modifier::DIM),
            focused: Style::new().add_modifier(Modifier::BOLD),
        }
    }
}

/// Closed input that opens an option menu in a popup.
///
/// While open, typed characters narrow the options to those whose label
/// starts with the typed prefix, compared case-insensitively. The filter
/// is transient: closing the popup always resets it. Selecting an option
/// commits its value and closes the popup.
pub struct DropdownMenuInput {
    path: Path,
    options: Vec<MenuOption>,
    menu: Menu,
    /// Filled by the menu's selection callback, drained after every
    /// event routed into the menu.
    selection: Rc<RefCell<Option<MenuOption>>>,
    value: Option<String>,
    open: bool,
    filter: String,
    /// Offer a blank option that commits an empty value.
    blankable: bool,
    read_only: bool,
    has_focus: bool,
    max_popup_rows: u16,
    style: DropdownStyle,
    closed_rect: Rect,
    popup_rect: Rect,
    on_commit: Option<CommitCallback>,
    on_select: Option<SelectCallback>,
}

impl DropdownMenuInput {
    pub fn new(path: Path, options: Vec<MenuOption>) -> Self {
        let selection: Rc<RefCell<Option<MenuOption>>> = Rc::new(RefCell::new(None));
        let cell = Rc::clone(&selection);
        let mut menu = Menu::new();
        menu.set_on_select(move |option| {
            *cell.borrow_mut() = Some(option.clone());
        });

        DropdownMenuInput {
            path,
            options,
            menu,
            selection,
            value: None,
            open: false,
            filter: String::new(),
            blankable: true,
            read_only: false,
            has_focus: false,
            max_popup_rows: 8,
            style: DropdownStyle::default(),
            closed_rect: Rect::default(),
            popup_rect: Rect::default(),
            on_commit: None,
            on_select: None,
        }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn with_blankable(mut self, blankable: bool) -> Self {
        self.blankable = blankable;
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_max_popup_rows(mut self, rows: u16) -> Self {
        self.max_popup_rows = rows;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Item focus inside the open popup, if any.
    pub fn menu_focused_index(&self) -> Option<usize> {
        self.menu.focused_index()
    }

    /// Options currently visible in the popup.
    pub fn visible_options(&self) -> &[MenuOption] {
        self.menu.options()
    }

    pub fn set_style(&mut self, style: DropdownStyle) {
        self.style = style;
    }

    pub fn set_menu_style(&mut self, style: MenuStyle) {
        self.menu.set_style(style);
    }

    /// Adopt the host-supplied value.
    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
        if self.open {
            self.menu.set_value(self.value.clone());
        }
    }

    pub fn set_options(&mut self, options: Vec<MenuOption>) {
        self.options = options;
        if self.open {
            self.rebuild_menu();
        }
    }

    pub fn set_on_commit<F: Fn(&Path, &Value) + 'static>(&mut self, callback: F) {
        self.on_commit = Some(Rc::new(callback));
    }

    /// Install an already shared commit callback.
    pub fn set_commit_callback(&mut self, callback: CommitCallback) {
        self.on_commit = Some(callback);
    }

    pub fn set_on_select<F: Fn(&MenuOption) + 'static>(&mut self, callback: F) {
        self.on_select = Some(Rc::new(callback));
    }

    fn open(&mut self) {
        if self.read_only || self.open {
            return;
        }
        self.open = true;
        self.filter.clear();
        self.rebuild_menu();
        trace!("dropdown: open at {}", self.path);
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.filter.clear();
        self.menu.handle_focus_lost();
        self.popup_rect = Rect::default();
        trace!("dropdown: close at {}", self.path);
    }

    fn rebuild_menu(&mut self) {
        let needle = self.filter.to_lowercase();
        let mut filtered = Vec::new();
        if self.blankable && needle.is_empty() {
            filtered.push(MenuOption::new("", ""));
        }
        filtered.extend(
            self.options
                .iter()
                .filter(|option| {
                    needle.is_empty() || option.label.to_lowercase().starts_with(&needle)
                })
                .cloned(),
        );
        self.menu.set_options(filtered);
        self.menu.set_value(self.value.clone());
    }

    fn push_filter(&mut self, c: char) {
        self.filter.push(c);
        self.rebuild_menu();
    }

    fn pop_filter(&mut self) {
        if self.filter.pop().is_some() {
            self.rebuild_menu();
        }
    }

    /// Adopt a selection made inside the menu, if one happened.
    fn take_selection(&mut self) {
        let taken = self.selection.borrow_mut().take();
        if let Some(option) = taken {
            self.value = Some(option.value.clone());
            self.close();
            debug!("dropdown: committed `{}` at {}", option.value, self.path);
            if let Some(on_commit) = &self.on_commit {
                on_commit(&self.path, &Value::String(option.value.clone()));
            }
            if let Some(on_select) = &self.on_select {
                on_select(&option);
            }
        }
    }

    fn display_text(&self) -> String {
        if self.open && !self.filter.is_empty() {
            return self.filter.clone();
        }
        match &self.value {
            Some(value) => self
                .options
                .iter()
                .find(|option| &option.value == value)
                .map(|option| option.label.clone())
                .unwrap_or_else(|| value.clone()),
            None => String::new(),
        }
    }

    /// Draw the open popup over the already drawn frame.
    ///
    /// Call after everything else has rendered, so the option list lands
    /// on top. The popup opens below the closed row and is clipped to
    /// `frame`.
    pub fn render_popup(&mut self, frame: Rect, buf: &mut Buffer) {
        self.popup_rect = Rect::default();
        if !self.open {
            return;
        }
        let rows = self.menu.len().min(self.max_popup_rows as usize) as u16;
        if rows == 0 {
            return;
        }
        let y = self.closed_rect.y.saturating_add(1);
        let frame_bottom = frame.y.saturating_add(frame.height);
        if y >= frame_bottom {
            return;
        }
        let height = rows.min(frame_bottom - y);
        let popup = Rect::new(self.closed_rect.x, y, self.closed_rect.width, height);

        Clear.render(popup, buf);
        self.menu.render(popup, buf);
        self.popup_rect = popup;
    }
}

impl FormInput for DropdownMenuInput {
    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        self.closed_rect = Rect::new(area.x, area.y, area.width, 1);

        let mut style = self.style.closed;
        if self.read_only {
            style = style.patch(self.style.read_only);
        }
        if self.has_focus {
            style = style.patch(self.style.focused);
        }
        buf.set_style(self.closed_rect, style);

        let indicator = if self.open { '\u{25b4}' } else { '\u{25be}' };
        if area.width >= 2 {
            buf.set_stringn(
                area.x,
                area.y,
                self.display_text(),
                (area.width - 2) as usize,
                style,
            );
            buf.set_string(area.x + area.width - 1, area.y, indicator.to_string(), style);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            || key.modifiers.contains(KeyModifiers::ALT)
        {
            return false;
        }
        if !self.open {
            return match key.code {
                KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') => {
                    if self.read_only {
                        false
                    } else {
                        self.open();
                        true
                    }
                }
                KeyCode::Char(c) => {
                    if self.read_only {
                        false
                    } else {
                        self.open();
                        self.push_filter(c);
                        true
                    }
                }
                _ => false,
            };
        }
        match key.code {
            KeyCode::Esc => {
                self.close();
                true
            }
            KeyCode::Down if self.menu.focused_index().is_none() => {
                self.menu.handle_focus_gained();
                true
            }
            KeyCode::Down | KeyCode::Up => {
                self.menu.handle_key(key);
                true
            }
            KeyCode::Enter => {
                if self.menu.focused_index().is_some() {
                    self.menu.handle_key(key);
                    self.take_selection();
                } else if !self.filter.is_empty() && self.menu.len() == 1 {
                    self.menu.select_item(0);
                    self.take_selection();
                } else {
                    self.close();
                }
                true
            }
            KeyCode::Backspace => {
                self.pop_filter();
                true
            }
            KeyCode::Char(c) => {
                self.push_filter(c);
                true
            }
            _ => false,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, _area: Rect) -> bool {
        if self.open && rect_contains(self.popup_rect, mouse.column, mouse.row) {
            let consumed = self.menu.handle_mouse(mouse, self.popup_rect);
            self.take_selection();
            return consumed;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if rect_contains(self.closed_rect, mouse.column, mouse.row) {
                    self.has_focus = true;
                    if self.open {
                        self.close();
                    } else {
                        self.open();
                    }
                    true
                } else {
                    if self.open {
                        self.close();
                    }
                    false
                }
            }
            _ => false,
        }
    }

    fn set_focused(&mut self, focused: bool) {
        if focused == self.has_focus {
            return;
        }
        self.has_focus = focused;
        if !focused {
            self.close();
        }
    }

    fn is_focused(&self) -> bool {
        self.has_focus
    }
}

fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

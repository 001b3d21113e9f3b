use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, trace};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};

/// Callback invoked with the selected option after a selection.
pub type SelectCallback = Rc<dyn Fn(&MenuOption)>;

/// Hook consulted before arrow navigation moves item focus.
///
/// Receives the current focus, the proposed focus and the direction, and
/// returns the focus to apply. Returning `None` leaves no item focused,
/// which lets a wrapper pull keyboard focus back out of the menu.
pub type FocusInterceptor = Rc<dyn Fn(Option<usize>, usize, NavDirection) -> Option<usize>>;

/// Hook rendering an item label into display text.
pub type ItemLabelRenderer = Rc<dyn Fn(&str) -> String>;

/// Direction of an arrow-key focus move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavDirection {
    Up,
    Down,
}

/// One selectable entry of a menu.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuOption {
    /// Value committed when the option is selected.
    pub value: String,
    /// Display label.
    pub label: String,
    /// Indent level, for options grouped under a parent entry.
    pub indent: u8,
    /// Whether the option starts a new visual group.
    pub start_group: bool,
}

impl MenuOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        MenuOption {
            value: value.into(),
            label: label.into(),
            indent: 0,
            start_group: false,
        }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_start_group(mut self) -> Self {
        self.start_group = true;
        self
    }
}

/// Styling applied to menu rows.
///
/// Row styles are patched together: every row starts from `item`, then
/// group, selection and focus styles layer on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuStyle {
    pub item: Style,
    pub selected: Style,
    pub focused: Style,
    pub start_group: Style,
    /// Columns per indent level.
    pub indent_width: u16,
}

impl Default for MenuStyle {
    fn default() -> Self {
        MenuStyle {
            item: Style::new(),
            selected: Style::new().add_modifier(Modifier::BOLD),
            focused: Style::new().add_modifier(Modifier::REVERSED),
            start_group: Style::new().add_modifier(Modifier::UNDERLINED),
            indent_width: 2,
        }
    }
}

/// Substitute a space for a blank label so the option still reads as a
/// row.
fn default_item_label(label: &str) -> String {
    if label.is_empty() {
        " ".to_string()
    } else {
        label.to_string()
    }
}

/// Scrolling option list with a focused item.
///
/// The menu renders one option per row inside whatever area it is given,
/// keeping the focused item scrolled into view. Selection state mirrors
/// the host-supplied value; the menu only reports selections through its
/// callback and waits for the host to feed the value back.
pub struct Menu {
    options: Vec<MenuOption>,
    value: Option<String>,
    /// Index of the option matching the current value, or an explicit
    /// focus target supplied ahead of focus gain.
    selected_index: Option<usize>,
    focused_index: Option<usize>,
    /// First visible row.
    top: usize,
    /// Height of the last rendered area, in rows.
    viewport_rows: usize,
    /// Re-check focused item visibility against the next render geometry.
    scroll_pending: bool,
    has_focus: bool,
    /// A mouse press started on an item and has not been released yet.
    /// Focus changes made while set do not scroll, so a click on an item
    /// of an unfocused menu does not flash an intermediate scroll state.
    item_mouse_down: bool,
    style: MenuStyle,
    render_item_label: Option<ItemLabelRenderer>,
    on_select: Option<SelectCallback>,
    on_before_item_focus_change: Option<FocusInterceptor>,
}

impl Default for Menu {
    fn default() -> Self {
        Menu::new()
    }
}

impl Menu {
    pub fn new() -> Self {
        Menu {
            options: Vec::new(),
            value: None,
            selected_index: None,
            focused_index: None,
            top: 0,
            viewport_rows: 0,
            scroll_pending: false,
            has_focus: false,
            item_mouse_down: false,
            style: MenuStyle::default(),
            render_item_label: None,
            on_select: None,
            on_before_item_focus_change: None,
        }
    }

    pub fn with_options(options: Vec<MenuOption>) -> Self {
        let mut menu = Menu::new();
        menu.set_options(options);
        menu
    }

    /// Replace the option list.
    ///
    /// Focus pointing past the new list is dropped; the selected index is
    /// recomputed from the current value.
    pub fn set_options(&mut self, options: Vec<MenuOption>) {
        self.options = options;
        if self
            .focused_index
            .is_some_and(|index| index >= self.options.len())
        {
            self.focused_index = None;
        }
        self.sync_selected_index();
    }

    pub fn options(&self) -> &[MenuOption] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Adopt the host-supplied value.
    pub fn set_value(&mut self, value: Option<String>) {
        self.value = value;
        self.sync_selected_index();
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    /// First visible row of the option list.
    pub fn scroll_top(&self) -> usize {
        self.top
    }

    pub fn set_style(&mut self, style: MenuStyle) {
        self.style = style;
    }

    pub fn set_on_select<F: Fn(&MenuOption) + 'static>(&mut self, callback: F) {
        self.on_select = Some(Rc::new(callback));
    }

    pub fn set_on_before_item_focus_change<F>(&mut self, hook: F)
    where
        F: Fn(Option<usize>, usize, NavDirection) -> Option<usize> + 'static,
    {
        self.on_before_item_focus_change = Some(Rc::new(hook));
    }

    pub fn set_render_item_label<F: Fn(&str) -> String + 'static>(&mut self, renderer: F) {
        self.render_item_label = Some(Rc::new(renderer));
    }

    fn sync_selected_index(&mut self) {
        self.selected_index = self
            .value
            .as_ref()
            .and_then(|value| self.options.iter().position(|o| &o.value == value));
    }

    /// Take keyboard focus, optionally targeting an item.
    ///
    /// A negative index counts back from the end of the list. Without an
    /// index, focus lands on the selected item.
    pub fn focus(&mut self, item_index: Option<isize>) {
        if let Some(index) = item_index {
            let len = self.options.len() as isize;
            let resolved = if index >= 0 { index } else { len + index };
            self.selected_index = usize::try_from(resolved)
                .ok()
                .filter(|i| *i < self.options.len());
        }
        self.handle_focus_gained();
    }

    /// Focus arrived: focus the selected item, or the first one.
    pub fn handle_focus_gained(&mut self) {
        self.has_focus = true;
        if self.options.is_empty() {
            return;
        }
        self.set_focused_index(Some(self.selected_index.unwrap_or(0)));
    }

    /// Focus left: no item stays focused.
    pub fn handle_focus_lost(&mut self) {
        self.has_focus = false;
        self.set_focused_index(None);
    }

    pub fn has_focus(&self) -> bool {
        self.has_focus
    }

    /// Handle a key event. Returns `true` when consumed.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.options.is_empty() {
            return false;
        }
        match key.code {
            KeyCode::Down => {
                self.move_focus(NavDirection::Down);
                true
            }
            KeyCode::Up => {
                self.move_focus(NavDirection::Up);
                true
            }
            KeyCode::Enter => {
                if let Some(index) = self.focused_index {
                    self.select_item(index);
                }
                true
            }
            _ => false,
        }
    }

    fn move_focus(&mut self, direction: NavDirection) {
        let len = self.options.len();
        let current = self.focused_index;
        let base = current.unwrap_or(0);

        let proposed = match direction {
            NavDirection::Down => (base + 1) % len,
            NavDirection::Up => (base + len - 1) % len,
        };

        let next = match &self.on_before_item_focus_change {
            Some(hook) => hook(current, proposed, direction),
            None => Some(proposed),
        };

        self.set_focused_index(next);
    }

    /// Handle a mouse event against the last rendered area.
    ///
    /// A press on an item acquires focus; the release selects it.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, area: Rect) -> bool {
        let hit = self.hit_item(mouse.column, mouse.row, area);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if hit.is_some() {
                    self.item_mouse_down = true;
                    if !self.has_focus {
                        self.handle_focus_gained();
                    }
                    true
                } else {
                    false
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let was_down = self.item_mouse_down;
                self.item_mouse_down = false;
                if let Some(index) = hit {
                    self.select_item(index);
                    true
                } else {
                    was_down
                }
            }
            _ => false,
        }
    }

    /// The option index under a screen position, if any.
    fn hit_item(&self, column: u16, row: u16, area: Rect) -> Option<usize> {
        if column < area.x || column >= area.x.saturating_add(area.width) {
            return None;
        }
        if row < area.y || row >= area.y.saturating_add(area.height) {
            return None;
        }
        let index = self.top + (row - area.y) as usize;
        (index < self.options.len()).then_some(index)
    }

    /// Select the option at `index`: adopt its value, focus it, and
    /// report it to the host.
    ///
    /// The index must address an existing option.
    pub fn select_item(&mut self, index: usize) {
        let option = self.options[index].clone();
        debug!("menu: selected `{}` at {index}", option.value);

        self.value = Some(option.value.clone());
        self.selected_index = Some(index);
        self.set_focused_index(Some(index));

        if let Some(on_select) = &self.on_select {
            on_select(&option);
        }
    }

    fn set_focused_index(&mut self, index: Option<usize>) {
        if index == self.focused_index {
            return;
        }
        trace!("menu: focus {:?} -> {:?}", self.focused_index, index);
        self.focused_index = index;
        if !self.item_mouse_down {
            self.scroll_focused_into_view();
            self.scroll_pending = true;
        }
    }

    /// Scroll just far enough to bring the focused item into view.
    fn scroll_focused_into_view(&mut self) {
        let Some(focused) = self.focused_index else {
            return;
        };
        let rows = self.viewport_rows;
        if rows == 0 {
            return;
        }
        if focused >= self.top + rows {
            // Scroll the bottom of the item into view.
            self.top += focused - (self.top + rows - 1);
        } else if focused < self.top {
            // Scroll the top of the item into view.
            self.top = focused;
        }
    }

    /// Draw the option list. An empty menu draws nothing at all.
    pub fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.viewport_rows = area.height as usize;
        if self.options.is_empty() || area.width == 0 || area.height == 0 {
            return;
        }

        let max_top = self.options.len().saturating_sub(self.viewport_rows);
        if self.top > max_top {
            self.top = max_top;
        }
        if self.scroll_pending {
            self.scroll_focused_into_view();
            self.scroll_pending = false;
        }

        for (row, index) in (self.top..self.options.len())
            .take(self.viewport_rows)
            .enumerate()
        {
            let option = &self.options[index];

            let mut style = self.style.item;
            if option.start_group {
                style = style.patch(self.style.start_group);
            }
            if self.value.as_deref() == Some(option.value.as_str()) {
                style = style.patch(self.style.selected);
            }
            if self.focused_index == Some(index) {
                style = style.patch(self.style.focused);
            }

            let y = area.y + row as u16;
            buf.set_style(Rect::new(area.x, y, area.width, 1), style);

            let indent = u16::from(option.indent) * self.style.indent_width;
            if indent < area.width {
                let label = match &self.render_item_label {
                    Some(renderer) => renderer(&option.label),
                    None => default_item_label(&option.label),
                };
                buf.set_stringn(
                    area.x + indent,
                    y,
                    &label,
                    (area.width - indent) as usize,
                    style,
                );
            }
        }
    }
}

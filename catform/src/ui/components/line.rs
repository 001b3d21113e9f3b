use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use log::debug;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};
use serde_json::Value;

use crate::data::{path::Path, value::scalar_text};
use crate::ui::{CommitCallback, FormInput};

/// Styling for a line input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub text: Style,
    /// Patched over `text` when the input stands alone rather than
    /// inside a repeating row.
    pub standalone: Style,
    /// Patched over `text` when the input is read only.
    pub read_only: Style,
    /// Patched over the cell under the cursor while focused.
    pub cursor: Style,
}

impl Default for LineStyle {
    fn default() -> Self {
        LineStyle {
            text: Style::new(),
            standalone: Style::new().add_modifier(Modifier::UNDERLINED),
            read_only: Style::new().add_modifier(Modifier::DIM),
            cursor: Style::new().add_modifier(Modifier::REVERSED),
        }
    }
}

/// Single-line text input.
///
/// Edits stay local until committed: pressing Enter or losing focus with
/// a changed value reports the text to the host through the commit
/// callback, addressed by the input's path. Standalone inputs render
/// underlined; embedded ones leave the framing to the surrounding row.
pub struct LineInput {
    path: Path,
    value: String,
    /// Text as of the last commit or host resync.
    committed: String,
    /// Cursor position in characters.
    cursor: usize,
    /// First visible character.
    scroll: usize,
    read_only: bool,
    /// Inside a repeating row, which supplies the framing.
    embedded: bool,
    has_focus: bool,
    style: LineStyle,
    on_commit: Option<CommitCallback>,
}

impl LineInput {
    pub fn new(path: Path) -> Self {
        LineInput {
            path,
            value: String::new(),
            committed: String::new(),
            cursor: 0,
            scroll: 0,
            read_only: false,
            embedded: false,
            has_focus: false,
            style: LineStyle::default(),
            on_commit: None,
        }
    }

    pub fn with_value(mut self, value: &Value) -> Self {
        self.set_value(value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn with_embedded(mut self, embedded: bool) -> Self {
        self.embedded = embedded;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn set_style(&mut self, style: LineStyle) {
        self.style = style;
    }

    /// Adopt the host-supplied value, discarding any uncommitted edit.
    pub fn set_value(&mut self, value: &Value) {
        self.value = scalar_text(value);
        self.committed = self.value.clone();
        let len = self.char_len();
        self.cursor = self.cursor.min(len);
        self.scroll = self.scroll.min(self.cursor);
    }

    pub fn set_on_commit<F: Fn(&Path, &Value) + 'static>(&mut self, callback: F) {
        self.on_commit = Some(std::rc::Rc::new(callback));
    }

    /// Install an already shared commit callback.
    pub fn set_commit_callback(&mut self, callback: CommitCallback) {
        self.on_commit = Some(callback);
    }

    /// Report the current text to the host if it changed since the last
    /// commit or resync.
    pub fn commit(&mut self) {
        if self.value == self.committed {
            return;
        }
        self.committed = self.value.clone();
        debug!("input: commit `{}` at {}", self.value, self.path);
        if let Some(on_commit) = &self.on_commit {
            on_commit(&self.path, &Value::String(self.value.clone()));
        }
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(byte, _)| byte)
            .unwrap_or(self.value.len())
    }
}

impl FormInput for LineInput {
    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let width = area.width as usize;
        let len = self.char_len();
        self.cursor = self.cursor.min(len);
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor + 1 > self.scroll + width {
            self.scroll = self.cursor + 1 - width;
        }

        let mut style = self.style.text;
        if !self.embedded {
            style = style.patch(self.style.standalone);
        }
        if self.read_only {
            style = style.patch(self.style.read_only);
        }
        buf.set_style(Rect::new(area.x, area.y, area.width, 1), style);

        let visible: String = self.value.chars().skip(self.scroll).take(width).collect();
        buf.set_stringn(area.x, area.y, &visible, width, style);

        if self.has_focus && !self.read_only {
            let x = area.x + (self.cursor - self.scroll) as u16;
            if x < area.x + area.width {
                buf.set_style(Rect::new(x, area.y, 1, 1), style.patch(self.style.cursor));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            || key.modifiers.contains(KeyModifiers::ALT)
        {
            return false;
        }
        match key.code {
            KeyCode::Char(c) => {
                if self.read_only {
                    return false;
                }
                let byte = self.byte_index(self.cursor);
                self.value.insert(byte, c);
                self.cursor += 1;
                true
            }
            KeyCode::Backspace => {
                if self.read_only {
                    return false;
                }
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let byte = self.byte_index(self.cursor);
                    self.value.remove(byte);
                }
                true
            }
            KeyCode::Delete => {
                if self.read_only {
                    return false;
                }
                if self.cursor < self.char_len() {
                    let byte = self.byte_index(self.cursor);
                    self.value.remove(byte);
                }
                true
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
                true
            }
            KeyCode::Right => {
                self.cursor = (self.cursor + 1).min(self.char_len());
                true
            }
            KeyCode::Home => {
                self.cursor = 0;
                true
            }
            KeyCode::End => {
                self.cursor = self.char_len();
                true
            }
            KeyCode::Enter => {
                self.commit();
                true
            }
            _ => false,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, area: Rect) -> bool {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return false;
        }
        if mouse.row != area.y || mouse.column < area.x {
            return false;
        }
        if mouse.column >= area.x.saturating_add(area.width) {
            return false;
        }
        self.has_focus = true;
        let offset = (mouse.column - area.x) as usize;
        self.cursor = (self.scroll + offset).min(self.char_len());
        true
    }

    fn set_focused(&mut self, focused: bool) {
        if focused == self.has_focus {
            return;
        }
        self.has_focus = focused;
        if focused {
            self.cursor = self.char_len();
        } else {
            self.commit();
        }
    }

    fn is_focused(&self) -> bool {
        self.has_focus
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(input: &mut LineInput, text: &str) {
        for c in text.chars() {
            input.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn recording_input(path: &str) -> (LineInput, Rc<RefCell<Vec<(String, Value)>>>) {
        let commits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&commits);
        let mut input = LineInput::new(Path::from_key(path));
        input.set_on_commit(move |path, value| {
            sink.borrow_mut().push((path.to_string(), value.clone()));
        });
        (input, commits)
    }

    #[test]
    fn test_typing_inserts_at_cursor() {
        let mut input = LineInput::new(Path::root());
        type_text(&mut input, "ab");
        input.handle_key(key(KeyCode::Left));
        type_text(&mut input, "c");
        assert_eq!(input.value(), "acb");
    }

    #[test]
    fn test_multibyte_text_edits_by_character() {
        let mut input = LineInput::new(Path::root());
        type_text(&mut input, "éx");
        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Delete));
        assert_eq!(input.value(), "x");
    }

    #[test]
    fn test_backspace_removes_before_cursor() {
        let mut input = LineInput::new(Path::root());
        type_text(&mut input, "abc");
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "ab");
        input.handle_key(key(KeyCode::Home));
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn test_commit_on_enter_only_when_changed() {
        let (mut input, commits) = recording_input("titles.0");
        type_text(&mut input, "Chair");
        assert!(commits.borrow().is_empty());

        input.handle_key(key(KeyCode::Enter));
        assert_eq!(
            commits.borrow().as_slice(),
            &[("titles.0".to_string(), json!("Chair"))]
        );

        input.handle_key(key(KeyCode::Enter));
        assert_eq!(commits.borrow().len(), 1);
    }

    #[test]
    fn test_commit_on_blur_with_change() {
        let (mut input, commits) = recording_input("name");
        input.set_focused(true);
        type_text(&mut input, "Ash");
        input.set_focused(false);
        assert_eq!(
            commits.borrow().as_slice(),
            &[("name".to_string(), json!("Ash"))]
        );
    }

    #[test]
    fn test_no_commit_on_blur_when_clean() {
        let (mut input, commits) = recording_input("name");
        input.set_value(&json!("Ash"));
        input.set_focused(true);
        input.set_focused(false);
        assert!(commits.borrow().is_empty());
    }

    #[test]
    fn test_resync_discards_uncommitted_edit() {
        let (mut input, commits) = recording_input("name");
        type_text(&mut input, "draft");
        input.set_value(&json!("saved"));
        assert_eq!(input.value(), "saved");
        input.set_focused(true);
        input.set_focused(false);
        assert!(commits.borrow().is_empty());
    }

    #[test]
    fn test_read_only_ignores_edits() {
        let mut input = LineInput::new(Path::root()).with_read_only(true);
        input.set_value(&json!("fixed"));
        assert!(!input.handle_key(key(KeyCode::Char('x'))));
        assert!(!input.handle_key(key(KeyCode::Backspace)));
        assert_eq!(input.value(), "fixed");
    }

    #[test]
    fn test_null_value_shows_empty_text() {
        let mut input = LineInput::new(Path::root());
        input.set_value(&Value::Null);
        assert_eq!(input.value(), "");
    }

    #[test]
    fn test_render_scrolls_to_keep_cursor_visible() {
        let mut input = LineInput::new(Path::root());
        input.set_value(&json!("abcdefghij"));
        input.set_focused(true);

        let area = Rect::new(0, 0, 5, 1);
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf);

        let text: String = (0..5).map(|x| buf.cell((x, 0)).unwrap().symbol()).collect();
        assert_eq!(text, "ghij ");
        let cursor_style = buf.cell((4, 0)).unwrap().style();
        assert!(cursor_style.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_standalone_underlined_embedded_plain() {
        let area = Rect::new(0, 0, 8, 1);

        let mut standalone = LineInput::new(Path::root()).with_value(&json!("a"));
        let mut buf = Buffer::empty(area);
        standalone.render(area, &mut buf);
        let style = buf.cell((0, 0)).unwrap().style();
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));

        let mut embedded = LineInput::new(Path::root())
            .with_value(&json!("a"))
            .with_embedded(true);
        let mut buf = Buffer::empty(area);
        embedded.render(area, &mut buf);
        let style = buf.cell((0, 0)).unwrap().style();
        assert!(!style.add_modifier.contains(Modifier::UNDERLINED));
    }

    #[test]
    fn test_mouse_click_positions_cursor() {
        let mut input = LineInput::new(Path::root());
        input.set_value(&json!("hello"));
        let area = Rect::new(0, 0, 10, 1);
        let mut buf = Buffer::empty(area);
        input.render(area, &mut buf);

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 3,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert!(input.handle_mouse(click, area));
        input.handle_key(key(KeyCode::Char('X')));
        assert_eq!(input.value(), "helXlo");

        let past_end = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 9,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        input.handle_mouse(past_end, area);
        input.handle_key(key(KeyCode::Char('!')));
        assert_eq!(input.value(), "helXlo!");
    }

    #[test]
    fn test_navigation_keys_not_consumed() {
        let mut input = LineInput::new(Path::root());
        assert!(!input.handle_key(key(KeyCode::Up)));
        assert!(!input.handle_key(key(KeyCode::Down)));
        assert!(!input.handle_key(key(KeyCode::Tab)));
    }
}

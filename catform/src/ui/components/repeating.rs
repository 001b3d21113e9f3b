use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use log::{debug, trace};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
};
use serde_json::Value;

use crate::data::{path::Path, value::normalize_repeating_value};
use crate::ui::{
    AddInstanceCallback, CommitCallback, FormInput, Label, MoveInstanceCallback,
    RemoveInstanceCallback,
};
use crate::ui::components::line::LineInput;

/// Width of the order indicator column.
const ORDER_W: u16 = 5;
/// Width of the remove button column.
const REMOVE_W: u16 = 3;

/// Props handed to a template when an instance is built.
///
/// The path addresses the instance within the record; the name is its
/// stringified position. Both are valid only until the next value resync.
pub struct InstanceProps {
    pub path: Path,
    pub name: String,
    pub value: Value,
    pub read_only: bool,
    pub embedded: bool,
    pub on_commit: Option<CommitCallback>,
}

/// Factory building one instance input from its props.
pub type InstanceBuilder = Rc<dyn Fn(InstanceProps) -> Box<dyn FormInput>>;

/// Template describing the input repeated for every instance.
#[derive(Clone)]
pub struct InstanceTemplate {
    label: Option<Label>,
    builder: InstanceBuilder,
}

impl InstanceTemplate {
    pub fn new<F>(builder: F) -> Self
    where
        F: Fn(InstanceProps) -> Box<dyn FormInput> + 'static,
    {
        InstanceTemplate {
            label: None,
            builder: Rc::new(builder),
        }
    }

    /// Template producing a plain line input per instance.
    pub fn line() -> Self {
        InstanceTemplate::new(|props| {
            let mut input = LineInput::new(props.path)
                .with_value(&props.value)
                .with_read_only(props.read_only)
                .with_embedded(props.embedded);
            if let Some(on_commit) = props.on_commit {
                input.set_commit_callback(on_commit);
            }
            Box::new(input)
        })
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.label = Some(label);
        self
    }

    pub fn label(&self) -> Option<&Label> {
        self.label.as_ref()
    }

    pub fn build(&self, props: InstanceProps) -> Box<dyn FormInput> {
        (self.builder)(props)
    }
}

/// Which part of an instance row holds the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowColumn {
    MoveToTop,
    #[default]
    Input,
    Remove,
}

/// Cursor position inside a repeating field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatCursor {
    Instance { row: usize, column: RowColumn },
    AddButton,
}

/// Styling for the chrome around instances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RepeatingStyle {
    pub header: Style,
    pub control: Style,
    pub control_disabled: Style,
    pub control_focused: Style,
    pub order_read_only: Style,
}

impl Default for RepeatingStyle {
    fn default() -> Self {
        RepeatingStyle {
            header: Style::new().add_modifier(Modifier::BOLD),
            control: Style::new(),
            control_disabled: Style::new().add_modifier(Modifier::DIM),
            control_focused: Style::new().add_modifier(Modifier::REVERSED),
            order_read_only: Style::new().add_modifier(Modifier::DIM),
        }
    }
}

/// Screen areas of one rendered instance row.
#[derive(Debug, Clone, Copy, Default)]
struct RowRects {
    order: Rect,
    input: Rect,
    remove: Rect,
}

/// Field repeating a template input over every instance of its value.
///
/// The field never edits the value itself. Structural requests (add,
/// remove, reorder) and instance commits go to the host by path; the host
/// applies them to the record and resyncs the value, which rebuilds the
/// instance inputs.
pub struct RepeatingInput {
    path: Path,
    template: InstanceTemplate,
    value: Value,
    instances: Vec<Box<dyn FormInput>>,
    /// The value is a single empty placeholder instance.
    single_empty: bool,
    read_only: bool,
    reorderable: bool,
    has_focus: bool,
    cursor: RepeatCursor,
    pressed: Option<RepeatCursor>,
    style: RepeatingStyle,
    layout: Vec<RowRects>,
    add_rect: Rect,
    on_commit: Option<CommitCallback>,
    on_add_instance: Option<AddInstanceCallback>,
    on_remove_instance: Option<RemoveInstanceCallback>,
    on_move_instance: Option<MoveInstanceCallback>,
}

impl RepeatingInput {
    pub fn new(path: Path, template: InstanceTemplate) -> Self {
        let mut field = RepeatingInput {
            path,
            template,
            value: Value::Null,
            instances: Vec::new(),
            single_empty: true,
            read_only: false,
            reorderable: true,
            has_focus: false,
            cursor: RepeatCursor::Instance {
                row: 0,
                column: RowColumn::Input,
            },
            pressed: None,
            style: RepeatingStyle::default(),
            layout: Vec::new(),
            add_rect: Rect::default(),
            on_commit: None,
            on_add_instance: None,
            on_remove_instance: None,
            on_move_instance: None,
        };
        field.rebuild_instances();
        field
    }

    pub fn with_value(mut self, value: &Value) -> Self {
        self.set_value(value.clone());
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.set_read_only(read_only);
        self
    }

    pub fn with_reorderable(mut self, reorderable: bool) -> Self {
        self.reorderable = reorderable;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    pub fn is_reorderable(&self) -> bool {
        self.reorderable
    }

    pub fn cursor(&self) -> RepeatCursor {
        self.cursor
    }

    pub fn set_style(&mut self, style: RepeatingStyle) {
        self.style = style;
    }

    /// Adopt the host-supplied value and rebuild the instance inputs.
    pub fn set_value(&mut self, value: Value) {
        self.value = value;
        self.rebuild_instances();
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
        self.rebuild_instances();
    }

    pub fn set_on_commit<F: Fn(&Path, &Value) + 'static>(&mut self, callback: F) {
        self.on_commit = Some(Rc::new(callback));
        self.rebuild_instances();
    }

    pub fn set_on_add_instance<F: Fn(&Path) + 'static>(&mut self, callback: F) {
        self.on_add_instance = Some(Rc::new(callback));
    }

    pub fn set_on_remove_instance<F: Fn(&Path) + 'static>(&mut self, callback: F) {
        self.on_remove_instance = Some(Rc::new(callback));
    }

    pub fn set_on_move_instance<F: Fn(&Path, usize) + 'static>(&mut self, callback: F) {
        self.on_move_instance = Some(Rc::new(callback));
    }

    /// Ask the host to append a new instance.
    pub fn add(&mut self) {
        if self.read_only {
            trace!("repeating: add ignored, read only");
            return;
        }
        debug!("repeating: add at {}", self.path);
        if let Some(on_add) = &self.on_add_instance {
            on_add(&self.path);
        }
    }

    /// Ask the host to remove the instance at `index`.
    ///
    /// Ignored while the field holds a single instance, so a repeating
    /// field can never be emptied from the screen.
    pub fn remove(&mut self, index: usize) {
        if !self.can_remove() || index >= self.instances.len() {
            trace!("repeating: remove {index} ignored");
            return;
        }
        let instance_path = self.path.child_index(index);
        debug!("repeating: remove {instance_path}");
        if let Some(on_remove) = &self.on_remove_instance {
            on_remove(&instance_path);
        }
    }

    /// Ask the host to move the instance at `index` to the top.
    ///
    /// Ignored for the first instance and for non-reorderable fields.
    pub fn move_to_top(&mut self, index: usize) {
        if !self.can_move_to_top(index) || index >= self.instances.len() {
            trace!("repeating: move {index} ignored");
            return;
        }
        let instance_path = self.path.child_index(index);
        debug!("repeating: move {instance_path} to top");
        if let Some(on_move) = &self.on_move_instance {
            on_move(&instance_path, 0);
        }
    }

    fn can_remove(&self) -> bool {
        !self.read_only && self.instances.len() >= 2
    }

    fn can_move_to_top(&self, index: usize) -> bool {
        !self.read_only && self.reorderable && index > 0
    }

    fn rebuild_instances(&mut self) {
        let elements = normalize_repeating_value(&self.value);
        self.single_empty = elements.len() == 1 && elements[0].is_null();

        let template = self.template.clone();
        let instances = elements
            .iter()
            .enumerate()
            .map(|(index, element)| {
                template.build(InstanceProps {
                    path: self.path.child_index(index),
                    name: index.to_string(),
                    value: element.clone(),
                    read_only: self.read_only,
                    embedded: true,
                    on_commit: self.on_commit.clone(),
                })
            })
            .collect();
        self.instances = instances;
        self.clamp_cursor();
        self.apply_instance_focus();
    }

    fn clamp_cursor(&mut self) {
        let last = self.instances.len().saturating_sub(1);
        match self.cursor {
            RepeatCursor::Instance { row, column } => {
                let column = if self.read_only {
                    RowColumn::Input
                } else {
                    column
                };
                self.cursor = RepeatCursor::Instance {
                    row: row.min(last),
                    column,
                };
            }
            RepeatCursor::AddButton => {
                if self.read_only {
                    self.cursor = RepeatCursor::Instance {
                        row: last,
                        column: RowColumn::Input,
                    };
                }
            }
        }
    }

    /// Move the cursor, shifting instance focus along with it.
    fn focus_cell(&mut self, cell: RepeatCursor) {
        if cell == self.cursor {
            return;
        }
        if let RepeatCursor::Instance {
            row,
            column: RowColumn::Input,
        } = self.cursor
        {
            if let Some(instance) = self.instances.get_mut(row) {
                instance.set_focused(false);
            }
        }
        self.cursor = cell;
        self.apply_instance_focus();
    }

    fn apply_instance_focus(&mut self) {
        if !self.has_focus {
            return;
        }
        if let RepeatCursor::Instance {
            row,
            column: RowColumn::Input,
        } = self.cursor
        {
            if let Some(instance) = self.instances.get_mut(row) {
                instance.set_focused(true);
            }
        }
    }

    fn cursor_down(&mut self) -> bool {
        match self.cursor {
            RepeatCursor::Instance { row, column } => {
                if row + 1 < self.instances.len() {
                    self.focus_cell(RepeatCursor::Instance {
                        row: row + 1,
                        column,
                    });
                    true
                } else if !self.read_only {
                    self.focus_cell(RepeatCursor::AddButton);
                    true
                } else {
                    false
                }
            }
            RepeatCursor::AddButton => false,
        }
    }

    fn cursor_up(&mut self) -> bool {
        match self.cursor {
            RepeatCursor::Instance { row, column } => {
                if row > 0 {
                    self.focus_cell(RepeatCursor::Instance {
                        row: row - 1,
                        column,
                    });
                    true
                } else {
                    false
                }
            }
            RepeatCursor::AddButton => {
                self.focus_cell(RepeatCursor::Instance {
                    row: self.instances.len().saturating_sub(1),
                    column: RowColumn::Input,
                });
                true
            }
        }
    }

    fn cursor_side(&mut self, left: bool) -> bool {
        let RepeatCursor::Instance { row, column } = self.cursor else {
            return false;
        };
        if self.read_only {
            return false;
        }
        let next = match (column, left) {
            (RowColumn::Input, true) => Some(RowColumn::MoveToTop),
            (RowColumn::Remove, true) => Some(RowColumn::Input),
            (RowColumn::MoveToTop, false) => Some(RowColumn::Input),
            (RowColumn::Input, false) => Some(RowColumn::Remove),
            _ => None,
        };
        match next {
            Some(column) => {
                self.focus_cell(RepeatCursor::Instance { row, column });
                true
            }
            None => false,
        }
    }

    /// Advance to the next interactive cell, row-major. Returns `false`
    /// past the last cell so the host can move focus onward.
    fn cursor_next(&mut self) -> bool {
        if self.read_only {
            let RepeatCursor::Instance { row, .. } = self.cursor else {
                return false;
            };
            if row + 1 < self.instances.len() {
                self.focus_cell(RepeatCursor::Instance {
                    row: row + 1,
                    column: RowColumn::Input,
                });
                return true;
            }
            return false;
        }
        let next = match self.cursor {
            RepeatCursor::Instance { row, column } => match column {
                RowColumn::MoveToTop => Some(RepeatCursor::Instance {
                    row,
                    column: RowColumn::Input,
                }),
                RowColumn::Input => Some(RepeatCursor::Instance {
                    row,
                    column: RowColumn::Remove,
                }),
                RowColumn::Remove => {
                    if row + 1 < self.instances.len() {
                        Some(RepeatCursor::Instance {
                            row: row + 1,
                            column: RowColumn::MoveToTop,
                        })
                    } else {
                        Some(RepeatCursor::AddButton)
                    }
                }
            },
            RepeatCursor::AddButton => None,
        };
        match next {
            Some(cell) => {
                self.focus_cell(cell);
                true
            }
            None => false,
        }
    }

    fn cursor_prev(&mut self) -> bool {
        if self.read_only {
            let RepeatCursor::Instance { row, .. } = self.cursor else {
                return false;
            };
            if row > 0 {
                self.focus_cell(RepeatCursor::Instance {
                    row: row - 1,
                    column: RowColumn::Input,
                });
                return true;
            }
            return false;
        }
        let prev = match self.cursor {
            RepeatCursor::Instance { row, column } => match column {
                RowColumn::Remove => Some(RepeatCursor::Instance {
                    row,
                    column: RowColumn::Input,
                }),
                RowColumn::Input => Some(RepeatCursor::Instance {
                    row,
                    column: RowColumn::MoveToTop,
                }),
                RowColumn::MoveToTop => {
                    if row > 0 {
                        Some(RepeatCursor::Instance {
                            row: row - 1,
                            column: RowColumn::Remove,
                        })
                    } else {
                        None
                    }
                }
            },
            RepeatCursor::AddButton => Some(RepeatCursor::Instance {
                row: self.instances.len().saturating_sub(1),
                column: RowColumn::Remove,
            }),
        };
        match prev {
            Some(cell) => {
                self.focus_cell(cell);
                true
            }
            None => false,
        }
    }

    /// Trigger the control under the cursor, honoring its enablement.
    fn activate(&mut self) -> bool {
        match self.cursor {
            RepeatCursor::Instance {
                row,
                column: RowColumn::MoveToTop,
            } => {
                self.move_to_top(row);
                true
            }
            RepeatCursor::Instance {
                row,
                column: RowColumn::Remove,
            } => {
                self.remove(row);
                true
            }
            RepeatCursor::Instance { .. } => false,
            RepeatCursor::AddButton => {
                self.add();
                true
            }
        }
    }

    /// The cell under a screen position, from the last rendered layout.
    fn hit_cell(&self, column: u16, row: u16) -> Option<RepeatCursor> {
        if rect_contains(self.add_rect, column, row) {
            return Some(RepeatCursor::AddButton);
        }
        for (index, rects) in self.layout.iter().enumerate() {
            if rect_contains(rects.order, column, row) {
                return Some(RepeatCursor::Instance {
                    row: index,
                    column: RowColumn::MoveToTop,
                });
            }
            if rect_contains(rects.input, column, row) {
                return Some(RepeatCursor::Instance {
                    row: index,
                    column: RowColumn::Input,
                });
            }
            if rect_contains(rects.remove, column, row) {
                return Some(RepeatCursor::Instance {
                    row: index,
                    column: RowColumn::Remove,
                });
            }
        }
        None
    }
}

fn rect_contains(rect: Rect, column: u16, row: u16) -> bool {
    column >= rect.x
        && column < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}

impl FormInput for RepeatingInput {
    fn render(&mut self, area: Rect, buf: &mut Buffer) {
        self.layout.clear();
        self.add_rect = Rect::default();
        if area.width == 0 || area.height == 0 {
            return;
        }

        let bottom = area.y + area.height;
        let mut y = area.y;

        if let Some(label) = self.template.label() {
            if y < bottom {
                let x = if label.embedded {
                    area.x + ORDER_W + 1
                } else {
                    area.x
                };
                if x < area.x + area.width {
                    buf.set_stringn(
                        x,
                        y,
                        &label.text,
                        (area.x + area.width - x) as usize,
                        self.style.header,
                    );
                }
                y += 1;
            }
        }

        let remove_cols = if self.read_only { 0 } else { REMOVE_W + 1 };
        let input_w = area.width.saturating_sub(ORDER_W + 1 + remove_cols);
        let count = self.instances.len();

        for row in 0..count {
            if y >= bottom {
                break;
            }
            let height = self.instances[row].preferred_height().min(bottom - y);

            let order = Rect::new(area.x, y, ORDER_W.min(area.width), 1);
            self.render_order_cell(row, order, buf);

            let input = Rect::new(area.x + ORDER_W + 1, y, input_w, height);
            self.instances[row].render(input, buf);

            let mut remove = Rect::default();
            if !self.read_only && area.width >= ORDER_W + 1 + remove_cols {
                remove = Rect::new(area.x + area.width - REMOVE_W, y, REMOVE_W, 1);
                let style = self.cell_style(
                    RepeatCursor::Instance {
                        row,
                        column: RowColumn::Remove,
                    },
                    self.can_remove(),
                );
                buf.set_string(remove.x, remove.y, "[-]", style);
            }

            self.layout.push(RowRects {
                order,
                input,
                remove,
            });
            y += height;
        }

        if !self.read_only && y < bottom {
            let style = self.cell_style(RepeatCursor::AddButton, true);
            buf.set_stringn(area.x, y, "[+]", area.width as usize, style);
            self.add_rect = Rect::new(area.x, y, REMOVE_W.min(area.width), 1);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let RepeatCursor::Instance {
            row,
            column: RowColumn::Input,
        } = self.cursor
        {
            if let Some(instance) = self.instances.get_mut(row) {
                if instance.handle_key(key) {
                    return true;
                }
            }
        }
        match key.code {
            KeyCode::Down => self.cursor_down(),
            KeyCode::Up => self.cursor_up(),
            KeyCode::Left => self.cursor_side(true),
            KeyCode::Right => self.cursor_side(false),
            KeyCode::Tab => self.cursor_next(),
            KeyCode::BackTab => self.cursor_prev(),
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(),
            _ => false,
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, _area: Rect) -> bool {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let Some(cell) = self.hit_cell(mouse.column, mouse.row) else {
                    return false;
                };
                self.has_focus = true;
                self.pressed = Some(cell);
                self.focus_cell(cell);
                if let RepeatCursor::Instance {
                    row,
                    column: RowColumn::Input,
                } = cell
                {
                    let rect = self.layout[row].input;
                    if let Some(instance) = self.instances.get_mut(row) {
                        instance.handle_mouse(mouse, rect);
                    }
                }
                true
            }
            MouseEventKind::Up(MouseButton::Left) => {
                let pressed = self.pressed.take();
                let Some(cell) = self.hit_cell(mouse.column, mouse.row) else {
                    return pressed.is_some();
                };
                if pressed == Some(cell) {
                    match cell {
                        RepeatCursor::Instance {
                            column: RowColumn::Input,
                            ..
                        } => {}
                        _ => {
                            self.activate();
                        }
                    }
                    true
                } else {
                    pressed.is_some()
                }
            }
            _ => false,
        }
    }

    fn set_focused(&mut self, focused: bool) {
        if focused == self.has_focus {
            return;
        }
        if !focused {
            if let RepeatCursor::Instance {
                row,
                column: RowColumn::Input,
            } = self.cursor
            {
                if let Some(instance) = self.instances.get_mut(row) {
                    instance.set_focused(false);
                }
            }
        }
        self.has_focus = focused;
        self.apply_instance_focus();
    }

    fn is_focused(&self) -> bool {
        self.has_focus
    }

    fn preferred_height(&self) -> u16 {
        let instances: u16 = self
            .instances
            .iter()
            .map(|instance| instance.preferred_height())
            .sum();
        let header = u16::from(self.template.label().is_some());
        let footer = u16::from(!self.read_only);
        header + instances + footer
    }
}

impl RepeatingInput {
    fn cell_style(&self, cell: RepeatCursor, enabled: bool) -> Style {
        let mut style = self.style.control;
        if !enabled {
            style = style.patch(self.style.control_disabled);
        }
        if self.has_focus && self.cursor == cell {
            style = style.patch(self.style.control_focused);
        }
        style
    }

    fn render_order_cell(&self, row: usize, rect: Rect, buf: &mut Buffer) {
        if self.read_only && self.single_empty {
            return;
        }
        let number = row + 1;
        if self.read_only {
            buf.set_stringn(
                rect.x,
                rect.y,
                format!(" {number:>2}  "),
                rect.width as usize,
                self.style.order_read_only,
            );
            return;
        }
        let enabled = self.can_move_to_top(row);
        let text = if enabled {
            format!("[{number:>2}\u{2191}]")
        } else {
            format!("[{number:>2} ]")
        };
        let style = self.cell_style(
            RepeatCursor::Instance {
                row,
                column: RowColumn::MoveToTop,
            },
            enabled,
        );
        buf.set_stringn(rect.x, rect.y, text, rect.width as usize, style);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use crossterm::event::KeyModifiers;
    use serde_json::json;

    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn render_into(field: &mut RepeatingInput, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        field.render(area, &mut buf);
        buf
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, y)).unwrap().symbol())
            .collect()
    }

    /// Template recording the props of every instance it builds.
    fn probe_template(
        seen: Rc<RefCell<Vec<(String, String, Value)>>>,
    ) -> InstanceTemplate {
        InstanceTemplate::new(move |props| {
            seen.borrow_mut()
                .push((props.path.to_string(), props.name.clone(), props.value.clone()));
            Box::new(LineInput::new(props.path).with_value(&props.value))
        })
    }

    fn titles_field(value: Value) -> RepeatingInput {
        RepeatingInput::new(Path::from_key("titles"), InstanceTemplate::line())
            .with_value(&value)
    }

    #[test]
    fn test_null_value_renders_single_placeholder() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let field = RepeatingInput::new(Path::from_key("titles"), probe_template(Rc::clone(&seen)))
            .with_value(&Value::Null);
        assert_eq!(field.instance_count(), 1);
        let built = seen.borrow();
        let last = built.last().unwrap();
        assert_eq!(last, &("titles.0".to_string(), "0".to_string(), Value::Null));
    }

    #[test]
    fn test_empty_list_renders_single_placeholder() {
        let field = titles_field(json!([]));
        assert_eq!(field.instance_count(), 1);
    }

    #[test]
    fn test_scalar_value_renders_one_instance() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let field = RepeatingInput::new(Path::from_key("titles"), probe_template(Rc::clone(&seen)))
            .with_value(&json!("Chair"));
        assert_eq!(field.instance_count(), 1);
        assert_eq!(
            seen.borrow().last().unwrap(),
            &("titles.0".to_string(), "0".to_string(), json!("Chair"))
        );
    }

    #[test]
    fn test_list_instances_addressed_by_index() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let field = RepeatingInput::new(Path::from_key("titles"), probe_template(Rc::clone(&seen)))
            .with_value(&json!(["a", "b", "c"]));
        assert_eq!(field.instance_count(), 3);

        let built = seen.borrow();
        let last_three = &built[built.len() - 3..];
        assert_eq!(
            last_three,
            &[
                ("titles.0".to_string(), "0".to_string(), json!("a")),
                ("titles.1".to_string(), "1".to_string(), json!("b")),
                ("titles.2".to_string(), "2".to_string(), json!("c")),
            ]
        );
    }

    #[test]
    fn test_remove_disabled_with_single_instance() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let mut field = titles_field(json!(["only"]));
        field.set_on_remove_instance(move |path| sink.borrow_mut().push(path.to_string()));

        field.remove(0);
        assert!(removed.borrow().is_empty());
    }

    #[test]
    fn test_remove_reports_instance_path() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_remove_instance(move |path| sink.borrow_mut().push(path.to_string()));

        field.remove(1);
        assert_eq!(removed.borrow().as_slice(), &["titles.1".to_string()]);
    }

    #[test]
    fn test_move_to_top_ignored_for_first_instance() {
        let moved = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&moved);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_move_instance(move |path, to| {
            sink.borrow_mut().push((path.to_string(), to));
        });

        field.move_to_top(0);
        assert!(moved.borrow().is_empty());

        field.move_to_top(1);
        assert_eq!(
            moved.borrow().as_slice(),
            &[("titles.1".to_string(), 0usize)]
        );
    }

    #[test]
    fn test_move_to_top_ignored_when_not_reorderable() {
        let moved = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&moved);
        let mut field = titles_field(json!(["a", "b"])).with_reorderable(false);
        field.set_on_move_instance(move |path, to| {
            sink.borrow_mut().push((path.to_string(), to));
        });

        field.move_to_top(1);
        assert!(moved.borrow().is_empty());
    }

    #[test]
    fn test_add_reports_field_path() {
        let added = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&added);
        let mut field = titles_field(json!(["a"]));
        field.set_on_add_instance(move |path| sink.borrow_mut().push(path.to_string()));

        field.add();
        assert_eq!(added.borrow().as_slice(), &["titles".to_string()]);
    }

    #[test]
    fn test_read_only_blocks_structural_edits() {
        let hits = Rc::new(RefCell::new(0));
        let mut field = titles_field(json!(["a", "b"])).with_read_only(true);
        let sink = Rc::clone(&hits);
        field.set_on_add_instance(move |_| *sink.borrow_mut() += 1);
        let sink = Rc::clone(&hits);
        field.set_on_remove_instance(move |_| *sink.borrow_mut() += 1);
        let sink = Rc::clone(&hits);
        field.set_on_move_instance(move |_, _| *sink.borrow_mut() += 1);

        field.add();
        field.remove(1);
        field.move_to_top(1);
        assert_eq!(*hits.borrow(), 0);
    }

    #[test]
    fn test_instance_commit_forwarded_with_instance_path() {
        let commits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&commits);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_commit(move |path, value| {
            sink.borrow_mut().push((path.to_string(), value.clone()));
        });

        field.set_focused(true);
        field.handle_key(key(KeyCode::Char('x')));
        field.handle_key(key(KeyCode::Enter));

        assert_eq!(
            commits.borrow().as_slice(),
            &[("titles.0".to_string(), json!("ax"))]
        );
    }

    #[test]
    fn test_arrows_traverse_rows_and_footer() {
        let mut field = titles_field(json!(["a", "b"]));
        field.set_focused(true);
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 0,
                column: RowColumn::Input
            }
        );

        assert!(field.handle_key(key(KeyCode::Down)));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 1,
                column: RowColumn::Input
            }
        );

        assert!(field.handle_key(key(KeyCode::Down)));
        assert_eq!(field.cursor(), RepeatCursor::AddButton);
        assert!(!field.handle_key(key(KeyCode::Down)));

        assert!(field.handle_key(key(KeyCode::Up)));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 1,
                column: RowColumn::Input
            }
        );
    }

    #[test]
    fn test_tab_cycles_cells_then_leaves() {
        let mut field = titles_field(json!(["a", "b"]));
        field.set_focused(true);

        assert!(field.handle_key(key(KeyCode::Tab)));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 0,
                column: RowColumn::Remove
            }
        );
        assert!(field.handle_key(key(KeyCode::Tab)));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 1,
                column: RowColumn::MoveToTop
            }
        );
        assert!(field.handle_key(key(KeyCode::Tab)));
        assert!(field.handle_key(key(KeyCode::Tab)));
        assert!(field.handle_key(key(KeyCode::Tab)));
        assert_eq!(field.cursor(), RepeatCursor::AddButton);
        assert!(!field.handle_key(key(KeyCode::Tab)));
    }

    #[test]
    fn test_keyboard_remove_respects_enablement() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_remove_instance(move |path| sink.borrow_mut().push(path.to_string()));

        field.set_focused(true);
        field.handle_key(key(KeyCode::Tab));
        assert!(field.handle_key(key(KeyCode::Enter)));
        assert_eq!(removed.borrow().as_slice(), &["titles.0".to_string()]);
    }

    #[test]
    fn test_keyboard_move_to_top_on_first_row_is_noop() {
        let moved = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&moved);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_move_instance(move |_, _| *sink.borrow_mut() += 1);

        field.set_focused(true);
        field.handle_key(key(KeyCode::BackTab));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 0,
                column: RowColumn::MoveToTop
            }
        );
        assert!(field.handle_key(key(KeyCode::Enter)));
        assert_eq!(*moved.borrow(), 0);
    }

    #[test]
    fn test_render_rows_and_controls() {
        let mut field = RepeatingInput::new(
            Path::from_key("titles"),
            InstanceTemplate::line().with_label(Label::new("Titles")),
        )
        .with_value(&json!(["Chair", "Seat"]));

        let buf = render_into(&mut field, 30, 4);
        assert_eq!(row_text(&buf, 0), "Titles                        ");
        assert_eq!(row_text(&buf, 1), "[ 1 ] Chair                [-]");
        assert_eq!(row_text(&buf, 2), "[ 2\u{2191}] Seat                 [-]");
        assert_eq!(row_text(&buf, 3), "[+]                           ");
    }

    #[test]
    fn test_render_embedded_label_as_column_header() {
        let mut field = RepeatingInput::new(
            Path::from_key("titles"),
            InstanceTemplate::line().with_label(Label::embedded("Title")),
        )
        .with_value(&json!(["a"]));

        let buf = render_into(&mut field, 20, 3);
        assert_eq!(row_text(&buf, 0), "      Title         ");
    }

    #[test]
    fn test_render_read_only_hides_controls() {
        let mut field = titles_field(json!(["a", "b"])).with_read_only(true);
        let buf = render_into(&mut field, 20, 3);
        assert_eq!(row_text(&buf, 0), "  1   a             ");
        assert_eq!(row_text(&buf, 1), "  2   b             ");
        assert_eq!(row_text(&buf, 2), "                    ");
    }

    #[test]
    fn test_read_only_single_placeholder_hides_order_number() {
        let mut field = titles_field(Value::Null).with_read_only(true);
        let buf = render_into(&mut field, 20, 2);
        assert_eq!(row_text(&buf, 0), "                    ");
    }

    #[test]
    fn test_mouse_click_activates_add_button() {
        let added = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&added);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_add_instance(move |_| *sink.borrow_mut() += 1);

        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        field.render(area, &mut buf);

        field.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 1, 2), area);
        field.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 1, 2), area);
        assert_eq!(*added.borrow(), 1);
    }

    #[test]
    fn test_mouse_click_activates_remove_button() {
        let removed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&removed);
        let mut field = titles_field(json!(["a", "b"]));
        field.set_on_remove_instance(move |path| sink.borrow_mut().push(path.to_string()));

        let area = Rect::new(0, 0, 30, 4);
        let mut buf = Buffer::empty(area);
        field.render(area, &mut buf);

        field.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 28, 1), area);
        field.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 28, 1), area);
        assert_eq!(removed.borrow().as_slice(), &["titles.1".to_string()]);
    }

    #[test]
    fn test_preferred_height_counts_chrome() {
        let with_label = RepeatingInput::new(
            Path::from_key("titles"),
            InstanceTemplate::line().with_label(Label::new("Titles")),
        )
        .with_value(&json!(["a", "b"]));
        assert_eq!(with_label.preferred_height(), 4);

        let read_only = titles_field(json!(["a", "b"])).with_read_only(true);
        assert_eq!(read_only.preferred_height(), 2);
    }

    #[test]
    fn test_cursor_clamps_after_value_shrinks() {
        let mut field = titles_field(json!(["a", "b", "c"]));
        field.set_focused(true);
        field.handle_key(key(KeyCode::Down));
        field.handle_key(key(KeyCode::Down));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 2,
                column: RowColumn::Input
            }
        );

        field.set_value(json!(["a"]));
        assert_eq!(
            field.cursor(),
            RepeatCursor::Instance {
                row: 0,
                column: RowColumn::Input
            }
        );
    }
}

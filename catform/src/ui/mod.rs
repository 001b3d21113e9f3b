//! Form input components and their shared seams.
//!
//! Every component follows the same contract: the host owns record state,
//! the component holds only transient interaction state (focus, scroll,
//! uncommitted edits) and reports changes through callbacks. Event
//! handlers return `true` when the event was consumed, so hosts can layer
//! their own bindings behind the components.
//!
//! - [`components`] - The input components themselves

/// The input components themselves.
pub mod components;

use std::rc::Rc;

use crossterm::event::{KeyEvent, MouseEvent};
use ratatui::{buffer::Buffer, layout::Rect};
use serde_json::Value;

use crate::data::path::Path;

/// Callback invoked when an input reports a new value for a path.
pub type CommitCallback = Rc<dyn Fn(&Path, &Value)>;

/// Callback invoked when a repeating field asks to append an instance.
pub type AddInstanceCallback = Rc<dyn Fn(&Path)>;

/// Callback invoked when a repeating field asks to remove an instance.
pub type RemoveInstanceCallback = Rc<dyn Fn(&Path)>;

/// Callback invoked when a repeating field asks to move an instance.
///
/// Receives the instance path and the target position in its list.
pub type MoveInstanceCallback = Rc<dyn Fn(&Path, usize)>;

/// Field caption shown by composite components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Caption text.
    pub text: String,
    /// Render as a column header inside the field body instead of a
    /// standalone heading above it.
    pub embedded: bool,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Label {
            text: text.into(),
            embedded: false,
        }
    }

    pub fn embedded(text: impl Into<String>) -> Self {
        Label {
            text: text.into(),
            embedded: true,
        }
    }
}

/// Common surface of a form input.
///
/// Implementations draw into the caller-supplied area each frame and keep
/// whatever geometry they need for mouse hit testing. Key events are
/// delivered only to the focused input; mouse events carry the area the
/// input was last rendered into.
pub trait FormInput {
    /// Draw the input into `area`.
    fn render(&mut self, area: Rect, buf: &mut Buffer);

    /// Handle a key event. Returns `true` when consumed.
    fn handle_key(&mut self, key: KeyEvent) -> bool;

    /// Handle a mouse event against the last rendered area.
    fn handle_mouse(&mut self, mouse: MouseEvent, area: Rect) -> bool {
        let _ = (mouse, area);
        false
    }

    /// Give or take keyboard focus.
    fn set_focused(&mut self, focused: bool) {
        let _ = focused;
    }

    fn is_focused(&self) -> bool {
        false
    }

    /// Rows the input wants when the host lays out a form.
    fn preferred_height(&self) -> u16 {
        1
    }
}

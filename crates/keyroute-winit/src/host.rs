use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use keyroute_core::{CursorShape, InputHost};
use winit::dpi::PhysicalPosition;
use winit::window::{CursorGrabMode, CursorIcon, Window};

use crate::keymap::cursor_icon;

/// What the application's UI layer reports to the dispatcher. The default
/// methods describe a window with no widgets at all.
pub trait UiProbe {
    fn is_ui_item_at(&self, _x: i32, _y: i32) -> bool {
        false
    }

    fn has_keyboard_focus(&self) -> bool {
        false
    }

    fn clear_focus(&mut self) {}
}

pub struct NoUi;

impl UiProbe for NoUi {}

/// Global cursor position, written by [`crate::WinitInput`] and read by
/// [`WinitHost`]. winit cannot query the pointer position, so it is tracked
/// from `CursorMoved`.
pub type SharedCursor = Rc<Cell<(i32, i32)>>;

pub struct WinitHost {
    window: Arc<Window>,
    cursor: SharedCursor,
    ui: Box<dyn UiProbe>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>, cursor: SharedCursor) -> Self {
        Self {
            window,
            cursor,
            ui: Box::new(NoUi),
        }
    }

    pub fn with_ui(mut self, ui: Box<dyn UiProbe>) -> Self {
        self.ui = ui;
        self
    }

    pub fn window(&self) -> &Arc<Window> {
        &self.window
    }

    fn origin(&self) -> (i32, i32) {
        self.window
            .inner_position()
            .map(|p| (p.x, p.y))
            .unwrap_or_default()
    }
}

impl InputHost for WinitHost {
    fn ui_has_keyboard_focus(&self) -> bool {
        self.ui.has_keyboard_focus()
    }

    fn clear_ui_focus(&mut self) {
        self.ui.clear_focus();
    }

    fn is_ui_item_at(&self, x: i32, y: i32) -> bool {
        self.ui.is_ui_item_at(x, y)
    }

    fn viewport_size(&self) -> (i32, i32) {
        let size = self.window.inner_size();
        (size.width as i32, size.height as i32)
    }

    fn is_window_active(&self) -> bool {
        self.window.has_focus()
    }

    fn cursor_position(&self) -> (i32, i32) {
        self.cursor.get()
    }

    fn set_cursor_position(&mut self, x: i32, y: i32) {
        let (local_x, local_y) = self.map_from_global(x, y);
        match self
            .window
            .set_cursor_position(PhysicalPosition::new(local_x, local_y))
        {
            Ok(()) => self.cursor.set((x, y)),
            Err(e) => log::warn!("failed to move cursor to ({x}, {y}): {e}"),
        }
    }

    fn map_from_global(&self, x: i32, y: i32) -> (i32, i32) {
        let (ox, oy) = self.origin();
        (x - ox, y - oy)
    }

    fn map_to_global(&self, x: i32, y: i32) -> (i32, i32) {
        let (ox, oy) = self.origin();
        (x + ox, y + oy)
    }

    fn set_cursor_hidden(&mut self, hidden: bool) {
        self.window.set_cursor_visible(!hidden);
        let grab = if hidden {
            // Not every platform supports both modes.
            self.window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(e) = grab {
            log::warn!("cursor grab change failed: {e}");
        }
    }

    fn set_cursor_shape(&mut self, shape: Option<CursorShape>) {
        let icon = shape.map_or(CursorIcon::Default, cursor_icon);
        self.window.set_cursor(icon);
    }
}

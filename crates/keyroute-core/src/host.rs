//! The window the dispatcher is attached to.
//!
//! The core never looks at widgets or the 3D scene. It only asks the host
//! whether a UI element is present at a point, whether one has keyboard
//! focus, and drives the platform cursor through it.

/// Cursor appearances a context may request while it owns the pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CursorShape {
    Arrow,
    Crosshair,
    PointingHand,
    OpenHand,
    ClosedHand,
    IBeam,
    Wait,
    SizeAll,
    SizeHorizontal,
    SizeVertical,
    Forbidden,
}

pub trait InputHost {
    fn ui_has_keyboard_focus(&self) -> bool {
        false
    }

    fn clear_ui_focus(&mut self) {}

    /// A visible UI element covers the client-space point.
    fn is_ui_item_at(&self, _x: i32, _y: i32) -> bool {
        false
    }

    /// Client area size in pixels.
    fn viewport_size(&self) -> (i32, i32);

    fn is_window_active(&self) -> bool {
        true
    }

    /// Platform cursor position in global (screen) coordinates.
    fn cursor_position(&self) -> (i32, i32);

    fn set_cursor_position(&mut self, x: i32, y: i32);

    fn map_from_global(&self, x: i32, y: i32) -> (i32, i32) {
        (x, y)
    }

    fn map_to_global(&self, x: i32, y: i32) -> (i32, i32) {
        (x, y)
    }

    fn set_cursor_hidden(&mut self, hidden: bool);

    /// `None` restores the system default cursor.
    fn set_cursor_shape(&mut self, shape: Option<CursorShape>);
}

use bitflags::bitflags;
use smallvec::SmallVec;
use web_time::Instant;

use crate::keys::{KeyChord, KeyCode, KeySequence, Modifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyEventType {
    /// First occurrence of the key going down.
    Pressed,
    /// The key is still held; also used for OS auto-repeat.
    Down,
    Released,
}

#[derive(Clone, Debug)]
pub struct KeyEvent {
    pub key_code: KeyCode,
    /// Exact key + modifier combination. Empty for auto-repeats.
    pub sequence: KeySequence,
    /// 1 for the initial press, incremented for every auto-repeat.
    pub key_press_count: u32,
    pub modifiers: Modifiers,
    pub event_type: KeyEventType,
    pub text: String,
    /// Keys held down when this event was generated, excluding `key_code`.
    pub other_held_keys: SmallVec<[KeyCode; 4]>,
    pub handled: bool,
    pub timestamp: Instant,
}

impl KeyEvent {
    pub fn new(key_code: KeyCode, event_type: KeyEventType) -> Self {
        Self {
            key_code,
            sequence: KeySequence::from(key_code),
            key_press_count: 1,
            modifiers: Modifiers::empty(),
            event_type,
            text: String::new(),
            other_held_keys: SmallVec::new(),
            handled: false,
            timestamp: Instant::now(),
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self.sequence = KeyChord::new(modifiers, self.key_code).into();
        self
    }

    pub fn suppress(&mut self) {
        self.handled = true;
    }

    pub fn is_pressed(&self) -> bool {
        self.event_type == KeyEventType::Pressed
    }

    pub fn is_released(&self) -> bool {
        self.event_type == KeyEventType::Released
    }

    pub fn is_repeat(&self) -> bool {
        self.key_press_count > 1
    }

    pub fn has_shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    pub fn has_ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    pub fn has_alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u32 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;
        const BUTTON4 = 1 << 3;
        const BUTTON5 = 1 << 4;
    }
}

impl MouseButtons {
    pub const COUNT: usize = 5;

    /// True when exactly one button bit is set.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }

    /// Slot index of a single button: left 0, right 1, middle 2, extra 3/4.
    pub fn slot(self) -> Option<usize> {
        self.is_single().then(|| self.bits().trailing_zeros() as usize)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseEventType {
    Move,
    Scroll,
    Pressed,
    Released,
    DoubleClicked,
}

/// Where a mouse press landed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PressOrigin {
    #[default]
    None,
    Scene,
    Ui,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressPosition {
    pub x: i32,
    pub y: i32,
    pub origin: PressOrigin,
}

/// Last press location of every mouse button, copied into each mouse event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressPositions([PressPosition; MouseButtons::COUNT]);

impl PressPositions {
    /// Ignores masks that are not a single button.
    pub fn set(&mut self, button: MouseButtons, x: i32, y: i32, origin: PressOrigin) {
        if let Some(slot) = button.slot() {
            self.0[slot] = PressPosition { x, y, origin };
        }
    }

    pub fn get(&self, button: MouseButtons) -> Option<PressPosition> {
        button.slot().map(|slot| self.0[slot])
    }

    pub fn pos(&self, button: MouseButtons) -> (i32, i32) {
        self.get(button).map(|p| (p.x, p.y)).unwrap_or_default()
    }

    pub fn origin(&self, button: MouseButtons) -> PressOrigin {
        self.get(button).map(|p| p.origin).unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct MouseEvent {
    pub event_type: MouseEventType,
    /// The button that changed state. Empty for moves and scrolls.
    pub button: MouseButtons,
    /// All buttons held when the event was generated.
    pub other_buttons: MouseButtons,
    pub origin: PressOrigin,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub relative_x: i32,
    pub relative_y: i32,
    /// Wheel delta.
    pub relative_z: i32,
    pub global_x: i32,
    pub global_y: i32,
    pub modifiers: Modifiers,
    /// A UI element was under the pointer at (x, y).
    pub item_under_mouse: bool,
    pub press_positions: PressPositions,
    pub handled: bool,
    pub timestamp: Instant,
}

impl MouseEvent {
    pub fn new(event_type: MouseEventType, x: i32, y: i32) -> Self {
        Self {
            event_type,
            button: MouseButtons::empty(),
            other_buttons: MouseButtons::empty(),
            origin: PressOrigin::None,
            x,
            y,
            z: 0,
            relative_x: 0,
            relative_y: 0,
            relative_z: 0,
            global_x: 0,
            global_y: 0,
            modifiers: Modifiers::empty(),
            item_under_mouse: false,
            press_positions: PressPositions::default(),
            handled: false,
            timestamp: Instant::now(),
        }
    }

    pub fn with_button(mut self, button: MouseButtons) -> Self {
        self.button = button;
        self
    }

    pub fn suppress(&mut self) {
        self.handled = true;
    }

    pub fn is_button_down(&self, button: MouseButtons) -> bool {
        self.other_buttons.contains(button)
    }

    pub fn is_left_button_down(&self) -> bool {
        self.is_button_down(MouseButtons::LEFT)
    }

    pub fn is_right_button_down(&self) -> bool {
        self.is_button_down(MouseButtons::RIGHT)
    }

    pub fn is_middle_button_down(&self) -> bool {
        self.is_button_down(MouseButtons::MIDDLE)
    }

    /// Offset of the pointer from where `button` was last pressed.
    pub fn drag_delta(&self, button: MouseButtons) -> (i32, i32) {
        let (px, py) = self.press_positions.pos(button);
        (self.x - px, self.y - py)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    TapAndHold,
    Pan,
    Pinch,
    Swipe,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureState {
    Started,
    Updated,
    Finished,
    Canceled,
}

#[derive(Clone, Debug)]
pub struct GestureEvent {
    pub gesture_type: GestureKind,
    pub event_type: GestureState,
    pub position: (f32, f32),
    /// Pan/swipe offset since the previous update.
    pub delta: (f32, f32),
    /// Pinch scale change since the previous update.
    pub scale_delta: f32,
    pub handled: bool,
}

impl GestureEvent {
    pub fn new(gesture_type: GestureKind, event_type: GestureState) -> Self {
        Self {
            gesture_type,
            event_type,
            position: (0.0, 0.0),
            delta: (0.0, 0.0),
            scale_delta: 0.0,
            handled: false,
        }
    }

    pub fn suppress(&mut self) {
        self.handled = true;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchPhase {
    Begin,
    Update,
    End,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    pub touch_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_positions_slots() {
        let mut p = PressPositions::default();
        p.set(MouseButtons::MIDDLE, 10, 20, PressOrigin::Ui);
        p.set(MouseButtons::BUTTON5, 1, 2, PressOrigin::Scene);
        assert_eq!(p.pos(MouseButtons::MIDDLE), (10, 20));
        assert_eq!(p.origin(MouseButtons::MIDDLE), PressOrigin::Ui);
        assert_eq!(p.pos(MouseButtons::BUTTON5), (1, 2));
        assert_eq!(p.pos(MouseButtons::LEFT), (0, 0));
    }

    #[test]
    fn test_press_positions_ignore_multi_bit_masks() {
        let mut p = PressPositions::default();
        p.set(MouseButtons::LEFT | MouseButtons::RIGHT, 5, 5, PressOrigin::Scene);
        assert_eq!(p, PressPositions::default());
        assert_eq!(p.get(MouseButtons::empty()), None);
    }

    #[test]
    fn test_drag_delta() {
        let mut e = MouseEvent::new(MouseEventType::Move, 50, 40);
        e.press_positions
            .set(MouseButtons::LEFT, 20, 30, PressOrigin::Scene);
        assert_eq!(e.drag_delta(MouseButtons::LEFT), (30, 10));
    }

    #[test]
    fn test_key_event_sequence_follows_modifiers() {
        let e = KeyEvent::new(KeyCode::S, KeyEventType::Pressed).with_modifiers(Modifiers::CTRL);
        assert_eq!(e.sequence.to_string(), "Ctrl+S");
        assert!(e.has_ctrl());
        assert!(!e.is_repeat());
    }
}

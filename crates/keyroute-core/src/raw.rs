//! Translation of host notifications into dispatched event records.
//!
//! Each [`RawPlatformEvent`] becomes at most one record. The returned flag
//! tells the host whether to skip its own default handling.

use std::collections::hash_map::Entry;

use smallvec::SmallVec;
use web_time::Instant;

use crate::dispatcher::{Dispatcher, KeyPressInfo};
use crate::event::{
    GestureEvent, KeyEvent, KeyEventType, MouseButtons, MouseEvent, MouseEventType, PressOrigin,
    TouchEvent, TouchPhase,
};
use crate::keys::{KeyCode, KeySequence, Modifiers};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseAction {
    Press,
    Release,
    DoubleClick,
}

/// Pointer state shared by every mouse notification. Positions are in client
/// coordinates, `global_*` in screen coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
    pub global_x: i32,
    pub global_y: i32,
    pub modifiers: Modifiers,
    /// A UI element covers the pointer.
    pub over_ui: bool,
}

impl PointerState {
    pub fn at(x: i32, y: i32) -> Self {
        Self {
            x,
            y,
            global_x: x,
            global_y: y,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub enum RawPlatformEvent {
    KeyPress {
        key: KeyCode,
        modifiers: Modifiers,
        auto_repeat: bool,
        text: String,
    },
    KeyRelease {
        key: KeyCode,
        modifiers: Modifiers,
        auto_repeat: bool,
    },
    MouseButton {
        action: MouseAction,
        button: MouseButtons,
        pointer: PointerState,
    },
    MouseMove {
        pointer: PointerState,
    },
    /// `delta` in eighths of a degree, 120 per notch.
    Wheel {
        delta: i32,
        pointer: PointerState,
    },
    Gesture(GestureEvent),
    TouchBegin {
        touch_points: usize,
    },
    TouchUpdate {
        touch_points: usize,
    },
    TouchEnd,
    /// Pointer movement during a drag-and-drop operation.
    DragMove {
        x: i32,
        y: i32,
    },
}

impl Dispatcher {
    pub fn handle_raw_event(&mut self, raw: RawPlatformEvent) -> bool {
        match raw {
            RawPlatformEvent::KeyPress {
                key,
                modifiers,
                auto_repeat,
                text,
            } => self.raw_key_press(key, modifiers, auto_repeat, text),
            RawPlatformEvent::KeyRelease {
                key,
                modifiers,
                auto_repeat,
            } => self.raw_key_release(key, modifiers, auto_repeat),
            RawPlatformEvent::MouseButton {
                action,
                button,
                pointer,
            } => self.raw_mouse_button(action, button, pointer),
            RawPlatformEvent::MouseMove { pointer } => self.raw_mouse_move(pointer),
            RawPlatformEvent::Wheel { delta, pointer } => {
                let mut event = self.mouse_event(MouseEventType::Scroll, pointer);
                event.relative_z = delta;
                self.trigger_mouse_event(&mut event);
                true
            }
            RawPlatformEvent::Gesture(mut event) => {
                self.gestures_enabled = true;
                self.trigger_gesture_event(&mut event);
                event.handled
            }
            RawPlatformEvent::TouchBegin { touch_points } => {
                self.touch(TouchPhase::Begin, touch_points)
            }
            RawPlatformEvent::TouchUpdate { touch_points } => {
                self.touch(TouchPhase::Update, touch_points)
            }
            RawPlatformEvent::TouchEnd => self.touch(TouchPhase::End, 0),
            RawPlatformEvent::DragMove { x, y } => {
                self.last_mouse = (x, y);
                false
            }
        }
    }

    fn other_held_keys(&self, key: KeyCode) -> SmallVec<[KeyCode; 4]> {
        let mut others: SmallVec<[KeyCode; 4]> =
            self.held_keys.keys().copied().filter(|k| *k != key).collect();
        others.sort();
        others
    }

    fn raw_key_press(
        &mut self,
        key: KeyCode,
        modifiers: Modifiers,
        auto_repeat: bool,
        text: String,
    ) -> bool {
        self.current_modifiers = modifiers;

        let mut event = KeyEvent::new(key, KeyEventType::Pressed).with_modifiers(modifiers);
        event.text = text;
        event.other_held_keys = self.other_held_keys(key);

        let fresh = KeyPressInfo {
            key_press_count: 1,
            first_press: Instant::now(),
        };
        match self.held_keys.entry(key) {
            Entry::Occupied(mut held) if auto_repeat => {
                let info = held.get_mut();
                info.key_press_count += 1;
                event.key_press_count = info.key_press_count;
                event.sequence = KeySequence::new();
                event.event_type = KeyEventType::Down;
            }
            // The release was lost; start the key over.
            Entry::Occupied(mut held) => {
                log::trace!("key {key} pressed again while held");
                held.insert(fresh);
            }
            Entry::Vacant(slot) => {
                slot.insert(fresh);
            }
        }

        if event.key_press_count == 1 {
            self.new_keys_pressed.push(key);
        }

        self.trigger_key_event(&mut event);
        event.handled
    }

    fn raw_key_release(&mut self, key: KeyCode, modifiers: Modifiers, auto_repeat: bool) -> bool {
        self.current_modifiers = modifiers;
        // Auto-repeat releases pair with the repeated presses; the key is still down.
        if auto_repeat {
            return true;
        }
        let Some(info) = self.held_keys.remove(&key) else {
            return false;
        };
        self.new_keys_released.push(key);

        let mut event = KeyEvent::new(key, KeyEventType::Released).with_modifiers(modifiers);
        event.key_press_count = info.key_press_count;
        event.other_held_keys = self.other_held_keys(key);

        self.trigger_key_event(&mut event);
        event.handled
    }

    fn mouse_event(&self, event_type: MouseEventType, pointer: PointerState) -> MouseEvent {
        let over_ui = pointer.over_ui && self.is_mouse_cursor_visible();
        let mut event = MouseEvent::new(event_type, pointer.x, pointer.y);
        event.other_buttons = self.held_mouse_buttons;
        event.origin = if over_ui {
            PressOrigin::Ui
        } else {
            PressOrigin::Scene
        };
        event.global_x = pointer.global_x;
        event.global_y = pointer.global_y;
        event.modifiers = pointer.modifiers;
        event.item_under_mouse = over_ui;
        event
    }

    fn raw_mouse_button(
        &mut self,
        action: MouseAction,
        button: MouseButtons,
        pointer: PointerState,
    ) -> bool {
        let event_type = match action {
            MouseAction::Press | MouseAction::DoubleClick => {
                self.held_mouse_buttons |= button;
                self.new_mouse_buttons_pressed |= button;
                if action == MouseAction::Press {
                    MouseEventType::Pressed
                } else {
                    MouseEventType::DoubleClicked
                }
            }
            MouseAction::Release => {
                if !self.held_mouse_buttons.intersects(button) {
                    log::trace!("dropping release of unpressed button {button:?}");
                    return false;
                }
                self.held_mouse_buttons.remove(button);
                self.new_mouse_buttons_released |= button;
                MouseEventType::Released
            }
        };
        self.current_modifiers = pointer.modifiers;
        self.last_mouse = (pointer.x, pointer.y);

        let mut event = self.mouse_event(event_type, pointer).with_button(button);
        let on_scene = !event.item_under_mouse && self.is_mouse_cursor_visible();
        if on_scene && action != MouseAction::Release {
            self.clear_focus();
        }

        self.trigger_mouse_event(&mut event);
        event.handled
    }

    fn raw_mouse_move(&mut self, pointer: PointerState) -> bool {
        let visible = self.is_mouse_cursor_visible();
        let (last_x, last_y) = self.last_mouse;
        let mut relative = (pointer.x - last_x, pointer.y - last_y);
        let mut position = (pointer.x, pointer.y);

        if !visible {
            let window_active = self.host.as_ref().is_some_and(|h| h.is_window_active());
            if let Some(center) = self.viewport_center() {
                position = center;
                if !window_active || (pointer.x, pointer.y) == center {
                    relative = (0, 0);
                    self.last_mouse = center;
                }
            }
            // The pointer warp back to the centre reports a zero move.
            if relative == (0, 0) {
                return true;
            }
        }

        self.last_mouse = position;
        let mut event = self.mouse_event(
            MouseEventType::Move,
            PointerState {
                x: position.0,
                y: position.1,
                ..pointer
            },
        );
        event.relative_x = relative.0;
        event.relative_y = relative.1;
        self.trigger_mouse_event(&mut event);

        if !visible {
            self.recenter_mouse();
            return true;
        }
        event.handled
    }

    fn touch(&mut self, phase: TouchPhase, touch_points: usize) -> bool {
        self.num_touch_points = touch_points;
        self.emit_touch(TouchEvent {
            phase,
            touch_points,
        });
        true
    }
}

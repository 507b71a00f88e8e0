use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use keyroute_core::{
    GestureEvent, GestureKind, GestureState, KeyCode, Modifiers, MouseAction, MouseButtons,
    PointerState, RawPlatformEvent,
};
use web_time::{Duration, Instant};
use winit::event::{ElementState, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::window::Window;

use crate::host::{SharedCursor, UiProbe};
use crate::keymap;

pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(400);
/// Max pointer travel, in pixels on either axis, between the two clicks.
pub const DOUBLE_CLICK_DISTANCE: i32 = 4;
/// Wheel units per notch.
pub const WHEEL_STEP: f32 = 120.0;

#[derive(Clone, Copy, Debug)]
struct Click {
    button: MouseButtons,
    at: Instant,
    pos: (i32, i32),
}

/// Turns a second press into a double-click, the way desktop toolkits report
/// it: press, release, double-click, release.
#[derive(Debug, Default)]
pub struct ClickTracker {
    last: Option<Click>,
}

impl ClickTracker {
    pub fn press(&mut self, button: MouseButtons, pos: (i32, i32), at: Instant) -> MouseAction {
        let double = self.last.is_some_and(|c| {
            c.button == button
                && at.saturating_duration_since(c.at) <= DOUBLE_CLICK_INTERVAL
                && (pos.0 - c.pos.0).abs() <= DOUBLE_CLICK_DISTANCE
                && (pos.1 - c.pos.1).abs() <= DOUBLE_CLICK_DISTANCE
        });
        if double {
            self.last = None;
            MouseAction::DoubleClick
        } else {
            self.last = Some(Click { button, at, pos });
            MouseAction::Press
        }
    }
}

/// Active touch ids; yields the begin/update/end notification for a change.
#[derive(Debug, Default)]
pub struct TouchTracker {
    active: HashSet<u64>,
}

impl TouchTracker {
    pub fn apply(&mut self, id: u64, phase: TouchPhase) -> Option<RawPlatformEvent> {
        match phase {
            TouchPhase::Started => {
                let first = self.active.is_empty();
                self.active.insert(id);
                let touch_points = self.active.len();
                Some(if first {
                    RawPlatformEvent::TouchBegin { touch_points }
                } else {
                    RawPlatformEvent::TouchUpdate { touch_points }
                })
            }
            TouchPhase::Moved => self.active.contains(&id).then(|| RawPlatformEvent::TouchUpdate {
                touch_points: self.active.len(),
            }),
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if !self.active.remove(&id) {
                    return None;
                }
                Some(if self.active.is_empty() {
                    RawPlatformEvent::TouchEnd
                } else {
                    RawPlatformEvent::TouchUpdate {
                        touch_points: self.active.len(),
                    }
                })
            }
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

pub fn wheel_delta(delta: MouseScrollDelta) -> i32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => (y * WHEEL_STEP).round() as i32,
        MouseScrollDelta::PixelDelta(p) => p.y.round() as i32,
    }
}

pub fn gesture_state(phase: TouchPhase) -> GestureState {
    match phase {
        TouchPhase::Started => GestureState::Started,
        TouchPhase::Moved => GestureState::Updated,
        TouchPhase::Ended => GestureState::Finished,
        TouchPhase::Cancelled => GestureState::Canceled,
    }
}

/// Per-window translator from winit events to [`RawPlatformEvent`]s.
pub struct WinitInput {
    modifiers: Modifiers,
    /// Client coordinates.
    pointer: (i32, i32),
    cursor: SharedCursor,
    clicks: ClickTracker,
    touches: TouchTracker,
}

impl Default for WinitInput {
    fn default() -> Self {
        Self::new()
    }
}

impl WinitInput {
    pub fn new() -> Self {
        Self {
            modifiers: Modifiers::empty(),
            pointer: (0, 0),
            cursor: Rc::new(Cell::new((0, 0))),
            clicks: ClickTracker::default(),
            touches: TouchTracker::default(),
        }
    }

    /// Hand this to [`crate::WinitHost::new`].
    pub fn shared_cursor(&self) -> SharedCursor {
        self.cursor.clone()
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    fn pointer_state(&self, ui: &dyn UiProbe) -> PointerState {
        let (x, y) = self.pointer;
        let (gx, gy) = self.cursor.get();
        PointerState {
            x,
            y,
            global_x: gx,
            global_y: gy,
            modifiers: self.modifiers,
            over_ui: ui.is_ui_item_at(x, y),
        }
    }

    fn track_pointer(&mut self, window: &Window, x: i32, y: i32) {
        self.pointer = (x, y);
        let (ox, oy) = window
            .inner_position()
            .map(|p| (p.x, p.y))
            .unwrap_or_default();
        self.cursor.set((x + ox, y + oy));
    }

    pub fn translate(
        &mut self,
        window: &Window,
        event: &WindowEvent,
        ui: &dyn UiProbe,
    ) -> Option<RawPlatformEvent> {
        match event {
            WindowEvent::ModifiersChanged(m) => {
                self.modifiers = keymap::modifiers(m.state());
                None
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let key = keymap::key_code(event.physical_key);
                if key == KeyCode::UNKNOWN {
                    log::trace!("unmapped key {:?}", event.physical_key);
                }
                let mut modifiers = self.modifiers;
                if keymap::is_keypad(event.physical_key) {
                    modifiers |= Modifiers::KEYPAD;
                }
                Some(match event.state {
                    ElementState::Pressed => RawPlatformEvent::KeyPress {
                        key,
                        modifiers,
                        auto_repeat: event.repeat,
                        text: event.text.as_ref().map(|t| t.to_string()).unwrap_or_default(),
                    },
                    ElementState::Released => RawPlatformEvent::KeyRelease {
                        key,
                        modifiers,
                        auto_repeat: false,
                    },
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.track_pointer(window, position.x.round() as i32, position.y.round() as i32);
                Some(RawPlatformEvent::MouseMove {
                    pointer: self.pointer_state(ui),
                })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = keymap::mouse_button(*button)?;
                let action = match state {
                    ElementState::Pressed => self.clicks.press(button, self.pointer, Instant::now()),
                    ElementState::Released => MouseAction::Release,
                };
                Some(RawPlatformEvent::MouseButton {
                    action,
                    button,
                    pointer: self.pointer_state(ui),
                })
            }
            WindowEvent::MouseWheel { delta, .. } => Some(RawPlatformEvent::Wheel {
                delta: wheel_delta(*delta),
                pointer: self.pointer_state(ui),
            }),
            WindowEvent::Touch(touch) => self.touches.apply(touch.id, touch.phase),
            WindowEvent::PinchGesture { delta, phase, .. } => {
                let mut gesture = self.gesture(GestureKind::Pinch, gesture_state(*phase));
                gesture.scale_delta = *delta as f32;
                Some(RawPlatformEvent::Gesture(gesture))
            }
            WindowEvent::PanGesture { delta, phase, .. } => {
                let mut gesture = self.gesture(GestureKind::Pan, gesture_state(*phase));
                gesture.delta = (delta.x, delta.y);
                Some(RawPlatformEvent::Gesture(gesture))
            }
            WindowEvent::DoubleTapGesture { .. } => Some(RawPlatformEvent::Gesture(
                self.gesture(GestureKind::Tap, GestureState::Finished),
            )),
            _ => None,
        }
    }

    fn gesture(&self, kind: GestureKind, state: GestureState) -> GestureEvent {
        let mut gesture = GestureEvent::new(kind, state);
        gesture.position = (self.pointer.0 as f32, self.pointer.1 as f32);
        gesture
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_click_window() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        assert_eq!(clicks.press(MouseButtons::LEFT, (10, 10), t0), MouseAction::Press);
        assert_eq!(
            clicks.press(MouseButtons::LEFT, (13, 8), t0 + Duration::from_millis(300)),
            MouseAction::DoubleClick
        );
        // A third click starts over.
        assert_eq!(
            clicks.press(MouseButtons::LEFT, (13, 8), t0 + Duration::from_millis(350)),
            MouseAction::Press
        );
    }

    #[test]
    fn test_double_click_rejects_slow_far_or_other_button() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        clicks.press(MouseButtons::LEFT, (0, 0), t0);
        assert_eq!(
            clicks.press(MouseButtons::LEFT, (0, 0), t0 + Duration::from_millis(401)),
            MouseAction::Press
        );
        let t1 = t0 + Duration::from_millis(401);
        assert_eq!(
            clicks.press(MouseButtons::LEFT, (5, 0), t1 + Duration::from_millis(10)),
            MouseAction::Press
        );
        assert_eq!(
            clicks.press(MouseButtons::RIGHT, (5, 0), t1 + Duration::from_millis(20)),
            MouseAction::Press
        );
    }

    #[test]
    fn test_touch_tracking() {
        let mut touches = TouchTracker::default();
        assert!(matches!(
            touches.apply(1, TouchPhase::Started),
            Some(RawPlatformEvent::TouchBegin { touch_points: 1 })
        ));
        assert!(matches!(
            touches.apply(2, TouchPhase::Started),
            Some(RawPlatformEvent::TouchUpdate { touch_points: 2 })
        ));
        assert!(touches.apply(9, TouchPhase::Moved).is_none());
        assert!(matches!(
            touches.apply(1, TouchPhase::Cancelled),
            Some(RawPlatformEvent::TouchUpdate { touch_points: 1 })
        ));
        assert!(matches!(
            touches.apply(2, TouchPhase::Ended),
            Some(RawPlatformEvent::TouchEnd)
        ));
        assert!(touches.is_empty());
        assert!(touches.apply(2, TouchPhase::Ended).is_none());
    }

    #[test]
    fn test_wheel_notch_is_120() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)), 120);
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, -2.0)), -240);
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(
                winit::dpi::PhysicalPosition::new(0.0, 33.4)
            )),
            33
        );
    }

    #[test]
    fn test_gesture_phases() {
        assert_eq!(gesture_state(TouchPhase::Moved), GestureState::Updated);
        assert_eq!(gesture_state(TouchPhase::Cancelled), GestureState::Canceled);
    }
}

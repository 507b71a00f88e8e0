//! A named, prioritised consumer of routed input.
//!
//! Observers are grouped in channels and always run in the same order: the
//! generic channel, then the channel for the event's phase/type, then the
//! most specific one (key sequence or mouse button).
//!
//! Held-key state is double buffered. Events land in `new_key_events`; the
//! dispatcher calls [`InputContext::update_frame`] once per tick to commit them,
//! so every poller sees a key as "pressed" for exactly one tick.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::event::{
    GestureEvent, GestureState, KeyEvent, KeyEventType, MouseButtons, MouseEvent, MouseEventType,
};
use crate::host::CursorShape;
use crate::keys::{KeyCode, KeySequence};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeldKeyState {
    pub phase: KeyEventType,
    pub repeat_count: u32,
}

struct Channel<E> {
    handlers: Vec<(HandlerId, Box<dyn FnMut(&mut E)>)>,
}

impl<E> Default for Channel<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<E> Channel<E> {
    fn emit(&mut self, event: &mut E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(h, _)| *h != id);
        self.handlers.len() != before
    }

    fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[derive(Default)]
struct KeyChannels {
    any: Channel<KeyEvent>,
    pressed: Channel<KeyEvent>,
    down: Channel<KeyEvent>,
    released: Channel<KeyEvent>,
    by_sequence: HashMap<KeySequence, Channel<KeyEvent>>,
}

#[derive(Default)]
struct MouseChannels {
    any: Channel<MouseEvent>,
    moved: Channel<MouseEvent>,
    scrolled: Channel<MouseEvent>,
    pressed: Channel<MouseEvent>,
    released: Channel<MouseEvent>,
    double_clicked: Channel<MouseEvent>,
    button_pressed: HashMap<MouseButtons, Channel<MouseEvent>>,
    button_released: HashMap<MouseButtons, Channel<MouseEvent>>,
}

#[derive(Default)]
struct GestureChannels {
    any: Channel<GestureEvent>,
    started: Channel<GestureEvent>,
    updated: Channel<GestureEvent>,
    finished: Channel<GestureEvent>,
    canceled: Channel<GestureEvent>,
}

pub struct InputContext {
    name: String,
    priority: i32,
    takes_keyboard_events_over_ui: bool,
    takes_mouse_events_over_ui: bool,
    held_keys: HashMap<KeyCode, HeldKeyState>,
    new_key_events: HashMap<KeyCode, HeldKeyState>,
    suppressed_keys: HashSet<KeyCode>,
    mouse_cursor_override: Option<CursorShape>,
    keys: KeyChannels,
    mouse: MouseChannels,
    gestures: GestureChannels,
    next_handler: u64,
}

impl fmt::Debug for InputContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputContext")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("held_keys", &self.held_keys.len())
            .field("mouse_cursor_override", &self.mouse_cursor_override)
            .finish_non_exhaustive()
    }
}

impl InputContext {
    pub(crate) fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
            takes_keyboard_events_over_ui: false,
            takes_mouse_events_over_ui: false,
            held_keys: HashMap::new(),
            new_key_events: HashMap::new(),
            suppressed_keys: HashSet::new(),
            mouse_cursor_override: None,
            keys: KeyChannels::default(),
            mouse: MouseChannels::default(),
            gestures: GestureChannels::default(),
            next_handler: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub(crate) fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn takes_keyboard_events_over_ui(&self) -> bool {
        self.takes_keyboard_events_over_ui
    }

    /// Receive key presses even while a UI widget has keyboard focus.
    pub fn set_takes_keyboard_events_over_ui(&mut self, enabled: bool) {
        self.takes_keyboard_events_over_ui = enabled;
    }

    pub fn takes_mouse_events_over_ui(&self) -> bool {
        self.takes_mouse_events_over_ui
    }

    /// Receive mouse events even while the pointer is over a UI element.
    pub fn set_takes_mouse_events_over_ui(&mut self, enabled: bool) {
        self.takes_mouse_events_over_ui = enabled;
    }

    pub fn mouse_cursor_override(&self) -> Option<CursorShape> {
        self.mouse_cursor_override
    }

    pub(crate) fn set_mouse_cursor_override(&mut self, shape: Option<CursorShape>) {
        self.mouse_cursor_override = shape;
    }

    /// Every event for `key` reaching this context comes back handled.
    pub fn set_key_suppressed(&mut self, key: KeyCode, suppressed: bool) {
        if suppressed {
            self.suppressed_keys.insert(key);
        } else {
            self.suppressed_keys.remove(&key);
        }
    }

    pub fn is_key_suppressed(&self, key: KeyCode) -> bool {
        self.suppressed_keys.contains(&key)
    }

    fn next_id(&mut self) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        id
    }

    // Observer registration

    pub fn on_key_event(&mut self, f: impl FnMut(&mut KeyEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.keys.any.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_key_pressed(&mut self, f: impl FnMut(&mut KeyEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.keys.pressed.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_key_down(&mut self, f: impl FnMut(&mut KeyEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.keys.down.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_key_released(&mut self, f: impl FnMut(&mut KeyEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.keys.released.handlers.push((id, Box::new(f)));
        id
    }

    /// Fires on press and release of exactly `sequence` (key plus modifiers).
    pub fn on_key_sequence(
        &mut self,
        sequence: KeySequence,
        f: impl FnMut(&mut KeyEvent) + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.keys
            .by_sequence
            .entry(sequence)
            .or_default()
            .handlers
            .push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_event(&mut self, f: impl FnMut(&mut MouseEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.mouse.any.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_move(&mut self, f: impl FnMut(&mut MouseEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.mouse.moved.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_scroll(&mut self, f: impl FnMut(&mut MouseEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.mouse.scrolled.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_pressed(&mut self, f: impl FnMut(&mut MouseEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.mouse.pressed.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_released(&mut self, f: impl FnMut(&mut MouseEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.mouse.released.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_mouse_double_clicked(
        &mut self,
        f: impl FnMut(&mut MouseEvent) + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.mouse.double_clicked.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_button_pressed(
        &mut self,
        button: MouseButtons,
        f: impl FnMut(&mut MouseEvent) + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.mouse
            .button_pressed
            .entry(button)
            .or_default()
            .handlers
            .push((id, Box::new(f)));
        id
    }

    pub fn on_button_released(
        &mut self,
        button: MouseButtons,
        f: impl FnMut(&mut MouseEvent) + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.mouse
            .button_released
            .entry(button)
            .or_default()
            .handlers
            .push((id, Box::new(f)));
        id
    }

    pub fn on_gesture_event(&mut self, f: impl FnMut(&mut GestureEvent) + 'static) -> HandlerId {
        let id = self.next_id();
        self.gestures.any.handlers.push((id, Box::new(f)));
        id
    }

    pub fn on_gesture(
        &mut self,
        state: GestureState,
        f: impl FnMut(&mut GestureEvent) + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        let channel = match state {
            GestureState::Started => &mut self.gestures.started,
            GestureState::Updated => &mut self.gestures.updated,
            GestureState::Finished => &mut self.gestures.finished,
            GestureState::Canceled => &mut self.gestures.canceled,
        };
        channel.handlers.push((id, Box::new(f)));
        id
    }

    /// Removes a handler from whichever channel holds it.
    pub fn disconnect(&mut self, id: HandlerId) -> bool {
        let k = &mut self.keys;
        let m = &mut self.mouse;
        let g = &mut self.gestures;
        let removed = k.any.remove(id)
            || k.pressed.remove(id)
            || k.down.remove(id)
            || k.released.remove(id)
            || k.by_sequence.values_mut().any(|c| c.remove(id))
            || m.any.remove(id)
            || m.moved.remove(id)
            || m.scrolled.remove(id)
            || m.pressed.remove(id)
            || m.released.remove(id)
            || m.double_clicked.remove(id)
            || m.button_pressed.values_mut().any(|c| c.remove(id))
            || m.button_released.values_mut().any(|c| c.remove(id))
            || g.any.remove(id)
            || g.started.remove(id)
            || g.updated.remove(id)
            || g.finished.remove(id)
            || g.canceled.remove(id);

        k.by_sequence.retain(|_, c| !c.is_empty());
        m.button_pressed.retain(|_, c| !c.is_empty());
        m.button_released.retain(|_, c| !c.is_empty());
        removed
    }

    // Dispatch

    /// Down/released notifications for keys this context never saw pressed
    /// are dropped.
    pub fn trigger_key_event(&mut self, event: &mut KeyEvent) {
        let key = event.key_code;
        let event_type = event.event_type;
        if event_type != KeyEventType::Pressed && !self.is_key_down_immediate(key) {
            return;
        }

        self.keys.any.emit(event);
        match event_type {
            KeyEventType::Pressed => self.keys.pressed.emit(event),
            KeyEventType::Down => self.keys.down.emit(event),
            KeyEventType::Released => self.keys.released.emit(event),
        }
        if event_type != KeyEventType::Down
            && let Some(channel) = self.keys.by_sequence.get_mut(&event.sequence)
        {
            channel.emit(event);
        }

        let state = match event_type {
            KeyEventType::Pressed => HeldKeyState {
                phase: KeyEventType::Pressed,
                repeat_count: event.key_press_count.max(1),
            },
            // A repeat in the same tick as the press keeps the key reading as pressed.
            KeyEventType::Down => HeldKeyState {
                phase: self
                    .new_key_events
                    .get(&key)
                    .map_or(KeyEventType::Down, |s| s.phase),
                repeat_count: event.key_press_count,
            },
            KeyEventType::Released => HeldKeyState {
                phase: KeyEventType::Released,
                repeat_count: event.key_press_count,
            },
        };
        self.new_key_events.insert(key, state);

        if self.suppressed_keys.contains(&key) {
            event.handled = true;
        }
    }

    pub fn trigger_mouse_event(&mut self, event: &mut MouseEvent) {
        let event_type = event.event_type;
        let button = event.button;

        self.mouse.any.emit(event);
        let typed = match event_type {
            MouseEventType::Move => &mut self.mouse.moved,
            MouseEventType::Scroll => &mut self.mouse.scrolled,
            MouseEventType::Pressed => &mut self.mouse.pressed,
            MouseEventType::Released => &mut self.mouse.released,
            MouseEventType::DoubleClicked => &mut self.mouse.double_clicked,
        };
        typed.emit(event);

        let by_button = match event_type {
            MouseEventType::Pressed => self.mouse.button_pressed.get_mut(&button),
            MouseEventType::Released => self.mouse.button_released.get_mut(&button),
            _ => None,
        };
        if let Some(channel) = by_button {
            channel.emit(event);
        }
    }

    pub fn trigger_gesture_event(&mut self, event: &mut GestureEvent) {
        let state = event.event_type;
        self.gestures.any.emit(event);
        match state {
            GestureState::Started => self.gestures.started.emit(event),
            GestureState::Updated => self.gestures.updated.emit(event),
            GestureState::Finished => self.gestures.finished.emit(event),
            GestureState::Canceled => self.gestures.canceled.emit(event),
        }
    }

    /// Advances the held-key buffer by one tick.
    pub fn update_frame(&mut self) {
        self.held_keys
            .retain(|_, s| s.phase != KeyEventType::Released);
        for state in self.held_keys.values_mut() {
            if state.phase == KeyEventType::Pressed {
                state.phase = KeyEventType::Down;
            }
        }
        self.held_keys.extend(self.new_key_events.drain());
    }

    /// Sends a synthetic release for every key this context believes is down.
    pub fn release_all_keys(&mut self) {
        let mut keys: Vec<(KeyCode, u32)> = Vec::new();
        for key in self.new_key_events.keys().chain(self.held_keys.keys()) {
            if keys.iter().any(|(k, _)| k == key) || !self.is_key_down_immediate(*key) {
                continue;
            }
            let count = self
                .new_key_events
                .get(key)
                .or_else(|| self.held_keys.get(key))
                .map_or(1, |s| s.repeat_count);
            keys.push((*key, count));
        }

        for (key, count) in keys {
            let mut event = KeyEvent::new(key, KeyEventType::Released);
            event.key_press_count = count;
            self.trigger_key_event(&mut event);
        }
    }

    // Polling, against the committed buffer

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held_keys
            .get(&key)
            .is_some_and(|s| s.phase != KeyEventType::Released)
    }

    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.held_keys
            .get(&key)
            .is_some_and(|s| s.phase == KeyEventType::Pressed)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.held_keys
            .get(&key)
            .is_some_and(|s| s.phase == KeyEventType::Released)
    }

    /// 0 when the key is up.
    pub fn key_pressed_count(&self, key: KeyCode) -> u32 {
        self.held_keys.get(&key).map_or(0, |s| s.repeat_count)
    }

    pub fn held_key(&self, key: KeyCode) -> Option<HeldKeyState> {
        self.held_keys.get(&key).copied()
    }

    fn is_key_down_immediate(&self, key: KeyCode) -> bool {
        self.new_key_events
            .get(&key)
            .or_else(|| self.held_keys.get(&key))
            .is_some_and(|s| s.phase != KeyEventType::Released)
    }
}

use std::collections::HashMap;

use web_time::Instant;

use crate::bindings::KeyBindings;
use crate::config::{ConfigStore, DispatcherConfig};
use crate::context::InputContext;
use crate::error::InputError;
use crate::event::{
    GestureEvent, KeyEvent, KeyEventType, MouseButtons, MouseEvent, MouseEventType, PressPositions,
    TouchEvent,
};
use crate::host::{CursorShape, InputHost};
use crate::keys::{KeyCode, KeySequence, Modifiers};
use crate::registry::{ContextHandle, ContextId, Registry};

#[derive(Clone, Copy, Debug)]
pub(crate) struct KeyPressInfo {
    pub key_press_count: u32,
    pub first_press: Instant,
}

/// Routes input to the top-level context and then to every registered
/// context in descending priority. See the crate docs for the full protocol.
pub struct Dispatcher {
    pub(crate) config: DispatcherConfig,
    pub(crate) host: Option<Box<dyn InputHost>>,
    pub(crate) registry: Registry,
    top_level: InputContext,
    key_bindings: KeyBindings,

    pub(crate) held_keys: HashMap<KeyCode, KeyPressInfo>,
    pressed_keys: Vec<KeyCode>,
    released_keys: Vec<KeyCode>,
    pub(crate) new_keys_pressed: Vec<KeyCode>,
    pub(crate) new_keys_released: Vec<KeyCode>,

    pub(crate) held_mouse_buttons: MouseButtons,
    pressed_mouse_buttons: MouseButtons,
    released_mouse_buttons: MouseButtons,
    pub(crate) new_mouse_buttons_pressed: MouseButtons,
    pub(crate) new_mouse_buttons_released: MouseButtons,

    pub(crate) current_modifiers: Modifiers,
    press_positions: PressPositions,
    pub(crate) last_mouse: (i32, i32),
    mouse_cursor_visible: bool,
    /// Global cursor position at the moment the cursor was hidden.
    fps_mode_enter: (i32, i32),
    displayed_cursor: Option<CursorShape>,

    pub(crate) gestures_enabled: bool,
    pub(crate) num_touch_points: usize,
    touch_observers: Vec<Box<dyn FnMut(&TouchEvent)>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DispatcherConfig::default())
    }
}

impl Dispatcher {
    pub fn new(config: DispatcherConfig) -> Self {
        let top_level = InputContext::new(config.top_level_name.clone(), config.top_level_priority);
        Self {
            config,
            host: None,
            registry: Registry::default(),
            top_level,
            key_bindings: KeyBindings::new(),
            held_keys: HashMap::new(),
            pressed_keys: Vec::new(),
            released_keys: Vec::new(),
            new_keys_pressed: Vec::new(),
            new_keys_released: Vec::new(),
            held_mouse_buttons: MouseButtons::empty(),
            pressed_mouse_buttons: MouseButtons::empty(),
            released_mouse_buttons: MouseButtons::empty(),
            new_mouse_buttons_pressed: MouseButtons::empty(),
            new_mouse_buttons_released: MouseButtons::empty(),
            current_modifiers: Modifiers::empty(),
            press_positions: PressPositions::default(),
            last_mouse: (0, 0),
            mouse_cursor_visible: true,
            fps_mode_enter: (0, 0),
            displayed_cursor: None,
            gestures_enabled: false,
            num_touch_points: 0,
            touch_observers: Vec::new(),
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Hooks the dispatcher to a host window.
    pub fn attach(&mut self, mut host: Box<dyn InputHost>) {
        let (x, y) = host.cursor_position();
        self.last_mouse = host.map_from_global(x, y);
        host.set_cursor_shape(self.displayed_cursor);
        self.host = Some(host);
    }

    /// Returns the previous host. The dispatcher runs headless afterwards.
    pub fn detach(&mut self) -> Option<Box<dyn InputHost>> {
        self.host.take()
    }

    pub fn is_headless(&self) -> bool {
        self.host.is_none()
    }

    /// Drops every context, tracked or not, and all key bindings.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.key_bindings.clear();
    }

    // Registration

    /// Keep the returned handle alive for as long as the context is needed.
    pub fn register_context(&mut self, name: &str, priority: i32) -> ContextHandle {
        self.registry.register(name, priority)
    }

    /// For owners that cannot hold a [`ContextHandle`]. The dispatcher keeps
    /// the context alive until [`Dispatcher::unregister_untracked_context`].
    pub fn register_untracked_context(&mut self, name: &str, priority: i32) -> ContextId {
        self.registry.register_untracked(name, priority)
    }

    pub fn unregister_untracked_context(&mut self, name: &str) -> Result<(), InputError> {
        self.registry.unregister_untracked(name)
    }

    pub fn set_priority(
        &mut self,
        id: impl Into<ContextId>,
        priority: i32,
    ) -> Result<(), InputError> {
        self.registry.set_priority(id.into(), priority)
    }

    pub fn context(&self, id: impl Into<ContextId>) -> Option<&InputContext> {
        self.registry.get(id.into())
    }

    pub fn context_mut(&mut self, id: impl Into<ContextId>) -> Option<&mut InputContext> {
        self.registry.get_mut(id.into())
    }

    pub fn is_context_live(&self, id: impl Into<ContextId>) -> bool {
        self.registry.is_live(id.into())
    }

    /// Live contexts in dispatch order.
    pub fn contexts(&self) -> impl Iterator<Item = (ContextId, &InputContext)> + '_ {
        self.registry.iter()
    }

    /// Number of registry slots, including expired ones not yet pruned.
    pub fn registry_len(&self) -> usize {
        self.registry.len()
    }

    /// Runs before every registered context, even before the UI sees input.
    pub fn top_level(&self) -> &InputContext {
        &self.top_level
    }

    pub fn top_level_mut(&mut self) -> &mut InputContext {
        &mut self.top_level
    }

    /// Logs one line per context and returns them.
    pub fn dump_contexts(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for index in 0..self.registry.len() {
            let line = match self.registry.id_at(index).and_then(|id| self.registry.get(id)) {
                Some(ctx) => format!(
                    "Context {index}: \"{}\", priority {}",
                    ctx.name(),
                    ctx.priority()
                ),
                None => format!("Context {index}: expired"),
            };
            lines.push(line);
        }
        let mut index = self.registry.len();
        for ctx in self.registry.untracked() {
            lines.push(format!(
                "Untracked context {index}: \"{}\", priority {}",
                ctx.name(),
                ctx.priority()
            ));
            index += 1;
        }
        for line in &lines {
            log::info!("{line}");
        }
        lines
    }

    // Propagation

    /// Routes a key event. On return `handled` tells the host whether to
    /// skip its own default processing.
    ///
    /// Propagation never stops early. Once any context marks the event handled,
    /// every later context sees it as `Released`, so nothing below a consumer
    /// is left believing the key is held.
    pub fn trigger_key_event(&mut self, event: &mut KeyEvent) {
        debug_assert!(!event.handled, "key event dispatched already handled");

        self.top_level.trigger_key_event(event);
        if event.handled {
            event.event_type = KeyEventType::Released;
        }

        let cursor_visible = self.mouse_cursor_visible;
        let ui_focus_gate = event.event_type == KeyEventType::Pressed
            && self.host.as_ref().is_some_and(|h| h.ui_has_keyboard_focus());

        for index in 0..self.registry.len() {
            let Some(ctx) = self.registry.live_at_mut(index) else {
                continue;
            };
            let blocked = ui_focus_gate
                && cursor_visible
                && event.event_type == KeyEventType::Pressed
                && !ctx.takes_keyboard_events_over_ui();
            if !blocked {
                ctx.trigger_key_event(event);
            }
            if event.handled {
                event.event_type = KeyEventType::Released;
            }
        }

        if ui_focus_gate && cursor_visible {
            return;
        }
        // Hidden cursor: the scene owns the keyboard, the UI gets nothing.
        if !cursor_visible {
            event.suppress();
        }
    }

    /// Routes a mouse event, stopping at the first context that handles it.
    pub fn trigger_mouse_event(&mut self, event: &mut MouseEvent) {
        debug_assert!(!event.handled, "mouse event dispatched already handled");

        if matches!(
            event.event_type,
            MouseEventType::Pressed | MouseEventType::DoubleClicked
        ) {
            self.press_positions
                .set(event.button, event.x, event.y, event.origin);
        }
        event.press_positions = self.press_positions;

        self.top_level.trigger_mouse_event(event);
        if event.handled {
            return;
        }

        let cursor_visible = self.mouse_cursor_visible;
        for index in 0..self.registry.len() {
            if event.handled {
                break;
            }
            let Some(ctx) = self.registry.live_at_mut(index) else {
                continue;
            };
            if !event.item_under_mouse || ctx.takes_mouse_events_over_ui() || !cursor_visible {
                ctx.trigger_mouse_event(event);
            }
        }

        if !cursor_visible {
            event.suppress();
        }
    }

    pub fn trigger_gesture_event(&mut self, event: &mut GestureEvent) {
        debug_assert!(!event.handled, "gesture event dispatched already handled");

        self.top_level.trigger_gesture_event(event);
        for index in 0..self.registry.len() {
            if event.handled {
                break;
            }
            if let Some(ctx) = self.registry.live_at_mut(index) {
                ctx.trigger_gesture_event(event);
            }
        }
    }

    pub fn on_touch(&mut self, f: impl FnMut(&TouchEvent) + 'static) {
        self.touch_observers.push(Box::new(f));
    }

    pub(crate) fn emit_touch(&mut self, event: TouchEvent) {
        for observer in &mut self.touch_observers {
            observer(&event);
        }
    }

    /// Synthetic release for every key each live context believes is down.
    pub fn scene_release_all_keys(&mut self) {
        for index in 0..self.registry.len() {
            if let Some(ctx) = self.registry.live_at_mut(index) {
                ctx.release_all_keys();
            }
        }
    }

    /// Releases every held mouse button and tells the contexts about it.
    pub fn scene_release_mouse_buttons(&mut self) {
        let held = self.held_mouse_buttons;
        if held.is_empty() {
            return;
        }
        self.held_mouse_buttons = MouseButtons::empty();
        self.new_mouse_buttons_released |= held;

        let (x, y) = self.last_mouse;
        for button in held.iter() {
            let mut event = MouseEvent::new(MouseEventType::Released, x, y).with_button(button);
            event.modifiers = self.current_modifiers;
            self.trigger_mouse_event(&mut event);
        }
    }

    // Polling

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.held_keys.contains_key(&key)
    }

    /// True for the whole tick after the press arrived, however often asked.
    /// Auto-repeats do not count.
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.pressed_keys.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.released_keys.contains(&key)
    }

    /// `button` must be a single button.
    pub fn is_mouse_button_down(&self, button: MouseButtons) -> bool {
        debug_assert!(button.is_single(), "query one mouse button at a time");
        self.held_mouse_buttons.intersects(button)
    }

    /// `button` must be a single button.
    pub fn is_mouse_button_pressed(&self, button: MouseButtons) -> bool {
        debug_assert!(button.is_single(), "query one mouse button at a time");
        self.pressed_mouse_buttons.intersects(button)
    }

    /// `button` must be a single button.
    pub fn is_mouse_button_released(&self, button: MouseButtons) -> bool {
        debug_assert!(button.is_single(), "query one mouse button at a time");
        self.released_mouse_buttons.intersects(button)
    }

    /// Where `button` was last pressed, in client coordinates.
    pub fn mouse_pressed_pos(&self, button: MouseButtons) -> (i32, i32) {
        self.press_positions.pos(button)
    }

    /// Last known pointer position in client coordinates.
    pub fn mouse_pos(&self) -> (i32, i32) {
        self.last_mouse
    }

    /// How long `key` has been held, if it is down.
    pub fn key_held_for(&self, key: KeyCode) -> Option<std::time::Duration> {
        self.held_keys
            .get(&key)
            .map(|info| Instant::now().saturating_duration_since(info.first_press))
    }

    pub fn gestures_enabled(&self) -> bool {
        self.gestures_enabled
    }

    pub fn num_touch_points(&self) -> usize {
        self.num_touch_points
    }

    // Cursor

    pub fn is_mouse_cursor_visible(&self) -> bool {
        self.mouse_cursor_visible
    }

    /// Hiding switches to relative (FPS) mouse mode; showing puts the pointer
    /// back where it was hidden. Does nothing while headless.
    pub fn set_mouse_cursor_visible(&mut self, visible: bool) {
        if self.mouse_cursor_visible == visible {
            return;
        }
        let Some(host) = self.host.as_mut() else {
            return;
        };

        self.mouse_cursor_visible = visible;
        if visible {
            host.set_cursor_hidden(false);
            let (x, y) = self.fps_mode_enter;
            host.set_cursor_position(x, y);
            log::debug!("mouse cursor shown, restored to ({x}, {y})");
        } else {
            host.set_cursor_hidden(true);
            self.fps_mode_enter = host.cursor_position();
            log::debug!("mouse cursor hidden at {:?}", self.fps_mode_enter);
        }

        let (gx, gy) = host.cursor_position();
        self.last_mouse = host.map_from_global(gx, gy);
        self.apply_mouse_cursor_override();
    }

    /// Requests (`Some`) or clears (`None`) the cursor shown while `id` wins
    /// arbitration.
    pub fn set_mouse_cursor_override(
        &mut self,
        id: impl Into<ContextId>,
        shape: Option<CursorShape>,
    ) -> Result<(), InputError> {
        let id = id.into();
        let ctx = self
            .registry
            .get_mut(id)
            .ok_or(InputError::ExpiredContext(id))?;
        ctx.set_mouse_cursor_override(shape);
        self.apply_mouse_cursor_override();
        Ok(())
    }

    /// Cursor currently shown by arbitration, `None` for the system default.
    pub fn displayed_cursor(&self) -> Option<CursorShape> {
        self.displayed_cursor
    }

    /// Shows the cursor of the highest-priority context that requested one
    /// and may receive the pointer at its current position.
    pub fn apply_mouse_cursor_override(&mut self) {
        let cursor_visible = self.mouse_cursor_visible;
        let (x, y) = self.last_mouse;
        let ui_under_mouse =
            cursor_visible && self.host.as_ref().is_some_and(|h| h.is_ui_item_at(x, y));

        let winner = self
            .registry
            .iter()
            .filter(|(_, ctx)| {
                !ui_under_mouse || ctx.takes_mouse_events_over_ui() || !cursor_visible
            })
            .find_map(|(_, ctx)| ctx.mouse_cursor_override());

        if winner != self.displayed_cursor {
            self.displayed_cursor = winner;
            if let Some(host) = self.host.as_mut() {
                host.set_cursor_shape(winner);
            }
        }
    }

    /// Keeps the hidden cursor at the viewport centre so relative motion never
    /// runs into the screen edge.
    pub(crate) fn recenter_mouse(&mut self) {
        let Some(host) = self.host.as_mut() else {
            return;
        };
        if !host.is_window_active() {
            return;
        }
        let (w, h) = host.viewport_size();
        let center = (w / 2, h / 2);
        self.last_mouse = center;

        let global = host.map_to_global(center.0, center.1);
        if global == host.cursor_position() {
            return;
        }
        host.set_cursor_position(global.0, global.1);
        let (gx, gy) = host.cursor_position();
        self.last_mouse = host.map_from_global(gx, gy);
    }

    pub(crate) fn viewport_center(&self) -> Option<(i32, i32)> {
        self.host.as_ref().map(|h| {
            let (w, h) = h.viewport_size();
            (w / 2, h / 2)
        })
    }

    /// Asks the host to take keyboard focus away from UI widgets.
    pub fn clear_focus(&mut self) {
        if let Some(host) = self.host.as_mut() {
            host.clear_ui_focus();
        }
    }

    // Frame

    /// Advances one tick: commits the double-buffered polling state, ages
    /// every context, re-arbitrates the cursor and prunes expired contexts.
    pub fn update(&mut self) {
        let window_active = self.host.as_ref().is_none_or(|h| h.is_window_active());
        if !window_active && self.config.release_input_on_focus_loss {
            self.release_global_keys();
            self.scene_release_all_keys();
            self.scene_release_mouse_buttons();
        }

        self.pressed_keys = std::mem::take(&mut self.new_keys_pressed);
        self.released_keys = std::mem::take(&mut self.new_keys_released);
        self.pressed_mouse_buttons = std::mem::take(&mut self.new_mouse_buttons_pressed);
        self.released_mouse_buttons = std::mem::take(&mut self.new_mouse_buttons_released);

        self.top_level.update_frame();
        for index in 0..self.registry.len() {
            if let Some(ctx) = self.registry.live_at_mut(index) {
                ctx.update_frame();
            }
        }

        self.apply_mouse_cursor_override();
        self.registry.prune();

        if !self.mouse_cursor_visible {
            self.recenter_mouse();
        }
    }

    // The dispatcher's own held-key record goes too, otherwise the next
    // press would be taken for an auto-repeat.
    fn release_global_keys(&mut self) {
        for key in self.held_keys.drain().map(|(k, _)| k) {
            self.new_keys_released.push(key);
        }
    }

    // Key bindings

    pub fn set_key_binding(&mut self, action: impl Into<String>, sequence: KeySequence) {
        self.key_bindings.set(action, sequence);
    }

    /// Empty sequence when the action is unbound.
    pub fn key_binding(&self, action: &str) -> KeySequence {
        self.key_bindings.get(action)
    }

    pub fn key_binding_or_insert(&mut self, action: &str, default: KeySequence) -> KeySequence {
        self.key_bindings.get_or_insert(action, default)
    }

    pub fn key_bindings(&self) -> &KeyBindings {
        &self.key_bindings
    }

    pub fn set_key_bindings(&mut self, bindings: KeyBindings) {
        self.key_bindings = bindings;
    }

    pub fn load_key_bindings(&mut self, store: &dyn ConfigStore) -> usize {
        let loaded = self.key_bindings.load(
            store,
            &self.config.binding_section,
            &self.config.binding_key_prefix,
        );
        log::debug!("loaded {loaded} key bindings");
        loaded
    }

    pub fn save_key_bindings(&self, store: &mut dyn ConfigStore) {
        self.key_bindings.save(
            store,
            &self.config.binding_section,
            &self.config.binding_key_prefix,
        );
    }
}

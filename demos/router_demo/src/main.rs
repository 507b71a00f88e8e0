//! Two input contexts sharing one window.
//!
//! - `Camera` (priority 100): WASD polling, orbit with the right button held
//!   or in look mode, wheel zoom.
//! - `Console` (priority 200): opened with the backtick key, swallows every
//!   key while open.
//!
//! Escape toggles look mode, which hides the cursor and pins it to the centre.
//! Bindings are read from and written back to `router_demo.ini`.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use keyroute_core::*;
use keyroute_winit::{NoUi, WinitHost, WinitInput};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

const BINDINGS_FILE: &str = "router_demo.ini";

#[derive(Debug)]
struct Camera {
    yaw: f32,
    pitch: f32,
    distance: f32,
    position: (f32, f32),
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            distance: 10.0,
            position: (0.0, 0.0),
        }
    }
}

struct Actions {
    forward: KeyCode,
    back: KeyCode,
    left: KeyCode,
    right: KeyCode,
}

fn first_key(seq: &KeySequence) -> KeyCode {
    seq.chords().first().map_or(KeyCode::UNKNOWN, |c| c.key)
}

struct App {
    window: Option<Arc<Window>>,
    translator: WinitInput,
    input: Dispatcher,
    config: IniConfig,
    camera_ctx: ContextHandle,
    _console_ctx: ContextHandle,
    camera: Rc<RefCell<Camera>>,
    actions: Actions,
    look_requested: Rc<Cell<bool>>,
}

impl App {
    fn new(config: IniConfig) -> Self {
        let mut input = Dispatcher::default();
        let loaded = input.load_key_bindings(&config);
        log::info!("{loaded} key bindings read from {BINDINGS_FILE}");

        let toggle_look = input.key_binding_or_insert("View.ToggleLook", KeyCode::ESCAPE.into());
        let toggle_console = input.key_binding_or_insert("Console.Toggle", KeyCode::GRAVE.into());
        let actions = Actions {
            forward: first_key(&input.key_binding_or_insert("Camera.Forward", KeyCode::W.into())),
            back: first_key(&input.key_binding_or_insert("Camera.Back", KeyCode::S.into())),
            left: first_key(&input.key_binding_or_insert("Camera.Left", KeyCode::A.into())),
            right: first_key(&input.key_binding_or_insert("Camera.Right", KeyCode::D.into())),
        };

        let look_requested = Rc::new(Cell::new(false));
        let look_mode = Rc::new(Cell::new(false));
        {
            let requested = look_requested.clone();
            let look_mode = look_mode.clone();
            input.top_level_mut().on_key_sequence(toggle_look, move |e| {
                if e.is_pressed() {
                    requested.set(true);
                    look_mode.set(!look_mode.get());
                }
                e.suppress();
            });
        }

        let console_ctx = input.register_context("Console", 200);
        if let Some(ctx) = input.context_mut(&console_ctx) {
            ctx.set_takes_keyboard_events_over_ui(true);
            let open = Rc::new(Cell::new(false));
            let o = open.clone();
            ctx.on_key_sequence(toggle_console, move |e| {
                if e.is_pressed() {
                    o.set(!o.get());
                    log::info!("console {}", if o.get() { "opened" } else { "closed" });
                }
                e.suppress();
            });
            ctx.on_key_pressed(move |e| {
                if open.get() {
                    if !e.text.is_empty() {
                        log::info!("console input {:?}", e.text);
                    }
                    e.suppress();
                }
            });
        }

        let camera = Rc::new(RefCell::new(Camera::default()));
        let camera_ctx = input.register_context("Camera", 100);
        if let Some(ctx) = input.context_mut(&camera_ctx) {
            let cam = camera.clone();
            let look = look_mode.clone();
            ctx.on_mouse_move(move |e| {
                if look.get() || e.is_right_button_down() {
                    let mut cam = cam.borrow_mut();
                    cam.yaw += e.relative_x as f32 * 0.2;
                    cam.pitch = (cam.pitch - e.relative_y as f32 * 0.2).clamp(-89.0, 89.0);
                    e.suppress();
                }
            });
            let cam = camera.clone();
            ctx.on_mouse_scroll(move |e| {
                let mut cam = cam.borrow_mut();
                cam.distance = (cam.distance - e.relative_z as f32 / 120.0).max(1.0);
                e.suppress();
            });
        }
        if let Err(e) = input.set_mouse_cursor_override(&camera_ctx, Some(CursorShape::OpenHand)) {
            log::warn!("{e}");
        }

        Self {
            window: None,
            translator: WinitInput::new(),
            input,
            config,
            camera_ctx,
            _console_ctx: console_ctx,
            camera,
            actions,
            look_requested,
        }
    }

    fn tick(&mut self) {
        self.input.update();

        if self.look_requested.replace(false) {
            let visible = self.input.is_mouse_cursor_visible();
            self.input.set_mouse_cursor_visible(!visible);
        }

        let Some(ctx) = self.input.context(&self.camera_ctx) else {
            return;
        };
        let axis = |pos: KeyCode, neg: KeyCode| {
            (ctx.is_key_down(pos) as i32 - ctx.is_key_down(neg) as i32) as f32
        };
        let forward = axis(self.actions.forward, self.actions.back);
        let strafe = axis(self.actions.right, self.actions.left);
        if forward != 0.0 || strafe != 0.0 {
            let mut cam = self.camera.borrow_mut();
            cam.position.0 += strafe * 0.1;
            cam.position.1 += forward * 0.1;
            log::debug!("camera {cam:?}");
        }
        if self.input.is_mouse_button_pressed(MouseButtons::RIGHT) {
            log::debug!("orbit from {:?}", self.input.mouse_pressed_pos(MouseButtons::RIGHT));
        }
    }

    fn save_bindings(&mut self) {
        self.input.save_key_bindings(&mut self.config);
        if let Err(e) = self.config.save(BINDINGS_FILE) {
            log::error!("{e}");
        }
    }
}

impl ApplicationHandler<()> for App {
    fn resumed(&mut self, el: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        match el.create_window(
            WindowAttributes::default()
                .with_title("keyroute demo")
                .with_inner_size(PhysicalSize::new(1280, 800)),
        ) {
            Ok(win) => {
                let w = Arc::new(win);
                let host = WinitHost::new(w.clone(), self.translator.shared_cursor());
                self.input.attach(Box::new(host));
                self.window = Some(w);
            }
            Err(e) => {
                log::error!("Failed to create window: {e:?}");
                el.exit();
            }
        }
    }

    fn window_event(&mut self, el: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let WindowEvent::CloseRequested = event {
            log::info!("Window close requested");
            self.input.dump_contexts();
            self.save_bindings();
            el.exit();
            return;
        }
        let Some(window) = self.window.clone() else {
            return;
        };
        if let Some(raw) = self.translator.translate(&window, &event, &NoUi) {
            let handled = self.input.handle_raw_event(raw);
            log::trace!("{event:?} handled={handled}");
        }
    }

    fn about_to_wait(&mut self, _el: &ActiveEventLoop) {
        self.tick();
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = if Path::new(BINDINGS_FILE).exists() {
        IniConfig::load(BINDINGS_FILE)?
    } else {
        IniConfig::new()
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    Ok(())
}

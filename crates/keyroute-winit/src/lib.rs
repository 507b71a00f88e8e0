//! winit host for keyroute.
//!
//! [`WinitInput`] turns `WindowEvent`s into [`keyroute_core::RawPlatformEvent`]s
//! and [`WinitHost`] gives the dispatcher control over the window cursor.
//!
//! ```rust,ignore
//! let input = WinitInput::new();
//! let host = WinitHost::new(window.clone(), input.shared_cursor());
//! dispatcher.attach(Box::new(host));
//!
//! // in ApplicationHandler::window_event
//! if let Some(raw) = input.translate(&window, &event, &NoUi) {
//!     dispatcher.handle_raw_event(raw);
//! }
//! ```

pub mod host;
pub mod keymap;
pub mod translate;

pub use host::{NoUi, SharedCursor, UiProbe, WinitHost};
pub use translate::{ClickTracker, TouchTracker, WinitInput};

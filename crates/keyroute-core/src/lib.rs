//! # Input routing
//!
//! A [`Dispatcher`] owns a list of named [`InputContext`]s sorted by
//! descending priority, plus one permanent top-level context that always runs
//! first. The host translates every platform notification into a
//! [`RawPlatformEvent`] and hands it to [`Dispatcher::handle_raw_event`]; the
//! return value says whether the host should still do its own processing.
//!
//! ```rust
//! use keyroute_core::*;
//!
//! let mut input = Dispatcher::default();
//! let camera = input.register_context("Camera", 100);
//!
//! if let Some(ctx) = input.context_mut(&camera) {
//!     ctx.on_key_pressed(|e| {
//!         if e.key_code == KeyCode::W {
//!             e.suppress();
//!         }
//!     });
//! }
//!
//! input.handle_raw_event(RawPlatformEvent::KeyPress {
//!     key: KeyCode::W,
//!     modifiers: Modifiers::empty(),
//!     auto_repeat: false,
//!     text: "w".into(),
//! });
//! input.update();
//! assert!(input.context(&camera).is_some_and(|c| c.is_key_pressed(KeyCode::W)));
//! ```
//!
//! ## Lifetime
//!
//! [`Dispatcher::register_context`] returns a [`ContextHandle`]. The context
//! stays registered while any clone of the handle is alive; once the last
//! clone is dropped it stops receiving input and is removed on the next
//! [`Dispatcher::update`].
//!
//! ## Propagation
//!
//! - Keys visit every context. After a context handles a key the event is
//!   rewritten to `Released` for everyone below it. Presses skip contexts
//!   while a UI widget has keyboard focus, unless they opted in.
//! - Mouse events stop at the first context that handles them, and skip
//!   contexts while a UI element is under the pointer, unless they opted in.
//! - With the cursor hidden every key and mouse event comes back handled, so
//!   the UI never sees it.
//!
//! ## Polling
//!
//! Pressed/released state is double buffered and committed by
//! [`Dispatcher::update`], so a press is reported for exactly one tick.

pub mod bindings;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod host;
pub mod keys;
pub mod raw;
pub mod registry;


pub use bindings::KeyBindings;
pub use config::{ConfigStore, DispatcherConfig, IniConfig};
pub use context::{HandlerId, HeldKeyState, InputContext};
pub use dispatcher::Dispatcher;
pub use error::{InputError, ParseKeySequenceError};
pub use event::*;
pub use host::{CursorShape, InputHost};
pub use keys::{KeyChord, KeyCode, KeySequence, Modifiers};
pub use raw::{MouseAction, PointerState, RawPlatformEvent};
pub use registry::{ContextHandle, ContextId};

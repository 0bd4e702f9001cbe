//! Input subsystem.
//!
//! Keyboard state is tracked from platform events and polled once per frame.
//! The only binding is `Escape → Close`; every other key is tracked but
//! ignored.

mod bindings;
mod platform;
mod state;
mod types;

pub use bindings::{process_input, Action};
pub use platform::translate_window_event;
pub use state::InputState;
pub use types::{InputEvent, Key, KeyState};

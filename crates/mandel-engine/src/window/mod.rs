//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the single window, and wires them to the
//! GPU layer, the input poller and the application hooks.

mod error;
mod runtime;

pub use error::InitError;
pub use runtime::{Runtime, RuntimeConfig};

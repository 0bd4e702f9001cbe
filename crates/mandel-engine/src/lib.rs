//! Mandel engine crate.
//!
//! Window runtime, GPU device and the shader program lifecycle used by the
//! viewer binary.

pub mod device;
pub mod window;
pub mod input;
pub mod core;

pub mod logging;
pub mod render;
pub mod shader;

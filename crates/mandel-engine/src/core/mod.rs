//! Core engine-facing contracts.
//!
//! The interface between the runtime (platform loop) and the application:
//! lifecycle hooks plus a per-frame context that hides surface acquisition
//! and presentation.

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;

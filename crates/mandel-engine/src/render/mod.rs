//! GPU rendering subsystem.
//!
//! Convention:
//! - geometry is given directly in clip space ([-1, 1] on both axes)
//! - each drawable owns its GPU buffers and releases them on drop

mod ctx;
mod mesh;

pub use ctx::{RenderCtx, RenderTarget};
pub use mesh::{QuadMesh, QuadVertex, QUAD_INDICES, QUAD_VERTICES};

//! Shader program lifecycle.
//!
//! A program is built from two GLSL source texts (vertex + fragment):
//!
//! 1. `source`  – read each file as text
//! 2. `compile` – parse and validate each stage into naga IR
//! 3. `link`    – check the stage interface, merge and reflect uniform blocks
//! 4. `program` – create the wgpu pipeline, uniform buffers and bind groups
//!
//! Steps 1–3 need no GPU and are available on their own through
//! [`ProgramBuild`]. Failures are logged and kept on the program unless
//! [`ShaderOptions::strict`] asks for them to be returned.

mod build;
mod compile;
mod error;
mod link;
mod options;
mod program;
mod reflect;
mod source;
mod uniform;

pub use build::ProgramBuild;
pub use compile::{compile_stage, CompiledStage};
pub use error::{ShaderError, Stage};
pub use link::{check_vertex_inputs, link, LinkedProgram};
pub use options::ShaderOptions;
pub use program::{ProgramTarget, ShaderProgram};
pub use reflect::{UniformBlock, UniformLayout, UniformMember, UniformType};
pub use source::load_source;
pub use uniform::UniformStorage;

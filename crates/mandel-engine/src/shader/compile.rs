use naga::front::glsl;
use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::{ShaderError, Stage};

// Shader features every wgpu device accepts. Anything beyond this (f64,
// push constants, clip distances...) is rejected here rather than by a
// particular device at pipeline creation.
const PORTABLE: Capabilities = Capabilities::empty();

/// One stage parsed and validated into naga IR.
///
/// Consumed by [`link`](super::link); never shared between programs.
#[derive(Debug)]
pub struct CompiledStage {
    stage: Stage,
    module: naga::Module,
}

impl CompiledStage {
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn module(&self) -> &naga::Module {
        &self.module
    }

    pub(crate) fn into_module(self) -> naga::Module {
        self.module
    }
}

/// Compiles GLSL `source` as `stage`.
///
/// Parse and validation failures both come back as `ShaderError::Compile`
/// carrying the full diagnostic text.
pub fn compile_stage(stage: Stage, source: &str) -> Result<CompiledStage, ShaderError> {
    let mut frontend = glsl::Frontend::default();
    let module = frontend
        .parse(&glsl::Options::from(stage.naga()), source)
        .map_err(|errors| ShaderError::Compile {
            stage,
            log: diagnostic(errors.emit_to_string(source), &errors),
        })?;

    Validator::new(ValidationFlags::all(), PORTABLE)
        .validate(&module)
        .map_err(|err| ShaderError::Compile {
            stage,
            log: diagnostic(err.emit_to_string(source), &err),
        })?;

    log::debug!("{stage} stage compiled");
    Ok(CompiledStage { stage, module })
}

/// Parses without validating, for exercising later stages on IR that
/// validation would have refused.
#[cfg(test)]
pub(crate) fn parse_unvalidated(stage: Stage, source: &str) -> CompiledStage {
    let module = glsl::Frontend::default()
        .parse(&glsl::Options::from(stage.naga()), source)
        .expect("fixture parses");
    CompiledStage { stage, module }
}

// Never hand back an empty log: fall back to the error's own message.
fn diagnostic(rendered: String, err: &dyn std::fmt::Display) -> String {
    if rendered.trim().is_empty() {
        err.to_string()
    } else {
        rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::fixtures;

    #[test]
    fn compiles_valid_stages() {
        let vs = compile_stage(Stage::Vertex, fixtures::VERTEX).unwrap();
        assert_eq!(vs.stage(), Stage::Vertex);
        assert_eq!(vs.module().entry_points.len(), 1);

        let fs = compile_stage(Stage::Fragment, fixtures::FRAGMENT).unwrap();
        assert_eq!(fs.stage(), Stage::Fragment);
    }

    #[test]
    fn syntax_error_names_fragment_stage() {
        let err = compile_stage(Stage::Fragment, fixtures::FRAGMENT_SYNTAX_ERROR).unwrap_err();
        match &err {
            ShaderError::Compile { stage, log } => {
                assert_eq!(*stage, Stage::Fragment);
                assert!(!log.trim().is_empty());
            }
            other => panic!("expected compile error, got {other:?}"),
        }
        assert!(err.to_string().starts_with("fragment shader failed to compile"));
    }

    #[test]
    fn features_beyond_the_portable_set_are_rejected() {
        let err = compile_stage(Stage::Fragment, fixtures::FRAGMENT_PUSH_CONSTANT).unwrap_err();
        assert!(matches!(err, ShaderError::Compile { stage: Stage::Fragment, .. }));
    }

    #[test]
    fn garbage_is_rejected_without_panicking() {
        let garbage = "#version 450\nthis is not glsl {";
        assert!(compile_stage(Stage::Fragment, garbage).is_err());
    }
}

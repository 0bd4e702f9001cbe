use std::path::Path;

use super::{ShaderError, Stage};

/// Reads a stage's source text verbatim.
///
/// No preprocessing or `#include` resolution; the text goes to the compiler
/// unmodified.
pub fn load_source(stage: Stage, path: impl AsRef<Path>) -> Result<String, ShaderError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| ShaderError::Io {
        stage,
        path: path.to_path_buf(),
        source,
    })?;

    log::debug!("read {stage} shader `{}` ({} bytes)", path.display(), text.len());
    Ok(text)
}

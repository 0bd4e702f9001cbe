use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a source text is compiled as.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub(crate) fn visibility(self) -> wgpu::ShaderStages {
        match self {
            Stage::Vertex => wgpu::ShaderStages::VERTEX,
            Stage::Fragment => wgpu::ShaderStages::FRAGMENT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure while turning two source texts into a linked program.
#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    /// A stage's source file could not be read.
    #[error("failed to read {stage} shader `{}`: {source}", path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The stage compiler rejected a source text.
    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: Stage, log: String },

    /// The two stages could not be linked into one program.
    #[error("shader program failed to link:\n{log}")]
    Link { log: String },
}

impl ShaderError {
    /// Stage the error belongs to, if it is stage-specific.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ShaderError::Io { stage, .. } | ShaderError::Compile { stage, .. } => Some(*stage),
            ShaderError::Link { .. } => None,
        }
    }

    /// Compiler or linker diagnostic text (empty for I/O errors).
    pub fn log(&self) -> &str {
        match self {
            ShaderError::Compile { log, .. } | ShaderError::Link { log } => log,
            ShaderError::Io { .. } => "",
        }
    }
}

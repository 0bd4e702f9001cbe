use std::path::Path;

use super::{compile_stage, link, load_source, LinkedProgram, ShaderError, ShaderOptions, Stage};

/// The GPU-independent half of program construction: read, compile, link.
///
/// In permissive mode every failure is logged and kept in `diagnostics`, and
/// the build finishes without a linked program. In strict mode the first
/// failure is returned instead.
#[derive(Debug)]
pub struct ProgramBuild {
    label: String,
    linked: Option<LinkedProgram>,
    diagnostics: Vec<ShaderError>,
}

impl ProgramBuild {
    /// Builds from two source files.
    pub fn from_files(
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        options: &ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let (vertex_path, fragment_path) = (vertex_path.as_ref(), fragment_path.as_ref());
        let mut report = Report::new(label_for(vertex_path, fragment_path), options);

        let vertex = report.check(load_source(Stage::Vertex, vertex_path))?;
        let fragment = report.check(load_source(Stage::Fragment, fragment_path))?;

        report.finish(vertex.as_deref(), fragment.as_deref())
    }

    /// Builds from two in-memory source texts.
    pub fn from_sources(
        label: impl Into<String>,
        vertex_source: &str,
        fragment_source: &str,
        options: &ShaderOptions,
    ) -> Result<Self, ShaderError> {
        Report::new(label.into(), options).finish(Some(vertex_source), Some(fragment_source))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_linked(&self) -> bool {
        self.linked.is_some()
    }

    pub fn linked(&self) -> Option<&LinkedProgram> {
        self.linked.as_ref()
    }

    /// Failures recorded during a permissive build, in the order they occurred.
    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }

    pub(crate) fn into_parts(self) -> (String, Option<LinkedProgram>, Vec<ShaderError>) {
        (self.label, self.linked, self.diagnostics)
    }
}

struct Report {
    label: String,
    strict: bool,
    diagnostics: Vec<ShaderError>,
}

impl Report {
    fn new(label: String, options: &ShaderOptions) -> Self {
        Self {
            label,
            strict: options.strict,
            diagnostics: Vec::new(),
        }
    }

    /// Passes a success through; records (or, strict, returns) a failure.
    fn check<T>(&mut self, result: Result<T, ShaderError>) -> Result<Option<T>, ShaderError> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) if self.strict => Err(err),
            Err(err) => {
                log::error!("shader program `{}`: {err}", self.label);
                self.diagnostics.push(err);
                Ok(None)
            }
        }
    }

    fn finish(
        mut self,
        vertex_source: Option<&str>,
        fragment_source: Option<&str>,
    ) -> Result<ProgramBuild, ShaderError> {
        let vertex = match vertex_source {
            Some(src) => self.check(compile_stage(Stage::Vertex, src))?,
            None => None,
        };
        let fragment = match fragment_source {
            Some(src) => self.check(compile_stage(Stage::Fragment, src))?,
            None => None,
        };

        // A missing stage still goes through "link" so the failure shows up
        // the same way a driver's linker would report it.
        let linked = match (vertex, fragment) {
            (Some(vs), Some(fs)) => self.check(link(vs, fs))?,
            (vs, fs) => {
                let missing: Vec<&str> = [(vs.is_none(), "vertex"), (fs.is_none(), "fragment")]
                    .into_iter()
                    .filter_map(|(gone, name)| gone.then_some(name))
                    .collect();
                let err = ShaderError::Link {
                    log: format!("no compiled {} stage to link", missing.join(" or ")),
                };
                self.check::<LinkedProgram>(Err(err))?
            }
        };

        if linked.is_some() {
            log::info!("shader program `{}` linked", self.label);
        }

        Ok(ProgramBuild {
            label: self.label,
            linked,
            diagnostics: self.diagnostics,
        })
    }
}

fn label_for(vertex_path: &Path, fragment_path: &Path) -> String {
    let stem = |p: &Path| {
        p.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| p.display().to_string())
    };
    format!("{}+{}", stem(vertex_path), stem(fragment_path))
}

use std::path::{Path, PathBuf};

/// One vertex/fragment pair shipped under `assets/`.
#[derive(Debug, Copy, Clone)]
pub struct ProgramSpec {
    pub name: &'static str,
    pub vertex: &'static str,
    pub fragment: &'static str,
}

impl ProgramSpec {
    pub fn vertex_path(&self, root: &Path) -> PathBuf {
        root.join(self.vertex)
    }

    pub fn fragment_path(&self, root: &Path) -> PathBuf {
        root.join(self.fragment)
    }
}

/// Every program built at startup. Only [`ACTIVE`] is drawn.
pub const PROGRAMS: &[ProgramSpec] = &[
    ProgramSpec {
        name: "core",
        vertex: "vertex_core.glsl",
        fragment: "fragment_core.glsl",
    },
    ProgramSpec {
        name: "mandel",
        vertex: "vertex_core.glsl",
        fragment: "fragment_mandel.glsl",
    },
];

pub const ACTIVE: &str = "mandel";

const ASSET_DIR: &str = "assets";

/// Environment variable naming the shader directory explicitly.
pub const ASSET_ENV: &str = "MANDEL_ASSETS";

/// Finds the shader directory at run time.
///
/// Looks at `$MANDEL_ASSETS`, then `assets/` under the working directory,
/// then `assets/` next to the executable.
pub fn asset_root() -> anyhow::Result<PathBuf> {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    let candidates = candidates(
        std::env::var_os(ASSET_ENV).map(PathBuf::from),
        std::env::current_dir().ok(),
        exe_dir,
    );

    match first_existing(&candidates) {
        Some(root) => Ok(root.clone()),
        None => {
            let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            anyhow::bail!("no shader asset directory found (tried: {})", tried.join(", "))
        }
    }
}

fn candidates(
    explicit: Option<PathBuf>,
    cwd: Option<PathBuf>,
    exe_dir: Option<PathBuf>,
) -> Vec<PathBuf> {
    explicit
        .into_iter()
        .chain(cwd.map(|dir| dir.join(ASSET_DIR)))
        .chain(exe_dir.map(|dir| dir.join(ASSET_DIR)))
        .collect()
}

fn first_existing(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates.iter().find(|dir| dir.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_assets() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join(ASSET_DIR)
    }

    #[test]
    fn active_program_is_in_catalogue() {
        assert!(PROGRAMS.iter().any(|p| p.name == ACTIVE));
    }

    #[test]
    fn shipped_sources_exist() {
        let root = source_assets();
        for spec in PROGRAMS {
            assert!(spec.vertex_path(&root).is_file(), "{}", spec.vertex);
            assert!(spec.fragment_path(&root).is_file(), "{}", spec.fragment);
        }
    }

    #[test]
    fn explicit_directory_is_tried_first() {
        let found = candidates(
            Some(PathBuf::from("/opt/shaders")),
            Some(PathBuf::from("/work")),
            Some(PathBuf::from("/usr/bin")),
        );
        assert_eq!(
            found,
            [
                PathBuf::from("/opt/shaders"),
                PathBuf::from("/work/assets"),
                PathBuf::from("/usr/bin/assets"),
            ]
        );
    }

    #[test]
    fn missing_directories_are_skipped() {
        let missing = std::env::temp_dir().join(format!("mandel-no-assets-{}", std::process::id()));
        let tried = [missing, source_assets()];
        assert_eq!(first_existing(&tried), Some(&source_assets()));
        assert_eq!(first_existing(&tried[..1]), None);
    }
}

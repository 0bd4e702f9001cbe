mod catalogue;

use std::path::PathBuf;

use anyhow::Context;
use glam::Mat4;

use mandel_engine::core::{App, AppControl, FrameCtx};
use mandel_engine::device::GpuInit;
use mandel_engine::logging::{init_logging, LoggingConfig};
use mandel_engine::render::{QuadMesh, QuadVertex, RenderCtx};
use mandel_engine::shader::{ProgramTarget, ShaderOptions, ShaderProgram};
use mandel_engine::window::{Runtime, RuntimeConfig};

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

fn main() {
    init_logging(LoggingConfig::default());

    let asset_root = match catalogue::asset_root() {
        Ok(root) => root,
        Err(e) => {
            log::error!("{e:#} (set {} to override)", catalogue::ASSET_ENV);
            std::process::exit(-1);
        }
    };

    let app = MandelApp::new(asset_root, ShaderOptions::default());

    if let Err(e) = Runtime::run(RuntimeConfig::default(), GpuInit::default(), app) {
        log::error!("{e}");
        std::process::exit(-1);
    }
}

/// GPU state that only exists while the window is open.
struct Scene {
    mesh: QuadMesh,
    programs: Vec<ShaderProgram>,
    active: usize,
}

struct MandelApp {
    asset_root: PathBuf,
    options: ShaderOptions,
    scene: Option<Scene>,
}

impl MandelApp {
    fn new(asset_root: PathBuf, options: ShaderOptions) -> Self {
        Self {
            asset_root,
            options,
            scene: None,
        }
    }
}

impl App for MandelApp {
    fn on_start(&mut self, ctx: &RenderCtx<'_>) -> anyhow::Result<()> {
        let mesh = QuadMesh::new(ctx.device);

        let vertex_buffers = [QuadVertex::layout()];
        let target = ProgramTarget {
            device: ctx.device,
            format: ctx.surface_format,
            vertex_buffers: &vertex_buffers,
        };

        let mut programs = Vec::with_capacity(catalogue::PROGRAMS.len());
        for spec in catalogue::PROGRAMS {
            let program = ShaderProgram::from_files(
                &target,
                spec.vertex_path(&self.asset_root),
                spec.fragment_path(&self.asset_root),
                &self.options,
            )
            .with_context(|| format!("building shader program `{}`", spec.name))?;
            programs.push(program);
        }

        let active = catalogue::PROGRAMS
            .iter()
            .position(|p| p.name == catalogue::ACTIVE)
            .context("active program missing from catalogue")?;

        log::info!(
            "{} shader program(s) built from {}, drawing `{}`",
            programs.len(),
            self.asset_root.display(),
            catalogue::ACTIVE
        );

        self.scene = Some(Scene {
            mesh,
            programs,
            active,
        });
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(scene) = self.scene.as_mut() else {
            return AppControl::Continue;
        };
        let Scene {
            mesh,
            programs,
            active,
        } = scene;
        let program = &mut programs[*active];

        ctx.render(CLEAR, |rctx, target| {
            let transform = Mat4::IDENTITY;
            program.set_mat4("transform", transform);

            let mut pass = target.load_pass("mandel quad");
            if program.activate(rctx.queue, &mut pass) {
                mesh.draw(&mut pass);
            }
        })
    }

    fn on_exit(&mut self) {
        self.scene = None;
    }
}

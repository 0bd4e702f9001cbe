use std::borrow::Cow;
use std::num::NonZeroU64;
use std::path::Path;

use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

use super::{
    check_vertex_inputs, LinkedProgram, ProgramBuild, ShaderError, ShaderOptions, UniformLayout,
    UniformStorage,
};

/// What a program is built against: device, color target format and the
/// vertex buffer layouts draws will bind.
pub struct ProgramTarget<'a> {
    pub device: &'a wgpu::Device,
    pub format: wgpu::TextureFormat,
    pub vertex_buffers: &'a [wgpu::VertexBufferLayout<'a>],
}

/// One linked vertex + fragment program.
///
/// Owns the render pipeline, one uniform buffer per uniform block, and the
/// bind groups tying them together. Everything is released on drop.
///
/// A program whose construction failed in permissive mode is *unlinked*:
/// activating it binds nothing and reports `false`, so draws issued after it
/// are skipped by the caller and the frame shows only the clear color.
pub struct ShaderProgram {
    label: String,
    gpu: Option<GpuProgram>,
    uniforms: UniformStorage,
    diagnostics: Vec<ShaderError>,
    warned_unlinked: bool,
}

struct GpuProgram {
    pipeline: wgpu::RenderPipeline,
    buffers: Vec<wgpu::Buffer>,
    bind_groups: Vec<wgpu::BindGroup>,
}

impl Drop for GpuProgram {
    fn drop(&mut self) {
        for buffer in &self.buffers {
            buffer.destroy();
        }
    }
}

impl ShaderProgram {
    /// Reads, compiles and links a vertex/fragment file pair.
    pub fn from_files(
        target: &ProgramTarget<'_>,
        vertex_path: impl AsRef<Path>,
        fragment_path: impl AsRef<Path>,
        options: &ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let build = ProgramBuild::from_files(vertex_path, fragment_path, options)?;
        Self::from_build(target, build, options)
    }

    /// Compiles and links two in-memory sources.
    pub fn from_sources(
        target: &ProgramTarget<'_>,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
        options: &ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let build = ProgramBuild::from_sources(label, vertex_source, fragment_source, options)?;
        Self::from_build(target, build, options)
    }

    /// Creates the GPU objects for a finished build.
    pub fn from_build(
        target: &ProgramTarget<'_>,
        build: ProgramBuild,
        options: &ShaderOptions,
    ) -> Result<Self, ShaderError> {
        let (label, linked, mut diagnostics) = build.into_parts();

        let Some(linked) = linked else {
            return Ok(Self::unlinked(label, diagnostics));
        };

        // Device-side failures are link failures too and follow the same
        // strict/permissive rule.
        let (gpu, uniforms) = match prepare(target, &label, linked) {
            Ok(parts) => parts,
            Err(err) if options.strict => return Err(err),
            Err(err) => {
                log::error!("shader program `{label}`: {err}");
                diagnostics.push(err);
                return Ok(Self::unlinked(label, diagnostics));
            }
        };

        log::debug!(
            "shader program `{label}` ready ({} uniform buffer(s))",
            gpu.buffers.len()
        );

        Ok(Self {
            label,
            gpu: Some(gpu),
            uniforms,
            diagnostics,
            warned_unlinked: false,
        })
    }

    fn unlinked(label: String, diagnostics: Vec<ShaderError>) -> Self {
        log::warn!("shader program `{label}` is unusable; draws with it will be skipped");
        Self {
            label,
            gpu: None,
            uniforms: UniformStorage::new(UniformLayout::default()),
            diagnostics,
            warned_unlinked: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_linked(&self) -> bool {
        self.gpu.is_some()
    }

    /// Failures recorded while building (permissive mode).
    pub fn diagnostics(&self) -> &[ShaderError] {
        &self.diagnostics
    }

    pub fn uniforms(&self) -> &UniformStorage {
        &self.uniforms
    }

    pub fn has_uniform(&self, name: &str) -> bool {
        self.uniforms.has(name)
    }

    /// Makes this program the one used by subsequent draws on `pass`.
    ///
    /// Uploads uniform blocks changed since the last activation, then binds
    /// the pipeline and its bind groups. Returns `false` for an unlinked
    /// program, warning once.
    pub fn activate(&mut self, queue: &wgpu::Queue, pass: &mut wgpu::RenderPass<'_>) -> bool {
        let Some(gpu) = self.gpu.as_ref() else {
            if !self.warned_unlinked {
                log::warn!("activate on unlinked shader program `{}`; nothing drawn", self.label);
                self.warned_unlinked = true;
            }
            return false;
        };

        for index in self.uniforms.take_dirty() {
            queue.write_buffer(&gpu.buffers[index], 0, self.uniforms.bytes(index));
        }

        pass.set_pipeline(&gpu.pipeline);
        for (group, bind_group) in gpu.bind_groups.iter().enumerate() {
            pass.set_bind_group(group as u32, bind_group, &[]);
        }
        true
    }

    /// Sets a `mat4` uniform. Unknown names are ignored.
    pub fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.uniforms.set_mat4(name, value);
    }

    pub fn set_f32(&mut self, name: &str, value: f32) {
        self.uniforms.set_f32(name, value);
    }

    pub fn set_i32(&mut self, name: &str, value: i32) {
        self.uniforms.set_i32(name, value);
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.uniforms.set_vec2(name, value);
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.uniforms.set_vec3(name, value);
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.uniforms.set_vec4(name, value);
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if self.gpu.is_some() {
            log::debug!("shader program `{}` released", self.label);
        }
    }
}

fn prepare(
    target: &ProgramTarget<'_>,
    label: &str,
    linked: LinkedProgram,
) -> Result<(GpuProgram, UniformStorage), ShaderError> {
    check_vertex_inputs(&linked, target.vertex_buffers)?;
    check_bind_group_limit(&linked, target.device)?;
    create_gpu_program(target, label, linked)
}

fn check_bind_group_limit(linked: &LinkedProgram, device: &wgpu::Device) -> Result<(), ShaderError> {
    let used = linked.uniforms().max_group().map_or(0, |g| g + 1);
    let allowed = device.limits().max_bind_groups;

    if used > allowed {
        return Err(ShaderError::Link {
            log: format!("uniform blocks need {used} bind groups; the device allows {allowed}"),
        });
    }
    Ok(())
}

/// Creates layouts, buffers, bind groups and the pipeline.
///
/// Runs inside validation and internal error scopes so wgpu rejections
/// surface as `ShaderError::Link` instead of reaching the device's
/// uncaptured-error handler.
fn create_gpu_program(
    target: &ProgramTarget<'_>,
    label: &str,
    linked: LinkedProgram,
) -> Result<(GpuProgram, UniformStorage), ShaderError> {
    let device = target.device;

    let internal_scope = device.push_error_scope(wgpu::ErrorFilter::Internal);
    let validation_scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let (vertex, fragment, layout) = linked.into_parts();
    let uniforms = UniformStorage::new(layout);
    let blocks = uniforms.layout().blocks();

    // Bind groups must be contiguous from 0; groups with no block stay empty.
    let group_count = uniforms.layout().max_group().map_or(0, |g| g + 1);

    let bind_group_layouts: Vec<wgpu::BindGroupLayout> = (0..group_count)
        .map(|group| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = blocks
                .iter()
                .enumerate()
                .filter(|(_, b)| b.group == group)
                .map(|(index, b)| wgpu::BindGroupLayoutEntry {
                    binding: b.binding,
                    visibility: b.visibility,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(uniforms.bytes(index).len() as u64),
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{label} bgl {group}")),
                entries: &entries,
            })
        })
        .collect();

    let buffers: Vec<wgpu::Buffer> = blocks
        .iter()
        .enumerate()
        .map(|(index, b)| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} ubo {}", b.name)),
                contents: uniforms.bytes(index),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            })
        })
        .collect();

    let bind_groups: Vec<wgpu::BindGroup> = bind_group_layouts
        .iter()
        .enumerate()
        .map(|(group, bgl)| {
            let entries: Vec<wgpu::BindGroupEntry> = blocks
                .iter()
                .zip(&buffers)
                .filter(|(b, _)| b.group == group as u32)
                .map(|(b, buffer)| wgpu::BindGroupEntry {
                    binding: b.binding,
                    resource: buffer.as_entire_binding(),
                })
                .collect();

            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("{label} bind group {group}")),
                layout: bgl,
                entries: &entries,
            })
        })
        .collect();

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} pipeline layout")),
        bind_group_layouts: &bind_group_layouts.iter().collect::<Vec<_>>(),
        immediate_size: 0,
    });

    // Stage modules only need to outlive pipeline creation.
    let vs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} vertex")),
        source: wgpu::ShaderSource::Naga(Cow::Owned(vertex)),
    });
    let fs_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} fragment")),
        source: wgpu::ShaderSource::Naga(Cow::Owned(fragment)),
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{label} pipeline")),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &vs_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            buffers: target.vertex_buffers,
        },

        fragment: Some(wgpu::FragmentState {
            module: &fs_module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: target.format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    let gpu = GpuProgram {
        pipeline,
        buffers,
        bind_groups,
    };

    // Scopes pop innermost first.
    let validation = pollster::block_on(validation_scope.pop());
    let internal = pollster::block_on(internal_scope.pop());

    match validation.or(internal) {
        Some(err) => Err(ShaderError::Link {
            log: format!("rejected by the device: {err}"),
        }),
        None => Ok((gpu, uniforms)),
    }
}

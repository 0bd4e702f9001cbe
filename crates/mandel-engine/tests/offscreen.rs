//! GPU round trips against an offscreen texture.
//!
//! Each test returns early when no wgpu adapter is available (headless CI).

use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use glam::Mat4;

use mandel_engine::render::{QuadMesh, QuadVertex, RenderTarget};
use mandel_engine::shader::{ProgramTarget, ShaderError, ShaderOptions, ShaderProgram};

const SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
const BYTES_PER_ROW: u32 = SIZE * 4;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.1,
    g: 0.3,
    b: 0.3,
    a: 1.0,
};

fn gpu() -> Option<(wgpu::Device, wgpu::Queue)> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("offscreen test device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
        experimental_features: wgpu::ExperimentalFeatures::disabled(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: wgpu::Trace::Off,
    }))
    .ok()
}

fn asset(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../mandel-viewer/assets")
        .join(name)
}

fn color_texture(device: &wgpu::Device) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("offscreen color"),
        size: wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Clears, draws the quad with `program`, and reads the pixels back.
fn render(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    program: &mut ShaderProgram,
    mesh: &QuadMesh,
) -> Vec<u8> {
    let texture = color_texture(device);
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let readback = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("offscreen readback"),
        size: (BYTES_PER_ROW * SIZE) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("offscreen encoder"),
    });

    {
        let mut target = RenderTarget::new(&mut encoder, &view);
        let mut pass = target.clear_pass("offscreen quad", CLEAR);
        program.set_mat4("transform", Mat4::IDENTITY);
        if program.activate(queue, &mut pass) {
            mesh.draw(&mut pass);
        }
    }

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(BYTES_PER_ROW),
                rows_per_image: Some(SIZE),
            },
        },
        wgpu::Extent3d {
            width: SIZE,
            height: SIZE,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let (tx, rx) = mpsc::channel();
    readback
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });

    let deadline = Instant::now() + Duration::from_secs(30);
    let mapped = loop {
        let _ = device.poll(wgpu::PollType::Poll);
        if let Ok(r) = rx.try_recv() {
            break r;
        }
        assert!(Instant::now() < deadline, "readback timed out");
        std::thread::sleep(Duration::from_millis(1));
    };
    mapped.expect("map readback buffer");

    let pixels = readback.slice(..).get_mapped_range().to_vec();
    readback.unmap();
    pixels
}

fn pixel(pixels: &[u8], x: u32, y: u32) -> [u8; 4] {
    let i = (y * BYTES_PER_ROW + x * 4) as usize;
    [pixels[i], pixels[i + 1], pixels[i + 2], pixels[i + 3]]
}

#[test]
fn mandelbrot_render_is_reproducible() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no wgpu adapter; skipping");
        return;
    };

    let buffers = [QuadVertex::layout()];
    let target = ProgramTarget {
        device: &device,
        format: FORMAT,
        vertex_buffers: &buffers,
    };

    let mut program = ShaderProgram::from_files(
        &target,
        asset("vertex_core.glsl"),
        asset("fragment_mandel.glsl"),
        &ShaderOptions::strict(),
    )
    .expect("mandel program builds");
    assert!(program.is_linked());
    assert!(program.has_uniform("transform"));

    let mesh = QuadMesh::new(&device);

    let first = render(&device, &queue, &mut program, &mesh);
    let second = render(&device, &queue, &mut program, &mesh);
    assert_eq!(first, second);

    // Centre maps into the main cardioid; the corner escapes almost at once.
    let centre = pixel(&first, SIZE / 2, SIZE / 2);
    let corner = pixel(&first, 0, 0);
    assert_eq!(centre, [0, 0, 0, 255]);
    assert_ne!(corner, centre);

    assert!(!is_clear_color(corner), "{corner:?}");
    let cleared = pixel(&render_cleared(&device, &queue, &mesh), 0, 0);
    assert!(is_clear_color(cleared), "{cleared:?}");
}

/// Renders with an unlinked program: only the clear color survives.
fn render_cleared(device: &wgpu::Device, queue: &wgpu::Queue, mesh: &QuadMesh) -> Vec<u8> {
    let buffers = [QuadVertex::layout()];
    let target = ProgramTarget {
        device,
        format: FORMAT,
        vertex_buffers: &buffers,
    };
    let mut broken = ShaderProgram::from_sources(
        &target,
        "broken",
        "#version 450\nvoid main( {",
        "#version 450\nvoid main( {",
        &ShaderOptions::permissive(),
    )
    .expect("permissive build never fails");
    render(device, queue, &mut broken, mesh)
}

#[test]
fn unlinked_program_draws_nothing() {
    let Some((device, queue)) = gpu() else {
        eprintln!("no wgpu adapter; skipping");
        return;
    };

    let buffers = [QuadVertex::layout()];
    let target = ProgramTarget {
        device: &device,
        format: FORMAT,
        vertex_buffers: &buffers,
    };

    let mut program = ShaderProgram::from_files(
        &target,
        asset("vertex_core.glsl"),
        asset("does_not_exist.glsl"),
        &ShaderOptions::default(),
    )
    .expect("permissive build never fails");

    assert!(!program.is_linked());
    assert!(!program.has_uniform("transform"));
    assert!(matches!(program.diagnostics()[0], ShaderError::Io { .. }));

    // Setting on an unlinked program is a no-op.
    program.set_mat4("transform", Mat4::IDENTITY);

    let mesh = QuadMesh::new(&device);
    let pixels = render(&device, &queue, &mut program, &mesh);

    let first = pixel(&pixels, 0, 0);
    assert!(is_clear_color(first), "{first:?}");
    for y in [0, SIZE / 2, SIZE - 1] {
        for x in [0, SIZE / 2, SIZE - 1] {
            assert_eq!(pixel(&pixels, x, y), first, "({x}, {y})");
        }
    }
}

/// Unorm rounding of 0.1 and 0.3 may land on either side.
fn is_clear_color([r, g, b, a]: [u8; 4]) -> bool {
    (25..=26).contains(&r) && (76..=77).contains(&g) && (76..=77).contains(&b) && a == 255
}

#[test]
fn missing_vertex_buffer_is_a_link_error() {
    let Some((device, _queue)) = gpu() else {
        eprintln!("no wgpu adapter; skipping");
        return;
    };

    let target = ProgramTarget {
        device: &device,
        format: FORMAT,
        vertex_buffers: &[],
    };

    let strict = ShaderProgram::from_files(
        &target,
        asset("vertex_core.glsl"),
        asset("fragment_core.glsl"),
        &ShaderOptions::strict(),
    );
    assert!(matches!(strict, Err(ShaderError::Link { .. })));

    let permissive = ShaderProgram::from_files(
        &target,
        asset("vertex_core.glsl"),
        asset("fragment_core.glsl"),
        &ShaderOptions::permissive(),
    )
    .expect("permissive build never fails");
    assert!(!permissive.is_linked());
    assert_eq!(permissive.diagnostics().len(), 1);
}

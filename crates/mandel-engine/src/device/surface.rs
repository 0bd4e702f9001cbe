use winit::dpi::PhysicalSize;

use super::SurfaceErrorAction;

/// What a resize request has to do to the surface.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResizePlan {
    /// Same size as the current one; nothing to do.
    Unchanged,
    /// Zero-area size (minimized); record it and configure later.
    Defer,
    /// Reconfigure the surface at the new size.
    Reconfigure,
}

/// Decides how to apply a resize from `current` to `requested`.
///
/// Repeating a request with the size already applied is a no-op, so issuing
/// the same resize twice leaves the surface exactly as issuing it once.
pub fn plan_resize(current: PhysicalSize<u32>, requested: PhysicalSize<u32>) -> ResizePlan {
    if requested == current {
        ResizePlan::Unchanged
    } else if requested.width == 0 || requested.height == 0 {
        ResizePlan::Defer
    } else {
        ResizePlan::Reconfigure
    }
}

pub(crate) fn choose_surface_format(
    caps: &wgpu::SurfaceCapabilities,
    prefer_srgb: bool,
) -> Option<wgpu::TextureFormat> {
    if caps.formats.is_empty() {
        return None;
    }

    let wanted = |f: &wgpu::TextureFormat| f.is_srgb() == prefer_srgb;
    caps.formats
        .iter()
        .copied()
        .find(wanted)
        .or_else(|| caps.formats.first().copied())
}

pub(crate) fn choose_alpha_mode(
    caps: &wgpu::SurfaceCapabilities,
    requested: Option<wgpu::CompositeAlphaMode>,
) -> wgpu::CompositeAlphaMode {
    requested
        .filter(|m| caps.alpha_modes.contains(m))
        .or_else(|| caps.alpha_modes.first().copied())
        .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

/// Applies a resize; returns `true` when the surface was reconfigured.
pub(crate) fn apply_resize(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &mut wgpu::SurfaceConfiguration,
    size: &mut PhysicalSize<u32>,
    new_size: PhysicalSize<u32>,
) -> bool {
    match plan_resize(*size, new_size) {
        ResizePlan::Unchanged => false,
        ResizePlan::Defer => {
            *size = new_size;
            false
        }
        ResizePlan::Reconfigure => {
            *size = new_size;
            config.width = new_size.width;
            config.height = new_size.height;
            surface.configure(device, config);
            log::debug!("surface resized to {}x{}", new_size.width, new_size.height);
            true
        }
    }
}

pub(crate) fn map_surface_error(
    surface: &wgpu::Surface,
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
    size: PhysicalSize<u32>,
    err: wgpu::SurfaceError,
) -> SurfaceErrorAction {
    match err {
        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
            if size.width > 0 && size.height > 0 {
                surface.configure(device, config);
            }
            SurfaceErrorAction::Reconfigured
        }
        wgpu::SurfaceError::OutOfMemory => SurfaceErrorAction::Fatal,
        wgpu::SurfaceError::Timeout => SurfaceErrorAction::SkipFrame,
        wgpu::SurfaceError::Other => SurfaceErrorAction::SkipFrame,
    }
}

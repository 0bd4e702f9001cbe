use glam::{Mat4, Vec2, Vec3, Vec4};

use super::{UniformLayout, UniformType};

// Uniform buffer bindings are sized in 16-byte steps (std140 struct rounding).
const BLOCK_ALIGN: usize = 16;

/// CPU copy of a program's uniform blocks.
///
/// Setters write into the copy and mark the block dirty; dirty blocks are
/// uploaded when the program is next activated. A name that does not resolve,
/// or resolves to a member of another type, is ignored.
#[derive(Debug, Clone)]
pub struct UniformStorage {
    layout: UniformLayout,
    data: Vec<Vec<u8>>,
    dirty: Vec<bool>,
}

impl UniformStorage {
    /// Zero-initialized storage; every block starts dirty so the first
    /// activation uploads a defined value.
    pub fn new(layout: UniformLayout) -> Self {
        let data: Vec<Vec<u8>> = layout
            .blocks()
            .iter()
            .map(|b| vec![0u8; (b.size as usize).next_multiple_of(BLOCK_ALIGN).max(BLOCK_ALIGN)])
            .collect();
        let dirty = vec![true; data.len()];

        Self { layout, data, dirty }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn has(&self, name: &str) -> bool {
        self.layout.find(name).is_some()
    }

    /// Current bytes of block `index`.
    pub fn bytes(&self, index: usize) -> &[u8] {
        &self.data[index]
    }

    pub fn is_dirty(&self, index: usize) -> bool {
        self.dirty.get(index).copied().unwrap_or(false)
    }

    /// Returns the dirty block indices and clears their flags.
    pub fn take_dirty(&mut self) -> Vec<usize> {
        let indices = self
            .dirty
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.then_some(i))
            .collect();
        self.dirty.iter_mut().for_each(|d| *d = false);
        indices
    }

    pub fn set_f32(&mut self, name: &str, value: f32) -> bool {
        self.write(name, UniformType::Float, bytemuck::bytes_of(&value))
    }

    pub fn set_i32(&mut self, name: &str, value: i32) -> bool {
        self.write(name, UniformType::Int, bytemuck::bytes_of(&value))
    }

    pub fn set_vec2(&mut self, name: &str, value: Vec2) -> bool {
        self.write(name, UniformType::Vec2, bytemuck::cast_slice(&value.to_array()))
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> bool {
        self.write(name, UniformType::Vec3, bytemuck::cast_slice(&value.to_array()))
    }

    pub fn set_vec4(&mut self, name: &str, value: Vec4) -> bool {
        self.write(name, UniformType::Vec4, bytemuck::cast_slice(&value.to_array()))
    }

    /// Writes a 4x4 matrix in column-major order.
    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        self.write(name, UniformType::Mat4, bytemuck::cast_slice(&value.to_cols_array()))
    }

    fn write(&mut self, name: &str, ty: UniformType, bytes: &[u8]) -> bool {
        let Some((index, member)) = self.layout.find(name) else {
            log::trace!("uniform `{name}` not found; ignored");
            return false;
        };

        if member.ty != ty {
            log::trace!("uniform `{name}` is {:?}, not {ty:?}; ignored", member.ty);
            return false;
        }

        let start = member.offset as usize;
        let Some(dst) = self.data[index].get_mut(start..start + bytes.len()) else {
            log::trace!("uniform `{name}` lies outside its block; ignored");
            return false;
        };

        if dst != bytes {
            dst.copy_from_slice(bytes);
            self.dirty[index] = true;
        }
        true
    }
}

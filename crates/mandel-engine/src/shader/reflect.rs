use naga::{AddressSpace, Scalar, TypeInner, VectorSize};

use super::{CompiledStage, Stage};

/// Value kinds the typed uniform setters can write.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformType {
    Float,
    Int,
    UInt,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
    /// Anything else (arrays, nested structs, non-square matrices...).
    Other,
}

impl UniformType {
    fn classify(inner: &TypeInner) -> Self {
        match *inner {
            TypeInner::Scalar(s) if s == Scalar::F32 => UniformType::Float,
            TypeInner::Scalar(s) if s == Scalar::I32 => UniformType::Int,
            TypeInner::Scalar(s) if s == Scalar::U32 => UniformType::UInt,
            TypeInner::Vector { size, scalar } if scalar == Scalar::F32 => match size {
                VectorSize::Bi => UniformType::Vec2,
                VectorSize::Tri => UniformType::Vec3,
                VectorSize::Quad => UniformType::Vec4,
            },
            TypeInner::Matrix {
                columns: VectorSize::Quad,
                rows: VectorSize::Quad,
                scalar,
            } if scalar == Scalar::F32 => UniformType::Mat4,
            _ => UniformType::Other,
        }
    }
}

/// One named member of a uniform block.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformMember {
    pub name: String,
    /// Byte offset inside the block.
    pub offset: u32,
    pub ty: UniformType,
}

/// A uniform block as declared by the stages of one program.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformBlock {
    pub name: String,
    pub group: u32,
    pub binding: u32,
    /// Block size in bytes.
    pub size: u32,
    /// Stages that declare the block.
    pub visibility: wgpu::ShaderStages,
    pub members: Vec<UniformMember>,
}

impl UniformBlock {
    fn same_layout(&self, other: &UniformBlock) -> bool {
        self.size == other.size && self.members == other.members
    }
}

/// Uniform blocks of a linked program, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformLayout {
    blocks: Vec<UniformBlock>,
}

impl UniformLayout {
    pub fn blocks(&self) -> &[UniformBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Resolves a member name to `(block index, member)`.
    ///
    /// Names are looked up across all blocks; the first declaration wins.
    pub fn find(&self, name: &str) -> Option<(usize, &UniformMember)> {
        self.blocks.iter().enumerate().find_map(|(i, block)| {
            block
                .members
                .iter()
                .find(|m| m.name == name)
                .map(|m| (i, m))
        })
    }

    /// Highest bind group index used, if any block exists.
    pub fn max_group(&self) -> Option<u32> {
        self.blocks.iter().map(|b| b.group).max()
    }

    /// Adds a stage's block, merging with an identical declaration at the
    /// same group/binding.
    pub(crate) fn merge(&mut self, block: UniformBlock) -> Result<(), String> {
        let existing = self
            .blocks
            .iter_mut()
            .find(|b| b.group == block.group && b.binding == block.binding);

        match existing {
            Some(b) if b.same_layout(&block) => {
                b.visibility |= block.visibility;
                Ok(())
            }
            Some(b) => Err(format!(
                "uniform block `{}` (set {}, binding {}) is declared differently across stages",
                b.name, b.group, b.binding
            )),
            None => {
                for m in &block.members {
                    if self.find(&m.name).is_some() {
                        log::warn!(
                            "uniform `{}` declared in more than one block; `{}` shadows it",
                            m.name,
                            block.name
                        );
                    }
                }
                self.blocks.push(block);
                Ok(())
            }
        }
    }
}

/// Collects the uniform blocks a stage declares.
///
/// Resources other than uniform blocks are reported into `problems`.
pub(crate) fn reflect_stage(stage: &CompiledStage, problems: &mut Vec<String>) -> Vec<UniformBlock> {
    let module = stage.module();
    let kind: Stage = stage.stage();
    let mut blocks = Vec::new();

    for (_, var) in module.global_variables.iter() {
        let ty = &module.types[var.ty];
        let name = var
            .name
            .clone()
            .or_else(|| ty.name.clone())
            .unwrap_or_else(|| "<unnamed>".to_string());

        match var.space {
            AddressSpace::Uniform => {}
            AddressSpace::Handle | AddressSpace::Storage { .. } | AddressSpace::Immediate => {
                problems.push(format!(
                    "{kind} stage: resource `{name}` is not a uniform block; only uniform blocks are supported"
                ));
                continue;
            }
            _ => continue,
        }

        let Some(binding) = var.binding.as_ref() else {
            problems.push(format!("{kind} stage: uniform block `{name}` has no binding"));
            continue;
        };

        let (size, members) = match &ty.inner {
            TypeInner::Struct { members, span } => {
                let members = members
                    .iter()
                    .filter_map(|m| {
                        Some(UniformMember {
                            name: m.name.clone()?,
                            offset: m.offset,
                            ty: UniformType::classify(&module.types[m.ty].inner),
                        })
                    })
                    .collect();
                (*span, members)
            }
            other => {
                let member = UniformMember {
                    name: name.clone(),
                    offset: 0,
                    ty: UniformType::classify(other),
                };
                (other.size(module.to_ctx()), vec![member])
            }
        };

        blocks.push(UniformBlock {
            name,
            group: binding.group,
            binding: binding.binding,
            size,
            visibility: kind.visibility(),
            members,
        });
    }

    blocks
}

use naga::{Binding, Handle, Module, Type, TypeInner};

use super::reflect::reflect_stage;
use super::{CompiledStage, ShaderError, Stage, UniformLayout};

/// Two compiled stages checked against each other, with their merged
/// uniform layout.
///
/// The stage modules are handed to the GPU when the pipeline is created and
/// dropped afterwards.
#[derive(Debug)]
pub struct LinkedProgram {
    vertex: Module,
    fragment: Module,
    uniforms: UniformLayout,
    vertex_inputs: Vec<u32>,
}

impl LinkedProgram {
    pub fn uniforms(&self) -> &UniformLayout {
        &self.uniforms
    }

    /// Attribute locations the vertex stage reads.
    pub fn vertex_inputs(&self) -> &[u32] {
        &self.vertex_inputs
    }

    pub(crate) fn into_parts(self) -> (Module, Module, UniformLayout) {
        (self.vertex, self.fragment, self.uniforms)
    }
}

/// Links a vertex and a fragment stage.
///
/// Consumes both stages whatever the outcome. All problems found are
/// reported together in one `ShaderError::Link`.
pub fn link(vertex: CompiledStage, fragment: CompiledStage) -> Result<LinkedProgram, ShaderError> {
    let mut problems = Vec::new();

    if vertex.stage() != Stage::Vertex || fragment.stage() != Stage::Fragment {
        return Err(ShaderError::Link {
            log: format!(
                "expected a vertex and a fragment stage, got {} and {}",
                vertex.stage(),
                fragment.stage()
            ),
        });
    }

    let mut uniforms = UniformLayout::default();
    for stage in [&vertex, &fragment] {
        for block in reflect_stage(stage, &mut problems) {
            if let Err(msg) = uniforms.merge(block) {
                problems.push(msg);
            }
        }
    }

    let vs = vertex.into_module();
    let fs = fragment.into_module();

    let mut vertex_inputs = Vec::new();
    match (entry_point(&vs, Stage::Vertex), entry_point(&fs, Stage::Fragment)) {
        (Some(vs_ep), Some(fs_ep)) => {
            let mut outputs = Vec::new();
            if let Some(result) = &vs_ep.function.result {
                collect_locations(&vs, result.ty, result.binding.as_ref(), &mut outputs);
            }

            let mut inputs = Vec::new();
            for arg in &fs_ep.function.arguments {
                collect_locations(&fs, arg.ty, arg.binding.as_ref(), &mut inputs);
            }

            check_interface(&outputs, &inputs, &mut problems);

            let mut attributes = Vec::new();
            for arg in &vs_ep.function.arguments {
                collect_locations(&vs, arg.ty, arg.binding.as_ref(), &mut attributes);
            }
            vertex_inputs = attributes.into_iter().map(|(location, _)| location).collect();
            vertex_inputs.sort_unstable();
        }
        (vs_ep, fs_ep) => {
            if vs_ep.is_none() {
                problems.push("vertex stage has no entry point".to_string());
            }
            if fs_ep.is_none() {
                problems.push("fragment stage has no entry point".to_string());
            }
        }
    }

    if !problems.is_empty() {
        return Err(ShaderError::Link {
            log: problems.join("\n"),
        });
    }

    log::debug!(
        "program linked: {} uniform block(s), vertex inputs {:?}",
        uniforms.blocks().len(),
        vertex_inputs
    );

    Ok(LinkedProgram {
        vertex: vs,
        fragment: fs,
        uniforms,
        vertex_inputs,
    })
}

/// Checks that every attribute the vertex stage reads is supplied by one of
/// `buffers`.
pub fn check_vertex_inputs(
    linked: &LinkedProgram,
    buffers: &[wgpu::VertexBufferLayout<'_>],
) -> Result<(), ShaderError> {
    let supplied: Vec<u32> = buffers
        .iter()
        .flat_map(|b| b.attributes.iter().map(|a| a.shader_location))
        .collect();

    let missing: Vec<String> = linked
        .vertex_inputs
        .iter()
        .filter(|loc| !supplied.contains(loc))
        .map(|loc| format!("vertex input at location {loc} is not supplied by any vertex buffer"))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ShaderError::Link {
            log: missing.join("\n"),
        })
    }
}

fn entry_point(module: &Module, stage: Stage) -> Option<&naga::EntryPoint> {
    let want = stage.naga();
    module.entry_points.iter().find(|ep| ep.stage == want)
}

fn collect_locations(
    module: &Module,
    ty: Handle<Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, TypeInner)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            out.push((*location, module.types[ty].inner.clone()));
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn check_interface(
    outputs: &[(u32, TypeInner)],
    inputs: &[(u32, TypeInner)],
    problems: &mut Vec<String>,
) {
    for (location, wanted) in inputs {
        match outputs.iter().find(|(l, _)| l == location) {
            None => problems.push(format!(
                "fragment input at location {location} is not written by the vertex stage"
            )),
            Some((_, written)) if written != wanted => problems.push(format!(
                "type mismatch at location {location}: vertex writes {written:?}, fragment reads {wanted:?}"
            )),
            Some(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::QuadVertex;
    use crate::shader::{compile_stage, fixtures, UniformType};

    fn try_link(vs: &str, fs: &str) -> Result<LinkedProgram, ShaderError> {
        link(
            compile_stage(Stage::Vertex, vs).unwrap(),
            compile_stage(Stage::Fragment, fs).unwrap(),
        )
    }

    fn link_log(vs: &str, fs: &str) -> String {
        match try_link(vs, fs) {
            Err(ShaderError::Link { log }) => log,
            other => panic!("expected link error, got {other:?}"),
        }
    }

    #[test]
    fn links_matching_pair() {
        let linked = try_link(fixtures::VERTEX, fixtures::FRAGMENT).unwrap();
        assert_eq!(linked.vertex_inputs(), &[0, 1]);

        let (_, member) = linked.uniforms().find("transform").unwrap();
        assert_eq!(member.ty, UniformType::Mat4);
    }

    #[test]
    fn merges_blocks_from_both_stages() {
        let linked = try_link(fixtures::VERTEX, fixtures::FRAGMENT_WITH_PARAMS).unwrap();
        let blocks = linked.uniforms().blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].visibility, wgpu::ShaderStages::VERTEX);
        assert_eq!(blocks[1].visibility, wgpu::ShaderStages::FRAGMENT);
        assert!(linked.uniforms().find("scale").is_some());
    }

    #[test]
    fn shared_block_is_visible_to_both_stages() {
        let linked = try_link(fixtures::VERTEX, fixtures::FRAGMENT_SHARED_BLOCK).unwrap();
        let blocks = linked.uniforms().blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].visibility, wgpu::ShaderStages::VERTEX_FRAGMENT);
    }

    #[test]
    fn unwritten_fragment_input_fails() {
        let log = link_log(fixtures::VERTEX, fixtures::FRAGMENT_UNMATCHED_INPUT);
        assert!(log.contains("location 3"), "{log}");
    }

    #[test]
    fn mistyped_fragment_input_fails() {
        let log = link_log(fixtures::VERTEX, fixtures::FRAGMENT_MISTYPED_INPUT);
        assert!(log.contains("type mismatch at location 0"), "{log}");
    }

    #[test]
    fn conflicting_blocks_fail() {
        let log = link_log(fixtures::VERTEX, fixtures::FRAGMENT_CONFLICTING_BLOCK);
        assert!(log.contains("declared differently"), "{log}");
    }

    #[test]
    fn textures_fail_to_link() {
        let log = link_log(fixtures::VERTEX, fixtures::FRAGMENT_WITH_TEXTURE);
        assert!(log.contains("only uniform blocks"), "{log}");
    }

    #[test]
    fn swapped_stages_fail() {
        let err = link(
            compile_stage(Stage::Fragment, fixtures::FRAGMENT).unwrap(),
            compile_stage(Stage::Vertex, fixtures::VERTEX).unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, ShaderError::Link { .. }));
    }

    #[test]
    fn quad_layout_supplies_vertex_inputs() {
        let linked = try_link(fixtures::VERTEX, fixtures::FRAGMENT).unwrap();
        check_vertex_inputs(&linked, &[QuadVertex::layout()]).unwrap();

        let err = check_vertex_inputs(&linked, &[]).unwrap_err();
        assert!(err.log().contains("location 0"));
        assert!(err.log().contains("location 1"));
    }
}

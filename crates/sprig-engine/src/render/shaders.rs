//! WGSL sources of the batch shaders.
//!
//! Every shape shares one vertex stage; the fragment stage is per shape.

pub const SHARED_VERTEX: &str = include_str!("shaders/shared.vert.wgsl");
pub const QUAD_FRAGMENT: &str = include_str!("shaders/quad.frag.wgsl");
pub const CIRCLE_FRAGMENT: &str = include_str!("shaders/circle.frag.wgsl");
pub const LINE_FRAGMENT: &str = include_str!("shaders/line.frag.wgsl");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::program::compile_program;
    use crate::gpu::ShaderDesc;
    use crate::render::Vertex;

    fn link(label: &str, fragment_source: &str) -> crate::gpu::ProgramInfo {
        let layout = Vertex::layout();
        compile_program(&ShaderDesc {
            label,
            vertex_source: SHARED_VERTEX,
            fragment_source,
            layout: &layout,
        })
        .unwrap_or_else(|e| panic!("{e}"))
    }

    #[test]
    fn bundled_shaders_link_against_the_vertex_layout() {
        for (label, source) in [
            ("quad", QUAD_FRAGMENT),
            ("circle", CIRCLE_FRAGMENT),
            ("line", LINE_FRAGMENT),
        ] {
            let info = link(label, source);
            assert_eq!(info.uniform_offset("projection"), Some(0), "{label}");
            assert_eq!(info.uniform_offset("view"), Some(64), "{label}");
            assert_eq!(info.uniform_block_size, 128, "{label}");
        }
    }

    #[test]
    fn only_the_quad_shader_samples_a_texture() {
        assert!(link("quad", QUAD_FRAGMENT).samples_texture);
        assert!(!link("circle", CIRCLE_FRAGMENT).samples_texture);
        assert!(!link("line", LINE_FRAGMENT).samples_texture);
    }
}

//! WGSL compilation and stage linking.
//!
//! Both backends run shader sources through naga before creating anything, so an
//! invalid program is reported as a [`GpuError`] instead of a device-level panic.
//!
//! Binding model:
//! - `@group(0) @binding(0)`: optional uniform struct, written with `set_uniform`
//!   by member name
//! - `@group(1) @binding(0)`: `texture_2d<f32>` bound to texture unit 0
//! - `@group(1) @binding(1)`: its sampler

use naga::valid::{Capabilities, ValidationFlags, Validator};

use super::{GpuError, ShaderDesc, VertexLayout};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

pub const UNIFORM_GROUP: u32 = 0;
pub const TEXTURE_GROUP: u32 = 1;

/// Named member of the uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformSlot {
    pub name: String,
    pub offset: u32,
}

/// Reflection data of a linked program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramInfo {
    pub uniforms: Vec<UniformSlot>,
    /// Byte size of the uniform block; 0 when the program has none.
    pub uniform_block_size: u32,
    /// Whether the fragment stage samples the texture bound to unit 0.
    pub samples_texture: bool,
}

impl ProgramInfo {
    pub fn uniform_offset(&self, name: &str) -> Option<u32> {
        self.uniforms.iter().find(|u| u.name == name).map(|u| u.offset)
    }
}

/// Compiles both stages of `desc` and links them against its vertex layout.
pub fn compile_program(desc: &ShaderDesc<'_>) -> Result<ProgramInfo, GpuError> {
    let vertex = compile_module(desc.label, "vertex", desc.vertex_source)?;
    let fragment = compile_module(desc.label, "fragment", desc.fragment_source)?;
    link(desc.label, &vertex, &fragment, desc.layout)
}

fn compile_module(label: &str, stage: &'static str, source: &str) -> Result<naga::Module, GpuError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| GpuError::Compile {
        label: label.to_owned(),
        stage,
        message: e.emit_to_string(source),
    })?;

    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| GpuError::Compile {
            label: label.to_owned(),
            stage,
            message: e.to_string(),
        })?;

    Ok(module)
}

fn link(
    label: &str,
    vertex: &naga::Module,
    fragment: &naga::Module,
    layout: &VertexLayout,
) -> Result<ProgramInfo, GpuError> {
    let fail = |message: String| GpuError::Link {
        label: label.to_owned(),
        message,
    };

    let vs = entry_point(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY)
        .ok_or_else(|| fail(format!("vertex module has no `{VERTEX_ENTRY}` entry point")))?;
    let fs = entry_point(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY)
        .ok_or_else(|| fail(format!("fragment module has no `{FRAGMENT_ENTRY}` entry point")))?;

    // Attributes are bound by name, in layout order.
    let mut inputs = Vec::new();
    for arg in &vs.function.arguments {
        collect_locations(vertex, arg.name.as_ref(), arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    for (index, attr) in layout.attributes().iter().enumerate() {
        let Some((_, location)) = inputs.iter().find(|(name, _)| name.as_deref() == Some(attr.name))
        else {
            return Err(fail(format!("vertex input `{}` is not declared", attr.name)));
        };
        if *location != index as u32 {
            return Err(fail(format!(
                "vertex input `{}` is at @location({location}) but the layout binds it to {index}",
                attr.name
            )));
        }
    }

    for (name, location) in &inputs {
        if *location as usize >= layout.attributes().len() {
            return Err(fail(format!(
                "vertex input `{}` at @location({location}) has no attribute in the layout",
                name.as_deref().unwrap_or("?")
            )));
        }
    }

    // Every fragment input must be produced by the vertex stage.
    let mut outputs = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(vertex, None, result.ty, result.binding.as_ref(), &mut outputs);
    }
    let mut varyings = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(fragment, arg.name.as_ref(), arg.ty, arg.binding.as_ref(), &mut varyings);
    }
    for (name, location) in &varyings {
        if !outputs.iter().any(|(_, l)| l == location) {
            return Err(fail(format!(
                "fragment input `{}` at @location({location}) is not written by the vertex stage",
                name.as_deref().unwrap_or("?")
            )));
        }
    }

    let (uniforms, uniform_block_size) = reflect_uniform_block(vertex).map_err(&fail)?;
    let samples_texture = reflect_texture_group(fragment).map_err(&fail)?;

    Ok(ProgramInfo {
        uniforms,
        uniform_block_size,
        samples_texture,
    })
}

fn entry_point<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
}

/// Flattens `@location` bindings of an argument or result, one struct level deep.
fn collect_locations(
    module: &naga::Module,
    name: Option<&String>,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<(Option<String>, u32)>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push((name.cloned(), *location)),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(
                        module,
                        member.name.as_ref(),
                        member.ty,
                        member.binding.as_ref(),
                        out,
                    );
                }
            }
        }
    }
}

fn reflect_uniform_block(vertex: &naga::Module) -> Result<(Vec<UniformSlot>, u32), String> {
    let mut block = None;

    for (_, global) in vertex.global_variables.iter() {
        let Some(binding) = &global.binding else { continue };
        if binding.group != UNIFORM_GROUP || binding.binding != 0 {
            return Err(format!(
                "vertex stage resource at @group({}) @binding({}) is not supported",
                binding.group, binding.binding
            ));
        }
        if global.space != naga::AddressSpace::Uniform {
            return Err("@group(0) @binding(0) must be a uniform buffer".to_owned());
        }
        block = Some(global.ty);
    }

    let Some(ty) = block else {
        return Ok((Vec::new(), 0));
    };

    match &vertex.types[ty].inner {
        naga::TypeInner::Struct { members, span } => {
            let slots = members
                .iter()
                .filter_map(|m| {
                    m.name.as_ref().map(|name| UniformSlot {
                        name: name.clone(),
                        offset: m.offset,
                    })
                })
                .collect();
            Ok((slots, *span))
        }
        _ => Err("the uniform block must be a struct".to_owned()),
    }
}

fn reflect_texture_group(fragment: &naga::Module) -> Result<bool, String> {
    let mut texture = false;
    let mut sampler = false;

    for (_, global) in fragment.global_variables.iter() {
        let Some(binding) = &global.binding else { continue };
        let inner = &fragment.types[global.ty].inner;

        match (binding.group, binding.binding, inner) {
            (TEXTURE_GROUP, 0, naga::TypeInner::Image { .. }) => texture = true,
            (TEXTURE_GROUP, 1, naga::TypeInner::Sampler { .. }) => sampler = true,
            (group, binding, _) => {
                return Err(format!(
                    "fragment stage resource at @group({group}) @binding({binding}) is not supported"
                ));
            }
        }
    }

    match (texture, sampler) {
        (true, true) => Ok(true),
        (false, false) => Ok(false),
        _ => Err("texture and sampler must be declared together in @group(1)".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::VertexFormat;

    const VS: &str = r#"
struct Globals {
    projection: mat4x4<f32>,
    tint: vec4<f32>,
};
@group(0) @binding(0) var<uniform> globals: Globals;

struct In {
    @location(0) position: vec4<f32>,
    @location(1) color: vec4<f32>,
};
struct Out {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_main(input: In) -> Out {
    var out: Out;
    out.clip = globals.projection * input.position;
    out.color = input.color * globals.tint;
    return out;
}
"#;

    const FS: &str = r#"
@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color;
}
"#;

    const FS_TEXTURED: &str = r#"
@group(1) @binding(0) var tex: texture_2d<f32>;
@group(1) @binding(1) var samp: sampler;

@fragment
fn fs_main(@location(0) color: vec4<f32>) -> @location(0) vec4<f32> {
    return color * textureSample(tex, samp, vec2<f32>(0.5, 0.5));
}
"#;

    fn layout() -> VertexLayout {
        VertexLayout::new()
            .push("position", VertexFormat::Float4)
            .push("color", VertexFormat::Float4)
    }

    fn compile(vs: &str, fs: &str, layout: &VertexLayout) -> Result<ProgramInfo, GpuError> {
        compile_program(&ShaderDesc {
            label: "test",
            vertex_source: vs,
            fragment_source: fs,
            layout,
        })
    }

    // ── reflection ────────────────────────────────────────────────────────

    #[test]
    fn reflects_uniform_offsets_by_name() {
        let info = compile(VS, FS, &layout()).unwrap();
        assert_eq!(info.uniform_offset("projection"), Some(0));
        assert_eq!(info.uniform_offset("tint"), Some(64));
        assert_eq!(info.uniform_offset("missing"), None);
        assert_eq!(info.uniform_block_size, 80);
        assert!(!info.samples_texture);
    }

    #[test]
    fn detects_texture_group() {
        let info = compile(VS, FS_TEXTURED, &layout()).unwrap();
        assert!(info.samples_texture);
    }

    // ── compile errors ────────────────────────────────────────────────────

    #[test]
    fn syntax_error_is_a_compile_error() {
        let err = compile("fn vs_main( {", FS, &layout()).unwrap_err();
        assert!(matches!(err, GpuError::Compile { stage: "vertex", .. }));
    }

    #[test]
    fn type_error_is_a_compile_error() {
        let fs = "@fragment fn fs_main() -> @location(0) vec4<f32> { return 1.0; }";
        let err = compile(VS, fs, &layout()).unwrap_err();
        assert!(matches!(err, GpuError::Compile { stage: "fragment", .. }));
    }

    // ── link errors ───────────────────────────────────────────────────────

    #[test]
    fn missing_entry_point_is_a_link_error() {
        let fs = "@fragment fn main() -> @location(0) vec4<f32> { return vec4<f32>(1.0); }";
        let err = compile(VS, fs, &layout()).unwrap_err();
        assert!(matches!(err, GpuError::Link { .. }));
    }

    #[test]
    fn attribute_name_must_exist() {
        let layout = VertexLayout::new()
            .push("pos", VertexFormat::Float4)
            .push("color", VertexFormat::Float4);
        let err = compile(VS, FS, &layout).unwrap_err();
        assert!(err.to_string().contains("`pos`"));
    }

    #[test]
    fn attribute_order_must_match_locations() {
        let layout = VertexLayout::new()
            .push("color", VertexFormat::Float4)
            .push("position", VertexFormat::Float4);
        assert!(matches!(compile(VS, FS, &layout), Err(GpuError::Link { .. })));
    }

    #[test]
    fn unbound_vertex_input_is_a_link_error() {
        let layout = VertexLayout::new().push("position", VertexFormat::Float4);
        assert!(matches!(compile(VS, FS, &layout), Err(GpuError::Link { .. })));
    }

    #[test]
    fn fragment_input_must_be_written_by_vertex_stage() {
        let fs = r#"
@fragment
fn fs_main(@location(3) uv: vec2<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(uv, 0.0, 1.0);
}
"#;
        assert!(matches!(compile(VS, fs, &layout()), Err(GpuError::Link { .. })));
    }
}

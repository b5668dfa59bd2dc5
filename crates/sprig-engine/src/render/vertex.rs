//! The shared vertex record and per-shape encoding.
//!
//! All shapes go through the same vertex format so a single vertex buffer serves
//! every batch. Unused fields are zero.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec2, Vec4};

use crate::color::Color;
use crate::gpu::{VertexFormat, VertexLayout};

/// Corners of the canonical unit quad, counter-clockwise from bottom-left.
pub const QUAD_POSITIONS: [Vec4; 4] = [
    Vec4::new(-0.5, -0.5, 0.0, 1.0),
    Vec4::new(0.5, -0.5, 0.0, 1.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
    Vec4::new(-0.5, 0.5, 0.0, 1.0),
];

pub const QUAD_TEXTURE_COORDS: [Vec2; 4] = [
    Vec2::new(0.0, 0.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
];

/// End points of the canonical unit segment.
pub const LINE_POSITIONS: [Vec4; 2] = [Vec4::new(-0.5, 0.0, 0.0, 1.0), Vec4::new(0.5, 0.0, 0.0, 1.0)];

/// Two triangles per quad.
pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// World-space position, already transformed.
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub texture_coord: [f32; 2],
    /// Shape-local coordinate in [-1, 1]; circles only.
    pub local_position: [f32; 2],
}

impl Vertex {
    /// Layout matching the field order above and the shared vertex shader inputs.
    pub fn layout() -> VertexLayout {
        VertexLayout::new()
            .push("position", VertexFormat::Float4)
            .push("color", VertexFormat::Float4)
            .push("texture_coord", VertexFormat::Float2)
            .push("local_position", VertexFormat::Float2)
    }
}

/// `translate(position) · rotate_z(rotation) · scale(size)`.
pub fn make_transform(position: Vec2, size: Vec2, rotation: f32) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        size.extend(1.0),
        Quat::from_rotation_z(rotation),
        position.extend(0.0),
    )
}

/// Maps the unit UV square onto `origin .. origin + size` (both normalized).
pub fn uv_transform(origin: Vec2, size: Vec2) -> Mat4 {
    Mat4::from_translation(origin.extend(0.0)) * Mat4::from_scale(size.extend(1.0))
}

/// Four textured quad vertices.
pub fn quad_vertices(transform: &Mat4, color: Color, uv_transform: &Mat4, tiling: Vec2) -> [Vertex; 4] {
    std::array::from_fn(|i| {
        let uv = uv_transform.transform_point3(QUAD_TEXTURE_COORDS[i].extend(0.0));
        Vertex {
            position: (*transform * QUAD_POSITIONS[i]).to_array(),
            color: color.to_array(),
            texture_coord: (uv.truncate() * tiling).to_array(),
            local_position: [0.0; 2],
        }
    })
}

/// Four circle vertices; `local_position` spans [-1, 1].
pub fn circle_vertices(transform: &Mat4, color: Color) -> [Vertex; 4] {
    std::array::from_fn(|i| Vertex {
        position: (*transform * QUAD_POSITIONS[i]).to_array(),
        color: color.to_array(),
        texture_coord: [0.0; 2],
        local_position: (QUAD_POSITIONS[i].truncate().truncate() * 2.0).to_array(),
    })
}

pub fn line_vertices(start: Vec4, end: Vec4, color: Color) -> [Vertex; 2] {
    [start, end].map(|p| Vertex {
        position: p.to_array(),
        color: color.to_array(),
        texture_coord: [0.0; 2],
        local_position: [0.0; 2],
    })
}

/// The four transformed quad edges, in corner order 0→1, 1→2, 2→3, 3→0.
pub fn rect_outline(transform: &Mat4) -> [(Vec4, Vec4); 4] {
    let corners = QUAD_POSITIONS.map(|p| *transform * p);
    std::array::from_fn(|i| (corners[i], corners[(i + 1) % 4]))
}

/// Coverage of the circle fragment stage: 1 inside (boundary included), 0 outside.
pub fn circle_mask(local_position: Vec2) -> f32 {
    if local_position.length() <= 1.0 { 1.0 } else { 0.0 }
}

/// Index pattern for `max_quads` quads.
pub fn quad_index_pattern(max_quads: usize) -> Vec<u16> {
    (0..max_quads)
        .flat_map(|quad| {
            let base = (quad * 4) as u16;
            QUAD_INDICES.map(|i| base + i)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f32::consts::FRAC_PI_2;

    fn pos(v: &Vertex) -> Vec4 {
        Vec4::from_array(v.position)
    }

    #[test]
    fn vertex_is_48_bytes_and_matches_layout() {
        assert_eq!(std::mem::size_of::<Vertex>(), 48);
        assert_eq!(Vertex::layout().stride(), 48);
        assert_eq!(
            Vertex::layout().offsets().collect::<Vec<_>>(),
            vec![
                std::mem::offset_of!(Vertex, position) as u64,
                std::mem::offset_of!(Vertex, color) as u64,
                std::mem::offset_of!(Vertex, texture_coord) as u64,
                std::mem::offset_of!(Vertex, local_position) as u64,
            ]
        );
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn transform_scales_then_rotates_then_translates() {
        let t = make_transform(Vec2::new(10.0, 0.0), Vec2::new(2.0, 1.0), FRAC_PI_2);
        let p = t * Vec4::new(1.0, 0.0, 0.0, 1.0);
        assert_abs_diff_eq!(p, Vec4::new(10.0, 2.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn axis_aligned_rect_corners() {
        let t = make_transform(Vec2::ZERO, Vec2::splat(100.0), 0.0);
        let v = quad_vertices(&t, Color::RED, &Mat4::IDENTITY, Vec2::ONE);

        let expected = [(-50.0, -50.0), (50.0, -50.0), (50.0, 50.0), (-50.0, 50.0)];
        for (vertex, (x, y)) in v.iter().zip(expected) {
            assert_abs_diff_eq!(pos(vertex), Vec4::new(x, y, 0.0, 1.0), epsilon = 1e-4);
            assert_eq!(vertex.color, [1.0, 0.0, 0.0, 1.0]);
            assert_eq!(vertex.local_position, [0.0, 0.0]);
        }
    }

    // ── texture coordinates ───────────────────────────────────────────────

    #[test]
    fn full_texture_uses_canonical_uvs() {
        let v = quad_vertices(&Mat4::IDENTITY, Color::WHITE, &Mat4::IDENTITY, Vec2::ONE);
        for (vertex, uv) in v.iter().zip(QUAD_TEXTURE_COORDS) {
            assert_eq!(vertex.texture_coord, uv.to_array());
        }
    }

    #[test]
    fn region_and_tiling_scale_uvs() {
        // 16x16 region at (16, 0) of a 64x32 texture, tiled twice.
        let uvt = uv_transform(Vec2::new(0.25, 0.0), Vec2::new(0.25, 0.5));
        let v = quad_vertices(&Mat4::IDENTITY, Color::WHITE, &uvt, Vec2::splat(2.0));

        assert_abs_diff_eq!(Vec2::from_array(v[0].texture_coord), Vec2::new(0.5, 0.0));
        assert_abs_diff_eq!(Vec2::from_array(v[2].texture_coord), Vec2::new(1.0, 1.0));
    }

    // ── circles ───────────────────────────────────────────────────────────

    #[test]
    fn circle_local_positions_are_doubled_corners() {
        let t = make_transform(Vec2::new(3.0, 4.0), Vec2::splat(10.0), 0.0);
        let v = circle_vertices(&t, Color::BLUE);
        let locals: Vec<[f32; 2]> = v.iter().map(|v| v.local_position).collect();
        assert_eq!(locals, vec![[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]]);
        assert!(v.iter().all(|v| v.texture_coord == [0.0, 0.0]));
        assert_abs_diff_eq!(pos(&v[2]), Vec4::new(8.0, 9.0, 0.0, 1.0), epsilon = 1e-5);
    }

    #[test]
    fn circle_mask_includes_boundary() {
        assert_eq!(circle_mask(Vec2::ZERO), 1.0);
        assert_eq!(circle_mask(Vec2::new(1.0, 0.0)), 1.0);
        assert_eq!(circle_mask(Vec2::new(0.0, -1.0)), 1.0);
        assert_eq!(circle_mask(Vec2::new(1.0001, 0.0)), 0.0);
        assert_eq!(circle_mask(Vec2::new(1.0, 1.0)), 0.0);
    }

    // ── lines ─────────────────────────────────────────────────────────────

    #[test]
    fn outline_follows_corner_order() {
        let t = make_transform(Vec2::ZERO, Vec2::splat(2.0), 0.0);
        let edges = rect_outline(&t);
        let c = QUAD_POSITIONS.map(|p| t * p);
        assert_eq!(edges, [(c[0], c[1]), (c[1], c[2]), (c[2], c[3]), (c[3], c[0])]);
    }

    #[test]
    fn line_vertices_carry_no_texture_data() {
        let v = line_vertices(Vec4::new(0.0, 0.0, 0.0, 1.0), Vec4::new(5.0, 5.0, 0.0, 1.0), Color::GREEN);
        assert_eq!(v[1].position, [5.0, 5.0, 0.0, 1.0]);
        assert!(v.iter().all(|v| v.texture_coord == [0.0; 2] && v.local_position == [0.0; 2]));
    }

    // ── indices ───────────────────────────────────────────────────────────

    #[test]
    fn index_pattern_offsets_by_four() {
        assert_eq!(
            quad_index_pattern(2),
            vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]
        );
        let big = quad_index_pattern(16_384);
        assert_eq!(big.len(), 16_384 * 6);
        assert_eq!(*big.iter().max().unwrap(), u16::MAX);
    }
}

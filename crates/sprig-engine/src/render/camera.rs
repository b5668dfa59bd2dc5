use glam::{Mat4, Vec2};

/// Orthographic 2D camera.
///
/// The projection is fixed at construction. Position and rotation are free to
/// change; the view matrix is derived from them by
/// [`recalculate_view_matrix`](Self::recalculate_view_matrix), which the batch
/// renderer calls before every flush.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    /// Rotation around Z, in radians.
    pub rotation: f32,

    projection: Mat4,
    view: Mat4,
}

impl Camera {
    /// Camera seeing `left..right` horizontally and `bottom..top` vertically.
    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            projection: Mat4::orthographic_rh(left, right, bottom, top, -1.0, 1.0),
            view: Mat4::IDENTITY,
        }
    }

    /// Camera centered on the origin, `width` by `height` world units.
    pub fn centered(width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(-hw, hw, -hh, hh)
    }

    /// `view = inverse(translate(position) · rotate_z(rotation))`.
    pub fn recalculate_view_matrix(&mut self) {
        let transform = Mat4::from_translation(self.position.extend(0.0))
            * Mat4::from_rotation_z(self.rotation);
        self.view = transform.inverse();
    }

    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// View matrix as of the last recalculation.
    #[inline]
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    #[inline]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view
    }
}

impl Default for Camera {
    /// Identity projection and view.
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
        }
    }
}

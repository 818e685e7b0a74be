//! Per-draw uniform block for the lit and shadow passes

use bytemuck::{Pod, Zeroable};

use crate::foundation::math::{Mat4, Vec3};

/// Uniforms updated before every draw
///
/// Layout matches a std140 block of `mat4 uLightMVP; vec3 uLightPos; float uAlpha;`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniforms {
    /// Light-space model-view-projection, column major
    pub light_mvp: [[f32; 4]; 4],
    /// Light position in world space
    pub light_pos: [f32; 3],
    /// Accumulation weight of this pass
    pub alpha: f32,
}

impl DrawUniforms {
    /// Build the block from engine math types
    pub fn new(light_mvp: &Mat4, light_pos: &Vec3, alpha: f32) -> Self {
        Self {
            light_mvp: (*light_mvp).into(),
            light_pos: (*light_pos).into(),
            alpha,
        }
    }

    /// Light-space matrix back as a `Mat4`
    pub fn light_mvp_matrix(&self) -> Mat4 {
        Mat4::from(self.light_mvp)
    }

    /// Raw bytes for upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self::new(&Mat4::identity(), &Vec3::zeros(), 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_size() {
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 80);
        assert_eq!(DrawUniforms::default().as_bytes().len(), 80);
    }

    #[test]
    fn test_matrix_is_column_major() {
        let matrix = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let uniforms = DrawUniforms::new(&matrix, &Vec3::new(0.0, 80.0, 60.0), 0.5);

        assert_eq!(uniforms.light_mvp[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(uniforms.light_pos, [0.0, 80.0, 60.0]);
        assert_eq!(uniforms.light_mvp_matrix(), matrix);
    }
}

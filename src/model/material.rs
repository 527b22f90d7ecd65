use glam::Vec3;

/// Phong surface parameters uploaded as `material.*` uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub ambient_color: Vec3,
    /// Nominally in [0, 1].
    pub ambient_strength: f32,
    pub diffuse_color: Vec3,
    pub specular_color: Vec3,
    /// Specular exponent, positive.
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::splat(0.1),
            ambient_strength: 0.1,
            diffuse_color: Vec3::splat(0.5),
            specular_color: Vec3::splat(0.5),
            shininess: 32.0,
        }
    }
}

impl Material {
    pub fn new(
        ambient_color: Vec3,
        ambient_strength: f32,
        diffuse_color: Vec3,
        specular_color: Vec3,
        shininess: f32,
    ) -> Self {
        Self {
            ambient_color,
            ambient_strength,
            diffuse_color,
            specular_color,
            shininess,
        }
    }
}

//! Named shader uniforms.
//!
//! Scene and camera code talk to the shader through [`UniformSink`], a
//! `set_uniform(name, value)` interface. [`ShaderState`] is the concrete sink:
//! it keeps a CPU copy of the two uniform blocks the WGSL shader reads and a
//! list of draws, each carrying a snapshot of the per-object block taken at
//! the moment the draw was issued. Uniforms keep their value across draws
//! until overwritten.

use bytemuck::Zeroable;
use glam::{Mat4, Vec2, Vec3, Vec4};
use tracing::warn;

use crate::view::meshes::ShapeKind;

/// Number of light slots in the shader.
pub const MAX_LIGHTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
    /// Texture unit index, -1 for none.
    Sampler(i32),
}

impl UniformValue {
    fn as_float(self) -> Option<f32> {
        match self {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }

    fn as_flag(self) -> Option<bool> {
        match self {
            UniformValue::Bool(b) => Some(b),
            UniformValue::Int(i) => Some(i != 0),
            _ => None,
        }
    }

    fn as_slot(self) -> Option<i32> {
        match self {
            UniformValue::Sampler(i) | UniformValue::Int(i) => Some(i),
            _ => None,
        }
    }

    fn as_vec2(self) -> Option<Vec2> {
        match self {
            UniformValue::Vec2(v) => Some(v),
            _ => None,
        }
    }

    fn as_vec3(self) -> Option<Vec3> {
        match self {
            UniformValue::Vec3(v) => Some(v),
            _ => None,
        }
    }

    fn as_vec4(self) -> Option<Vec4> {
        match self {
            UniformValue::Vec4(v) => Some(v),
            _ => None,
        }
    }

    fn as_mat4(self) -> Option<Mat4> {
        match self {
            UniformValue::Mat4(m) => Some(m),
            _ => None,
        }
    }
}

/// Anything that accepts shader uniforms by name.
pub trait UniformSink {
    fn set_uniform(&mut self, name: &str, value: UniformValue);

    fn set_float(&mut self, name: &str, value: f32) {
        self.set_uniform(name, UniformValue::Float(value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.set_uniform(name, UniformValue::Int(value));
    }

    fn set_bool(&mut self, name: &str, value: bool) {
        self.set_uniform(name, UniformValue::Bool(value));
    }

    fn set_vec2(&mut self, name: &str, value: Vec2) {
        self.set_uniform(name, UniformValue::Vec2(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.set_uniform(name, UniformValue::Vec3(value));
    }

    fn set_vec4(&mut self, name: &str, value: Vec4) {
        self.set_uniform(name, UniformValue::Vec4(value));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.set_uniform(name, UniformValue::Mat4(value));
    }

    fn set_sampler(&mut self, name: &str, slot: i32) {
        self.set_uniform(name, UniformValue::Sampler(slot));
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    pub focal_strength: f32,
    pub ambient_color: [f32; 3],
    pub specular_intensity: f32,
    pub diffuse_color: [f32; 3],
    pub _pad0: f32,
    pub specular_color: [f32; 3],
    pub _pad1: f32,
}

/// Per-frame block (bind group 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub view_position: [f32; 3],
    pub use_lighting: u32,
    pub lights: [LightUniform; MAX_LIGHTS],
}

impl Default for FrameUniform {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            view_position: [0.0; 3],
            use_lighting: 0,
            lights: [LightUniform::zeroed(); MAX_LIGHTS],
        }
    }
}

/// Per-draw block (bind group 1, dynamic offset).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub object_color: [f32; 4],
    pub ambient_color: [f32; 3],
    pub ambient_strength: f32,
    pub diffuse_color: [f32; 3],
    pub shininess: f32,
    pub specular_color: [f32; 3],
    pub use_texture: u32,
    pub uv_scale: [f32; 2],
    pub texture_slot: i32,
    pub _pad: u32,
}

impl Default for ObjectUniform {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            normal_matrix: Mat4::IDENTITY.to_cols_array_2d(),
            object_color: [1.0; 4],
            ambient_color: [0.1; 3],
            ambient_strength: 0.1,
            diffuse_color: [0.5; 3],
            shininess: 32.0,
            specular_color: [0.5; 3],
            use_texture: 0,
            uv_scale: [1.0, 1.0],
            texture_slot: -1,
            _pad: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub shape: ShapeKind,
    pub object: ObjectUniform,
}

#[derive(Debug, Default)]
pub struct ShaderState {
    frame: FrameUniform,
    object: ObjectUniform,
    draws: Vec<DrawCommand>,
}

impl ShaderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame(&self) -> &FrameUniform {
        &self.frame
    }

    pub fn object(&self) -> &ObjectUniform {
        &self.object
    }

    /// Queue `shape` with the per-object uniforms as they are right now.
    pub fn draw(&mut self, shape: ShapeKind) {
        self.draws.push(DrawCommand {
            shape,
            object: self.object,
        });
    }

    pub fn draws(&self) -> &[DrawCommand] {
        &self.draws
    }

    pub fn clear_draws(&mut self) {
        self.draws.clear();
    }

    fn set_light(&mut self, name: &str, index: usize, field: &str, value: UniformValue) -> bool {
        let Some(light) = self.frame.lights.get_mut(index) else {
            return false;
        };
        match field {
            "position" => value.as_vec3().map(|v| light.position = v.to_array()).is_some(),
            "ambient_color" => value.as_vec3().map(|v| light.ambient_color = v.to_array()).is_some(),
            "diffuse_color" => value.as_vec3().map(|v| light.diffuse_color = v.to_array()).is_some(),
            "specular_color" => value.as_vec3().map(|v| light.specular_color = v.to_array()).is_some(),
            "focal_strength" => value.as_float().map(|v| light.focal_strength = v).is_some(),
            "specular_intensity" => value.as_float().map(|v| light.specular_intensity = v).is_some(),
            _ => {
                warn!(uniform = name, "unknown light field");
                true
            }
        }
    }
}

/// Split `light_sources[2].position` into `(2, "position")`.
fn parse_light_name(name: &str) -> Option<(usize, &str)> {
    let rest = name.strip_prefix("light_sources[")?;
    let (index, field) = rest.split_once("].")?;
    Some((index.parse().ok()?, field))
}

impl UniformSink for ShaderState {
    fn set_uniform(&mut self, name: &str, value: UniformValue) {
        let frame = &mut self.frame;
        let object = &mut self.object;
        let applied = match name {
            "view" => value.as_mat4().map(|m| frame.view = m.to_cols_array_2d()).is_some(),
            "projection" => value.as_mat4().map(|m| frame.projection = m.to_cols_array_2d()).is_some(),
            "view_position" => value.as_vec3().map(|v| frame.view_position = v.to_array()).is_some(),
            "use_lighting" => value.as_flag().map(|b| frame.use_lighting = b as u32).is_some(),
            "model" => value.as_mat4().map(|m| object.model = m.to_cols_array_2d()).is_some(),
            "normal_matrix" => value.as_mat4().map(|m| object.normal_matrix = m.to_cols_array_2d()).is_some(),
            "object_color" => value.as_vec4().map(|v| object.object_color = v.to_array()).is_some(),
            "object_texture" => value.as_slot().map(|s| object.texture_slot = s).is_some(),
            "use_texture" => value.as_flag().map(|b| object.use_texture = b as u32).is_some(),
            "uv_scale" => value.as_vec2().map(|v| object.uv_scale = v.to_array()).is_some(),
            "material.ambient_color" => value.as_vec3().map(|v| object.ambient_color = v.to_array()).is_some(),
            "material.ambient_strength" => value.as_float().map(|v| object.ambient_strength = v).is_some(),
            "material.diffuse_color" => value.as_vec3().map(|v| object.diffuse_color = v.to_array()).is_some(),
            "material.specular_color" => value.as_vec3().map(|v| object.specular_color = v.to_array()).is_some(),
            "material.shininess" => value.as_float().map(|v| object.shininess = v).is_some(),
            _ => match parse_light_name(name) {
                Some((index, field)) => self.set_light(name, index, field, value),
                None => {
                    warn!(uniform = name, "unknown uniform");
                    return;
                }
            },
        };
        if !applied {
            warn!(uniform = name, ?value, "uniform ignored: wrong type or index");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_block_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<LightUniform>(), 64);
        assert_eq!(std::mem::size_of::<FrameUniform>(), 400);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 208);
    }

    #[test]
    fn test_frame_uniforms_by_name() {
        let mut state = ShaderState::new();
        let view = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        state.set_mat4("view", view);
        state.set_vec3("view_position", Vec3::new(0.0, 5.0, 14.0));
        state.set_bool("use_lighting", true);

        assert_eq!(state.frame().view, view.to_cols_array_2d());
        assert_eq!(state.frame().view_position, [0.0, 5.0, 14.0]);
        assert_eq!(state.frame().use_lighting, 1);
    }

    #[test]
    fn test_light_fields_by_indexed_name() {
        let mut state = ShaderState::new();
        state.set_vec3("light_sources[1].position", Vec3::new(0.0, 4.0, 8.0));
        state.set_float("light_sources[1].focal_strength", 32.0);
        state.set_float("light_sources[1].specular_intensity", 0.05);

        let light = state.frame().lights[1];
        assert_eq!(light.position, [0.0, 4.0, 8.0]);
        assert_eq!(light.focal_strength, 32.0);
        assert_eq!(light.specular_intensity, 0.05);
        assert_eq!(state.frame().lights[0], LightUniform::zeroed());
    }

    #[test]
    fn test_out_of_range_light_is_ignored() {
        let mut state = ShaderState::new();
        state.set_vec3("light_sources[4].position", Vec3::ONE);
        assert_eq!(*state.frame(), FrameUniform::default());
    }

    #[test]
    fn test_wrong_type_and_unknown_names_are_ignored() {
        let mut state = ShaderState::new();
        state.set_float("model", 1.0);
        state.set_float("not_a_uniform", 1.0);
        assert_eq!(*state.object(), ObjectUniform::default());
    }

    #[test]
    fn test_flags_accept_int_or_bool() {
        let mut state = ShaderState::new();
        state.set_int("use_texture", 1);
        assert_eq!(state.object().use_texture, 1);
        state.set_bool("use_texture", false);
        assert_eq!(state.object().use_texture, 0);
    }

    #[test]
    fn test_draw_snapshots_object_uniforms() {
        let mut state = ShaderState::new();
        state.set_vec4("object_color", Vec4::new(1.0, 0.0, 0.0, 1.0));
        state.draw(ShapeKind::Box);
        state.set_vec4("object_color", Vec4::new(0.0, 1.0, 0.0, 1.0));
        state.set_sampler("object_texture", 2);
        state.draw(ShapeKind::Plane);

        let draws = state.draws();
        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0].shape, ShapeKind::Box);
        assert_eq!(draws[0].object.object_color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(draws[0].object.texture_slot, -1);
        assert_eq!(draws[1].object.object_color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(draws[1].object.texture_slot, 2);

        state.clear_draws();
        assert!(state.draws().is_empty());
        // uniforms survive the draw list being cleared
        assert_eq!(state.object().texture_slot, 2);
    }

    #[test]
    fn test_parse_light_name() {
        assert_eq!(parse_light_name("light_sources[3].diffuse_color"), Some((3, "diffuse_color")));
        assert_eq!(parse_light_name("light_sources[x].position"), None);
        assert_eq!(parse_light_name("material.shininess"), None);
    }
}

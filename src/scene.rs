//! The desk scene: a textured table top, a monitor on a three-legged stand,
//! a keyboard with a grid of keys, a mouse and two speakers.

use std::path::PathBuf;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use crate::model::{Material, ResourceRegistry, TextureBackend};
use crate::view::meshes::ShapeKind;
use crate::view::uniforms::{ShaderState, UniformSink};

/// Image files loaded from the texture directory, with their tags.
pub const SCENE_TEXTURES: [(&str, &str); 3] = [
    ("desktop.jpg", "desktop"),
    ("tab.png", "tab"),
    ("table.png", "table"),
];

const KEYBOARD_SCALE: Vec3 = Vec3::new(6.0, 0.2, 1.5);
const KEYBOARD_POSITION: Vec3 = Vec3::new(0.0, 0.0, 7.0);
const KEY_SIZE: f32 = 0.2;
const KEY_GAP: f32 = 0.1;

const STAND_BASE_SCALE: Vec3 = Vec3::new(1.0, 0.5, 1.0);
const STAND_BASE_POSITION: Vec3 = Vec3::new(0.0, 1.0, 3.0);

/// Placement of one primitive. Rotations are in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub scale: Vec3,
    pub rotation_deg: Vec3,
    pub position: Vec3,
}

impl Transform {
    pub fn new(scale: Vec3, rotation_deg: Vec3, position: Vec3) -> Self {
        Self {
            scale,
            rotation_deg,
            position,
        }
    }

    pub fn at(scale: Vec3, position: Vec3) -> Self {
        Self::new(scale, Vec3::ZERO, position)
    }

    /// Rz * Ry * Rx
    fn rotation(&self) -> Quat {
        let r = self.rotation_deg;
        Quat::from_rotation_z(r.z.to_radians())
            * Quat::from_rotation_y(r.y.to_radians())
            * Quat::from_rotation_x(r.x.to_radians())
    }

    /// T * Rz * Ry * Rx * S
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.position)
    }

    /// Inverse transpose of the model's linear part. Flattened axes (scale 0)
    /// are treated as unscaled so the matrix stays finite.
    pub fn normal_matrix(&self) -> Mat4 {
        let safe = Vec3::select(self.scale.cmpeq(Vec3::ZERO), Vec3::ONE, self.scale);
        Mat4::from_quat(self.rotation()) * Mat4::from_scale(safe.recip())
    }
}

/// Materials used by the scene, in registration order.
pub fn scene_materials() -> [(&'static str, Material); 4] {
    [
        // wood: dull, slightly blue highlights
        (
            "table",
            Material::new(Vec3::splat(0.1), 0.5, Vec3::new(0.2, 0.2, 0.3), Vec3::new(0.8, 0.8, 1.0), 1.0),
        ),
        (
            "blackPlastic",
            Material::new(Vec3::splat(0.1), 0.1, Vec3::splat(0.2), Vec3::splat(0.1), 32.0),
        ),
        (
            "greyPlastic",
            Material::new(Vec3::splat(0.3), 0.3, Vec3::splat(0.3), Vec3::splat(0.3), 32.0),
        ),
        (
            "screen",
            Material::new(Vec3::splat(0.2), 0.8, Vec3::new(0.4, 0.4, 0.5), Vec3::ONE, 256.0),
        ),
    ]
}

/// Positions of the keys on the keyboard, row by row.
pub fn key_positions() -> Vec<Vec3> {
    let pitch = KEY_SIZE + KEY_GAP;
    let columns = (KEYBOARD_SCALE.x / pitch) as i32;
    let rows = (KEYBOARD_SCALE.z / pitch) as i32;
    let start_x = KEYBOARD_POSITION.x - (KEYBOARD_SCALE.x / 2.0 - 0.15);
    let start_z = KEYBOARD_POSITION.z - (KEYBOARD_SCALE.z / 2.0 - 0.15);

    (0..rows)
        .flat_map(|v| {
            (0..columns).map(move |h| {
                Vec3::new(
                    start_x + pitch * h as f32,
                    KEYBOARD_POSITION.y + 0.1,
                    start_z + pitch * v as f32,
                )
            })
        })
        .collect()
}

/// Loads the scene resources and records the scene's draw calls
pub struct SceneComposer<B: TextureBackend> {
    registry: ResourceRegistry<B>,
    texture_dir: PathBuf,
}

impl<B: TextureBackend> SceneComposer<B> {
    pub fn new(backend: B, texture_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: ResourceRegistry::new(backend),
            texture_dir: texture_dir.into(),
        }
    }

    pub fn registry(&self) -> &ResourceRegistry<B> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResourceRegistry<B> {
        &mut self.registry
    }

    /// Load textures, materials and lights. Missing images are logged and
    /// skipped; only a failure to bind the loaded textures is returned.
    pub fn prepare_scene<S: UniformSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), RegistryError> {
        self.load_scene_textures()?;
        self.define_object_materials();
        self.setup_scene_lights(sink);
        info!(
            textures = self.registry.texture_count(),
            materials = self.registry.materials().len(),
            "scene prepared"
        );
        Ok(())
    }

    pub fn load_scene_textures(&mut self) -> Result<(), RegistryError> {
        for (file, tag) in SCENE_TEXTURES {
            // failures are logged by the registry
            let _ = self.registry.register_texture(self.texture_dir.join(file), tag);
        }
        self.registry.bind_all_textures()
    }

    pub fn define_object_materials(&mut self) {
        for (tag, material) in scene_materials() {
            self.registry.register_material(tag, material);
        }
    }

    pub fn setup_scene_lights<S: UniformSink + ?Sized>(&self, sink: &mut S) {
        // key light above and in front of the desk
        sink.set_vec3("light_sources[0].position", Vec3::new(0.0, 8.0, 10.0));
        sink.set_vec3("light_sources[0].ambient_color", Vec3::splat(0.01));
        sink.set_vec3("light_sources[0].diffuse_color", Vec3::splat(0.4));
        sink.set_vec3("light_sources[0].specular_color", Vec3::ZERO);
        sink.set_float("light_sources[0].focal_strength", 32.0);
        sink.set_float("light_sources[0].specular_intensity", 0.05);

        // purple fill light closer to the screen
        sink.set_vec3("light_sources[1].position", Vec3::new(0.0, 4.0, 8.0));
        sink.set_vec3("light_sources[1].ambient_color", Vec3::new(0.1, 0.0, 0.15));
        sink.set_vec3("light_sources[1].diffuse_color", Vec3::new(0.2, 0.0, 0.25));
        sink.set_vec3("light_sources[1].specular_color", Vec3::ZERO);
        sink.set_float("light_sources[1].focal_strength", 32.0);
        sink.set_float("light_sources[1].specular_intensity", 0.05);

        sink.set_bool("use_lighting", true);
    }

    pub fn set_transformations<S: UniformSink + ?Sized>(&self, sink: &mut S, transform: &Transform) {
        sink.set_mat4("model", transform.model_matrix());
        sink.set_mat4("normal_matrix", transform.normal_matrix());
    }

    pub fn set_shader_color<S: UniformSink + ?Sized>(&self, sink: &mut S, r: f32, g: f32, b: f32, a: f32) {
        sink.set_bool("use_texture", false);
        sink.set_vec4("object_color", Vec4::new(r, g, b, a));
    }

    /// Sample the texture registered under `tag`. An unknown tag turns
    /// texturing off instead.
    pub fn set_shader_texture<S: UniformSink + ?Sized>(&self, sink: &mut S, tag: &str) {
        match self.registry.find_texture_slot(tag) {
            Some(slot) => {
                sink.set_bool("use_texture", true);
                sink.set_sampler("object_texture", slot as i32);
            }
            None => {
                debug!(tag, "texture not found, drawing untextured");
                sink.set_bool("use_texture", false);
                sink.set_sampler("object_texture", -1);
            }
        }
    }

    pub fn set_texture_uv_scale<S: UniformSink + ?Sized>(&self, sink: &mut S, u: f32, v: f32) {
        sink.set_vec2("uv_scale", Vec2::new(u, v));
    }

    /// Upload the material registered under `tag`; unknown tags leave the
    /// current material in place.
    pub fn set_shader_material<S: UniformSink + ?Sized>(&self, sink: &mut S, tag: &str) {
        let Some(material) = self.registry.find_material(tag) else {
            warn!(tag, "material not found");
            return;
        };
        sink.set_vec3("material.ambient_color", material.ambient_color);
        sink.set_float("material.ambient_strength", material.ambient_strength);
        sink.set_vec3("material.diffuse_color", material.diffuse_color);
        sink.set_vec3("material.specular_color", material.specular_color);
        sink.set_float("material.shininess", material.shininess);
    }

    fn draw(&self, shader: &mut ShaderState, shape: ShapeKind, transform: Transform) {
        self.set_transformations(shader, &transform);
        shader.draw(shape);
    }

    /// Record every object of the scene into `shader`'s draw list.
    pub fn render_scene(&self, shader: &mut ShaderState) {
        self.render_table(shader);
        let post = self.render_monitor_stand(shader);
        self.render_monitor(shader, post);
        self.render_keyboard(shader);
        self.render_mouse(shader);
        self.render_speaker(shader, Vec3::new(-4.0, 0.1, 6.0));
        self.render_speaker(shader, Vec3::new(4.0, 0.1, 6.0));
    }

    fn render_table(&self, shader: &mut ShaderState) {
        self.set_shader_texture(shader, "table");
        self.set_shader_material(shader, "table");
        self.draw(shader, ShapeKind::Plane, Transform::at(Vec3::new(20.0, 1.0, 10.0), Vec3::ZERO));
        shader.set_bool("use_texture", false);
    }

    /// Returns the post's transform, which the monitor hangs from.
    fn render_monitor_stand(&self, shader: &mut ShaderState) -> Transform {
        self.set_shader_material(shader, "greyPlastic");
        self.draw(shader, ShapeKind::Cylinder, Transform::at(STAND_BASE_SCALE, STAND_BASE_POSITION));

        let leg = Vec3::new(0.2, 0.2, 2.6);
        let legs = [
            Transform::new(leg, Vec3::new(30.0, -60.0, 0.0), STAND_BASE_POSITION + Vec3::new(-1.8, -0.3, 1.0)),
            Transform::new(leg, Vec3::new(30.0, 60.0, 0.0), STAND_BASE_POSITION + Vec3::new(1.8, -0.3, 1.0)),
            Transform::new(
                Vec3::new(0.2, 0.2, 1.8),
                Vec3::new(-45.0, 0.0, 0.0),
                STAND_BASE_POSITION + Vec3::new(0.0, -0.3, -1.5),
            ),
        ];
        for leg in legs {
            self.draw(shader, ShapeKind::Box, leg);
        }

        let post_scale = Vec3::new(STAND_BASE_SCALE.x - 0.2, 4.0, 1.0);
        let post = Transform::at(post_scale, STAND_BASE_POSITION + Vec3::new(0.0, post_scale.y / 2.0, 0.0));
        self.draw(shader, ShapeKind::Box, post);
        post
    }

    fn render_monitor(&self, shader: &mut ShaderState, post: Transform) {
        let body = Transform::at(
            Vec3::new(8.0, 4.0, 1.0),
            post.position + Vec3::new(0.0, post.scale.y / 2.0, 0.1),
        );
        self.set_shader_material(shader, "blackPlastic");
        self.draw(shader, ShapeKind::Box, body);

        // plane stood upright just in front of the body
        let screen_rotation = Vec3::new(90.0, 0.0, 0.0);
        let screen = Transform::new(
            Vec3::new(3.5, 0.0, 1.7),
            screen_rotation,
            body.position + Vec3::new(0.0, 0.0, 0.567),
        );
        self.set_shader_texture(shader, "desktop");
        self.set_shader_material(shader, "screen");
        self.draw(shader, ShapeKind::Plane, screen);

        let tab = Transform::new(
            screen.scale / 3.0,
            screen_rotation,
            screen.position + Vec3::new(-1.7, -1.0, 0.01),
        );
        self.set_shader_texture(shader, "tab");
        self.set_shader_material(shader, "screen");
        self.draw(shader, ShapeKind::Plane, tab);
    }

    fn render_keyboard(&self, shader: &mut ShaderState) {
        shader.set_bool("use_texture", false);
        self.set_shader_material(shader, "blackPlastic");
        self.draw(shader, ShapeKind::Box, Transform::at(KEYBOARD_SCALE, KEYBOARD_POSITION));

        for position in key_positions() {
            self.draw(shader, ShapeKind::Box, Transform::at(Vec3::splat(KEY_SIZE), position));
        }
    }

    fn render_mouse(&self, shader: &mut ShaderState) {
        self.set_shader_material(shader, "blackPlastic");
        self.draw(
            shader,
            ShapeKind::HalfSphere,
            Transform::at(Vec3::new(0.4, 0.2, 0.7), Vec3::new(4.0, 0.0, 9.0)),
        );
    }

    /// Torus cone lying face up with a cylinder body behind it.
    fn render_speaker(&self, shader: &mut ShaderState, position: Vec3) {
        self.set_shader_material(shader, "blackPlastic");
        self.draw(
            shader,
            ShapeKind::Torus,
            Transform::new(Vec3::new(0.64, 1.2, 0.5), Vec3::new(90.0, 0.0, 0.0), position),
        );
        self.draw(
            shader,
            ShapeKind::Cylinder,
            Transform::at(Vec3::new(0.7, 3.0, 0.9), position + Vec3::new(0.0, 0.07, 0.3)),
        );
    }

    /// Delete all scene textures.
    pub fn release(&mut self) {
        self.registry.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::registry::tests::MemoryBackend;
    use crate::model::{DecodedImage, PixelFormat};
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    fn texture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("deskscene-scene-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn white_image() -> DecodedImage {
        DecodedImage {
            width: 1,
            height: 1,
            format: PixelFormat::Rgba8,
            pixels: vec![255; 4],
        }
    }

    fn composer() -> SceneComposer<MemoryBackend> {
        SceneComposer::new(MemoryBackend::default(), "does/not/exist")
    }

    #[test]
    fn test_prepare_scene_loads_textures_in_order() {
        let dir = texture_dir("full");
        RgbImage::from_pixel(4, 4, Rgb([0, 0, 200])).save(dir.join("desktop.jpg")).unwrap();
        RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 128])).save(dir.join("tab.png")).unwrap();
        RgbImage::from_pixel(2, 2, Rgb([120, 80, 40])).save(dir.join("table.png")).unwrap();

        let mut scene = SceneComposer::new(MemoryBackend::default(), &dir);
        let mut shader = ShaderState::new();
        scene.prepare_scene(&mut shader).unwrap();

        let registry = scene.registry();
        assert_eq!(registry.find_texture_slot("desktop"), Some(0));
        assert_eq!(registry.find_texture_slot("tab"), Some(1));
        assert_eq!(registry.find_texture_slot("table"), Some(2));
        assert_eq!(registry.backend().bound.len(), 3);
        assert_eq!(shader.frame().use_lighting, 1);
    }

    #[test]
    fn test_missing_textures_do_not_stop_preparation() {
        let mut scene = composer();
        let mut shader = ShaderState::new();
        scene.prepare_scene(&mut shader).unwrap();

        assert_eq!(scene.registry().texture_count(), 0);
        assert_eq!(scene.registry().materials().len(), 4);
        assert!(scene.registry().find_material("screen").is_some());

        let key = shader.frame().lights[0];
        assert_eq!(key.position, [0.0, 8.0, 10.0]);
        assert_eq!(key.focal_strength, 32.0);
        let fill = shader.frame().lights[1];
        assert_eq!(fill.diffuse_color, [0.2, 0.0, 0.25]);
    }

    #[test]
    fn test_render_scene_draw_list() {
        let mut scene = composer();
        let mut shader = ShaderState::new();
        scene.prepare_scene(&mut shader).unwrap();
        scene.render_scene(&mut shader);

        let draws = shader.draws();
        // table, stand (5), monitor, screen, tab, keyboard, 100 keys, mouse, 2 speakers x 2
        assert_eq!(draws.len(), 1 + 5 + 3 + 1 + 100 + 1 + 4);
        assert_eq!(draws[0].shape, ShapeKind::Plane);
        assert_eq!(draws[1].shape, ShapeKind::Cylinder);
        assert_eq!(draws[draws.len() - 1].shape, ShapeKind::Cylinder);
        assert!(draws.iter().any(|d| d.shape == ShapeKind::HalfSphere));
        assert_eq!(draws.iter().filter(|d| d.shape == ShapeKind::Torus).count(), 2);
        // nothing is textured without images
        assert!(draws.iter().all(|d| d.object.use_texture == 0));
    }

    #[test]
    fn test_textured_objects_use_their_slots() {
        let mut scene = composer();
        for tag in ["desktop", "tab", "table"] {
            scene.registry_mut().register_decoded_texture(&white_image(), tag);
        }
        scene.registry_mut().bind_all_textures().unwrap();
        scene.define_object_materials();

        let mut shader = ShaderState::new();
        scene.render_scene(&mut shader);
        let draws = shader.draws();

        let table = draws[0].object;
        assert_eq!((table.use_texture, table.texture_slot), (1, 2));
        // the stand after the table is untextured
        assert_eq!(draws[1].object.use_texture, 0);

        let screens: Vec<_> = draws.iter().filter(|d| d.shape == ShapeKind::Plane).skip(1).collect();
        assert_eq!(screens.len(), 2);
        assert_eq!(screens[0].object.texture_slot, 0);
        assert_eq!(screens[1].object.texture_slot, 1);
        assert_eq!(screens[0].object.shininess, 256.0);
    }

    #[test]
    fn test_missing_texture_disables_texturing() {
        let scene = composer();
        let mut shader = ShaderState::new();
        shader.set_bool("use_texture", true);
        scene.set_shader_texture(&mut shader, "nope");
        assert_eq!(shader.object().use_texture, 0);
        assert_eq!(shader.object().texture_slot, -1);
    }

    #[test]
    fn test_missing_material_keeps_previous() {
        let mut scene = composer();
        scene.define_object_materials();
        let mut shader = ShaderState::new();
        scene.set_shader_material(&mut shader, "greyPlastic");
        let before = *shader.object();
        scene.set_shader_material(&mut shader, "gold");
        assert_eq!(*shader.object(), before);
        assert_eq!(before.ambient_strength, 0.3);
    }

    #[test]
    fn test_shader_color_turns_texturing_off() {
        let scene = composer();
        let mut shader = ShaderState::new();
        shader.set_bool("use_texture", true);
        scene.set_shader_color(&mut shader, 0.5, 0.5, 0.5, 1.0);
        scene.set_texture_uv_scale(&mut shader, 2.0, 3.0);
        assert_eq!(shader.object().use_texture, 0);
        assert_eq!(shader.object().object_color, [0.5, 0.5, 0.5, 1.0]);
        assert_eq!(shader.object().uv_scale, [2.0, 3.0]);
    }

    #[test]
    fn test_model_matrix_applies_scale_then_rotation_then_translation() {
        let t = Transform::new(Vec3::new(2.0, 1.0, 1.0), Vec3::new(0.0, 0.0, 90.0), Vec3::new(0.0, 0.0, 5.0));
        let p = t.model_matrix().transform_point3(Vec3::X);
        // scaled to (2,0,0), rotated onto +Y, moved along Z
        assert!(p.abs_diff_eq(Vec3::new(0.0, 2.0, 5.0), 1e-5));

        let composed = Mat4::from_translation(t.position)
            * Mat4::from_rotation_z(90f32.to_radians())
            * Mat4::from_scale(t.scale);
        assert!(t.model_matrix().abs_diff_eq(composed, 1e-5));
    }

    #[test]
    fn test_normal_matrix_finite_for_flat_plane() {
        let screen = Transform::new(Vec3::new(3.5, 0.0, 1.7), Vec3::new(90.0, 0.0, 0.0), Vec3::ZERO);
        let n = screen.normal_matrix().transform_vector3(Vec3::Y);
        assert!(n.is_finite());
        // plane normal ends up facing the viewer (+Z)
        assert!(n.normalize().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn test_key_grid() {
        let keys = key_positions();
        assert_eq!(keys.len(), 100);
        assert!((keys[0].x - -2.85).abs() < 1e-5);
        assert!((keys[0].z - 6.4).abs() < 1e-5);
        assert!(keys.iter().all(|k| (k.y - 0.1).abs() < 1e-6));
    }

    #[test]
    fn test_release_deletes_textures() {
        let mut scene = composer();
        scene.registry_mut().register_decoded_texture(&white_image(), "table");
        scene.release();
        assert_eq!(scene.registry().find_texture_slot("table"), None);
        assert_eq!(scene.registry().backend().released.len(), 1);
        assert!(scene.registry().backend().live.is_empty());
    }
}

//! Primitive meshes used to build the scene.
//!
//! All shapes are unit sized and centred the way the scene transforms expect:
//! the plane spans [-1, 1] in X and Z at y = 0, the box is a unit cube centred
//! on the origin, the cylinder stands on y = 0 with height 1 and radius 1, the
//! torus lies in the XY plane, and the half sphere is the dome above y = 0.

use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;
use wgpu::util::DeviceExt;

const ROUND_SEGMENTS: u32 = 36;
const SPHERE_RINGS: u32 = 18;
const TORUS_TUBE_SEGMENTS: u32 = 18;
const TORUS_MAIN_RADIUS: f32 = 1.0;
const TORUS_TUBE_RADIUS: f32 = 0.2;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    fn new(pos: Vec3, normal: Vec3, uv: [f32; 2]) -> Self {
        Self {
            pos: pos.to_array(),
            normal: normal.to_array(),
            uv,
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Plane,
    Box,
    Cylinder,
    Torus,
    Sphere,
    HalfSphere,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 6] = [
        ShapeKind::Plane,
        ShapeKind::Box,
        ShapeKind::Cylinder,
        ShapeKind::Torus,
        ShapeKind::Sphere,
        ShapeKind::HalfSphere,
    ];

    pub fn mesh(self) -> Mesh {
        match self {
            ShapeKind::Plane => Mesh::plane(),
            ShapeKind::Box => Mesh::cube(),
            ShapeKind::Cylinder => Mesh::cylinder(ROUND_SEGMENTS),
            ShapeKind::Torus => Mesh::torus(TORUS_MAIN_RADIUS, TORUS_TUBE_RADIUS, ROUND_SEGMENTS, TORUS_TUBE_SEGMENTS),
            ShapeKind::Sphere => Mesh::sphere(ROUND_SEGMENTS, SPHERE_RINGS),
            ShapeKind::HalfSphere => Mesh::half_sphere(ROUND_SEGMENTS, SPHERE_RINGS / 2),
        }
    }
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.indices.is_empty()
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }

    /// Append a quad given counter-clockwise corners.
    fn push_quad(&mut self, corners: [Vertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Triangles between consecutive rows of a `(rows + 1) x (cols + 1)` grid
    /// starting at vertex `base`.
    fn push_grid_indices(&mut self, base: u32, rows: u32, cols: u32) {
        for r in 0..rows {
            for c in 0..cols {
                let a = base + r * (cols + 1) + c;
                let b = a + cols + 1;
                self.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
    }

    /// Flat disc at height `y` facing `normal_y` (+1 or -1).
    fn push_disc(&mut self, y: f32, normal_y: f32, segments: u32) {
        let normal = Vec3::new(0.0, normal_y, 0.0);
        let center = self.vertices.len() as u32;
        self.vertices.push(Vertex::new(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]));
        for i in 0..=segments {
            let a = i as f32 * TAU / segments as f32;
            let (s, c) = a.sin_cos();
            self.vertices.push(Vertex::new(
                Vec3::new(c, y, s),
                normal,
                [0.5 + 0.5 * c, 0.5 + 0.5 * s],
            ));
        }
        for i in 0..segments {
            let (cur, next) = (center + 1 + i, center + 2 + i);
            if normal_y > 0.0 {
                self.indices.extend_from_slice(&[center, next, cur]);
            } else {
                self.indices.extend_from_slice(&[center, cur, next]);
            }
        }
    }

    pub fn plane() -> Self {
        let mut mesh = Mesh::default();
        mesh.push_quad([
            Vertex::new(Vec3::new(-1.0, 0.0, 1.0), Vec3::Y, [0.0, 0.0]),
            Vertex::new(Vec3::new(1.0, 0.0, 1.0), Vec3::Y, [1.0, 0.0]),
            Vertex::new(Vec3::new(1.0, 0.0, -1.0), Vec3::Y, [1.0, 1.0]),
            Vertex::new(Vec3::new(-1.0, 0.0, -1.0), Vec3::Y, [0.0, 1.0]),
        ]);
        mesh
    }

    pub fn cube() -> Self {
        // (normal, u, v) with u x v = normal
        let faces = [
            (Vec3::X, Vec3::NEG_Z, Vec3::Y),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::X, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
        ];
        let mut mesh = Mesh::default();
        for (n, u, v) in faces {
            let corner = |s: f32, t: f32| {
                Vertex::new((n + u * s + v * t) * 0.5, n, [(s + 1.0) * 0.5, (t + 1.0) * 0.5])
            };
            mesh.push_quad([
                corner(-1.0, -1.0),
                corner(1.0, -1.0),
                corner(1.0, 1.0),
                corner(-1.0, 1.0),
            ]);
        }
        mesh
    }

    pub fn cylinder(segments: u32) -> Self {
        let segs = segments.max(3);
        let mut mesh = Mesh::default();

        let base = mesh.vertices.len() as u32;
        for y in [0.0f32, 1.0] {
            for i in 0..=segs {
                let a = i as f32 * TAU / segs as f32;
                let (s, c) = a.sin_cos();
                mesh.vertices.push(Vertex::new(
                    Vec3::new(c, y, s),
                    Vec3::new(c, 0.0, s),
                    [i as f32 / segs as f32, y],
                ));
            }
        }
        mesh.push_grid_indices(base, 1, segs);

        mesh.push_disc(1.0, 1.0, segs);
        mesh.push_disc(0.0, -1.0, segs);
        mesh
    }

    pub fn torus(main_radius: f32, tube_radius: f32, main_segments: u32, tube_segments: u32) -> Self {
        let (main_segs, tube_segs) = (main_segments.max(3), tube_segments.max(3));
        let mut mesh = Mesh::default();
        for i in 0..=main_segs {
            let u = i as f32 * TAU / main_segs as f32;
            let (su, cu) = u.sin_cos();
            for j in 0..=tube_segs {
                let v = j as f32 * TAU / tube_segs as f32;
                let (sv, cv) = v.sin_cos();
                let normal = Vec3::new(cv * cu, cv * su, sv);
                let ring = main_radius + tube_radius * cv;
                mesh.vertices.push(Vertex::new(
                    Vec3::new(ring * cu, ring * su, tube_radius * sv),
                    normal,
                    [i as f32 / main_segs as f32, j as f32 / tube_segs as f32],
                ));
            }
        }
        mesh.push_grid_indices(0, main_segs, tube_segs);
        mesh
    }

    /// Latitude band between polar angle `max_theta` and the top pole.
    /// Rows run bottom to top so the grid winds outwards.
    fn sphere_band(long_segs: u32, lat_segs: u32, max_theta: f32) -> Self {
        let mut mesh = Mesh::default();
        for lat in 0..=lat_segs {
            let theta = max_theta - lat as f32 * max_theta / lat_segs as f32;
            let (st, ct) = theta.sin_cos();
            for long in 0..=long_segs {
                let phi = long as f32 * TAU / long_segs as f32;
                let (sp, cp) = phi.sin_cos();
                let p = Vec3::new(st * cp, ct, st * sp);
                mesh.vertices.push(Vertex::new(
                    p,
                    p,
                    [long as f32 / long_segs as f32, 1.0 - theta / PI],
                ));
            }
        }
        mesh.push_grid_indices(0, lat_segs, long_segs);
        mesh
    }

    pub fn sphere(longitude_segments: u32, latitude_segments: u32) -> Self {
        Self::sphere_band(longitude_segments.max(3), latitude_segments.max(2), PI)
    }

    /// Upper hemisphere closed by a disc at y = 0.
    pub fn half_sphere(longitude_segments: u32, latitude_segments: u32) -> Self {
        let long_segs = longitude_segments.max(3);
        let mut mesh = Self::sphere_band(long_segs, latitude_segments.max(1), FRAC_PI_2);
        mesh.push_disc(0.0, -1.0, long_segs);
        mesh
    }
}

/// GPU buffers for every [`ShapeKind`].
pub struct ShapeMeshes {
    buffers: HashMap<ShapeKind, MeshBuffer>,
}

impl ShapeMeshes {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffers = ShapeKind::ALL
            .iter()
            .map(|&kind| (kind, kind.mesh().upload(device)))
            .collect();
        Self { buffers }
    }

    pub fn get(&self, kind: ShapeKind) -> Option<&MeshBuffer> {
        self.buffers.get(&kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_well_formed(mesh: &Mesh) {
        assert!(!mesh.is_empty());
        assert_eq!(mesh.indices.len() % 3, 0);
        let count = mesh.vertices.len() as u32;
        assert!(mesh.indices.iter().all(|&i| i < count));
        for v in &mesh.vertices {
            let n = Vec3::from_array(v.normal);
            assert!((n.length() - 1.0).abs() < 1e-4, "normal {n:?}");
        }
    }

    /// Winding agrees with the stored normals.
    fn assert_outward_winding(mesh: &Mesh) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let (pa, pb, pc) = (Vec3::from_array(a.pos), Vec3::from_array(b.pos), Vec3::from_array(c.pos));
            let face = (pb - pa).cross(pc - pa);
            if face.length_squared() < 1e-10 {
                continue; // degenerate pole triangle
            }
            let normal = Vec3::from_array(a.normal) + Vec3::from_array(b.normal) + Vec3::from_array(c.normal);
            assert!(face.dot(normal) > 0.0);
        }
    }

    #[test]
    fn test_every_shape_is_well_formed() {
        for kind in ShapeKind::ALL {
            let mesh = kind.mesh();
            assert_well_formed(&mesh);
            assert_outward_winding(&mesh);
        }
    }

    #[test]
    fn test_plane_spans_unit_square() {
        let plane = Mesh::plane();
        assert_eq!(plane.vertices.len(), 4);
        assert_eq!(plane.indices.len(), 6);
        assert!(plane.vertices.iter().all(|v| v.pos[1] == 0.0 && v.pos[0].abs() == 1.0 && v.pos[2].abs() == 1.0));
    }

    #[test]
    fn test_cube_is_centred_unit() {
        let cube = Mesh::cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        for v in &cube.vertices {
            assert!(v.pos.iter().all(|c| (c.abs() - 0.5).abs() < 1e-6));
        }
    }

    #[test]
    fn test_cylinder_stands_on_origin() {
        let cyl = Mesh::cylinder(12);
        let (min_y, max_y) = cyl
            .vertices
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), v| (lo.min(v.pos[1]), hi.max(v.pos[1])));
        assert_eq!((min_y, max_y), (0.0, 1.0));
        // side + two caps
        assert_eq!(cyl.indices.len(), (12 * 6 + 12 * 3 * 2) as usize);
    }

    #[test]
    fn test_torus_lies_in_xy_plane() {
        let torus = Mesh::torus(1.0, 0.2, 16, 8);
        for v in &torus.vertices {
            assert!(v.pos[2].abs() <= 0.2 + 1e-6);
            let r = (v.pos[0] * v.pos[0] + v.pos[1] * v.pos[1]).sqrt();
            assert!((0.8 - 1e-5..=1.2 + 1e-5).contains(&r));
        }
    }

    #[test]
    fn test_half_sphere_is_upper_dome() {
        let dome = Mesh::half_sphere(16, 8);
        assert!(dome.vertices.iter().all(|v| v.pos[1] >= -1e-6));
        assert!(dome.vertices.iter().any(|v| (v.pos[1] - 1.0).abs() < 1e-6));
        let sphere = Mesh::sphere(16, 8);
        assert!(sphere.vertices.iter().any(|v| (v.pos[1] + 1.0).abs() < 1e-6));
    }
}

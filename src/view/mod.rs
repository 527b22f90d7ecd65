// VIEW: GPU setup, meshes, textures and rendering
pub mod gpu_init;
pub mod meshes;
pub mod render;
pub mod texture;
pub mod uniforms;

pub use gpu_init::GpuContext;
pub use meshes::{Mesh, MeshBuffer, ShapeKind, ShapeMeshes, Vertex};
pub use render::{OverlayFrame, RenderState};
pub use texture::WgpuTextureBackend;
pub use uniforms::{DrawCommand, ShaderState, UniformSink, UniformValue};

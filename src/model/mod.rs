// MODEL: camera state and scene resources
pub mod camera;
pub mod material;
pub mod registry;

pub use camera::{Camera, CameraPose, ProjectionMode};
pub use material::Material;
pub use registry::{DecodedImage, PixelFormat, ResourceRegistry, TextureBackend, TextureHandle, MAX_TEXTURE_SLOTS};

pub mod sampler;
pub mod texture;

pub use sampler::{MinFilter, SamplerConfig};
pub use texture::{ColorSpace, RawBuffer, TextureRequest, TextureSource};

/// Chunk3D Core Library - Binary scene decoder
///
/// Reads a tagged, length-prefixed record stream into a scene of triangle
/// meshes and named materials, with smoothed per-vertex normals.

pub mod error;
pub mod geometry;
pub mod material;
pub mod normals;
pub mod record;
pub mod scene;
pub mod tags;
pub mod transform;

// Re-export commonly used types
pub use error::{DecodeError, FormatError, Result};
pub use geometry::{Entity, Triangle, Uv};
pub use material::{Material, MaterialTable, Rgb, TextureRef};
pub use record::{ProgressObserver, Record, RecordReader};
pub use scene::{decode, decode_bytes, DecodeReport, Scene, SceneDecoder};
pub use transform::AxisRemap;

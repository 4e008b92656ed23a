/// Record tags understood by the decoder

pub const PRIMARY: u16 = 0x4D4D;
pub const VERSION: u16 = 0x0002;

// Editor section
pub const OBJECT_INFO: u16 = 0x3D3D;
pub const MESH_VERSION: u16 = 0x3D3E;

// Color and percentage leaf payloads
pub const COLOR_F: u16 = 0x0010;
pub const COLOR_24: u16 = 0x0011;
pub const LIN_COLOR_24: u16 = 0x0012;
pub const LIN_COLOR_F: u16 = 0x0013;
pub const INT_PERCENTAGE: u16 = 0x0030;
pub const FLOAT_PERCENTAGE: u16 = 0x0031;

// Materials
pub const MATERIAL: u16 = 0xAFFF;
pub const MAT_NAME: u16 = 0xA000;
pub const MAT_AMBIENT: u16 = 0xA010;
pub const MAT_DIFFUSE: u16 = 0xA020;
pub const MAT_SPECULAR: u16 = 0xA030;
pub const MAT_SHININESS: u16 = 0xA040;
pub const MAT_TRANSPARENCY: u16 = 0xA050;
pub const MAT_TEXMAP: u16 = 0xA200;
pub const MAT_MAP_FILENAME: u16 = 0xA300;

// Objects and meshes
pub const NAMED_OBJECT: u16 = 0x4000;
pub const TRI_OBJECT: u16 = 0x4100;
pub const POINT_ARRAY: u16 = 0x4110;
pub const FACE_ARRAY: u16 = 0x4120;
pub const MSH_MAT_GROUP: u16 = 0x4130;
pub const TEX_VERTS: u16 = 0x4140;

/// Size of a record header: u16 tag + u32 length.
pub const HEADER_LEN: u32 = 6;

/// Lowest and highest tag a container child may carry. Unknown tags in
/// between are skipped; anything outside means the header is garbage.
/// The upper bound admits the keyframer section (0xB000..).
pub const MIN_TAG: u16 = 0x0002;
pub const MAX_TAG: u16 = 0xBFFF;

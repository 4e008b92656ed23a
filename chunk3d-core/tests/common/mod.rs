// Common test utilities: an in-memory record writer and model fixtures
#![allow(dead_code)]

use chunk3d_core::tags;

/// A record under construction. Children are serialized into the body as
/// they are added, so the declared length is always exact unless overridden.
#[derive(Debug, Clone)]
pub struct Chunk {
    tag: u16,
    body: Vec<u8>,
    length_override: Option<u32>,
}

impl Chunk {
    pub fn new(tag: u16) -> Self {
        Self {
            tag,
            body: Vec::new(),
            length_override: None,
        }
    }

    pub fn u8(mut self, v: u8) -> Self {
        self.body.push(v);
        self
    }

    pub fn u16(mut self, v: u16) -> Self {
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(mut self, v: u32) -> Self {
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.body.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn cstr(mut self, s: &str) -> Self {
        self.body.extend_from_slice(s.as_bytes());
        self.body.push(0);
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(bytes);
        self
    }

    pub fn child(mut self, child: Chunk) -> Self {
        self.body.extend(child.to_bytes());
        self
    }

    pub fn children(self, children: impl IntoIterator<Item = Chunk>) -> Self {
        children.into_iter().fold(self, Chunk::child)
    }

    /// Declare a length that disagrees with the body.
    pub fn declared_length(mut self, length: u32) -> Self {
        self.length_override = Some(length);
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let length = self
            .length_override
            .unwrap_or(6 + self.body.len() as u32);
        let mut out = self.tag.to_le_bytes().to_vec();
        out.extend_from_slice(&length.to_le_bytes());
        out.extend_from_slice(&self.body);
        out
    }
}

/// Whole file: primary container with a version record and the given children.
pub fn model_file(children: impl IntoIterator<Item = Chunk>) -> Vec<u8> {
    Chunk::new(tags::PRIMARY)
        .child(Chunk::new(tags::VERSION).u32(3))
        .children(children)
        .to_bytes()
}

/// Object-info container with its customary leading mesh-version record.
pub fn object_info(children: impl IntoIterator<Item = Chunk>) -> Chunk {
    Chunk::new(tags::OBJECT_INFO)
        .child(Chunk::new(tags::MESH_VERSION).u32(3))
        .children(children)
}

pub fn named_object(name: &str, children: impl IntoIterator<Item = Chunk>) -> Chunk {
    Chunk::new(tags::NAMED_OBJECT).cstr(name).children(children)
}

pub fn tri_object(children: impl IntoIterator<Item = Chunk>) -> Chunk {
    Chunk::new(tags::TRI_OBJECT).children(children)
}

pub fn point_array(points: &[[f32; 3]]) -> Chunk {
    points
        .iter()
        .fold(Chunk::new(tags::POINT_ARRAY).u16(points.len() as u16), |c, p| {
            c.f32(p[0]).f32(p[1]).f32(p[2])
        })
}

pub fn face_array(faces: &[[u16; 3]], groups: Vec<Chunk>) -> Chunk {
    faces
        .iter()
        .fold(Chunk::new(tags::FACE_ARRAY).u16(faces.len() as u16), |c, f| {
            c.u16(f[0]).u16(f[1]).u16(f[2]).u16(0x0007)
        })
        .children(groups)
}

pub fn material_group(name: &str, faces: &[u16]) -> Chunk {
    faces.iter().fold(
        Chunk::new(tags::MSH_MAT_GROUP).cstr(name).u16(faces.len() as u16),
        |c, &f| c.u16(f),
    )
}

pub fn tex_verts(uvs: &[[f32; 2]]) -> Chunk {
    uvs.iter()
        .fold(Chunk::new(tags::TEX_VERTS).u16(uvs.len() as u16), |c, uv| {
            c.f32(uv[0]).f32(uv[1])
        })
}

pub fn color_24(slot: u16, rgb: [u8; 3]) -> Chunk {
    Chunk::new(slot).child(Chunk::new(tags::COLOR_24).u8(rgb[0]).u8(rgb[1]).u8(rgb[2]))
}

pub fn color_f(slot: u16, rgb: [f32; 3]) -> Chunk {
    Chunk::new(slot).child(Chunk::new(tags::COLOR_F).f32(rgb[0]).f32(rgb[1]).f32(rgb[2]))
}

pub fn int_percentage(slot: u16, value: u16) -> Chunk {
    Chunk::new(slot).child(Chunk::new(tags::INT_PERCENTAGE).u16(value))
}

pub fn material(name: &str, diffuse: [u8; 3]) -> Chunk {
    Chunk::new(tags::MATERIAL)
        .child(Chunk::new(tags::MAT_NAME).cstr(name))
        .child(color_24(tags::MAT_DIFFUSE, diffuse))
}

/// Corner `i` of a 2-unit cube centred on the origin, file axes. Bit 0 of
/// `i` is +x, bit 1 is +y, bit 2 is +z.
pub fn cube_points() -> Vec<[f32; 3]> {
    (0..8)
        .map(|i| {
            let s = |bit: u32| if i & (1 << bit) != 0 { 1.0 } else { -1.0 };
            [s(0), s(1), s(2)]
        })
        .collect()
}

/// Twelve outward-wound triangles over [`cube_points`].
pub fn cube_faces() -> Vec<[u16; 3]> {
    vec![
        [0, 2, 1],
        [1, 2, 3],
        [4, 5, 6],
        [5, 7, 6],
        [0, 1, 5],
        [0, 5, 4],
        [2, 6, 7],
        [2, 7, 3],
        [0, 4, 6],
        [0, 6, 2],
        [1, 3, 7],
        [1, 7, 5],
    ]
}

pub fn cube_object(name: &str) -> Chunk {
    named_object(
        name,
        [tri_object([
            point_array(&cube_points()),
            face_array(&cube_faces(), vec![]),
        ])],
    )
}

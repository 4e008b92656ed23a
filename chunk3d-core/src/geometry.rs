/// Mesh entities and their assembly from geometry records
use std::sync::Arc;

use nalgebra::{Point3, Vector3};
use nom::{
    multi::count,
    number::complete::{le_f32, le_u16},
    sequence::tuple,
    IResult,
};
use tracing::warn;

use crate::error::{FormatError, Result};
use crate::material::Material;
use crate::normals;
use crate::transform::AxisRemap;

/// Texture coordinate, one per vertex
pub type Uv = [f32; 2];

/// A triangle referencing three vertices of its entity
#[derive(Debug, Clone)]
pub struct Triangle {
    pub indices: [u32; 3],
    pub material: Arc<Material>,
}

impl Triangle {
    pub fn new(indices: [u32; 3], material: Arc<Material>) -> Self {
        Self { indices, material }
    }
}

/// A completed mesh: always has at least one vertex and one triangle, and
/// every triangle index is in range.
#[derive(Debug, Clone)]
pub struct Entity {
    pub name: String,
    /// Positions, already in Y-up axes.
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<Triangle>,
    /// Same length as `vertices` when present.
    pub uvs: Option<Vec<Uv>>,
    /// One per vertex once [`Entity::compute_normals`] has run, empty before.
    pub normals: Vec<Vector3<f64>>,
}

impl Entity {
    pub fn compute_normals(&mut self) {
        self.normals = normals::vertex_normals(&self.vertices, &self.triangles);
    }

    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for v in &self.vertices[1..] {
            min = min.inf(v);
            max = max.sup(v);
        }
        Some((min, max))
    }
}

/// Accumulates one entity's geometry while its records are decoded.
#[derive(Debug, Default)]
pub(crate) struct EntityBuilder {
    pub name: String,
    pub vertices: Vec<Point3<f64>>,
    pub triangles: Vec<Triangle>,
    pub uvs: Option<Vec<Uv>>,
}

impl EntityBuilder {
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Point the triangle at `face` to `material`. Returns `false` when the
    /// face does not exist.
    pub fn assign_material(&mut self, face: u16, material: &Arc<Material>) -> bool {
        match self.triangles.get_mut(usize::from(face)) {
            Some(triangle) => {
                triangle.material = Arc::clone(material);
                true
            }
            None => false,
        }
    }

    /// Validate and seal the entity. Incomplete or inconsistent geometry
    /// yields `Ok(None)`; a UV array whose length disagrees with the vertex
    /// count is an error.
    pub fn finish(self) -> Result<Option<Entity>> {
        if self.vertices.is_empty() || self.triangles.is_empty() {
            warn!(
                "dropping entity '{}': {} vertices, {} triangles",
                self.name,
                self.vertices.len(),
                self.triangles.len()
            );
            return Ok(None);
        }

        let vertex_count = self.vertices.len();
        if let Some(bad) = self
            .triangles
            .iter()
            .position(|t| t.indices.iter().any(|&i| i as usize >= vertex_count))
        {
            warn!(
                "dropping entity '{}': face {} references a vertex beyond {}",
                self.name, bad, vertex_count
            );
            return Ok(None);
        }

        if let Some(uvs) = &self.uvs {
            if uvs.len() != vertex_count {
                return Err(FormatError::UvCountMismatch {
                    entity: self.name,
                    uvs: uvs.len(),
                    vertices: vertex_count,
                }
                .into());
            }
        }

        Ok(Some(Entity {
            name: self.name,
            vertices: self.vertices,
            triangles: self.triangles,
            uvs: self.uvs,
            normals: Vec::new(),
        }))
    }
}

fn point(input: &[u8]) -> IResult<&[u8], Point3<f64>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, AxisRemap::point(x, y, z)))
}

/// Three vertex indices followed by edge-visibility flags, which are dropped.
fn face(input: &[u8]) -> IResult<&[u8], [u32; 3]> {
    let (input, (a, b, c, _flags)) = tuple((le_u16, le_u16, le_u16, le_u16))(input)?;
    Ok((input, [a.into(), b.into(), c.into()]))
}

fn uv(input: &[u8]) -> IResult<&[u8], Uv> {
    let (input, (u, v)) = tuple((le_f32, le_f32))(input)?;
    Ok((input, [u, v]))
}

pub(crate) const POINT_STRIDE: u32 = 12;
pub(crate) const FACE_STRIDE: u32 = 8;
pub(crate) const UV_STRIDE: u32 = 8;

pub(crate) fn points(input: &[u8], n: usize) -> IResult<&[u8], Vec<Point3<f64>>> {
    count(point, n)(input)
}

pub(crate) fn faces(input: &[u8], n: usize) -> IResult<&[u8], Vec<[u32; 3]>> {
    count(face, n)(input)
}

pub(crate) fn uvs(input: &[u8], n: usize) -> IResult<&[u8], Vec<Uv>> {
    count(uv, n)(input)
}

pub(crate) fn face_indices(input: &[u8], n: usize) -> IResult<&[u8], Vec<u16>> {
    count(le_u16, n)(input)
}

/// Recursive-descent scene decoder
use std::io::{Cursor, Read, Seek};

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::geometry::{self, Entity, EntityBuilder, Triangle, FACE_STRIDE, POINT_STRIDE, UV_STRIDE};
use crate::material::{self, ColorSlot, MaterialBuilder, MaterialTable, TextureRef};
use crate::record::{payload_error, ProgressObserver, Record, RecordReader};
use crate::tags;

/// A decoded model: completed entities in file order and the materials they use.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    pub version: Option<u32>,
    pub entities: Vec<Entity>,
    pub materials: MaterialTable,
}

impl Scene {
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    pub fn vertex_count(&self) -> usize {
        self.entities.iter().map(|e| e.vertices.len()).sum()
    }

    pub fn triangle_count(&self) -> usize {
        self.entities.iter().map(|e| e.triangles.len()).sum()
    }
}

/// What the decoder recovered from without failing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodeReport {
    /// Record headers read, leaf payload headers included.
    pub records: usize,
    /// Records with a tag the decoder does not interpret.
    pub skipped: usize,
    /// Interpreted records that still had unread bytes when skipped.
    pub resynced: usize,
    pub dropped_entities: usize,
    pub duplicate_materials: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Parsed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeaderCheck {
    Container,
    Leaf,
}

/// Walks the record tree of one stream and builds a [`Scene`].
pub struct SceneDecoder<'a, R> {
    reader: RecordReader<'a, R>,
    scene: Scene,
    report: DecodeReport,
}

impl<'a, R: Read + Seek> SceneDecoder<'a, R> {
    pub fn new(stream: &'a mut R) -> Result<Self> {
        Ok(Self {
            reader: RecordReader::new(stream)?,
            scene: Scene::default(),
            report: DecodeReport::default(),
        })
    }

    /// Report progress to `observer` at every record header.
    pub fn with_progress(mut self, observer: &'a mut dyn ProgressObserver) -> Self {
        self.reader = self.reader.with_progress(observer);
        self
    }

    pub fn decode(self) -> Result<Scene> {
        self.decode_with_report().map(|(scene, _)| scene)
    }

    pub fn decode_with_report(mut self) -> Result<(Scene, DecodeReport)> {
        debug!("decoding {} byte stream", self.reader.total_len());

        // The whole-file container spans the rest of the stream, so it is
        // walked but never skipped.
        let mut primary = self.reader.read_top_level()?;
        self.for_each_child(&mut primary, Self::scene_child)?;

        self.report.records = self.reader.headers_read();
        debug!(
            "decoded {} entities, {} materials ({:?})",
            self.scene.entities.len(),
            self.scene.materials.len(),
            self.report
        );
        Ok((self.scene, self.report))
    }

    /// Dispatch every child of `parent` to `handle`, then resynchronize on the
    /// child's absolute end before moving to its next sibling.
    fn walk<F>(&mut self, parent: &mut Record, check: HeaderCheck, mut handle: F) -> Result<()>
    where
        F: FnMut(&mut Self, &mut Record) -> Result<Disposition>,
    {
        while !parent.is_exhausted() {
            let mut child = match check {
                HeaderCheck::Container => self.reader.next_child(parent)?,
                HeaderCheck::Leaf => self.reader.leaf_child(parent)?,
            };

            match handle(self, &mut child)? {
                Disposition::Skipped => {
                    trace!("skipping record 0x{:04X}", child.tag);
                    self.report.skipped += 1;
                }
                Disposition::Parsed if !child.is_exhausted() => {
                    warn!(
                        "record 0x{:04X} at {} left {} bytes unread",
                        child.tag,
                        child.start,
                        child.remaining()
                    );
                    self.report.resynced += 1;
                }
                Disposition::Parsed => {}
            }

            self.reader.skip_to_end(&mut child)?;
            parent.advance(child.length)?;
        }
        Ok(())
    }

    fn for_each_child<F>(&mut self, parent: &mut Record, handle: F) -> Result<()>
    where
        F: FnMut(&mut Self, &mut Record) -> Result<Disposition>,
    {
        self.walk(parent, HeaderCheck::Container, handle)
    }

    fn for_each_leaf<F>(&mut self, parent: &mut Record, handle: F) -> Result<()>
    where
        F: FnMut(&mut Self, &mut Record) -> Result<Disposition>,
    {
        self.walk(parent, HeaderCheck::Leaf, handle)
    }

    /// Children of the whole-file container and of the object-info container.
    fn scene_child(&mut self, record: &mut Record) -> Result<Disposition> {
        match record.tag {
            tags::VERSION => {
                let version = self.reader.read_u32(record)?;
                debug!("file version {version}");
                self.scene.version = Some(version);
            }
            tags::OBJECT_INFO => self.read_object_info(record)?,
            tags::MATERIAL => self.read_material(record)?,
            tags::NAMED_OBJECT => self.read_named_object(record)?,
            _ => return Ok(Disposition::Skipped),
        }
        Ok(Disposition::Parsed)
    }

    fn read_object_info(&mut self, record: &mut Record) -> Result<()> {
        // The leading sub-record (usually a mesh version) is not interpreted.
        if !record.is_exhausted() {
            let mut leading = self.reader.next_child(record)?;
            trace!("ignoring leading record 0x{:04X}", leading.tag);
            self.reader.skip_to_end(&mut leading)?;
            record.advance(leading.length)?;
        }
        self.for_each_child(record, Self::scene_child)
    }

    fn read_material(&mut self, record: &mut Record) -> Result<()> {
        let mut builder = MaterialBuilder::default();
        self.for_each_child(record, |dec, child| dec.material_child(child, &mut builder))?;

        match builder.finish() {
            Some((name, material)) => {
                if self.scene.materials.contains(&name) {
                    warn!("duplicate material '{name}' ignored");
                    self.report.duplicate_materials += 1;
                } else {
                    debug!("material '{name}'");
                    self.scene.materials.insert(name, material);
                }
            }
            None => warn!("material at {} has no name, ignored", record.start),
        }
        Ok(())
    }

    fn material_child(
        &mut self,
        record: &mut Record,
        builder: &mut MaterialBuilder,
    ) -> Result<Disposition> {
        match record.tag {
            tags::MAT_NAME => builder.name = Some(self.reader.read_cstring(record)?),
            tags::MAT_AMBIENT => self.read_color(record, builder, ColorSlot::Ambient)?,
            tags::MAT_DIFFUSE => self.read_color(record, builder, ColorSlot::Diffuse)?,
            tags::MAT_SPECULAR => self.read_color(record, builder, ColorSlot::Specular)?,
            tags::MAT_SHININESS => {
                if let Some(shininess) = self.read_percentage(record)? {
                    builder.material.shininess = shininess;
                }
            }
            tags::MAT_TRANSPARENCY => {
                if let Some(transparency) = self.read_percentage(record)? {
                    builder.material.transparency = transparency;
                }
            }
            tags::MAT_TEXMAP => builder.material.texture = Some(self.read_texture_map(record)?),
            _ => return Ok(Disposition::Skipped),
        }
        Ok(Disposition::Parsed)
    }

    fn read_color(
        &mut self,
        record: &mut Record,
        builder: &mut MaterialBuilder,
        slot: ColorSlot,
    ) -> Result<()> {
        self.for_each_leaf(record, |dec, leaf| {
            let (len, linear) = match leaf.tag {
                tags::COLOR_F => (12, false),
                tags::LIN_COLOR_F => (12, true),
                tags::COLOR_24 => (3, false),
                tags::LIN_COLOR_24 => (3, true),
                _ => return Ok(Disposition::Skipped),
            };
            let tag = leaf.tag;
            let raw = dec.reader.read_bytes(leaf, len)?;
            let parsed = if len == 12 {
                material::color_f(&raw)
            } else {
                material::color_24(&raw)
            };
            let (_, rgb) = parsed.map_err(|e| payload_error(tag, e))?;
            builder.set_color(slot, rgb, linear);
            Ok(Disposition::Parsed)
        })
    }

    /// Integer percentage from the first percentage sub-record, if any.
    fn read_percentage(&mut self, record: &mut Record) -> Result<Option<u16>> {
        let mut value = None;
        self.for_each_leaf(record, |dec, leaf| {
            if value.is_some() {
                return Ok(Disposition::Skipped);
            }
            match dec.read_percentage_value(leaf)? {
                Some(percent) => {
                    value = Some(percent);
                    Ok(Disposition::Parsed)
                }
                None => Ok(Disposition::Skipped),
            }
        })?;
        Ok(value)
    }

    fn read_percentage_value(&mut self, leaf: &mut Record) -> Result<Option<u16>> {
        match leaf.tag {
            tags::INT_PERCENTAGE => Ok(Some(self.reader.read_u16(leaf)?)),
            tags::FLOAT_PERCENTAGE => {
                let percent = self.reader.read_f32(leaf)?;
                Ok(Some(percent.round().clamp(0.0, f32::from(u16::MAX)) as u16))
            }
            _ => Ok(None),
        }
    }

    /// The image itself is never loaded; only its name and strength are kept.
    fn read_texture_map(&mut self, record: &mut Record) -> Result<TextureRef> {
        let mut texture = TextureRef::default();
        self.for_each_child(record, |dec, child| {
            match child.tag {
                tags::MAT_MAP_FILENAME => texture.file_name = dec.reader.read_cstring(child)?,
                tags::INT_PERCENTAGE | tags::FLOAT_PERCENTAGE => {
                    if let Some(strength) = dec.read_percentage_value(child)? {
                        texture.strength = strength;
                    }
                }
                _ => return Ok(Disposition::Skipped),
            }
            Ok(Disposition::Parsed)
        })?;
        Ok(texture)
    }

    fn read_named_object(&mut self, record: &mut Record) -> Result<()> {
        let name = self.reader.read_cstring(record)?;
        let mut builder = EntityBuilder::new(name);
        self.for_each_child(record, |dec, child| dec.mesh_child(child, &mut builder))?;

        match builder.finish()? {
            Some(mut entity) => {
                entity.compute_normals();
                debug!(
                    "entity '{}': {} vertices, {} triangles",
                    entity.name,
                    entity.vertices.len(),
                    entity.triangles.len()
                );
                self.scene.entities.push(entity);
            }
            None => self.report.dropped_entities += 1,
        }
        Ok(())
    }

    /// Geometry records, either directly under the object or under a
    /// mesh wrapper.
    fn mesh_child(
        &mut self,
        record: &mut Record,
        builder: &mut EntityBuilder,
    ) -> Result<Disposition> {
        match record.tag {
            tags::TRI_OBJECT => {
                self.for_each_child(record, |dec, child| dec.mesh_child(child, builder))?
            }
            tags::POINT_ARRAY => {
                let n = self.reader.read_u16(record)?;
                let tag = record.tag;
                let raw = self.reader.read_bytes(record, u32::from(n) * POINT_STRIDE)?;
                let (_, points) =
                    geometry::points(&raw, n.into()).map_err(|e| payload_error(tag, e))?;
                builder.vertices = points;
            }
            tags::FACE_ARRAY => self.read_faces(record, builder)?,
            tags::TEX_VERTS => {
                let n = self.reader.read_u16(record)?;
                let tag = record.tag;
                let raw = self.reader.read_bytes(record, u32::from(n) * UV_STRIDE)?;
                let (_, uvs) = geometry::uvs(&raw, n.into()).map_err(|e| payload_error(tag, e))?;
                builder.uvs = Some(uvs);
            }
            _ => return Ok(Disposition::Skipped),
        }
        Ok(Disposition::Parsed)
    }

    fn read_faces(&mut self, record: &mut Record, builder: &mut EntityBuilder) -> Result<()> {
        let n = self.reader.read_u16(record)?;
        let tag = record.tag;
        let raw = self.reader.read_bytes(record, u32::from(n) * FACE_STRIDE)?;
        let (_, faces) = geometry::faces(&raw, n.into()).map_err(|e| payload_error(tag, e))?;

        let default = self.scene.materials.default_material();
        builder.triangles = faces
            .into_iter()
            .map(|indices| Triangle::new(indices, default.clone()))
            .collect();

        // Material groups (and smoothing data) trail the face list.
        self.for_each_child(record, |dec, child| match child.tag {
            tags::MSH_MAT_GROUP => {
                dec.read_material_group(child, builder)?;
                Ok(Disposition::Parsed)
            }
            _ => Ok(Disposition::Skipped),
        })
    }

    fn read_material_group(
        &mut self,
        record: &mut Record,
        builder: &mut EntityBuilder,
    ) -> Result<()> {
        let name = self.reader.read_cstring(record)?;
        let material = self.scene.materials.resolve(&name);
        if self.scene.materials.is_default(&material) {
            warn!(
                "entity '{}' uses unknown material '{name}', using default",
                builder.name
            );
        }

        let n = self.reader.read_u16(record)?;
        let tag = record.tag;
        let raw = self.reader.read_bytes(record, u32::from(n) * 2)?;
        let (_, faces) = geometry::face_indices(&raw, n.into()).map_err(|e| payload_error(tag, e))?;

        let missing = faces
            .into_iter()
            .filter(|&face| !builder.assign_material(face, &material))
            .count();
        if missing > 0 {
            warn!(
                "material '{name}' assigned to {missing} faces missing from entity '{}'",
                builder.name
            );
        }
        Ok(())
    }
}

/// Decode a scene from a seekable stream.
pub fn decode<R: Read + Seek>(stream: &mut R) -> Result<Scene> {
    SceneDecoder::new(stream)?.decode()
}

/// Decode a scene held entirely in memory.
pub fn decode_bytes(data: &[u8]) -> Result<Scene> {
    decode(&mut Cursor::new(data))
}

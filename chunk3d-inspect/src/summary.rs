/// Colored text summary of a decoded scene
use std::io::{self, Write};
use std::sync::Arc;

use chunk3d_core::{DecodeReport, Entity, Material, Rgb, Scene};
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};

pub struct Summary<'s> {
    scene: &'s Scene,
    report: &'s DecodeReport,
}

impl<'s> Summary<'s> {
    pub fn new(scene: &'s Scene, report: &'s DecodeReport) -> Self {
        Self { scene, report }
    }

    pub fn draw<W: Write>(&self, writer: &mut W, list_materials: bool) -> io::Result<()> {
        let scene = self.scene;
        let version = scene
            .version
            .map_or_else(|| "?".to_string(), |v| v.to_string());

        writer.queue(SetForegroundColor(Color::Cyan))?;
        writer.queue(Print(format!(
            "version {}: {} entities, {} vertices, {} triangles, {} materials\n",
            version,
            scene.entities.len(),
            scene.vertex_count(),
            scene.triangle_count(),
            scene.materials.len()
        )))?;
        writer.queue(ResetColor)?;

        for entity in &scene.entities {
            self.draw_entity(writer, entity)?;
        }

        if list_materials {
            for (name, material) in scene.materials.iter() {
                draw_material(writer, name, material)?;
            }
        }

        self.draw_report(writer)?;
        writer.flush()
    }

    fn draw_entity<W: Write>(&self, writer: &mut W, entity: &Entity) -> io::Result<()> {
        let size = entity
            .bounds()
            .map(|(min, max)| max - min)
            .map(|s| format!("{:.2} x {:.2} x {:.2}", s.x, s.y, s.z))
            .unwrap_or_default();

        writer.queue(SetForegroundColor(Color::White))?;
        writer.queue(Print(format!("  {:<20}", entity.name)))?;
        writer.queue(ResetColor)?;
        writer.queue(Print(format!(
            " {:>6} vertices {:>6} triangles  uv:{}  size {}  materials: {}\n",
            entity.vertices.len(),
            entity.triangles.len(),
            if entity.has_uvs() { "yes" } else { "no" },
            size,
            self.material_names(entity).join(", ")
        )))?;
        Ok(())
    }

    /// Distinct material names used by an entity, in first-use order.
    fn material_names(&self, entity: &Entity) -> Vec<String> {
        let mut used: Vec<&Arc<Material>> = Vec::new();
        for triangle in &entity.triangles {
            if !used.iter().any(|m| Arc::ptr_eq(m, &triangle.material)) {
                used.push(&triangle.material);
            }
        }

        used.into_iter()
            .map(|material| {
                if self.scene.materials.is_default(material) {
                    return "(default)".to_string();
                }
                self.scene
                    .materials
                    .iter()
                    .find(|(_, m)| std::ptr::eq(*m, material.as_ref()))
                    .map_or_else(|| "(unnamed)".to_string(), |(name, _)| name.to_string())
            })
            .collect()
    }

    fn draw_report<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        let clean = report.skipped == 0
            && report.resynced == 0
            && report.dropped_entities == 0
            && report.duplicate_materials == 0;

        writer.queue(SetForegroundColor(if clean {
            Color::DarkGrey
        } else {
            Color::Yellow
        }))?;
        writer.queue(Print(format!(
            "records {}, skipped {}, resynced {}, dropped entities {}, duplicate materials {}\n",
            report.records,
            report.skipped,
            report.resynced,
            report.dropped_entities,
            report.duplicate_materials
        )))?;
        writer.queue(ResetColor)?;
        Ok(())
    }
}

fn hex(rgb: &Rgb) -> String {
    let byte = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", byte(rgb[0]), byte(rgb[1]), byte(rgb[2]))
}

fn draw_material<W: Write>(writer: &mut W, name: &str, material: &Material) -> io::Result<()> {
    writer.queue(SetForegroundColor(Color::Green))?;
    writer.queue(Print(format!("  material {:<20}", name)))?;
    writer.queue(ResetColor)?;
    writer.queue(Print(format!(
        " ambient {} diffuse {} specular {} shininess {}% transparency {}%",
        hex(&material.ambient),
        hex(&material.diffuse),
        hex(&material.specular),
        material.shininess,
        material.transparency
    )))?;
    if let Some(texture) = &material.texture {
        writer.queue(Print(format!(
            " texture {} ({}%)",
            texture.file_name, texture.strength
        )))?;
    }
    writer.queue(Print('\n'))?;
    Ok(())
}

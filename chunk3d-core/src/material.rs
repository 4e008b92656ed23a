/// Surface materials and the name-keyed material table
use std::collections::HashMap;
use std::sync::Arc;

use nom::{
    number::complete::{le_f32, le_u8},
    sequence::tuple,
    IResult,
};

/// RGB triple with components in [0, 1]
pub type Rgb = [f32; 3];

/// Reference to a texture image. Only the file name is decoded; loading the
/// image is left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureRef {
    pub file_name: String,
    /// Blend strength as an integer percentage.
    pub strength: u16,
}

impl Default for TextureRef {
    fn default() -> Self {
        Self {
            file_name: String::new(),
            strength: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub ambient: Rgb,
    pub diffuse: Rgb,
    pub specular: Rgb,
    /// Integer percentage.
    pub shininess: u16,
    /// Integer percentage, 0 is opaque.
    pub transparency: u16,
    pub texture: Option<TextureRef>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: [0.2, 0.2, 0.2],
            diffuse: [0.8, 0.8, 0.8],
            specular: [0.0, 0.0, 0.0],
            shininess: 50,
            transparency: 0,
            texture: None,
        }
    }
}

/// Materials keyed by exact name, plus the shared fallback used whenever a
/// name cannot be resolved.
#[derive(Debug, Clone)]
pub struct MaterialTable {
    entries: Vec<(String, Arc<Material>)>,
    index: HashMap<String, usize>,
    default: Arc<Material>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            default: Arc::new(Material::default()),
        }
    }

    /// Register a material. The first definition of a name wins: returns
    /// `false` and leaves the table untouched if the name is already taken.
    pub fn insert(&mut self, name: impl Into<String>, material: Material) -> bool {
        let name = name.into();
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, Arc::new(material)));
        true
    }

    /// Case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<&Arc<Material>> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    /// Look up a name, falling back to the shared default material.
    pub fn resolve(&self, name: &str) -> Arc<Material> {
        self.get(name)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    pub fn default_material(&self) -> &Arc<Material> {
        &self.default
    }

    /// True if `material` is the shared fallback instance itself.
    pub fn is_default(&self, material: &Arc<Material>) -> bool {
        Arc::ptr_eq(material, &self.default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materials in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Material)> {
        self.entries.iter().map(|(name, m)| (name.as_str(), m.as_ref()))
    }
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorSlot {
    Ambient,
    Diffuse,
    Specular,
}

/// A material under construction while its container is being walked.
#[derive(Debug, Default)]
pub(crate) struct MaterialBuilder {
    pub name: Option<String>,
    pub material: Material,
    gamma_set: [bool; 3],
}

impl MaterialBuilder {
    /// Gamma-corrected colors take precedence over linear ones for the same slot.
    pub fn set_color(&mut self, slot: ColorSlot, rgb: Rgb, linear: bool) {
        let i = slot as usize;
        if linear && self.gamma_set[i] {
            return;
        }
        if !linear {
            self.gamma_set[i] = true;
        }
        let target = match slot {
            ColorSlot::Ambient => &mut self.material.ambient,
            ColorSlot::Diffuse => &mut self.material.diffuse,
            ColorSlot::Specular => &mut self.material.specular,
        };
        *target = rgb;
    }

    /// `None` when the container never named the material.
    pub fn finish(self) -> Option<(String, Material)> {
        self.name.map(|name| (name, self.material))
    }
}

pub(crate) fn color_f(input: &[u8]) -> IResult<&[u8], Rgb> {
    let (input, (r, g, b)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, [r, g, b]))
}

pub(crate) fn color_24(input: &[u8]) -> IResult<&[u8], Rgb> {
    let (input, (r, g, b)) = tuple((le_u8, le_u8, le_u8))(input)?;
    Ok((
        input,
        [
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        ],
    ))
}

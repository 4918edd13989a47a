//! Surface material state.

use serde::{Deserialize, Serialize};

use crate::color::{Color, Texture};

/// A material slot that holds either a flat color or a texture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MaterialProperty {
    Color(Color),
    Texture(Texture),
}

impl MaterialProperty {
    #[must_use]
    pub fn color(&self) -> Option<Color> {
        match self {
            Self::Color(color) => Some(*color),
            Self::Texture(_) => None,
        }
    }
}

impl From<Color> for MaterialProperty {
    fn from(color: Color) -> Self {
        Self::Color(color)
    }
}

impl From<Texture> for MaterialProperty {
    fn from(texture: Texture) -> Self {
        Self::Texture(texture)
    }
}

/// The surface appearance applied to geometry.
///
/// `opacity` is cumulative along the evaluation path; all other slots are
/// plain overrides with `None` meaning "renderer default".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub opacity: f64,
    pub diffuse: Option<MaterialProperty>,
    pub normals: Option<Texture>,
    pub metallicity: Option<MaterialProperty>,
    pub roughness: Option<MaterialProperty>,
    pub glow: Option<MaterialProperty>,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            diffuse: None,
            normals: None,
            metallicity: None,
            roughness: None,
            glow: None,
        }
    }
}

impl Material {
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.opacity >= 1.0
            && match &self.diffuse {
                Some(MaterialProperty::Color(color)) => color.a >= 1.0,
                _ => true,
            }
    }
}

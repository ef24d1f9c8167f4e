pub mod color_models;
pub mod palettes;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::render::RenderError;

/// Réglages communs transmis à chaque schéma.
///
/// Un schéma ignore ceux qui ne le concernent pas (le polynomial n'en lit
/// aucun).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeParams {
    /// Nombre de tours de palette sur [0, max_iterations].
    pub cycle: f64,
    /// Décalage de teinte en degrés (schéma HSL).
    pub hue_shift: f64,
    pub saturation: f64,
    pub lightness: f64,
    /// Phases R, G, B du gradient cosinus, en tours.
    pub phase: [f64; 3],
}

impl Default for SchemeParams {
    fn default() -> Self {
        Self {
            cycle: 8.0,
            hue_shift: 0.0,
            saturation: 0.8,
            lightness: 0.5,
            phase: [0.0, 0.33, 0.67],
        }
    }
}

/// Schémas dont une version shader existe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuScheme {
    Polynomial = 0,
    Cosine = 1,
    Hsl = 2,
}

impl GpuScheme {
    pub fn shader_index(self) -> u32 {
        self as u32
    }
}

pub type ColorizeFn = dyn Fn(f64, u32, &SchemeParams) -> (u8, u8, u8) + Send + Sync;

/// Fonction pure (itérations lissées, max, réglages) → RGB.
#[derive(Clone)]
pub struct ColorScheme {
    pub id: String,
    pub name: String,
    colorize: Arc<ColorizeFn>,
    pub gpu: Option<GpuScheme>,
}

impl ColorScheme {
    pub fn new<F>(id: impl Into<String>, name: impl Into<String>, colorize: F) -> Self
    where
        F: Fn(f64, u32, &SchemeParams) -> (u8, u8, u8) + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            colorize: Arc::new(colorize),
            gpu: None,
        }
    }

    fn with_gpu(mut self, gpu: GpuScheme) -> Self {
        self.gpu = Some(gpu);
        self
    }

    #[inline]
    pub fn colorize(&self, smoothed: f64, max_iterations: u32, params: &SchemeParams) -> (u8, u8, u8) {
        (self.colorize)(smoothed, max_iterations, params)
    }
}

impl fmt::Debug for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorScheme")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("gpu", &self.gpu)
            .finish_non_exhaustive()
    }
}

/// Registre des schémas, indexé par identifiant.
#[derive(Clone, Debug, Default)]
pub struct SchemeRegistry {
    schemes: BTreeMap<String, ColorScheme>,
    aliases: BTreeMap<String, String>,
}

impl SchemeRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Schémas fournis : `default` (alias `polynomial`), `cosine`, `hsl`,
    /// plus les gradients CPU.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            ColorScheme::new("default", "Polynomial", palettes::polynomial)
                .with_gpu(GpuScheme::Polynomial),
        );
        registry.alias("polynomial", "default");
        registry.register(
            ColorScheme::new("cosine", "Cosine", palettes::cosine).with_gpu(GpuScheme::Cosine),
        );
        registry.register(
            ColorScheme::new("hsl", "Continuous HSL", palettes::continuous_hsl)
                .with_gpu(GpuScheme::Hsl),
        );
        for gradient in palettes::GRADIENTS.iter() {
            registry.register(ColorScheme::new(
                gradient.id,
                gradient.name,
                move |s, max, p| gradient.colorize(s, max, p),
            ));
        }
        registry
    }

    /// Ajoute ou remplace un schéma.
    pub fn register(&mut self, scheme: ColorScheme) {
        if self.schemes.contains_key(&scheme.id) {
            log::debug!("schéma {} remplacé", scheme.id);
        }
        self.aliases.remove(&scheme.id);
        self.schemes.insert(scheme.id.clone(), scheme);
    }

    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        self.aliases.insert(alias.into(), target.into());
    }

    pub fn get(&self, id: &str) -> Option<&ColorScheme> {
        if let Some(scheme) = self.schemes.get(id) {
            return Some(scheme);
        }
        self.aliases.get(id).and_then(|target| self.schemes.get(target))
    }

    pub fn resolve(&self, id: &str) -> Result<&ColorScheme, RenderError> {
        self.get(id)
            .ok_or_else(|| RenderError::UnknownColorScheme(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }
}

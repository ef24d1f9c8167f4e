use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::color::SchemeParams;
use crate::render::RenderError;

/// Largeur visible du plan complexe à zoom = 1.
pub const BASE_SPAN: f64 = 3.5;

/// Familles escape-time prises en charge.
///
/// Les identifiants suivent la convention des URL partagées :
/// `mandelbrot`, `julia`, `burning_ship`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalFamily {
    Mandelbrot,
    Julia,
    BurningShip,
}

impl FractalFamily {
    pub fn all() -> &'static [FractalFamily] {
        &[
            FractalFamily::Mandelbrot,
            FractalFamily::Julia,
            FractalFamily::BurningShip,
        ]
    }

    /// Identifiant stable (URL, CLI, JSON).
    pub fn id(self) -> &'static str {
        match self {
            FractalFamily::Mandelbrot => "mandelbrot",
            FractalFamily::Julia => "julia",
            FractalFamily::BurningShip => "burning_ship",
        }
    }

    /// Index transmis au shader GPU.
    pub fn shader_index(self) -> u32 {
        match self {
            FractalFamily::Mandelbrot => 0,
            FractalFamily::Julia => 1,
            FractalFamily::BurningShip => 2,
        }
    }

    pub fn from_cli_name(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "mandelbrot" | "m" => Some(FractalFamily::Mandelbrot),
            "julia" | "j" => Some(FractalFamily::Julia),
            "burning_ship" | "burning-ship" | "burningship" | "ship" => {
                Some(FractalFamily::BurningShip)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FractalFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for FractalFamily {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_cli_name(s).ok_or_else(|| RenderError::UnknownFamily(s.to_string()))
    }
}

/// Fenêtre de rendu : taille en pixels, centre et facteur de zoom.
///
/// Les centres haute précision (chaînes décimales) sont optionnels. Ils ne
/// servent qu'au chemin multi-précision, quand le zoom dépasse ce que
/// l'`f64` peut représenter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewportSpec {
    pub width: u32,
    pub height: u32,
    pub center_x: f64,
    pub center_y: f64,
    pub zoom: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_x_hp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_y_hp: Option<String>,
}

impl ViewportSpec {
    pub fn new(width: u32, height: u32, center_x: f64, center_y: f64, zoom: f64) -> Self {
        Self {
            width,
            height,
            center_x,
            center_y,
            zoom,
            center_x_hp: None,
            center_y_hp: None,
        }
    }

    /// Attache des coordonnées décimales exactes au centre.
    pub fn with_precise_center(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.center_x_hp = Some(x.into());
        self.center_y_hp = Some(y.into());
        self
    }

    /// Taille d'un pixel dans le plan complexe.
    #[inline]
    pub fn scale(&self) -> f64 {
        BASE_SPAN / (self.zoom * self.width as f64)
    }

    /// Coordonnées du plan pour le pixel (px, py), en `f64`.
    #[inline]
    pub fn pixel_to_plane(&self, px: u32, py: u32) -> (f64, f64) {
        let scale = self.scale();
        let x = self.center_x + (px as f64 - self.width as f64 / 2.0) * scale;
        let y = self.center_y + (py as f64 - self.height as f64 / 2.0) * scale;
        (x, y)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 || !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(RenderError::InvalidViewport {
                width: self.width,
                height: self.height,
                zoom: self.zoom,
            });
        }
        if !self.center_x.is_finite() || !self.center_y.is_finite() {
            return Err(RenderError::InvalidCoordinate(format!(
                "({}, {})",
                self.center_x, self.center_y
            )));
        }
        for text in [&self.center_x_hp, &self.center_y_hp].into_iter().flatten() {
            let parsed = text.trim().parse::<f64>();
            if !parsed.is_ok_and(f64::is_finite) {
                return Err(RenderError::InvalidCoordinate(text.clone()));
            }
        }
        Ok(())
    }
}

/// Requête de rendu complète, construite par la vue au moment du rendu.
///
/// Le cœur ne la modifie jamais : chaque zoom/déplacement produit une
/// nouvelle requête.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscapeRequest {
    pub family: FractalFamily,
    pub viewport: ViewportSpec,
    pub max_iterations: u32,
    /// Constante c de Julia (ignorée par Mandelbrot et Burning Ship).
    pub family_constant: Complex64,
    /// Identifiant opaque du schéma de couleurs (résolu par le registre).
    pub color_scheme: String,
    #[serde(default)]
    pub scheme_params: SchemeParams,
}

impl EscapeRequest {
    /// Vérifications bon marché faites avant tout calcul.
    /// Le schéma de couleurs est résolu séparément par le registre.
    pub fn validate(&self) -> Result<(), RenderError> {
        self.viewport.validate()?;
        if self.max_iterations == 0 {
            return Err(RenderError::ZeroIterations);
        }
        if !self.family_constant.re.is_finite() || !self.family_constant.im.is_finite() {
            return Err(RenderError::InvalidCoordinate(format!(
                "constante {}",
                self.family_constant
            )));
        }
        Ok(())
    }

    /// Constante d'orbite transmise au noyau (Julia uniquement).
    pub fn kernel_constant(&self) -> Option<(f64, f64)> {
        match self.family {
            FractalFamily::Julia => Some((self.family_constant.re, self.family_constant.im)),
            FractalFamily::Mandelbrot | FractalFamily::BurningShip => None,
        }
    }
}

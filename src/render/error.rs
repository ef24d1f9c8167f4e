use std::{error::Error, fmt};

/// Erreurs de validation et de capacité, levées avant tout calcul.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderError {
    InvalidViewport { width: u32, height: u32, zoom: f64 },
    ZeroIterations,
    UnknownFamily(String),
    UnknownColorScheme(String),
    InvalidCoordinate(String),
    /// Le zoom exige la multi-précision mais la feature `gmp` est absente.
    HighPrecisionUnavailable { zoom: f64 },
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidViewport { width, height, zoom } => write!(
                f,
                "Fenêtre invalide: {width}x{height} pixels, zoom {zoom} (dimensions et zoom doivent être > 0)"
            ),
            Self::ZeroIterations => {
                write!(f, "Le nombre maximal d'itérations doit être supérieur à zéro")
            }
            Self::UnknownFamily(name) => write!(
                f,
                "Famille de fractale inconnue: '{name}'. Options: mandelbrot, julia, burning_ship"
            ),
            Self::UnknownColorScheme(id) => write!(f, "Schéma de couleurs inconnu: '{id}'"),
            Self::InvalidCoordinate(value) => write!(f, "Coordonnée invalide: {value}"),
            Self::HighPrecisionUnavailable { zoom } => write!(
                f,
                "Le zoom {zoom:e} exige la haute précision, non disponible dans cette compilation (feature gmp)"
            ),
        }
    }
}

impl Error for RenderError {}

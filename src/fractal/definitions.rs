use num_complex::Complex64;

use crate::color::SchemeParams;
use crate::fractal::{EscapeRequest, FractalFamily, ViewportSpec};

/// Constante de Julia par défaut.
pub const DEFAULT_JULIA_CONSTANT: Complex64 = Complex64::new(-0.8, 0.156);

pub const DEFAULT_MAX_ITERATIONS: u32 = 500;

/// Centre de la vue initiale de chaque famille.
pub fn default_center(family: FractalFamily) -> (f64, f64) {
    match family {
        FractalFamily::Mandelbrot => (-0.5, 0.0),
        FractalFamily::Julia => (0.0, 0.0),
        // Vue du vaisseau, pointe vers le haut de l'écran.
        FractalFamily::BurningShip => (-0.45, -0.5),
    }
}

/// Construit une requête avec les valeurs par défaut de la famille.
pub fn default_request_for_family(family: FractalFamily, width: u32, height: u32) -> EscapeRequest {
    let (center_x, center_y) = default_center(family);
    let family_constant = match family {
        FractalFamily::Julia => DEFAULT_JULIA_CONSTANT,
        FractalFamily::Mandelbrot | FractalFamily::BurningShip => Complex64::new(0.0, 0.0),
    };
    EscapeRequest {
        family,
        viewport: ViewportSpec::new(width, height, center_x, center_y, 1.0),
        max_iterations: DEFAULT_MAX_ITERATIONS,
        family_constant,
        color_scheme: "default".to_string(),
        scheme_params: SchemeParams::default(),
    }
}

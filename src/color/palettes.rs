use std::f64::consts::TAU;

use crate::color::color_models::{hsl_to_rgb, unit_to_byte, Hsl};
use crate::color::SchemeParams;

/// Couleur des points intérieurs, pour tous les schémas.
pub const INTERIOR: (u8, u8, u8) = (0, 0, 0);

/// Position normalisée dans [0, 1), ou `None` pour un point intérieur.
#[inline]
pub fn normalized(smoothed: f64, max_iterations: u32) -> Option<f64> {
    let max = max_iterations.max(1) as f64;
    if smoothed >= max {
        return None;
    }
    let t = smoothed / max;
    if t.is_finite() {
        Some(t.clamp(0.0, 1.0))
    } else {
        Some(0.0)
    }
}

/// Schéma par défaut : polynômes de Bernstein, du bleu nuit au jaune.
pub fn polynomial(smoothed: f64, max_iterations: u32, _params: &SchemeParams) -> (u8, u8, u8) {
    let Some(t) = normalized(smoothed, max_iterations) else {
        return INTERIOR;
    };
    let u = 1.0 - t;
    (
        unit_to_byte(9.0 * u * t * t * t),
        unit_to_byte(15.0 * u * u * t * t),
        unit_to_byte(8.5 * u * u * u * t),
    )
}

/// Gradient cosinus : `0.5 + 0.5·cos(2π(t·cycle + phase))` par canal.
pub fn cosine(smoothed: f64, max_iterations: u32, params: &SchemeParams) -> (u8, u8, u8) {
    let Some(t) = normalized(smoothed, max_iterations) else {
        return INTERIOR;
    };
    let x = t * params.cycle;
    let channel = |phase: f64| unit_to_byte(0.5 + 0.5 * (TAU * (x + phase)).cos());
    (
        channel(params.phase[0]),
        channel(params.phase[1]),
        channel(params.phase[2]),
    )
}

/// Teinte continue en HSL.
pub fn continuous_hsl(smoothed: f64, max_iterations: u32, params: &SchemeParams) -> (u8, u8, u8) {
    let Some(t) = normalized(smoothed, max_iterations) else {
        return INTERIOR;
    };
    hsl_to_rgb(Hsl {
        h: params.hue_shift + 360.0 * t * params.cycle,
        s: params.saturation,
        l: params.lightness,
    })
}

#[derive(Clone, Copy, Debug)]
struct GradientStop {
    position: f64, // [0.0, 1.0]
    r: u8,
    g: u8,
    b: u8,
}

/// Gradient à arrêts, sans équivalent GPU.
#[derive(Clone, Copy, Debug)]
pub struct Gradient {
    pub id: &'static str,
    pub name: &'static str,
    stops: &'static [GradientStop],
}

const FIRE_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 0, g: 0, b: 0 },       // Black
    GradientStop { position: 0.33, r: 255, g: 0, b: 0 },     // Red
    GradientStop { position: 0.66, r: 255, g: 255, b: 0 },   // Yellow
    GradientStop { position: 1.00, r: 255, g: 255, b: 255 }, // White
];

const OCEAN_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 0, g: 0, b: 0 },       // Black
    GradientStop { position: 0.33, r: 0, g: 0, b: 255 },     // Blue
    GradientStop { position: 0.66, r: 0, g: 255, b: 255 },   // Cyan
    GradientStop { position: 1.00, r: 255, g: 255, b: 255 }, // White
];

const FOREST_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 0, g: 0, b: 0 },
    GradientStop { position: 0.33, r: 0, g: 180, b: 0 },
    GradientStop { position: 0.66, r: 200, g: 255, b: 0 },
    GradientStop { position: 1.00, r: 255, g: 255, b: 255 },
];

const VIOLET_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 0, g: 0, b: 0 },
    GradientStop { position: 0.33, r: 128, g: 0, b: 200 },
    GradientStop { position: 0.66, r: 255, g: 100, b: 255 },
    GradientStop { position: 1.00, r: 255, g: 255, b: 255 },
];

const RAINBOW_STOPS: [GradientStop; 7] = [
    GradientStop { position: 0.000, r: 255, g: 0, b: 0 },   // Red
    GradientStop { position: 0.166, r: 255, g: 165, b: 0 }, // Orange
    GradientStop { position: 0.333, r: 255, g: 255, b: 0 }, // Yellow
    GradientStop { position: 0.500, r: 0, g: 255, b: 0 },   // Green
    GradientStop { position: 0.666, r: 0, g: 255, b: 255 }, // Cyan
    GradientStop { position: 0.833, r: 0, g: 0, b: 255 },   // Blue
    GradientStop { position: 1.000, r: 180, g: 0, b: 255 }, // Violet
];

const SUNSET_STOPS: [GradientStop; 5] = [
    GradientStop { position: 0.00, r: 0, g: 0, b: 0 },
    GradientStop { position: 0.25, r: 255, g: 140, b: 0 },
    GradientStop { position: 0.50, r: 255, g: 0, b: 0 },
    GradientStop { position: 0.75, r: 255, g: 0, b: 200 },
    GradientStop { position: 1.00, r: 55, g: 0, b: 255 },
];

const PLASMA_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 13, g: 8, b: 135 },   // Deep Blue
    GradientStop { position: 0.33, r: 126, g: 3, b: 168 },  // Violet
    GradientStop { position: 0.66, r: 240, g: 87, b: 100 }, // Pink/Coral
    GradientStop { position: 1.00, r: 240, g: 230, b: 50 }, // Yellow/Orange
];

const ICE_STOPS: [GradientStop; 4] = [
    GradientStop { position: 0.00, r: 255, g: 255, b: 255 },
    GradientStop { position: 0.33, r: 150, g: 230, b: 255 },
    GradientStop { position: 0.66, r: 30, g: 90, b: 200 },
    GradientStop { position: 1.00, r: 5, g: 10, b: 30 },
];

const COSMIC_STOPS: [GradientStop; 9] = [
    GradientStop { position: 0.000, r: 0, g: 0, b: 0 },
    GradientStop { position: 0.143, r: 0, g: 0, b: 51 },
    GradientStop { position: 0.286, r: 0, g: 77, b: 64 },
    GradientStop { position: 0.429, r: 64, g: 224, b: 208 },
    GradientStop { position: 0.571, r: 200, g: 220, b: 240 },
    GradientStop { position: 0.714, r: 255, g: 255, b: 224 },
    GradientStop { position: 0.857, r: 255, g: 215, b: 0 },
    GradientStop { position: 0.929, r: 255, g: 165, b: 0 },
    GradientStop { position: 1.000, r: 139, g: 0, b: 0 },
];

pub static GRADIENTS: [Gradient; 9] = [
    Gradient { id: "fire", name: "Fire", stops: &FIRE_STOPS },
    Gradient { id: "ocean", name: "Ocean", stops: &OCEAN_STOPS },
    Gradient { id: "forest", name: "Forest", stops: &FOREST_STOPS },
    Gradient { id: "violet", name: "Violet", stops: &VIOLET_STOPS },
    Gradient { id: "rainbow", name: "Rainbow", stops: &RAINBOW_STOPS },
    Gradient { id: "sunset", name: "Sunset", stops: &SUNSET_STOPS },
    Gradient { id: "plasma", name: "Plasma", stops: &PLASMA_STOPS },
    Gradient { id: "ice", name: "Ice", stops: &ICE_STOPS },
    Gradient { id: "cosmic", name: "Cosmic", stops: &COSMIC_STOPS },
];

impl Gradient {
    pub fn interpolate(&self, t: f64) -> (u8, u8, u8) {
        let stops = self.stops;
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };

        let first = stops[0];
        if t <= first.position {
            return (first.r, first.g, first.b);
        }
        let last = stops[stops.len() - 1];
        if t >= last.position {
            return (last.r, last.g, last.b);
        }

        // Trouver le segment contenant t
        for w in stops.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t >= a.position && t <= b.position {
                let denom = b.position - a.position;
                let factor = if denom.abs() < f64::EPSILON {
                    0.0
                } else {
                    (t - a.position) / denom
                };
                let lerp = |u: u8, v: u8| -> u8 {
                    let (u, v) = (u as f64, v as f64);
                    (u + factor * (v - u)).clamp(0.0, 255.0) as u8
                };
                return (lerp(a.r, b.r), lerp(a.g, b.g), lerp(a.b, b.b));
            }
        }

        (last.r, last.g, last.b)
    }

    /// Colorise avec `cycle` répétitions alternées endroit/envers.
    pub fn colorize(&self, smoothed: f64, max_iterations: u32, params: &SchemeParams) -> (u8, u8, u8) {
        let Some(t) = normalized(smoothed, max_iterations) else {
            return INTERIOR;
        };
        let t = t.min(0.999_999);
        let repeat = params.cycle.max(1.0);
        let scaled = t * repeat;
        let cycle = scaled.floor() as i64;
        let mut t_repeat = scaled.fract();
        // Alternance endroit/envers pour éviter les ruptures entre cycles
        if cycle % 2 == 1 {
            t_repeat = 1.0 - t_repeat;
        }
        self.interpolate(t_repeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(id: &str) -> Option<&'static Gradient> {
        GRADIENTS.iter().find(|g| g.id == id)
    }

    #[test]
    fn interior_is_black_for_every_builtin() {
        let params = SchemeParams::default();
        assert_eq!(polynomial(100.0, 100, &params), INTERIOR);
        assert_eq!(cosine(100.0, 100, &params), INTERIOR);
        assert_eq!(continuous_hsl(100.0, 100, &params), INTERIOR);
        for g in &GRADIENTS {
            assert_eq!(g.colorize(100.0, 100, &params), INTERIOR, "{}", g.id);
        }
    }

    #[test]
    fn polynomial_is_dark_at_both_ends() {
        let params = SchemeParams::default();
        assert_eq!(polynomial(0.0, 100, &params), (0, 0, 0));
        let (r, g, b) = polynomial(50.0, 100, &params);
        // t = 0.5 : 9/16, 15/16, 8.5/16
        assert_eq!((r, g, b), (143, 239, 135));
    }

    #[test]
    fn cosine_uses_phases() {
        let params = SchemeParams {
            phase: [0.0, 0.5, 0.25],
            ..SchemeParams::default()
        };
        let (r, g, b) = cosine(0.0, 100, &params);
        assert_eq!(r, 255);
        assert_eq!(g, 0);
        assert_eq!(b, 128);
    }

    #[test]
    fn hsl_shift_moves_hue() {
        let base = SchemeParams {
            hue_shift: 0.0,
            saturation: 1.0,
            lightness: 0.5,
            ..SchemeParams::default()
        };
        assert_eq!(continuous_hsl(0.0, 100, &base), (255, 0, 0));
        let shifted = SchemeParams { hue_shift: 240.0, ..base };
        assert_eq!(continuous_hsl(0.0, 100, &shifted), (0, 0, 255));
    }

    #[test]
    fn gradient_endpoints() {
        let fire = gradient("fire").unwrap();
        assert_eq!(fire.interpolate(0.0), (0, 0, 0));
        assert_eq!(fire.interpolate(1.0), (255, 255, 255));
        assert_eq!(fire.interpolate(f64::NAN), (0, 0, 0));
        assert!(gradient("unknown").is_none());
    }

    #[test]
    fn gradient_repeat_mirrors() {
        let fire = gradient("fire").unwrap();
        let params = SchemeParams { cycle: 2.0, ..SchemeParams::default() };
        // t = 0.25 et t = 0.75 sont symétriques autour du changement de cycle
        assert_eq!(
            fire.colorize(25.0, 100, &params),
            fire.colorize(75.0, 100, &params)
        );
    }
}

//! Conversions d'espaces colorimétriques utilisées par les schémas continus.

/// Espace colorimétrique HSL (Teinte, Saturation, Luminosité)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hsl {
    pub h: f64, // Teinte [0, 360)
    pub s: f64, // Saturation [0, 1]
    pub l: f64, // Luminosité [0, 1]
}

/// Convertit HSL vers RGB
pub fn hsl_to_rgb(hsl: Hsl) -> (u8, u8, u8) {
    let h = hsl.h.rem_euclid(360.0);
    let s = hsl.s.clamp(0.0, 1.0);
    let l = hsl.l.clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    (
        unit_to_byte(r + m),
        unit_to_byte(g + m),
        unit_to_byte(b + m),
    )
}

/// [0, 1] → [0, 255], arrondi et borné.
#[inline]
pub fn unit_to_byte(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

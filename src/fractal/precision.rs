/// Zoom au-delà duquel l'écart entre pixels voisins passe sous l'epsilon f64.
pub const HIGH_PRECISION_ZOOM_THRESHOLD: f64 = (1u64 << 20) as f64;

/// Niveau numérique choisi pour toute une image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PrecisionTier {
    /// f64 natif (CPU) ou f32 (GPU).
    Native,
    /// Flottants multi-précision (rug / MPFR).
    Arbitrary,
}

impl PrecisionTier {
    pub fn for_zoom(zoom: f64) -> Self {
        if needs_high_precision(zoom) {
            PrecisionTier::Arbitrary
        } else {
            PrecisionTier::Native
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PrecisionTier::Native => "f64",
            PrecisionTier::Arbitrary => "mpfr",
        }
    }
}

/// Vrai ssi `zoom > 2^20`. La décision vaut pour toute l'image.
#[inline]
pub fn needs_high_precision(zoom: f64) -> bool {
    zoom > HIGH_PRECISION_ZOOM_THRESHOLD
}

/// Nombre de bits de mantisse pour le chemin multi-précision.
///
/// log2 de la taille relative d'un pixel, plus une marge de 64 bits pour les
/// calculs intermédiaires, au minimum 128.
pub fn precision_bits_for_zoom(zoom: f64, width: u32) -> u32 {
    let pixels_per_unit = zoom * width.max(1) as f64 / crate::fractal::BASE_SPAN;
    if !pixels_per_unit.is_finite() || pixels_per_unit <= 1.0 {
        return 128;
    }
    let needed = pixels_per_unit.log2().ceil() as u32 + 64;
    needed.max(128)
}

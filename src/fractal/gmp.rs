//! Chemin multi-précision (MPFR via `rug`) pour les zooms profonds.
//!
//! Le mapping pixel → plan complexe et l'itération se font entièrement en
//! `rug::Float`. Seule la valeur finale de z repasse en `f64` pour le lissage.

use rug::Float;

use crate::fractal::iterations::{iterate, Escape, KernelReal};
use crate::fractal::precision::precision_bits_for_zoom;
use crate::fractal::{EscapeRequest, BASE_SPAN};
use crate::render::RenderError;

impl KernelReal for Float {
    #[inline]
    fn abs_value(self) -> Self {
        self.abs()
    }

    #[inline]
    fn to_f64(&self) -> f64 {
        Float::to_f64(self)
    }
}

/// Paramètres du plan en multi-précision pour une image.
#[derive(Clone, Debug)]
pub struct HighPrecisionPlane {
    pub prec: u32,
    center_x: Float,
    center_y: Float,
    scale: Float,
    half_width: Float,
    half_height: Float,
    constant: Option<(Float, Float)>,
}

impl HighPrecisionPlane {
    pub fn from_request(request: &EscapeRequest) -> Result<Self, RenderError> {
        let vp = &request.viewport;
        let prec = precision_bits_for_zoom(vp.zoom, vp.width);

        let center_x = parse_or_convert(prec, vp.center_x_hp.as_deref(), vp.center_x)?;
        let center_y = parse_or_convert(prec, vp.center_y_hp.as_deref(), vp.center_y)?;

        // scale = BASE_SPAN / (zoom * width)
        let mut denom = Float::with_val(prec, vp.zoom);
        denom *= vp.width;
        let mut scale = Float::with_val(prec, BASE_SPAN);
        scale /= &denom;

        let mut half_width = Float::with_val(prec, vp.width);
        half_width /= 2u32;
        let mut half_height = Float::with_val(prec, vp.height);
        half_height /= 2u32;

        let constant = request
            .kernel_constant()
            .map(|(re, im)| (Float::with_val(prec, re), Float::with_val(prec, im)));

        Ok(Self {
            prec,
            center_x,
            center_y,
            scale,
            half_width,
            half_height,
            constant,
        })
    }

    /// Coordonnées du plan pour le pixel (px, py).
    pub fn pixel_to_plane(&self, px: u32, py: u32) -> (Float, Float) {
        let mut x = Float::with_val(self.prec, px);
        x -= &self.half_width;
        x *= &self.scale;
        x += &self.center_x;

        let mut y = Float::with_val(self.prec, py);
        y -= &self.half_height;
        y *= &self.scale;
        y += &self.center_y;
        (x, y)
    }

    pub fn iterate_pixel(
        &self,
        request: &EscapeRequest,
        px: u32,
        py: u32,
    ) -> Escape<f64> {
        let (cx, cy) = self.pixel_to_plane(px, py);
        iterate(
            request.family,
            cx,
            cy,
            self.constant.clone(),
            request.max_iterations,
        )
        .to_f64()
    }
}

fn parse_or_convert(prec: u32, decimal: Option<&str>, fallback: f64) -> Result<Float, RenderError> {
    match decimal {
        Some(text) => {
            let parsed = Float::parse(text.trim())
                .map_err(|e| RenderError::InvalidCoordinate(format!("{text}: {e}")))?;
            Ok(Float::with_val(prec, parsed))
        }
        None => Ok(Float::with_val(prec, fallback)),
    }
}

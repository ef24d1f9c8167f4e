#[cfg(feature = "gmp")]
use crate::fractal::gmp::HighPrecisionPlane;
use crate::fractal::iterations::{iterate_f64, Escape};
use crate::fractal::precision::{needs_high_precision, PrecisionTier};
use crate::fractal::smooth::smooth;
use crate::fractal::EscapeRequest;
use crate::render::RenderError;

enum Backend {
    Native { constant: Option<(f64, f64)> },
    #[cfg(feature = "gmp")]
    Arbitrary(Box<HighPrecisionPlane>),
}

/// Évaluation d'un pixel au niveau de précision choisi pour l'image.
pub struct PixelSampler<'a> {
    request: &'a EscapeRequest,
    backend: Backend,
}

impl<'a> PixelSampler<'a> {
    pub fn for_request(request: &'a EscapeRequest) -> Result<Self, RenderError> {
        if needs_high_precision(request.viewport.zoom) {
            return Self::arbitrary(request);
        }
        Ok(Self {
            request,
            backend: Backend::Native {
                constant: request.kernel_constant(),
            },
        })
    }

    #[cfg(feature = "gmp")]
    fn arbitrary(request: &'a EscapeRequest) -> Result<Self, RenderError> {
        let plane = HighPrecisionPlane::from_request(request)?;
        log::debug!(
            "zoom {:e}: multi-précision sur {} bits",
            request.viewport.zoom,
            plane.prec
        );
        Ok(Self {
            request,
            backend: Backend::Arbitrary(Box::new(plane)),
        })
    }

    #[cfg(not(feature = "gmp"))]
    fn arbitrary(request: &'a EscapeRequest) -> Result<Self, RenderError> {
        Err(RenderError::HighPrecisionUnavailable {
            zoom: request.viewport.zoom,
        })
    }

    pub fn tier(&self) -> PrecisionTier {
        match self.backend {
            Backend::Native { .. } => PrecisionTier::Native,
            #[cfg(feature = "gmp")]
            Backend::Arbitrary(_) => PrecisionTier::Arbitrary,
        }
    }

    pub fn escape(&self, px: u32, py: u32) -> Escape<f64> {
        match &self.backend {
            Backend::Native { constant } => {
                let (cx, cy) = self.request.viewport.pixel_to_plane(px, py);
                iterate_f64(
                    self.request.family,
                    cx,
                    cy,
                    *constant,
                    self.request.max_iterations,
                )
            }
            #[cfg(feature = "gmp")]
            Backend::Arbitrary(plane) => plane.iterate_pixel(self.request, px, py),
        }
    }

    /// Nombre d'itérations lissé du pixel, dans [0, max_iterations].
    pub fn smoothed_count(&self, px: u32, py: u32) -> f64 {
        let e = self.escape(px, py);
        smooth(e.iterations, e.x, e.y, self.request.max_iterations)
    }
}

//! Chemin GPU : un compute shader wgpu qui reproduit la récurrence, le
//! lissage et les schémas de couleurs compatibles, en f32.

use std::fmt;

use crate::color::{ColorScheme, GpuScheme};
use crate::fractal::precision::needs_high_precision;
use crate::fractal::EscapeRequest;

#[cfg(feature = "gpu")]
mod device;
#[cfg(feature = "gpu")]
pub use device::GpuRenderer;

#[cfg(not(feature = "gpu"))]
mod disabled;
#[cfg(not(feature = "gpu"))]
pub use disabled::GpuRenderer;

/// Nombre d'itérations maximal accepté par le shader.
/// Au-delà, le rendu passe par le CPU plutôt que d'être tronqué.
pub const GPU_ITERATION_CEILING: u32 = 1000;

/// Écart minimal entre pixels, relatif au centre, représentable en f32.
const F32_MIN_RELATIVE_STEP: f64 = 8.0 * f32::EPSILON as f64;

/// Raison pour laquelle une requête ne peut pas passer par le GPU.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpuFallback {
    SchemeWithoutShader,
    HighPrecision,
    IterationCeiling,
    SinglePrecisionLimit,
    /// Tampon de sortie au-delà des limites du périphérique.
    FrameTooLarge,
}

impl fmt::Display for GpuFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemeWithoutShader => write!(f, "schéma de couleurs sans version GPU"),
            Self::HighPrecision => write!(f, "zoom en multi-précision"),
            Self::IterationCeiling => {
                write!(f, "plus de {GPU_ITERATION_CEILING} itérations")
            }
            Self::SinglePrecisionLimit => write!(f, "pas de pixel sous la précision f32"),
            Self::FrameTooLarge => write!(f, "image trop grande pour le GPU"),
        }
    }
}

/// Décide si le shader peut produire exactement cette image.
pub fn gpu_eligibility(request: &EscapeRequest, scheme: &ColorScheme) -> Result<GpuScheme, GpuFallback> {
    let gpu_scheme = scheme.gpu.ok_or(GpuFallback::SchemeWithoutShader)?;
    let vp = &request.viewport;
    if needs_high_precision(vp.zoom) {
        return Err(GpuFallback::HighPrecision);
    }
    if request.max_iterations > GPU_ITERATION_CEILING {
        return Err(GpuFallback::IterationCeiling);
    }
    let magnitude = vp.center_x.abs().max(vp.center_y.abs()).max(1.0);
    if vp.scale() < magnitude * F32_MIN_RELATIVE_STEP {
        return Err(GpuFallback::SinglePrecisionLimit);
    }
    Ok(gpu_scheme)
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::color::{SchemeParams, SchemeRegistry};
    use crate::fractal::{FractalFamily, ViewportSpec};

    fn request(zoom: f64, max_iterations: u32) -> EscapeRequest {
        EscapeRequest {
            family: FractalFamily::Julia,
            viewport: ViewportSpec::new(800, 600, 0.0, 0.0, zoom),
            max_iterations,
            family_constant: Complex64::new(-0.8, 0.156),
            color_scheme: "default".to_string(),
            scheme_params: SchemeParams::default(),
        }
    }

    #[test]
    fn shader_schemes_are_eligible() {
        let registry = SchemeRegistry::builtin();
        let req = request(1.0, 500);
        for (id, expected) in [
            ("default", GpuScheme::Polynomial),
            ("cosine", GpuScheme::Cosine),
            ("hsl", GpuScheme::Hsl),
        ] {
            let scheme = registry.resolve(id).unwrap();
            assert_eq!(gpu_eligibility(&req, scheme), Ok(expected));
        }
    }

    #[test]
    fn cpu_only_scheme_falls_back() {
        let registry = SchemeRegistry::builtin();
        let scheme = registry.resolve("fire").unwrap();
        assert_eq!(
            gpu_eligibility(&request(1.0, 500), scheme),
            Err(GpuFallback::SchemeWithoutShader)
        );
    }

    #[test]
    fn iteration_ceiling_is_inclusive() {
        let registry = SchemeRegistry::builtin();
        let scheme = registry.resolve("default").unwrap();
        assert!(gpu_eligibility(&request(1.0, GPU_ITERATION_CEILING), scheme).is_ok());
        assert_eq!(
            gpu_eligibility(&request(1.0, GPU_ITERATION_CEILING + 1), scheme),
            Err(GpuFallback::IterationCeiling)
        );
    }

    #[test]
    fn deep_zoom_never_uses_gpu() {
        let registry = SchemeRegistry::builtin();
        let scheme = registry.resolve("default").unwrap();
        assert_eq!(
            gpu_eligibility(&request(1e9, 500), scheme),
            Err(GpuFallback::HighPrecision)
        );
        // Sous le seuil multi-précision mais trop fin pour le f32
        assert_eq!(
            gpu_eligibility(&request(1e6 - 1.0, 500), scheme),
            Err(GpuFallback::SinglePrecisionLimit)
        );
    }
}

//! Remplissage coopératif de l'image, ligne par ligne.
//!
//! Un seul pixel est évalué à la fois. Toutes les `ROWS_PER_YIELD` lignes, le
//! rendu rend la main à l'exécuteur puis publie sa progression, ce qui laisse
//! l'hôte traiter ses événements pendant les longs rendus CPU.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::color::ColorScheme;
use crate::fractal::precision::PrecisionTier;
use crate::fractal::EscapeRequest;
use crate::render::sampler::PixelSampler;
use crate::render::{Framebuffer, RenderError};

/// Nombre de lignes calculées entre deux suspensions.
pub const ROWS_PER_YIELD: u32 = 20;

/// État d'un remplissage en cours, pilotable sans exécuteur.
pub struct PixelFill<'a> {
    request: &'a EscapeRequest,
    sampler: PixelSampler<'a>,
    scheme: &'a ColorScheme,
    frame: Framebuffer,
    next_row: u32,
}

impl<'a> PixelFill<'a> {
    pub fn new(request: &'a EscapeRequest, scheme: &'a ColorScheme) -> Result<Self, RenderError> {
        let sampler = PixelSampler::for_request(request)?;
        let vp = &request.viewport;
        Ok(Self {
            request,
            sampler,
            scheme,
            frame: Framebuffer::new(vp.width, vp.height),
            next_row: 0,
        })
    }

    pub fn tier(&self) -> PrecisionTier {
        self.sampler.tier()
    }

    /// Calcule au plus `count` lignes ; retourne le nombre de lignes faites.
    pub fn fill_rows(&mut self, count: u32) -> u32 {
        let width = self.frame.width;
        let end = self.next_row.saturating_add(count).min(self.frame.height);
        let start = self.next_row;
        for py in start..end {
            for px in 0..width {
                let smoothed = self.sampler.smoothed_count(px, py);
                let rgb = self.scheme.colorize(
                    smoothed,
                    self.request.max_iterations,
                    &self.request.scheme_params,
                );
                self.frame.set_pixel(px, py, rgb);
            }
        }
        self.next_row = end;
        end - start
    }

    pub fn rows_done(&self) -> u32 {
        self.next_row
    }

    pub fn is_complete(&self) -> bool {
        self.next_row >= self.frame.height
    }

    /// Pourcentage de lignes terminées, dans [0, 100].
    pub fn progress(&self) -> f64 {
        if self.frame.height == 0 {
            return 100.0;
        }
        self.next_row as f64 * 100.0 / self.frame.height as f64
    }

    pub fn finish(self) -> Framebuffer {
        self.frame
    }
}

/// Future qui se suspend une fois avant de se terminer.
struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

pub(crate) fn yield_now() -> impl Future<Output = ()> {
    YieldNow { yielded: false }
}

/// Pilote `fill` jusqu'au bout, ou jusqu'à ce que `keep_going` renvoie faux.
/// Retourne vrai si l'image est complète.
pub(crate) async fn drive<P, K>(fill: &mut PixelFill<'_>, on_progress: &mut P, keep_going: K) -> bool
where
    P: FnMut(f64),
    K: Fn() -> bool,
{
    loop {
        fill.fill_rows(ROWS_PER_YIELD);
        if fill.is_complete() {
            break;
        }
        yield_now().await;
        if !keep_going() {
            log::debug!("rendu abandonné à la ligne {}", fill.rows_done());
            return false;
        }
        on_progress(fill.progress());
    }
    on_progress(100.0);
    true
}

/// Rendu CPU complet d'une requête avec le schéma déjà résolu.
pub async fn render_frame<P>(
    request: &EscapeRequest,
    scheme: &ColorScheme,
    mut on_progress: P,
) -> Result<Framebuffer, RenderError>
where
    P: FnMut(f64),
{
    let mut fill = PixelFill::new(request, scheme)?;
    log::debug!(
        "rendu CPU {}x{} ({}, {} itérations)",
        request.viewport.width,
        request.viewport.height,
        fill.tier().label(),
        request.max_iterations
    );
    drive(&mut fill, &mut on_progress, || true).await;
    Ok(fill.finish())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use num_complex::Complex64;

    use super::*;
    use crate::color::{SchemeParams, SchemeRegistry};
    use crate::fractal::{FractalFamily, ViewportSpec};

    fn request(width: u32, height: u32) -> EscapeRequest {
        EscapeRequest {
            family: FractalFamily::Mandelbrot,
            viewport: ViewportSpec::new(width, height, -0.5, 0.0, 1.0),
            max_iterations: 50,
            family_constant: Complex64::new(0.0, 0.0),
            color_scheme: "default".to_string(),
            scheme_params: SchemeParams::default(),
        }
    }

    #[test]
    fn progress_is_reported_every_block_then_100() {
        let registry = SchemeRegistry::builtin();
        let req = request(8, 100);
        let scheme = registry.resolve("default").unwrap();
        let mut reports = Vec::new();
        let frame = pollster::block_on(render_frame(&req, scheme, |p| reports.push(p))).unwrap();
        assert_eq!(reports, vec![20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(frame.pixels.len(), 8 * 100 * 3);
    }

    #[test]
    fn small_frame_reports_only_completion() {
        let registry = SchemeRegistry::builtin();
        let req = request(4, 4);
        let scheme = registry.resolve("default").unwrap();
        let mut reports = Vec::new();
        pollster::block_on(render_frame(&req, scheme, |p| reports.push(p))).unwrap();
        assert_eq!(reports, vec![100.0]);
    }

    #[test]
    fn progress_is_monotonic_for_odd_heights() {
        let registry = SchemeRegistry::builtin();
        let req = request(3, 47);
        let scheme = registry.resolve("hsl").unwrap();
        let mut reports = Vec::new();
        pollster::block_on(render_frame(&req, scheme, |p| reports.push(p))).unwrap();
        assert!(reports.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(reports.last(), Some(&100.0));
    }

    #[test]
    fn pixel_fill_walks_rows_in_order() {
        let registry = SchemeRegistry::builtin();
        let req = request(5, 45);
        let scheme = registry.resolve("default").unwrap();
        let mut fill = PixelFill::new(&req, scheme).unwrap();
        assert_eq!(fill.fill_rows(ROWS_PER_YIELD), 20);
        assert_eq!(fill.rows_done(), 20);
        assert_eq!(fill.fill_rows(ROWS_PER_YIELD), 20);
        assert_eq!(fill.fill_rows(ROWS_PER_YIELD), 5);
        assert!(fill.is_complete());
        assert_eq!(fill.fill_rows(ROWS_PER_YIELD), 0);
        assert_eq!(fill.progress(), 100.0);
    }

    #[test]
    fn incremental_fill_matches_async_render() {
        let registry = SchemeRegistry::builtin();
        let req = request(16, 30);
        let scheme = registry.resolve("cosine").unwrap();
        let mut fill = PixelFill::new(&req, scheme).unwrap();
        while !fill.is_complete() {
            fill.fill_rows(7);
        }
        let by_hand = fill.finish();
        let by_future = pollster::block_on(render_frame(&req, scheme, |_| {})).unwrap();
        assert_eq!(by_hand, by_future);
    }

    #[test]
    fn interior_center_pixel_is_black() {
        let registry = SchemeRegistry::builtin();
        let req = request(4, 4);
        let scheme = registry.resolve("default").unwrap();
        let frame = pollster::block_on(render_frame(&req, scheme, |_| {})).unwrap();
        assert_eq!(frame.pixel(2, 2), Some((0, 0, 0)));
    }

    #[test]
    fn drive_stops_when_superseded() {
        let registry = SchemeRegistry::builtin();
        let req = request(4, 100);
        let scheme = registry.resolve("default").unwrap();
        let mut fill = PixelFill::new(&req, scheme).unwrap();
        let checks = Cell::new(0);
        let mut reports = Vec::new();
        let complete = pollster::block_on(drive(
            &mut fill,
            &mut |p| reports.push(p),
            || {
                checks.set(checks.get() + 1);
                checks.get() < 2
            },
        ));
        assert!(!complete);
        assert_eq!(fill.rows_done(), 40);
        assert_eq!(reports, vec![20.0]);
    }
}

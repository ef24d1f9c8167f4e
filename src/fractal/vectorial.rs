//! Fractales vectorielles (Von Koch et Dragon).
//!
//! Ces fractales sont rendues par dessin récursif de lignes, contrairement
//! aux fractales escape-time. Elles partagent pourtant la même fenêtre
//! (`ViewportSpec`) et le même contrat de progression.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::fractal::ViewportSpec;
use crate::render::scheduler::yield_now;
use crate::render::{Framebuffer, RenderError};

pub const KOCH_MAX_DEPTH: u32 = 8;
pub const DRAGON_MAX_DEPTH: u32 = 20;

/// Segments tracés entre deux suspensions.
const LINES_PER_YIELD: usize = 4096;

pub const CURVE_COLOR: (u8, u8, u8) = (255, 255, 255);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CurveKind {
    VonKoch,
    Dragon,
}

impl CurveKind {
    pub fn id(self) -> &'static str {
        match self {
            CurveKind::VonKoch => "koch",
            CurveKind::Dragon => "dragon",
        }
    }

    pub fn max_depth(self) -> u32 {
        match self {
            CurveKind::VonKoch => KOCH_MAX_DEPTH,
            CurveKind::Dragon => DRAGON_MAX_DEPTH,
        }
    }

    pub fn default_depth(self) -> u32 {
        match self {
            CurveKind::VonKoch => 5,
            CurveKind::Dragon => 14,
        }
    }

    /// Fenêtre par défaut, cadrée sur la courbe entière.
    pub fn default_viewport(self, width: u32, height: u32) -> ViewportSpec {
        match self {
            CurveKind::VonKoch => ViewportSpec::new(width, height, 0.0, 0.0, 1.0),
            CurveKind::Dragon => ViewportSpec::new(width, height, 0.0, 0.35, 1.0),
        }
    }

    /// Nombre de segments tracés à la profondeur donnée (après plafonnement).
    pub fn segment_count(self, depth: u32) -> usize {
        let depth = depth.min(self.max_depth());
        match self {
            CurveKind::VonKoch => 3 * 4usize.pow(depth),
            CurveKind::Dragon => 1usize << depth,
        }
    }

    fn segments(self, depth: u32) -> Vec<Line> {
        let depth = depth.min(self.max_depth());
        let mut lines = Vec::with_capacity(self.segment_count(depth));
        match self {
            CurveKind::VonKoch => {
                // Triangle équilatéral de rayon 1.2 centré sur l'origine
                let r = 1.2;
                let a = Point::new(0.0, -r);
                let b = Point::new(-r * (PI / 6.0).cos(), r * 0.5);
                let c = Point::new(r * (PI / 6.0).cos(), r * 0.5);
                von_koch_collect(a, b, depth, &mut lines);
                von_koch_collect(c, a, depth, &mut lines);
                von_koch_collect(b, c, depth, &mut lines);
            }
            CurveKind::Dragon => {
                let d = Point::new(-1.0, 0.0);
                let e = Point::new(1.0, 0.0);
                dragon_collect(d, e, depth, &mut lines);
            }
        }
        lines
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for CurveKind {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "koch" | "von_koch" | "vonkoch" => Ok(CurveKind::VonKoch),
            "dragon" => Ok(CurveKind::Dragon),
            _ => Err(RenderError::UnknownFamily(s.to_string())),
        }
    }
}

/// Point 2D du plan.
#[derive(Clone, Copy, Debug)]
struct Point {
    x: f64,
    y: f64,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Rotation du point autour d'un centre avec un angle theta (radians).
    fn rotate(self, theta: f64, center: Point) -> Self {
        let dx = self.x - center.x;
        let dy = self.y - center.y;
        let (sin_t, cos_t) = theta.sin_cos();
        Point {
            x: dx * cos_t - dy * sin_t + center.x,
            y: dx * sin_t + dy * cos_t + center.y,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Line {
    from: Point,
    to: Point,
}

fn von_koch_collect(a: Point, b: Point, n: u32, lines: &mut Vec<Line>) {
    if n == 0 {
        lines.push(Line { from: a, to: b });
        return;
    }
    // C = A + 1/3 AB, D = C + 1/3 AB
    let c = Point::new(a.x + (b.x - a.x) / 3.0, a.y + (b.y - a.y) / 3.0);
    let d = Point::new(c.x + (b.x - a.x) / 3.0, c.y + (b.y - a.y) / 3.0);
    // E = rotation de B autour de D, angle 2π/3
    let e = b.rotate(2.0 * PI / 3.0, d);

    von_koch_collect(a, c, n - 1, lines);
    von_koch_collect(c, e, n - 1, lines);
    von_koch_collect(e, d, n - 1, lines);
    von_koch_collect(d, b, n - 1, lines);
}

fn dragon_collect(a: Point, b: Point, n: u32, lines: &mut Vec<Line>) {
    if n == 0 {
        lines.push(Line { from: a, to: b });
        return;
    }
    // D = rotation de B autour du milieu de AB, angle π/2
    let c = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let d = b.rotate(PI / 2.0, c);

    dragon_collect(a, d, n - 1, lines);
    dragon_collect(b, d, n - 1, lines);
}

/// Inverse de `ViewportSpec::pixel_to_plane`.
fn plane_to_pixel(viewport: &ViewportSpec, p: Point) -> (f64, f64) {
    let scale = viewport.scale();
    (
        (p.x - viewport.center_x) / scale + viewport.width as f64 / 2.0,
        (p.y - viewport.center_y) / scale + viewport.height as f64 / 2.0,
    )
}

/// Bresenham sur les pixels de l'image.
fn draw_line(frame: &mut Framebuffer, viewport: &ViewportSpec, line: &Line) {
    let (fx0, fy0) = plane_to_pixel(viewport, line.from);
    let (fx1, fy1) = plane_to_pixel(viewport, line.to);
    let w = frame.width as f64;
    let h = frame.height as f64;
    // Segment entièrement hors champ
    if (fx0 < 0.0 && fx1 < 0.0)
        || (fy0 < 0.0 && fy1 < 0.0)
        || (fx0 >= w && fx1 >= w)
        || (fy0 >= h && fy1 >= h)
    {
        return;
    }

    let mut x0 = fx0.floor() as i64;
    let mut y0 = fy0.floor() as i64;
    let x1 = fx1.floor() as i64;
    let y1 = fy1.floor() as i64;

    let (wi, hi) = (frame.width as i64, frame.height as i64);
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if (0..wi).contains(&x0) && (0..hi).contains(&y0) {
            frame.set_pixel(x0 as u32, y0 as u32, CURVE_COLOR);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Trace la courbe dans une image noire.
///
/// La progression est publiée toutes les `LINES_PER_YIELD` lignes, après une
/// suspension, puis vaut 100 à la fin.
pub async fn render_curve<P>(
    kind: CurveKind,
    depth: u32,
    viewport: &ViewportSpec,
    mut on_progress: P,
) -> Result<Framebuffer, RenderError>
where
    P: FnMut(f64),
{
    viewport.validate()?;
    if depth > kind.max_depth() {
        log::warn!("profondeur {depth} ramenée à {} pour {kind}", kind.max_depth());
    }
    let lines = kind.segments(depth);
    let total = lines.len();
    log::debug!("{kind}: {total} segments");

    let mut frame = Framebuffer::new(viewport.width, viewport.height);
    let mut done = 0usize;
    for chunk in lines.chunks(LINES_PER_YIELD) {
        for line in chunk {
            draw_line(&mut frame, viewport, line);
        }
        done += chunk.len();
        if done < total {
            yield_now().await;
            on_progress(done as f64 * 100.0 / total as f64);
        }
    }
    on_progress(100.0);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_counts_and_depth_caps() {
        assert_eq!(CurveKind::VonKoch.segment_count(0), 3);
        assert_eq!(CurveKind::VonKoch.segment_count(2), 48);
        assert_eq!(CurveKind::VonKoch.segment_count(50), 3 * 4usize.pow(8));
        assert_eq!(CurveKind::Dragon.segment_count(3), 8);
        assert_eq!(CurveKind::Dragon.segment_count(99), 1 << 20);
        assert_eq!(CurveKind::Dragon.segments(5).len(), 32);
    }

    #[test]
    fn curve_names_parse() {
        assert_eq!("koch".parse::<CurveKind>(), Ok(CurveKind::VonKoch));
        assert_eq!("Dragon".parse::<CurveKind>(), Ok(CurveKind::Dragon));
        assert!("hilbert".parse::<CurveKind>().is_err());
    }

    #[test]
    fn koch_draws_white_on_black() {
        let vp = CurveKind::VonKoch.default_viewport(64, 64);
        let frame = pollster::block_on(render_curve(CurveKind::VonKoch, 2, &vp, |_| {})).unwrap();
        let lit = frame
            .pixels
            .chunks_exact(3)
            .filter(|p| *p == [255, 255, 255])
            .count();
        assert!(lit > 0);
        assert!(frame
            .pixels
            .chunks_exact(3)
            .all(|p| p == [0, 0, 0] || p == [255, 255, 255]));
        // Sommet supérieur (0, -1.2)
        let (px, py) = plane_to_pixel(&vp, Point::new(0.0, -1.2));
        assert_eq!(frame.pixel(px.floor() as u32, py.floor() as u32), Some(CURVE_COLOR));
        // Le centre du flocon reste vide
        assert_eq!(frame.pixel(32, 32), Some((0, 0, 0)));
    }

    #[test]
    fn dragon_progress_is_monotonic() {
        let vp = CurveKind::Dragon.default_viewport(32, 32);
        let mut reports = Vec::new();
        pollster::block_on(render_curve(CurveKind::Dragon, 14, &vp, |p| reports.push(p))).unwrap();
        // 2^14 segments : trois suspensions puis 100
        assert_eq!(reports, vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn invalid_viewport_is_rejected() {
        let vp = ViewportSpec::new(0, 10, 0.0, 0.0, 1.0);
        let result = pollster::block_on(render_curve(CurveKind::VonKoch, 1, &vp, |_| {}));
        assert!(matches!(result, Err(RenderError::InvalidViewport { .. })));
    }
}

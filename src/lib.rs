//! Rendu de fractales escape-time (Mandelbrot, Julia, Burning Ship) et de
//! courbes vectorielles, avec chemin GPU, repli CPU coopératif et zoom
//! profond en multi-précision.

pub mod color;
pub mod fractal;
pub mod gpu;
pub mod io;
pub mod render;
pub mod state;

pub use color::{ColorScheme, SchemeParams, SchemeRegistry};
pub use fractal::{
    default_request_for_family, render_curve, CurveKind, EscapeRequest, FractalFamily, ViewportSpec,
};
pub use render::{FrameGate, Framebuffer, RenderError, Renderer};
pub use state::StateError;

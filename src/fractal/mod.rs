pub mod definitions;
#[cfg(feature = "gmp")]
pub mod gmp;
pub mod iterations;
pub mod precision;
pub mod smooth;
pub mod types;
pub mod vectorial;

pub use definitions::{default_center, default_request_for_family};
pub use types::{EscapeRequest, FractalFamily, ViewportSpec, BASE_SPAN};
pub use vectorial::{render_curve, CurveKind};

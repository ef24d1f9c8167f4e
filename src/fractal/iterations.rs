use std::ops::{Add, Mul, Sub};

use crate::fractal::FractalFamily;

/// |z|² au-delà duquel l'orbite est considérée comme échappée (rayon 2).
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// Arithmétique minimale requise par la récurrence escape-time.
///
/// Implémentée pour `f64` et, avec la feature `gmp`, pour `rug::Float`.
/// La récurrence et le test d'échappement sont écrits une seule fois
/// au-dessus de ce trait.
pub trait KernelReal:
    Clone + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self> + PartialOrd<f64>
{
    fn abs_value(self) -> Self;
    fn to_f64(&self) -> f64;
}

impl KernelReal for f64 {
    #[inline]
    fn abs_value(self) -> Self {
        self.abs()
    }

    #[inline]
    fn to_f64(&self) -> f64 {
        *self
    }
}

/// Résultat brut d'un point : nombre d'itérations et dernière valeur de z.
#[derive(Clone, Debug, PartialEq)]
pub struct Escape<T> {
    pub iterations: u32,
    pub x: T,
    pub y: T,
}

impl<T: KernelReal> Escape<T> {
    pub fn to_f64(&self) -> Escape<f64> {
        Escape {
            iterations: self.iterations,
            x: self.x.to_f64(),
            y: self.y.to_f64(),
        }
    }
}

/// Itère la famille demandée pour le point (cx, cy).
///
/// - Mandelbrot / Burning Ship : z₀ = 0, constante = (cx, cy).
/// - Julia : z₀ = (cx, cy), constante = `family_constant` (0 si absente).
///
/// Burning Ship replie x et y en valeur absolue avant la mise au carré.
pub fn iterate<T: KernelReal>(
    family: FractalFamily,
    cx: T,
    cy: T,
    family_constant: Option<(T, T)>,
    max_iterations: u32,
) -> Escape<T> {
    let zero = cx.clone() - cx.clone();
    let (mut x, mut y, c_re, c_im) = match family {
        FractalFamily::Julia => {
            let (re, im) = family_constant.unwrap_or_else(|| (zero.clone(), zero.clone()));
            (cx, cy, re, im)
        }
        FractalFamily::Mandelbrot | FractalFamily::BurningShip => {
            (zero.clone(), zero, cx, cy)
        }
    };
    let fold = family == FractalFamily::BurningShip;

    let mut i = 0u32;
    loop {
        let xx = x.clone() * x.clone();
        let yy = y.clone() * y.clone();
        if i >= max_iterations || xx.clone() + yy.clone() > ESCAPE_RADIUS_SQR {
            break;
        }
        if fold {
            x = x.abs_value();
            y = y.abs_value();
        }
        let xy = x * y;
        y = xy.clone() + xy + c_im.clone();
        x = xx - yy + c_re.clone();
        i += 1;
    }

    Escape { iterations: i, x, y }
}

/// Raccourci natif utilisé par le chemin f64.
#[inline]
pub fn iterate_f64(
    family: FractalFamily,
    cx: f64,
    cy: f64,
    family_constant: Option<(f64, f64)>,
    max_iterations: u32,
) -> Escape<f64> {
    iterate(family, cx, cy, family_constant, max_iterations)
}

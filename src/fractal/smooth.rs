use std::f64::consts::LN_2;

/// Transforme un compte d'itérations entier en valeur continue (sans bandes).
///
/// - `raw >= max` : point intérieur, renvoie exactement `max`.
/// - sinon : `raw + 1 - log2(log2(|z|))`, ramené dans `[0, max]`.
///
/// Les cas hors domaine (|z|² ≤ 1, NaN, infini) retombent sur le compte brut
/// au lieu de produire une valeur non numérique.
pub fn smooth(raw: u32, final_x: f64, final_y: f64, max_iterations: u32) -> f64 {
    let max = max_iterations as f64;
    if raw >= max_iterations {
        return max;
    }
    let iter = raw as f64;

    let mag_sqr = final_x * final_x + final_y * final_y;
    // ln(ln|z|) n'est défini que pour |z| > 1
    if !mag_sqr.is_finite() || mag_sqr <= 1.0 {
        return iter;
    }

    let log_zn = mag_sqr.ln() / 2.0;
    let nu = (log_zn / LN_2).ln() / LN_2;
    let smoothed = iter + 1.0 - nu;
    if !smoothed.is_finite() {
        return iter;
    }
    smoothed.clamp(0.0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_returns_max_exactly() {
        for max in [1, 50, 1000] {
            assert_eq!(smooth(max, 0.1, 0.2, max), max as f64);
            assert_eq!(smooth(max + 3, 10.0, 10.0, max), max as f64);
        }
    }

    #[test]
    fn escaped_point_is_continuous() {
        // (2, 2) après 1 itération : |z|² = 8
        let s = smooth(1, 2.0, 2.0, 100);
        let expected = 2.0 - ((8f64.ln() / 2.0) / LN_2).ln() / LN_2;
        assert!((s - expected).abs() < 1e-12);
        assert!(s > 1.0 && s < 2.0);
    }

    #[test]
    fn non_positive_magnitude_is_clamped() {
        assert_eq!(smooth(7, 0.0, 0.0, 100), 7.0);
        assert_eq!(smooth(7, 0.5, 0.5, 100), 7.0);
        assert_eq!(smooth(7, f64::NAN, 0.0, 100), 7.0);
        assert_eq!(smooth(7, f64::INFINITY, 0.0, 100), 7.0);
    }

    #[test]
    fn result_stays_in_range() {
        // Très grande magnitude : nu > raw + 1
        let s = smooth(0, 1e150, 1e150, 20);
        assert!(s.is_finite());
        assert!((0.0..=20.0).contains(&s));
    }

    #[test]
    fn smooth_increases_with_iterations() {
        let a = smooth(10, 2.5, 0.0, 100);
        let b = smooth(11, 2.5, 0.0, 100);
        assert!(b > a);
    }
}

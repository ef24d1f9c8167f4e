//! État partageable : une requête sous forme de query string plate.
//!
//! `f=julia&x=0&y=0&z=1&i=500&c=default&jr=-0.8&ji=0.156&cy=8&hs=0&sa=0.8&li=0.5&p0=0&p1=0.33&p2=0.67`
//!
//! Les clés inconnues sont ignorées, les clés absentes prennent les valeurs
//! par défaut de la famille. Les nombres sont écrits avec la représentation
//! la plus courte qui se relit à l'identique.

use std::{error::Error, fmt};

use crate::fractal::{default_request_for_family, EscapeRequest, FractalFamily};

#[derive(Clone, Debug, PartialEq)]
pub enum StateError {
    UnknownFamily(String),
    Malformed { key: String, value: String },
    BadEscape(String),
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFamily(name) => write!(f, "Famille inconnue dans l'état partagé: '{name}'"),
            Self::Malformed { key, value } => {
                write!(f, "Valeur invalide pour '{key}': '{value}'")
            }
            Self::BadEscape(text) => write!(f, "Séquence d'échappement invalide: '{text}'"),
        }
    }
}

impl Error for StateError {}

/// Sérialise la requête. La taille d'image n'en fait pas partie.
pub fn encode(request: &EscapeRequest) -> String {
    let vp = &request.viewport;
    let p = &request.scheme_params;
    let center_x = vp.center_x_hp.clone().unwrap_or_else(|| vp.center_x.to_string());
    let center_y = vp.center_y_hp.clone().unwrap_or_else(|| vp.center_y.to_string());

    let pairs: [(&str, String); 15] = [
        ("f", request.family.id().to_string()),
        ("x", center_x),
        ("y", center_y),
        ("z", vp.zoom.to_string()),
        ("i", request.max_iterations.to_string()),
        ("c", request.color_scheme.clone()),
        ("jr", request.family_constant.re.to_string()),
        ("ji", request.family_constant.im.to_string()),
        ("cy", p.cycle.to_string()),
        ("hs", p.hue_shift.to_string()),
        ("sa", p.saturation.to_string()),
        ("li", p.lightness.to_string()),
        ("p0", p.phase[0].to_string()),
        ("p1", p.phase[1].to_string()),
        ("p2", p.phase[2].to_string()),
    ];

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", escape(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Reconstruit une requête pour une image `width` x `height`.
pub fn decode(query: &str, width: u32, height: u32) -> Result<EscapeRequest, StateError> {
    let query = query.trim().trim_start_matches('?');
    let mut pairs = Vec::new();
    for part in query.split('&').filter(|s| !s.is_empty()) {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        pairs.push((unescape(key)?, unescape(value)?));
    }
    let lookup = |key: &str| last_value(&pairs, key);

    let family = match lookup("f") {
        Some(name) => FractalFamily::from_cli_name(name)
            .ok_or_else(|| StateError::UnknownFamily(name.to_string()))?,
        None => FractalFamily::Mandelbrot,
    };
    let mut request = default_request_for_family(family, width, height);

    if let Some(v) = lookup("z") {
        request.viewport.zoom = parse_f64("z", v)?;
    }
    if let Some(v) = lookup("x") {
        request.viewport.center_x = parse_f64("x", v)?;
        request.viewport.center_x_hp = precise_text(v, request.viewport.center_x);
    }
    if let Some(v) = lookup("y") {
        request.viewport.center_y = parse_f64("y", v)?;
        request.viewport.center_y_hp = precise_text(v, request.viewport.center_y);
    }
    if let Some(v) = lookup("i") {
        request.max_iterations = v.parse().map_err(|_| malformed("i", v))?;
    }
    if let Some(v) = lookup("c") {
        request.color_scheme = v.to_string();
    }
    if let Some(v) = lookup("jr") {
        request.family_constant.re = parse_f64("jr", v)?;
    }
    if let Some(v) = lookup("ji") {
        request.family_constant.im = parse_f64("ji", v)?;
    }

    let params = &mut request.scheme_params;
    for (key, slot) in [
        ("cy", &mut params.cycle),
        ("hs", &mut params.hue_shift),
        ("sa", &mut params.saturation),
        ("li", &mut params.lightness),
    ] {
        if let Some(v) = lookup(key) {
            *slot = parse_f64(key, v)?;
        }
    }
    for (i, key) in ["p0", "p1", "p2"].into_iter().enumerate() {
        if let Some(v) = lookup(key) {
            params.phase[i] = parse_f64(key, v)?;
        }
    }

    Ok(request)
}

/// Dernière occurrence d'une clé.
fn last_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Conserve le texte décimal quand il porte plus que l'`f64` arrondi.
fn precise_text(text: &str, value: f64) -> Option<String> {
    let text = text.trim();
    if text == value.to_string() {
        return None;
    }
    Some(text.to_string())
}

fn parse_f64(key: &str, value: &str) -> Result<f64, StateError> {
    value.trim().parse().map_err(|_| malformed(key, value))
}

fn malformed(key: &str, value: &str) -> StateError {
    StateError::Malformed {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn unescape(text: &str) -> Result<String, StateError> {
    let bytes = text.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                // Exactement deux chiffres hexadécimaux, sans signe
                let hex = bytes
                    .get(i + 1..i + 3)
                    .filter(|h| h.iter().all(u8::is_ascii_hexdigit))
                    .ok_or_else(|| StateError::BadEscape(text.to_string()))?;
                out.push(hex_value(hex[0]) << 4 | hex_value(hex[1]));
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|_| StateError::BadEscape(text.to_string()))
}

fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        _ => digit - b'A' + 10,
    }
}

#[cfg(test)]
mod tests {
    use num_complex::Complex64;

    use super::*;
    use crate::color::SchemeParams;
    use crate::fractal::ViewportSpec;

    #[test]
    fn roundtrip_is_exact() {
        let request = EscapeRequest {
            family: FractalFamily::Julia,
            viewport: ViewportSpec::new(320, 200, 0.1 + 0.2, -1.0 / 3.0, 123.456),
            max_iterations: 777,
            family_constant: Complex64::new(-0.7269, 0.1889),
            color_scheme: "cosine".to_string(),
            scheme_params: SchemeParams {
                cycle: 3.25,
                hue_shift: 17.0,
                saturation: 0.9,
                lightness: 0.45,
                phase: [0.1, 0.2, 1.0 / 7.0],
            },
        };
        let decoded = decode(&encode(&request), 320, 200).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn deep_zoom_center_keeps_all_digits() {
        let x = "-0.743643887037158704752191506114774";
        let y = "0.131825904205311970493132056385139";
        let vp = ViewportSpec::new(64, 64, x.parse().unwrap(), y.parse().unwrap(), 1e25)
            .with_precise_center(x, y);
        let request = EscapeRequest {
            viewport: vp,
            ..default_request_for_family(FractalFamily::Mandelbrot, 64, 64)
        };
        let decoded = decode(&encode(&request), 64, 64).unwrap();
        assert_eq!(decoded.viewport.center_x_hp.as_deref(), Some(x));
        assert_eq!(decoded, request);
    }

    #[test]
    fn missing_keys_use_family_defaults() {
        let decoded = decode("f=burning_ship&i=64", 100, 80).unwrap();
        let mut expected = default_request_for_family(FractalFamily::BurningShip, 100, 80);
        expected.max_iterations = 64;
        assert_eq!(decoded, expected);

        let empty = decode("", 10, 10).unwrap();
        assert_eq!(empty, default_request_for_family(FractalFamily::Mandelbrot, 10, 10));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let decoded = decode("?f=julia&theme=dark&z=2", 10, 10).unwrap();
        assert_eq!(decoded.family, FractalFamily::Julia);
        assert_eq!(decoded.viewport.zoom, 2.0);
    }

    #[test]
    fn malformed_values_are_errors() {
        assert_eq!(
            decode("z=big", 10, 10).unwrap_err(),
            StateError::Malformed {
                key: "z".to_string(),
                value: "big".to_string()
            }
        );
        assert!(matches!(decode("i=-3", 10, 10), Err(StateError::Malformed { .. })));
        assert_eq!(
            decode("f=newton", 10, 10).unwrap_err(),
            StateError::UnknownFamily("newton".to_string())
        );
        assert!(matches!(decode("c=%G1", 10, 10), Err(StateError::BadEscape(_))));
    }

    #[test]
    fn escapes_need_two_hex_digits() {
        for query in ["c=%+1", "c=%-1", "c=%4", "c=% 1"] {
            assert_eq!(
                decode(query, 10, 10).unwrap_err(),
                StateError::BadEscape(query[2..].to_string()),
                "{query}"
            );
        }
        assert_eq!(decode("c=%7e%7E", 10, 10).unwrap().color_scheme, "~~");
    }

    #[test]
    fn scheme_ids_are_escaped() {
        let mut request = default_request_for_family(FractalFamily::Mandelbrot, 10, 10);
        request.color_scheme = "my scheme&co".to_string();
        let encoded = encode(&request);
        assert!(encoded.contains("c=my%20scheme%26co"));
        assert_eq!(decode(&encoded, 10, 10).unwrap().color_scheme, "my scheme&co");
    }
}

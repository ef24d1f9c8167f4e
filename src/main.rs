use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use fractscope::fractal::{default_request_for_family, render_curve, CurveKind, EscapeRequest, FractalFamily};
use fractscope::io::save_png;
use fractscope::{state, Framebuffer, Renderer};

/// Générateur de fractales escape-time en ligne de commande.
///
/// Exemples :
///   fractscope-cli --family julia --width 1920 --height 1080 --output julia.png
///   fractscope-cli --state "f=mandelbrot&x=-0.75&y=0.1&z=200" --output zoom.png
///   fractscope-cli --curve dragon --depth 16 --output dragon.png
#[derive(Parser, Debug)]
#[command(
    name = "fractscope-cli",
    about = "Générateur de fractales (Mandelbrot, Julia, Burning Ship, courbes) en ligne de commande",
    version
)]
struct Cli {
    /// Famille escape-time (mandelbrot, julia, burning_ship)
    #[arg(long)]
    family: Option<String>,

    /// Largeur de l'image de sortie en pixels
    #[arg(long)]
    width: Option<u32>,

    /// Hauteur de l'image de sortie en pixels
    #[arg(long)]
    height: Option<u32>,

    /// Centre X du plan complexe (décimal, précision arbitraire acceptée)
    #[arg(long, allow_hyphen_values = true)]
    center_x: Option<String>,

    /// Centre Y du plan complexe (décimal, précision arbitraire acceptée)
    #[arg(long, allow_hyphen_values = true)]
    center_y: Option<String>,

    /// Facteur de zoom (1 = 3.5 unités sur la largeur)
    #[arg(long)]
    zoom: Option<f64>,

    /// Nombre maximal d'itérations (sinon valeur par défaut de la famille)
    #[arg(long)]
    iterations: Option<u32>,

    /// Schéma de couleurs (default, cosine, hsl, fire, ocean, ...)
    #[arg(long)]
    scheme: Option<String>,

    /// Nombre de tours de palette
    #[arg(long)]
    cycle: Option<f64>,

    /// Décalage de teinte en degrés (schéma hsl)
    #[arg(long, allow_hyphen_values = true)]
    hue_shift: Option<f64>,

    /// Saturation (schéma hsl)
    #[arg(long)]
    saturation: Option<f64>,

    /// Luminosité (schéma hsl)
    #[arg(long)]
    lightness: Option<f64>,

    /// Phases R,G,B du gradient cosinus (ex. 0,0.33,0.67)
    #[arg(long, value_delimiter = ',', num_args = 3)]
    phase: Option<Vec<f64>>,

    /// Partie réelle de la constante de Julia
    #[arg(long, allow_hyphen_values = true)]
    julia_re: Option<f64>,

    /// Partie imaginaire de la constante de Julia
    #[arg(long, allow_hyphen_values = true)]
    julia_im: Option<f64>,

    /// Restaure un état partagé (query string)
    #[arg(long, value_name = "QUERY")]
    state: Option<String>,

    /// Charge une requête sérialisée en JSON
    #[arg(long, value_name = "FICHIER")]
    config: Option<PathBuf>,

    /// Affiche l'état partageable de la requête finale
    #[arg(long)]
    print_state: bool,

    /// Désactive le chemin GPU
    #[arg(long)]
    no_gpu: bool,

    /// Courbe vectorielle au lieu d'une fractale escape-time (koch, dragon)
    #[arg(long)]
    curve: Option<String>,

    /// Profondeur de récursion de la courbe
    #[arg(long)]
    depth: Option<u32>,

    /// Fichier de sortie PNG
    #[arg(long, value_name = "FICHIER")]
    output: Option<PathBuf>,
}

const DEFAULT_WIDTH: u32 = 1920;
const DEFAULT_HEIGHT: u32 = 1080;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Some(curve) = &cli.curve {
        let kind: CurveKind = curve.parse()?;
        return run_curve(&cli, kind);
    }

    let request = build_request(&cli)?;
    if cli.print_state {
        println!("{}", state::encode(&request));
    }
    let Some(output) = &cli.output else {
        if cli.print_state {
            return Ok(());
        }
        bail!("--output est requis pour générer une image");
    };

    let mut renderer = Renderer::new(!cli.no_gpu);
    if let Some(adapter) = renderer.gpu_adapter() {
        log::info!("GPU: {adapter}");
    }
    let frame = pollster::block_on(renderer.render(&request, log_progress))
        .with_context(|| format!("rendu {} impossible", request.family))?;
    renderer.shutdown();

    write_png(&frame, output)
}

fn run_curve(cli: &Cli, kind: CurveKind) -> Result<()> {
    let Some(output) = &cli.output else {
        bail!("--output est requis pour générer une image");
    };
    let mut viewport = kind.default_viewport(
        cli.width.unwrap_or(DEFAULT_WIDTH),
        cli.height.unwrap_or(DEFAULT_HEIGHT),
    );
    if let Some(x) = &cli.center_x {
        viewport.center_x = parse_center(x)?.0;
    }
    if let Some(y) = &cli.center_y {
        viewport.center_y = parse_center(y)?.0;
    }
    if let Some(zoom) = cli.zoom {
        viewport.zoom = zoom;
    }
    let depth = cli.depth.unwrap_or_else(|| kind.default_depth());

    let frame = pollster::block_on(render_curve(kind, depth, &viewport, log_progress))
        .with_context(|| format!("tracé {kind} impossible"))?;
    write_png(&frame, output)
}

/// Requête de base (JSON, état partagé ou défauts), puis options explicites.
fn build_request(cli: &Cli) -> Result<EscapeRequest> {
    let width = cli.width.unwrap_or(DEFAULT_WIDTH);
    let height = cli.height.unwrap_or(DEFAULT_HEIGHT);
    let family = cli
        .family
        .as_deref()
        .map(str::parse::<FractalFamily>)
        .transpose()?;

    let mut request = if let Some(path) = &cli.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("lecture de {}", path.display()))?;
        serde_json::from_str::<EscapeRequest>(&text)
            .with_context(|| format!("JSON invalide dans {}", path.display()))?
    } else if let Some(query) = &cli.state {
        state::decode(query, width, height).context("état partagé invalide")?
    } else {
        default_request_for_family(family.unwrap_or(FractalFamily::Mandelbrot), width, height)
    };

    if let Some(family) = family {
        request.family = family;
    }
    if let Some(width) = cli.width {
        request.viewport.width = width;
    }
    if let Some(height) = cli.height {
        request.viewport.height = height;
    }
    if let Some(x) = &cli.center_x {
        let (value, precise) = parse_center(x)?;
        request.viewport.center_x = value;
        request.viewport.center_x_hp = precise;
    }
    if let Some(y) = &cli.center_y {
        let (value, precise) = parse_center(y)?;
        request.viewport.center_y = value;
        request.viewport.center_y_hp = precise;
    }
    if let Some(zoom) = cli.zoom {
        request.viewport.zoom = zoom;
    }
    if let Some(iters) = cli.iterations {
        request.max_iterations = iters;
    }
    if let Some(scheme) = &cli.scheme {
        request.color_scheme = scheme.clone();
    }
    if let Some(re) = cli.julia_re {
        request.family_constant.re = re;
    }
    if let Some(im) = cli.julia_im {
        request.family_constant.im = im;
    }

    let params = &mut request.scheme_params;
    if let Some(cycle) = cli.cycle {
        params.cycle = cycle;
    }
    if let Some(hue_shift) = cli.hue_shift {
        params.hue_shift = hue_shift;
    }
    if let Some(saturation) = cli.saturation {
        params.saturation = saturation;
    }
    if let Some(lightness) = cli.lightness {
        params.lightness = lightness;
    }
    if let Some(phase) = &cli.phase {
        for (slot, value) in params.phase.iter_mut().zip(phase) {
            *slot = *value;
        }
    }

    Ok(request)
}

/// Valeur `f64` du centre, plus le texte exact s'il porte davantage de chiffres.
fn parse_center(text: &str) -> Result<(f64, Option<String>)> {
    let text = text.trim();
    let value: f64 = text
        .parse()
        .with_context(|| format!("coordonnée invalide: '{text}'"))?;
    let precise = (value.to_string() != text).then(|| text.to_string());
    Ok((value, precise))
}

fn log_progress(percent: f64) {
    log::info!("progression: {percent:.0}%");
}

fn write_png(frame: &Framebuffer, output: &Path) -> Result<()> {
    save_png(frame, output).with_context(|| format!("écriture du PNG {}", output.display()))?;
    log::info!("image écrite: {}", output.display());
    Ok(())
}

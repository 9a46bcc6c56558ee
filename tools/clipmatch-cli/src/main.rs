//! Command-line driver for the clipmatch probe.
//!
//! ```text
//! clipmatch render --kind rrect --time 2500 -o frame.png
//! clipmatch sweep --steps 32
//! clipmatch compare a.png b.png -d diff.png
//! clipmatch list
//! ```

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use clipmatch::{
    build_clip_region, compare_buffers, generate_diff_image, misclassified_pixels, mismatch_mask,
    render_frame_with, Canvas, DrawOrder, GeometryKind, PixelBuffer, PointD, ProbeConfig,
};

#[derive(Parser, Debug)]
#[command(name = "clipmatch", version, about = "Clip versus fill rasterization probe")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one probe frame to a PNG file
    Render(RenderArgs),
    /// Render every kind across the animation period and report mismatches
    Sweep(SweepArgs),
    /// Compare two PNG files pixel by pixel
    Compare(CompareArgs),
    /// List geometry kinds and their selection keys
    List,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OrderArg {
    ClipFirst,
    GeometryFirst,
}

impl From<OrderArg> for DrawOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::ClipFirst => DrawOrder::ClipFirst,
            OrderArg::GeometryFirst => DrawOrder::GeometryFirst,
        }
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Geometry kind name (see `list`)
    #[arg(long)]
    kind: Option<String>,

    /// Animation clock in milliseconds
    #[arg(long, conflicts_with = "offset")]
    time: Option<f64>,

    /// Explicit offset as `x,y`
    #[arg(long, value_parser = parse_offset, allow_hyphen_values = true)]
    offset: Option<PointD>,

    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Anti-alias clip and fill edges
    #[arg(long)]
    aa: bool,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(short, long, value_name = "FILE", default_value = "clipmatch.png")]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct SweepArgs {
    /// Offsets sampled per animation period
    #[arg(long, default_value_t = 16, value_parser = clap::value_parser!(u32).range(1..))]
    steps: u32,

    /// Anti-alias clip and fill edges
    #[arg(long)]
    aa: bool,

    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    a: PathBuf,
    b: PathBuf,

    /// Write a diff image here
    #[arg(short, long, value_name = "FILE")]
    diff: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Render(args) => cmd_render(args),
        Command::Sweep(args) => cmd_sweep(args),
        Command::Compare(args) => cmd_compare(args),
        Command::List => {
            cmd_list();
            Ok(())
        }
    }
}

fn parse_offset(s: &str) -> Result<PointD, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `x,y`, got `{s}`"))?;
    let coord = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad coordinate `{v}`: {e}"))
    };
    Ok(PointD::new(coord(x)?, coord(y)?))
}

fn load_config(path: Option<&Path>) -> Result<ProbeConfig> {
    match path {
        Some(path) => ProbeConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ProbeConfig::default()),
    }
}

fn save_png(path: &Path, buf: PixelBuffer) -> Result<()> {
    let (w, h) = (buf.width, buf.height);
    let img = image::RgbaImage::from_raw(w, h, buf.data)
        .ok_or_else(|| anyhow!("pixel data does not match {w}x{h}"))?;
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn load_png(path: &Path) -> Result<PixelBuffer> {
    let img = image::open(path)
        .with_context(|| format!("reading {}", path.display()))?
        .to_rgba8();
    let (w, h) = img.dimensions();
    Ok(PixelBuffer::from_rgba(w, h, img.into_raw())?)
}

fn cmd_render(args: RenderArgs) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(kind) = args.kind {
        cfg.kind = kind;
    }
    if let Some(order) = args.order {
        cfg.clip_first = DrawOrder::from(order).is_clip_first();
    }
    cfg.anti_alias |= args.aa;
    cfg.validate()?;

    let probe = cfg.build_probe(0.0)?;
    let offset = args
        .offset
        .unwrap_or_else(|| probe.offset_at(args.time.unwrap_or(0.0)));
    let state = probe.state();
    info!(
        kind = %state.kind(),
        order = %state.order(),
        aa = state.anti_alias(),
        x = offset.x,
        y = offset.y,
        "render"
    );

    let mut canvas = Canvas::new(cfg.width, cfg.height)?;
    canvas.clear(probe.palette().background);
    render_frame_with(
        &mut canvas,
        state.kind(),
        offset,
        state.order(),
        state.anti_alias(),
        probe.palette(),
    );
    save_png(&args.output, PixelBuffer::from(canvas.into_buffer()))?;
    println!("Saved: {}", args.output.display());
    Ok(())
}

fn cmd_sweep(args: SweepArgs) -> Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    cfg.anti_alias |= args.aa;
    cfg.validate()?;

    let probe = cfg.build_probe(0.0)?;
    let palette = *probe.palette();
    let anim = probe.animator();
    let aa = cfg.anti_alias;

    println!("{:<18} {:>10} {:>10} {:>14}", "kind", "mismatch", "order-dep", "misclassified");
    let mut failures = 0usize;
    for kind in GeometryKind::ALL {
        let (mut mismatches, mut order_dependent, mut misclassified) = (0usize, 0usize, 0usize);
        for i in 0..args.steps {
            let t = anim.start_ms() + anim.period_ms() * i as f64 / args.steps as f64;
            let offset = anim.offset_at(t);
            let clip = build_clip_region(kind, offset, aa);

            let mut masks = Vec::with_capacity(2);
            for order in [DrawOrder::ClipFirst, DrawOrder::GeometryFirst] {
                let mut canvas = Canvas::new(cfg.width, cfg.height)?;
                canvas.clear(palette.background);
                render_frame_with(&mut canvas, kind, offset, order, aa, &palette);
                let frame = PixelBuffer::from(canvas.into_buffer());

                let wrong = misclassified_pixels(&frame, kind, offset, order, &palette);
                if let Some(&(x, y)) = wrong.first() {
                    warn!(%kind, %order, t, x, y, count = wrong.len(), "misclassified pixels");
                }
                misclassified += wrong.len();
                masks.push(mismatch_mask(&frame, order, &clip, &palette));
            }
            mismatches += masks[0].len();
            order_dependent += symmetric_difference(&masks[0], &masks[1]);
            debug!(%kind, t, x = offset.x, y = offset.y, "sampled");
        }
        println!(
            "{:<18} {:>10} {:>10} {:>14}",
            kind.name(),
            mismatches,
            order_dependent,
            misclassified
        );
        failures += misclassified;
    }

    if failures > 0 {
        bail!("{failures} pixels misclassified away from shape boundaries");
    }
    Ok(())
}

/// Size of the symmetric difference of two scan-ordered position lists.
fn symmetric_difference(a: &[(u32, u32)], b: &[(u32, u32)]) -> usize {
    let key = |&(x, y): &(u32, u32)| (y, x);
    let (mut i, mut j, mut n) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match key(&a[i]).cmp(&key(&b[j])) {
            std::cmp::Ordering::Less => {
                n += 1;
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                n += 1;
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    n + (a.len() - i) + (b.len() - j)
}

fn cmd_compare(args: CompareArgs) -> Result<()> {
    let a = load_png(&args.a)?;
    let b = load_png(&args.b)?;

    let result = compare_buffers(&a, &b)?;
    println!("{result}");

    if let Some(path) = args.diff {
        save_png(&path, generate_diff_image(&a, &b)?)?;
        println!("Diff saved: {}", path.display());
    }

    if !result.identical {
        bail!("images differ");
    }
    Ok(())
}

fn cmd_list() {
    println!("Geometry kinds:");
    for kind in GeometryKind::ALL {
        let note = if kind.is_compound() { " (compound)" } else { "" };
        println!("  {}  {}{}", kind.key(), kind.name(), note);
    }
}

// ============================================================================
// Tests
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand, ValueEnum};
use famshot::host::transact;
use famshot::model::{DetailLevel, Resolution};

#[derive(Parser, Debug)]
#[command(name = "famshot", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a document and a square thumbnail per variant.
    Render(RenderArgs),
    /// Save a document per variant without exporting images.
    Layout(LayoutArgs),
    /// List component files and their variants.
    Scan(ScanArgs),
}

#[derive(Args, Debug)]
struct PathArgs {
    /// Batch configuration JSON. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory scanned for component files.
    #[arg(long)]
    source: Option<PathBuf>,

    /// Output directory for generated documents.
    #[arg(long)]
    projects: Option<PathBuf>,

    /// Output directory for thumbnails.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Type parameter whose value names the artifacts.
    #[arg(long)]
    name_parameter: Option<String>,

    /// Whether the host reports document titles with their extension.
    #[arg(long, value_enum)]
    title_convention: Option<TitleChoice>,
}

#[derive(Args, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    paths: PathArgs,

    /// View to export.
    #[arg(long, value_enum)]
    view: Option<ViewChoice>,

    /// Side of the square thumbnail in pixels.
    #[arg(long)]
    pixel_size: Option<u32>,

    /// Image file extension (png, jpg, bmp, tif, tga).
    #[arg(long)]
    extension: Option<String>,

    /// Base zoom, multiplied with the framing scale.
    #[arg(long)]
    zoom: Option<f64>,

    /// View scale denominator (20 means 1:20).
    #[arg(long)]
    view_scale: Option<u32>,

    /// Export resolution in dpi.
    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long, value_enum)]
    detail: Option<DetailChoice>,
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Directory scanned for component files.
    #[arg(long)]
    source: PathBuf,

    /// Component file extension.
    #[arg(long, default_value = famshot::host::memory::COMPONENT_EXTENSION)]
    extension: String,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewChoice {
    Plan,
    Isometric,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DetailChoice {
    Coarse,
    Medium,
    Fine,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TitleChoice {
    WithExtension,
    WithoutExtension,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Layout(args) => cmd_layout(args),
        Command::Scan(args) => cmd_scan(args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &PathArgs) -> anyhow::Result<famshot::BatchConfig> {
    let mut cfg = match &args.config {
        Some(path) => famshot::BatchConfig::from_json_file(path)?,
        None => {
            let require = |p: &Option<PathBuf>, flag: &str| {
                p.clone()
                    .with_context(|| format!("--{flag} is required without --config"))
            };
            famshot::BatchConfig::new(famshot::PathSet::new(
                require(&args.source, "source")?,
                require(&args.projects, "projects")?,
                require(&args.images, "images")?,
            ))
        }
    };

    if let Some(p) = &args.source {
        cfg.paths.source = p.clone();
    }
    if let Some(p) = &args.projects {
        cfg.paths.projects = p.clone();
    }
    if let Some(p) = &args.images {
        cfg.paths.images = p.clone();
    }
    if let Some(n) = &args.name_parameter {
        cfg.name_parameter = n.clone();
    }
    if let Some(t) = args.title_convention {
        cfg.title_convention = match t {
            TitleChoice::WithExtension => famshot::TitleConvention::WithExtension,
            TitleChoice::WithoutExtension => famshot::TitleConvention::WithoutExtension,
        };
    }
    Ok(cfg)
}

fn apply_render_flags(args: &RenderArgs, cfg: &mut famshot::BatchConfig) -> anyhow::Result<()> {
    let settings = cfg.render.get_or_insert_with(famshot::RenderSettings::default);
    if let Some(v) = args.view {
        settings.view = match v {
            ViewChoice::Plan => famshot::ViewKind::Plan,
            ViewChoice::Isometric => famshot::ViewKind::Isometric,
        };
    }
    if let Some(n) = args.pixel_size {
        settings.pixel_size = n;
    }
    if let Some(ext) = &args.extension {
        settings.extension = ext.clone();
    }
    if let Some(z) = args.zoom {
        settings.zoom = z;
    }
    if let Some(s) = args.view_scale {
        settings.view_scale = s;
    }
    if let Some(dpi) = args.dpi {
        settings.resolution = Resolution::new(dpi)?;
    }
    if let Some(d) = args.detail {
        settings.detail_level = match d {
            DetailChoice::Coarse => DetailLevel::Coarse,
            DetailChoice::Medium => DetailLevel::Medium,
            DetailChoice::Fine => DetailLevel::Fine,
        };
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.paths)?;
    apply_render_flags(&args, &mut cfg)?;
    run(&cfg)
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.paths)?;
    cfg.render = None;
    run(&cfg)
}

fn run(cfg: &famshot::BatchConfig) -> anyhow::Result<()> {
    cfg.validate()?;
    let components = famshot::discover_components(&cfg.paths.source, &cfg.component_extension)?;

    let mut ws = famshot::MemoryWorkspace::new().with_title_convention(cfg.title_convention);
    let report = famshot::run_batch_with(
        &mut ws,
        &components,
        cfg.render.as_ref(),
        &cfg.lifecycle_options(),
        &mut Progress,
        &famshot::CancelFlag::new(),
    )?;

    for f in &report.failures {
        eprintln!("failed {} ({} / {}): {}", f.artifact, f.component, f.variant, f.error);
    }
    for s in &report.skipped {
        eprintln!("skipped {}: {}", s.path.display(), s.error);
    }
    eprintln!(
        "done: {} attempted, {} succeeded, {} failed, {} components skipped",
        report.artifacts.len(),
        report.succeeded,
        report.failures.len(),
        report.skipped.len()
    );
    Ok(())
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    let components = famshot::discover_components(&args.source, &args.extension)?;
    let mut ws = famshot::MemoryWorkspace::new();

    for path in &components {
        let rel = path.strip_prefix(&args.source).unwrap_or(path);
        match transact(&mut ws, "scan component", |ws| load_and_unload(ws, path)) {
            Ok((name, variants)) => {
                println!("{} ({name}): {} variant(s)", rel.display(), variants.len());
                for v in variants {
                    println!("  {v}");
                }
            }
            Err(e) => eprintln!("{}: {e}", rel.display()),
        }
    }
    Ok(())
}

/// Loads a component, reads its variant names and deletes it again in the same transaction.
fn load_and_unload(
    ws: &mut famshot::MemoryWorkspace,
    path: &Path,
) -> famshot::FamshotResult<(String, Vec<String>)> {
    use famshot::Workspace as _;

    let def = ws.load_component(path)?;
    ws.delete(def.id)?;
    Ok((def.name, def.variants.into_iter().map(|v| v.name).collect()))
}

struct Progress;

impl famshot::BatchObserver for Progress {
    fn component_started(&mut self, component: &famshot::ComponentDefinition) {
        eprintln!(
            "{} ({} variant(s))",
            component.source.display(),
            component.variants.len()
        );
    }

    fn variant_finished(
        &mut self,
        artifact: &str,
        outcome: &famshot::FamshotResult<String>,
        attempted: usize,
    ) {
        let status = if outcome.is_ok() { "ok" } else { "failed" };
        eprintln!("  [{attempted}] {artifact}: {status}");
    }
}

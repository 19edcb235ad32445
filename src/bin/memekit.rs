use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "memekit", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the templates in a catalog JSON file.
    Templates(TemplatesArgs),
    /// Rasterize a scene JSON file into a JPEG or PNG.
    Render(RenderArgs),
    /// Put captions on a catalog template and generate the meme.
    Compose(ComposeArgs),
}

#[derive(Parser, Debug)]
struct TemplatesArgs {
    /// Template catalog JSON (array of {id, title, image_uri}).
    #[arg(long)]
    catalog: PathBuf,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Scene JSON (a serialized canvas snapshot).
    #[arg(long)]
    scene: PathBuf,

    /// Output directory; defaults to MEMEKIT_OUTPUT_DIR or $TMPDIR/memekit.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Root for relative image paths; defaults to the scene's directory.
    #[arg(long)]
    assets: Option<PathBuf>,

    /// TrueType/OpenType font used for text overlays.
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatChoice::Jpeg)]
    format: FormatChoice,

    /// Lossy quality in [0, 1].
    #[arg(long, default_value_t = 0.9)]
    quality: f32,

    /// Output file name stem.
    #[arg(long, default_value = "generated")]
    name: String,

    /// Device pixels per logical point.
    #[arg(long)]
    pixel_ratio: Option<f64>,
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Template catalog JSON.
    #[arg(long)]
    catalog: PathBuf,

    /// Id of the template to use as background.
    #[arg(long)]
    template: String,

    /// Caption; repeat for more lines, stacked top to bottom.
    #[arg(long = "text")]
    texts: Vec<String>,

    /// Vertical distance between stacked captions, in points.
    #[arg(long, default_value_t = 48.0)]
    spacing: f64,

    /// Output directory; defaults to MEMEKIT_OUTPUT_DIR or $TMPDIR/memekit.
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// TrueType/OpenType font used for captions.
    #[arg(long)]
    font: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = FormatChoice::Jpeg)]
    format: FormatChoice,

    /// Seconds to wait for the capture.
    #[arg(long, default_value_t = 60)]
    timeout_secs: u64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatChoice {
    Jpeg,
    Png,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Templates(args) => cmd_templates(args),
        Command::Render(args) => cmd_render(args),
        Command::Compose(args) => cmd_compose(args),
    }
}

fn cmd_templates(args: TemplatesArgs) -> anyhow::Result<()> {
    let catalog = memekit::TemplateCatalog::from_json_file(&args.catalog)?;
    for t in catalog.templates() {
        println!("{}\t{}\t{}", t.id, t.title, t.image_uri);
    }
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    use memekit::Rasterizer as _;

    let scene = memekit::CanvasSnapshot::from_json_file(&args.scene)
        .with_context(|| format!("load scene '{}'", args.scene.display()))?;

    let mut settings = memekit::RasterSettings::from_env();
    settings.asset_root = match args.assets {
        Some(root) => root,
        None => args
            .scene
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    if let Some(dir) = args.out_dir {
        settings.output_dir = dir;
    }
    if let Some(font) = args.font {
        settings.font_path = Some(font);
    }
    if let Some(pr) = args.pixel_ratio {
        settings.pixel_ratio = pr;
    }

    let opts = memekit::CaptureOptions {
        format: args.format.into(),
        quality: args.quality,
        file_name: args.name,
    };

    let mut rasterizer = memekit::CpuRasterizer::new(settings)?;
    let uri = rasterizer.capture(&scene, &opts)?;
    eprintln!("wrote {uri}");
    Ok(())
}

fn cmd_compose(args: ComposeArgs) -> anyhow::Result<()> {
    let catalog = memekit::TemplateCatalog::from_json_file(&args.catalog)?;
    let template = catalog
        .get(&args.template)
        .with_context(|| format!("no template '{}' in catalog", args.template))?;
    let root = args
        .catalog
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let mut settings = memekit::RasterSettings::from_env();
    settings.asset_root = root.clone();
    if let Some(dir) = args.out_dir {
        settings.output_dir = dir;
    }
    if let Some(font) = args.font {
        settings.font_path = Some(font);
    }

    let mut editor = memekit::MemeEditor::new(
        memekit::EditorSettings::from_env(),
        memekit::CpuRasterizer::new(settings)?,
        memekit::FsAspectProbe::new(root),
        memekit::GeneratedImageHistory::new(),
    )?
    .with_capture_options(memekit::CaptureOptions {
        format: args.format.into(),
        ..memekit::CaptureOptions::default()
    });

    editor.select_template(template)?;
    for (i, caption) in args.texts.iter().enumerate() {
        let id = editor.add_text()?;
        editor.set_text(id, caption)?;
        let handle = editor
            .overlays()
            .last()
            .and_then(memekit::Overlay::handle)
            .context("caption was not added")?;
        let dy = args.spacing * i as f64;
        editor.apply_gesture(handle, memekit::GestureEvent::Pan { dx: 0.0, dy });
        editor.apply_gesture(handle, memekit::GestureEvent::PanEnd);
    }

    editor.generate()?;
    let timeout = std::time::Duration::from_secs(args.timeout_secs);
    match editor.wait_generation(timeout)? {
        memekit::GenerationStatus::Succeeded(uri) => {
            println!("{uri}");
            Ok(())
        }
        memekit::GenerationStatus::Failed(reason) => anyhow::bail!("generation failed: {reason}"),
        other => anyhow::bail!("unexpected generation status: {other:?}"),
    }
}

impl From<FormatChoice> for memekit::CaptureFormat {
    fn from(choice: FormatChoice) -> Self {
        match choice {
            FormatChoice::Jpeg => Self::Jpeg,
            FormatChoice::Png => Self::Png,
        }
    }
}

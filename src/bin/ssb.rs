use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ssb", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a script and print its document as JSON.
    Parse(ParseArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Input SSB script.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Also report semantic problems (unknown styles, reversed times).
    #[arg(long, default_value_t = false)]
    warnings: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input SSB script.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Query time in milliseconds.
    #[arg(long)]
    time: u64,

    /// Frame width; defaults to the background width.
    #[arg(long)]
    width: Option<u32>,

    /// Frame height; defaults to the background height.
    #[arg(long)]
    height: Option<u32>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Image to draw the subtitles onto.
    #[arg(long)]
    background: Option<PathBuf>,

    /// Also report semantic problems (unknown styles, reversed times).
    #[arg(long, default_value_t = false)]
    warnings: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Parse(args) => cmd_parse(args),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_parse(args: ParseArgs) -> anyhow::Result<()> {
    let file = std::fs::File::open(&args.in_path)
        .with_context(|| format!("open script '{}'", args.in_path.display()))?;
    let mut parser = ssb::ScriptParser::new(ssb::ParseLevel::from_warnings(args.warnings));
    parser
        .parse_reader(std::io::BufReader::new(file))
        .with_context(|| format!("parse script '{}'", args.in_path.display()))?;
    let json = serde_json::to_string_pretty(parser.document()).context("serialize document")?;
    println!("{json}");
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let background = args
        .background
        .as_ref()
        .map(|path| {
            image::open(path)
                .with_context(|| format!("open background '{}'", path.display()))
                .map(|img| img.to_rgba8())
        })
        .transpose()?;

    let (width, height) = match (args.width, args.height, &background) {
        (Some(w), Some(h), _) => (w, h),
        (w, h, Some(bg)) => (w.unwrap_or(bg.width()), h.unwrap_or(bg.height())),
        _ => anyhow::bail!("--width and --height are required without --background"),
    };

    let mut frame = vec![0u8; width as usize * height as usize * 4];
    if let Some(bg) = &background {
        anyhow::ensure!(
            bg.dimensions() == (width, height),
            "background is {}x{}, frame is {width}x{height}",
            bg.width(),
            bg.height()
        );
        for (dst, src) in frame.chunks_exact_mut(4).zip(bg.as_raw().chunks_exact(4)) {
            let a = u16::from(src[3]);
            for c in 0..3 {
                dst[c] = ((u16::from(src[c]) * a + 127) / 255) as u8;
            }
            dst[3] = src[3];
        }
    }

    let opts = ssb::RendererOpts::default().with_level(ssb::ParseLevel::from_warnings(args.warnings));
    let mut renderer = ssb::Renderer::from_path(&args.in_path, width, height, ssb::ColorSpace::Rgba, opts)
        .with_context(|| format!("load script '{}'", args.in_path.display()))?;
    let drawn = renderer.render(&mut frame, width as usize * 4, args.time)?;
    tracing::debug!(drawn, time = args.time, "frame rendered");

    for px in frame.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a > 0 && a < 255 {
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    image::save_buffer_with_format(
        &args.out,
        &frame,
        width,
        height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

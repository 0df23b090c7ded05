//! Danmu CLI Tool
//!
//! Command-line interface for overlaying danmaku onto a video file.

use anyhow::{Context, Result};
use clap::Parser;
use danmu_core::{parse, SourceFormat};
use danmu_video::{overlay_video, OverlayConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "danmu")]
#[command(about = "Overlay scrolling danmaku annotations onto a video file")]
#[command(version)]
struct Cli {
    /// Input video file path
    input: PathBuf,

    /// Output video file path
    output: PathBuf,

    /// Danmaku file path (.ass, .ssa or .json)
    danmaku: PathBuf,

    /// TrueType/OpenType font used for danmaku text
    #[arg(long, default_value = "msyh.ttc")]
    font: PathBuf,

    /// Font pixel size
    #[arg(long, default_value = "25")]
    font_size: f32,

    /// Height of one danmaku lane in pixels
    #[arg(long, default_value = "30")]
    lane_height: u32,

    /// Seconds an annotation takes to cross the frame
    #[arg(long, default_value = "8")]
    crossing_secs: f64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Reject unsupported danmaku formats before touching any video.
    SourceFormat::from_path(&cli.danmaku)?;

    println!("Processing video: {}", cli.input.display());
    println!("Using danmaku file: {}", cli.danmaku.display());

    let parsed = parse::parse_file(&cli.danmaku).context("Failed to parse danmaku file")?;
    for warning in &parsed.warnings {
        eprintln!("Warning: skipped danmaku {warning}");
    }
    println!(
        "Loaded {} danmaku events ({} skipped)",
        parsed.events.len(),
        parsed.warnings.len()
    );

    let mut config = OverlayConfig::new(&cli.font);
    config.font_size = cli.font_size;
    config.lane_height = cli.lane_height;
    config.crossing_secs = cli.crossing_secs;

    let summary = overlay_video(&cli.input, &cli.output, parsed.events, &config)
        .context("Failed to overlay danmaku")?;

    println!(
        "Wrote {} frames at {}x{} ({:.2} fps), peak {} annotations on screen",
        summary.frames_written, summary.width, summary.height, summary.fps, summary.peak_active
    );
    println!("Output saved to: {}", cli.output.display());

    Ok(())
}

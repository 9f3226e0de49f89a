use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::{info, warn};

use goalfinder::geometry::GeometryBackend;
use goalfinder::mask::MaskSource;
use goalfinder::outline::OutlineExtractor;
use goalfinder::{logging, Config, FramePipeline};

/// Find the best target outline in every frame of a folder.
#[derive(Parser)]
#[command(name = "goalfinder", version)]
struct Cli {
    /// Folder of frames (any format the `image` crate reads).
    frames: PathBuf,

    /// Log per-outline scores.
    #[arg(short, long)]
    verbose: bool,

    /// Run mask, outline and geometry stages through OpenCV.
    #[cfg(feature = "opencv")]
    #[arg(long)]
    opencv: bool,
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("loading configuration")?;
    config.scorer.verbose |= cli.verbose;
    logging::init(config.scorer.verbose, module_path!());

    let frames = list_frames(&cli.frames)?;

    #[cfg(feature = "opencv")]
    if cli.opencv {
        use goalfinder::cv::{OpenCvGeometry, OpenCvMask, OpenCvOutlines};
        let mask = OpenCvMask::new(config.mask.clone())?;
        let pipeline = FramePipeline::with_parts(config.scorer, mask, OpenCvOutlines, OpenCvGeometry)?;
        return run(&pipeline, &frames);
    }

    let pipeline = FramePipeline::new(config)?;
    run(&pipeline, &frames)
}

fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    frames.sort();
    Ok(frames)
}

fn run<M, E, G>(pipeline: &FramePipeline<M, E, G>, frames: &[PathBuf]) -> Result<()>
where
    M: MaskSource,
    E: OutlineExtractor,
    G: GeometryBackend,
{
    info!("scoring against {:?}", pipeline.selector().config());
    let mut found = Vec::new();

    for (frame_id, path) in frames.iter().enumerate() {
        let frame = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("could not read {}: {e}; skipping", path.display());
                continue;
            }
        };

        let result = pipeline
            .process(&frame)
            .with_context(|| format!("processing {}", path.display()))?;

        if result.found() {
            println!(
                "{frame_id} {}: score {:.4} ({} points, {}/{} outlines rejected)",
                path.display(),
                result.candidate.score,
                result.candidate.outline.len(),
                result.rejected,
                result.outline_count
            );
            found.push(result.candidate.score);
        } else {
            println!("{frame_id} {}: no target", path.display());
        }
    }

    if found.is_empty() {
        info!("no targets in {} frames", frames.len());
    } else {
        let mean = found.iter().sum::<f64>() / found.len() as f64;
        let best = found.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!(
            "target found in {} of {} frames; mean score {mean:.4}, best {best:.4}",
            found.len(),
            frames.len()
        );
    }
    Ok(())
}

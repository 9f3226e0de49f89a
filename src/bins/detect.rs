use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use log::info;
use serde_json::json;

use goalfinder::{logging, Config, FramePipeline};

/// Score the outlines of one frame and print the winner as JSON.
#[derive(Parser)]
#[command(name = "detect", version)]
struct Cli {
    /// Frame to analyse.
    image: PathBuf,

    /// Log per-outline scores.
    #[arg(short, long)]
    verbose: bool,

    /// Include every qualifying outline's breakdown, best first.
    #[arg(long)]
    all: bool,

    /// Write the intermediate edge mask here.
    #[arg(long)]
    mask_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("loading configuration")?;
    config.scorer.verbose |= cli.verbose;
    logging::init(config.scorer.verbose, module_path!());
    let pipeline = FramePipeline::new(config)?;

    let frame = image::open(&cli.image)
        .with_context(|| format!("reading {}", cli.image.display()))?
        .to_rgb8();

    info!("scoring against {:?}", pipeline.selector().config());
    let mask = pipeline.edge_mask(&frame)?;
    if let Some(out) = &cli.mask_out {
        mask.save(out).with_context(|| format!("writing {}", out.display()))?;
        info!("edge mask written to {}", out.display());
    }

    let ranking = pipeline.rank_mask(&mask)?;
    let reports: Vec<_> = ranking.candidates.iter().rev().map(|(report, _)| report.clone()).collect();
    let outline_count = ranking.total();
    let rejected = ranking.rejected;
    let winner = ranking.into_winner();

    let mut output = json!({
        "image": cli.image.display().to_string(),
        "found": !winner.is_none(),
        "score": winner.score,
        "outline": winner.outline,
        "outlines": outline_count,
        "rejected": rejected,
    });
    if cli.all {
        output["candidates"] = serde_json::to_value(reports)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

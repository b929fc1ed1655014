//! scan - one-shot waste classification for a local photo

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;

use binsight::detect;
use binsight::pipeline::{PipelineSettings, ScanPipeline};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Photo to classify (jpeg or png).
    image: PathBuf,
    /// Model file or `stub:` reference; defaults to the standard candidates.
    #[arg(long)]
    model: Option<String>,
    /// Minimum confidence for reported detections.
    #[arg(long, default_value_t = 0.30)]
    threshold: f32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    stage("load model");
    let model = detect::load_model(args.model.as_deref());
    if model.is_none() {
        stage("no model available; output will be empty");
    }

    let settings = PipelineSettings {
        conf_threshold: args.threshold,
        ..PipelineSettings::default()
    };
    let pipeline = ScanPipeline::new(model, settings)?;

    stage("scan image");
    let bytes =
        fs::read(&args.image).with_context(|| format!("reading {}", args.image.display()))?;
    let response = pipeline.detect(&bytes);

    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.items.is_empty() {
        stage("no items detected");
    }
    Ok(())
}

fn stage(msg: &str) {
    eprintln!("scan: {}", msg);
}

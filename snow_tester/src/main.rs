use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info, warn};
use serde::Serialize;
use snow_vision::core_modules::feature_extractor::FeatureExtractor;
use snow_vision::core_modules::utils::image_helper::image_helper::{save_png, snow_mask_from_bytes};
use snow_vision::{ClassificationResult, ClassifierConfig, ParallelPipeline, SnowPipeline, Snapshot};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// Classify bus-stop camera snapshots for snow that blocks boarding.
#[derive(Parser, Debug)]
#[command(name = "snow_tester", version)]
struct Args {
    /// Snapshot files (JPEG, PNG, ...)
    #[arg(required_unless_present = "print_config")]
    images: Vec<PathBuf>,

    /// TOML file overriding classifier thresholds
    #[arg(long)]
    config: Option<PathBuf>,

    /// Display name used in log lines (defaults to the file stem)
    #[arg(long)]
    name: Option<String>,

    /// Directory to write a snow mask PNG per snapshot
    #[arg(long)]
    mask_dir: Option<PathBuf>,

    /// Number of classification workers (defaults to the CPU count)
    #[arg(long)]
    workers: Option<usize>,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    name: &'a str,
    path: String,
    result: &'a ClassificationResult,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Logging & Argument Parsing ---
    tracing_subscriber::fmt()
        .with_max_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse::<LevelFilter>().ok())
                .unwrap_or(LevelFilter::INFO),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // --- 2. Classifier Initialization ---
    let config = match &args.config {
        Some(path) => ClassifierConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => ClassifierConfig::default(),
    };

    if args.print_config {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let pipeline = SnowPipeline::new(config)?;
    let pipeline = match args.workers {
        Some(workers) => ParallelPipeline::with_workers(pipeline, workers),
        None => ParallelPipeline::new(pipeline),
    };
    info!("snow classifier ready with {} workers", pipeline.workers());

    // --- 3. Snapshot Loading ---
    let mut loaded = Vec::with_capacity(args.images.len());
    for path in &args.images {
        match std::fs::read(path) {
            Ok(bytes) => {
                let name = display_name(args.name.as_deref(), path, args.images.len(), loaded.len());
                loaded.push((path.clone(), Snapshot::new(name, bytes)));
            }
            Err(err) => error!("skipping {}: {err}", path.display()),
        }
    }

    // --- 4. Classification ---
    let snapshots = loaded.iter().map(|(_, snapshot)| snapshot.clone()).collect();
    let results = pipeline.classify_batch(snapshots).await;

    // --- 5. Reporting ---
    let mut reports = Vec::with_capacity(results.len());
    for ((path, snapshot), result) in loaded.iter().zip(&results) {
        match result {
            Ok(result) => {
                info!(
                    "[pixel] {}: {} ({:.0}%) - {}",
                    snapshot.name,
                    result.status,
                    result.confidence * 100.0,
                    result.reason
                );
                reports.push(Report {
                    name: &snapshot.name,
                    path: path.display().to_string(),
                    result,
                });
            }
            Err(err) => error!("[pixel] {}: {err}", snapshot.name),
        }
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&reports)?
    } else {
        serde_json::to_string(&reports)?
    };
    println!("{json}");

    // --- 6. Snow Masks ---
    if let Some(dir) = args.mask_dir.clone() {
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let extractor = pipeline.pipeline().extractor().clone();
        let written = tokio::task::spawn_blocking(move || write_masks(&dir, &loaded, &extractor)).await?;
        info!("wrote {written} snow masks");
    }

    pipeline.shutdown().await;
    Ok(())
}

fn display_name(name: Option<&str>, path: &Path, total: usize, index: usize) -> String {
    match name {
        Some(name) if total == 1 => name.to_string(),
        Some(name) => format!("{name} #{}", index + 1),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
    }
}

/// Renders and saves `{stem}_mask.png` for each snapshot; returns how many were written.
fn write_masks(dir: &Path, loaded: &[(PathBuf, Snapshot)], extractor: &FeatureExtractor) -> usize {
    let mut written = 0;
    for (path, snapshot) in loaded {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "snapshot".to_string());
        let target = dir.join(format!("{stem}_mask.png"));

        match snow_mask_from_bytes(&snapshot.bytes, extractor) {
            Ok(mask) => match save_png(&target, &mask) {
                Ok(()) => {
                    debug!("wrote snow mask {}", target.display());
                    written += 1;
                }
                Err(err) => warn!("could not write {}: {err}", target.display()),
            },
            Err(err) => warn!("no snow mask for {}: {err}", snapshot.name),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use snow_vision::core_modules::pixel::pixel::Pixel;
    use snow_vision::core_modules::pixel_grid::PixelGrid;
    use snow_vision::core_modules::utils::image_helper::image_helper::encode_png;

    #[test]
    fn masks_are_written_per_decodable_snapshot() {
        let dir = std::env::temp_dir().join(format!("snow_tester_masks_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let grid = PixelGrid::from_fn(8, 5, |_, _| Pixel::gray(220)).unwrap();
        let bytes = encode_png(&grid.to_rgb_image()).unwrap();
        let loaded = vec![
            (PathBuf::from("cams/stop_12.jpg"), Snapshot::new("stop 12", bytes)),
            (PathBuf::from("cams/broken.jpg"), Snapshot::new("broken", b"nope".to_vec())),
        ];

        let written = write_masks(&dir, &loaded, &FeatureExtractor::default());
        let mask = std::fs::read(dir.join("stop_12_mask.png")).map(|bytes| PixelGrid::decode(&bytes));
        let broken_exists = dir.join("broken_mask.png").exists();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(written, 1);
        let mask = mask.unwrap().unwrap();
        assert_eq!((mask.width(), mask.height()), (8, 5));
        assert!(!broken_exists);
    }

    #[test]
    fn display_names_number_repeated_labels() {
        let path = Path::new("cams/stop_12.jpg");
        assert_eq!(display_name(None, path, 1, 0), "stop_12");
        assert_eq!(display_name(Some("Main St"), path, 1, 0), "Main St");
        assert_eq!(display_name(Some("Main St"), path, 3, 1), "Main St #2");
    }
}

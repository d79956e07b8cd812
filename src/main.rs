use std::env;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facelens::boxes::BoxFileDetector;
use facelens::overlay::{self, OverlaySurface};
use facelens::{config, orientation, stream};
use facelens::{FaceDetector, Image, Insets, OverlayCoordinator, OverlayMode, Size};
use facelens_vision::{Camera, Orientation, YunetDetector};
use image::{DynamicImage, ImageDecoder, ImageReader};
use log::{debug, info, warn};

const NO_FACES: &str = "No face found in this image.";

#[derive(Parser)]
#[command(name = "facelens")]
#[command(
    version,
    about = "Face overlays and padded face crops for photos and live camera"
)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect faces in a photo and print their on-screen overlay boxes
    Detect {
        image: PathBuf,
        /// View size the photo is aspect-fit into, as WIDTHxHEIGHT
        #[arg(long, value_parser = parse_size)]
        viewport: Option<Size>,
        /// Use face boxes from a JSON file instead of running the detector
        #[arg(long)]
        boxes: Option<PathBuf>,
        /// Print boxes as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a padded crop of every face in a photo
    Crop {
        image: PathBuf,
        /// Output directory
        #[arg(short, long)]
        out: PathBuf,
        /// Padding on every edge, in display points
        #[arg(long)]
        padding: Option<f64>,
        /// Use face boxes from a JSON file instead of running the detector
        #[arg(long)]
        boxes: Option<PathBuf>,
    },
    /// Track faces on the live camera
    Stream {
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Detect {
            image,
            viewport,
            boxes,
            json,
        } => detect(&cfg, &image, viewport, boxes.as_deref(), json),
        Commands::Crop {
            image,
            out,
            padding,
            boxes,
        } => crop(&cfg, &image, &out, padding, boxes.as_deref()),
        Commands::Stream { frames } => run_stream(&cfg, frames),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn parse_size(raw: &str) -> Result<Size, String> {
    let (w, h) = raw
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", raw))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("{:?}: {}", v, e))
    };
    Ok(Size::new(parse(w)?, parse(h)?))
}

/// Decodes a photo together with its EXIF orientation.
fn load_image(path: &Path) -> Result<Image> {
    let mut decoder = ImageReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?
        .with_guessed_format()?
        .into_decoder()
        .with_context(|| format!("decoding {}", path.display()))?;
    let orientation = decoder
        .orientation()
        .map(Orientation::from)
        .unwrap_or_default();
    let pixels = DynamicImage::from_decoder(decoder)
        .with_context(|| format!("decoding {}", path.display()))?;
    debug!(
        "{}: {}x{} {:?}",
        path.display(),
        pixels.width(),
        pixels.height(),
        orientation
    );
    Ok(Image::new(pixels, orientation))
}

fn detector_for(cfg: &config::Config, boxes: Option<&Path>) -> Result<Box<dyn FaceDetector>> {
    Ok(match boxes {
        Some(path) => Box::new(BoxFileDetector::from_path(path)?),
        None => Box::new(
            YunetDetector::from_file(&cfg.detector_model, cfg.score_threshold, cfg.nms_threshold)
                .context("Failed to initialize face detector")?,
        ),
    })
}

fn detect(
    cfg: &config::Config,
    path: &Path,
    viewport: Option<Size>,
    boxes: Option<&Path>,
    json: bool,
) -> Result<()> {
    let image = load_image(path)?;
    let upright = orientation::normalize(&image);

    let mut detector = detector_for(cfg, boxes)?;
    let faces = detector
        .detect(&upright.pixels)
        .context("detecting faces")?;
    if faces.is_empty() {
        warn!("{}", NO_FACES);
    }

    let coordinator = OverlayCoordinator::new(cfg.padding, cfg.display);
    let mode = OverlayMode::Still {
        image: upright.size(),
        viewport: viewport.unwrap_or(cfg.display),
    };
    let rects = coordinator.overlay_rects(&faces, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rects)?);
    } else {
        for (idx, r) in rects.iter().enumerate() {
            println!(
                "face {}: x={:.1} y={:.1} w={:.1} h={:.1}",
                idx, r.x, r.y, r.width, r.height
            );
        }
    }
    Ok(())
}

fn crop(
    cfg: &config::Config,
    path: &Path,
    out: &Path,
    padding: Option<f64>,
    boxes: Option<&Path>,
) -> Result<()> {
    let image = load_image(path)?;
    let upright = orientation::normalize(&image);

    let mut detector = detector_for(cfg, boxes)?;
    let faces = detector
        .detect(&upright.pixels)
        .context("detecting faces")?;
    if faces.is_empty() {
        anyhow::bail!(NO_FACES);
    }

    let padding = padding.map(Insets::uniform).unwrap_or(cfg.padding);
    let coordinator = OverlayCoordinator::new(padding, cfg.display);
    let crops = coordinator.crop_faces(&faces, &image)?;
    if crops.len() < faces.len() {
        warn!(
            "{} of {} face(s) could not be cropped",
            faces.len() - crops.len(),
            faces.len()
        );
    }

    std::fs::create_dir_all(out).with_context(|| format!("creating {}", out.display()))?;
    for (idx, face) in crops.iter().enumerate() {
        let dest = out.join(format!("face_{}.png", idx));
        face.pixels
            .save(&dest)
            .with_context(|| format!("writing {}", dest.display()))?;
        info!("✓ {}", dest.display());
    }
    Ok(())
}

fn run_stream(cfg: &config::Config, frames: Option<u64>) -> Result<()> {
    let preview = cfg.preview_rect();
    info!("Opening camera: {}", cfg.camera);

    let camera = cfg.camera.clone();
    let model = cfg.detector_model.clone();
    let (score, nms) = (cfg.score_threshold, cfg.nms_threshold);

    let (tx, rx) = mpsc::sync_channel(0);
    let worker = stream::spawn_stream_worker(
        move || Camera::open(&camera),
        move || YunetDetector::from_file(&model, score, nms),
        preview,
        tx,
        frames,
    )?;

    // This thread owns the overlays from here on.
    let mut surface = OverlaySurface::new();
    surface.push_layer("preview", preview);
    let applied = overlay::run_reconciler(rx, &mut surface, |update, diff, _| {
        if diff.added > 0 || diff.removed > 0 {
            info!("frame {}: {} face(s)", update.sequence, diff.added);
        }
        for r in &update.rects {
            debug!(
                "  x={:.1} y={:.1} w={:.1} h={:.1}",
                r.x, r.y, r.width, r.height
            );
        }
    });

    let handed_off = worker
        .join()
        .map_err(|_| anyhow::anyhow!("face detection thread panicked"))??;
    info!(
        "Stream finished: {} update(s) computed, {} applied",
        handed_off, applied
    );
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path))?;
    }
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}

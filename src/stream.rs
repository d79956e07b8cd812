//! Live camera path: detect and map on a background thread, hand each
//! frame's overlay rects to the UI thread.
//!
//! The handoff goes through a rendezvous channel (`sync_channel(0)`), so a
//! frame's update is only considered delivered once the UI side has taken
//! it. Nothing is buffered between the two: the worker reads the next frame
//! only after the previous update was received.

use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use facelens_vision::{
    FaceDetector, FrameSource, Insets, OverlayCoordinator, OverlayMode, Rect,
};
use image::DynamicImage;
use log::{debug, warn};

use crate::overlay::OverlayUpdate;

/// Runs frames through detection and mapping until the source ends,
/// `max_frames` frames were read, or the receiver hangs up.
/// Returns the number of updates handed off.
pub fn run_stream<S, D>(
    source: &mut S,
    detector: &mut D,
    preview: Rect,
    tx: &SyncSender<OverlayUpdate>,
    max_frames: Option<u64>,
) -> Result<u64>
where
    S: FrameSource + ?Sized,
    D: FaceDetector + ?Sized,
{
    // Padding only matters for crops, which the live path never produces.
    let coordinator = OverlayCoordinator::new(Insets::default(), preview.size());
    let mut read = 0u64;
    let mut handed_off = 0u64;

    while max_frames.map_or(true, |max| read < max) {
        let Some(frame) = source.next_frame().context("reading frame")? else {
            debug!("frame source ended");
            break;
        };
        read += 1;

        let sequence = frame.sequence as u64;
        let mode = OverlayMode::Live {
            frame: frame.size(),
            preview,
        };
        let image = DynamicImage::ImageRgb8(frame.image);

        let faces = detector.detect(&image).unwrap_or_else(|e| {
            warn!("frame {}: face detection failed: {}", sequence, e);
            Vec::new()
        });

        let rects = match coordinator.overlay_rects(&faces, mode) {
            Ok(rects) => rects,
            Err(e) => {
                warn!("frame {}: skipped: {}", sequence, e);
                continue;
            }
        };
        if rects.is_empty() {
            debug!("frame {}: no faces", sequence);
        }

        if tx.send(OverlayUpdate { sequence, rects }).is_err() {
            debug!("overlay receiver dropped, stopping stream");
            break;
        }
        handed_off += 1;
    }

    Ok(handed_off)
}

/// Builds the source and detector on a dedicated thread and streams from
/// there. Neither needs to be `Send`; only their constructors cross over.
pub fn spawn_stream_worker<S, D, OS, OD>(
    open_source: OS,
    open_detector: OD,
    preview: Rect,
    tx: SyncSender<OverlayUpdate>,
    max_frames: Option<u64>,
) -> Result<JoinHandle<Result<u64>>>
where
    S: FrameSource + 'static,
    D: FaceDetector + 'static,
    OS: FnOnce() -> Result<S> + Send + 'static,
    OD: FnOnce() -> Result<D> + Send + 'static,
{
    thread::Builder::new()
        .name("face-detection".to_string())
        .spawn(move || {
            let mut source = open_source().context("opening frame source")?;
            let mut detector = open_detector().context("initializing face detector")?;
            run_stream(&mut source, &mut detector, preview, &tx, max_frames)
        })
        .context("spawning face detection thread")
}

//! UI-owned overlay state.
//!
//! The geometry engine only produces rectangles. This module owns the drawn
//! layers and is the single writer for them: compute contexts send
//! [`OverlayUpdate`]s over a channel and one consumer applies them in order.

use std::sync::mpsc::Receiver;

use facelens_vision::Rect;

/// Name prefix marking layers that belong to the current detection pass.
pub const DETECTION_TAG: &str = "detect_layer";

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    pub name: String,
    pub frame: Rect,
}

impl OverlayLayer {
    pub fn is_detection(&self) -> bool {
        self.name.starts_with(DETECTION_TAG)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OverlayDiff {
    pub removed: usize,
    pub added: usize,
}

/// One frame's worth of overlay rectangles.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayUpdate {
    pub sequence: u64,
    pub rects: Vec<Rect>,
}

#[derive(Debug, Default)]
pub struct OverlaySurface {
    layers: Vec<OverlayLayer>,
}

impl OverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer the reconciler will never touch, unless its name carries
    /// the detection tag.
    pub fn push_layer(&mut self, name: impl Into<String>, frame: Rect) {
        self.layers.push(OverlayLayer {
            name: name.into(),
            frame,
        });
    }

    pub fn layers(&self) -> &[OverlayLayer] {
        &self.layers
    }

    pub fn detection_layers(&self) -> impl Iterator<Item = &OverlayLayer> {
        self.layers.iter().filter(|l| l.is_detection())
    }

    /// Replaces every detection layer with one per rect, in order.
    pub fn reconcile(&mut self, rects: &[Rect]) -> OverlayDiff {
        let before = self.layers.len();
        self.layers.retain(|l| !l.is_detection());
        let removed = before - self.layers.len();

        self.layers
            .extend(rects.iter().enumerate().map(|(idx, rect)| OverlayLayer {
                name: format!("{}_{}", DETECTION_TAG, idx),
                frame: *rect,
            }));

        OverlayDiff {
            removed,
            added: rects.len(),
        }
    }
}

/// Applies updates until every sender is gone. Returns how many were applied.
pub fn run_reconciler<F>(
    rx: Receiver<OverlayUpdate>,
    surface: &mut OverlaySurface,
    mut on_update: F,
) -> usize
where
    F: FnMut(&OverlayUpdate, OverlayDiff, &OverlaySurface),
{
    let mut applied = 0;
    for update in rx {
        let diff = surface.reconcile(&update.rects);
        log::debug!(
            "frame {}: -{} +{} overlay(s)",
            update.sequence,
            diff.removed,
            diff.added
        );
        on_update(&update, diff, surface);
        applied += 1;
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn rects(n: usize) -> Vec<Rect> {
        (0..n)
            .map(|i| Rect::new(i as f64 * 10.0, 0.0, 5.0, 5.0))
            .collect()
    }

    #[test]
    fn overlays_never_accumulate() {
        let mut surface = OverlaySurface::new();
        for n in [3, 1, 4, 0, 2] {
            surface.reconcile(&rects(n));
            assert_eq!(surface.detection_layers().count(), n);
        }
    }

    #[test]
    fn foreign_layers_survive() {
        let mut surface = OverlaySurface::new();
        surface.push_layer("preview", Rect::new(0.0, 0.0, 390.0, 844.0));
        surface.reconcile(&rects(2));
        let diff = surface.reconcile(&[]);
        assert_eq!(diff, OverlayDiff { removed: 2, added: 0 });
        assert_eq!(surface.layers().len(), 1);
        assert_eq!(surface.layers()[0].name, "preview");
    }

    #[test]
    fn names_follow_detection_order() {
        let mut surface = OverlaySurface::new();
        surface.reconcile(&rects(3));
        let names: Vec<_> = surface.detection_layers().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["detect_layer_0", "detect_layer_1", "detect_layer_2"]);
        assert_eq!(surface.layers()[2].frame.x, 20.0);
    }

    #[test]
    fn reconciler_applies_in_arrival_order() {
        let (tx, rx) = mpsc::channel();
        for (seq, n) in [(1, 2), (2, 0), (3, 1)] {
            tx.send(OverlayUpdate {
                sequence: seq,
                rects: rects(n),
            })
            .unwrap();
        }
        drop(tx);

        let mut surface = OverlaySurface::new();
        let mut seen = Vec::new();
        let applied = run_reconciler(rx, &mut surface, |u, _, s| {
            seen.push((u.sequence, s.detection_layers().count()))
        });
        assert_eq!(applied, 3);
        assert_eq!(seen, vec![(1, 2), (2, 0), (3, 1)]);
        assert_eq!(surface.detection_layers().count(), 1);
    }
}

//! Per-frame input types.
//!
//! A tracking backend (camera model, depth plugin, simulator) fills one
//! [`LandmarkFrame`] per callback.  Everything downstream only ever sees this
//! normalized shape, so the interpreter never branches on where the data came
//! from.

use std::time::Duration;

// ════════════════════════════════════════════════════════════════════════════
// Timestamp
// ════════════════════════════════════════════════════════════════════════════

/// Monotonic wall-clock sample in seconds, taken by the caller at update time.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0.0);

    pub fn from_secs(secs: f64) -> Self { Timestamp(secs) }

    pub fn secs(self) -> f64 { self.0 }

    /// Seconds elapsed since `earlier`; negative if `earlier` is in the future.
    pub fn since(self, earlier: Timestamp) -> f64 { self.0 - earlier.0 }

    /// Shift forward by `secs`.
    pub fn after(self, secs: f64) -> Self { Timestamp(self.0 + secs) }
}

impl From<Duration> for Timestamp {
    fn from(d: Duration) -> Self { Timestamp(d.as_secs_f64()) }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// A point in normalized image coordinates (0..1 on both axes, y down).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self { Point2 { x, y } }

    /// Distance in pixels, given the frame dimensions the coordinates were
    /// normalized against.
    pub fn pixel_distance(self, other: Point2, width_px: f64, height_px: f64) -> f64 {
        let dx = (self.x - other.x) * width_px;
        let dy = (self.y - other.y) * height_px;
        (dx * dx + dy * dy).sqrt()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandObservation
// ════════════════════════════════════════════════════════════════════════════

/// Handedness label reported by the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
}

impl Handedness {
    pub fn flipped(self) -> Self {
        match self {
            Handedness::Left  => Handedness::Right,
            Handedness::Right => Handedness::Left,
        }
    }
}

/// One detected hand, already reduced to the handful of points the
/// interpreter consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandObservation {
    /// `None` when the tracker could not classify the hand.
    pub handedness:  Option<Handedness>,
    /// Palm reference point (drives X/Y control).
    pub palm:        Point2,
    /// Scale reference paired with `palm`; the wrist–palm span normalizes the
    /// pinch ratio and feeds depth triangulation.
    pub wrist:       Option<Point2>,
    pub thumb_tip:   Option<Point2>,
    pub index_tip:   Option<Point2>,
    /// Palm-facing score, 0 (edge-on) .. 1 (facing the camera).
    pub palm_facing: Option<f64>,
    /// Direct depth in meters from a depth-capable backend.
    pub depth_m:     Option<f64>,
}

impl HandObservation {
    /// A hand with only a palm point; builder-style setters fill the rest.
    pub fn at(x: f64, y: f64) -> Self {
        HandObservation { palm: Point2::new(x, y), ..Default::default() }
    }

    pub fn with_handedness(mut self, h: Handedness) -> Self {
        self.handedness = Some(h);
        self
    }

    pub fn with_depth(mut self, meters: f64) -> Self {
        self.depth_m = Some(meters);
        self
    }

    pub fn with_palm_facing(mut self, facing: f64) -> Self {
        self.palm_facing = Some(facing);
        self
    }

    pub fn with_wrist(mut self, wrist: Point2) -> Self {
        self.wrist = Some(wrist);
        self
    }

    pub fn with_pinch_points(mut self, thumb: Point2, index: Point2) -> Self {
        self.thumb_tip = Some(thumb);
        self.index_tip = Some(index);
        self
    }

    /// Wrist–palm span in pixels, or `None` when the wrist is missing.
    pub fn scale_px(&self, width_px: f64, height_px: f64) -> Option<f64> {
        self.wrist.map(|w| w.pixel_distance(self.palm, width_px, height_px))
    }

    /// Thumb–index separation divided by the wrist–palm span.
    ///
    /// ~1 for an open hand, → 0 as the fingertips meet.  `None` when a point
    /// is missing or the scale span is degenerate.
    pub fn pinch_ratio(&self, width_px: f64, height_px: f64) -> Option<f64> {
        let thumb = self.thumb_tip?;
        let index = self.index_tip?;
        let scale = self.scale_px(width_px, height_px)?;
        if scale < MIN_SPAN_PX {
            return None;
        }
        Some(thumb.pixel_distance(index, width_px, height_px) / scale)
    }
}

/// Spans shorter than this (pixels) are treated as degenerate geometry.
pub const MIN_SPAN_PX: f64 = 1e-3;

// ════════════════════════════════════════════════════════════════════════════
// LandmarkFrame
// ════════════════════════════════════════════════════════════════════════════

/// One observation cycle: 0–2 hands plus the image dimensions the
/// coordinates were normalized against.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkFrame {
    pub hands:     Vec<HandObservation>,
    pub width_px:  f64,
    pub height_px: f64,
}

impl LandmarkFrame {
    pub const DEFAULT_WIDTH_PX:  f64 = 640.0;
    pub const DEFAULT_HEIGHT_PX: f64 = 480.0;

    pub fn new(hands: Vec<HandObservation>) -> Self {
        LandmarkFrame {
            hands,
            width_px:  Self::DEFAULT_WIDTH_PX,
            height_px: Self::DEFAULT_HEIGHT_PX,
        }
    }

    /// The explicit "no hands" marker.
    pub fn empty() -> Self { Self::new(Vec::new()) }

    pub fn with_size(mut self, width_px: f64, height_px: f64) -> Self {
        self.width_px  = width_px;
        self.height_px = height_px;
        self
    }

    pub fn is_empty(&self) -> bool { self.hands.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_distance_respects_aspect() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(0.5, 0.5);
        // 320 px across, 240 px down
        assert!((a.pixel_distance(b, 640.0, 480.0) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn pinch_ratio_open_and_closed() {
        let hand = HandObservation::at(0.5, 0.5)
            .with_wrist(Point2::new(0.5, 0.7))
            .with_pinch_points(Point2::new(0.45, 0.4), Point2::new(0.55, 0.4));
        // span = 0.2 * 480 = 96 px, pinch = 0.1 * 640 = 64 px
        let r = hand.pinch_ratio(640.0, 480.0).unwrap();
        assert!((r - 64.0 / 96.0).abs() < 1e-9);

        let closed = hand.clone()
            .with_pinch_points(Point2::new(0.5, 0.4), Point2::new(0.5, 0.4));
        assert_eq!(closed.pinch_ratio(640.0, 480.0), Some(0.0));
    }

    #[test]
    fn pinch_ratio_needs_all_points() {
        let hand = HandObservation::at(0.5, 0.5)
            .with_pinch_points(Point2::new(0.4, 0.4), Point2::new(0.6, 0.4));
        assert_eq!(hand.pinch_ratio(640.0, 480.0), None);
    }

    #[test]
    fn pinch_ratio_degenerate_span() {
        let hand = HandObservation::at(0.5, 0.5)
            .with_wrist(Point2::new(0.5, 0.5))
            .with_pinch_points(Point2::new(0.4, 0.4), Point2::new(0.6, 0.4));
        assert_eq!(hand.pinch_ratio(640.0, 480.0), None);
    }

    #[test]
    fn timestamp_arithmetic() {
        let t = Timestamp::from_secs(1.5);
        assert_eq!(t.after(0.5).since(t), 0.5);
        assert_eq!(Timestamp::from(Duration::from_millis(250)).secs(), 0.25);
    }
}

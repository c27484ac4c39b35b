//! Adapter from a full 21-point hand skeleton to a [`HandObservation`].
//!
//! Point order follows the common 21-landmark hand model:
//!
//! ```text
//!  0 wrist
//!  1–4  thumb (CMC, MCP, IP, tip)
//!  5–8  index (MCP, PIP, DIP, tip)
//!  9–12 middle
//! 13–16 ring
//! 17–20 pinky
//! ```
//!
//! Coordinates are normalized to the image (x, y in 0..1, y down) with a
//! relative z in roughly the same scale as x.

use crate::frame::{HandObservation, Handedness, Point2};

pub const WRIST:      usize = 0;
pub const THUMB_TIP:  usize = 4;
pub const INDEX_MCP:  usize = 5;
pub const INDEX_TIP:  usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const PINKY_MCP:  usize = 17;
pub const LANDMARK_COUNT: usize = 21;

/// A 3-D landmark.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self { Point3 { x, y, z } }

    fn sub(self, o: Point3) -> Point3 { Point3::new(self.x - o.x, self.y - o.y, self.z - o.z) }

    fn cross(self, o: Point3) -> Point3 {
        Point3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    fn length(self) -> f64 { (self.x * self.x + self.y * self.y + self.z * self.z).sqrt() }

    fn flat(self) -> Point2 { Point2::new(self.x, self.y) }
}

/// One tracked hand as delivered by a landmark model.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    pub handedness: Option<Handedness>,
    pub points:     [Point3; LANDMARK_COUNT],
    /// Metric depth from a depth-capable backend, if any.
    pub depth_m:    Option<f64>,
}

impl HandLandmarks {
    pub fn new(handedness: Option<Handedness>, points: [Point3; LANDMARK_COUNT]) -> Self {
        HandLandmarks { handedness, points, depth_m: None }
    }

    /// Reduce to the observation the interpreter consumes.
    ///
    /// Landmark models label handedness as seen by a mirrored selfie camera;
    /// pass `mirrored = false` for an unmirrored feed to swap the labels.
    pub fn to_observation(&self, mirrored: bool) -> HandObservation {
        let p = &self.points;
        HandObservation {
            handedness:  self.handedness.map(|h| if mirrored { h } else { h.flipped() }),
            palm:        p[MIDDLE_MCP].flat(),
            wrist:       Some(p[WRIST].flat()),
            thumb_tip:   Some(p[THUMB_TIP].flat()),
            index_tip:   Some(p[INDEX_TIP].flat()),
            palm_facing: palm_facing(p[WRIST], p[INDEX_MCP], p[PINKY_MCP]),
            depth_m:     self.depth_m,
        }
    }
}

/// How squarely the palm faces the camera, 0..1.
///
/// The palm normal is the cross product of the wrist→index-MCP and
/// wrist→pinky-MCP edges; the score is the magnitude of its z component after
/// normalization.  A collapsed palm triangle gives no estimate.
pub fn palm_facing(wrist: Point3, index_mcp: Point3, pinky_mcp: Point3) -> Option<f64> {
    let normal = index_mcp.sub(wrist).cross(pinky_mcp.sub(wrist));
    let len = normal.length();
    if !len.is_finite() || len < 1e-9 {
        return None;
    }
    Some((normal.z / len).abs().clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_hand() -> [Point3; LANDMARK_COUNT] {
        let mut p = [Point3::default(); LANDMARK_COUNT];
        p[WRIST]      = Point3::new(0.50, 0.80, 0.0);
        p[THUMB_TIP]  = Point3::new(0.40, 0.55, 0.0);
        p[INDEX_MCP]  = Point3::new(0.45, 0.60, 0.0);
        p[INDEX_TIP]  = Point3::new(0.44, 0.45, 0.0);
        p[MIDDLE_MCP] = Point3::new(0.50, 0.60, 0.0);
        p[PINKY_MCP]  = Point3::new(0.58, 0.62, 0.0);
        p
    }

    #[test]
    fn flat_palm_faces_camera() {
        let p = flat_hand();
        let f = palm_facing(p[WRIST], p[INDEX_MCP], p[PINKY_MCP]).unwrap();
        assert!((f - 1.0).abs() < 1e-9);
    }

    #[test]
    fn edge_on_palm_scores_zero() {
        // Palm plane contains the camera axis (x = const).
        let f = palm_facing(
            Point3::new(0.5, 0.8, 0.0),
            Point3::new(0.5, 0.6, -0.1),
            Point3::new(0.5, 0.6, 0.1),
        ).unwrap();
        assert!(f.abs() < 1e-9);
    }

    #[test]
    fn collapsed_palm_has_no_estimate() {
        let w = Point3::new(0.5, 0.5, 0.0);
        assert_eq!(palm_facing(w, w, w), None);
    }

    #[test]
    fn observation_uses_key_points() {
        let lm = HandLandmarks::new(Some(Handedness::Left), flat_hand());
        let obs = lm.to_observation(true);
        assert_eq!(obs.handedness, Some(Handedness::Left));
        assert_eq!(obs.palm, Point2::new(0.50, 0.60));
        assert_eq!(obs.wrist, Some(Point2::new(0.50, 0.80)));
        assert!(obs.pinch_ratio(640.0, 480.0).is_some());
    }

    #[test]
    fn unmirrored_feed_swaps_labels() {
        let lm = HandLandmarks::new(Some(Handedness::Left), flat_hand());
        assert_eq!(lm.to_observation(false).handedness, Some(Handedness::Right));
    }
}

//! Hand tracking sources: LeapMotion hardware and mouse/keyboard simulation.
//!
//! The public interface is [`HandEvent`] delivered over an `mpsc` channel.
//! Consumers don't need to know whether frames came from real hardware or the
//! simulator.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Instant;

use gesture_core::landmarks::{INDEX_MCP, INDEX_TIP, LANDMARK_COUNT, MIDDLE_MCP, PINKY_MCP, THUMB_TIP, WRIST};
use gesture_core::{HandLandmarks, Handedness, LandmarkFrame, Point2, Point3};

// ════════════════════════════════════════════════════════════════════════════
// HandEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum HandEvent {
    /// One tracking frame, stamped when it was captured.
    Frame { frame: LandmarkFrame, captured: Instant },
    /// The source is gone for good.
    Closed,
}

// ════════════════════════════════════════════════════════════════════════════
// HandSource trait: unified interface for hw and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`HandEvent`]s over a channel.
pub trait HandSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<HandEvent>);
}

/// Spawn a hand source on its own thread and return the receiving end.
pub fn spawn_hand_source<H: HandSource>(source: H) -> Receiver<HandEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// Hand geometry helper
// ════════════════════════════════════════════════════════════════════════════

fn lerp(a: Point3, b: Point3, t: f64) -> Point3 {
    Point3::new(a.x + (b.x - a.x) * t, a.y + (b.y - a.y) * t, a.z + (b.z - a.z) * t)
}

/// Build a 21-point skeleton with the middle knuckle at `palm`, the wrist
/// `span` below it, and the thumb and index tips spread so the pinch ratio
/// (at the given frame size) comes out as `pinch_ratio`.
///
/// The knuckle line is tilted out of the image plane so the palm normal's
/// z component equals `facing`.
pub fn synthetic_hand(
    palm:        Point2,
    span:        f64,
    pinch_ratio: f64,
    facing:      f64,
    width_px:    f64,
    height_px:   f64,
) -> HandLandmarks {
    let span_px  = span * height_px;
    let half_gap = pinch_ratio.max(0.0) * span_px / width_px / 2.0;
    let tips_y   = palm.y - span * 0.8;

    let cos = facing.clamp(0.0, 1.0);
    let sin = (1.0 - cos * cos).sqrt();
    let knuckle = span * 0.4;

    let wrist  = Point3::new(palm.x, palm.y + span, 0.0);
    let middle = Point3::new(palm.x, palm.y, 0.0);
    let index  = Point3::new(palm.x - knuckle * cos, palm.y, -knuckle * sin);
    let pinky  = Point3::new(palm.x + knuckle * cos, palm.y, knuckle * sin);
    let ring   = lerp(middle, pinky, 0.5);
    let thumb_tip = Point3::new(palm.x - half_gap, tips_y, 0.0);
    let index_tip = Point3::new(palm.x + half_gap, tips_y, 0.0);

    let mut points = [Point3::default(); LANDMARK_COUNT];
    points[WRIST] = wrist;
    for (k, joint) in (1..=THUMB_TIP).enumerate() {
        points[joint] = lerp(wrist, thumb_tip, (k + 1) as f64 / 4.0);
    }
    points[THUMB_TIP] = thumb_tip;
    points[INDEX_MCP] = index;
    points[INDEX_MCP + 1] = lerp(index, index_tip, 1.0 / 3.0);
    points[INDEX_MCP + 2] = lerp(index, index_tip, 2.0 / 3.0);
    points[INDEX_TIP] = index_tip;
    // Middle, ring and pinky curl straight up the image.
    for (base, knuckle_at) in [(MIDDLE_MCP, middle), (MIDDLE_MCP + 4, ring), (PINKY_MCP, pinky)] {
        for k in 0..4 {
            points[base + k] = Point3::new(knuckle_at.x, knuckle_at.y - span * 0.2 * k as f64, knuckle_at.z);
        }
    }

    HandLandmarks::new(None, points)
}

// ════════════════════════════════════════════════════════════════════════════
// Simulation: mouse/keyboard state
// ════════════════════════════════════════════════════════════════════════════

/// Pinch ratios the simulator flips between.
pub const SIM_PINCH_OPEN:   f64 = 1.0;
pub const SIM_PINCH_CLOSED: f64 = 0.15;

/// Wrist–palm span of the simulated hands (normalized image units).
const SIM_SPAN: f64 = 0.12;

/// Everything the simulated hands look like at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct SimSample {
    /// Sound-hand palm, normalized window coordinates.
    pub palm:    (f64, f64),
    pub depth_m: f64,
    pub pinched: bool,
    pub filter:  Option<SimFilter>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SimFilter {
    /// 0 (bottom) .. 1 (top)
    pub height: f64,
    pub facing: f64,
    pub pinch:  f64,
}

/// Keyboard-adjustable state of the simulated hands.
#[derive(Clone, Debug, PartialEq)]
pub struct SimControls {
    pub depth_m:        f64,
    pub filter_visible: bool,
    pub filter_height:  f64,
    pub filter_facing:  f64,
    pub filter_pinch:   f64,
}

impl Default for SimControls {
    fn default() -> Self {
        SimControls {
            depth_m:        0.45,
            filter_visible: true,
            filter_height:  0.5,
            filter_facing:  0.5,
            filter_pinch:   0.6,
        }
    }
}

impl SimControls {
    pub const DEPTH_MIN: f64 = 0.10;
    pub const DEPTH_MAX: f64 = 0.80;

    /// Positive moves the hand toward the camera.
    pub fn push(&mut self, meters: f64) {
        self.depth_m = (self.depth_m - meters).clamp(Self::DEPTH_MIN, Self::DEPTH_MAX);
    }

    pub fn raise_filter(&mut self, delta: f64) {
        self.filter_height = (self.filter_height + delta).clamp(0.0, 1.0);
    }

    pub fn turn_filter(&mut self, delta: f64) {
        self.filter_facing = (self.filter_facing + delta).clamp(0.0, 1.0);
    }

    pub fn open_filter_pinch(&mut self, delta: f64) {
        self.filter_pinch = (self.filter_pinch + delta).clamp(0.0, 1.2);
    }

    pub fn toggle_filter(&mut self) { self.filter_visible = !self.filter_visible; }

    pub fn sample(&self, palm: (f64, f64), pinched: bool) -> SimSample {
        SimSample {
            palm,
            depth_m: self.depth_m,
            pinched,
            filter: self.filter_visible.then(|| SimFilter {
                height: self.filter_height,
                facing: self.filter_facing,
                pinch:  self.filter_pinch,
            }),
        }
    }
}

impl SimSample {
    /// Render as a tracking frame: right (sound) hand at the mouse, left
    /// (filter) hand parked at the left edge.
    pub fn to_frame(&self) -> LandmarkFrame {
        let (w, h) = (LandmarkFrame::DEFAULT_WIDTH_PX, LandmarkFrame::DEFAULT_HEIGHT_PX);
        let ratio = if self.pinched { SIM_PINCH_CLOSED } else { SIM_PINCH_OPEN };

        let mut hands = Vec::with_capacity(2);
        if let Some(f) = &self.filter {
            let palm = Point2::new(0.15, 1.0 - f.height);
            let mut left = synthetic_hand(palm, SIM_SPAN, f.pinch, f.facing, w, h);
            left.handedness = Some(Handedness::Left);
            hands.push(left.to_observation(true));
        }
        let palm = Point2::new(self.palm.0, self.palm.1);
        let mut right = synthetic_hand(palm, SIM_SPAN, ratio, 1.0, w, h);
        right.handedness = Some(Handedness::Right);
        right.depth_m    = Some(self.depth_m);
        hands.push(right.to_observation(true));
        LandmarkFrame::new(hands)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimHandSource: driven by window input
// ════════════════════════════════════════════════════════════════════════════

/// Raw input from the simulation window.
#[derive(Clone, Debug)]
pub enum SimInput {
    Sample { sample: SimSample, at: Instant },
    Quit,
}

/// Hand source driven by [`SimInput`] events from the visualizer's window.
pub struct SimHandSource {
    pub rx: Receiver<SimInput>,
}

impl HandSource for SimHandSource {
    fn run(self: Box<Self>, tx: Sender<HandEvent>) {
        for input in self.rx {
            let event = match input {
                SimInput::Sample { sample, at } => HandEvent::Frame { frame: sample.to_frame(), captured: at },
                SimInput::Quit => break,
            };
            if tx.send(event).is_err() {
                return;
            }
        }
        let _ = tx.send(HandEvent::Closed);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LeapHandSource: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Hand source backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// The controller looks up from below, so its vertical axis is the depth
/// axis here: palm height above the device (mm) becomes `depth_m`, and the
/// horizontal x/z plane becomes the image.  Frames are sized in millimetres
/// over the tracked volume so pixel distances are real distances.
#[cfg(feature = "leap")]
pub struct LeapHandSource;

#[cfg(feature = "leap")]
impl HandSource for LeapHandSource {
    fn run(self: Box<Self>, tx: Sender<HandEvent>) {
        use gesture_core::landmarks::palm_facing;
        use gesture_core::HandObservation;
        use leaprs::*;
        use tracing::{error, info};

        // Tracked volume, mm
        const X_SPAN: f32 = 400.0;
        const Z_SPAN: f32 = 300.0;

        let mut connection = match Connection::create(ConnectionConfig::default()) {
            Ok(c)  => c,
            Err(e) => {
                error!("LeapC connection failed: {:?}", e);
                let _ = tx.send(HandEvent::Closed);
                return;
            }
        };
        if let Err(e) = connection.open() {
            error!("LeapMotion device failed to open: {:?}", e);
            let _ = tx.send(HandEvent::Closed);
            return;
        }
        info!("LeapMotion connected");

        let plane = |x: f32, z: f32| {
            Point2::new(((x + X_SPAN / 2.0) / X_SPAN) as f64, ((z + Z_SPAN / 2.0) / Z_SPAN) as f64)
        };
        // Height above the device is the camera axis for palm-facing.
        let space = |x: f32, y: f32, z: f32| Point3::new(x as f64, z as f64, y as f64);

        loop {
            let msg = match connection.poll(100) {
                Ok(m)  => m,
                Err(_) => continue,
            };

            let Event::Tracking(frame) = msg.event() else { continue };
            let mut hands = Vec::with_capacity(2);

            for hand in frame.hands() {
                let fingers: Vec<_> = hand.digits().collect();
                if fingers.len() < 5 {
                    continue;
                }
                let palm = hand.palm().position();
                let wrist = fingers[2].metacarpal().prev_joint();
                let thumb = fingers[0].distal().next_joint();
                let index = fingers[1].distal().next_joint();
                let index_mcp = fingers[1].metacarpal().next_joint();
                let pinky_mcp = fingers[4].metacarpal().next_joint();

                let mut obs = HandObservation::at(plane(palm.x, palm.z).x, plane(palm.x, palm.z).y)
                    .with_wrist(plane(wrist.x, wrist.z))
                    .with_pinch_points(plane(thumb.x, thumb.z), plane(index.x, index.z))
                    .with_depth((palm.y / 1000.0) as f64)
                    .with_handedness(if hand.hand_type() == HandType::Left {
                        Handedness::Left
                    } else {
                        Handedness::Right
                    });
                obs.palm_facing = palm_facing(
                    space(wrist.x, wrist.y, wrist.z),
                    space(index_mcp.x, index_mcp.y, index_mcp.z),
                    space(pinky_mcp.x, pinky_mcp.y, pinky_mcp.z),
                );
                hands.push(obs);
            }

            let frame = LandmarkFrame::new(hands).with_size(X_SPAN as f64, Z_SPAN as f64);
            if tx.send(HandEvent::Frame { frame, captured: Instant::now() }).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_hand_has_requested_pinch() {
        let hand = synthetic_hand(Point2::new(0.5, 0.5), 0.12, 0.4, 1.0, 640.0, 480.0).to_observation(true);
        let ratio = hand.pinch_ratio(640.0, 480.0).unwrap();
        assert!((ratio - 0.4).abs() < 1e-9);
        assert_eq!(hand.palm, Point2::new(0.5, 0.5));
    }

    #[test]
    fn synthetic_hand_has_requested_facing() {
        for facing in [0.0, 0.3, 0.8, 1.0] {
            let hand = synthetic_hand(Point2::new(0.4, 0.6), 0.12, 0.5, facing, 640.0, 480.0);
            let got = hand.to_observation(true).palm_facing.unwrap();
            assert!((got - facing).abs() < 1e-9, "facing={facing} got={got}");
        }
    }

    #[test]
    fn filter_facing_reaches_the_frame() {
        let mut c = SimControls::default();
        c.turn_filter(0.2);
        let frame = c.sample((0.5, 0.5), false).to_frame();
        let facing = frame.hands[0].palm_facing.unwrap();
        assert!((facing - 0.7).abs() < 1e-9);
    }

    #[test]
    fn depth_is_clamped() {
        let mut c = SimControls::default();
        c.push(10.0);
        assert_eq!(c.depth_m, SimControls::DEPTH_MIN);
        c.push(-10.0);
        assert_eq!(c.depth_m, SimControls::DEPTH_MAX);
    }

    #[test]
    fn sample_frame_has_two_labeled_hands() {
        let frame = SimControls::default().sample((0.7, 0.4), false).to_frame();
        assert_eq!(frame.hands.len(), 2);
        assert_eq!(frame.hands[0].handedness, Some(Handedness::Left));
        assert_eq!(frame.hands[1].handedness, Some(Handedness::Right));
        assert_eq!(frame.hands[1].palm, Point2::new(0.7, 0.4));
        assert_eq!(frame.hands[1].depth_m, Some(0.45));
    }

    #[test]
    fn hidden_filter_hand_is_omitted() {
        let mut c = SimControls::default();
        c.toggle_filter();
        let frame = c.sample((0.5, 0.5), true).to_frame();
        assert_eq!(frame.hands.len(), 1);
        let ratio = frame.hands[0].pinch_ratio(frame.width_px, frame.height_px).unwrap();
        assert!((ratio - SIM_PINCH_CLOSED).abs() < 1e-9);
    }

    #[test]
    fn filter_height_maps_to_image_y() {
        let mut c = SimControls::default();
        c.raise_filter(0.3);
        let frame = c.sample((0.5, 0.5), false).to_frame();
        assert!((frame.hands[0].palm.y - 0.2).abs() < 1e-9);
    }

    #[test]
    fn sim_source_forwards_then_closes() {
        let (tx, rx) = mpsc::channel();
        let events = spawn_hand_source(SimHandSource { rx });
        let at = Instant::now();
        tx.send(SimInput::Sample { sample: SimControls::default().sample((0.5, 0.5), false), at }).unwrap();
        tx.send(SimInput::Quit).unwrap();

        assert!(matches!(events.recv().unwrap(), HandEvent::Frame { captured, .. } if captured == at));
        assert_eq!(events.recv().unwrap(), HandEvent::Closed);
    }
}

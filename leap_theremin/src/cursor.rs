//! Cursor and ripple state behind the on-screen view.
//!
//! The interpreter only says "cursor here", "hide it" and "pulse here"; this
//! layer turns those into something that animates between frames.

use gesture_core::CursorView;

/// Seconds a ripple stays on screen.
pub const RIPPLE_LIFETIME: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CursorMark {
    /// Normalized screen coordinates (y down).
    pub x:        f32,
    pub y:        f32,
    pub hovering: bool,
}

/// An expanding ring left behind by a pulse.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ripple {
    pub x:   f32,
    pub y:   f32,
    /// Seconds since the pulse.
    pub age: f32,
}

impl Ripple {
    /// 0 → 1 over the ripple's life.
    pub fn progress(&self) -> f32 { (self.age / RIPPLE_LIFETIME).clamp(0.0, 1.0) }

    pub fn done(&self) -> bool { self.age >= RIPPLE_LIFETIME }
}

#[derive(Clone, Debug, Default)]
pub struct CursorLayer {
    pub cursor:  Option<CursorMark>,
    pub ripples: Vec<Ripple>,
}

impl CursorLayer {
    /// Age ripples by `dt` seconds and drop the finished ones.
    pub fn tick(&mut self, dt: f32) {
        for r in &mut self.ripples {
            r.age += dt;
        }
        self.ripples.retain(|r| !r.done());
    }
}

impl CursorView for CursorLayer {
    fn show_cursor(&mut self, x: f64, y: f64, hovering: bool) {
        self.cursor = Some(CursorMark { x: x as f32, y: y as f32, hovering });
    }

    fn hide_cursor(&mut self) { self.cursor = None; }

    fn pulse(&mut self, x: f64, y: f64) {
        self.ripples.push(Ripple { x: x as f32, y: y as f32, age: 0.0 });
    }
}

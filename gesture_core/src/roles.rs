//! Filter / sound role assignment for the 0–2 hands of a frame.
//!
//! Labels decide first: left → filter, right → sound.  Unlabeled hands fill
//! whatever is left, and with no labels at all a single hand is the sound
//! hand while two hands are ordered left-to-right on screen.

use tracing::debug;

use crate::frame::{HandObservation, Handedness, Point2};

/// Indices into the frame's hand list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleAssignment {
    pub filter: Option<usize>,
    pub sound:  Option<usize>,
}

impl RoleAssignment {
    fn swapped(self) -> Self {
        RoleAssignment { filter: self.sound, sound: self.filter }
    }
}

/// Stateless assignment.  Only the first two hands are considered.
pub fn assign_roles(hands: &[HandObservation]) -> RoleAssignment {
    let hands = &hands[..hands.len().min(2)];
    let mut roles = RoleAssignment::default();
    let mut unassigned: Vec<usize> = Vec::with_capacity(2);

    for (i, hand) in hands.iter().enumerate() {
        match hand.handedness {
            Some(Handedness::Left)  if roles.filter.is_none() => roles.filter = Some(i),
            Some(Handedness::Right) if roles.sound.is_none()  => roles.sound  = Some(i),
            _ => unassigned.push(i),
        }
    }

    match (roles.filter, roles.sound, unassigned.as_slice()) {
        (None, None, [only]) => roles.sound = Some(*only),
        (None, None, [a, b]) => {
            // Stable on ties: the first-listed hand counts as leftmost.
            let (left, right) = if hands[*b].palm.x < hands[*a].palm.x { (*b, *a) } else { (*a, *b) };
            roles.filter = Some(left);
            roles.sound  = Some(right);
        }
        (None, Some(_), [rest, ..]) => roles.filter = Some(*rest),
        (Some(_), None, [rest, ..]) => roles.sound  = Some(*rest),
        _ => {}
    }
    roles
}

/// Role assignment with optional one-frame stickiness.
///
/// With stickiness on, a fresh assignment that swaps both hands relative to
/// last frame's palm positions is held back for one frame.  A swap that is
/// still there on the next frame goes through.
#[derive(Clone, Debug, Default)]
pub struct RoleAssigner {
    sticky:       bool,
    last_filter:  Option<Point2>,
    last_sound:   Option<Point2>,
    pending_swap: bool,
}

impl RoleAssigner {
    pub fn new(sticky: bool) -> Self {
        RoleAssigner { sticky, ..Default::default() }
    }

    pub fn assign(&mut self, hands: &[HandObservation]) -> RoleAssignment {
        let fresh = assign_roles(hands);
        let roles = if self.sticky { self.stabilize(hands, fresh) } else { fresh };

        self.last_filter = roles.filter.map(|i| hands[i].palm);
        self.last_sound  = roles.sound.map(|i| hands[i].palm);
        roles
    }

    fn stabilize(&mut self, hands: &[HandObservation], fresh: RoleAssignment) -> RoleAssignment {
        let (Some(f), Some(s), Some(last_f), Some(last_s)) =
            (fresh.filter, fresh.sound, self.last_filter, self.last_sound)
        else {
            self.pending_swap = false;
            return fresh;
        };

        let keep  = dist(hands[f].palm, last_f) + dist(hands[s].palm, last_s);
        let cross = dist(hands[f].palm, last_s) + dist(hands[s].palm, last_f);

        if cross < keep && !self.pending_swap {
            debug!("role swap held for one frame");
            self.pending_swap = true;
            fresh.swapped()
        } else {
            self.pending_swap = false;
            fresh
        }
    }

    pub fn reset(&mut self) {
        *self = RoleAssigner::new(self.sticky);
    }
}

fn dist(a: Point2, b: Point2) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

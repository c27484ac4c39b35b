//! # leap_theremin
//!
//! Two-hand gesture instrument: tracked hands drive a [`GestureInterpreter`]
//! whose output plays a General MIDI synth and animates a cursor view.
//!
//! ## Gesture → sound mapping
//!
//! | Gesture | Hand | Result |
//! |---|---|---|
//! | Push into the near (pad) zone | Right | Sustained note; approach speed sets the attack |
//! | Move within the pad | Right | X → pitch bend, Y → expression |
//! | Pull back out of the pad | Right | Note off; retreat speed sets the release |
//! | Quick pinch in the hover zone | Right | Plucked note; pinch speed sets the attack |
//! | Raise / lower | Left | Filter resonance |
//! | Turn palm toward the sensor | Left | Filter cutoff |
//! | Open thumb and index | Left | Reverb send |
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the mouse is the right hand, keys shape
//!   the left.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Effect |
//! |---|---|
//! | Mouse | Right palm position |
//! | Left button | Pinch |
//! | `W` / `S`, scroll | Move the right hand nearer / farther |
//! | `Up` / `Down` | Raise / lower the left hand |
//! | `Left` / `Right` | Turn the left palm |
//! | `R` / `F` | Open / close the left pinch |
//! | `H` | Show / hide the left hand |
//! | `P` | Next patch |
//! | `Q`, `Escape` | Quit |
//!
//! [`GestureInterpreter`]: gesture_core::GestureInterpreter

pub mod app;
pub mod cursor;
pub mod error;
pub mod midi_out;
pub mod source;
pub mod visualizer;

pub use error::AppError;

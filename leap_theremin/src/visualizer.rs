//! Software-rendered view and simulation input using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌──────────────────────────────────────────────┬────────────┐
//! │                                              │  DEPTH     │
//! │   control surface                            │  ┃ none    │
//! │     ○  hover cursor (outline)                │  ┃ pointer │
//! │     ●  voice cursor (filled)                 │  ┃ pad     │
//! │     ◎  ripples at each onset                 │            │
//! │                                              │  RES CUT WET│
//! │                                              │  ▮   ▮   ▮  │
//! ├──────────────────────────────────────────────┴────────────┤
//! │  status line / key legend                                 │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The mouse is the sound hand.  The window also owns the simulated hands'
//! keyboard state and pushes a [`SimInput::Sample`] every poll.

use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use gesture_core::{Phase, Zone};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::app::AppState;
use crate::cursor::Ripple;
use crate::error::AppError;
use crate::source::{SimControls, SimInput};

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W:     usize = 960;
pub const WIN_H:     usize = 640;
const PANEL_W:       usize = 180;
const SURFACE_W:     usize = WIN_W - PANEL_W;
const STATUS_H:      usize = 40;
const SURFACE_H:     usize = WIN_H - STATUS_H;
const STATUS_Y:      usize = SURFACE_H;
const METER_X:       usize = SURFACE_W + 24;
const METER_Y:       usize = 40;
const METER_W:       usize = 18;
const METER_H:       usize = 300;
const BAR_Y:         usize = METER_Y + METER_H + 60;
const BAR_H:         usize = 150;
const BAR_W:         usize = 28;
const CURSOR_R:      usize = 14;
const RIPPLE_MAX_R:  f32   = 70.0;

const BG_COLOR:      u32 = 0xFF1A1A2E;
const PANEL_BG:      u32 = 0xFF16213E;
const TEXT_BG:       u32 = 0xFF0F3460;
const GRID_COLOR:    u32 = 0xFF232946;
const HOVER_COLOR:   u32 = 0xFFAADDFF;
const PAD_COLOR:     u32 = 0xFFFFD700;  // gold
const PLUCK_COLOR:   u32 = 0xFFFF8866;
const ZONE_NONE:     u32 = 0xFF2E2E3E;
const ZONE_POINTER:  u32 = 0xFF3A5A8A;
const ZONE_PAD:      u32 = 0xFF8A6A1A;

/// Depth change per W/S repeat and per scroll unit (m).
const DEPTH_STEP:    f64 = 0.01;
const SCROLL_STEP:   f64 = 0.004;
const FILTER_STEP:   f64 = 0.02;

/// What the frame loop should do after a poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiAction {
    Continue,
    NextPatch,
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:        Window,
    buf:           Vec<u32>,
    sim_tx:        Sender<SimInput>,
    controls:      SimControls,
    /// Fraction of the image that spans the surface; used to place the
    /// simulated palm so the cursor lands under the mouse.
    mapping_scale: f64,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>, mapping_scale: f64) -> Result<Self, AppError> {
        let mut window = Window::new(
            "Leap Theremin — pad and pluck",
            WIN_W, WIN_H,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| AppError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
            controls: SimControls::default(),
            mapping_scale,
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read keyboard and mouse, update the simulated hands and push a sample.
    pub fn poll_input(&mut self) -> UiAction {
        if !self.window.is_open() { return UiAction::Quit; }

        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);
        let held     = |k: Key| self.window.is_key_pressed(k, KeyRepeat::Yes);

        if one_shot(Key::Q) || one_shot(Key::Escape) {
            let _ = self.sim_tx.send(SimInput::Quit);
            return UiAction::Quit;
        }
        let next_patch = one_shot(Key::P);
        let toggle     = one_shot(Key::H);

        let mut depth  = 0.0;
        let mut height = 0.0;
        let mut facing = 0.0;
        let mut pinch  = 0.0;
        if held(Key::W)     { depth  += DEPTH_STEP;  }
        if held(Key::S)     { depth  -= DEPTH_STEP;  }
        if held(Key::Up)    { height += FILTER_STEP; }
        if held(Key::Down)  { height -= FILTER_STEP; }
        if held(Key::Right) { facing += FILTER_STEP; }
        if held(Key::Left)  { facing -= FILTER_STEP; }
        if held(Key::R)     { pinch  += FILTER_STEP; }
        if held(Key::F)     { pinch  -= FILTER_STEP; }
        if let Some((_, dy)) = self.window.get_scroll_wheel() {
            depth += dy as f64 * SCROLL_STEP;
        }

        self.controls.push(depth);
        self.controls.raise_filter(height);
        self.controls.turn_filter(facing);
        self.controls.open_filter_pinch(pinch);
        if toggle { self.controls.toggle_filter(); }

        if let Some((mx, my)) = self.window.get_mouse_pos(MouseMode::Clamp) {
            let sx = (mx as f64 / SURFACE_W as f64).clamp(0.0, 1.0);
            let sy = (my as f64 / SURFACE_H as f64).clamp(0.0, 1.0);
            let palm = (self.to_image(sx), self.to_image(sy));
            let pinched = self.window.get_mouse_down(MouseButton::Left);
            let sample = self.controls.sample(palm, pinched);
            let _ = self.sim_tx.send(SimInput::Sample { sample, at: Instant::now() });
        }

        if next_patch { UiAction::NextPatch } else { UiAction::Continue }
    }

    /// Inverse of the interpreter's surface mapping.
    fn to_image(&self, surface: f64) -> f64 {
        (surface - 0.5) * self.mapping_scale + 0.5
    }

    /// Render one frame.
    pub fn render(&mut self, app: &AppState) {
        self.buf.fill(BG_COLOR);

        // ── Surface grid ──────────────────────────────────────────────────
        for i in 1..8 {
            let x = SURFACE_W * i / 8;
            self.fill_rect(x, 0, 1, SURFACE_H, GRID_COLOR);
            let y = SURFACE_H * i / 8;
            self.fill_rect(0, y, SURFACE_W, 1, GRID_COLOR);
        }

        // ── Ripples, then the cursor on top ───────────────────────────────
        let voice_color = match app.phase() {
            Phase::Pluck => PLUCK_COLOR,
            _            => PAD_COLOR,
        };
        for r in &app.cursor().ripples {
            self.draw_ripple(r, voice_color);
        }
        if let Some(c) = app.cursor().cursor {
            let (cx, cy) = surface_px(c.x, c.y);
            if c.hovering {
                self.draw_ring(cx, cy, CURSOR_R as f32, HOVER_COLOR);
            } else {
                self.fill_disc(cx, cy, CURSOR_R, voice_color);
            }
        }

        // ── Side panel ────────────────────────────────────────────────────
        self.fill_rect(SURFACE_W, 0, PANEL_W, SURFACE_H, PANEL_BG);
        self.draw_depth_meter(app);
        self.draw_levels(app);

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, STATUS_H, TEXT_BG);
        self.draw_label(&app.status, 10, STATUS_Y + 8, 0xFFEEEEEE);
        self.draw_label(
            "mouse=hand  click=pinch  W/S scroll=depth  up/down=height  left/right=facing  R/F=open  H=filter hand  P=patch  Q=quit",
            10, WIN_H - 12, 0xFF888888,
        );

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Depth meter ───────────────────────────────────────────────────────

    fn draw_depth_meter(&mut self, app: &AppState) {
        self.draw_label("DEPTH", METER_X, METER_Y - 20, 0xFFFFD700);

        let zone = &app.config().zone;
        let y_of = |d: f64| {
            let t = (d - SimControls::DEPTH_MIN) / (SimControls::DEPTH_MAX - SimControls::DEPTH_MIN);
            METER_Y + ((1.0 - t.clamp(0.0, 1.0)) * METER_H as f64) as usize
        };

        // Near is at the bottom.
        let pad     = y_of(zone.pad_enter_m);
        let pointer = y_of(zone.pointer_max_m);
        self.fill_rect(METER_X, METER_Y, METER_W, METER_H, ZONE_PAD);
        self.fill_rect(METER_X, METER_Y, METER_W, pad - METER_Y, ZONE_POINTER);
        self.fill_rect(METER_X, METER_Y, METER_W, pointer - METER_Y, ZONE_NONE);
        self.draw_border(METER_X, METER_Y, METER_W, METER_H, 0xFF000000);

        let (label_x, highlight, dim) = (METER_X + METER_W + 8, 0xFFFFFFFF, 0xFF888888);
        let active = app.zone();
        for (z, y) in [
            (Zone::None,    METER_Y + 4),
            (Zone::Pointer, pointer + 4),
            (Zone::Pad,     pad + 4),
        ] {
            self.draw_label(z.name(), label_x, y, if z == active { highlight } else { dim });
        }

        let marker = y_of(self.controls.depth_m);
        self.fill_rect(METER_X - 6, marker, METER_W + 12, 2, 0xFFFFFFFF);
        let text = format!("{:.2}m", self.controls.depth_m);
        self.draw_label(&text, METER_X - 4, METER_Y + METER_H + 10, 0xFFEEEEEE);
    }

    // ── Filter hand levels ────────────────────────────────────────────────

    fn draw_levels(&mut self, app: &AppState) {
        let levels = app.levels();
        for (i, (name, value)) in [("res", levels.resonance), ("cut", levels.cutoff), ("wet", levels.wet)]
            .into_iter()
            .enumerate()
        {
            let x = SURFACE_W + 16 + i * (BAR_W + 16);
            self.fill_rect(x, BAR_Y, BAR_W, BAR_H, ZONE_NONE);
            let h = (value.clamp(0.0, 1.0) * BAR_H as f64) as usize;
            self.fill_rect(x, BAR_Y + BAR_H - h, BAR_W, h, HOVER_COLOR);
            self.draw_border(x, BAR_Y, BAR_W, BAR_H, 0xFF000000);
            self.draw_label(name, x + 2, BAR_Y + BAR_H + 6, 0xFFEEEEEE);
        }
        if !self.controls.filter_visible {
            self.draw_label("filter hand hidden", SURFACE_W + 16, BAR_Y - 14, 0xFF888888);
        }
    }

    // ── Cursor shapes ─────────────────────────────────────────────────────

    fn draw_ripple(&mut self, ripple: &Ripple, color: u32) {
        let (cx, cy) = surface_px(ripple.x, ripple.y);
        let t = ripple.progress();
        let color = blend(color, BG_COLOR, t);
        self.draw_ring(cx, cy, CURSOR_R as f32 + t * RIPPLE_MAX_R, color);
    }

    fn draw_ring(&mut self, cx: usize, cy: usize, r: f32, color: u32) {
        let steps = (r * 8.0).max(16.0) as usize;
        for i in 0..steps {
            let a = i as f32 / steps as f32 * std::f32::consts::TAU;
            let x = cx as f32 + r * a.cos();
            let y = cy as f32 + r * a.sin();
            if x >= 0.0 && y >= 0.0 && (x as usize) < SURFACE_W && (y as usize) < SURFACE_H {
                self.set_pixel(x as usize, y as usize, color);
            }
        }
    }

    fn fill_disc(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        let r2 = (r * r) as isize;
        for dy in -(r as isize)..=r as isize {
            for dx in -(r as isize)..=r as isize {
                if dx * dx + dy * dy > r2 { continue; }
                let (x, y) = (cx as isize + dx, cy as isize + dy);
                if x >= 0 && y >= 0 && (x as usize) < SURFACE_W && (y as usize) < SURFACE_H {
                    self.set_pixel(x as usize, y as usize, color);
                }
            }
        }
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y+h).min(WIN_H) {
            for col in x..(x+w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        if w == 0 || h == 0 { return; }
        for col in x..(x+w).min(WIN_W) {
            if y < WIN_H           { self.buf[y           * WIN_W + col] = color; }
            if y+h-1 < WIN_H       { self.buf[(y+h-1)     * WIN_W + col] = color; }
        }
        for row in y..(y+h).min(WIN_H) {
            if x < WIN_W           { self.buf[row * WIN_W + x    ] = color; }
            if x+w-1 < WIN_W       { self.buf[row * WIN_W + x+w-1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    /// 3×5 bitmap text.
    fn draw_label(&mut self, text: &str, x: usize, y: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.set_pixel(cx + col, y + row, color);
                    }
                }
            }
            cx += 4; // 3 wide + 1 gap
            if cx + 4 > WIN_W { break; }
        }
    }
}

/// Normalized surface position → pixel in the surface area.
fn surface_px(x: f32, y: f32) -> (usize, usize) {
    let px = (x.clamp(0.0, 1.0) * (SURFACE_W - 1) as f32) as usize;
    let py = (y.clamp(0.0, 1.0) * (SURFACE_H - 1) as f32) as usize;
    (px, py)
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '(' => [0b010, 0b100, 0b100, 0b100, 0b010],
        ')' => [0b010, 0b001, 0b001, 0b001, 0b010],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}

/// Blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t) as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

use crate::canvas::{RasterCanvas, Surface};
use crate::capture::open_capture;
use crate::config::{Config, DetectorMode, MIN_BRUSH_SCALE};
use crate::detector::{DriftDetector, ExpressionDetector, Mood, MoodPad, PadDetector, ScriptDetector};
use crate::expression::ExpressionSnapshot;
use crate::painter::{DiagnosticsClock, FrameDriver, FrameStats, IntroTiming};
use crate::palette::PaletteMapper;
use crate::render::{make_renderer, Frame};
use crate::sampler::ExpressionSampler;
use crate::terminal::TerminalGuard;
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use std::io::BufWriter;
use std::time::{Duration, Instant};

/// Rows under the canvas reserved for the HUD, shown or not.
pub const HUD_ROWS: u16 = 2;

pub fn run(cfg: Config) -> anyhow::Result<()> {
    cfg.validate()?;

    let pad = MoodPad::new();
    let detector = build_detector(&cfg, &pad)?;
    let detector_name = detector.name();

    let _term = TerminalGuard::new("e.motion")?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = make_renderer(cfg.renderer);
    let (px_w_mul, px_h_mul) = cfg.renderer.pixels_per_cell();

    let mut last_size = TerminalGuard::size()?;
    if last_size.0 < 4 || last_size.1 < HUD_ROWS + 1 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x{}, got {}x{})",
            HUD_ROWS + 1,
            last_size.0,
            last_size.1
        ));
    }
    let (cw, ch) = canvas_size(last_size, px_w_mul, px_h_mul);
    let mut canvas = RasterCanvas::new(cw, ch);

    // The camera size is fixed for the session; only the canvas follows the terminal.
    let (cap_w, cap_h) = capture_size(cw, ch, cfg.brush_scale);
    let start = Instant::now();
    let sampler = ExpressionSampler::spawn(
        detector,
        open_capture(cfg.capture, cfg.image.as_deref(), cap_w, cap_h),
        cfg.refresh_delay(),
        start,
    )
    .context("start expression sampler")?;
    let cell = sampler.cell();
    let mut capture = open_capture(cfg.capture, cfg.image.as_deref(), cap_w, cap_h);

    let rng = match cfg.seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    let timing = IntroTiming {
        intro_ms: cfg.intro_ms as f32,
        fade_start_ms: cfg.fade_start_ms as f32,
        fade_end_ms: cfg.fade_end_ms as f32,
    };
    let mut driver = FrameDriver::new(timing, PaletteMapper::new(cfg.clamp_blend), cfg.brush_scale, rng);
    let mut diagnostics = DiagnosticsClock::new(cfg.refresh_delay());

    let mut show_hud = true;
    let mut fps = FpsCounter::new();
    let budget = cfg.frame_budget();
    log::info!(
        "session started: canvas {}x{}, capture {}x{}, renderer {}",
        cw,
        ch,
        cap_w,
        cap_h,
        renderer.name()
    );

    loop {
        let now = Instant::now();

        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, &pad) {
                        KeyAction::Quit => return Ok(()),
                        KeyAction::ToggleHud => show_hud = !show_hud,
                        KeyAction::None => {}
                    }
                }
                Event::Resize(c, r) => {
                    resize_canvas(&mut canvas, &mut last_size, (c, r), px_w_mul, px_h_mul);
                }
                _ => {}
            }
        }
        // Resize events can be missed by some terminals.
        let sz = TerminalGuard::size()?;
        resize_canvas(&mut canvas, &mut last_size, sz, px_w_mul, px_h_mul);

        let elapsed = start.elapsed();
        let snapshot = cell.load();
        diagnostics.report(elapsed.as_secs_f32() * 1000.0, snapshot.as_ref());

        canvas.reset_state();
        let source = capture.grab(elapsed.as_secs_f32());
        let stats = driver.frame(elapsed, source, snapshot, &mut canvas);

        let hud = if show_hud {
            let phase = driver.timing().phase_at(elapsed.as_secs_f32() * 1000.0);
            let face = if cfg.detector == DetectorMode::Pad {
                Some(pad.face_visible())
            } else {
                None
            };
            format!(
                "{}\n{}",
                status_line(phase.label(), snapshot.as_ref(), &stats, fps.fps(), detector_name, face),
                KEY_HINTS
            )
        } else {
            String::new()
        };

        let (term_cols, term_rows) = last_size;
        let frame = Frame {
            term_cols,
            visual_rows: term_rows.saturating_sub(HUD_ROWS).max(1),
            pixel_width: canvas.width(),
            pixel_height: canvas.height(),
            pixels_rgba: canvas.pixels(),
            hud: &hud,
            hud_rows: HUD_ROWS.min(term_rows.saturating_sub(1)),
            sync_updates: cfg.sync_updates,
        };
        renderer.render(&frame, &mut out)?;
        fps.tick();

        let spent = now.elapsed();
        if spent < budget {
            std::thread::sleep(budget - spent);
        }
    }
}

pub const KEY_HINTS: &str = "Keys: 1 happy | 2 neutral | 3 angry | 4 sad | 0 reset | f face on/off | i HUD | q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    ToggleHud,
    None,
}

pub fn handle_key(code: KeyCode, mods: KeyModifiers, pad: &MoodPad) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        KeyCode::Char('i') | KeyCode::Char('I') => KeyAction::ToggleHud,
        KeyCode::Char('1') => {
            pad.nudge(Mood::Happy);
            KeyAction::None
        }
        KeyCode::Char('2') => {
            pad.nudge(Mood::Neutral);
            KeyAction::None
        }
        KeyCode::Char('3') => {
            pad.nudge(Mood::Angry);
            KeyAction::None
        }
        KeyCode::Char('4') => {
            pad.nudge(Mood::Sad);
            KeyAction::None
        }
        KeyCode::Char('0') => {
            pad.reset();
            KeyAction::None
        }
        KeyCode::Char('f') | KeyCode::Char('F') => {
            let visible = pad.toggle_face();
            log::info!("mood pad face {}", if visible { "visible" } else { "hidden" });
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

pub fn build_detector(cfg: &Config, pad: &MoodPad) -> anyhow::Result<Box<dyn ExpressionDetector>> {
    let detector: Box<dyn ExpressionDetector> = match cfg.detector {
        DetectorMode::Drift => Box::new(DriftDetector::new()),
        DetectorMode::Script => {
            let path = cfg
                .script
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--detector script requires --script <PATH>"))?;
            Box::new(ScriptDetector::load(path)?)
        }
        DetectorMode::Pad => Box::new(PadDetector::new(pad.clone())),
    };
    Ok(detector)
}

/// Canvas pixels for a terminal of `size`, leaving the HUD rows free.
pub fn canvas_size(size: (u16, u16), px_w_mul: usize, px_h_mul: usize) -> (usize, usize) {
    let (cols, rows) = size;
    let visual_rows = rows.saturating_sub(HUD_ROWS).max(1);
    (
        (cols as usize).saturating_mul(px_w_mul),
        (visual_rows as usize).saturating_mul(px_h_mul),
    )
}

/// Capture resolution whose strokes, scaled by `brush_scale`, span the canvas.
pub fn capture_size(canvas_w: usize, canvas_h: usize, brush_scale: f32) -> (usize, usize) {
    let s = if brush_scale.is_finite() {
        brush_scale.max(MIN_BRUSH_SCALE)
    } else {
        1.0
    };
    (
        ((canvas_w as f32 / s).round() as usize).max(1),
        ((canvas_h as f32 / s).round() as usize).max(1),
    )
}

/// One-line status: phase, expression scores, turbulence, throughput.
pub fn status_line(
    phase: &str,
    snapshot: Option<&ExpressionSnapshot>,
    stats: &FrameStats,
    fps: f32,
    detector: &str,
    face: Option<bool>,
) -> String {
    let expr = match snapshot {
        Some(s) => format!(
            "Turb: {:>5.2} | H {:.2} N {:.2} A {:.2} S {:.2}",
            s.turbulence, s.scores.happy, s.scores.neutral, s.scores.angry, s.scores.sad
        ),
        None => "Turb: --- | no expression data".to_string(),
    };
    let face = match face {
        Some(true) => " (face)",
        Some(false) => " (no face)",
        None => "",
    };
    format!(
        "e.motion | {} | {} | Strokes: {:>4} | Det: {}{} | FPS: {:>4.1}",
        phase,
        expr,
        stats.painted(),
        detector,
        face,
        fps
    )
}

fn resize_canvas(
    canvas: &mut RasterCanvas,
    last_size: &mut (u16, u16),
    size: (u16, u16),
    px_w_mul: usize,
    px_h_mul: usize,
) {
    if size == *last_size {
        return;
    }
    *last_size = size;
    let (w, h) = canvas_size(size, px_w_mul, px_h_mul);
    log::info!("terminal resized to {}x{}; canvas reset to {}x{}", size.0, size.1, w, h);
    canvas.resize(w, h);
}

struct FpsCounter {
    last: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    fn new() -> Self {
        Self {
            last: Instant::now(),
            frames: 0,
            fps: 0.0,
        }
    }

    fn tick(&mut self) {
        self.frames += 1;
        let now = Instant::now();
        let dt = now.duration_since(self.last).as_secs_f32();
        if dt >= 0.5 {
            self.fps = self.frames as f32 / dt;
            self.frames = 0;
            self.last = now;
        }
    }

    fn fps(&self) -> f32 {
        self.fps
    }
}

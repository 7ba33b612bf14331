use crate::canvas::{Surface, TextAlign};
use crate::capture::CaptureFrame;
use crate::expression::ExpressionSnapshot;
use crate::palette::{PaletteMapper, Rgba};
use crate::stroke::{luma, map_range, StrokeParams, StrokeShape, StrokeSpec};
use std::time::Duration;

pub const QUOTE_LINE_1: &str = "\"All perception is colored by emotion\"";
pub const QUOTE_LINE_2: &str = "                       -Immanuel Kant";
pub const QUOTE_TEXT_SIZE: f32 = 20.0;
pub const QUOTE_LINE_OFFSET: f32 = 40.0;

/// A pixel is painted when a draw from [0, SAMPLE_SIDES) lands below 1.
pub const SAMPLE_SIDES: f32 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntroTiming {
    pub intro_ms: f32,
    pub fade_start_ms: f32,
    pub fade_end_ms: f32,
}

impl Default for IntroTiming {
    fn default() -> Self {
        Self {
            intro_ms: 12_000.0,
            fade_start_ms: 5_000.0,
            fade_end_ms: 10_000.0,
        }
    }
}

impl IntroTiming {
    pub fn phase_at(&self, elapsed_ms: f32) -> Phase {
        if elapsed_ms >= self.intro_ms {
            Phase::Painting
        } else {
            Phase::Intro {
                alpha: intro_alpha(elapsed_ms, self.fade_start_ms, self.fade_end_ms),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Intro { alpha: f32 },
    Painting,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Intro { .. } => "intro",
            Self::Painting => "painting",
        }
    }
}

/// Quotation alpha: 0 until the fade starts, 255 once it ends, linear between.
pub fn intro_alpha(elapsed_ms: f32, fade_start_ms: f32, fade_end_ms: f32) -> f32 {
    let t = elapsed_ms.clamp(fade_start_ms, fade_end_ms);
    map_range(t, fade_start_ms, fade_end_ms, 0.0, 255.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub sampled: usize,
    pub curves: usize,
    pub dots: usize,
    /// Sampled pixels dropped because no expression snapshot exists yet.
    pub skipped_no_data: usize,
    pub quote_alpha: Option<f32>,
    pub turbulence: Option<f32>,
}

impl FrameStats {
    pub fn painted(&self) -> usize {
        self.curves + self.dots
    }
}

/// Intro/painting state machine gated on elapsed session time.
pub struct FrameDriver {
    timing: IntroTiming,
    mapper: PaletteMapper,
    brush_scale: f32,
    rng: fastrand::Rng,
}

impl FrameDriver {
    pub fn new(timing: IntroTiming, mapper: PaletteMapper, brush_scale: f32, rng: fastrand::Rng) -> Self {
        Self {
            timing,
            mapper,
            brush_scale,
            rng,
        }
    }

    pub fn timing(&self) -> &IntroTiming {
        &self.timing
    }

    pub fn frame(
        &mut self,
        elapsed: Duration,
        capture: &CaptureFrame,
        snapshot: Option<ExpressionSnapshot>,
        surface: &mut dyn Surface,
    ) -> FrameStats {
        let elapsed_ms = elapsed.as_secs_f32() * 1000.0;
        match self.timing.phase_at(elapsed_ms) {
            Phase::Intro { alpha } => {
                self.draw_quote(alpha, surface);
                FrameStats {
                    quote_alpha: Some(alpha),
                    ..FrameStats::default()
                }
            }
            Phase::Painting => self.paint(capture, snapshot, surface),
        }
    }

    fn draw_quote(&self, alpha: f32, surface: &mut dyn Surface) {
        let cx = surface.width() as f32 / 2.0;
        let cy = surface.height() as f32 / 2.0;
        let s = self.brush_scale;
        surface.fill(Rgba::new(255.0, 255.0, 255.0, alpha));
        surface.text(QUOTE_LINE_1, cx, cy - QUOTE_LINE_OFFSET * s, QUOTE_TEXT_SIZE * s, TextAlign::Center);
        surface.text(QUOTE_LINE_2, cx, cy + QUOTE_LINE_OFFSET * s, QUOTE_TEXT_SIZE * s, TextAlign::Center);
    }

    fn paint(
        &mut self,
        capture: &CaptureFrame,
        snapshot: Option<ExpressionSnapshot>,
        surface: &mut dyn Surface,
    ) -> FrameStats {
        let mut stats = FrameStats {
            turbulence: snapshot.map(|s| s.turbulence),
            ..FrameStats::default()
        };
        let params = snapshot.map(|s| StrokeParams::from_turbulence(s.turbulence));

        let cw = capture.width as f32;
        let ch = capture.height as f32;

        let (half_w, half_h) = (surface.width() as f32 / 2.0, surface.height() as f32 / 2.0);
        surface.push();
        surface.translate(half_w, half_h);
        if self.brush_scale != 1.0 {
            surface.scale(self.brush_scale);
        }

        for y in 0..capture.height {
            for x in 0..capture.width {
                if self.rng.f32() * SAMPLE_SIDES >= 1.0 {
                    continue;
                }
                stats.sampled += 1;
                let Some(params) = params.as_ref() else {
                    stats.skipped_no_data += 1;
                    continue;
                };

                let (r, g, b) = capture.rgb(x, y);
                let spec = StrokeSpec::sample(params, luma(r, g, b), &self.mapper, &mut self.rng);

                surface.push();
                // Mirrored horizontally, centered on the canvas.
                surface.translate(cw - x as f32 - cw / 2.0, y as f32 - ch / 2.0);
                paint_stroke(&spec, surface);
                surface.pop();

                match spec.shape {
                    StrokeShape::Curve { .. } => stats.curves += 1,
                    StrokeShape::Dot => stats.dots += 1,
                }
            }
        }

        surface.pop();
        log::trace!(
            "frame: sampled={} painted={} skipped={}",
            stats.sampled,
            stats.painted(),
            stats.skipped_no_data
        );
        stats
    }
}

/// Issue the drawing commands for one stroke at the local origin.
pub fn paint_stroke(spec: &StrokeSpec, surface: &mut dyn Surface) {
    surface.stroke(spec.color);
    surface.stroke_weight(spec.weight());
    match spec.shape {
        StrokeShape::Curve { rotation_deg } => {
            surface.rotate(rotation_deg.to_radians());
            surface.curve(spec.control_points());
        }
        StrokeShape::Dot => surface.point(0.0, 0.0),
    }
}

/// Rate limiter for the expression diagnostics printed while rendering.
#[derive(Debug, Clone)]
pub struct DiagnosticsClock {
    delay_ms: f32,
    last_ms: f32,
}

impl DiagnosticsClock {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_secs_f32() * 1000.0,
            last_ms: 0.0,
        }
    }

    /// True at most once per delay; restarts the interval when it fires.
    pub fn due(&mut self, now_ms: f32) -> bool {
        if now_ms - self.last_ms >= self.delay_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

    /// Score readout at `debug`, missing data at `warn`.
    pub fn report(&mut self, now_ms: f32, snapshot: Option<&ExpressionSnapshot>) {
        if !self.due(now_ms) {
            return;
        }
        match snapshot {
            Some(s) => log::debug!(
                "happy={:.3} neutral={:.3} angry={:.3} sad={:.3} turbulence={:.3}",
                s.scores.happy,
                s.scores.neutral,
                s.scores.angry,
                s.scores.sad,
                s.turbulence
            ),
            None => log::warn!("expression data undefined"),
        }
    }
}

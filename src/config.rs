use anyhow::bail;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Smallest accepted `--brush-scale`. The capture grid is the canvas divided
/// by the scale, so this also bounds the capture size at 20x the canvas.
pub const MIN_BRUSH_SCALE: f32 = 0.05;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "emotion-canvas",
    version,
    about = "Generative terminal painting steered by the viewer's facial expression"
)]
pub struct Config {
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Expression sampling period, also used as the diagnostics interval.
    #[arg(long, default_value_t = 50)]
    pub refresh_ms: u64,

    #[arg(long, default_value_t = 12_000)]
    pub intro_ms: u64,

    #[arg(long, default_value_t = 5_000)]
    pub fade_start_ms: u64,

    #[arg(long, default_value_t = 10_000)]
    pub fade_end_ms: u64,

    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    #[arg(long, value_enum, default_value_t = CaptureMode::Synthetic)]
    pub capture: CaptureMode,

    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = DetectorMode::Pad)]
    pub detector: DetectorMode,

    #[arg(long, value_name = "PATH")]
    pub script: Option<PathBuf>,

    /// Scale applied to stroke geometry after centering; the capture surface
    /// is sized to the canvas divided by this factor.
    #[arg(long, default_value_t = 0.25)]
    pub brush_scale: f32,

    /// Clamp the turbulence blend factor to [0, 1] before palette lookup.
    #[arg(long, default_value_t = false)]
    pub clamp_blend: bool,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "dots")]
    Braille,
    #[value(alias = "text")]
    Ascii,
}

impl RendererMode {
    /// Canvas pixels per terminal cell, (x, y).
    pub fn pixels_per_cell(self) -> (usize, usize) {
        match self {
            Self::HalfBlock => (1, 2),
            Self::Braille => (2, 4),
            Self::Ascii => (1, 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CaptureMode {
    Synthetic,
    #[value(alias = "image")]
    Still,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DetectorMode {
    Drift,
    Script,
    #[value(alias = "keys")]
    Pad,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fps == 0 {
            bail!("--fps must be >= 1");
        }
        if self.refresh_ms == 0 {
            bail!("--refresh-ms must be >= 1");
        }
        if !(self.brush_scale >= MIN_BRUSH_SCALE) || !self.brush_scale.is_finite() {
            bail!("--brush-scale must be a finite number >= {MIN_BRUSH_SCALE}");
        }
        if self.fade_end_ms <= self.fade_start_ms {
            bail!("--fade-end-ms must be greater than --fade-start-ms");
        }
        if self.capture == CaptureMode::Still && self.image.is_none() {
            bail!("--capture still requires --image <PATH>");
        }
        if self.detector == DetectorMode::Script && self.script.is_none() {
            bail!("--detector script requires --script <PATH>");
        }
        Ok(())
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.fps.max(1) as f32)
    }
}

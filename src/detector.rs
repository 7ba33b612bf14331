use crate::capture::CaptureFrame;
use crate::expression::ExpressionScores;
use anyhow::{Context, Result};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Face/expression detector seam. Returns one entry per detected face, in
/// detector order; an empty vector means no face was found.
pub trait ExpressionDetector: Send {
    fn name(&self) -> &'static str;
    fn detect(&mut self, frame: &CaptureFrame, t: f32) -> Result<Vec<ExpressionScores>>;
}

/// Slow deterministic mood swings, always one face.
pub struct DriftDetector {
    speed: f32,
}

impl DriftDetector {
    pub fn new() -> Self {
        Self { speed: 1.0 }
    }

    pub fn scores_at(&self, t: f32) -> ExpressionScores {
        let t = t * self.speed;
        let wave = |freq: f32, phase: f32| (0.5 + 0.5 * (t * freq + phase).sin()).clamp(0.0, 1.0);
        ExpressionScores {
            happy: wave(0.11, 0.0),
            neutral: wave(0.07, 1.9),
            angry: wave(0.05, 3.4).powf(2.0),
            sad: wave(0.09, 4.6).powf(1.5),
        }
    }
}

impl Default for DriftDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ExpressionDetector for DriftDetector {
    fn name(&self) -> &'static str {
        "drift"
    }

    fn detect(&mut self, _frame: &CaptureFrame, t: f32) -> Result<Vec<ExpressionScores>> {
        Ok(vec![self.scores_at(t)])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    Io(String),
    Parse { line: usize, message: String },
    Empty,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Empty => write!(f, "expression script has no entries"),
        }
    }
}

impl std::error::Error for ScriptError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptEntry {
    pub time_s: f32,
    /// `None` means no face in view from this point on.
    pub face: Option<ExpressionScores>,
}

/// Timed expression sequence, looping over its span.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionScript {
    entries: Vec<ScriptEntry>,
    span_s: f32,
}

impl ExpressionScript {
    /// How long the final entry holds before the script loops.
    const TAIL_HOLD_S: f32 = 1.0;

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let text = fs::read_to_string(path).map_err(|e| ScriptError::Io(e.to_string()))?;
        Self::parse(&text)
    }

    /// Lines are `<seconds> <happy> <neutral> <angry> <sad>` or
    /// `<seconds> none`. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        let mut entries = Vec::new();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            let time_s = parse_number(fields[0], line_no, "time")?;
            if time_s < 0.0 {
                return Err(ScriptError::Parse {
                    line: line_no,
                    message: "time must be >= 0".to_string(),
                });
            }

            let face = match &fields[1..] {
                [none] if none.eq_ignore_ascii_case("none") => None,
                [h, n, a, s] => Some(ExpressionScores {
                    happy: parse_score(h, line_no, "happy")?,
                    neutral: parse_score(n, line_no, "neutral")?,
                    angry: parse_score(a, line_no, "angry")?,
                    sad: parse_score(s, line_no, "sad")?,
                }),
                _ => {
                    return Err(ScriptError::Parse {
                        line: line_no,
                        message: "expected <seconds> <happy> <neutral> <angry> <sad> or <seconds> none"
                            .to_string(),
                    });
                }
            };
            entries.push(ScriptEntry { time_s, face });
        }

        if entries.is_empty() {
            return Err(ScriptError::Empty);
        }
        entries.sort_by(|a, b| a.time_s.total_cmp(&b.time_s));
        let span_s = entries
            .last()
            .map(|e| (e.time_s + Self::TAIL_HOLD_S).max(1.0))
            .unwrap_or(1.0);
        Ok(Self { entries, span_s })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn span_s(&self) -> f32 {
        self.span_s
    }

    /// Faces in view at `t`; empty before the first entry and on `none` lines.
    pub fn faces_at(&self, t: f32) -> Vec<ExpressionScores> {
        let t = t.rem_euclid(self.span_s.max(1e-3));
        let idx = self.entries.partition_point(|e| e.time_s <= t);
        if idx == 0 {
            return Vec::new();
        }
        self.entries[idx - 1].face.into_iter().collect()
    }
}

fn parse_number(raw: &str, line: usize, field: &str) -> Result<f32, ScriptError> {
    raw.parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScriptError::Parse {
            line,
            message: format!("{field} must be a number, got '{raw}'"),
        })
}

fn parse_score(raw: &str, line: usize, field: &str) -> Result<f32, ScriptError> {
    let v = parse_number(raw, line, field)?;
    if !(0.0..=1.0).contains(&v) {
        return Err(ScriptError::Parse {
            line,
            message: format!("{field} must be in [0, 1], got {v}"),
        });
    }
    Ok(v)
}

/// Plays back an `ExpressionScript` against session time.
pub struct ScriptDetector {
    script: ExpressionScript,
}

impl ScriptDetector {
    pub fn new(script: ExpressionScript) -> Self {
        Self { script }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let script = ExpressionScript::load(path)
            .with_context(|| format!("load expression script {}", path.display()))?;
        Ok(Self::new(script))
    }
}

impl ExpressionDetector for ScriptDetector {
    fn name(&self) -> &'static str {
        "script"
    }

    fn detect(&mut self, _frame: &CaptureFrame, t: f32) -> Result<Vec<ExpressionScores>> {
        Ok(self.script.faces_at(t))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Happy,
    Neutral,
    Angry,
    Sad,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PadState {
    scores: ExpressionScores,
    face: bool,
}

/// Keyboard-driven mood, shared between the input loop and `PadDetector`.
#[derive(Debug, Clone)]
pub struct MoodPad {
    state: Arc<Mutex<PadState>>,
}

impl MoodPad {
    pub const STEP: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PadState {
                scores: ExpressionScores::new(0.0, 1.0, 0.0, 0.0),
                face: true,
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PadState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|p| p.into_inner());
        f(&mut guard)
    }

    /// Raise one mood by `STEP` and let the others fade by half as much.
    pub fn nudge(&self, mood: Mood) {
        self.with_state(|s| {
            let fade = Self::STEP * 0.5;
            let sc = &mut s.scores;
            for (m, v) in [
                (Mood::Happy, &mut sc.happy),
                (Mood::Neutral, &mut sc.neutral),
                (Mood::Angry, &mut sc.angry),
                (Mood::Sad, &mut sc.sad),
            ] {
                *v = if m == mood {
                    (*v + Self::STEP).min(1.0)
                } else {
                    (*v - fade).max(0.0)
                };
            }
        })
    }

    pub fn reset(&self) {
        self.with_state(|s| s.scores = ExpressionScores::new(0.0, 1.0, 0.0, 0.0))
    }

    pub fn toggle_face(&self) -> bool {
        self.with_state(|s| {
            s.face = !s.face;
            s.face
        })
    }

    pub fn scores(&self) -> ExpressionScores {
        self.with_state(|s| s.scores)
    }

    pub fn face_visible(&self) -> bool {
        self.with_state(|s| s.face)
    }
}

impl Default for MoodPad {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PadDetector {
    pad: MoodPad,
}

impl PadDetector {
    pub fn new(pad: MoodPad) -> Self {
        Self { pad }
    }
}

impl ExpressionDetector for PadDetector {
    fn name(&self) -> &'static str {
        "pad"
    }

    fn detect(&mut self, _frame: &CaptureFrame, _t: f32) -> Result<Vec<ExpressionScores>> {
        let state = self.pad.with_state(|s| *s);
        Ok(if state.face { vec![state.scores] } else { Vec::new() })
    }
}

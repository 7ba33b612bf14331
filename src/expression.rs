use std::sync::atomic::{fence, AtomicU32, AtomicU64, Ordering};

pub const HAPPY_WEIGHT: f32 = -0.5;
pub const NEUTRAL_WEIGHT: f32 = -0.25;
pub const ANGRY_WEIGHT: f32 = 0.5;
pub const SAD_WEIGHT: f32 = 0.5;
pub const TURBULENCE_BIAS: f32 = 0.5;

/// Per-face expression intensities as reported by a detector, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExpressionScores {
    pub happy: f32,
    pub neutral: f32,
    pub angry: f32,
    pub sad: f32,
}

impl ExpressionScores {
    pub fn new(happy: f32, neutral: f32, angry: f32, sad: f32) -> Self {
        Self {
            happy,
            neutral,
            angry,
            sad,
        }
    }
}

/// Weighted expression terms and the turbulence derived from one set of scores.
///
/// All fields come from the same `ExpressionScores`; there is no way to build
/// a snapshot that mixes two detector results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpressionSnapshot {
    pub scores: ExpressionScores,
    pub happy: f32,
    pub neutral: f32,
    pub angry: f32,
    pub sad: f32,
    pub turbulence: f32,
}

impl ExpressionSnapshot {
    pub fn from_scores(scores: ExpressionScores) -> Self {
        let happy = HAPPY_WEIGHT * scores.happy;
        let neutral = NEUTRAL_WEIGHT * scores.neutral;
        let angry = ANGRY_WEIGHT * scores.angry;
        let sad = SAD_WEIGHT * scores.sad;
        Self {
            scores,
            happy,
            neutral,
            angry,
            sad,
            turbulence: happy + neutral + angry + sad + TURBULENCE_BIAS,
        }
    }
}

/// Turbulence of a single face. Not clamped: extreme score combinations can
/// leave [0, 1].
pub fn turbulence(scores: &ExpressionScores) -> f32 {
    ExpressionSnapshot::from_scores(*scores).turbulence
}

/// Single-slot, overwrite-on-write cell holding the latest expression scores.
///
/// One writer (the sampler) and any number of readers. Readers retry while a
/// write is in progress, so a load never observes fields from two stores.
pub struct SnapshotCell {
    seq: AtomicU64,
    present: AtomicU32,
    happy: AtomicU32,
    neutral: AtomicU32,
    angry: AtomicU32,
    sad: AtomicU32,
    updates: AtomicU64,
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            seq: AtomicU64::new(0),
            present: AtomicU32::new(0),
            happy: AtomicU32::new(0),
            neutral: AtomicU32::new(0),
            angry: AtomicU32::new(0),
            sad: AtomicU32::new(0),
            updates: AtomicU64::new(0),
        }
    }

    pub fn store(&self, scores: ExpressionScores) {
        self.seq.fetch_add(1, Ordering::Relaxed); // odd => write in progress
        fence(Ordering::Release);
        self.happy.store(scores.happy.to_bits(), Ordering::Relaxed);
        self.neutral.store(scores.neutral.to_bits(), Ordering::Relaxed);
        self.angry.store(scores.angry.to_bits(), Ordering::Relaxed);
        self.sad.store(scores.sad.to_bits(), Ordering::Relaxed);
        self.present.store(1, Ordering::Relaxed);
        self.seq.fetch_add(1, Ordering::Release); // even => stable
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    /// Latest snapshot, or `None` until the first face has been seen.
    pub fn load(&self) -> Option<ExpressionSnapshot> {
        loop {
            let v1 = self.seq.load(Ordering::Acquire);
            if v1 & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let present = self.present.load(Ordering::Relaxed) != 0;
            let scores = ExpressionScores {
                happy: f32::from_bits(self.happy.load(Ordering::Relaxed)),
                neutral: f32::from_bits(self.neutral.load(Ordering::Relaxed)),
                angry: f32::from_bits(self.angry.load(Ordering::Relaxed)),
                sad: f32::from_bits(self.sad.load(Ordering::Relaxed)),
            };

            fence(Ordering::Acquire);
            let v2 = self.seq.load(Ordering::Relaxed);
            if v1 == v2 {
                return present.then(|| ExpressionSnapshot::from_scores(scores));
            }
        }
    }

    /// Number of successful stores so far.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Publish the first detected face. With no faces the cell keeps its previous
/// value. Returns whether the cell was updated.
pub fn apply_detection(cell: &SnapshotCell, faces: &[ExpressionScores]) -> bool {
    match faces.first() {
        Some(first) => {
            cell.store(*first);
            true
        }
        None => false,
    }
}

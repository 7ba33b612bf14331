use crate::capture::CaptureSource;
use crate::detector::ExpressionDetector;
use crate::expression::{apply_detection, SnapshotCell};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Updated,
    NoFace,
    Failed,
}

#[derive(Debug, Default)]
pub struct SamplerStats {
    ticks: AtomicU64,
    no_face: AtomicU64,
    failed: AtomicU64,
}

impl SamplerStats {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn no_face(&self) -> u64 {
        self.no_face.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    fn record(&self, outcome: TickOutcome) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        match outcome {
            TickOutcome::Updated => {}
            TickOutcome::NoFace => {
                self.no_face.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Failed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// One detector evaluation per call; the body of the periodic sampling task.
pub struct SamplerCore {
    detector: Box<dyn ExpressionDetector>,
    capture: Box<dyn CaptureSource>,
    cell: Arc<SnapshotCell>,
}

impl SamplerCore {
    pub fn new(
        detector: Box<dyn ExpressionDetector>,
        capture: Box<dyn CaptureSource>,
        cell: Arc<SnapshotCell>,
    ) -> Self {
        Self {
            detector,
            capture,
            cell,
        }
    }

    pub fn tick(&mut self, t: f32) -> TickOutcome {
        let frame = self.capture.grab(t);
        // A failed camera leaves a 0x0 surface; nothing can be seen in it.
        if frame.is_empty() {
            return TickOutcome::NoFace;
        }
        match self.detector.detect(frame, t) {
            Ok(faces) => {
                if apply_detection(&self.cell, &faces) {
                    TickOutcome::Updated
                } else {
                    TickOutcome::NoFace
                }
            }
            Err(err) => {
                log::warn!("detector {} failed: {err:#}", self.detector.name());
                TickOutcome::Failed
            }
        }
    }
}

/// Background task polling the detector on a fixed period. The render loop
/// never waits on it; it only reads the shared cell.
pub struct ExpressionSampler {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
    cell: Arc<SnapshotCell>,
    stats: Arc<SamplerStats>,
}

impl ExpressionSampler {
    pub fn spawn(
        detector: Box<dyn ExpressionDetector>,
        capture: Box<dyn CaptureSource>,
        period: Duration,
        start: Instant,
    ) -> anyhow::Result<Self> {
        let cell = Arc::new(SnapshotCell::new());
        let stats = Arc::new(SamplerStats::default());
        let stop = Arc::new(AtomicBool::new(false));

        let detector_name = detector.name();
        let mut core = SamplerCore::new(detector, capture, Arc::clone(&cell));
        let stop_for_thread = Arc::clone(&stop);
        let stats_for_thread = Arc::clone(&stats);

        let handle = thread::Builder::new()
            .name("expression-sampler".to_string())
            .spawn(move || sample_loop(&mut core, period, start, &stop_for_thread, &stats_for_thread))?;

        log::info!(
            "expression sampler started (detector={detector_name}, period={}ms)",
            period.as_millis()
        );

        Ok(Self {
            stop,
            handle: Some(handle),
            cell,
            stats,
        })
    }

    pub fn cell(&self) -> Arc<SnapshotCell> {
        Arc::clone(&self.cell)
    }

    pub fn stats(&self) -> Arc<SamplerStats> {
        Arc::clone(&self.stats)
    }
}

impl Drop for ExpressionSampler {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // A stalled detector call is never cancelled; the join waits for it.
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        log::info!(
            "expression sampler stopped after {} ticks ({} without a face)",
            self.stats.ticks(),
            self.stats.no_face()
        );
    }
}

fn sample_loop(
    core: &mut SamplerCore,
    period: Duration,
    start: Instant,
    stop: &AtomicBool,
    stats: &SamplerStats,
) {
    let period = period.max(Duration::from_millis(1));
    let mut next = Instant::now();

    while !stop.load(Ordering::Relaxed) {
        let outcome = core.tick(start.elapsed().as_secs_f32());
        stats.record(outcome);

        next += period;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        } else {
            // Detector overran the period; start the next tick right away.
            next = now;
        }
    }
}

use crate::config::CaptureMode;
use std::fmt;
use std::path::{Path, PathBuf};

/// One RGBA8 frame from the video input, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureFrame {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u8>,
}

impl CaptureFrame {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width.saturating_mul(height).saturating_mul(4)],
        }
    }

    pub fn empty() -> Self {
        Self::new(0, 0)
    }

    pub fn from_rgba(width: usize, height: usize, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width.saturating_mul(height).saturating_mul(4)).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn rgb(&self, x: usize, y: usize) -> (u8, u8, u8) {
        let i = (x + y * self.width) * 4;
        (self.pixels[i], self.pixels[i + 1], self.pixels[i + 2])
    }
}

/// A live, pixel-readable video stream.
pub trait CaptureSource: Send {
    fn name(&self) -> &'static str;
    /// Current frame at `t` seconds into the session.
    fn grab(&mut self, t: f32) -> &CaptureFrame;
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureError {
    Open { path: PathBuf, message: String },
    MissingPath,
    ZeroSize,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, message } => {
                write!(f, "could not open capture {}: {message}", path.display())
            }
            Self::MissingPath => write!(f, "still capture requires an image path"),
            Self::ZeroSize => write!(f, "capture size must be non-zero"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// Open a capture stream. A failure is reported and leaves the session with a
/// blank, zero-sized surface; there is no retry.
pub fn open_capture(
    mode: CaptureMode,
    image: Option<&Path>,
    width: usize,
    height: usize,
) -> Box<dyn CaptureSource> {
    let opened: Result<Box<dyn CaptureSource>, CaptureError> = match mode {
        CaptureMode::Synthetic => {
            SyntheticCapture::new(width, height).map(|c| Box::new(c) as Box<dyn CaptureSource>)
        }
        CaptureMode::Still => match image {
            Some(path) => StillCapture::open(path, width, height)
                .map(|c| Box::new(c) as Box<dyn CaptureSource>),
            None => Err(CaptureError::MissingPath),
        },
    };

    match opened {
        Ok(src) => {
            log::info!("capture opened: {} {}x{}", src.name(), width, height);
            src
        }
        Err(err) => {
            log::error!("camera acquisition failed: {err}");
            Box::new(BlankCapture::new())
        }
    }
}

/// Zero-sized stand-in left behind by a failed acquisition.
pub struct BlankCapture {
    frame: CaptureFrame,
}

impl BlankCapture {
    pub fn new() -> Self {
        Self {
            frame: CaptureFrame::empty(),
        }
    }
}

impl Default for BlankCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureSource for BlankCapture {
    fn name(&self) -> &'static str {
        "blank"
    }

    fn grab(&mut self, _t: f32) -> &CaptureFrame {
        &self.frame
    }
}

/// A fixed image played back as if it were a camera.
pub struct StillCapture {
    frame: CaptureFrame,
}

impl StillCapture {
    pub fn open(path: &Path, width: usize, height: usize) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::ZeroSize);
        }
        let img = image::open(path).map_err(|e| CaptureError::Open {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let rgba = img
            .resize_exact(
                width as u32,
                height as u32,
                image::imageops::FilterType::Triangle,
            )
            .to_rgba8();
        let frame = CaptureFrame::from_rgba(width, height, rgba.into_raw()).ok_or_else(|| {
            CaptureError::Open {
                path: path.to_path_buf(),
                message: "decoded buffer has unexpected size".to_string(),
            }
        })?;
        Ok(Self { frame })
    }

    pub fn from_frame(frame: CaptureFrame) -> Self {
        Self { frame }
    }
}

impl CaptureSource for StillCapture {
    fn name(&self) -> &'static str {
        "still"
    }

    fn grab(&mut self, _t: f32) -> &CaptureFrame {
        &self.frame
    }
}

/// Procedural "webcam": a warm figure drifting over a cool backdrop.
pub struct SyntheticCapture {
    frame: CaptureFrame,
    last_t: Option<f32>,
}

impl SyntheticCapture {
    /// Frames are regenerated at most this often.
    const FRAME_INTERVAL_S: f32 = 1.0 / 30.0;

    pub fn new(width: usize, height: usize) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::ZeroSize);
        }
        Ok(Self {
            frame: CaptureFrame::new(width, height),
            last_t: None,
        })
    }

    fn paint(&mut self, t: f32) {
        let w = self.frame.width;
        let h = self.frame.height;
        let inv_w = 1.0 / w as f32;
        let inv_h = 1.0 / h as f32;

        // Head, then two "hands" orbiting it.
        let head = (0.5 + 0.06 * (t * 0.7).sin(), 0.45 + 0.04 * (t * 0.5).cos(), 0.22);
        let left = (0.22 + 0.05 * (t * 1.3).sin(), 0.78 + 0.06 * (t * 1.1).cos(), 0.10);
        let right = (0.78 + 0.05 * (t * 1.2).cos(), 0.76 + 0.06 * (t * 0.9).sin(), 0.10);
        let blobs = [head, left, right];

        for y in 0..h {
            let ny = y as f32 * inv_h;
            for x in 0..w {
                let nx = x as f32 * inv_w;
                let mut cover = 0.0f32;
                for &(bx, by, r) in &blobs {
                    let dx = nx - bx;
                    let dy = (ny - by) * 1.25;
                    let d2 = (dx * dx + dy * dy) / (r * r);
                    cover += (1.0 - d2).max(0.0);
                }
                let cover = cover.min(1.0);

                let bg_r = 20.0 + 50.0 * ny;
                let bg_g = 30.0 + 40.0 * nx;
                let bg_b = 70.0 + 90.0 * (1.0 - ny);
                let fg_r = 230.0;
                let fg_g = 180.0 + 30.0 * (t * 0.3 + nx * 3.0).sin();
                let fg_b = 150.0;

                let i = (y * w + x) * 4;
                self.frame.pixels[i] = lerp(bg_r, fg_r, cover) as u8;
                self.frame.pixels[i + 1] = lerp(bg_g, fg_g, cover) as u8;
                self.frame.pixels[i + 2] = lerp(bg_b, fg_b, cover) as u8;
                self.frame.pixels[i + 3] = 255;
            }
        }
    }
}

impl CaptureSource for SyntheticCapture {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn grab(&mut self, t: f32) -> &CaptureFrame {
        let stale = match self.last_t {
            Some(prev) => (t - prev).abs() >= Self::FRAME_INTERVAL_S,
            None => true,
        };
        if stale {
            self.paint(t);
            self.last_t = Some(t);
        }
        &self.frame
    }
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

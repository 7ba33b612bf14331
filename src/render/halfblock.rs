use crate::render::{text_frame_begin, text_frame_end, write_bg_rgb, write_fg_rgb, Frame, Renderer};
use std::io::Write;

/// Two canvas rows per cell: upper pixel in the foreground, lower in the background.
pub struct HalfBlockRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl HalfBlockRenderer {
    const UPPER_HALF: char = '\u{2580}';

    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows, w)) = text_frame_begin(frame, 1, 2, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        let px = frame.pixels_rgba;
        let rgb_at = |x: usize, y: usize| {
            let i = (y * w + x) * 4;
            (px[i], px[i + 1], px[i + 2])
        };

        for row in 0..rows {
            for x in 0..cols {
                let top = rgb_at(x, row * 2);
                let bottom = rgb_at(x, row * 2 + 1);
                if self.last_fg != Some(top) {
                    write_fg_rgb(out, top.0, top.1, top.2)?;
                    self.last_fg = Some(top);
                }
                if self.last_bg != Some(bottom) {
                    write_bg_rgb(out, bottom.0, bottom.1, bottom.2)?;
                    self.last_bg = Some(bottom);
                }
                write!(out, "{}", Self::UPPER_HALF)?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, rows, out)
    }
}

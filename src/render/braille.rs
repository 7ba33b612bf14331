use crate::render::{
    luma_u8, text_frame_begin, text_frame_end, write_bg_rgb, write_fg_rgb, Frame, Renderer,
};
use std::io::Write;

/// 2x4 canvas pixels per cell. Dots brighter than the cell's mid luma are
/// raised and take the mean color of the raised pixels; the rest set the
/// background.
pub struct BrailleRenderer {
    last_fg: Option<(u8, u8, u8)>,
    last_bg: Option<(u8, u8, u8)>,
}

impl BrailleRenderer {
    // Dot bit for (dx, dy), indexed dy * 2 + dx.
    const DOT_BITS: [u8; 8] = [0x01, 0x08, 0x02, 0x10, 0x04, 0x20, 0x40, 0x80];

    pub fn new() -> Self {
        Self {
            last_fg: None,
            last_bg: None,
        }
    }
}

impl Default for BrailleRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct ColorSum {
    r: u32,
    g: u32,
    b: u32,
    n: u32,
}

impl ColorSum {
    fn add(&mut self, (r, g, b): (u8, u8, u8)) {
        self.r += r as u32;
        self.g += g as u32;
        self.b += b as u32;
        self.n += 1;
    }

    fn mean(&self) -> Option<(u8, u8, u8)> {
        (self.n > 0).then(|| {
            (
                (self.r / self.n) as u8,
                (self.g / self.n) as u8,
                (self.b / self.n) as u8,
            )
        })
    }
}

impl Renderer for BrailleRenderer {
    fn name(&self) -> &'static str {
        "braille"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let Some((cols, rows, w)) = text_frame_begin(frame, 2, 4, out)? else {
            return Ok(());
        };
        self.last_fg = None;
        self.last_bg = None;

        let px = frame.pixels_rgba;
        for row in 0..rows {
            for col in 0..cols {
                let mut rgb = [(0u8, 0u8, 0u8); 8];
                let mut lum = [0u8; 8];
                for dy in 0..4 {
                    for dx in 0..2 {
                        let k = dy * 2 + dx;
                        let i = ((row * 4 + dy) * w + col * 2 + dx) * 4;
                        rgb[k] = (px[i], px[i + 1], px[i + 2]);
                        lum[k] = luma_u8(px[i], px[i + 1], px[i + 2]);
                    }
                }

                let lo = *lum.iter().min().unwrap_or(&0) as u16;
                let hi = *lum.iter().max().unwrap_or(&0) as u16;
                let threshold = ((lo + hi) / 2) as u8;

                let mut bits = 0u8;
                let mut on = ColorSum::default();
                let mut off = ColorSum::default();
                for k in 0..8 {
                    if lum[k] > threshold {
                        bits |= Self::DOT_BITS[k];
                        on.add(rgb[k]);
                    } else {
                        off.add(rgb[k]);
                    }
                }

                let bg = off.mean().unwrap_or((0, 0, 0));
                let (fg, ch) = if bits == 0 {
                    (bg, ' ')
                } else {
                    let fg = on.mean().unwrap_or(bg);
                    (fg, char::from_u32(0x2800 + bits as u32).unwrap_or(' '))
                };

                if self.last_fg != Some(fg) {
                    write_fg_rgb(out, fg.0, fg.1, fg.2)?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    write_bg_rgb(out, bg.0, bg.1, bg.2)?;
                    self.last_bg = Some(bg);
                }
                write!(out, "{ch}")?;
            }
            out.write_all(b"\r\n")?;
        }

        text_frame_end(frame, cols, rows, out)
    }
}

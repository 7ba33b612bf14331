use crate::font;
use crate::palette::Rgba;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Drawing-surface capability used by the painter.
///
/// Transforms and style (stroke, weight, fill) are saved by `push` and
/// restored by `pop`, in the manner of an immediate-mode sketching API.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    fn push(&mut self);
    fn pop(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn rotate(&mut self, radians: f32);
    fn scale(&mut self, s: f32);

    fn stroke(&mut self, color: Rgba);
    fn stroke_weight(&mut self, weight: f32);
    fn fill(&mut self, color: Rgba);

    /// Round dot of the current stroke weight.
    fn point(&mut self, x: f32, y: f32);
    /// Catmull-Rom segment from `pts[1]` to `pts[2]`, guided by the outer points.
    fn curve(&mut self, pts: [(f32, f32); 4]);
    /// Text in the fill color; `y` is the baseline.
    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, align: TextAlign);
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Affine {
    const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    #[inline]
    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.e += self.a * dx + self.c * dy;
        self.f += self.b * dx + self.d * dy;
    }

    fn rotate(&mut self, theta: f32) {
        let (s, c) = theta.sin_cos();
        let (a, b, cc, d) = (self.a, self.b, self.c, self.d);
        self.a = a * c + cc * s;
        self.b = b * c + d * s;
        self.c = -a * s + cc * c;
        self.d = -b * s + d * c;
    }

    fn scale(&mut self, s: f32) {
        self.a *= s;
        self.b *= s;
        self.c *= s;
        self.d *= s;
    }

    /// Uniform scale factor, used for stroke widths.
    fn linear_scale(&self) -> f32 {
        (self.a * self.d - self.b * self.c).abs().sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawState {
    transform: Affine,
    stroke: Rgba,
    weight: f32,
    fill: Rgba,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            stroke: Rgba::rgb(0.0, 0.0, 0.0),
            weight: 1.0,
            fill: Rgba::rgb(255.0, 255.0, 255.0),
        }
    }
}

/// Persistent RGBA8 raster. Marks accumulate; nothing erases it except
/// `resize` and an explicit `background`.
pub struct RasterCanvas {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
    state: DrawState,
    stack: Vec<DrawState>,
    // Per-mark coverage stamps so overlapping pieces of one mark blend once.
    stamp: Vec<u32>,
    generation: u32,
}

impl RasterCanvas {
    const CURVE_MAX_SEGMENTS: usize = 256;

    pub fn new(w: usize, h: usize) -> Self {
        let mut canvas = Self {
            w: 0,
            h: 0,
            pixels: Vec::new(),
            state: DrawState::default(),
            stack: Vec::new(),
            stamp: Vec::new(),
            generation: 0,
        };
        canvas.resize(w, h);
        canvas
    }

    /// Reallocate to `w`×`h`, cleared to black.
    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        let n = w.saturating_mul(h);
        self.pixels.clear();
        self.pixels.resize(n.saturating_mul(4), 0);
        self.stamp.clear();
        self.stamp.resize(n, 0);
        self.generation = 0;
        self.background(Rgba::rgb(0.0, 0.0, 0.0));
    }

    pub fn background(&mut self, color: Rgba) {
        let px = color.with_alpha(255.0).to_rgba8();
        for dst in self.pixels.chunks_exact_mut(4) {
            dst.copy_from_slice(&px);
        }
    }

    /// Drop any transforms and styles left on the stack; called per frame.
    pub fn reset_state(&mut self) {
        self.stack.clear();
        self.state = DrawState::default();
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.w + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    fn begin_mark(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            self.stamp.fill(0);
            self.generation = 1;
        }
        self.generation
    }

    #[inline]
    fn blend(&mut self, x: i32, y: i32, color: [u8; 4], mark: Option<u32>) {
        if x < 0 || y < 0 || x as usize >= self.w || y as usize >= self.h {
            return;
        }
        let p = y as usize * self.w + x as usize;
        if let Some(mark_id) = mark {
            if self.stamp[p] == mark_id {
                return;
            }
            self.stamp[p] = mark_id;
        }
        let a = color[3] as u32;
        if a == 0 {
            return;
        }
        let ia = 255 - a;
        let i = p * 4;
        for c in 0..3 {
            let dst = self.pixels[i + c] as u32;
            self.pixels[i + c] = ((color[c] as u32 * a + dst * ia + 127) / 255) as u8;
        }
        self.pixels[i + 3] = 255;
    }

    /// Cover the capsule of radius `r` around the segment (x0,y0)-(x1,y1).
    fn capsule(&mut self, x0: f32, y0: f32, x1: f32, y1: f32, r: f32, color: [u8; 4], mark_id: u32) {
        if r < 0.5 {
            // Sub-pixel width: one pixel per unit of length.
            let len = ((x1 - x0).hypot(y1 - y0)).ceil().max(1.0) as usize;
            for i in 0..=len {
                let t = i as f32 / len as f32;
                let x = x0 + (x1 - x0) * t;
                let y = y0 + (y1 - y0) * t;
                self.blend(x.floor() as i32, y.floor() as i32, color, Some(mark_id));
            }
            return;
        }

        let min_x = (x0.min(x1) - r).floor() as i32;
        let max_x = (x0.max(x1) + r).ceil() as i32;
        let min_y = (y0.min(y1) - r).floor() as i32;
        let max_y = (y0.max(y1) + r).ceil() as i32;
        let min_x = min_x.max(0);
        let min_y = min_y.max(0);
        let max_x = max_x.min(self.w as i32 - 1);
        let max_y = max_y.min(self.h as i32 - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        let dx = x1 - x0;
        let dy = y1 - y0;
        let len2 = dx * dx + dy * dy;
        let r2 = r * r;
        for py in min_y..=max_y {
            let cy = py as f32 + 0.5;
            for px in min_x..=max_x {
                let cx = px as f32 + 0.5;
                let t = if len2 > 0.0 {
                    (((cx - x0) * dx + (cy - y0) * dy) / len2).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let ex = cx - (x0 + dx * t);
                let ey = cy - (y0 + dy * t);
                if ex * ex + ey * ey <= r2 {
                    self.blend(px, py, color, Some(mark_id));
                }
            }
        }
    }

    fn device_radius(&self) -> Option<f32> {
        let r = self.state.weight * self.state.transform.linear_scale() * 0.5;
        (r > 0.0 && r.is_finite()).then_some(r)
    }
}

impl Surface for RasterCanvas {
    fn width(&self) -> usize {
        self.w
    }

    fn height(&self) -> usize {
        self.h
    }

    fn push(&mut self) {
        self.stack.push(self.state);
    }

    fn pop(&mut self) {
        match self.stack.pop() {
            Some(s) => self.state = s,
            None => log::warn!("canvas pop without matching push"),
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.transform.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f32) {
        self.state.transform.rotate(radians);
    }

    fn scale(&mut self, s: f32) {
        self.state.transform.scale(s);
    }

    fn stroke(&mut self, color: Rgba) {
        self.state.stroke = color;
    }

    fn stroke_weight(&mut self, weight: f32) {
        self.state.weight = weight;
    }

    fn fill(&mut self, color: Rgba) {
        self.state.fill = color;
    }

    fn point(&mut self, x: f32, y: f32) {
        let Some(r) = self.device_radius() else {
            return;
        };
        let (dx, dy) = self.state.transform.apply(x, y);
        let color = self.state.stroke.to_rgba8();
        let mark_id = self.begin_mark();
        self.capsule(dx, dy, dx, dy, r, color, mark_id);
    }

    fn curve(&mut self, pts: [(f32, f32); 4]) {
        let Some(r) = self.device_radius() else {
            return;
        };
        let xf = self.state.transform;
        let dev = pts.map(|(x, y)| xf.apply(x, y));
        let color = self.state.stroke.to_rgba8();

        let chord = (dev[2].0 - dev[1].0).hypot(dev[2].1 - dev[1].1);
        let guide = (dev[1].0 - dev[0].0).hypot(dev[1].1 - dev[0].1)
            + (dev[3].0 - dev[2].0).hypot(dev[3].1 - dev[2].1);
        let segments = ((chord + guide * 0.5) / 2.0)
            .ceil()
            .clamp(2.0, Self::CURVE_MAX_SEGMENTS as f32) as usize;

        let mark_id = self.begin_mark();
        let mut prev = catmull_rom(&dev, 0.0);
        for i in 1..=segments {
            let next = catmull_rom(&dev, i as f32 / segments as f32);
            self.capsule(prev.0, prev.1, next.0, next.1, r, color, mark_id);
            prev = next;
        }
    }

    fn text(&mut self, text: &str, x: f32, y: f32, size: f32, align: TextAlign) {
        let scale_f = size * self.state.transform.linear_scale() / font::GLYPH_H as f32;
        let scale = (scale_f.round() as i32).max(1);
        let (ax, ay) = self.state.transform.apply(x, y);
        let width = font::text_width(text, scale);
        let left = match align {
            TextAlign::Left => ax.round() as i32,
            TextAlign::Center => (ax - width as f32 / 2.0).round() as i32,
            TextAlign::Right => (ax - width as f32).round() as i32,
        };
        let top = ay.round() as i32 - font::GLYPH_H * scale;
        let color = self.state.fill.to_rgba8();

        let mut cursor = left;
        for ch in text.chars() {
            let rows = font::glyph(ch);
            for (ry, bits) in rows.iter().enumerate() {
                for rx in 0..font::GLYPH_W {
                    if bits & (1u8 << (font::GLYPH_W - 1 - rx)) == 0 {
                        continue;
                    }
                    let px = cursor + rx * scale;
                    let py = top + ry as i32 * scale;
                    for oy in 0..scale {
                        for ox in 0..scale {
                            self.blend(px + ox, py + oy, color, None);
                        }
                    }
                }
            }
            cursor += font::ADVANCE * scale;
        }
    }
}

/// Uniform Catmull-Rom between p[1] (t = 0) and p[2] (t = 1).
fn catmull_rom(p: &[(f32, f32); 4], t: f32) -> (f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let eval = |p0: f32, p1: f32, p2: f32, p3: f32| {
        0.5 * (2.0 * p1
            + (-p0 + p2) * t
            + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
            + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3)
    };
    (
        eval(p[0].0, p[1].0, p[2].0, p[3].0),
        eval(p[0].1, p[1].1, p[2].1, p[3].1),
    )
}

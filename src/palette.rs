//! Two-axis gradient mapping from (turbulence, luma) to stroke color.
//!
//! The first axis picks a dark/light pair by blending between the peaceful,
//! neutral and turbulent palettes; the second blends within that pair by
//! pixel luma. Blend factors are not clamped, so turbulence outside the
//! nominal range extrapolates past the palette endpoints.

/// RGBA color with channels on the 0..=255 scale. Channels may leave that
/// range after extrapolation; `to_rgba8` saturates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 255.0)
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }
}

/// Per-channel linear interpolation, alpha included.
pub fn lerp_color(from: Rgba, to: Rgba, amt: f32) -> Rgba {
    Rgba {
        r: from.r + (to.r - from.r) * amt,
        g: from.g + (to.g - from.g) * amt,
        b: from.b + (to.b - from.b) * amt,
        a: from.a + (to.a - from.a) * amt,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PalettePair {
    pub dark: Rgba,
    pub light: Rgba,
}

impl PalettePair {
    pub fn with_alpha(self, alpha: f32) -> Self {
        Self {
            dark: self.dark.with_alpha(alpha),
            light: self.light.with_alpha(alpha),
        }
    }

    pub fn lerp(self, to: PalettePair, amt: f32) -> Self {
        Self {
            dark: lerp_color(self.dark, to.dark, amt),
            light: lerp_color(self.light, to.light, amt),
        }
    }

    /// Color within the pair at luma 0..=255.
    pub fn at_luma(self, luma: f32) -> Rgba {
        lerp_color(self.dark, self.light, luma / 255.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub peaceful: PalettePair,
    pub neutral: PalettePair,
    pub turbulent: PalettePair,
}

pub const PEACEFUL: PalettePair = PalettePair {
    dark: Rgba::rgb(9.0, 13.0, 72.0),
    light: Rgba::rgb(225.0, 114.0, 55.0),
};

pub const NEUTRAL: PalettePair = PalettePair {
    dark: Rgba::rgb(81.0, 81.0, 107.0),
    light: Rgba::rgb(202.0, 156.0, 99.0),
};

pub const TURBULENT: PalettePair = PalettePair {
    dark: Rgba::rgb(27.0, 60.0, 90.0),
    light: Rgba::rgb(214.0, 103.0, 81.0),
};

pub const DEFAULT_PALETTE: Palette = Palette {
    peaceful: PEACEFUL,
    neutral: NEUTRAL,
    turbulent: TURBULENT,
};

/// At or below this turbulence the peaceful→neutral regime applies.
pub const REGIME_THRESHOLD: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteMapper {
    pub palette: Palette,
    pub clamp_blend: bool,
}

impl Default for PaletteMapper {
    fn default() -> Self {
        Self {
            palette: DEFAULT_PALETTE,
            clamp_blend: false,
        }
    }
}

impl PaletteMapper {
    pub fn new(clamp_blend: bool) -> Self {
        Self {
            clamp_blend,
            ..Self::default()
        }
    }

    /// Dark/light pair selected by turbulence, endpoints carrying `alpha`.
    ///
    /// The raw turbulence is used as the blend factor in both regimes, so
    /// the two regimes do not meet at the threshold.
    pub fn pair(&self, turbulence: f32, alpha: f32) -> PalettePair {
        let amt = if self.clamp_blend {
            turbulence.clamp(0.0, 1.0)
        } else {
            turbulence
        };
        let p = &self.palette;
        if turbulence <= REGIME_THRESHOLD {
            p.peaceful.with_alpha(alpha).lerp(p.neutral.with_alpha(alpha), amt)
        } else {
            p.neutral.with_alpha(alpha).lerp(p.turbulent.with_alpha(alpha), amt)
        }
    }

    pub fn map(&self, turbulence: f32, luma: f32, alpha: f32) -> Rgba {
        self.pair(turbulence, alpha).at_luma(luma)
    }
}

/// Stroke color for a pixel of the given luma under the default palette.
pub fn map_color(turbulence: f32, luma: f32, alpha: f32) -> Rgba {
    PaletteMapper::default().map(turbulence, luma, alpha)
}

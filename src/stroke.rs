use crate::palette::{PaletteMapper, Rgba};

/// Linear remap of `v` from [lo1, hi1] to [lo2, hi2], unclamped.
#[inline]
pub fn map_range(v: f32, lo1: f32, hi1: f32, lo2: f32, hi2: f32) -> f32 {
    lo2 + (hi2 - lo2) * ((v - lo1) / (hi1 - lo1))
}

/// Perceptual brightness, 0..=255.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

/// Above this turbulence strokes are curves, otherwise dots.
pub const CURVE_THRESHOLD: f32 = 0.2;
/// Chance that a stroke gets curvature tangents.
pub const TANGENT_CHANCE: f32 = 0.7;
pub const LENGTH_WINDOW: f32 = 30.0;
pub const THICKNESS_WINDOW: f32 = 2.0;
pub const DOT_WEIGHT_MUL: f32 = 3.0;
pub const MAX_ROTATION_DEG: f32 = 90.0;

/// Turbulence-derived midpoints shared by every stroke of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeParams {
    pub turbulence: f32,
    pub length_mid: f32,
    pub thickness_mid: f32,
    pub alpha: f32,
    /// Curve-density odds. Derived but not consumed anywhere.
    pub curve_odds: f32,
}

impl StrokeParams {
    pub fn from_turbulence(turbulence: f32) -> Self {
        Self {
            turbulence,
            length_mid: map_range(turbulence, 0.0, 1.0, 10.0, 100.0),
            thickness_mid: map_range(turbulence, 0.0, 1.0, 5.0, 35.0),
            alpha: map_range(-turbulence, -1.0, 0.0, 15.0, 70.0),
            curve_odds: map_range(turbulence, 0.0, 1.0, 150.0, 10_000.0),
        }
    }

    pub fn draws_curves(&self) -> bool {
        self.turbulence > CURVE_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StrokeShape {
    /// Curve through four control points, after rotating by `rotation_deg`.
    Curve { rotation_deg: f32 },
    Dot,
}

/// One painted mark, in the stroke's local frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec {
    pub length: f32,
    pub thickness: f32,
    pub tangent1: f32,
    pub tangent2: f32,
    pub alpha: f32,
    pub color: Rgba,
    pub shape: StrokeShape,
}

impl StrokeSpec {
    /// Draw length, thickness, curvature and shape for one sampled pixel.
    pub fn sample(
        params: &StrokeParams,
        luma: f32,
        mapper: &PaletteMapper,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let length = uniform(rng, params.length_mid - LENGTH_WINDOW, params.length_mid);
        let thickness = uniform(rng, params.thickness_mid - THICKNESS_WINDOW, params.thickness_mid);
        let color = mapper.map(params.turbulence, luma, params.alpha);

        let (mut tangent1, mut tangent2) = (0.0, 0.0);
        if rng.f32() < TANGENT_CHANCE {
            tangent1 = uniform(rng, -length, length);
            tangent2 = uniform(rng, -length, length);
        }

        let shape = if params.draws_curves() {
            StrokeShape::Curve {
                rotation_deg: uniform(rng, -MAX_ROTATION_DEG, MAX_ROTATION_DEG),
            }
        } else {
            StrokeShape::Dot
        };

        Self {
            length,
            thickness,
            tangent1,
            tangent2,
            alpha: params.alpha,
            color,
            shape,
        }
    }

    /// Control points of the curve, local frame, before rotation.
    pub fn control_points(&self) -> [(f32, f32); 4] {
        let half = self.length / 2.0;
        [
            (self.tangent1, -2.0 * half),
            (0.0, -half),
            (0.0, half),
            (self.tangent2, 2.0 * half),
        ]
    }

    pub fn weight(&self) -> f32 {
        match self.shape {
            StrokeShape::Curve { .. } => self.thickness,
            StrokeShape::Dot => self.thickness * DOT_WEIGHT_MUL,
        }
    }
}

/// Uniform in [lo, hi).
#[inline]
pub fn uniform(rng: &mut fastrand::Rng, lo: f32, hi: f32) -> f32 {
    lo + (hi - lo) * rng.f32()
}

use foundation::Rect;
use serde::{Deserialize, Serialize};

/// Where a layer is placed on the stage. Exactly one coordinate mode.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum EffectRect {
    /// Fractions of the stage size.
    Relative(Rect),
    /// Stage pixels.
    Absolute {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

impl Default for EffectRect {
    fn default() -> Self {
        EffectRect::Relative(Rect::FULL)
    }
}

impl EffectRect {
    /// The placement as fractions of a `stage_width` × `stage_height` stage.
    pub fn normalized(&self, stage_width: f64, stage_height: f64) -> Rect {
        match *self {
            EffectRect::Relative(r) => r,
            EffectRect::Absolute {
                x,
                y,
                width,
                height,
            } => {
                if stage_width <= 0.0 || stage_height <= 0.0 {
                    return Rect {
                        x: 0.0,
                        y: 0.0,
                        width: 0.0,
                        height: 0.0,
                    };
                }
                Rect {
                    x: x / stage_width,
                    y: y / stage_height,
                    width: width.max(0.0) / stage_width,
                    height: height.max(0.0) / stage_height,
                }
            }
        }
    }
}

pub const IDENTITY_COLOR_MATRIX: [[f64; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Per-layer rendering modifiers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Effects {
    /// In `[0, 1]`.
    pub opacity: f64,
    pub rect: EffectRect,
    pub color_offset: [f64; 4],
    pub color_matrix: [[f64; 4]; 4],
    /// Sub-texture to sample; only renderers that support it use it.
    pub texture_crop: Rect,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            rect: EffectRect::default(),
            color_offset: [0.0; 4],
            color_matrix: IDENTITY_COLOR_MATRIX,
            texture_crop: Rect::FULL,
        }
    }
}

impl Effects {
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }

    pub fn with_rect(mut self, rect: EffectRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() { 1.0 } else { opacity.clamp(0.0, 1.0) };
    }

    /// Layer placement in stage fractions.
    pub fn normalized_rect(&self, stage_width: f64, stage_height: f64) -> Rect {
        self.rect.normalized(stage_width, stage_height)
    }

    /// Layer size in stage pixels.
    pub fn pixel_size(&self, stage_width: f64, stage_height: f64) -> (f64, f64) {
        let r = self.normalized_rect(stage_width, stage_height);
        (r.width * stage_width, r.height * stage_height)
    }

    pub fn has_color_transform(&self) -> bool {
        self.color_offset != [0.0; 4] || self.color_matrix != IDENTITY_COLOR_MATRIX
    }
}

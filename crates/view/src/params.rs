use serde::{Deserialize, Serialize};

/// Camera parameters a control method can drive.
///
/// Each view decides what a unit of each parameter means. For a
/// rectilinear view `yaw`/`pitch`/`roll` are radians and `x`/`axisScaledX`
/// are fractions of the viewport scaled by the current field of view; for a
/// flat view `x`/`y` are fractions of the visible extent.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ControlParameter {
    X,
    Y,
    AxisScaledX,
    AxisScaledY,
    Zoom,
    Yaw,
    Pitch,
    Roll,
}

impl ControlParameter {
    pub const ALL: [ControlParameter; 8] = [
        ControlParameter::X,
        ControlParameter::Y,
        ControlParameter::AxisScaledX,
        ControlParameter::AxisScaledY,
        ControlParameter::Zoom,
        ControlParameter::Yaw,
        ControlParameter::Pitch,
        ControlParameter::Roll,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlParameter::X => "x",
            ControlParameter::Y => "y",
            ControlParameter::AxisScaledX => "axisScaledX",
            ControlParameter::AxisScaledY => "axisScaledY",
            ControlParameter::Zoom => "zoom",
            ControlParameter::Yaw => "yaw",
            ControlParameter::Pitch => "pitch",
            ControlParameter::Roll => "roll",
        }
    }
}

impl std::fmt::Display for ControlParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ControlParameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ControlParameter::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownParameter(pub String);

impl std::fmt::Display for UnknownParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown control parameter: {}", self.0)
    }
}

impl std::error::Error for UnknownParameter {}

/// One offset per [`ControlParameter`], accumulated over a tick.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct ControlParameters([f64; 8]);

impl ControlParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, p: ControlParameter) -> f64 {
        self.0[p.index()]
    }

    pub fn set(&mut self, p: ControlParameter, value: f64) {
        self.0[p.index()] = value;
    }

    pub fn add(&mut self, p: ControlParameter, delta: f64) {
        self.0[p.index()] += delta;
    }

    pub fn with(mut self, p: ControlParameter, value: f64) -> Self {
        self.set(p, value);
        self
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0.0)
    }

    pub fn reset(&mut self) {
        self.0 = [0.0; 8];
    }
}

use geometry::GeometryKind;
use render::LayerId;
use view::ViewKind;

#[derive(Debug, Clone, PartialEq)]
pub enum StageError {
    /// No renderer was registered for this pairing.
    NoRenderer { geometry: GeometryKind, view: ViewKind },
    /// The geometry cannot be viewed through this kind of view.
    ViewMismatch { geometry: GeometryKind, view: ViewKind },
    UnknownLayer(LayerId),
    /// A tween target of one view kind aimed at a layer with another.
    TargetMismatch { expected: ViewKind, found: ViewKind },
    InvalidLevel { level: u32, max: u32 },
    InvalidSize { width: f64, height: f64 },
    InvalidIndex { index: usize, len: usize },
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::NoRenderer { geometry, view } => {
                write!(f, "no renderer registered for {geometry} geometry with {view} view")
            }
            StageError::ViewMismatch { geometry, view } => {
                write!(f, "{geometry} geometry cannot be shown through a {view} view")
            }
            StageError::UnknownLayer(id) => write!(f, "unknown layer: {id}"),
            StageError::TargetMismatch { expected, found } => {
                write!(f, "cannot move a {expected} view to a {found} target")
            }
            StageError::InvalidLevel { level, max } => {
                write!(f, "level {level} does not exist (max level is {max})")
            }
            StageError::InvalidSize { width, height } => {
                write!(f, "invalid stage size {width}x{height}")
            }
            StageError::InvalidIndex { index, len } => {
                write!(f, "layer index {index} out of range for {len} layers")
            }
        }
    }
}

impl std::error::Error for StageError {}

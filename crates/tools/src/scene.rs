use std::path::{Path, PathBuf};

use controls::{ControlsError, Input};
use geometry::{GeometryDesc, GeometryError};
use serde::{Deserialize, Serialize};
use stage::{LayerOptions, StageConfig, StageError, ViewTarget};
use view::{FlatView, RectilinearView, View};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    Geometry(GeometryError),
    Stage(StageError),
    Controls(ControlsError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => write!(f, "read {}: {source}", path.display()),
            ConfigError::Parse(e) => write!(f, "invalid scene: {e}"),
            ConfigError::Geometry(e) => write!(f, "invalid geometry: {e}"),
            ConfigError::Stage(e) => write!(f, "stage setup failed: {e}"),
            ConfigError::Controls(e) => write!(f, "controls setup failed: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Geometry(e) => Some(e),
            ConfigError::Stage(e) => Some(e),
            ConfigError::Controls(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<GeometryError> for ConfigError {
    fn from(e: GeometryError) -> Self {
        ConfigError::Geometry(e)
    }
}

impl From<StageError> for ConfigError {
    fn from(e: StageError) -> Self {
        ConfigError::Stage(e)
    }
}

impl From<ControlsError> for ConfigError {
    fn from(e: ControlsError) -> Self {
        ConfigError::Controls(e)
    }
}

/// How the synthetic source answers loads.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceDesc {
    pub tile_width: u32,
    pub tile_height: u32,
    /// Frames between a load starting and its asset arriving.
    pub delay_frames: u32,
    pub failing_level: Option<u32>,
}

impl Default for SourceDesc {
    fn default() -> Self {
        Self {
            tile_width: 512,
            tile_height: 512,
            delay_frames: 2,
            failing_level: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Input(Input),
    LookTo { target: ViewTarget, duration: f64 },
    Resize { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    /// Seconds from the start of the run.
    pub at: f64,
    pub action: Action,
}

/// A single-layer scene and the input to replay against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub geometry: GeometryDesc,
    pub view: ViewTarget,
    #[serde(default)]
    pub stage: StageConfig,
    #[serde(default = "default_size")]
    pub size: [f64; 2],
    #[serde(default)]
    pub source: SourceDesc,
    #[serde(default)]
    pub layer: LayerOptions,
    #[serde(default = "default_true")]
    pub default_controls: bool,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

fn default_size() -> [f64; 2] {
    [800.0, 600.0]
}

fn default_true() -> bool {
    true
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn build_view(&self) -> View {
        match self.view {
            ViewTarget::Rectilinear(p) => View::from(RectilinearView::new(p)),
            ViewTarget::Flat(p) => View::from(FlatView::new(p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, ConfigError, Scene};
    use controls::Input;
    use geometry::GeometryDesc;
    use pretty_assertions::assert_eq;
    use stage::ViewTarget;

    #[test]
    fn bundled_scenes_parse() {
        let flat = Scene::from_json(include_str!("../scenes/flat.json")).unwrap();
        assert!(matches!(flat.geometry, GeometryDesc::Flat { ref levels } if levels.len() == 2));
        assert!(matches!(flat.view, ViewTarget::Flat(_)));
        assert_eq!(flat.size, [512.0, 512.0]);
        assert!(flat.layer.pin_first_level);

        let cube = Scene::from_json(include_str!("../scenes/cube.json")).unwrap();
        assert!(cube.stage.progressive);
        assert_eq!(cube.stage.max_concurrent_loads, 6);
        assert_eq!(
            cube.script[0].action,
            Action::Input(Input::KeyDown {
                key: "ArrowRight".to_string()
            })
        );
    }

    #[test]
    fn missing_fields_default() {
        let json = r#"{
            "geometry": {"type": "equirect", "levels": [{"width": 4096}]},
            "view": {"type": "rectilinear"}
        }"#;
        let scene = Scene::from_json(json).unwrap();
        assert_eq!(scene.size, [800.0, 600.0]);
        assert!(scene.default_controls);
        assert!(scene.script.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = Scene::from_json("{").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}

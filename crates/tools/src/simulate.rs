use foundation::Time;
use geometry::{GeometryKind, Tile};
use render::{LayerId, RecordingRenderer, RenderCommand, RenderLog};
use runtime::Frame;
use serde::Serialize;
use stage::{FrameReport, Stage, Viewer};
use streaming::{MemoryTextureFactory, SyntheticSource};
use view::ViewKind;

use crate::scene::{Action, ConfigError, Scene, ScriptStep};

/// One line of `pano simulate` output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameLine {
    pub frame: u64,
    pub time: f64,
    /// Whether the stage drew anything this frame.
    pub rendered: bool,
    pub draw_calls: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<FrameReport>,
}

/// A scene running headless against recording renderers.
pub struct Simulation {
    viewer: Viewer,
    layer: LayerId,
    log: RenderLog,
    script: Vec<ScriptStep>,
    next_step: usize,
}

impl Simulation {
    pub fn new(scene: &Scene) -> Result<Self, ConfigError> {
        let log = RenderLog::default();
        let mut stage = Stage::new(scene.stage);
        for (g, v) in [
            (GeometryKind::Cube, ViewKind::Rectilinear),
            (GeometryKind::Equirect, ViewKind::Rectilinear),
            (GeometryKind::Flat, ViewKind::Flat),
        ] {
            let log = log.clone();
            stage.register_renderer(g, v, move || Box::new(RecordingRenderer::new(log.clone())));
        }

        let mut source = SyntheticSource::new(
            scene.source.tile_width,
            scene.source.tile_height,
            scene.source.delay_frames,
        );
        if let Some(z) = scene.source.failing_level {
            source = source.with_failing_level(z);
        }
        let layer = stage.create_layer(
            scene.geometry.build()?,
            scene.build_view(),
            Box::new(source),
            Box::new(MemoryTextureFactory::new()),
            scene.layer,
        )?;

        let mut viewer = if scene.default_controls {
            Viewer::with_default_controls(stage)?
        } else {
            Viewer::new(stage)
        };
        let [width, height] = scene.size;
        viewer.set_size(width, height)?;

        let mut script = scene.script.clone();
        script.sort_by(|a, b| a.at.total_cmp(&b.at));
        Ok(Self {
            viewer,
            layer,
            log,
            script,
            next_step: 0,
        })
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    /// Tiles the initial view needs, before anything has loaded.
    pub fn initial_tiles(&mut self) -> Vec<Tile> {
        let report = self.viewer.stage_mut().render(Time::ZERO);
        self.log.take();
        report
            .layers
            .into_iter()
            .find(|l| l.layer == self.layer)
            .map(|l| l.visible)
            .unwrap_or_default()
    }

    /// Applies the script steps that are due, then ticks the viewer.
    pub fn step(&mut self, frame: Frame) -> Result<FrameLine, ConfigError> {
        while let Some(step) = self.script.get(self.next_step) {
            if step.at > frame.time.seconds() {
                break;
            }
            tracing::debug!(at = step.at, action = ?step.action, "script step");
            match &step.action {
                Action::Input(input) => self.viewer.handle_input(input, frame.time),
                Action::LookTo { target, duration } => {
                    self.viewer.look_to(self.layer, *target, *duration)?
                }
                Action::Resize { width, height } => self.viewer.set_size(*width, *height)?,
            }
            self.next_step += 1;
        }

        let report = self.viewer.tick(frame.time);
        let draw_calls = self
            .log
            .take()
            .iter()
            .filter(|c| matches!(c, RenderCommand::RenderTile { .. }))
            .count();
        Ok(FrameLine {
            frame: frame.index,
            time: frame.time.seconds(),
            rendered: report.is_some(),
            draw_calls,
            report,
        })
    }

    /// Runs `frames` fixed steps of `dt_s` seconds.
    pub fn run(&mut self, frames: u64, dt_s: f64) -> Result<Vec<FrameLine>, ConfigError> {
        Frame::sequence(dt_s)
            .take(usize::try_from(frames).unwrap_or(usize::MAX))
            .map(|frame| self.step(frame))
            .collect()
    }
}

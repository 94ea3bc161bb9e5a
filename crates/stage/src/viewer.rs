use controls::{
    Controls, ControlsError, ControlsEvent, DEFAULT_QTVR_SPEED, DEFAULT_ZOOM_DELTA,
    DragControlMethod, Input, KeyControlMethod, PinchZoomControlMethod, QtvrControlMethod,
    ScrollZoomControlMethod,
};
use foundation::util::{ease_in_out_quad, tween, wrap_angle};
use foundation::{Time, TimeSpan};
use render::LayerId;
use serde::{Deserialize, Serialize};
use view::{ControlParameter, FlatParams, RectilinearParams, View, ViewKind};

use crate::error::StageError;
use crate::stage::{FrameReport, Stage};

pub const DEFAULT_KEY_VELOCITY: f64 = 0.7;
pub const DEFAULT_KEY_FRICTION: f64 = 0.95;

/// Where `look_to` should take a view. Only the camera parameters are
/// used; the viewport size is left alone.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ViewTarget {
    Rectilinear(RectilinearParams),
    Flat(FlatParams),
}

impl ViewTarget {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewTarget::Rectilinear(_) => ViewKind::Rectilinear,
            ViewTarget::Flat(_) => ViewKind::Flat,
        }
    }

    fn of(view: &View) -> Self {
        match view {
            View::Rectilinear(v) => ViewTarget::Rectilinear(v.params()),
            View::Flat(v) => ViewTarget::Flat(v.params()),
        }
    }
}

#[derive(Debug)]
struct Tween {
    layer: LayerId,
    to: ViewTarget,
    duration_s: f64,
    /// Starting point and timing, fixed on the first tick after `look_to`.
    running: Option<(ViewTarget, TimeSpan)>,
}

/// Drives a [`Stage`] from user input: each tick feeds the controls into
/// every layer's view, advances any tween and renders if needed.
#[derive(Debug)]
pub struct Viewer {
    stage: Stage,
    controls: Controls,
    tween: Option<Tween>,
}

impl Viewer {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            controls: Controls::new(),
            tween: None,
        }
    }

    pub fn with_default_controls(stage: Stage) -> Result<Self, ControlsError> {
        let mut viewer = Self::new(stage);
        viewer.register_default_controls()?;
        Ok(viewer)
    }

    /// Pointer drag, scroll and pinch zoom, arrow keys and `+`/`-`.
    /// QTVR-style dragging is registered disabled.
    pub fn register_default_controls(&mut self) -> Result<(), ControlsError> {
        let c = &mut self.controls;
        c.register_method("drag", Box::new(DragControlMethod::default()), true)?;
        c.register_method("qtvr", Box::new(QtvrControlMethod::new(DEFAULT_QTVR_SPEED)), false)?;
        let scroll = ScrollZoomControlMethod::new(DEFAULT_ZOOM_DELTA);
        c.register_method("scroll-zoom", Box::new(scroll), true)?;
        c.register_method("pinch-zoom", Box::new(PinchZoomControlMethod::new()), true)?;

        let v = DEFAULT_KEY_VELOCITY;
        let keys = [
            ("key-left", "ArrowLeft", ControlParameter::X, -v),
            ("key-right", "ArrowRight", ControlParameter::X, v),
            ("key-up", "ArrowUp", ControlParameter::Y, -v),
            ("key-down", "ArrowDown", ControlParameter::Y, v),
            ("key-zoom-in", "+", ControlParameter::Zoom, -v),
            ("key-zoom-out", "-", ControlParameter::Zoom, v),
        ];
        for (id, key, parameter, velocity) in keys {
            let method = KeyControlMethod::new(key, parameter, velocity, DEFAULT_KEY_FRICTION);
            c.register_method(id, Box::new(method), true)?;
        }
        c.add_method_group("pointer", &["drag", "qtvr"])?;
        c.add_method_group("keys", &keys.map(|(id, ..)| id))?;
        c.add_method_group("zoom", &["scroll-zoom", "pinch-zoom", "key-zoom-in", "key-zoom-out"])?;
        Ok(())
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    pub fn controls(&self) -> &Controls {
        &self.controls
    }

    pub fn controls_mut(&mut self) -> &mut Controls {
        &mut self.controls
    }

    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), StageError> {
        self.stage.set_size(width, height)?;
        self.controls.set_element_size(width, height);
        Ok(())
    }

    pub fn handle_input(&mut self, input: &Input, now: Time) {
        self.controls.handle_input(input, now);
    }

    /// Animates `layer`'s view to `target` over `duration_s` seconds.
    /// Replaces any running tween; user interaction cancels it.
    pub fn look_to(
        &mut self,
        layer: LayerId,
        target: ViewTarget,
        duration_s: f64,
    ) -> Result<(), StageError> {
        let found = self.stage.layer(layer).ok_or(StageError::UnknownLayer(layer))?;
        let expected = found.view().kind();
        if expected != target.kind() {
            return Err(StageError::TargetMismatch {
                expected,
                found: target.kind(),
            });
        }
        self.tween = Some(Tween {
            layer,
            to: target,
            duration_s: duration_s.max(0.0),
            running: None,
        });
        Ok(())
    }

    pub fn is_tweening(&self) -> bool {
        self.tween.is_some()
    }

    pub fn cancel_tween(&mut self) {
        self.tween = None;
    }

    /// Advances one frame. Returns a report when a frame was rendered.
    pub fn tick(&mut self, now: Time) -> Option<FrameReport> {
        let params = self.controls.tick(now);
        let interrupted = self
            .controls
            .drain_events()
            .into_iter()
            .any(|e| e == ControlsEvent::Active);
        if interrupted && self.tween.take().is_some() {
            tracing::debug!("tween interrupted by user input");
        }
        if !params.is_zero() {
            for layer in self.stage.layers_mut() {
                layer.view_mut().update_with_control_parameters(&params);
            }
        }
        self.step_tween(now);

        if self.stage.is_invalid() {
            Some(self.stage.render(now))
        } else {
            None
        }
    }

    fn step_tween(&mut self, now: Time) {
        let Some(mut active) = self.tween.take() else {
            return;
        };
        let Some(layer) = self.stage.layer_mut(active.layer) else {
            return;
        };
        let view = layer.view_mut();
        let current = ViewTarget::of(view);
        let (from, span) = *active
            .running
            .get_or_insert((current, TimeSpan::new(now, active.duration_s)));
        let progress = span.progress(now);
        let eased = ease_in_out_quad(progress);

        match (view, &from, &active.to) {
            (View::Rectilinear(v), ViewTarget::Rectilinear(a), ViewTarget::Rectilinear(b)) => {
                let mut p = v.params();
                p.yaw = a.yaw + wrap_angle(b.yaw - a.yaw) * eased;
                p.pitch = tween(a.pitch, b.pitch, eased);
                p.roll = tween(a.roll, b.roll, eased);
                p.fov = tween(a.fov, b.fov, eased);
                v.set_parameters(p);
            }
            (View::Flat(v), ViewTarget::Flat(a), ViewTarget::Flat(b)) => {
                let mut p = v.params();
                p.x = tween(a.x, b.x, eased);
                p.y = tween(a.y, b.y, eased);
                p.zoom = tween(a.zoom, b.zoom, eased);
                v.set_parameters(p);
            }
            _ => return,
        }
        if progress < 1.0 {
            self.tween = Some(active);
        }
    }
}

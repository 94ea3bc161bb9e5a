use controls::{Input, VelocityControlMethod};
use foundation::Time;
use geometry::{CubeGeometry, CubeLevelDesc, Geometry, GeometryKind};
use render::{LayerId, RecordingRenderer, RenderLog};
use stage::{LayerOptions, Stage, StageConfig, ViewTarget, Viewer};
use streaming::{MemoryTextureFactory, SyntheticSource};
use view::{ControlParameter, RectilinearParams, RectilinearView, View, ViewKind};

fn assert_close(a: f64, b: f64, eps: f64) {
    assert!((a - b).abs() <= eps, "{a} vs {b} (eps {eps})");
}

fn cube_viewer() -> (Viewer, LayerId) {
    let mut stage = Stage::new(StageConfig::default());
    let log = RenderLog::default();
    stage.register_renderer(GeometryKind::Cube, ViewKind::Rectilinear, move || {
        Box::new(RecordingRenderer::new(log.clone()))
    });
    let geometry = Geometry::Cube(
        CubeGeometry::new(&[
            CubeLevelDesc {
                tile_size: 256,
                size: 256,
                fallback_only: false,
            },
            CubeLevelDesc {
                tile_size: 256,
                size: 1024,
                fallback_only: false,
            },
        ])
        .unwrap(),
    );
    let layer = stage
        .create_layer(
            geometry,
            View::from(RectilinearView::default()),
            Box::new(SyntheticSource::new(256, 256, 2)),
            Box::new(MemoryTextureFactory::new()),
            LayerOptions::default(),
        )
        .unwrap();
    let mut viewer = Viewer::new(stage);
    viewer.set_size(800.0, 600.0).unwrap();
    (viewer, layer)
}

fn yaw(viewer: &Viewer, layer: LayerId) -> f64 {
    viewer
        .stage()
        .layer(layer)
        .unwrap()
        .view()
        .as_rectilinear()
        .unwrap()
        .yaw()
}

#[test]
fn velocity_control_turns_every_layer_view() {
    let (mut viewer, layer) = cube_viewer();
    let (method, handle) = VelocityControlMethod::new(ControlParameter::Yaw);
    viewer
        .controls_mut()
        .register_method("spin", Box::new(method), true)
        .unwrap();

    viewer.tick(Time(0.0));
    handle.set_velocity(0.5);
    viewer.tick(Time(0.0));
    for i in 1..=4 {
        let report = viewer.tick(Time(f64::from(i) * 0.25));
        assert!(report.is_some(), "a turning view renders every tick");
    }
    assert_close(yaw(&viewer, layer), 0.5, 1e-9);
    assert!(viewer.controls().is_active());

    handle.set_velocity(0.0);
    viewer.tick(Time(1.25));
    let settled = yaw(&viewer, layer);
    viewer.tick(Time(1.5));
    assert_close(yaw(&viewer, layer), settled, 1e-12);
    assert!(!viewer.controls().is_active());
}

#[test]
fn user_input_interrupts_a_tween() {
    let (mut viewer, layer) = cube_viewer();
    viewer.register_default_controls().unwrap();
    let target = RectilinearParams {
        yaw: 1.0,
        ..RectilinearParams::default()
    };
    viewer.look_to(layer, ViewTarget::Rectilinear(target), 1.0).unwrap();
    viewer.tick(Time(0.0));
    viewer.tick(Time(0.25));
    assert!(viewer.is_tweening());

    viewer.handle_input(
        &Input::KeyDown {
            key: "ArrowLeft".to_string(),
        },
        Time(0.3),
    );
    viewer.tick(Time(0.3));
    assert!(!viewer.is_tweening());
    assert!(yaw(&viewer, layer) < 1.0);
}

#[test]
fn loads_for_tiles_that_leave_the_view_are_cancelled() {
    let (mut viewer, layer) = cube_viewer();
    viewer.tick(Time(0.0));
    let loading = viewer.stage().layer(layer).unwrap().store().loading_count();
    assert!(loading > 0);
    viewer.stage_mut().drain_events();

    // Turn around before anything arrives.
    viewer
        .stage_mut()
        .layer_mut(layer)
        .unwrap()
        .view_mut()
        .as_rectilinear_mut()
        .unwrap()
        .set_yaw(std::f64::consts::PI);
    viewer.tick(Time(0.1));

    let cancelled = viewer
        .stage_mut()
        .drain_events()
        .into_iter()
        .filter(|t| {
            matches!(
                t.event,
                stage::StageEvent::Store {
                    event: streaming::StoreEvent::Cancelled(_),
                    ..
                }
            )
        })
        .count();
    assert!(cancelled > 0);
}

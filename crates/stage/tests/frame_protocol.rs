use foundation::{Rect, Time};
use geometry::{FlatGeometry, FlatLevelDesc, Geometry, GeometryKind, Tile};
use pretty_assertions::assert_eq;
use render::{EffectRect, Effects, LayerId, RecordingRenderer, RenderCommand, RenderLog};
use stage::{LayerOptions, Stage, StageConfig, StageError};
use streaming::{MemoryTextureFactory, SyntheticSource};
use view::{FlatParams, FlatView, View, ViewKind};

fn level(width: u32, height: u32, tile: u32) -> FlatLevelDesc {
    FlatLevelDesc {
        width,
        height,
        tile_width: tile,
        tile_height: tile,
        fallback_only: false,
    }
}

fn recording_stage(config: StageConfig, log: &RenderLog) -> Stage {
    let mut stage = Stage::new(config);
    let log = log.clone();
    stage.register_renderer(GeometryKind::Flat, ViewKind::Flat, move || {
        Box::new(RecordingRenderer::new(log.clone()))
    });
    stage
}

fn add_flat(
    stage: &mut Stage,
    levels: &[FlatLevelDesc],
    view: FlatView,
    source: SyntheticSource,
    options: LayerOptions,
) -> LayerId {
    let geometry = Geometry::Flat(FlatGeometry::new(levels).unwrap());
    stage
        .create_layer(
            geometry,
            View::from(view),
            Box::new(source),
            Box::new(MemoryTextureFactory::new()),
            options,
        )
        .unwrap()
}

#[test]
fn top_left_quadrant_draws_only_the_top_left_tile() {
    let log = RenderLog::default();
    let mut stage = recording_stage(StageConfig::default(), &log);
    let view = FlatView::new(FlatParams {
        x: 0.25,
        y: 0.25,
        zoom: 0.5,
        ..FlatParams::default()
    });
    let layer = add_flat(
        &mut stage,
        &[level(1000, 1000, 500)],
        view,
        SyntheticSource::new(500, 500, 0),
        LayerOptions::default(),
    );
    stage.set_size(500.0, 500.0).unwrap();

    let report = stage.render(Time::ZERO);
    let geometry = stage.layer(layer).unwrap().geometry().id();
    let top_left = Tile::grid(geometry, 0, 0, 0);
    assert_eq!(report.layers[0].visible, vec![top_left]);
    assert_eq!(report.layers[0].rendered, vec![top_left]);
    assert!(report.stable);
    assert_eq!(log.tiles_for(layer), vec![top_left]);
}

#[test]
fn every_layer_is_bracketed_in_stack_order() {
    let log = RenderLog::default();
    let mut stage = recording_stage(StageConfig::default(), &log);
    let bottom = add_flat(
        &mut stage,
        &[level(512, 512, 256)],
        FlatView::default(),
        SyntheticSource::new(256, 256, 0),
        LayerOptions::default(),
    );
    let half = Rect::new(0.5, 0.0, 0.5, 1.0);
    let top = add_flat(
        &mut stage,
        &[level(512, 512, 256)],
        FlatView::default(),
        SyntheticSource::new(256, 256, 0),
        LayerOptions {
            effects: Effects::default().with_rect(EffectRect::Relative(half)),
            ..LayerOptions::default()
        },
    );
    stage.set_size(512.0, 512.0).unwrap();
    stage.render(Time::ZERO);

    let commands = log.commands();
    assert_eq!(
        commands.first(),
        Some(&RenderCommand::StartLayer {
            layer: bottom,
            rect: Rect::FULL
        })
    );
    assert_eq!(
        commands.last(),
        Some(&RenderCommand::EndLayer { layer: top, rect: half })
    );

    let mut last: Option<Tile> = None;
    let mut open = None;
    for command in &commands {
        match *command {
            RenderCommand::StartLayer { layer, .. } => {
                assert_eq!(open, None);
                open = Some(layer);
                last = None;
            }
            RenderCommand::RenderTile { layer, tile, layer_z, .. } => {
                assert_eq!(open, Some(layer));
                assert_eq!(layer_z, if layer == bottom { 0 } else { 1 });
                assert!(last.is_none_or(|l| l < tile));
                last = Some(tile);
            }
            RenderCommand::EndLayer { layer, .. } => {
                assert_eq!(open, Some(layer));
                open = None;
            }
        }
    }
    assert_eq!(log.tiles_for(bottom).len(), 4);
    // The top layer is half as wide, so it sees only the middle of the image.
    assert!(!log.tiles_for(top).is_empty());
}

#[test]
fn missing_tiles_fall_back_to_the_loaded_parent() {
    let log = RenderLog::default();
    let mut stage = recording_stage(StageConfig::default(), &log);
    let layer = add_flat(
        &mut stage,
        &[level(256, 256, 256), level(512, 512, 256)],
        FlatView::default(),
        SyntheticSource::new(256, 256, 1).with_failing_level(1),
        LayerOptions {
            pin_first_level: true,
            ..LayerOptions::default()
        },
    );
    stage.set_size(512.0, 512.0).unwrap();

    let first = stage.render(Time(0.0));
    assert_eq!(first.layers[0].level, Some(1));
    assert_eq!(first.layers[0].visible.len(), 4);
    assert!(first.layers[0].rendered.is_empty());
    assert!(!first.stable);
    assert!(stage.is_invalid());

    let second = stage.render(Time(0.1));
    let root = Tile::grid(stage.layer(layer).unwrap().geometry().id(), 0, 0, 0);
    assert_eq!(second.layers[0].rendered, vec![root]);
    assert_eq!(second.layers[0].missing, 4);
    assert_eq!(second.layers[0].fallbacks, 1);
    assert!(!second.stable);
}

#[test]
fn progressive_mode_loads_ancestors_too() {
    let log = RenderLog::default();
    let config = StageConfig {
        progressive: true,
        ..StageConfig::default()
    };
    let mut stage = recording_stage(config, &log);
    let layer = add_flat(
        &mut stage,
        &[level(256, 256, 256), level(512, 512, 256)],
        FlatView::default(),
        SyntheticSource::new(256, 256, 0),
        LayerOptions::default(),
    );
    stage.set_size(512.0, 512.0).unwrap();
    stage.render(Time::ZERO);

    let l = stage.layer(layer).unwrap();
    let root = Tile::grid(l.geometry().id(), 0, 0, 0);
    assert!(l.store().query(&root).visible);
    // Coarser levels are loaded first.
    assert!(l.store().has_texture(&root));
}

#[test]
fn pairing_without_a_renderer_is_rejected_up_front() {
    let mut stage = Stage::default();
    let err = stage
        .create_layer(
            Geometry::Flat(FlatGeometry::new(&[level(512, 512, 256)]).unwrap()),
            View::from(FlatView::default()),
            Box::new(SyntheticSource::new(256, 256, 0)),
            Box::new(MemoryTextureFactory::new()),
            LayerOptions::default(),
        )
        .unwrap_err();
    assert_eq!(
        err,
        StageError::NoRenderer {
            geometry: GeometryKind::Flat,
            view: ViewKind::Flat
        }
    );
    assert_eq!(stage.layers().count(), 0);
}

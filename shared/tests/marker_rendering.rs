mod common;

use common::{open_ready_map, record, Tester};
use shared::capabilities::{MapOperation, MapResponse};
use shared::{Effect, Event, LocationRecord, Model, ScreenKind};

fn records(n: usize) -> Vec<LocationRecord> {
    (0..n)
        .map(|i| {
            let offset = f64::from(u32::try_from(i).unwrap()) * 1e-4;
            record(&format!("p{i}"), 37.5 + offset, 127.0, "서울특별시", "중구", "")
        })
        .collect()
}

fn map_operations(effects: &[Effect]) -> Vec<MapOperation> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::MapWidget(request) => Some(request.operation.clone()),
            _ => None,
        })
        .collect()
}

/// Ack every draw request until the renderer stops asking. Returns the
/// number of features drawn per batch.
fn drain_draws(app: &Tester, model: &mut Model, effects: Vec<Effect>) -> Vec<usize> {
    let mut drawn = Vec::new();
    let mut pending: Vec<Effect> = effects;

    while let Some(mut request) = pending.into_iter().find_map(|e| match e {
        Effect::MapWidget(request) if matches!(request.operation, MapOperation::DrawMarkers { .. }) => {
            Some(request)
        }
        _ => None,
    }) {
        if let MapOperation::DrawMarkers { features, .. } = &request.operation {
            drawn.push(features.features.len());
        }
        let acked = app.resolve(&mut request, MapResponse::FrameYielded).expect("draw resolves");
        pending = acked
            .events
            .into_iter()
            .flat_map(|event| app.update(event, model).effects)
            .collect();
    }
    drawn
}

fn deliver(app: &Tester, model: &mut Model, records: Vec<LocationRecord>) -> Vec<Effect> {
    let token = model.screen.last_search.expect("search in flight");
    app.update(
        Event::RecordsFetched {
            token,
            result: Ok(records),
        },
        model,
    )
    .effects
}

#[test]
fn test_markers_are_drawn_in_batches() {
    let app = Tester::default();
    let mut model = Model::default();
    open_ready_map(&app, &mut model, ScreenKind::Places);

    let effects = deliver(&app, &mut model, records(120));
    let operations = map_operations(&effects);
    assert!(matches!(operations.first(), Some(MapOperation::ClearMarkers { .. })));
    assert!(matches!(
        operations.get(1),
        Some(MapOperation::DrawMarkers {
            batch_index: 0,
            batch_count: 3,
            ..
        })
    ));

    let drawn = drain_draws(&app, &mut model, effects);
    assert_eq!(drawn, vec![50, 50, 20]);
}

#[test]
fn test_identical_results_are_not_redrawn() {
    let app = Tester::default();
    let mut model = Model::default();
    open_ready_map(&app, &mut model, ScreenKind::Places);

    let effects = deliver(&app, &mut model, records(10));
    drain_draws(&app, &mut model, effects);

    app.update(Event::RetryRequested, &mut model);
    let effects = deliver(&app, &mut model, records(10));
    assert!(map_operations(&effects).is_empty());
}

#[test]
fn test_superseded_render_stops_drawing() {
    let app = Tester::default();
    let mut model = Model::default();
    open_ready_map(&app, &mut model, ScreenKind::Places);

    let first = deliver(&app, &mut model, records(120));
    let mut first_draw = first
        .into_iter()
        .find_map(|e| match e {
            Effect::MapWidget(request) if matches!(request.operation, MapOperation::DrawMarkers { .. }) => {
                Some(request)
            }
            _ => None,
        })
        .expect("first batch");

    // A filter change replaces the marker set before the first frame is acked.
    let second = app.update(
        Event::CategorySelected {
            category: Some("카페".into()),
        },
        &mut model,
    );
    assert!(matches!(
        map_operations(&second.effects).first(),
        Some(MapOperation::ClearMarkers { .. })
    ));

    let acked = app
        .resolve(&mut first_draw, MapResponse::FrameYielded)
        .expect("draw resolves");
    for event in acked.events {
        let update = app.update(event, &mut model);
        assert!(map_operations(&update.effects).is_empty());
    }
}

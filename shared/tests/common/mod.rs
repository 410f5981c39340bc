#![allow(dead_code)]

use crux_core::testing::AppTester;
use shared::capabilities::{MapOperation, MapResponse, TimerElapsed, TimerOperation};
use shared::model::MapAvailability;
use shared::{App, Effect, Event, LatLng, LocationRecord, Model, ScreenKind};

pub type Tester = AppTester<App, Effect>;

/// Open a screen and let the widget report that it loaded.
pub fn open_ready_map(app: &Tester, model: &mut Model, screen: ScreenKind) {
    let update = app.update(Event::ScreenOpened { screen }, model);
    let mut create = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::MapWidget(request) => Some(request),
            _ => None,
        })
        .expect("map widget create request");
    assert!(matches!(create.operation, MapOperation::Create { .. }));

    let loaded = app.resolve(&mut create, MapResponse::Ready).expect("create resolves");
    for event in loaded.events {
        app.update(event, model);
    }
    assert_eq!(model.map, MapAvailability::Ready);
}

/// Report an idle at `center` and run the debounce timer to completion.
/// Returns the effects of handling the debounced idle.
pub fn settle(app: &Tester, model: &mut Model, center: LatLng, native_zoom: f64) -> Vec<Effect> {
    let update = app.update(
        Event::MapIdle {
            center,
            native_zoom,
            bounds: None,
        },
        model,
    );
    let mut timer = update
        .effects
        .into_iter()
        .find_map(|e| match e {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .expect("debounce timer");
    let TimerOperation::Start { id, .. } = timer.operation;

    let elapsed = app.resolve(&mut timer, TimerElapsed { id }).expect("timer resolves");
    elapsed
        .events
        .into_iter()
        .flat_map(|event| app.update(event, model).effects)
        .collect()
}

pub fn http_count(effects: &[Effect]) -> usize {
    effects.iter().filter(|e| matches!(e, Effect::Http(_))).count()
}

pub fn move_targets(effects: &[Effect]) -> Vec<(LatLng, u8)> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::MapWidget(request) => match &request.operation {
                MapOperation::MoveTo { center, native_zoom } => Some((*center, *native_zoom)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

pub fn record(id: &str, lat: f64, lng: f64, province: &str, city: &str, district: &str) -> LocationRecord {
    LocationRecord::new(id, Some(LatLng::new(lat, lng))).in_region(province, city, district)
}

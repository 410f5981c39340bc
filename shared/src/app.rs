use serde_json::Value;
use tracing::{debug, info, info_span, warn};

use crate::capabilities::{http, ApiBase, Capabilities, GeolocationError, GeolocationResult};
use crate::event::Event;
use crate::fetch::{FetchFailure, FetchToken, GeocodeResult};
use crate::model::{
    nationwide_target, LocationRecord, MapAvailability, MapScreen, Model, RouteSummary,
    ShellPrompt, StatusKind, ViewModel,
};
use crate::region::{Completion, RegionSelector, Resolution, ResolvedView};
use crate::viewport::{GestureKind, IdleTicket, SettleOutcome, SettledView, UserNavigation, ViewTarget};
use crate::{proximity, zoom, AppError, Bounds, LatLng, MapConfig};

#[derive(Default)]
pub struct App;

impl App {
    fn api_base(model: &Model) -> Result<ApiBase, AppError> {
        ApiBase::parse(&model.config.api_base_url).map_err(AppError::from)
    }

    // --- Lifecycle ---

    fn configure(config: MapConfig, model: &mut Model) {
        match config.validate() {
            Ok(()) => {
                model.screen.reconfigure(&config);
                model.config = config;
                info!(api = %model.config.api_base_url, "configuration applied");
            }
            Err(e) => {
                warn!(error = %e, "rejected configuration");
                model.report(e.into());
            }
        }
    }

    fn open_screen(model: &mut Model, caps: &Capabilities, kind: crate::ScreenKind) {
        model.screen = MapScreen::replacing(&model.screen, kind, &model.config);
        model.map = MapAvailability::Loading;
        model.status = None;
        model.active_error = None;
        model.prompt = None;
        info!(session = %model.screen.session_id, "map screen opened");

        let command = model.screen.view.request_move(nationwide_target());
        caps.map_widget.create(command, Event::MapWidgetLoaded);

        Self::request_position(model, caps);
        Self::send_search(model, caps);
        Self::recompute_visible(model, caps);
    }

    fn on_map_loaded(model: &mut Model, caps: &Capabilities, response: crate::capabilities::MapResponse) {
        match response.into_result() {
            Ok(()) => {
                model.map = MapAvailability::Ready;
                // A move requested while the widget was loading has not been sent yet.
                if let Some(command) = model.screen.view.pending_command() {
                    caps.map_widget.move_to(command);
                }
                model.screen.markers.invalidate();
                Self::render_markers(model, caps);
            }
            Err(e) => {
                warn!(error = %e, "map widget unavailable");
                model.map = MapAvailability::Unavailable;
                model.report(e.into());
            }
        }
    }

    // --- Location ---

    fn request_position(model: &Model, caps: &Capabilities) {
        caps.geolocation
            .get_current_position(model.config.geolocation_timeout_ms, Event::GeolocationResolved);
    }

    fn on_position(model: &mut Model, caps: &Capabilities, result: GeolocationResult) {
        let follow = std::mem::take(&mut model.screen.locate_requested);

        let position = match result {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "no position fix");
                if e == GeolocationError::PermissionDenied {
                    model.prompt = Some(ShellPrompt::LocationPermissionHelp {
                        reason: "Allow location access to see what is near you.".into(),
                    });
                }
                model.report(e.into());
                return;
            }
        };

        let here = match position.coordinates().validate() {
            Ok(valid) => LatLng::from(valid),
            Err(e) => {
                warn!(lat = position.lat, lng = position.lng, "shell reported an invalid position");
                model.report(e.into());
                return;
            }
        };

        debug!(accuracy_m = ?position.accuracy_m, "position fix");
        model.user_position = Some(here);
        model.prompt = None;

        if follow || model.screen.selector.is_empty() {
            Self::issue_move(
                model,
                caps,
                ViewTarget {
                    center: here,
                    zoom_level: zoom::MY_LOCATION_LEVEL,
                },
            );
        }
        Self::recompute_visible(model, caps);
    }

    // --- Region & search ---

    fn select_region(model: &mut Model, caps: &Capabilities, selector: RegionSelector) {
        info!(level = ?selector.level(), address = ?selector.composite_address(), "region selected");
        model.screen.selector = selector;
        model.screen.clear_selection();
        model.screen.address_label = None;

        let resolution = model.screen.resolver.resolve(&model.screen.selector);
        Self::apply_resolution(model, caps, resolution);
        Self::send_search(model, caps);
        Self::recompute_visible(model, caps);
    }

    fn search_address(model: &mut Model, caps: &Capabilities, query: &str) {
        match model.screen.resolver.resolve_address(query) {
            Ok(resolution) => {
                model.screen.clear_selection();
                Self::apply_resolution(model, caps, resolution);
            }
            Err(e) => model.report(e.into()),
        }
    }

    fn apply_resolution(model: &mut Model, caps: &Capabilities, resolution: Resolution) {
        let request = match resolution {
            Resolution::Resolved(view) => return Self::apply_resolved(model, caps, view),
            Resolution::Geocode(request) => request,
        };

        let token = request.token;
        match Self::api_base(model) {
            Ok(api) => {
                let url = api.geocode_address(&request.address);
                debug!(token = token.value(), address = %request.address, "geocoding");
                caps.http
                    .get(url.as_str())
                    .expect_json::<Value>()
                    .send(move |result| Event::GeocodeResponse {
                        token,
                        result: http::geocode_from(result),
                    });
            }
            Err(e) => {
                model.report(e);
                let completion = model.screen.resolver.complete(token, &GeocodeResult::failed());
                Self::apply_completion(model, caps, completion);
            }
        }
    }

    fn apply_completion(model: &mut Model, caps: &Capabilities, completion: Completion) {
        match completion {
            Completion::Stale => debug!("geocode superseded"),
            Completion::Resolved(view) => Self::apply_resolved(model, caps, view),
            Completion::Unresolved(failure) => model.report(failure.into()),
        }
    }

    fn apply_resolved(model: &mut Model, caps: &Capabilities, view: ResolvedView) {
        debug!(source = ?view.source, zoom_level = view.zoom_level, "region resolved");
        if view.used_fallback() {
            model.set_status(StatusKind::Warning, "Couldn't pinpoint that area, showing the closest match");
        }
        Self::issue_move(
            model,
            caps,
            ViewTarget {
                center: view.center,
                zoom_level: view.zoom_level,
            },
        );
    }

    fn issue_move(model: &mut Model, caps: &Capabilities, target: ViewTarget) {
        let command = model.screen.view.request_move(target);
        if model.map == MapAvailability::Ready {
            caps.map_widget.move_to(command);
        } else {
            debug!(?command, "map not ready, move deferred");
        }
    }

    fn send_search(model: &mut Model, caps: &Capabilities) {
        let api = match Self::api_base(model) {
            Ok(api) => api,
            Err(e) => {
                model.report(e);
                return;
            }
        };

        let token = model.screen.search_seq.issue();
        model.screen.last_search = Some(token);
        model.screen.is_loading = true;

        let screen = &model.screen;
        let url = api.search(
            screen.kind,
            &screen.selector,
            screen.category.as_deref(),
            model.config.page_size,
        );
        debug!(token = token.value(), %url, "searching");
        caps.http
            .get(url.as_str())
            .expect_json::<Value>()
            .send(move |result| Event::RecordsFetched {
                token,
                result: http::records_from(result),
            });
    }

    fn on_records(
        model: &mut Model,
        caps: &Capabilities,
        token: FetchToken,
        result: Result<Vec<LocationRecord>, FetchFailure>,
    ) -> bool {
        if model.screen.last_search != Some(token) {
            debug!(token = token.value(), "dropping superseded search results");
            return false;
        }
        model.screen.is_loading = false;

        match result {
            Ok(records) => {
                info!(count = records.len(), "search results received");
                model.screen.working_set = records;
                Self::recompute_visible(model, caps);
            }
            Err(e) => {
                warn!(error = %e, "search failed, keeping previous results");
                model.report(e.into());
            }
        }
        true
    }

    /// Filter, rank and redraw. Runs whenever the working set, the selection
    /// or the proximity anchor changes.
    fn recompute_visible(model: &mut Model, caps: &Capabilities) {
        let screen = &mut model.screen;
        let mut outcome = screen
            .filter
            .apply(&screen.working_set, &screen.selector, screen.category.as_deref());

        if let Some(anchor) = model.proximity_anchor() {
            let options = if model.screen.selector.is_empty() {
                model.config.nearby_rank_options()
            } else {
                model.config.region_rank_options()
            };
            outcome.filtered = proximity::rank_nearby(&outcome.filtered, anchor, options);
        }

        let screen = &mut model.screen;
        let noun = screen.kind.noun();
        screen.result_summary = (!screen.is_loading || !screen.working_set.is_empty())
            .then(|| outcome.status_text(noun));
        screen.visible = outcome.filtered;
        screen.child_options = outcome.child_options;

        Self::render_markers(model, caps);
    }

    // --- Markers ---

    fn render_markers(model: &mut Model, caps: &Capabilities) {
        if model.map != MapAvailability::Ready {
            return;
        }
        let Some(render_id) = model.screen.markers.prepare(&model.screen.visible) else {
            return;
        };
        caps.map_widget.clear_markers(render_id);
        Self::draw_next_batch(model, caps, render_id);
    }

    fn draw_next_batch(model: &mut Model, caps: &Capabilities, render_id: u64) {
        if !model.screen.markers.is_current(render_id) {
            debug!(render_id, "ack for a superseded marker render");
            return;
        }
        match model.screen.markers.next_batch(render_id) {
            Some(batch) => {
                caps.map_widget
                    .draw_markers(&batch, move |_| Event::MarkerBatchYielded { render_id });
            }
            None => debug!(render_id, "marker render finished"),
        }
    }

    // --- Widget event stream ---

    fn on_idle(model: &mut Model, caps: &Capabilities, center: LatLng, native_zoom: f64, bounds: Option<Bounds>) {
        if !center.is_finite() || !native_zoom.is_finite() {
            warn!(?center, native_zoom, "ignoring idle with a non-finite viewport");
            return;
        }
        let ticket = model.screen.view.on_idle(SettledView {
            center,
            native_zoom,
            bounds,
        });
        caps.timer.start(ticket.id(), model.config.idle_debounce_ms, move |_| {
            Event::IdleDebounceElapsed { ticket }
        });
    }

    fn on_idle_elapsed(model: &mut Model, caps: &Capabilities, ticket: IdleTicket) -> bool {
        match model.screen.view.on_idle_elapsed(ticket) {
            None => false,
            Some(SettleOutcome::MoveCompleted { center, zoom_level }) => {
                debug!(?center, zoom_level, "programmatic move settled");
                false
            }
            Some(SettleOutcome::UserNavigated(navigation)) => {
                Self::on_user_navigation(model, caps, navigation);
                true
            }
        }
    }

    fn on_user_navigation(model: &mut Model, caps: &Capabilities, navigation: UserNavigation) {
        info!(center = ?navigation.center, zoom_level = navigation.zoom_level, "user moved the map");

        // Without a position fix the map center is the anchor, so ranking moves with it.
        if model.user_position.is_none() {
            Self::recompute_visible(model, caps);
        }

        let api = match Self::api_base(model) {
            Ok(api) => api,
            Err(e) => {
                model.report(e);
                return;
            }
        };
        let token = model.screen.reverse_seq.issue();
        caps.http
            .get(api.reverse_geocode(navigation.center).as_str())
            .expect_json::<Value>()
            .send(move |result| Event::ReverseGeocodeResponse {
                token,
                result: http::reverse_geocode_from(result),
            });
    }

    // --- Selection ---

    fn select_record(model: &mut Model, caps: &Capabilities, id: String) {
        let destination = model
            .screen
            .visible
            .iter()
            .chain(model.screen.working_set.iter())
            .find(|r| r.id == id)
            .map(LocationRecord::placeable);
        let Some(destination) = destination else {
            debug!(%id, "selected record is not loaded");
            return;
        };

        model.screen.clear_selection();
        model.screen.selected_id = Some(id.clone());

        let (Some(origin), Some(destination)) = (model.user_position, destination) else {
            return;
        };
        let api = match Self::api_base(model) {
            Ok(api) => api,
            Err(e) => {
                model.report(e);
                return;
            }
        };

        let profile = model.config.route_profile;
        let token = model.screen.directions_seq.issue();
        caps.http
            .get(api.directions(origin, destination, profile).as_str())
            .expect_json::<Value>()
            .send(move |result| Event::DirectionsResponse {
                token,
                record_id: id,
                result: http::directions_from(result, profile),
            });
    }

    fn on_directions(
        model: &mut Model,
        token: FetchToken,
        record_id: &str,
        result: Result<Option<RouteSummary>, FetchFailure>,
    ) -> bool {
        let screen = &mut model.screen;
        if !screen.directions_seq.is_latest(token) || screen.selected_id.as_deref() != Some(record_id) {
            debug!(token = token.value(), "dropping superseded directions");
            return false;
        }
        match result {
            Ok(route) => screen.route = route,
            Err(e) => {
                warn!(error = %e, "directions unavailable");
                screen.route = None;
            }
        }
        true
    }
}

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let span = info_span!(
            "update",
            event = event.name(),
            screen = ?model.screen.kind,
            session = %model.screen.session_id
        );
        let _entered = span.enter();

        if event.is_user_initiated() {
            debug!("user action");
        }

        // Widget events are meaningless once the widget failed to load.
        let map_ready = model.map == MapAvailability::Ready;

        match event {
            Event::Configure(config) => {
                Self::configure(*config, model);
                caps.render.render();
            }

            Event::ScreenOpened { screen } => {
                Self::open_screen(model, caps, screen);
                caps.render.render();
            }

            Event::MapWidgetLoaded(response) => {
                Self::on_map_loaded(model, caps, response);
                caps.render.render();
            }

            Event::LocateMeRequested => {
                model.screen.locate_requested = true;
                if let Some(here) = model.user_position {
                    Self::issue_move(
                        model,
                        caps,
                        ViewTarget {
                            center: here,
                            zoom_level: zoom::MY_LOCATION_LEVEL,
                        },
                    );
                }
                Self::request_position(model, caps);
                caps.render.render();
            }

            Event::GeolocationResolved(result) => {
                Self::on_position(model, caps, result);
                caps.render.render();
            }

            Event::RegionSelected(selector) => {
                Self::select_region(model, caps, selector);
                caps.render.render();
            }

            Event::AddressSearched { query } => {
                Self::search_address(model, caps, &query);
                caps.render.render();
            }

            Event::CategorySelected { category } => {
                model.screen.category = category
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty());
                // Filter what is loaded right away; the refetch narrows server-side.
                Self::recompute_visible(model, caps);
                Self::send_search(model, caps);
                caps.render.render();
            }

            Event::RetryRequested => {
                model.active_error = None;
                model.status = None;
                Self::send_search(model, caps);
                if model.user_position.is_none() {
                    Self::request_position(model, caps);
                }
                caps.render.render();
            }

            Event::MapDragStarted if map_ready => {
                model.screen.view.on_gesture(GestureKind::DragStart);
            }

            Event::MapZoomChanged { native_zoom } if map_ready => {
                debug!(native_zoom, "zoom changed");
                model.screen.view.on_gesture(GestureKind::ZoomChanged);
            }

            Event::MapIdle {
                center,
                native_zoom,
                bounds,
            } if map_ready => {
                Self::on_idle(model, caps, center, native_zoom, bounds);
            }

            Event::IdleDebounceElapsed { ticket } => {
                if Self::on_idle_elapsed(model, caps, ticket) {
                    caps.render.render();
                }
            }

            Event::MarkerBatchYielded { render_id } => {
                Self::draw_next_batch(model, caps, render_id);
            }

            Event::MapDragStarted
            | Event::MapZoomChanged { .. }
            | Event::MapIdle { .. } => {
                debug!(map = ?model.map, "ignoring widget event");
            }

            Event::MapMarkerClicked { id } | Event::RecordSelected { id } => {
                Self::select_record(model, caps, id);
                caps.render.render();
            }

            Event::RecordDeselected => {
                model.screen.clear_selection();
                caps.render.render();
            }

            Event::DismissStatus => {
                model.status = None;
                model.active_error = None;
                caps.render.render();
            }

            Event::DismissPrompt => {
                model.prompt = None;
                caps.render.render();
            }

            Event::GeocodeResponse { token, result } => {
                let completion = model.screen.resolver.complete(token, &result);
                if completion != Completion::Stale {
                    Self::apply_completion(model, caps, completion);
                    caps.render.render();
                }
            }

            Event::RecordsFetched { token, result } => {
                if Self::on_records(model, caps, token, result) {
                    caps.render.render();
                }
            }

            Event::ReverseGeocodeResponse { token, result } => {
                if !model.screen.reverse_seq.is_latest(token) {
                    debug!(token = token.value(), "dropping superseded reverse geocode");
                    return;
                }
                match result {
                    Ok(label) => model.screen.address_label = label,
                    Err(e) => warn!(error = %e, "reverse geocode failed"),
                }
                caps.render.render();
            }

            Event::DirectionsResponse {
                token,
                record_id,
                result,
            } => {
                if Self::on_directions(model, token, &record_id, result) {
                    caps.render.render();
                }
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::from(model)
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{MapConfig, RouteProfile};
use crate::fetch::{FetchToken, RequestSequencer};
use crate::markers::MarkerRenderer;
use crate::region::{ChildOptions, RegionFilterEngine, RegionLevel, RegionResolver, RegionSelector};
use crate::viewport::{ViewOrigin, ViewStateController, ViewTarget};
use crate::{zoom, AppError, LatLng, UserFacingError, NATIONWIDE_CENTER};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenKind {
    #[default]
    Places,
    Meetups,
    MissingPets,
}

impl ScreenKind {
    /// Path segment of the data service's search endpoint.
    #[must_use]
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Places => "places",
            Self::Meetups => "meetups",
            Self::MissingPets => "missing-pets",
        }
    }

    #[must_use]
    pub const fn noun(self) -> &'static str {
        match self {
            Self::Places => "places",
            Self::Meetups => "meetups",
            Self::MissingPets => "reports",
        }
    }
}

/// One geographically anchored item as returned by the data service.
/// Never mutated once received; derived copies carry a distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub id: String,
    pub coordinates: Option<LatLng>,
    pub province: String,
    pub city: String,
    pub district: String,
    pub category1: Option<String>,
    pub category2: Option<String>,
    pub category3: Option<String>,
    /// Meters from the current anchor, once known.
    pub distance: Option<u32>,
}

impl LocationRecord {
    #[must_use]
    pub fn new(id: &str, coordinates: Option<LatLng>) -> Self {
        Self {
            id: id.to_string(),
            coordinates,
            province: String::new(),
            city: String::new(),
            district: String::new(),
            category1: None,
            category2: None,
            category3: None,
            distance: None,
        }
    }

    #[must_use]
    pub fn in_region(
        mut self,
        province: impl Into<String>,
        city: impl Into<String>,
        district: impl Into<String>,
    ) -> Self {
        self.province = province.into();
        self.city = city.into();
        self.district = district.into();
        self
    }

    #[must_use]
    pub fn with_categories(
        mut self,
        category1: Option<String>,
        category2: Option<String>,
        category3: Option<String>,
    ) -> Self {
        self.category1 = category1;
        self.category2 = category2;
        self.category3 = category3;
        self
    }

    /// A copy with the distance attached; `self` is left untouched.
    #[must_use]
    pub fn with_distance(&self, meters: u32) -> Self {
        Self {
            distance: Some(meters),
            ..self.clone()
        }
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        [&self.category1, &self.category2, &self.category3]
            .into_iter()
            .filter_map(|c| c.as_deref())
    }

    /// `None` (or an empty filter) matches everything.
    #[must_use]
    pub fn matches_category(&self, category: Option<&str>) -> bool {
        match category.map(str::trim).filter(|c| !c.is_empty()) {
            None => true,
            Some(wanted) => self.categories().any(|c| c == wanted),
        }
    }

    /// Coordinates fit for ranking and drawing.
    #[must_use]
    pub fn placeable(&self) -> Option<LatLng> {
        self.coordinates.filter(|c| c.validate().is_ok())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub profile: RouteProfile,
    pub duration_ms: u64,
    pub distance_m: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusMessage {
    #[must_use]
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }
}

/// Explicit requests for the shell to show something outside the map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellPrompt {
    LocationPermissionHelp { reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapAvailability {
    #[default]
    Loading,
    Ready,
    Unavailable,
}

/// Everything one open map screen owns. Replaced wholesale when a screen is
/// opened; only the request counters carry over (see [`MapScreen::replacing`]).
#[derive(Debug)]
pub struct MapScreen {
    pub kind: ScreenKind,
    pub session_id: Uuid,
    pub view: ViewStateController,
    pub resolver: RegionResolver,
    pub filter: RegionFilterEngine,
    pub markers: MarkerRenderer,
    pub selector: RegionSelector,
    pub category: Option<String>,
    pub working_set: Vec<LocationRecord>,
    pub visible: Vec<LocationRecord>,
    pub child_options: ChildOptions,
    pub result_summary: Option<String>,
    pub search_seq: RequestSequencer,
    pub last_search: Option<FetchToken>,
    pub reverse_seq: RequestSequencer,
    pub directions_seq: RequestSequencer,
    pub address_label: Option<String>,
    pub selected_id: Option<String>,
    pub route: Option<RouteSummary>,
    pub is_loading: bool,
    /// The user asked to be centered on their position; the next fix moves
    /// the map even if a region is selected.
    pub locate_requested: bool,
}

impl MapScreen {
    #[must_use]
    pub fn new(kind: ScreenKind, config: &MapConfig) -> Self {
        Self {
            kind,
            session_id: Uuid::new_v4(),
            view: ViewStateController::new(nationwide_target(), config.settle_epsilon_deg),
            resolver: RegionResolver::new(config.geocode_cache_size),
            filter: RegionFilterEngine::new(),
            markers: MarkerRenderer::new(config.marker_cap, config.marker_batch_size),
            selector: RegionSelector::nationwide(),
            category: None,
            working_set: Vec::new(),
            visible: Vec::new(),
            child_options: ChildOptions::empty(RegionLevel::Province),
            result_summary: None,
            search_seq: RequestSequencer::new(),
            last_search: None,
            reverse_seq: RequestSequencer::new(),
            directions_seq: RequestSequencer::new(),
            address_label: None,
            selected_id: None,
            route: None,
            is_loading: false,
            locate_requested: false,
        }
    }

    /// The screen that takes over from `previous`. Every counter continues
    /// where `previous` left off, so responses, debounce timers and batch
    /// acks addressed to it are stale here.
    #[must_use]
    pub fn replacing(previous: &Self, kind: ScreenKind, config: &MapConfig) -> Self {
        Self {
            view: previous.view.successor(nationwide_target(), config.settle_epsilon_deg),
            resolver: previous.resolver.successor(config.geocode_cache_size),
            markers: previous.markers.successor(config.marker_cap, config.marker_batch_size),
            search_seq: previous.search_seq.successor(),
            reverse_seq: previous.reverse_seq.successor(),
            directions_seq: previous.directions_seq.successor(),
            ..Self::new(kind, config)
        }
    }

    /// Apply a new configuration in place. Region state, the working set and
    /// requests in flight survive; the in-flight render does not.
    pub fn reconfigure(&mut self, config: &MapConfig) {
        self.view.set_epsilon(config.settle_epsilon_deg);
        self.resolver.resize_cache(config.geocode_cache_size);
        self.markers = self.markers.successor(config.marker_cap, config.marker_batch_size);
    }

    #[must_use]
    pub fn selected_record(&self) -> Option<&LocationRecord> {
        let id = self.selected_id.as_deref()?;
        self.visible
            .iter()
            .chain(self.working_set.iter())
            .find(|r| r.id == id)
    }

    pub fn clear_selection(&mut self) {
        self.selected_id = None;
        self.route = None;
        self.directions_seq.issue();
    }
}

impl Default for MapScreen {
    fn default() -> Self {
        Self::new(ScreenKind::default(), &MapConfig::default())
    }
}

#[must_use]
pub fn nationwide_target() -> ViewTarget {
    ViewTarget {
        center: NATIONWIDE_CENTER,
        zoom_level: zoom::NATIONWIDE_LEVEL,
    }
}

#[derive(Debug, Default)]
pub struct Model {
    pub config: MapConfig,
    pub screen: MapScreen,
    pub map: MapAvailability,
    pub user_position: Option<LatLng>,
    pub status: Option<StatusMessage>,
    pub active_error: Option<AppError>,
    pub prompt: Option<ShellPrompt>,
}

impl Model {
    /// Where distances are measured from: the user if we know where they
    /// are, otherwise wherever they last moved the map themselves.
    #[must_use]
    pub fn proximity_anchor(&self) -> Option<LatLng> {
        self.user_position.or_else(|| {
            let state = self.screen.view.state();
            (state.origin == ViewOrigin::User).then_some(state.center)
        })
    }

    pub fn set_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(StatusMessage::new(kind, text));
    }

    /// Surface an error as a status line; the error is kept for the view.
    pub fn report(&mut self, error: AppError) {
        let kind = if error.is_retryable() {
            StatusKind::Warning
        } else {
            StatusKind::Error
        };
        self.set_status(kind, error.user_facing_message());
        self.active_error = Some(error);
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResultItem {
    pub id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub province: String,
    pub city: String,
    pub district: String,
    pub categories: Vec<String>,
    pub distance_text: Option<String>,
}

impl From<&LocationRecord> for ResultItem {
    fn from(record: &LocationRecord) -> Self {
        Self {
            id: record.id.clone(),
            lat: record.coordinates.map(|c| c.lat),
            lng: record.coordinates.map(|c| c.lng),
            province: record.province.clone(),
            city: record.city.clone(),
            district: record.district.clone(),
            categories: record.categories().map(ToString::to_string).collect(),
            distance_text: record.distance.map(crate::proximity::format_label),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SelectedView {
    pub item: ResultItem,
    pub route: Option<RouteSummary>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub screen: ScreenKind,
    pub map: MapAvailability,
    pub center: LatLng,
    pub zoom_level: u8,
    pub native_zoom: u8,
    pub view_origin: ViewOrigin,
    pub selector: RegionSelector,
    pub category: Option<String>,
    pub child_options: ChildOptions,
    pub results: Vec<ResultItem>,
    pub result_summary: Option<String>,
    pub is_loading: bool,
    /// A region or address is being geocoded; the map has not moved yet.
    pub is_resolving: bool,
    pub address_label: Option<String>,
    pub selected: Option<SelectedView>,
    pub status: Option<StatusMessage>,
    pub error: Option<UserFacingError>,
    pub prompt: Option<ShellPrompt>,
    pub has_user_position: bool,
}

impl From<&Model> for ViewModel {
    fn from(model: &Model) -> Self {
        let screen = &model.screen;
        let state = screen.view.state();
        Self {
            screen: screen.kind,
            map: model.map,
            center: state.center,
            zoom_level: state.zoom_level,
            native_zoom: zoom::to_native_zoom(state.zoom_level),
            view_origin: state.origin,
            selector: screen.selector.clone(),
            category: screen.category.clone(),
            child_options: screen.child_options.clone(),
            results: screen.visible.iter().map(ResultItem::from).collect(),
            result_summary: screen.result_summary.clone(),
            is_loading: screen.is_loading,
            is_resolving: screen.resolver.has_pending(),
            address_label: screen.address_label.clone(),
            selected: screen.selected_record().map(|record| SelectedView {
                item: ResultItem::from(record),
                route: screen.route,
            }),
            status: model.status.clone(),
            error: model.active_error.as_ref().map(UserFacingError::from),
            prompt: model.prompt.clone(),
            has_user_position: model.user_position.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seoul_cafe() -> LocationRecord {
        LocationRecord::new("cafe-1", Some(LatLng::new(37.5665, 126.9780)))
            .in_region("서울특별시", "중구", "태평로1가")
            .with_categories(Some("카페".into()), None, Some("디저트".into()))
    }

    #[test]
    fn test_category_matches_any_tier() {
        let record = seoul_cafe();
        assert!(record.matches_category(None));
        assert!(record.matches_category(Some("  ")));
        assert!(record.matches_category(Some("카페")));
        assert!(record.matches_category(Some("디저트")));
        assert!(!record.matches_category(Some("카")));
    }

    #[test]
    fn test_with_distance_copies() {
        let record = seoul_cafe();
        let ranked = record.with_distance(120);
        assert_eq!(record.distance, None);
        assert_eq!(ranked.distance, Some(120));
        assert_eq!(ranked.id, record.id);
    }

    #[test]
    fn test_placeable_rejects_out_of_range() {
        assert!(LocationRecord::new("x", Some(LatLng::new(137.0, 127.0)))
            .placeable()
            .is_none());
        assert!(LocationRecord::new("y", None).placeable().is_none());
        assert!(seoul_cafe().placeable().is_some());
    }

    #[test]
    fn test_result_item_formats_distance() {
        let item = ResultItem::from(&seoul_cafe().with_distance(1549));
        assert_eq!(item.distance_text.as_deref(), Some("1.5 km"));
        assert_eq!(item.categories, vec!["카페", "디저트"]);
    }

    #[test]
    fn test_screen_resources() {
        assert_eq!(ScreenKind::MissingPets.resource(), "missing-pets");
        assert_eq!(ScreenKind::MissingPets.noun(), "reports");
    }

    #[test]
    fn test_anchor_prefers_user_position() {
        let mut model = Model::default();
        assert_eq!(model.proximity_anchor(), None);

        model.user_position = Some(LatLng::new(35.1796, 129.0756));
        assert_eq!(model.proximity_anchor(), Some(LatLng::new(35.1796, 129.0756)));
    }

    #[test]
    fn test_replacing_screen_keeps_counting() {
        let config = MapConfig::default();
        let mut previous = MapScreen::new(ScreenKind::Places, &config);
        let search = previous.search_seq.issue();
        let reverse = previous.reverse_seq.issue();

        let mut next = MapScreen::replacing(&previous, ScreenKind::Meetups, &config);
        assert_eq!(next.kind, ScreenKind::Meetups);
        assert_ne!(next.session_id, previous.session_id);
        assert!(!next.search_seq.is_latest(search));
        assert!(!next.reverse_seq.is_latest(reverse));
        assert!(next.search_seq.issue() > search);
        assert_eq!(next.last_search, None);
    }

    #[test]
    fn test_report_keeps_error_and_status() {
        let mut model = Model::default();
        model.report(AppError::new(crate::ErrorKind::DataFetchFailed, "boom"));
        assert_eq!(model.status.as_ref().map(|s| s.kind), Some(StatusKind::Warning));
        assert!(model.active_error.is_some());
    }
}

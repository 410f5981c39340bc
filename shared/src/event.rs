use serde::{Deserialize, Serialize};

use crate::capabilities::{GeolocationResult, MapResponse};
use crate::fetch::{FetchFailure, FetchToken, GeocodeResult};
use crate::model::{LocationRecord, RouteSummary, ScreenKind};
use crate::viewport::IdleTicket;
use crate::{Bounds, LatLng, MapConfig, RegionSelector};

// --- Event enum: no None variant, large variants boxed ---

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum Event {
    // Lifecycle
    Configure(Box<MapConfig>),
    ScreenOpened {
        screen: ScreenKind,
    },
    MapWidgetLoaded(MapResponse),

    // Location
    LocateMeRequested,
    GeolocationResolved(GeolocationResult),

    // Region & search
    RegionSelected(RegionSelector),
    AddressSearched {
        query: String,
    },
    CategorySelected {
        category: Option<String>,
    },
    RetryRequested,

    // Widget event stream
    MapDragStarted,
    MapZoomChanged {
        native_zoom: f64,
    },
    MapIdle {
        center: LatLng,
        native_zoom: f64,
        bounds: Option<Bounds>,
    },
    IdleDebounceElapsed {
        ticket: IdleTicket,
    },
    MarkerBatchYielded {
        render_id: u64,
    },
    MapMarkerClicked {
        id: String,
    },

    // Selection
    RecordSelected {
        id: String,
    },
    RecordDeselected,

    // Status line & prompts
    DismissStatus,
    DismissPrompt,

    // Collaborator responses, tagged with the token they were issued under
    GeocodeResponse {
        token: FetchToken,
        result: GeocodeResult,
    },
    RecordsFetched {
        token: FetchToken,
        result: Result<Vec<LocationRecord>, FetchFailure>,
    },
    ReverseGeocodeResponse {
        token: FetchToken,
        result: Result<Option<String>, FetchFailure>,
    },
    DirectionsResponse {
        token: FetchToken,
        record_id: String,
        result: Result<Option<RouteSummary>, FetchFailure>,
    },
}

impl Event {
    /// Stable name for log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configure(_) => "configure",
            Self::ScreenOpened { .. } => "screen_opened",
            Self::MapWidgetLoaded(_) => "map_widget_loaded",
            Self::LocateMeRequested => "locate_me_requested",
            Self::GeolocationResolved(_) => "geolocation_resolved",
            Self::RegionSelected(_) => "region_selected",
            Self::AddressSearched { .. } => "address_searched",
            Self::CategorySelected { .. } => "category_selected",
            Self::RetryRequested => "retry_requested",
            Self::MapDragStarted => "map_drag_started",
            Self::MapZoomChanged { .. } => "map_zoom_changed",
            Self::MapIdle { .. } => "map_idle",
            Self::IdleDebounceElapsed { .. } => "idle_debounce_elapsed",
            Self::MarkerBatchYielded { .. } => "marker_batch_yielded",
            Self::MapMarkerClicked { .. } => "map_marker_clicked",
            Self::RecordSelected { .. } => "record_selected",
            Self::RecordDeselected => "record_deselected",
            Self::DismissStatus => "dismiss_status",
            Self::DismissPrompt => "dismiss_prompt",
            Self::GeocodeResponse { .. } => "geocode_response",
            Self::RecordsFetched { .. } => "records_fetched",
            Self::ReverseGeocodeResponse { .. } => "reverse_geocode_response",
            Self::DirectionsResponse { .. } => "directions_response",
        }
    }

    /// Events that come straight from something the user did, as opposed
    /// to capability completions and widget bookkeeping.
    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::ScreenOpened { .. }
                | Self::LocateMeRequested
                | Self::RegionSelected(_)
                | Self::AddressSearched { .. }
                | Self::CategorySelected { .. }
                | Self::RetryRequested
                | Self::MapDragStarted
                | Self::MapZoomChanged { .. }
                | Self::MapMarkerClicked { .. }
                | Self::RecordSelected { .. }
                | Self::RecordDeselected
                | Self::DismissStatus
                | Self::DismissPrompt
        )
    }
}

pub mod geolocation;
pub mod http;
pub mod map;
pub mod timer;

pub use self::geolocation::{
    Geolocation, GeolocationError, GeolocationOperation, GeolocationResult, Position,
};
pub use self::http::ApiBase;
pub use self::map::{MapOperation, MapResponse, MapWidget, MapWidgetError};
pub use self::timer::{Timer, TimerElapsed, TimerOperation};

pub use crux_core::render::Render;
pub use crux_http::Http;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub http: Http<Event>,
    pub render: Render<Event>,
    pub map_widget: MapWidget<Event>,
    pub geolocation: Geolocation<Event>,
    pub timer: Timer<Event>,
}

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{AppError, ErrorKind, LatLng};

#[derive(Clone)]
pub struct Geolocation<E> {
    context: CapabilityContext<GeolocationOperation, E>,
}

impl<Ev> Capability<Ev> for Geolocation<Ev> {
    type Operation = GeolocationOperation;
    type MappedSelf<MappedEv> = Geolocation<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        Geolocation::new(self.context.map_event(f))
    }
}

impl<E> Geolocation<E> {
    pub fn new(context: CapabilityContext<GeolocationOperation, E>) -> Self {
        Self { context }
    }
}

impl<E> Geolocation<E>
where
    E: 'static,
{
    /// One-shot position fix. The shell enforces `timeout_ms`.
    pub fn get_current_position<F>(&self, timeout_ms: u64, callback: F)
    where
        F: FnOnce(GeolocationResult) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let result = ctx
                .request_from_shell(GeolocationOperation::GetCurrentPosition { timeout_ms })
                .await;
            ctx.update_app(callback(result));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationOperation {
    GetCurrentPosition { timeout_ms: u64 },
}

impl Operation for GeolocationOperation {
    type Output = GeolocationResult;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
}

impl Position {
    #[must_use]
    pub const fn coordinates(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("timed out waiting for a position")]
    Timeout,
}

impl From<GeolocationError> for AppError {
    fn from(e: GeolocationError) -> Self {
        let kind = match e {
            GeolocationError::PermissionDenied => ErrorKind::LocationPermissionDenied,
            GeolocationError::PositionUnavailable => ErrorKind::LocationUnavailable,
            GeolocationError::Timeout => ErrorKind::LocationTimeout,
        };
        AppError::new(kind, e.to_string())
    }
}

pub type GeolocationResult = Result<Position, GeolocationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            AppError::from(GeolocationError::PermissionDenied).kind,
            ErrorKind::LocationPermissionDenied
        );
        assert!(AppError::from(GeolocationError::Timeout).is_retryable());
        assert!(!AppError::from(GeolocationError::PermissionDenied).is_retryable());
    }

    #[test]
    fn test_result_wire_shape() {
        let ok: GeolocationResult = serde_json::from_str(r#"{"Ok":{"lat":37.5,"lng":127.0,"accuracy_m":null}}"#).unwrap();
        assert_eq!(ok.map(|p| p.coordinates()), Ok(LatLng::new(37.5, 127.0)));

        let denied: GeolocationResult = serde_json::from_str(r#"{"Err":"PermissionDenied"}"#).unwrap();
        assert_eq!(denied, Err(GeolocationError::PermissionDenied));
    }
}

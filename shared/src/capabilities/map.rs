use crux_core::capability::{Capability, CapabilityContext, Operation};
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::markers::MarkerBatch;
use crate::viewport::MoveCommand;
use crate::{AppError, ErrorKind, LatLng};

/// The embedded map widget. The core only ever tells it where to look and
/// what to draw; gestures and idles come back as events.
#[derive(Clone)]
pub struct MapWidget<E> {
    context: CapabilityContext<MapOperation, E>,
}

impl<Ev> Capability<Ev> for MapWidget<Ev> {
    type Operation = MapOperation;
    type MappedSelf<MappedEv> = MapWidget<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static,
    {
        MapWidget::new(self.context.map_event(f))
    }
}

impl<E> MapWidget<E> {
    pub fn new(context: CapabilityContext<MapOperation, E>) -> Self {
        Self { context }
    }
}

impl<E> MapWidget<E>
where
    E: 'static,
{
    /// Load the widget at `command`. Resolves once it is ready or has failed.
    pub fn create<F>(&self, command: MoveCommand, callback: F)
    where
        F: FnOnce(MapResponse) -> E + Send + 'static,
    {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx
                .request_from_shell(MapOperation::Create {
                    center: command.center,
                    native_zoom: command.native_zoom,
                })
                .await;
            ctx.update_app(callback(response));
        });
    }

    pub fn move_to(&self, command: MoveCommand) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(MapOperation::MoveTo {
                center: command.center,
                native_zoom: command.native_zoom,
            })
            .await;
        });
    }

    pub fn clear_markers(&self, render_id: u64) {
        let ctx = self.context.clone();
        self.context.spawn(async move {
            ctx.notify_shell(MapOperation::ClearMarkers { render_id }).await;
        });
    }

    /// Draw one batch. The shell answers after the next animation frame,
    /// which is the cue to send the following batch.
    pub fn draw_markers<F>(&self, batch: &MarkerBatch, callback: F)
    where
        F: FnOnce(MapResponse) -> E + Send + 'static,
    {
        let operation = MapOperation::DrawMarkers {
            render_id: batch.render_id,
            batch_index: batch.index,
            batch_count: batch.count,
            features: batch.to_feature_collection(),
        };
        let ctx = self.context.clone();
        self.context.spawn(async move {
            let response = ctx.request_from_shell(operation).await;
            ctx.update_app(callback(response));
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum MapOperation {
    Create {
        center: LatLng,
        native_zoom: u8,
    },
    MoveTo {
        center: LatLng,
        native_zoom: u8,
    },
    ClearMarkers {
        render_id: u64,
    },
    DrawMarkers {
        render_id: u64,
        batch_index: usize,
        batch_count: usize,
        features: FeatureCollection,
    },
}

impl Operation for MapOperation {
    type Output = MapResponse;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MapResponse {
    Ready,
    FrameYielded,
    Unavailable { reason: String },
}

impl MapResponse {
    pub fn into_result(self) -> Result<(), MapWidgetError> {
        match self {
            Self::Ready | Self::FrameYielded => Ok(()),
            Self::Unavailable { reason } => Err(MapWidgetError::LoadFailed { reason }),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MapWidgetError {
    #[error("map widget failed to load: {reason}")]
    LoadFailed { reason: String },
}

impl From<MapWidgetError> for AppError {
    fn from(e: MapWidgetError) -> Self {
        AppError::new(ErrorKind::MapUnavailable, "Map unavailable").with_internal(e.to_string())
    }
}

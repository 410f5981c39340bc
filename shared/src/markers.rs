//! Batched marker drawing.
//!
//! Large result sets are capped and handed to the shell in fixed-size
//! batches; the next batch goes out only after the shell acknowledges the
//! previous one, so the widget gets a frame in between. Re-rendering the same
//! ordered coordinates is skipped.

use std::collections::VecDeque;

use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::LocationRecord;
use crate::proximity::format_label;
use crate::LatLng;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: String,
    pub position: LatLng,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerBatch {
    pub render_id: u64,
    pub index: usize,
    pub count: usize,
    pub markers: Vec<Marker>,
}

impl MarkerBatch {
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .markers
            .iter()
            .map(|marker| {
                let mut properties = JsonObject::new();
                properties.insert("id".into(), marker.id.clone().into());
                if let Some(label) = &marker.label {
                    properties.insert("label".into(), label.clone().into());
                }
                Feature {
                    bbox: None,
                    // GeoJSON positions are [lng, lat].
                    geometry: Some(Geometry::new(Value::Point(vec![
                        marker.position.lng,
                        marker.position.lat,
                    ]))),
                    id: Some(Id::String(marker.id.clone())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

#[derive(Debug)]
struct ActiveRender {
    render_id: u64,
    queued: VecDeque<MarkerBatch>,
}

#[derive(Debug)]
pub struct MarkerRenderer {
    cap: usize,
    batch_size: usize,
    last_signature: Option<Vec<(u64, u64)>>,
    next_render_id: u64,
    active: Option<ActiveRender>,
}

impl MarkerRenderer {
    #[must_use]
    pub fn new(cap: usize, batch_size: usize) -> Self {
        Self {
            cap,
            batch_size: batch_size.max(1),
            last_signature: None,
            next_render_id: 0,
            active: None,
        }
    }

    /// Renderer with nothing drawn whose render ids continue after ours, so
    /// a batch ack for one of our renders is never mistaken for one of its.
    #[must_use]
    pub fn successor(&self, cap: usize, batch_size: usize) -> Self {
        Self {
            next_render_id: self.next_render_id,
            ..Self::new(cap, batch_size)
        }
    }

    /// Plan a render of `records`. Returns the new render id, or `None` when
    /// the drawable coordinates are identical to the last render.
    pub fn prepare(&mut self, records: &[LocationRecord]) -> Option<u64> {
        let markers: Vec<Marker> = records
            .iter()
            .filter_map(|record| {
                record.placeable().map(|position| Marker {
                    id: record.id.clone(),
                    position,
                    label: record.distance.map(format_label),
                })
            })
            .take(self.cap)
            .collect();

        let signature: Vec<(u64, u64)> = markers
            .iter()
            .map(|m| (m.position.lat.to_bits(), m.position.lng.to_bits()))
            .collect();
        if self.last_signature.as_ref() == Some(&signature) {
            debug!(markers = markers.len(), "marker set unchanged, skipping render");
            return None;
        }
        self.last_signature = Some(signature);

        self.next_render_id += 1;
        let render_id = self.next_render_id;

        let chunks: Vec<Vec<Marker>> = markers
            .chunks(self.batch_size)
            .map(<[Marker]>::to_vec)
            .collect();
        let count = chunks.len();
        let queued = chunks
            .into_iter()
            .enumerate()
            .map(|(index, markers)| MarkerBatch {
                render_id,
                index,
                count,
                markers,
            })
            .collect();

        debug!(render_id, markers = markers.len(), batches = count, "planned marker render");
        self.active = Some(ActiveRender { render_id, queued });
        Some(render_id)
    }

    /// Next batch of `render_id`. Acks for a superseded render get nothing.
    pub fn next_batch(&mut self, render_id: u64) -> Option<MarkerBatch> {
        let active = self.active.as_mut().filter(|a| a.render_id == render_id)?;
        let batch = active.queued.pop_front();
        if batch.is_none() {
            self.active = None;
        }
        batch
    }

    #[must_use]
    pub fn is_current(&self, render_id: u64) -> bool {
        self.active.as_ref().is_some_and(|a| a.render_id == render_id)
    }

    /// Forget what was drawn so the next `prepare` always renders, e.g.
    /// after the widget was recreated.
    pub fn invalidate(&mut self) {
        self.last_signature = None;
        self.active = None;
    }
}

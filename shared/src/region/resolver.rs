//! Turns a region selection or free-text address into a map center and zoom
//! level. Province-only selections come from the static table; anything
//! finer needs a geocoding round trip, which the caller performs and hands
//! back through [`RegionResolver::complete`].

use std::num::NonZeroUsize;

use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::catalog;
use super::RegionSelector;
use crate::fetch::{FetchToken, GeocodeFailure, GeocodeResult, RequestSequencer};
use crate::{zoom, LatLng, NATIONWIDE_CENTER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolutionSource {
    Nationwide,
    ProvinceTable,
    Geocoded,
    Cache,
    ProvinceFallback,
    NationwideFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedView {
    pub center: LatLng,
    pub zoom_level: u8,
    pub source: ResolutionSource,
}

impl ResolvedView {
    #[must_use]
    pub const fn used_fallback(&self) -> bool {
        matches!(
            self.source,
            ResolutionSource::ProvinceFallback | ResolutionSource::NationwideFallback
        )
    }

    fn nationwide(source: ResolutionSource) -> Self {
        Self {
            center: NATIONWIDE_CENTER,
            zoom_level: zoom::NATIONWIDE_LEVEL,
            source,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub token: FetchToken,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(ResolvedView),
    Geocode(GeocodeRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A newer resolution started after this one; drop the result.
    Stale,
    Resolved(ResolvedView),
    /// Free-text search failed and there is nothing to fall back to.
    Unresolved(GeocodeFailure),
}

#[derive(Debug)]
struct PendingGeocode {
    token: FetchToken,
    address: String,
    zoom_level: u8,
    /// `None` for free-text searches.
    fallback: Option<ResolvedView>,
}

#[derive(Debug)]
pub struct RegionResolver {
    sequencer: RequestSequencer,
    pending: Option<PendingGeocode>,
    cache: LruCache<String, LatLng>,
}

impl RegionResolver {
    #[must_use]
    pub fn new(cache_size: usize) -> Self {
        Self::with_sequencer(RequestSequencer::new(), cache_size)
    }

    /// Empty resolver whose tokens continue after ours, so a geocode we
    /// issued can never complete against it.
    #[must_use]
    pub fn successor(&self, cache_size: usize) -> Self {
        Self::with_sequencer(self.sequencer.successor(), cache_size)
    }

    fn with_sequencer(sequencer: RequestSequencer, cache_size: usize) -> Self {
        Self {
            sequencer,
            pending: None,
            cache: LruCache::new(cache_capacity(cache_size)),
        }
    }

    /// Least recently used entries are evicted when shrinking.
    pub fn resize_cache(&mut self, cache_size: usize) {
        self.cache.resize(cache_capacity(cache_size));
    }

    /// Every call supersedes whatever geocode is still in flight.
    #[instrument(level = "debug", skip(self), fields(level = ?selector.level()))]
    pub fn resolve(&mut self, selector: &RegionSelector) -> Resolution {
        self.pending = None;

        let Some(province) = selector.province() else {
            return Resolution::Resolved(ResolvedView::nationwide(ResolutionSource::Nationwide));
        };
        let entry = catalog::lookup(province);

        if selector.city().is_none() {
            if let Some(entry) = entry {
                return Resolution::Resolved(ResolvedView {
                    center: entry.centroid,
                    zoom_level: entry.zoom_level,
                    source: ResolutionSource::ProvinceTable,
                });
            }
        }

        let (zoom_level, fallback) = match (selector.city(), entry) {
            (None, _) => (
                zoom::PROVINCE_LEVEL,
                ResolvedView::nationwide(ResolutionSource::NationwideFallback),
            ),
            (Some(_), Some(entry)) => (
                city_rule(selector),
                ResolvedView {
                    center: entry.centroid,
                    zoom_level: zoom::CITY_LEVEL,
                    source: ResolutionSource::ProvinceFallback,
                },
            ),
            (Some(_), None) => (
                city_rule(selector),
                ResolvedView::nationwide(ResolutionSource::NationwideFallback),
            ),
        };

        let address = selector.composite_address().unwrap_or_else(|| province.to_string());
        self.plan_geocode(address, zoom_level, Some(fallback))
    }

    /// Free-text address search. Always geocoded (or served from cache).
    #[instrument(level = "debug", skip(self))]
    pub fn resolve_address(&mut self, query: &str) -> Result<Resolution, GeocodeFailure> {
        self.pending = None;
        let address = query.split_whitespace().collect::<Vec<_>>().join(" ");
        if address.is_empty() {
            return Err(GeocodeFailure::EmptyQuery);
        }
        Ok(self.plan_geocode(address, zoom::DISTRICT_LEVEL, None))
    }

    fn plan_geocode(
        &mut self,
        address: String,
        zoom_level: u8,
        fallback: Option<ResolvedView>,
    ) -> Resolution {
        if let Some(center) = self.cache.get(&address).copied() {
            debug!(%address, "geocode cache hit");
            return Resolution::Resolved(ResolvedView {
                center,
                zoom_level,
                source: ResolutionSource::Cache,
            });
        }

        let token = self.sequencer.issue();
        self.pending = Some(PendingGeocode {
            token,
            address: address.clone(),
            zoom_level,
            fallback,
        });
        Resolution::Geocode(GeocodeRequest { token, address })
    }

    /// Apply a geocoding result. Anything but the latest request is stale.
    pub fn complete(&mut self, token: FetchToken, result: &GeocodeResult) -> Completion {
        if !self.sequencer.is_latest(token) {
            debug!(token = token.value(), "discarding stale geocode result");
            return Completion::Stale;
        }
        let Some(pending) = self.pending.take().filter(|p| p.token == token) else {
            debug!(token = token.value(), "geocode result without pending request");
            return Completion::Stale;
        };

        if let Some(center) = result.usable_coordinates() {
            info!(address = %pending.address, "region geocoded");
            self.cache.put(pending.address, center);
            return Completion::Resolved(ResolvedView {
                center,
                zoom_level: pending.zoom_level,
                source: ResolutionSource::Geocoded,
            });
        }

        match pending.fallback {
            Some(fallback) => {
                warn!(
                    address = %pending.address,
                    source = ?fallback.source,
                    "geocoding failed, using fallback center"
                );
                Completion::Resolved(fallback)
            }
            None => Completion::Unresolved(GeocodeFailure::NoResult {
                address: pending.address,
            }),
        }
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Token the next geocode result must carry to be applied.
    #[must_use]
    pub fn pending_token(&self) -> Option<FetchToken> {
        self.pending.as_ref().map(|p| p.token)
    }

    #[cfg(test)]
    fn cached(&self, address: &str) -> Option<LatLng> {
        self.cache.peek(address).copied()
    }
}

fn cache_capacity(cache_size: usize) -> NonZeroUsize {
    NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN)
}

fn city_rule(selector: &RegionSelector) -> u8 {
    if selector.district().is_some() {
        zoom::DISTRICT_LEVEL
    } else {
        zoom::CITY_LEVEL
    }
}

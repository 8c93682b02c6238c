use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Directions summary for a full ride path, as returned by the external
/// maps collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelInfo {
    pub duration_minutes: u32,
    pub distance_km: f64,
    pub polyline: String,
    pub summary: String,
}

impl TravelInfo {
    pub fn new(
        duration_minutes: u32,
        distance_km: f64,
        polyline: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            duration_minutes,
            distance_km,
            polyline: polyline.into(),
            summary: summary.into(),
        }
    }
}

/// Route-level distance/duration lookup. Implementations wrap a third-party
/// directions API; failures must be surfaced as errors so the caller can
/// substitute its configured fallback rather than abort the request.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn travel_info(
        &self,
        origin: &str,
        destination: &str,
        stops: &[String],
    ) -> Result<TravelInfo, Box<dyn std::error::Error + Send + Sync>>;
}

/// Address to coordinates lookup. `Ok(None)` means the address could not be
/// resolved; hard failures are errors the caller logs and tolerates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(
        &self,
        address: &str,
    ) -> Result<Option<LatLng>, Box<dyn std::error::Error + Send + Sync>>;
}

/// Provider used when no maps API is configured: answers every request with
/// one fixed TravelInfo.
pub struct StaticDirectionsProvider {
    info: TravelInfo,
}

impl StaticDirectionsProvider {
    pub fn new(info: TravelInfo) -> Self {
        Self { info }
    }
}

#[async_trait]
impl DirectionsProvider for StaticDirectionsProvider {
    async fn travel_info(
        &self,
        origin: &str,
        destination: &str,
        _stops: &[String],
    ) -> Result<TravelInfo, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(origin, destination, "directions lookup served statically");
        Ok(self.info.clone())
    }
}

/// Geocoder used when no maps API is configured: resolves nothing.
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn geocode(
        &self,
        address: &str,
    ) -> Result<Option<LatLng>, Box<dyn std::error::Error + Send + Sync>> {
        tracing::debug!(address, "geocoding disabled, no coordinates attached");
        Ok(None)
    }
}

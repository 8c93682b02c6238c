use crate::maps::LatLng;
use serde::{Deserialize, Serialize};

/// A single named location on a ride's path. `label` is the precise
/// address or place, `city` the coarser geographic grouping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePoint {
    pub city: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<LatLng>,
}

impl RoutePoint {
    pub fn new(city: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            label: label.into(),
            coords: None,
        }
    }
}

/// The ordered sequence of points a ride travels through: origin first,
/// destination last, stops in the driver's intended visiting order.
/// Duplicate place names are legal and preserved positionally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    points: Vec<RoutePoint>,
}

impl Route {
    pub fn build(origin: RoutePoint, stops: Vec<RoutePoint>, destination: RoutePoint) -> Self {
        let mut points = Vec::with_capacity(stops.len() + 2);
        points.push(origin);
        points.extend(stops);
        points.push(destination);
        Self { points }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn point(&self, index: usize) -> Option<&RoutePoint> {
        self.points.get(index)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn origin(&self) -> &RoutePoint {
        &self.points[0]
    }

    pub fn destination(&self) -> &RoutePoint {
        &self.points[self.points.len() - 1]
    }

    /// Stop labels in travel order, as handed to the directions provider.
    pub fn stop_labels(&self) -> Vec<String> {
        if self.points.len() <= 2 {
            return Vec::new();
        }
        self.points[1..self.points.len() - 1]
            .iter()
            .map(|p| p.label.clone())
            .collect()
    }
}

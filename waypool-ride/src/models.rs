use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use waypool_core::route::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideType {
    /// Posted by a driver with seats to fill.
    Offered,
    /// Posted by a traveler looking for a driver.
    Requested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Pending,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenderPreference {
    Any,
    FemaleOnly,
}

impl fmt::Display for RideType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideType::Offered => write!(f, "OFFERED"),
            RideType::Requested => write!(f, "REQUESTED"),
        }
    }
}

impl FromStr for RideType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OFFERED" => Ok(RideType::Offered),
            "REQUESTED" => Ok(RideType::Requested),
            other => Err(format!("unknown ride type: {other}")),
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideStatus::Pending => write!(f, "PENDING"),
            RideStatus::Confirmed => write!(f, "CONFIRMED"),
        }
    }
}

impl FromStr for RideStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RideStatus::Pending),
            "CONFIRMED" => Ok(RideStatus::Confirmed),
            other => Err(format!("unknown ride status: {other}")),
        }
    }
}

impl fmt::Display for GenderPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenderPreference::Any => write!(f, "ANY"),
            GenderPreference::FemaleOnly => write!(f, "FEMALE_ONLY"),
        }
    }
}

impl FromStr for GenderPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANY" => Ok(GenderPreference::Any),
            "FEMALE_ONLY" => Ok(GenderPreference::FemaleOnly),
            other => Err(format!("unknown gender preference: {other}")),
        }
    }
}

/// One rider's committed seat on an offered ride: the resolved segment
/// indices into the ride's route plus the agreed price. References its ride
/// and rider by id only; the ride owns the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub traveler_id: Uuid,
    pub pickup_index: usize,
    pub dropoff_index: usize,
    pub price: Decimal,
    pub joined_at: DateTime<Utc>,
}

impl Participation {
    pub fn new(
        ride_id: Uuid,
        traveler_id: Uuid,
        pickup_index: usize,
        dropoff_index: usize,
        price: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            traveler_id,
            pickup_index,
            dropoff_index,
            price,
            joined_at: Utc::now(),
        }
    }
}

/// A posted ride, offered or requested, with its fully resolved route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideOffer {
    pub id: Uuid,
    pub route: Route,
    pub travel_time: DateTime<Utc>,
    pub ride_type: RideType,
    pub status: RideStatus,
    pub vehicle_model: Option<String>,
    pub vehicle_capacity: u32,
    pub gender_preference: GenderPreference,
    pub price: Decimal,
    pub price_per_km: Decimal,
    pub duration_minutes: u32,
    pub distance_km: f64,
    pub route_polyline: String,
    pub driver_note: Option<String>,
    pub requester_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub participants: Vec<Participation>,
    pub created_at: DateTime<Utc>,
}

impl RideOffer {
    pub fn new(
        route: Route,
        travel_time: DateTime<Utc>,
        ride_type: RideType,
        vehicle_capacity: u32,
        gender_preference: GenderPreference,
        price: Decimal,
        requester_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            route,
            travel_time,
            ride_type,
            status: RideStatus::Pending,
            vehicle_model: None,
            vehicle_capacity,
            gender_preference,
            price,
            price_per_km: Decimal::ZERO,
            duration_minutes: 0,
            distance_km: 0.0,
            route_polyline: String::new(),
            driver_note: None,
            requester_id,
            driver_id: None,
            participants: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn remaining_seats(&self) -> i64 {
        self.vehicle_capacity as i64 - self.participants.len() as i64
    }

    /// Whether the traveler posted, drives, or rides on this ride.
    pub fn involves(&self, traveler_id: Uuid) -> bool {
        self.requester_id == traveler_id
            || self.driver_id == Some(traveler_id)
            || self.participants.iter().any(|p| p.traveler_id == traveler_id)
    }
}

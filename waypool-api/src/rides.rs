use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use waypool_ride::models::{Participation, RideOffer, RideType};
use waypool_ride::{RideDraft, RideQuery};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub date: Option<String>,
    pub passengers: Option<u32>,
    pub ride_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRideRequest {
    pub requester_id: Uuid,
    #[serde(flatten)]
    pub draft: RideDraft,
}

#[derive(Debug, Deserialize)]
pub struct JoinRideRequest {
    pub traveler_id: Uuid,
    pub pickup: String,
    pub dropoff: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRideRequest {
    pub driver_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CallerParams {
    pub traveler_id: Uuid,
}

/// A ride as presented to callers: the entity plus derived fields. The
/// requester rating is pulled from the rating collaborator at response
/// time and never persisted.
#[derive(Debug, Serialize)]
pub struct RideResponse {
    pub remaining_seats: i64,
    pub requester_rating: Option<f64>,
    #[serde(flatten)]
    pub ride: RideOffer,
}

// ============================================================================
// Handlers
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/rides", get(search_rides))
        .route("/v1/rides/offer", post(create_offer))
        .route("/v1/rides/request", post(create_request))
        .route("/v1/rides/mine", get(my_rides))
        .route("/v1/rides/{ride_id}", get(ride_detail).delete(delete_ride))
        .route("/v1/rides/{ride_id}/join", post(join_ride))
        .route("/v1/rides/{ride_id}/accept", post(accept_ride))
}

/// GET /v1/rides
/// Filter the active ride set by origin/destination/date/capacity/type.
async fn search_rides(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let query = parse_query(params)?;

    let rides = state
        .store
        .list_rides()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let matches = state.filter.apply(rides, &query, Utc::now());

    let mut responses = Vec::with_capacity(matches.len());
    for ride in matches {
        responses.push(enrich(&state, ride).await);
    }
    Ok(Json(responses))
}

/// POST /v1/rides/offer
async fn create_offer(
    State(state): State<AppState>,
    Json(req): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), AppError> {
    let ride = state.coordinator.create_offer(req.requester_id, req.draft).await?;
    Ok((StatusCode::CREATED, Json(enrich(&state, ride).await)))
}

/// POST /v1/rides/request
async fn create_request(
    State(state): State<AppState>,
    Json(req): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), AppError> {
    let ride = state.coordinator.create_request(req.requester_id, req.draft).await?;
    Ok((StatusCode::CREATED, Json(enrich(&state, ride).await)))
}

/// GET /v1/rides/:ride_id
async fn ride_detail(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.coordinator.ride_detail(ride_id).await?;
    Ok(Json(enrich(&state, ride).await))
}

/// POST /v1/rides/:ride_id/join
async fn join_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Json(req): Json<JoinRideRequest>,
) -> Result<Json<Participation>, AppError> {
    let participation = state
        .coordinator
        .join(ride_id, req.traveler_id, &req.pickup, &req.dropoff, req.price)
        .await?;
    Ok(Json(participation))
}

/// POST /v1/rides/:ride_id/accept
async fn accept_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Json(req): Json<AcceptRideRequest>,
) -> Result<Json<RideResponse>, AppError> {
    let ride = state.coordinator.accept(ride_id, req.driver_id).await?;
    Ok(Json(enrich(&state, ride).await))
}

/// DELETE /v1/rides/:ride_id
async fn delete_ride(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
    Query(caller): Query<CallerParams>,
) -> Result<StatusCode, AppError> {
    state.coordinator.delete(ride_id, caller.traveler_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/rides/mine
async fn my_rides(
    State(state): State<AppState>,
    Query(caller): Query<CallerParams>,
) -> Result<Json<Vec<RideResponse>>, AppError> {
    let rides = state.coordinator.rides_for(caller.traveler_id).await?;

    let mut responses = Vec::with_capacity(rides.len());
    for ride in rides {
        responses.push(enrich(&state, ride).await);
    }
    Ok(Json(responses))
}

fn parse_query(params: SearchParams) -> Result<RideQuery, AppError> {
    let travel_date = match params.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<NaiveDate>().map_err(|_| {
            AppError::Validation(format!("Unparseable travel date: {raw}"))
        })?),
        None => None,
    };

    let ride_type = match params
        .ride_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        // ANY means both types, each under its own sub-filters.
        Some("ANY") | None => None,
        Some(raw) => Some(raw.parse::<RideType>().map_err(AppError::Validation)?),
    };

    Ok(RideQuery {
        origin: params.origin,
        destination: params.destination,
        travel_date,
        passenger_count: params.passengers,
        ride_type,
    })
}

async fn enrich(state: &AppState, ride: RideOffer) -> RideResponse {
    let requester_rating = match state.ratings.average_rating(ride.requester_id).await {
        Ok(rating) => rating,
        Err(e) => {
            tracing::debug!(requester = %ride.requester_id, error = %e, "rating lookup failed");
            None
        }
    };

    RideResponse {
        remaining_seats: ride.remaining_seats(),
        requester_rating,
        ride,
    }
}

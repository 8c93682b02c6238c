use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;
use uuid::Uuid;
use waypool_ride::models::{Participation, RideOffer, RideStatus};
use waypool_ride::store::{RideStore, StoreError, VersionedRide};

/// Postgres-backed ride store. The optimistic version check and the write
/// it guards always run inside one transaction: the version bump is an
/// `UPDATE ... WHERE version = $expected`, and zero affected rows aborts
/// the commit.
pub struct PostgresRideStore {
    pub pool: PgPool,
}

impl PostgresRideStore {
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        tracing::info!("Migrations completed successfully.");
        Ok(())
    }

    async fn participations_for(
        &self,
        ride_id: Uuid,
    ) -> Result<Vec<Participation>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, ride_id, traveler_id, pickup_index, dropoff_index, price, joined_at
            FROM participations
            WHERE ride_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.iter().map(participation_from_row).collect()
    }
}

#[async_trait]
impl RideStore for PostgresRideStore {
    async fn insert_ride(&self, ride: &RideOffer) -> Result<(), StoreError> {
        let route = serde_json::to_value(&ride.route)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO rides (
                id, route, travel_time, ride_type, status, vehicle_model,
                vehicle_capacity, gender_preference, price, price_per_km,
                duration_minutes, distance_km, route_polyline, driver_note,
                requester_id, driver_id, version, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 1, $17)
            "#,
        )
        .bind(ride.id)
        .bind(route)
        .bind(ride.travel_time)
        .bind(ride.ride_type.to_string())
        .bind(ride.status.to_string())
        .bind(ride.vehicle_model.as_deref())
        .bind(ride.vehicle_capacity as i32)
        .bind(ride.gender_preference.to_string())
        .bind(ride.price)
        .bind(ride.price_per_km)
        .bind(ride.duration_minutes as i32)
        .bind(ride.distance_km)
        .bind(&ride.route_polyline)
        .bind(ride.driver_note.as_deref())
        .bind(ride.requester_id)
        .bind(ride.driver_id)
        .bind(ride.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn fetch_ride(&self, id: Uuid) -> Result<Option<VersionedRide>, StoreError> {
        let row = sqlx::query("SELECT * FROM rides WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let version: i64 = row.try_get("version").map_err(backend)?;
        let mut ride = ride_from_row(&row)?;
        ride.participants = self.participations_for(id).await?;

        Ok(Some(VersionedRide {
            ride,
            version: version as u64,
        }))
    }

    async fn list_rides(&self) -> Result<Vec<RideOffer>, StoreError> {
        let rows = sqlx::query("SELECT * FROM rides ORDER BY created_at, id")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;

        let mut rides = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut ride = ride_from_row(row)?;
            ride.participants = self.participations_for(ride.id).await?;
            rides.push(ride);
        }
        Ok(rides)
    }

    async fn delete_ride(&self, id: Uuid) -> Result<(), StoreError> {
        // Participations cascade through the foreign key.
        let result = sqlx::query("DELETE FROM rides WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RideNotFound(id));
        }
        Ok(())
    }

    async fn commit_participation(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        participation: &Participation,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let bumped = sqlx::query("UPDATE rides SET version = version + 1 WHERE id = $1 AND version = $2")
            .bind(ride_id)
            .bind(expected_version as i64)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        if bumped.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM rides WHERE id = $1")
                .bind(ride_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(backend)?;
            return Err(match exists {
                Some(_) => StoreError::VersionConflict(ride_id),
                None => StoreError::RideNotFound(ride_id),
            });
        }

        sqlx::query(
            r#"
            INSERT INTO participations (id, ride_id, traveler_id, pickup_index, dropoff_index, price, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(participation.id)
        .bind(participation.ride_id)
        .bind(participation.traveler_id)
        .bind(participation.pickup_index as i32)
        .bind(participation.dropoff_index as i32)
        .bind(participation.price)
        .bind(participation.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateParticipant {
                    ride_id,
                    traveler_id: participation.traveler_id,
                }
            } else {
                backend(e)
            }
        })?;

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn commit_driver(
        &self,
        ride_id: Uuid,
        expected_version: u64,
        driver_id: Uuid,
        status: RideStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE rides
            SET driver_id = $1, status = $2, version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(driver_id)
        .bind(status.to_string())
        .bind(ride_id)
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM rides WHERE id = $1")
                .bind(ride_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
            return Err(match exists {
                Some(_) => StoreError::VersionConflict(ride_id),
                None => StoreError::RideNotFound(ride_id),
            });
        }
        Ok(())
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

fn ride_from_row(row: &PgRow) -> Result<RideOffer, StoreError> {
    let route: serde_json::Value = row.try_get("route").map_err(backend)?;
    let route = serde_json::from_value(route).map_err(|e| StoreError::Backend(e.to_string()))?;

    let ride_type: String = row.try_get("ride_type").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;
    let gender_preference: String = row.try_get("gender_preference").map_err(backend)?;

    Ok(RideOffer {
        id: row.try_get("id").map_err(backend)?,
        route,
        travel_time: row.try_get("travel_time").map_err(backend)?,
        ride_type: ride_type.parse().map_err(StoreError::Backend)?,
        status: status.parse().map_err(StoreError::Backend)?,
        vehicle_model: row.try_get("vehicle_model").map_err(backend)?,
        vehicle_capacity: row.try_get::<i32, _>("vehicle_capacity").map_err(backend)? as u32,
        gender_preference: gender_preference.parse().map_err(StoreError::Backend)?,
        price: row.try_get::<Decimal, _>("price").map_err(backend)?,
        price_per_km: row.try_get::<Decimal, _>("price_per_km").map_err(backend)?,
        duration_minutes: row.try_get::<i32, _>("duration_minutes").map_err(backend)? as u32,
        distance_km: row.try_get("distance_km").map_err(backend)?,
        route_polyline: row.try_get("route_polyline").map_err(backend)?,
        driver_note: row.try_get("driver_note").map_err(backend)?,
        requester_id: row.try_get("requester_id").map_err(backend)?,
        driver_id: row.try_get("driver_id").map_err(backend)?,
        participants: Vec::new(),
        created_at: row.try_get("created_at").map_err(backend)?,
    })
}

fn participation_from_row(row: &PgRow) -> Result<Participation, StoreError> {
    Ok(Participation {
        id: row.try_get("id").map_err(backend)?,
        ride_id: row.try_get("ride_id").map_err(backend)?,
        traveler_id: row.try_get("traveler_id").map_err(backend)?,
        pickup_index: row.try_get::<i32, _>("pickup_index").map_err(backend)? as usize,
        dropoff_index: row.try_get::<i32, _>("dropoff_index").map_err(backend)? as usize,
        price: row.try_get::<Decimal, _>("price").map_err(backend)?,
        joined_at: row.try_get("joined_at").map_err(backend)?,
    })
}

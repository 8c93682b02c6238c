use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;
use waypool_core::maps::{DirectionsProvider, NoopGeocoder, StaticDirectionsProvider, TravelInfo};
use waypool_core::matching::LocationMatcher;
use waypool_core::route::RoutePoint;
use waypool_ride::models::{GenderPreference, RideStatus, RideType};
use waypool_ride::{RideCoordinator, RideDraft, RideError, RideStore};
use waypool_shared::{Gender, Traveler};
use waypool_store::{InMemoryRideStore, InMemoryTravelerDirectory};

struct FailingDirectionsProvider;

#[async_trait]
impl DirectionsProvider for FailingDirectionsProvider {
    async fn travel_info(
        &self,
        _origin: &str,
        _destination: &str,
        _stops: &[String],
    ) -> Result<TravelInfo, Box<dyn std::error::Error + Send + Sync>> {
        Err("directions API unreachable".into())
    }
}

struct Harness {
    coordinator: Arc<RideCoordinator>,
    store: Arc<InMemoryRideStore>,
    directory: Arc<InMemoryTravelerDirectory>,
}

fn fallback() -> TravelInfo {
    TravelInfo::new(180, 200.0, "", "Default Route")
}

fn harness_with(directions: Arc<dyn DirectionsProvider>) -> Harness {
    let store = Arc::new(InMemoryRideStore::new());
    let directory = Arc::new(InMemoryTravelerDirectory::new());
    let coordinator = Arc::new(RideCoordinator::new(
        store.clone(),
        directory.clone(),
        directions,
        Arc::new(NoopGeocoder),
        LocationMatcher::default(),
        fallback(),
        8,
    ));
    Harness {
        coordinator,
        store,
        directory,
    }
}

fn harness() -> Harness {
    harness_with(Arc::new(StaticDirectionsProvider::new(TravelInfo::new(
        240, 980.5, "abc123", "NH48",
    ))))
}

async fn traveler(harness: &Harness, name: &str, gender: Gender) -> Uuid {
    let t = Traveler::new(name, format!("{}@example.com", name.to_lowercase()), gender);
    let id = t.id;
    harness.directory.register(t).await;
    id
}

fn draft(capacity: u32, preference: GenderPreference) -> RideDraft {
    RideDraft {
        origin: RoutePoint::new("Mumbai", "Dadar Station, Mumbai"),
        stops: vec![RoutePoint::new("Pune", "Pune Junction")],
        destination: RoutePoint::new("Bangalore", "Majestic Bus Stand"),
        travel_time: Utc::now() + Duration::hours(24),
        vehicle_model: Some("WagonR".to_string()),
        vehicle_capacity: capacity,
        gender_preference: preference,
        price: Decimal::from(900),
        driver_note: None,
    }
}

#[tokio::test]
async fn test_create_offer_resolves_travel_info() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    assert_eq!(ride.status, RideStatus::Pending);
    assert_eq!(ride.ride_type, RideType::Offered);
    assert_eq!(ride.route.len(), 3);
    assert_eq!(ride.duration_minutes, 240);
    assert_eq!(ride.distance_km, 980.5);
    assert_eq!(ride.route_polyline, "abc123");
    assert!(ride.price_per_km > Decimal::ZERO);

    // Persisted and fetchable.
    assert!(h.store.fetch_ride(ride.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_create_offer_survives_directions_outage() {
    let h = harness_with(Arc::new(FailingDirectionsProvider));
    let requester = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    assert_eq!(ride.duration_minutes, 180);
    assert_eq!(ride.distance_km, 200.0);
    assert_eq!(ride.route_polyline, "");
}

#[tokio::test]
async fn test_create_requires_known_requester() {
    let h = harness();
    let result = h
        .coordinator
        .create_offer(Uuid::new_v4(), draft(3, GenderPreference::Any))
        .await;
    assert!(matches!(result, Err(RideError::TravelerNotFound(_))));
}

#[tokio::test]
async fn test_join_records_resolved_segment() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    let participation = h
        .coordinator
        .join(ride.id, rider, "Pune", "Bangalore", Decimal::from(400))
        .await
        .unwrap();

    assert_eq!(participation.pickup_index, 1);
    assert_eq!(participation.dropoff_index, 2);
    assert_eq!(participation.price, Decimal::from(400));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.participants.len(), 1);
}

#[tokio::test]
async fn test_join_rejects_requested_rides() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await;
    assert!(matches!(
        result,
        Err(RideError::WrongRideType {
            expected: RideType::Offered
        })
    ));
}

#[tokio::test]
async fn test_join_rejects_backward_segment() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, rider, "Bangalore", "Mumbai", Decimal::from(400))
        .await;
    assert!(matches!(result, Err(RideError::InvalidSegment)));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert!(stored.ride.participants.is_empty());
}

#[tokio::test]
async fn test_join_enforces_gender_preference() {
    let h = harness();
    let requester = traveler(&h, "Priya", Gender::Female).await;
    let rider = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::FemaleOnly))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await;
    assert!(matches!(result, Err(RideError::GenderRestricted)));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert!(stored.ride.participants.is_empty());
}

#[tokio::test]
async fn test_join_rejects_when_full() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let first = traveler(&h, "Asha", Gender::Female).await;
    let second = traveler(&h, "Ravi", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    h.coordinator
        .join(ride.id, first, "Mumbai", "Pune", Decimal::from(200))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, second, "Mumbai", "Pune", Decimal::from(200))
        .await;
    assert!(matches!(result, Err(RideError::RideFull)));
}

#[tokio::test]
async fn test_full_check_precedes_duplicate_check() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    h.coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await
        .unwrap();

    // The ride is now full AND the rider already joined; capacity is
    // validated first.
    let result = h
        .coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await;
    assert!(matches!(result, Err(RideError::RideFull)));
}

#[tokio::test]
async fn test_join_rejects_own_ride() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, requester, "Mumbai", "Pune", Decimal::from(200))
        .await;
    assert!(matches!(result, Err(RideError::OwnRide)));
}

#[tokio::test]
async fn test_join_rejects_duplicate() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    h.coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await
        .unwrap();

    let result = h
        .coordinator
        .join(ride.id, rider, "Pune", "Bangalore", Decimal::from(300))
        .await;
    assert!(matches!(result, Err(RideError::AlreadyJoined)));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.participants.len(), 1);
}

#[tokio::test]
async fn test_accept_confirms_request() {
    let h = harness();
    let requester = traveler(&h, "Asha", Gender::Female).await;
    let driver = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    let accepted = h.coordinator.accept(ride.id, driver).await.unwrap();
    assert_eq!(accepted.status, RideStatus::Confirmed);
    assert_eq!(accepted.driver_id, Some(driver));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.status, RideStatus::Confirmed);
    assert_eq!(stored.ride.driver_id, Some(driver));
}

#[tokio::test]
async fn test_accept_rejects_offered_rides() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let driver = traveler(&h, "Ravi", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();

    let result = h.coordinator.accept(ride.id, driver).await;
    assert!(matches!(
        result,
        Err(RideError::WrongRideType {
            expected: RideType::Requested
        })
    ));
}

#[tokio::test]
async fn test_second_accept_is_a_conflict_not_a_noop() {
    let h = harness();
    let requester = traveler(&h, "Asha", Gender::Female).await;
    let first = traveler(&h, "Dev", Gender::Male).await;
    let second = traveler(&h, "Ravi", Gender::Male).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    h.coordinator.accept(ride.id, first).await.unwrap();
    let result = h.coordinator.accept(ride.id, second).await;
    assert!(matches!(result, Err(RideError::AlreadyAccepted)));

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.driver_id, Some(first));
}

#[tokio::test]
async fn test_accept_enforces_gender_preference_and_ownership() {
    let h = harness();
    let requester = traveler(&h, "Priya", Gender::Female).await;
    let male_driver = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::FemaleOnly))
        .await
        .unwrap();

    let result = h.coordinator.accept(ride.id, male_driver).await;
    assert!(matches!(result, Err(RideError::GenderRestricted)));

    let result = h.coordinator.accept(ride.id, requester).await;
    assert!(matches!(result, Err(RideError::OwnRide)));
}

#[tokio::test]
async fn test_delete_is_owner_only_and_cascades() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;
    let stranger = traveler(&h, "Ravi", Gender::Male).await;

    let ride = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();
    h.coordinator
        .join(ride.id, rider, "Mumbai", "Pune", Decimal::from(200))
        .await
        .unwrap();

    let result = h.coordinator.delete(ride.id, stranger).await;
    assert!(matches!(result, Err(RideError::NotOwner)));

    h.coordinator.delete(ride.id, requester).await.unwrap();
    assert!(h.store.fetch_ride(ride.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_assigned_driver_may_delete() {
    let h = harness();
    let requester = traveler(&h, "Asha", Gender::Female).await;
    let driver = traveler(&h, "Dev", Gender::Male).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();
    h.coordinator.accept(ride.id, driver).await.unwrap();

    h.coordinator.delete(ride.id, driver).await.unwrap();
    assert!(h.store.fetch_ride(ride.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_rides_for_lists_posted_and_joined() {
    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let rider = traveler(&h, "Asha", Gender::Female).await;

    let posted = h
        .coordinator
        .create_offer(requester, draft(3, GenderPreference::Any))
        .await
        .unwrap();
    let joined = h
        .coordinator
        .create_offer(rider, draft(3, GenderPreference::Any))
        .await
        .unwrap();
    h.coordinator
        .join(joined.id, requester, "Mumbai", "Pune", Decimal::from(200))
        .await
        .unwrap();

    let mine = h.coordinator.rides_for(requester).await.unwrap();
    let ids: Vec<Uuid> = mine.iter().map(|r| r.id).collect();
    assert!(ids.contains(&posted.id));
    assert!(ids.contains(&joined.id));

    let theirs = h.coordinator.rides_for(rider).await.unwrap();
    assert_eq!(theirs.len(), 1);
    assert_eq!(theirs[0].id, joined.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_never_oversubscribe() {
    const CAPACITY: u32 = 3;

    let h = harness();
    let requester = traveler(&h, "Dev", Gender::Male).await;
    let ride = h
        .coordinator
        .create_offer(requester, draft(CAPACITY, GenderPreference::Any))
        .await
        .unwrap();

    let mut riders = Vec::new();
    for i in 0..(CAPACITY + 1) {
        riders.push(traveler(&h, &format!("Rider{i}"), Gender::Female).await);
    }

    let mut handles = Vec::new();
    for rider in riders {
        let coordinator = h.coordinator.clone();
        let ride_id = ride.id;
        handles.push(tokio::spawn(async move {
            coordinator
                .join(ride_id, rider, "Mumbai", "Bangalore", Decimal::from(500))
                .await
        }));
    }

    let mut successes = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(RideError::RideFull) => full += 1,
            Err(other) => panic!("unexpected join outcome: {other}"),
        }
    }

    assert_eq!(successes, CAPACITY);
    assert_eq!(full, 1);

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.participants.len(), CAPACITY as usize);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_accepts_have_one_winner() {
    let h = harness();
    let requester = traveler(&h, "Asha", Gender::Female).await;
    let first = traveler(&h, "Dev", Gender::Male).await;
    let second = traveler(&h, "Ravi", Gender::Male).await;

    let ride = h
        .coordinator
        .create_request(requester, draft(1, GenderPreference::Any))
        .await
        .unwrap();

    let a = {
        let coordinator = h.coordinator.clone();
        let ride_id = ride.id;
        tokio::spawn(async move { coordinator.accept(ride_id, first).await })
    };
    let b = {
        let coordinator = h.coordinator.clone();
        let ride_id = ride.id;
        tokio::spawn(async move { coordinator.accept(ride_id, second).await })
    };

    let outcomes = vec![a.await.unwrap(), b.await.unwrap()];
    let wins = outcomes.iter().filter(|o| o.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|o| matches!(o, Err(RideError::AlreadyAccepted)))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    let stored = h.store.fetch_ride(ride.id).await.unwrap().unwrap();
    assert_eq!(stored.ride.status, RideStatus::Confirmed);
    assert!(stored.ride.driver_id.is_some());
}

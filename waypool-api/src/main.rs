use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waypool_api::{app, AppState};
use waypool_core::maps::{NoopGeocoder, StaticDirectionsProvider};
use waypool_core::matching::LocationMatcher;
use waypool_ride::{RideCoordinator, RideStore, SearchFilter};
use waypool_shared::{Gender, Traveler};
use waypool_store::app_config::StoreBackend;
use waypool_store::{InMemoryRatings, InMemoryRideStore, InMemoryTravelerDirectory, PostgresRideStore};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypool_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = waypool_store::app_config::Config::load().expect("Failed to load config");
    tracing::info!("Starting Waypool API on port {}", config.server.port);

    let store: Arc<dyn RideStore> = match config.database.backend {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory ride store");
            Arc::new(InMemoryRideStore::new())
        }
        StoreBackend::Postgres => {
            let store = PostgresRideStore::connect(&config.database.url)
                .await
                .expect("Failed to connect to Postgres");
            store.migrate().await.expect("Failed to run migrations");
            Arc::new(store)
        }
    };

    // Identity and rating collaborators are external systems; the bundled
    // in-memory stand-ins carry a couple of demo travelers for local use.
    let directory = Arc::new(InMemoryTravelerDirectory::new());
    if config.database.backend == StoreBackend::Memory {
        for traveler in [
            Traveler::new("Asha Demo", "asha@waypool.local", Gender::Female),
            Traveler::new("Dev Demo", "dev@waypool.local", Gender::Male),
        ] {
            tracing::info!(id = %traveler.id, name = %traveler.name, "registered demo traveler");
            directory.register(traveler).await;
        }
    }
    let ratings = Arc::new(InMemoryRatings::new());

    let matcher = LocationMatcher::new(config.matching.clone());
    let fallback = config.business_rules.fallback_travel_info();

    let coordinator = Arc::new(RideCoordinator::new(
        store.clone(),
        directory.clone(),
        Arc::new(StaticDirectionsProvider::new(fallback.clone())),
        Arc::new(NoopGeocoder),
        matcher.clone(),
        fallback,
        config.business_rules.commit_retry_attempts,
    ));
    let filter = Arc::new(SearchFilter::new(
        matcher,
        config.business_rules.search_cutoff_hours,
    ));

    let app_state = AppState {
        coordinator,
        filter,
        store,
        ratings,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}

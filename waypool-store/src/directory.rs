use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;
use waypool_core::identity::TravelerDirectory;
use waypool_core::rating::RatingProvider;
use waypool_shared::Traveler;

/// In-memory stand-in for the external identity collaborator.
pub struct InMemoryTravelerDirectory {
    travelers: RwLock<HashMap<Uuid, Traveler>>,
}

impl InMemoryTravelerDirectory {
    pub fn new() -> Self {
        Self {
            travelers: RwLock::new(HashMap::new()),
        }
    }

    pub async fn register(&self, traveler: Traveler) {
        let mut travelers = self.travelers.write().await;
        travelers.insert(traveler.id, traveler);
    }
}

impl Default for InMemoryTravelerDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TravelerDirectory for InMemoryTravelerDirectory {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Traveler>, Box<dyn std::error::Error + Send + Sync>> {
        let travelers = self.travelers.read().await;
        Ok(travelers.get(&id).cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Traveler>, Box<dyn std::error::Error + Send + Sync>> {
        let travelers = self.travelers.read().await;
        Ok(travelers.values().find(|t| t.email.0 == email).cloned())
    }
}

/// In-memory stand-in for the external rating collaborator.
pub struct InMemoryRatings {
    scores: RwLock<HashMap<Uuid, Vec<f64>>>,
}

impl InMemoryRatings {
    pub fn new() -> Self {
        Self {
            scores: RwLock::new(HashMap::new()),
        }
    }

    pub async fn rate(&self, traveler_id: Uuid, score: f64) {
        let mut scores = self.scores.write().await;
        scores.entry(traveler_id).or_default().push(score);
    }
}

impl Default for InMemoryRatings {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RatingProvider for InMemoryRatings {
    async fn average_rating(
        &self,
        traveler_id: Uuid,
    ) -> Result<Option<f64>, Box<dyn std::error::Error + Send + Sync>> {
        let scores = self.scores.read().await;
        Ok(scores.get(&traveler_id).and_then(|s| {
            if s.is_empty() {
                None
            } else {
                Some(s.iter().sum::<f64>() / s.len() as f64)
            }
        }))
    }
}

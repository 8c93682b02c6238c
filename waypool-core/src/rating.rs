use async_trait::async_trait;
use uuid::Uuid;

/// Read-side of the rating system. The engine only consumes the average to
/// decorate search results; it never writes ratings.
#[async_trait]
pub trait RatingProvider: Send + Sync {
    /// `Ok(None)` when the traveler has no ratings yet.
    async fn average_rating(
        &self,
        traveler_id: Uuid,
    ) -> Result<Option<f64>, Box<dyn std::error::Error + Send + Sync>>;
}

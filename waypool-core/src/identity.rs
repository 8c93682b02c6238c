use async_trait::async_trait;
use uuid::Uuid;
use waypool_shared::Traveler;

/// Identity lookup collaborator. Travelers are resolved by opaque id or by
/// email; absence is a NotFound condition for the calling operation.
#[async_trait]
pub trait TravelerDirectory: Send + Sync {
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Traveler>, Box<dyn std::error::Error + Send + Sync>>;

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Traveler>, Box<dyn std::error::Error + Send + Sync>>;
}

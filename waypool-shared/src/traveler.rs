use crate::pii::Masked;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Female,
    Male,
    Unspecified,
}

/// A traveler as resolved through the identity collaborator. Read-only from
/// the engine's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Traveler {
    pub id: Uuid,
    pub name: String,
    pub email: Masked<String>,
    pub gender: Gender,
}

impl Traveler {
    pub fn new(name: impl Into<String>, email: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: Masked(email.into()),
            gender,
        }
    }
}

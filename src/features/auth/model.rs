use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller identity established by a verified bearer token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuthenticatedUser {
    /// Subject claim; owns every item the caller creates
    pub sub: String,
}

impl AuthenticatedUser {
    pub fn new(sub: impl Into<String>) -> Self {
        Self { sub: sub.into() }
    }

    /// Scope key for all item lookups
    pub fn owner_id(&self) -> &str {
        &self.sub
    }
}

use async_trait::async_trait;

use super::model::AuthenticatedUser;
use crate::core::error::AppError;

/// Turns a bearer token into a caller identity, or rejects it
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser, AppError>;
}

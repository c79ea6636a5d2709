mod jwks;
mod validator;

pub mod model;
pub mod verifier;

pub use jwks::JwksClient;
pub use model::AuthenticatedUser;
pub use validator::JwtValidator;
pub use verifier::TokenVerifier;

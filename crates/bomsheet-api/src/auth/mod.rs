pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod models;

pub use jwt::JwtVerifier;
pub use models::OwnerContext;

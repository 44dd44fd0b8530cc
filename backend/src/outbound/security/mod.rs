//! Credential adapters: bcrypt password hashing, HS256 bearer tokens, and
//! loading of the token signing secret.

mod bcrypt_hasher;
pub mod fingerprint;
mod jwt_token_service;
pub mod token_secret;

pub use bcrypt_hasher::BcryptPasswordHasher;
pub use jwt_token_service::{Claims, JwtTokenService};
pub use token_secret::{BuildMode, TokenSecret, TokenSecretError, token_secret_from_env};

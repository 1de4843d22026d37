//! Authentication test helpers

use teamhub::backend::auth::{create_token, JwtKeys};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "teamhub-test-secret";

pub fn test_keys() -> JwtKeys {
    JwtKeys::new(TEST_JWT_SECRET)
}

/// Generate a test JWT token
pub fn generate_test_token(user_id: Uuid, email: &str) -> String {
    create_token(user_id, email, &test_keys()).expect("Failed to generate test token")
}

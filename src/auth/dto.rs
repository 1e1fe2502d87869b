use jsonwebtoken::{DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use time::Duration;

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
}

/// Request body for `POST /jwt`.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
}

/// Body returned by token issue and logout.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub success: bool,
}

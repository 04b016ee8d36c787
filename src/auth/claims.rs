use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
///
/// `sub` is optional on the decode side so that a correctly signed token
/// without a subject can be told apart from a forged one internally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>, // username
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
    pub iss: String, // issuer
    pub aud: String, // audience
}

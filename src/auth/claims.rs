use serde::{Deserialize, Serialize};

/// JWT payload issued after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub iss: String, // issuer
    pub sub: String, // same as user_id
    pub iat: i64,    // issued at (unix timestamp)
    pub exp: i64,    // expires at (unix timestamp)
}

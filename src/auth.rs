//! Sign-in and sign-up against the backend's `/users` endpoints.
//!
//! No local validation happens here beyond what the caller's form enforces.
//! Persisting the returned token is the caller's job (see
//! [`crate::app::App::sign_in`]).

use crate::api::ApiClient;
use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

pub const SIGN_IN_PATH: &str = "/users/signin";
pub const SIGN_UP_PATH: &str = "/users/signup";

/// Email/password pair posted to the sign-in endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Registration fields posted to the sign-up endpoint.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SignupPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignupPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupPayload")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body returned by both auth endpoints on success.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The two auth operations.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /users/signin`.
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, AuthError> {
        info!("Signing in as {}", credentials.email);
        self.api
            .post_json(SIGN_IN_PATH, credentials)
            .await
            .map_err(AuthError::SignIn)
    }

    /// `POST /users/signup`.
    pub async fn signup(&self, payload: &SignupPayload) -> Result<AuthResponse, AuthError> {
        info!("Registering {}", payload.email);
        self.api
            .post_json(SIGN_UP_PATH, payload)
            .await
            .map_err(AuthError::SignUp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let c = Credentials::new("a@b.c", "hunter2");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("a@b.c"));
    }

    #[test]
    fn signup_omits_missing_name() {
        let p = SignupPayload {
            name: None,
            email: "a@b.c".into(),
            password: "pw".into(),
        };
        let json = serde_json::to_value(&p).unwrap();
        assert!(json.get("name").is_none());
        assert_eq!(json["email"], "a@b.c");
    }

    #[test]
    fn auth_response_tolerates_missing_fields() {
        let r: AuthResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(r, AuthResponse::default());
        let r: AuthResponse = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(r.token.as_deref(), Some("abc"));
    }
}

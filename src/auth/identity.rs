//! Identity Toolkit (email/password) and Secure Token REST client

use super::{AuthError, AuthService, AuthSession};
use crate::config::BackendConfig;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const DEFAULT_EXPIRY_SECS: i64 = 3600;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest<'a> {
    id_token: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    email: String,
    id_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    id_token: String,
    refresh_token: String,
    user_id: String,
    #[serde(default)]
    expires_in: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

fn expiry(expires_in: Option<&str>) -> chrono::DateTime<Utc> {
    let secs = expires_in
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_EXPIRY_SECS);
    Utc::now() + Duration::seconds(secs)
}

/// Map a service error code like `WEAK_PASSWORD : Password should be ...`
fn map_error_code(message: &str) -> AuthError {
    let (code, detail) = match message.split_once(" : ") {
        Some((code, detail)) => (code.trim(), detail.trim()),
        None => (message.trim(), ""),
    };

    match code {
        "EMAIL_EXISTS" => AuthError::EmailInUse,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
        "WEAK_PASSWORD" if detail.is_empty() => {
            AuthError::WeakPassword("Password should be at least 6 characters".to_string())
        }
        "WEAK_PASSWORD" => AuthError::WeakPassword(detail.to_string()),
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "EMAIL_NOT_FOUND" | "MISSING_PASSWORD" => {
            AuthError::InvalidCredential
        }
        "USER_DISABLED" => AuthError::UserDisabled,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthError::TooManyAttempts,
        "TOKEN_EXPIRED" | "INVALID_REFRESH_TOKEN" | "INVALID_ID_TOKEN" | "USER_NOT_FOUND"
        | "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" => AuthError::SessionExpired,
        _ => AuthError::Service(message.to_string()),
    }
}

/// Auth service speaking the Identity Toolkit v1 REST API
#[derive(Debug, Clone)]
pub struct IdentityToolkitAuth {
    client: Client,
    auth_url: String,
    token_url: String,
    api_key: String,
}

impl IdentityToolkitAuth {
    pub fn new(config: &BackendConfig, client: Client) -> Self {
        Self {
            client,
            auth_url: config.auth_url.trim_end_matches('/').to_string(),
            token_url: config.token_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn accounts_url(&self, action: &str) -> String {
        format!("{}/accounts:{}", self.auth_url, action)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, AuthError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) if !parsed.error.message.is_empty() => Err(map_error_code(&parsed.error.message)),
            _ => Err(AuthError::Status {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    async fn password_call(&self, action: &str, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.accounts_url(action))
            .query(&[("key", &self.api_key)])
            .json(&PasswordRequest {
                email,
                password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let account: AccountResponse = Self::parse(response).await?;
        debug!(action, uid = %account.local_id, "account call succeeded");
        let email = if account.email.is_empty() {
            email.to_string()
        } else {
            account.email
        };
        Ok(AuthSession::new(
            account.local_id,
            email,
            account.id_token,
            account.refresh_token,
            expiry(account.expires_in.as_deref()),
        ))
    }
}

#[async_trait]
impl AuthService for IdentityToolkitAuth {
    async fn sign_up(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        self.password_call("signInWithPassword", email, password).await
    }

    async fn update_password(&self, session: &AuthSession, new_password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(self.accounts_url("update"))
            .query(&[("key", &self.api_key)])
            .json(&UpdatePasswordRequest {
                id_token: &session.id_token,
                password: new_password,
                return_secure_token: true,
            })
            .send()
            .await?;

        let account: AccountResponse = Self::parse(response).await?;
        Ok(AuthSession::new(
            account.local_id,
            session.email.clone(),
            account.id_token,
            account.refresh_token,
            expiry(account.expires_in.as_deref()),
        ))
    }

    async fn refresh(&self, session: &AuthSession) -> Result<AuthSession, AuthError> {
        let response = self
            .client
            .post(format!("{}/token", self.token_url))
            .query(&[("key", &self.api_key)])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let tokens: TokenResponse = Self::parse(response).await?;
        debug!(uid = %tokens.user_id, "id token refreshed");
        Ok(AuthSession::new(
            tokens.user_id,
            session.email.clone(),
            tokens.id_token,
            tokens.refresh_token,
            expiry(tokens.expires_in.as_deref()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth_for(server: &MockServer) -> IdentityToolkitAuth {
        let config = BackendConfig {
            api_key: "test-key".to_string(),
            auth_url: server.uri(),
            token_url: server.uri(),
            ..BackendConfig::default()
        };
        IdentityToolkitAuth::new(&config, Client::new())
    }

    fn error_response(message: &str) -> ResponseTemplate {
        ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": message, "errors": [] }
        }))
    }

    #[tokio::test]
    async fn test_sign_in() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .and(query_param("key", "test-key"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "password": "secret",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": "u1",
                "email": "ada@example.com",
                "idToken": "id-1",
                "refreshToken": "refresh-1",
                "expiresIn": "3600",
                "registered": true
            })))
            .mount(&server)
            .await;

        let session = auth_for(&server).sign_in("ada@example.com", "secret").await.unwrap();
        assert_eq!(session.uid, "u1");
        assert_eq!(session.id_token, "id-1");
        assert_eq!(session.refresh_token, "refresh-1");
        assert!(!session.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_sign_up_with_existing_email() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(error_response("EMAIL_EXISTS"))
            .mount(&server)
            .await;

        let result = auth_for(&server).sign_up("ada@example.com", "secret").await;
        assert!(matches!(result, Err(AuthError::EmailInUse)));
    }

    #[tokio::test]
    async fn test_weak_password_keeps_detail() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signUp"))
            .respond_with(error_response(
                "WEAK_PASSWORD : Password should be at least 6 characters",
            ))
            .mount(&server)
            .await;

        let result = auth_for(&server).sign_up("ada@example.com", "123").await;
        match result {
            Err(e) => assert_eq!(e.to_string(), "Password should be at least 6 characters"),
            Ok(_) => panic!("weak password accepted"),
        }
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credential() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(error_response("INVALID_LOGIN_CREDENTIALS"))
            .mount(&server)
            .await;

        let result = auth_for(&server).sign_in("ada@example.com", "nope").await;
        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_update_password_reissues_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:update"))
            .and(body_json(json!({
                "idToken": "id-1",
                "password": "newpass",
                "returnSecureToken": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "localId": "u1",
                "email": "ada@example.com",
                "idToken": "id-2",
                "refreshToken": "refresh-2",
                "expiresIn": "3600"
            })))
            .mount(&server)
            .await;

        let session = AuthSession::new("u1", "ada@example.com", "id-1", "refresh-1", Utc::now());
        let updated = auth_for(&server).update_password(&session, "newpass").await.unwrap();
        assert_eq!(updated.id_token, "id-2");
        assert_eq!(updated.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(query_param("key", "test-key"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "expires_in": "3600",
                "token_type": "Bearer",
                "refresh_token": "refresh-2",
                "id_token": "id-2",
                "user_id": "u1",
                "project_id": "123"
            })))
            .mount(&server)
            .await;

        let stale = AuthSession::new("u1", "ada@example.com", "id-1", "refresh-1", Utc::now());
        let fresh = auth_for(&server).refresh(&stale).await.unwrap();
        assert_eq!(fresh.id_token, "id-2");
        assert_eq!(fresh.refresh_token, "refresh-2");
        assert_eq!(fresh.email, "ada@example.com");
        assert!(!fresh.is_expired(Utc::now()));
    }

    #[tokio::test]
    async fn test_revoked_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(error_response("TOKEN_EXPIRED"))
            .mount(&server)
            .await;

        let stale = AuthSession::new("u1", "ada@example.com", "id-1", "refresh-1", Utc::now());
        let result = auth_for(&server).refresh(&stale).await;
        assert!(matches!(result, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_unparseable_error_keeps_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/accounts:signInWithPassword"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .mount(&server)
            .await;

        match auth_for(&server).sign_in("ada@example.com", "secret").await {
            Err(AuthError::Status { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "upstream unavailable");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_error_codes() {
        assert!(matches!(map_error_code("EMAIL_NOT_FOUND"), AuthError::InvalidCredential));
        assert!(matches!(map_error_code("USER_DISABLED"), AuthError::UserDisabled));
        assert!(matches!(
            map_error_code("TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled"),
            AuthError::TooManyAttempts
        ));
        assert!(matches!(map_error_code("OPERATION_NOT_ALLOWED"), AuthError::Service(_)));
    }
}

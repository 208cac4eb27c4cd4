//! Password authentication against the identity service

use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{config::Credentials, error::AuthError, token::Token};

#[derive(Serialize)]
struct AuthRequest<'a> {
    auth: AuthBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthBody<'a> {
    tenant_id: &'a str,
    password_credentials: PasswordCredentials<'a>,
}

#[derive(Serialize)]
struct PasswordCredentials<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    access: Access,
}

#[derive(Deserialize)]
struct Access {
    token: Token,
}

/// Exchanges credentials for a fresh token. Does not touch the token cache.
#[derive(Clone, Debug)]
pub struct Authenticator {
    http: Client,
    credentials: Credentials,
    user_agent: String,
}

impl Authenticator {
    pub fn new(http: Client, credentials: Credentials, user_agent: impl Into<String>) -> Self {
        Self {
            http,
            credentials,
            user_agent: user_agent.into(),
        }
    }

    /// URL the credentials are posted to
    pub fn tokens_url(&self) -> String {
        format!("{}/tokens", self.credentials.auth_url.trim_end_matches('/'))
    }

    /// Request a new token
    #[instrument(skip(self), fields(tenant_id = %self.credentials.tenant_id, username = %self.credentials.username))]
    pub async fn authenticate(&self) -> Result<Token, AuthError> {
        let url = self.tokens_url();
        let body = AuthRequest {
            auth: AuthBody {
                tenant_id: &self.credentials.tenant_id,
                password_credentials: PasswordCredentials {
                    username: &self.credentials.username,
                    password: &self.credentials.password,
                },
            },
        };

        debug!("Requesting token from {}", url);
        let response = self
            .http
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, &self.user_agent)
            .json(&body)
            .send()
            .await
            .map_err(AuthError::Unreachable)?;

        let status = response.status();
        let text = response.text().await.map_err(AuthError::Unreachable)?;
        if !status.is_success() {
            return Err(AuthError::rejected(status, &text));
        }

        let parsed: AuthResponse = serde_json::from_str(&text)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        Ok(parsed.access.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator(auth_url: &str) -> Authenticator {
        Authenticator::new(
            Client::new(),
            Credentials::new(auth_url, "tenant", "alice", "secret"),
            "cono-test/1.0",
        )
    }

    #[test]
    fn test_tokens_url_tolerates_trailing_slash() {
        assert_eq!(
            authenticator("https://id.example.com/v2.0/").tokens_url(),
            "https://id.example.com/v2.0/tokens"
        );
        assert_eq!(
            authenticator("https://id.example.com/v2.0").tokens_url(),
            "https://id.example.com/v2.0/tokens"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = AuthRequest {
            auth: AuthBody {
                tenant_id: "tenant",
                password_credentials: PasswordCredentials {
                    username: "alice",
                    password: "secret",
                },
            },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "auth": {
                    "tenantId": "tenant",
                    "passwordCredentials": {"username": "alice", "password": "secret"}
                }
            })
        );
    }

    #[test]
    fn test_response_without_token_is_rejected() {
        let parsed = serde_json::from_str::<AuthResponse>(r#"{"access":{"user":{}}}"#);
        assert!(parsed.is_err());
    }
}

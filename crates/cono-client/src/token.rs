//! Tokens and the in-memory token state owned by a client

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Short-lived bearer credential returned by the identity service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Opaque token id sent as `X-Auth-Token`
    pub id: String,
    /// Instant after which the service rejects the token
    pub expires: DateTime<Utc>,
}

impl Token {
    pub fn new(id: impl Into<String>, expires: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            expires,
        }
    }

    /// A token is usable only while its expiry lies strictly in the future
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires > now
    }
}

/// Check an optional token against `now`
pub fn is_valid(token: Option<&Token>, now: DateTime<Utc>) -> bool {
    token.is_some_and(|t| t.is_valid_at(now))
}

/// Token currently held by a client instance
#[derive(Debug, Default)]
pub struct TokenState {
    current: Option<Token>,
}

impl TokenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The held token, if it is still valid at `now`
    pub fn valid_at(&self, now: DateTime<Utc>) -> Option<&Token> {
        self.current.as_ref().filter(|t| t.is_valid_at(now))
    }

    /// The held token regardless of expiry
    pub fn get(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Adopt `token`, returning its id
    pub fn replace(&mut self, token: Token) -> &str {
        &self.current.insert(token).id
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[rstest]
    #[case(-3600, false)]
    #[case(-1, false)]
    #[case(0, false)]
    #[case(1, true)]
    #[case(3600, true)]
    fn test_validity_boundary(#[case] offset_secs: i64, #[case] expected: bool) {
        let now = Utc::now();
        let token = Token::new("abc", now + Duration::seconds(offset_secs));
        assert_eq!(token.is_valid_at(now), expected);
        assert_eq!(is_valid(Some(&token), now), expected);
    }

    #[test]
    fn test_absent_token_is_invalid() {
        assert!(!is_valid(None, Utc::now()));
    }

    #[test]
    fn test_state_hides_expired_token() {
        let now = Utc::now();
        let mut state = TokenState::new();
        assert!(state.valid_at(now).is_none());

        state.replace(Token::new("old", now - Duration::seconds(5)));
        assert!(state.valid_at(now).is_none());
        assert_eq!(state.get().map(|t| t.id.as_str()), Some("old"));

        let id = state.replace(Token::new("new", now + Duration::minutes(30)));
        assert_eq!(id, "new");
        assert_eq!(state.valid_at(now).map(|t| t.id.as_str()), Some("new"));

        state.clear();
        assert!(state.get().is_none());
    }

    #[test]
    fn test_deserializes_offset_timestamps() {
        let token: Token = serde_json::from_str(
            r#"{"id":"abc","expires":"2026-10-18T21:00:00+09:00","issued_at":"2026-10-17T21:00:00+09:00"}"#,
        )
        .unwrap();
        assert_eq!(token.id, "abc");
        assert_eq!(token.expires.to_rfc3339(), "2026-10-18T12:00:00+00:00");
    }
}

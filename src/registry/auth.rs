use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::registry::error::ClientError;

static PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([A-Za-z_]+)="([^"]*)""#).expect("Challenge regex is valid"));

/// A parsed `WWW-Authenticate` header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Challenge {
    Basic {
        realm: Option<String>,
    },
    Bearer {
        realm: String,
        service: Option<String>,
        scope: Option<String>,
    },
}

impl Challenge {
    pub fn parse(header: &str) -> Result<Self, ClientError> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));

        let mut params: HashMap<String, String> = PARAMS
            .captures_iter(rest)
            .map(|caps| (caps[1].to_ascii_lowercase(), caps[2].to_string()))
            .collect();

        if scheme.eq_ignore_ascii_case("basic") {
            return Ok(Challenge::Basic {
                realm: params.remove("realm"),
            });
        }

        if scheme.eq_ignore_ascii_case("bearer") {
            let realm = params
                .remove("realm")
                .ok_or_else(|| ClientError::Challenge(format!("missing realm in '{header}'")))?;

            return Ok(Challenge::Bearer {
                realm,
                service: params.remove("service"),
                scope: params.remove("scope"),
            });
        }

        Err(ClientError::Challenge(format!(
            "unsupported scheme '{scheme}'"
        )))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
    expires_in: Option<i64>,
    issued_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug)]
pub(crate) struct BearerToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }
}

impl TryFrom<TokenResponse> for BearerToken {
    type Error = ClientError;

    fn try_from(response: TokenResponse) -> Result<Self, Self::Error> {
        let token = response
            .token
            .or(response.access_token)
            .ok_or_else(|| ClientError::Challenge("token response has no token".to_string()))?;

        let expires_at = response.expires_in.map(|expires_in| {
            response.issued_at.unwrap_or_else(Utc::now) + Duration::seconds(expires_in)
        });

        Ok(BearerToken { token, expires_at })
    }
}

/// What the client has learned about authenticating against the registry.
#[derive(Debug, Default)]
pub(crate) struct AuthState {
    pub challenge: Option<Challenge>,
    pub token: Option<BearerToken>,
}

impl AuthState {
    /// The cached token, unless it has expired.
    pub fn bearer(&self) -> Option<&str> {
        self.token
            .as_ref()
            .filter(|token| !token.is_expired(Utc::now()))
            .map(|token| token.token.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bearer() {
        let challenge = Challenge::parse(
            r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:samalba/my-app:pull,push""#,
        )
        .unwrap();

        assert_eq!(
            challenge,
            Challenge::Bearer {
                realm: "https://auth.docker.io/token".to_string(),
                service: Some("registry.docker.io".to_string()),
                scope: Some("repository:samalba/my-app:pull,push".to_string()),
            }
        );
    }

    #[test]
    fn parse_basic() {
        let challenge = Challenge::parse(r#"Basic realm="Registry Realm""#).unwrap();

        assert_eq!(
            challenge,
            Challenge::Basic {
                realm: Some("Registry Realm".to_string())
            }
        );
    }

    #[test]
    fn parse_bearer_without_realm() {
        assert!(Challenge::parse(r#"Bearer service="registry""#).is_err());
    }

    #[test]
    fn parse_unknown_scheme() {
        assert!(Challenge::parse("Negotiate abc").is_err());
    }

    #[test]
    fn token_expiry() {
        let issued_at = Utc::now() - Duration::seconds(600);
        let token = BearerToken::try_from(TokenResponse {
            token: None,
            access_token: Some("abc".to_string()),
            expires_in: Some(300),
            issued_at: Some(issued_at),
        })
        .unwrap();

        assert_eq!(token.token, "abc");
        assert!(token.is_expired(Utc::now()));

        let state = AuthState {
            challenge: None,
            token: Some(token),
        };
        assert_eq!(state.bearer(), None);
    }

    #[test]
    fn token_without_expiry() {
        let token = BearerToken::try_from(TokenResponse {
            token: Some("abc".to_string()),
            access_token: None,
            expires_in: None,
            issued_at: None,
        })
        .unwrap();

        let state = AuthState {
            challenge: None,
            token: Some(token),
        };
        assert_eq!(state.bearer(), Some("abc"));
    }
}

//! Storage partition keys.
//!
//! Authenticated users are keyed by a prefix of their access token, guests by
//! a random token kept in their session. Refreshing an access token therefore
//! moves an authenticated user to a new partition; nothing here tries to
//! follow them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::error::{AgendaError, AgendaResult};

/// Number of access-token characters kept in a user partition key.
pub const TOKEN_PREFIX_LEN: usize = 16;

/// Random bytes in a guest session token (rendered as twice as many hex chars).
const SESSION_TOKEN_BYTES: usize = 8;

const USER_PREFIX: &str = "user_";
const GUEST_PREFIX: &str = "guest_";

/// Names the event file a request reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionKey(String);

impl PartitionKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }

    fn user(token: &str) -> Self {
        let prefix: String = token.chars().take(TOKEN_PREFIX_LEN).collect();
        PartitionKey(format!("{USER_PREFIX}{}", file_safe(&prefix)))
    }

    fn guest(session_token: &str) -> Self {
        PartitionKey(format!("{GUEST_PREFIX}{}", file_safe(session_token)))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escape everything outside `[A-Za-z0-9.-]` as `_xx` per UTF-8 byte.
///
/// `_` itself is escaped, so distinct inputs never share a file name.
fn file_safe(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push('_');
                out.push_str(&hex::encode([byte]));
            }
        }
    }
    out
}

/// Mint a fresh guest session token: cryptographically random, hex encoded.
pub fn mint_session_token() -> AgendaResult<String> {
    let mut bytes = [0u8; SESSION_TOKEN_BYTES];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| AgendaError::Config(format!("Could not generate session token: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Derive the partition key for a request.
///
/// With credentials carrying a non-empty access token the key is
/// `user_<first 16 chars>`. Otherwise the guest session token is used,
/// minting one into `session_token` if the session has none yet; callers
/// persist the session afterwards.
pub fn resolve(
    credentials: Option<&Credentials>,
    session_token: &mut Option<String>,
) -> AgendaResult<PartitionKey> {
    if let Some(creds) = credentials.filter(|c| !c.token.is_empty()) {
        return Ok(PartitionKey::user(&creds.token));
    }

    let token = match session_token {
        Some(token) if !token.is_empty() => token.clone(),
        _ => {
            let token = mint_session_token()?;
            tracing::debug!("minted new guest session token");
            *session_token = Some(token.clone());
            token
        }
    };

    Ok(PartitionKey::guest(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds(token: &str) -> Credentials {
        Credentials {
            token: token.to_string(),
            refresh_token: "refresh".to_string(),
            token_uri: crate::credentials::GOOGLE_TOKEN_URI.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![],
            expires_at: None,
        }
    }

    #[test]
    fn test_user_key_uses_token_prefix() {
        let mut session = None;
        let key = resolve(Some(&creds("ya29.a0AfH6SMBxyz-long-token-value")), &mut session).unwrap();
        assert_eq!(key.as_str(), "user_ya29.a0AfH6SMBxy");
        assert!(!key.is_guest());
        assert!(session.is_none());
    }

    #[test]
    fn test_same_token_prefix_same_key() {
        let mut session = None;
        let a = resolve(Some(&creds("abcdefghijklmnop-first")), &mut session).unwrap();
        let b = resolve(Some(&creds("abcdefghijklmnop-second")), &mut session).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_guest_token_minted_once() {
        let mut session = None;
        let first = resolve(None, &mut session).unwrap();
        let token = session.clone().unwrap();
        assert_eq!(token.len(), SESSION_TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));

        let second = resolve(None, &mut session).unwrap();
        assert_eq!(first, second);
        assert!(first.is_guest());
    }

    #[test]
    fn test_distinct_guest_sessions_get_distinct_keys() {
        let mut a = None;
        let mut b = None;
        assert_ne!(resolve(None, &mut a).unwrap(), resolve(None, &mut b).unwrap());
    }

    #[test]
    fn test_empty_token_falls_back_to_guest() {
        let mut session = Some("0011223344556677".to_string());
        let key = resolve(Some(&creds("")), &mut session).unwrap();
        assert_eq!(key.as_str(), "guest_0011223344556677");
    }

    #[test]
    fn test_unsafe_token_characters_are_escaped_injectively() {
        let mut session = None;
        let slash = resolve(Some(&creds("ab/cdefghijklmnop")), &mut session).unwrap();
        let underscore = resolve(Some(&creds("ab_cdefghijklmnop")), &mut session).unwrap();

        assert_eq!(slash.as_str(), "user_ab_2fcdefghijklmno");
        assert_eq!(underscore.as_str(), "user_ab_5fcdefghijklmno");
        assert_ne!(slash, underscore);
        assert!(!slash.as_str().contains(['/', '\\', ':']));
    }
}

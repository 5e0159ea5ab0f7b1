//! Base64 + JSON envelope for the session handle.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;

use super::token::{CredentialToken, SessionHandle};
use super::SessionError;

/// Accepted JSON shapes: a bare token array, or a storage-state object with `cookies`.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenDocument {
    List(Vec<CredentialToken>),
    StorageState { cookies: Vec<CredentialToken> },
}

/// Decodes the base64 session string. Whitespace (line wrapping in secret
/// stores) is ignored; standard and URL-safe alphabets are both accepted.
pub fn decode(encoded: &str) -> Result<SessionHandle, SessionError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(SessionError::InvalidSession("empty session string".to_string()));
    }

    let bytes = [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
        .iter()
        .find_map(|engine| engine.decode(compact.as_bytes()).ok())
        .ok_or_else(|| SessionError::InvalidSession("not valid base64".to_string()))?;

    let tokens = parse_tokens_json(&bytes)?;
    Ok(SessionHandle::from_tokens(tokens))
}

/// Parses and validates a JSON token list (bare array or `{"cookies": [...]}`).
pub fn parse_tokens_json(bytes: &[u8]) -> Result<Vec<CredentialToken>, SessionError> {
    let doc: TokenDocument = serde_json::from_slice(bytes)
        .map_err(|e| SessionError::InvalidSession(format!("not a credential token list: {}", e)))?;
    let tokens = match doc {
        TokenDocument::List(t) => t,
        TokenDocument::StorageState { cookies } => cookies,
    };
    if tokens.is_empty() {
        return Err(SessionError::InvalidSession("token list is empty".to_string()));
    }
    if let Some(pos) = tokens.iter().position(|t| t.name.trim().is_empty()) {
        return Err(SessionError::InvalidSession(format!(
            "token #{} has an empty name",
            pos + 1
        )));
    }
    Ok(tokens)
}

/// Encodes tokens into the single-line string expected by [`decode`].
pub fn encode(tokens: &[CredentialToken]) -> String {
    // Serializing plain strings/numbers/bools cannot fail.
    let json = serde_json::to_vec(tokens).unwrap_or_default();
    STANDARD.encode(json)
}

/// Reads and decodes the session from the named environment variable.
pub fn from_env(var: &str) -> Result<SessionHandle, SessionError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => decode(&v),
        _ => Err(SessionError::Missing(var.to_string())),
    }
}

//! Session handle: the serialized authentication state handed over after a
//! one-time interactive login.
//!
//! The handle travels as a single base64 string (usually an environment
//! variable) wrapping a JSON array of cookie-like credential tokens. It has no
//! expiry of its own; the fetch engine notices expiry when it lands on a login
//! page.

mod codec;
mod har;
mod token;

pub use codec::{decode, encode, from_env, parse_tokens_json};
pub use har::tokens_from_har;
pub use token::{CredentialToken, SessionHandle};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured environment variable is unset or empty.
    #[error("session variable {0} is not set")]
    Missing(String),
    /// Not base64, not JSON, or not a usable token list.
    #[error("invalid session: {0}")]
    InvalidSession(String),
}

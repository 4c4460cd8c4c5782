//! `Authorization: Bearer <token>` parsing.

use crate::error::{AuthError, AuthResult};

/// Extract the token from an `Authorization` header value.
///
/// The scheme is matched case-insensitively. A missing header, another
/// scheme or an empty token are all `AuthError::MissingCredentials`.
///
/// ```
/// use tenancy_auth::parse_bearer;
///
/// assert_eq!(parse_bearer(Some("Bearer abc.def")).unwrap(), "abc.def");
/// assert!(parse_bearer(Some("Basic Zm9vOmJhcg==")).is_err());
/// ```
pub fn parse_bearer(header: Option<&str>) -> AuthResult<&str> {
    let value = header.ok_or(AuthError::MissingCredentials)?.trim();
    let (scheme, token) = value.split_once(' ').ok_or(AuthError::MissingCredentials)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::MissingCredentials);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }

    Ok(token)
}

//! HTTP Basic-auth verification and the middleware guarding `/api`.

use std::sync::Arc;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{Request, State},
  http::{HeaderMap, header},
  middleware::Next,
  response::Response,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use rand_core::OsRng;

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Hash `password` into an argon2 PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

/// Username and password carried by an `Authorization: Basic …` header, or
/// `None` if the header is missing or malformed.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
  let encoded = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Basic ")?;
  let decoded = String::from_utf8(B64.decode(encoded.trim()).ok()?).ok()?;
  let (username, password) = decoded.split_once(':')?;
  Some((username.to_owned(), password.to_owned()))
}

/// Check the request's Basic credentials against `config`.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<(), Error> {
  let (username, password) = basic_credentials(headers).ok_or(Error::Unauthorized)?;
  if username != config.username {
    return Err(Error::Unauthorized);
  }

  let expected =
    PasswordHash::new(&config.password_hash).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &expected)
    .map_err(|_| Error::Unauthorized)
}

/// Middleware: reject the request with 401 unless it carries valid
/// credentials.
pub async fn require_auth(
  State(auth): State<Arc<AuthConfig>>,
  req: Request,
  next: Next,
) -> Result<Response, Error> {
  if let Err(e) = verify_auth(req.headers(), &auth) {
    tracing::warn!(uri = %req.uri(), "rejected unauthenticated request");
    return Err(e);
  }
  Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::HeaderValue;

  fn config(password: &str) -> AuthConfig {
    AuthConfig {
      username:      "user".to_string(),
      password_hash: hash_password(password).unwrap(),
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("user", "secret")), &cfg).is_ok());
  }

  #[test]
  fn wrong_password() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&headers(&basic("user", "wrong")), &cfg),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn wrong_username() {
    let cfg = config("secret");
    assert!(verify_auth(&headers(&basic("admin", "secret")), &cfg).is_err());
  }

  #[test]
  fn missing_header() {
    let cfg = config("secret");
    assert!(matches!(
      verify_auth(&HeaderMap::new(), &cfg),
      Err(Error::Unauthorized)
    ));
  }

  #[test]
  fn password_may_contain_colons() {
    let cfg = config("a:b:c");
    assert!(verify_auth(&headers(&basic("user", "a:b:c")), &cfg).is_ok());
  }

  #[test]
  fn invalid_base64() {
    let cfg = config("secret");
    assert!(verify_auth(&headers("Basic !!!not-base64!!!"), &cfg).is_err());
  }
}

//! Credentials for artifact locations.
//!
//! There is no built-in fallback account: callers pass credentials
//! explicitly or read them from the environment with
//! [`Credentials::from_env`].

use std::env;
use std::fmt;

use crate::location::TransportError;

/// Login name for shares and servers.
pub const USERNAME_ENV: &str = "VINFO_USERNAME";

/// Password matching [`USERNAME_ENV`].
pub const PASSWORD_ENV: &str = "VINFO_PASSWORD";

/// Optional Windows network domain, e.g. `CORP`.
pub const DOMAIN_ENV: &str = "VINFO_DOMAIN";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
  username: String,
  password: String,
  domain: Option<String>,
}

impl Credentials {
  pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      username: username.into(),
      password: password.into(),
      domain: None,
    }
  }

  pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
    self.domain = Some(domain.into());
    self
  }

  /// Build credentials from optional parts, treating empty strings as unset.
  pub fn resolve(
    username: Option<String>,
    password: Option<String>,
    domain: Option<String>,
  ) -> Result<Self, TransportError> {
    let username = non_empty(username).ok_or(TransportError::MissingCredentials {
      name: "username",
      env: USERNAME_ENV,
    })?;
    let password = non_empty(password).ok_or(TransportError::MissingCredentials {
      name: "password",
      env: PASSWORD_ENV,
    })?;
    Ok(Self {
      username,
      password,
      domain: non_empty(domain),
    })
  }

  /// Read `VINFO_USERNAME`, `VINFO_PASSWORD` and `VINFO_DOMAIN`.
  pub fn from_env() -> Result<Self, TransportError> {
    Self::resolve(
      env::var(USERNAME_ENV).ok(),
      env::var(PASSWORD_ENV).ok(),
      env::var(DOMAIN_ENV).ok(),
    )
  }

  pub fn username(&self) -> &str {
    &self.username
  }

  pub fn password(&self) -> &str {
    &self.password
  }

  pub fn domain(&self) -> Option<&str> {
    self.domain.as_deref()
  }

  /// `DOMAIN\user` when a domain is set, otherwise the bare username.
  pub fn qualified_username(&self) -> String {
    match &self.domain {
      Some(domain) => format!("{}\\{}", domain, self.username),
      None => self.username.clone(),
    }
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("username", &self.username)
      .field("password", &"<redacted>")
      .field("domain", &self.domain)
      .finish()
  }
}

fn non_empty(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.is_empty())
}

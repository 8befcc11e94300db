use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("no credential associated with this session")]
    NoCredential,
}

/// Opaque bearer token borrowed for the duration of one request.
///
/// `Debug` is redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Source of the caller's GitHub credential.
///
/// The review pipeline only asks for a credential; how it was obtained
/// (config file, environment, an OAuth session) is none of its business.
pub trait CredentialProvider: Send + Sync {
    fn credential(&self) -> Result<Credential, AuthError>;
}

/// Credential provider backed by the token the current session was configured with.
#[derive(Debug, Clone, Default)]
pub struct SessionCredentials {
    token: Option<String>,
}

impl SessionCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(config.github.token.clone())
    }
}

impl CredentialProvider for SessionCredentials {
    fn credential(&self) -> Result<Credential, AuthError> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(Credential::new(token)),
            _ => Err(AuthError::NoCredential),
        }
    }
}

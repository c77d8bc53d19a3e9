use serde::Deserialize;

use crate::{Error, Result};

/// Gives access to the consumer key and secret used for signing.
pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);
}

/// Gives access to a token identifier and its secret.
pub trait TokenSecretsProvider {
    fn get_token_pair(&self) -> (&str, &str);

    fn get_token_secret(&self) -> &str {
        self.get_token_pair().1
    }
}

/// Requested permission scope. Providers expect either a single opaque
/// string or a list joined with a provider-specific separator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Scope {
    One(String),
    Many(Vec<String>),
}

impl Default for Scope {
    fn default() -> Self {
        Scope::Many(Vec::new())
    }
}

impl Scope {
    /// Render the scope, `None` when nothing was requested.
    pub fn join(&self, separator: &str) -> Option<String> {
        match self {
            Scope::One(s) if s.is_empty() => None,
            Scope::One(s) => Some(s.clone()),
            Scope::Many(v) if v.is_empty() => None,
            Scope::Many(v) => Some(v.join(separator)),
        }
    }
}

impl From<&str> for Scope {
    fn from(scope: &str) -> Self {
        Scope::One(scope.to_string())
    }
}

impl From<Vec<String>> for Scope {
    fn from(scopes: Vec<String>) -> Self {
        Scope::Many(scopes)
    }
}

/// The registered application identity.
///
/// A consumer is immutable once built; providers hand out shared references
/// to it for every request they sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Consumer {
    key: String,
    secret: String,
    callback: String,
    scope: Scope,
}

impl Consumer {
    /// Build a consumer. `service` only labels the error when the key or the
    /// secret is empty.
    pub fn new<K, S, C>(service: &str, key: K, secret: S, callback: C) -> Result<Self>
    where
        K: Into<String>,
        S: Into<String>,
        C: Into<String>,
    {
        let (key, secret, callback) = (key.into(), secret.into(), callback.into());
        let missing = |field| Error::MissingCredentials {
            service: service.to_string(),
            field,
        };
        if key.is_empty() {
            return Err(missing("app_key"));
        }
        if secret.is_empty() {
            return Err(missing("app_secret"));
        }
        if callback.is_empty() {
            return Err(missing("callback"));
        }
        Ok(Consumer {
            key,
            secret,
            callback,
            scope: Scope::default(),
        })
    }

    pub fn with_scope<T>(self, scope: T) -> Self
    where
        T: Into<Scope>,
    {
        Consumer {
            scope: scope.into(),
            ..self
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn callback(&self) -> &str {
        &self.callback
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}

impl SecretsProvider for Consumer {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        (&self.key, &self.secret)
    }
}

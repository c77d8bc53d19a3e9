//! Explicit provider configuration.
//!
//! Providers never look credentials up on their own: a [`ConfigSource`] is
//! handed to the constructor, which validates it once.

use std::collections::HashMap;

use serde::Deserialize;

use crate::{Error, Result, Scope, SignatureMethodKind};

/// Settings for one OAuth service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceConfig {
    pub app_key: Option<String>,
    pub app_secret: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    /// Separator used to join a list scope. Defaults to `,`.
    pub scope_separator: Option<String>,
    /// Wire name of the signature method. Defaults to `HMAC-SHA1`.
    pub signature: Option<String>,
    /// PEM encoded RSA private key, required for RSA-SHA1.
    pub private_key: Option<String>,
    /// Name of the user id field in the access token response.
    pub uid_key: Option<String>,
    pub request_url: Option<String>,
    pub authorize_url: Option<String>,
    pub access_url: Option<String>,
    /// Resource returning the signed-in user's profile.
    pub account_info_url: Option<String>,
}

impl ServiceConfig {
    pub fn new<K, S>(app_key: K, app_secret: S) -> Self
    where
        K: Into<String>,
        S: Into<String>,
    {
        ServiceConfig {
            app_key: Some(app_key.into()),
            app_secret: Some(app_secret.into()),
            ..Default::default()
        }
    }

    /// The configured signature method. An unknown name is
    /// [`Error::UnsupportedSignatureMethod`].
    pub fn signature_method(&self) -> Result<SignatureMethodKind> {
        self.signature
            .as_deref()
            .map(str::parse::<SignatureMethodKind>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Resolves credentials for a named service and the callback url of the
/// running application.
pub trait ConfigSource {
    fn service(&self, name: &str) -> Option<ServiceConfig>;

    fn callback_url(&self) -> Option<String>;
}

/// In-memory configuration, typically deserialized from a file.
///
/// ```json
/// {
///   "callback": "https://app.example/oauth/callback",
///   "services": {
///     "twitter": { "app_key": "...", "app_secret": "..." }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaticConfig {
    pub callback: Option<String>,
    #[serde(default)]
    pub services: HashMap<String, ServiceConfig>,
}

impl StaticConfig {
    pub fn new<C>(callback: C) -> Self
    where
        C: Into<String>,
    {
        StaticConfig {
            callback: Some(callback.into()),
            services: HashMap::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    pub fn with_service<N>(mut self, name: N, config: ServiceConfig) -> Self
    where
        N: Into<String>,
    {
        self.services.insert(name.into(), config);
        self
    }
}

impl ConfigSource for StaticConfig {
    fn service(&self, name: &str) -> Option<ServiceConfig> {
        self.services.get(name).cloned()
    }

    fn callback_url(&self) -> Option<String> {
        self.callback.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_config_from_json() {
        let config = StaticConfig::from_json(
            r#"{
                "callback": "https://app.example/cb",
                "services": {
                    "vimeo": {
                        "app_key": "key",
                        "app_secret": "secret",
                        "scope": ["read", "write"],
                        "signature": "PLAINTEXT",
                        "uid_key": "user_id"
                    }
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.callback_url().as_deref(), Some("https://app.example/cb"));
        let vimeo = config.service("vimeo").unwrap();
        assert_eq!(vimeo.app_key.as_deref(), Some("key"));
        assert_eq!(vimeo.signature_method().unwrap(), SignatureMethodKind::Plaintext);
        assert_eq!(vimeo.scope.join(","), Some("read,write".to_string()));
        assert_eq!(vimeo.uid_key.as_deref(), Some("user_id"));
        assert!(config.service("twitter").is_none());
    }

    #[test]
    fn unknown_signature_name_is_rejected() {
        let config = StaticConfig::from_json(
            r#"{"services": {"x": {"app_key": "k", "app_secret": "s", "signature": "MD5"}}}"#,
        )
        .unwrap();
        let err = config.service("x").unwrap().signature_method().unwrap_err();
        assert!(matches!(err, Error::UnsupportedSignatureMethod(name) if name == "MD5"));
    }

    #[test]
    fn signature_defaults_to_hmac_sha1() {
        let service = ServiceConfig::new("k", "s");
        assert_eq!(service.signature_method().unwrap(), SignatureMethodKind::HmacSha1);
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = StaticConfig::from_json(r#"{"services": 3}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn builder() {
        let config = StaticConfig::new("oob").with_service("twitter", ServiceConfig::new("k", "s"));
        let twitter = config.service("twitter").unwrap();
        assert_eq!(twitter.app_secret.as_deref(), Some("s"));
        assert_eq!(twitter.scope, Scope::default());
    }
}

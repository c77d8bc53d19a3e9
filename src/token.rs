use std::fmt;
use std::str::FromStr;

use crate::{Error, Result, TokenSecretsProvider};

/// Lifecycle variant of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Request,
    Access,
}

impl FromStr for TokenKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "request" => Ok(TokenKind::Request),
            "access" => Ok(TokenKind::Access),
            other => Err(Error::UnknownTokenKind(other.to_string())),
        }
    }
}

/// Temporary credentials obtained from the first leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestToken {
    token: String,
    secret: String,
    verifier: Option<String>,
}

/// Token credentials obtained from the access leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    secret: String,
    uid: Option<String>,
}

/// Either token variant, as produced by [`Token::forge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Request(RequestToken),
    Access(AccessToken),
}

fn required(value: Option<String>, field: &'static str) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingRequiredField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Token {
    /// Build a token of the given kind. The token and its secret must both be
    /// present and non-empty. A uid is only kept on access tokens and a
    /// verifier only on request tokens.
    pub fn forge(
        kind: TokenKind,
        access_token: Option<String>,
        secret: Option<String>,
        uid: Option<String>,
        verifier: Option<String>,
    ) -> Result<Token> {
        let token = required(access_token, "access_token")?;
        let secret = required(secret, "secret")?;
        Ok(match kind {
            TokenKind::Request => Token::Request(RequestToken {
                token,
                secret,
                verifier: optional(verifier),
            }),
            TokenKind::Access => Token::Access(AccessToken {
                token,
                secret,
                uid: optional(uid),
            }),
        })
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Request(_) => TokenKind::Request,
            Token::Access(_) => TokenKind::Access,
        }
    }

    pub fn access_token(&self) -> &str {
        self.get_token_pair().0
    }

    pub fn secret(&self) -> &str {
        self.get_token_pair().1
    }

    pub fn into_request(self) -> Option<RequestToken> {
        match self {
            Token::Request(t) => Some(t),
            Token::Access(_) => None,
        }
    }

    pub fn into_access(self) -> Option<AccessToken> {
        match self {
            Token::Access(t) => Some(t),
            Token::Request(_) => None,
        }
    }
}

impl RequestToken {
    pub fn new<T, S>(token: T, secret: S) -> Result<Self>
    where
        T: Into<String>,
        S: Into<String>,
    {
        Ok(RequestToken {
            token: required(Some(token.into()), "access_token")?,
            secret: required(Some(secret.into()), "secret")?,
            verifier: None,
        })
    }

    /// A copy of this token carrying the verifier returned to the callback.
    pub fn with_verifier<T>(&self, verifier: T) -> Self
    where
        T: Into<String>,
    {
        RequestToken {
            verifier: optional(Some(verifier.into())),
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> &str {
        &self.token
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn verifier(&self) -> Option<&str> {
        self.verifier.as_deref()
    }
}

impl AccessToken {
    pub fn new<T, S>(token: T, secret: S) -> Result<Self>
    where
        T: Into<String>,
        S: Into<String>,
    {
        Ok(AccessToken {
            token: required(Some(token.into()), "access_token")?,
            secret: required(Some(secret.into()), "secret")?,
            uid: None,
        })
    }

    /// Attach the user id reported by the provider. Empty ids are dropped.
    pub fn with_uid<T>(self, uid: Option<T>) -> Self
    where
        T: Into<String>,
    {
        AccessToken {
            uid: optional(uid.map(Into::into)),
            ..self
        }
    }

    pub fn access_token(&self) -> &str {
        &self.token
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

impl TokenSecretsProvider for RequestToken {
    fn get_token_pair(&self) -> (&str, &str) {
        (&self.token, &self.secret)
    }
}

impl TokenSecretsProvider for AccessToken {
    fn get_token_pair(&self) -> (&str, &str) {
        (&self.token, &self.secret)
    }
}

impl TokenSecretsProvider for Token {
    fn get_token_pair(&self) -> (&str, &str) {
        match self {
            Token::Request(t) => t.get_token_pair(),
            Token::Access(t) => t.get_token_pair(),
        }
    }
}

// Displaying a token yields the bare identifier, ready to embed as oauth_token.
impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.access_token())
    }
}

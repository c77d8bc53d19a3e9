use thiserror::Error;

use crate::Leg;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("missing credentials for {service} : {field} is not configured")]
    MissingCredentials {
        service: String,
        field: &'static str,
    },
    #[error("invalid configuration : {0}")]
    InvalidConfig(String),
    #[error("required oauth parameter is missing : {0}")]
    MissingRequiredParameter(String),
    #[error("parameter {0} is reserved by the protocol and is already set")]
    ReservedParameterConflict(String),
    #[error("parameter {0} is given more than once")]
    DuplicateParameter(String),
    #[error("unsupported signature method : {0}")]
    UnsupportedSignatureMethod(String),
    #[error("transport failed : {0}")]
    TransportFailure(#[from] TransportError),
    #[error("provider response is invalid : {0}")]
    InvalidProviderResponse(String),
    #[error("required token field is missing : {0}")]
    MissingRequiredField(&'static str),
    #[error("OAuth sign failed : {0}")]
    Signer(#[from] SignError),
    #[error("invalid url : {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("unknown token kind : {0}")]
    UnknownTokenKind(String),
    #[error("unknown provider : {0}")]
    UnknownProvider(String),
    #[error("the {0} leg is handed to the user agent and cannot be executed")]
    NotExecutable(Leg),
}

#[derive(Error, Debug, Clone)]
pub enum SignError {
    #[error("RSA-SHA1 requires the consumer's private key")]
    MissingPrivateKey,
    #[error("invalid private key : {0}")]
    InvalidPrivateKey(String),
    #[error("digest failed : {0}")]
    Digest(String),
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed : {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    /// Wrap an error raised by a custom transport.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        TransportError::Other(err.into())
    }
}

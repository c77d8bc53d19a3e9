use async_trait::async_trait;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use reqwest::Client as ReqwestClient;
use url::Url;

use crate::TransportResult;

pub(crate) const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A fully signed request, ready to go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: Method,
    /// Target url, including the query string when parameters travel there.
    pub url: Url,
    /// `Authorization` header value, set when the protocol parameters travel
    /// in the header.
    pub authorization: Option<String>,
    /// `application/x-www-form-urlencoded` body.
    pub body: Option<String>,
}

/// What came back from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
}

impl TransportResponse {
    pub fn new<T>(status: u16, body: T) -> Self
    where
        T: Into<String>,
    {
        TransportResponse {
            status,
            body: body.into(),
            content_type: None,
        }
    }

    pub fn content_type<T>(self, content_type: T) -> Self
    where
        T: Into<String>,
    {
        TransportResponse {
            content_type: Some(content_type.into()),
            ..self
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the HTTP exchange for a signed request.
///
/// Timeouts, retries and cancellation belong to the implementation; each
/// protocol leg calls `send` exactly once.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> TransportResult<TransportResponse>;
}

#[async_trait]
impl Transport for ReqwestClient {
    async fn send(&self, request: TransportRequest) -> TransportResult<TransportResponse> {
        let mut builder = self.request(request.method, request.url);
        if let Some(authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, FORM_CONTENT_TYPE).body(body);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.text().await?;

        Ok(TransportResponse {
            status,
            body,
            content_type,
        })
    }
}

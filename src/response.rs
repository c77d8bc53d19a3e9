use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Error, Result, TransportResponse};

/// How a response body is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// `application/x-www-form-urlencoded`, the format of token exchanges.
    QueryString,
    Json,
}

impl ResponseFormat {
    /// Anything announcing json is json; everything else, including a
    /// missing content type, is treated as a query string.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.to_ascii_lowercase().contains("json") => ResponseFormat::Json,
            _ => ResponseFormat::QueryString,
        }
    }
}

/// A completed exchange, parsed into named parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u16,
    format: ResponseFormat,
    body: String,
    params: BTreeMap<String, String>,
}

impl Response {
    /// Parse using the format announced by the content type.
    pub fn new(raw: TransportResponse) -> Result<Self> {
        let format = ResponseFormat::from_content_type(raw.content_type.as_deref());
        Response::with_format(raw, format)
    }

    pub fn with_format(raw: TransportResponse, format: ResponseFormat) -> Result<Self> {
        let params = match format {
            ResponseFormat::QueryString => read_query_string(&raw.body)?,
            ResponseFormat::Json => read_json(&raw.body)?,
        };
        Ok(Response {
            status: raw.status,
            format,
            body: raw.body,
            params,
        })
    }

    /// Look a parameter up. A missing parameter is `None`, never an error.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn format(&self) -> ResponseFormat {
        self.format
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

fn read_query_string(body: &str) -> Result<BTreeMap<String, String>> {
    let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(body.trim())
        .map_err(|e| Error::InvalidProviderResponse(format!("malformed query string : {}", e)))?;
    Ok(pairs.into_iter().collect())
}

fn read_json(body: &str) -> Result<BTreeMap<String, String>> {
    let value = serde_json::from_str::<Value>(body)
        .map_err(|e| Error::InvalidProviderResponse(format!("malformed json : {}", e)))?;
    let object = match value {
        Value::Object(object) => object,
        other => {
            return Err(Error::InvalidProviderResponse(format!(
                "expected a json object, got {}",
                other
            )))
        }
    };
    Ok(object
        .into_iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(body: &str) -> Response {
        Response::new(TransportResponse::new(200, body)).unwrap()
    }

    #[test]
    fn parse_response_typical() {
        let parsed = query("oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik&oauth_token_secret=Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM&oauth_callback_confirmed=true");
        assert_eq!(parsed.format(), ResponseFormat::QueryString);
        assert_eq!(
            parsed.param("oauth_token"),
            Some("Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik")
        );
        assert_eq!(
            parsed.param("oauth_token_secret"),
            Some("Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM")
        );
        assert_eq!(parsed.param("oauth_callback_confirmed"), Some("true"));
        assert_eq!(parsed.params().len(), 3);
    }

    #[test]
    fn parse_response_edge() {
        let parsed = query("oauth_token==&oauth_token_secret=&keyonly=&keyonly2&=&&");
        assert_eq!(parsed.param("oauth_token"), Some("="));
        assert_eq!(parsed.param("oauth_token_secret"), Some(""));
        assert_eq!(parsed.param("keyonly"), Some(""));
        assert_eq!(parsed.param("keyonly2"), Some(""));
        assert_eq!(parsed.param(""), Some(""));
    }

    #[test]
    fn parse_decodes_values() {
        let parsed = query("oauth_token=abc%2B123&oauth_token_secret=xyz%3D789&name=a+b\n");
        assert_eq!(parsed.param("oauth_token"), Some("abc+123"));
        assert_eq!(parsed.param("oauth_token_secret"), Some("xyz=789"));
        assert_eq!(parsed.param("name"), Some("a b"));
    }

    #[test]
    fn missing_param_is_none() {
        let parsed = query("oauth_token=abc");
        assert_eq!(parsed.param("uid"), None);
    }

    #[test]
    fn parse_json_by_content_type() {
        let raw = TransportResponse::new(
            200,
            r#"{"oauth_token":"abc","oauth_token_secret":"xyz","uid":1234,"verified":true,"gone":null}"#,
        )
        .content_type("application/json; charset=utf-8");
        let parsed = Response::new(raw).unwrap();
        assert_eq!(parsed.format(), ResponseFormat::Json);
        assert_eq!(parsed.param("oauth_token"), Some("abc"));
        assert_eq!(parsed.param("uid"), Some("1234"));
        assert_eq!(parsed.param("verified"), Some("true"));
        assert_eq!(parsed.param("gone"), None);
    }

    #[test]
    fn json_must_be_an_object() {
        let raw = TransportResponse::new(200, "[1,2]").content_type("application/json");
        assert!(matches!(
            Response::new(raw),
            Err(Error::InvalidProviderResponse(_))
        ));
        let raw = TransportResponse::new(200, "{oops").content_type("text/json");
        assert!(matches!(
            Response::new(raw),
            Err(Error::InvalidProviderResponse(_))
        ));
    }

    #[test]
    fn status_is_kept() {
        let parsed = Response::new(TransportResponse::new(401, "oauth_problem=signature_invalid"))
            .unwrap();
        assert!(!parsed.is_success());
        assert_eq!(parsed.status(), 401);
        assert_eq!(parsed.param("oauth_problem"), Some("signature_invalid"));
        assert_eq!(parsed.body(), "oauth_problem=signature_invalid");
    }
}

//! RFC 3986 percent-encoding and signature base string construction (RFC 5849 3.4.1).

use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use http::Method;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::Rng;
use url::{Position, Url};

use crate::OAUTH_SIGNATURE_KEY;

/// Everything but the unreserved set `A-Z a-z 0-9 - . _ ~`.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a string with uppercase hex digits.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

/// Reverse of [`percent_encode`]. Invalid UTF-8 sequences are replaced.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Encode every pair, sort by encoded key then encoded value and join as
/// `k=v&k=v`.
pub fn to_query_string<'a, I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    let mut encoded = params
        .into_iter()
        .map(|(k, v)| {
            let (k, v): (Cow<'a, str>, Cow<'a, str>) = (k.into(), v.into());
            (percent_encode(&k), percent_encode(&v))
        })
        .collect::<Vec<(String, String)>>();
    // tuple ordering on String is byte-wise: key first, value second
    encoded.sort();

    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// The normalized request parameters: [`to_query_string`] without
/// `oauth_signature`.
pub fn normalize_parameters<'a, I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<Cow<'a, str>>,
    V: Into<Cow<'a, str>>,
{
    to_query_string(
        params
            .into_iter()
            .map(|(k, v)| -> (Cow<'a, str>, Cow<'a, str>) { (k.into(), v.into()) })
            .filter(|(k, _)| k != OAUTH_SIGNATURE_KEY),
    )
}

/// `scheme://authority/path` of the url. The query and fragment are cut off
/// and default ports are already dropped by the parser.
pub fn base_url(url: &Url) -> &str {
    &url[..Position::AfterPath]
}

/// Build `METHOD&encoded_base_url&encoded_parameters`.
pub fn signature_base_string(method: &Method, url: &Url, normalized_params: &str) -> String {
    format!(
        "{}&{}&{}",
        method.as_str().to_uppercase(),
        percent_encode(base_url(url)),
        percent_encode(normalized_params)
    )
}

/// 32 random bytes, hex encoded.
pub fn generate_nonce() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

/// Seconds since the unix epoch. A clock set before 1970 yields 0.
pub fn generate_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn encode_unreserved_untouched() {
        assert_eq!(percent_encode("abcXYZ019"), "abcXYZ019");
        assert_eq!(percent_encode("-._~"), "-._~");
    }

    #[test]
    fn encode_reserved_uppercase() {
        assert_eq!(percent_encode(" "), "%20");
        assert_eq!(percent_encode("&"), "%26");
        assert_eq!(percent_encode("="), "%3D");
        assert_eq!(percent_encode("+"), "%2B");
        assert_eq!(percent_encode("/"), "%2F");
        assert_eq!(percent_encode("*"), "%2A");
        assert_eq!(percent_encode("終"), "%E7%B5%82");
    }

    #[test]
    fn encode_then_decode_returns_input() {
        for value in &[
            "",
            "plain",
            "Hello Ladies + Gentlemen, a signed OAuth request!",
            "a=b&c=d",
            "http://printer.example.com/ready?x=1",
            "少女終末旅行",
            "%41 already encoded",
        ] {
            let encoded = percent_encode(value);
            for c in &['&', '=', '+', ' '] {
                assert!(!encoded.contains(*c), "{} leaked into {}", c, encoded);
            }
            assert_eq!(percent_decode(&encoded), *value);
        }
    }

    #[test]
    fn normalize_sorts_by_key_then_value() {
        let normalized = normalize_parameters(vec![("b", "2"), ("a", "3"), ("a", "1")]);
        assert_eq!(normalized, "a=1&a=3&b=2");
    }

    #[test]
    fn normalize_sorts_encoded_form() {
        // "a b" encodes to "a%20b" and '%' sorts before 'c'
        let normalized = normalize_parameters(vec![("ac", "1"), ("a b", "2")]);
        assert_eq!(normalized, "a%20b=2&ac=1");
    }

    #[test]
    fn normalize_excludes_signature() {
        let normalized =
            normalize_parameters(vec![("oauth_signature", "xyz"), ("oauth_nonce", "n")]);
        assert_eq!(normalized, "oauth_nonce=n");
    }

    #[test]
    fn normalize_empty() {
        let empty: Vec<(&str, &str)> = vec![];
        assert_eq!(normalize_parameters(empty), "");
    }

    #[test]
    fn base_url_drops_query_fragment_and_default_port() {
        let url = Url::parse("HTTP://Photos.Example.NET:80/photos?size=original#top").unwrap();
        assert_eq!(base_url(&url), "http://photos.example.net/photos");

        let url = Url::parse("https://example.com:8443/r%20v").unwrap();
        assert_eq!(base_url(&url), "https://example.com:8443/r%20v");
    }

    #[test]
    fn base_string_rfc5849_initiate() {
        // RFC 5849 section 1.2, temporary credentials request
        let url = Url::parse("https://photos.example.net/initiate").unwrap();
        let normalized = normalize_parameters(vec![
            ("oauth_consumer_key", "dpf43f3p2l4k3l03"),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", "137131200"),
            ("oauth_nonce", "wIjqoS"),
            ("oauth_callback", "http://printer.example.com/ready"),
        ]);
        assert_eq!(
            signature_base_string(&Method::POST, &url, &normalized),
            "POST&https%3A%2F%2Fphotos.example.net%2Finitiate&oauth_callback%3Dhttp%253A%252F%252Fprinter.example.com%252Fready%26oauth_consumer_key%3Ddpf43f3p2l4k3l03%26oauth_nonce%3DwIjqoS%26oauth_signature_method%3DHMAC-SHA1%26oauth_timestamp%3D137131200"
        );
    }

    #[test]
    fn nonce_is_unique_hex() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn timestamp_is_recent() {
        // 2020-09-13
        assert!(generate_timestamp() > 1_600_000_000);
    }
}

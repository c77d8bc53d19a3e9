/*!
reqwest-oauth1-flow: the OAuth 1.0a three-legged flow on top of [reqwest](https://crates.io/crates/reqwest).

# Overview

This library implements the client side of OAuth 1.0a (RFC 5849): parameter
normalization, signature base strings, the HMAC-SHA1, RSA-SHA1 and PLAINTEXT
signature methods, and a [`Provider`] that walks a flow through its three
legs.

The network call itself goes through the [`Transport`] trait, implemented for
`reqwest::Client`.

# How to use

## Basic usecase 1 - Acquiring OAuth token & secret

```no_run
use std::io;
use reqwest_oauth1_flow::{Provider, ProviderKind, ServiceConfig, StaticConfig};

# async fn run() -> Result<(), Box<dyn std::error::Error>> {
// prepare authorization info
let config = StaticConfig::new("oob")
    .with_service("twitter", ServiceConfig::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"));

let mut provider = Provider::forge(ProviderKind::Twitter, &config, reqwest::Client::new())?;

// step 1: acquire request token & token secret
provider.request_token(&[]).await?;

// step 2. acquire user pin
println!("please access to: {}", provider.authorize_url(None, &[])?);

println!("input pin: ");
let mut user_input = String::new();
io::stdin().read_line(&mut user_input)?;
provider.attach_verifier(user_input.trim())?;

// step 3. acquire access token
let token = provider.access_token(None, &[]).await?;
println!(
    "your token and secret is: \n token: {}\n secret: {}\n uid: {:?}",
    token.access_token(),
    token.secret(),
    token.uid()
);
# Ok(())
# }
```

## Basic usecase 2 - calling a protected resource

```no_run
use http::Method;
use reqwest_oauth1_flow::{AccessToken, Provider, ProviderKind, ServiceConfig, StaticConfig};

# async fn run() -> Result<(), Box<dyn std::error::Error>> {
let config = StaticConfig::new("oob")
    .with_service("twitter", ServiceConfig::new("[CONSUMER_KEY]", "[CONSUMER_SECRET]"));
let provider = Provider::forge(ProviderKind::Twitter, &config, reqwest::Client::new())?;

let token = AccessToken::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]")?;
let resp = provider
    .fetch_resource(
        &token,
        Method::POST,
        "https://api.twitter.com/1.1/statuses/update.json",
        &[("status", "Hello, Twitter!")],
    )
    .await?;
println!("{}", resp.body);
# Ok(())
# }
```

## Signing by hand

```
use http::Method;
use reqwest_oauth1_flow::{Consumer, HmacSha1, Leg, Request, OAUTH_CONSUMER_KEY, OAUTH_CALLBACK_KEY};

let consumer = Consumer::new("photos", "dpf43f3p2l4k3l03", "kd94hf93k423kf44", "oob").unwrap();
let mut request = Request::build(
    Leg::Request,
    Method::POST,
    "https://photos.example.net/initiate",
    vec![(OAUTH_CONSUMER_KEY, consumer.key()), (OAUTH_CALLBACK_KEY, consumer.callback())],
)
.unwrap();
request.sign(&HmacSha1, &consumer, None).unwrap();
assert!(request.is_signed());
```
*/
mod config;
mod consumer;
pub mod encoding;
mod error;
mod provider;
mod request;
mod response;
pub mod signature;
mod token;
mod transport;

// exposed to external program
pub use config::{ConfigSource, ServiceConfig, StaticConfig};
pub use consumer::{Consumer, Scope, SecretsProvider, TokenSecretsProvider};
pub use error::{Error, Result, SignError, SignResult, TransportError, TransportResult};
pub use provider::{Endpoints, FlowState, Provider, ProviderKind};
pub use request::{Leg, ParameterPlacement, Request, RequestBuilder};
pub use response::{Response, ResponseFormat};
pub use signature::{HmacSha1, Plaintext, RsaSha1, SignatureMethod, SignatureMethodKind};
pub use token::{AccessToken, RequestToken, Token, TokenKind};
pub use transport::{Transport, TransportRequest, TransportResponse};

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_callback_confirmed`.
pub const OAUTH_CALLBACK_CONFIRMED_KEY: &str = "oauth_callback_confirmed";
/// Represents `oauth_consumer_key`.
pub const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_signature`.
pub const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
/// Represents `oauth_signature_method`.
pub const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_token_secret`.
pub const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";
/// Represents `realm`.
pub const REALM_KEY: &str = "realm";
/// The only protocol version this crate speaks.
pub const OAUTH_VERSION: &str = "1.0";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";

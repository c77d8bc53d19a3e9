use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use http::Method;
use url::Url;

use crate::encoding::{
    base_url, generate_nonce, generate_timestamp, normalize_parameters, percent_encode,
    signature_base_string, to_query_string,
};
use crate::{
    Error, Response, Result, SecretsProvider, SignatureMethod, TokenSecretsProvider, Transport,
    TransportRequest, TransportResponse, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY, OAUTH_KEY_PREFIX,
    OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY, OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY, OAUTH_VERSION, OAUTH_VERSION_KEY, REALM_KEY,
};

// RFC 5849 2.1
const REQUEST_TOKEN_KEYS: &[&str] = &[
    OAUTH_CALLBACK_KEY,
    OAUTH_CONSUMER_KEY,
    OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY,
    OAUTH_VERSION_KEY,
];

// RFC 5849 2.2
const AUTHORIZE_KEYS: &[&str] = &[OAUTH_TOKEN_KEY];

// RFC 5849 2.3
const ACCESS_TOKEN_KEYS: &[&str] = &[
    OAUTH_CONSUMER_KEY,
    OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY,
    OAUTH_VERIFIER_KEY,
    OAUTH_VERSION_KEY,
];

// RFC 5849 3.1
const RESOURCE_KEYS: &[&str] = &[
    OAUTH_CONSUMER_KEY,
    OAUTH_NONCE_KEY,
    OAUTH_SIGNATURE_KEY,
    OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY,
    OAUTH_TOKEN_KEY,
    OAUTH_VERSION_KEY,
];

/// One of the protocol exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Leg {
    /// Temporary credentials request.
    Request,
    /// Resource owner authorization, handed to the user agent.
    Authorize,
    /// Token credentials request.
    Access,
    /// Protected resource request.
    Resource,
}

impl Leg {
    pub fn name(&self) -> &'static str {
        match self {
            Leg::Request => "request",
            Leg::Authorize => "authorize",
            Leg::Access => "access",
            Leg::Resource => "resource",
        }
    }

    /// Parameters a fully signed request of this leg must carry.
    /// `oauth_verifier` is listed for the access leg but stays optional.
    pub fn required_keys(&self) -> &'static [&'static str] {
        match self {
            Leg::Request => REQUEST_TOKEN_KEYS,
            Leg::Authorize => AUTHORIZE_KEYS,
            Leg::Access => ACCESS_TOKEN_KEYS,
            Leg::Resource => RESOURCE_KEYS,
        }
    }

    fn is_signed(&self) -> bool {
        !matches!(self, Leg::Authorize)
    }
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where the parameters travel when the request is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterPlacement {
    /// Every parameter in the url query.
    Query,
    /// Every parameter in a form encoded body.
    Body,
    /// `oauth_*` parameters in the `Authorization` header, the rest in the
    /// query (GET, HEAD, DELETE) or the body.
    AuthorizationHeader { realm: Option<String> },
}

impl ParameterPlacement {
    fn default_for(method: &Method) -> Self {
        if carries_query(method) {
            ParameterPlacement::Query
        } else {
            ParameterPlacement::Body
        }
    }
}

fn carries_query(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::DELETE)
}

/// Merge caller parameters into `params`.
///
/// `oauth_signature` and `oauth_signature_method` are only ever set by
/// [`Request::sign`], protocol keys already present cannot be replaced and
/// a key may appear once. Nothing is merged on error.
fn merge_params(params: &mut BTreeMap<String, String>, extra: Vec<(String, String)>) -> Result<()> {
    {
        let mut seen = BTreeSet::new();
        for (key, _) in &extra {
            if key == OAUTH_SIGNATURE_KEY
                || key == OAUTH_SIGNATURE_METHOD_KEY
                || (key.starts_with(OAUTH_KEY_PREFIX) && params.contains_key(key))
            {
                return Err(Error::ReservedParameterConflict(key.clone()));
            }
            if params.contains_key(key) || !seen.insert(key.as_str()) {
                return Err(Error::DuplicateParameter(key.clone()));
            }
        }
    }
    params.extend(extra);
    Ok(())
}

/// Which required keys a check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Unsigned,
    Signed,
}

/// A canonical OAuth request for one leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    leg: Leg,
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    params: BTreeMap<String, String>,
    placement: ParameterPlacement,
}

/// Builds a [`Request`], optionally pinning the nonce and timestamp.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    leg: Leg,
    method: Method,
    url: String,
    nonce: Option<String>,
    timestamp: Option<u64>,
    params: Vec<(String, String)>,
    placement: Option<ParameterPlacement>,
}

impl RequestBuilder {
    pub fn new<U>(leg: Leg, method: Method, url: U) -> Self
    where
        U: Into<String>,
    {
        RequestBuilder {
            leg,
            method,
            url: url.into(),
            nonce: None,
            timestamp: None,
            params: Vec::new(),
            placement: None,
        }
    }

    /// set the oauth_nonce value
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<String>,
    {
        RequestBuilder {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp(self, timestamp: u64) -> Self {
        RequestBuilder {
            timestamp: Some(timestamp),
            ..self
        }
    }

    pub fn param<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn placement(self, placement: ParameterPlacement) -> Self {
        RequestBuilder {
            placement: Some(placement),
            ..self
        }
    }

    /// Seed the protocol parameters, merge the caller's parameters and check
    /// that everything the leg needs before signing is there.
    pub fn build(self) -> Result<Request> {
        let mut url = Url::parse(&self.url)?;
        // query parameters on the url take part in the signature
        let query = url.query_pairs().into_owned().collect::<Vec<_>>();
        url.set_query(None);
        url.set_fragment(None);

        let mut params = BTreeMap::new();
        if self.leg.is_signed() {
            params.insert(
                OAUTH_NONCE_KEY.to_string(),
                self.nonce.unwrap_or_else(generate_nonce),
            );
            params.insert(
                OAUTH_TIMESTAMP_KEY.to_string(),
                self.timestamp
                    .unwrap_or_else(generate_timestamp)
                    .to_string(),
            );
            params.insert(OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string());
        }
        merge_params(&mut params, self.params)?;

        let placement = self
            .placement
            .unwrap_or_else(|| ParameterPlacement::default_for(&self.method));
        let request = Request {
            leg: self.leg,
            method: self.method,
            url,
            query,
            params,
            placement,
        };
        request.check(Stage::Unsigned)?;
        Ok(request)
    }
}

impl Request {
    /// Build a request with a fresh nonce and the current timestamp.
    pub fn build<U, I, K, V>(leg: Leg, method: Method, url: U, seed: I) -> Result<Self>
    where
        U: Into<String>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RequestBuilder::new(leg, method, url).params(seed).build()
    }

    pub fn builder<U>(leg: Leg, method: Method, url: U) -> RequestBuilder
    where
        U: Into<String>,
    {
        RequestBuilder::new(leg, method, url)
    }

    pub fn leg(&self) -> Leg {
        self.leg
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The url without its query string.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Parameters that came with the url query, in their original order.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn placement(&self) -> &ParameterPlacement {
        &self.placement
    }

    pub fn set_placement(&mut self, placement: ParameterPlacement) -> &mut Self {
        self.placement = placement;
        self
    }

    pub fn is_signed(&self) -> bool {
        self.params.contains_key(OAUTH_SIGNATURE_KEY)
    }

    /// Merge more parameters under the same rules as the builder. On
    /// conflict nothing is merged. A previous signature is dropped.
    pub fn add_params<I, K, V>(&mut self, extra: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let extra = extra
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<Vec<(String, String)>>();
        merge_params(&mut self.params, extra)?;
        self.params.remove(OAUTH_SIGNATURE_KEY);
        Ok(self)
    }

    /// The normalized request parameters (RFC 5849 3.4.1.3.2).
    pub fn normalized_parameters(&self) -> String {
        normalize_parameters(self.all_params())
    }

    /// The signature base string (RFC 5849 3.4.1). Only stable once
    /// `oauth_signature_method` is set, which [`Request::sign`] does.
    pub fn signature_base_string(&self) -> String {
        signature_base_string(&self.method, &self.url, &self.normalized_parameters())
    }

    /// Sign with the consumer secret and, once a token exists, its secret.
    /// Signing again replaces the previous signature.
    pub fn sign<S, C>(
        &mut self,
        signature: &S,
        consumer: &C,
        token: Option<&dyn TokenSecretsProvider>,
    ) -> Result<&mut Self>
    where
        S: SignatureMethod + ?Sized,
        C: SecretsProvider + ?Sized,
    {
        self.check(Stage::Unsigned)?;
        self.params.remove(OAUTH_SIGNATURE_KEY);
        self.params.insert(
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            signature.name().to_string(),
        );

        let (_, consumer_secret) = consumer.get_consumer_key_pair();
        let token_secret = token.map(|t| t.get_token_secret());
        let value = signature.sign_request(
            &self.method,
            &self.url,
            &self.normalized_parameters(),
            consumer_secret,
            token_secret,
        )?;
        self.params.insert(OAUTH_SIGNATURE_KEY.to_string(), value);
        Ok(self)
    }

    fn check(&self, stage: Stage) -> Result<()> {
        let missing = self.leg.required_keys().iter().find(|key| {
            let optional = **key == OAUTH_VERIFIER_KEY
                || (stage == Stage::Unsigned
                    && (**key == OAUTH_SIGNATURE_KEY || **key == OAUTH_SIGNATURE_METHOD_KEY));
            !optional && self.param(key).map_or(true, str::is_empty)
        });
        match missing {
            Some(key) => Err(Error::MissingRequiredParameter(key.to_string())),
            None => Ok(()),
        }
    }

    /// Protocol and caller parameters followed by the url query parameters.
    fn all_params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// The GET form of the request: base url plus every parameter, sorted.
    /// This is what the user agent is sent to for the authorize leg.
    pub fn as_url(&self) -> String {
        let query = to_query_string(self.all_params());
        if query.is_empty() {
            base_url(&self.url).to_string()
        } else {
            format!("{}?{}", base_url(&self.url), query)
        }
    }

    /// `OAuth realm="...", oauth_consumer_key="...", ...` over the `oauth_*`
    /// parameters.
    pub fn authorization_header(&self, realm: Option<&str>) -> String {
        let realm = realm.map(|r| format!("{}=\"{}\"", REALM_KEY, percent_encode(r)));
        let oauth = self
            .params
            .iter()
            .filter(|(k, _)| k.starts_with(OAUTH_KEY_PREFIX))
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)));
        let parts = realm.into_iter().chain(oauth).collect::<Vec<_>>();
        format!("OAuth {}", parts.join(", "))
    }

    /// Lay the parameters out according to the placement.
    pub fn transport_request(&self) -> TransportRequest {
        let mut url = self.url.clone();
        let (query, body, authorization) = match &self.placement {
            ParameterPlacement::Query => (to_query_string(self.all_params()), None, None),
            ParameterPlacement::Body => (
                to_query_string(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
                Some(to_query_string(
                    self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )),
                None,
            ),
            ParameterPlacement::AuthorizationHeader { realm } => {
                let header = self.authorization_header(realm.as_deref());
                let rest = self
                    .params
                    .iter()
                    .filter(|(k, _)| !k.starts_with(OAUTH_KEY_PREFIX))
                    .map(|(k, v)| (k.as_str(), v.as_str()));
                if carries_query(&self.method) {
                    let all = rest.chain(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                    (to_query_string(all), None, Some(header))
                } else {
                    let body = to_query_string(rest);
                    (
                        to_query_string(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str()))),
                        Some(body).filter(|b| !b.is_empty()),
                        Some(header),
                    )
                }
            }
        };
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        TransportRequest {
            method: self.method.clone(),
            url,
            authorization,
            body,
        }
    }

    /// Send the signed request and return what the transport got back.
    pub async fn execute_raw<T>(&self, transport: &T) -> Result<TransportResponse>
    where
        T: Transport + ?Sized,
    {
        if !self.leg.is_signed() {
            return Err(Error::NotExecutable(self.leg));
        }
        self.check(Stage::Signed)?;

        let request = self.transport_request();
        tracing::debug!(leg = %self.leg, method = %self.method, url = %self.url, "sending oauth request");
        let response = transport.send(request).await?;
        tracing::debug!(leg = %self.leg, status = response.status, "oauth request completed");
        Ok(response)
    }

    /// Send the signed request and parse the reply into parameters.
    pub async fn execute<T>(&self, transport: &T) -> Result<Response>
    where
        T: Transport + ?Sized,
    {
        Response::new(self.execute_raw(transport).await?)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.as_url())
    }
}

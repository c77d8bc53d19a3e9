//! Orchestration of the three protocol legs for one OAuth service.
//!
//! A [`Provider`] owns the consumer credentials, the signature method and the
//! transport, and walks a single flow through
//! `Uninitialized -> HasRequestToken -> AwaitingUserAuthorization -> Authorized`.
//! A failed leg returns its error and leaves the state where it was.

use std::fmt;
use std::str::FromStr;

use http::Method;
use url::Url;

use crate::signature;
use crate::{
    AccessToken, ConfigSource, Consumer, Error, Leg, ParameterPlacement, Request, RequestToken,
    Response, Result, SignError, SignatureMethod, Transport, TransportResponse,
    OAUTH_CALLBACK_CONFIRMED_KEY, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY, OAUTH_TOKEN_KEY,
    OAUTH_TOKEN_SECRET_KEY, OAUTH_VERIFIER_KEY,
};

const SCOPE_KEY: &str = "scope";
const DEFAULT_UID_KEY: &str = "uid";
const DEFAULT_SCOPE_SEPARATOR: &str = ",";

/// The three endpoints of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub request_url: String,
    pub authorize_url: String,
    pub access_url: String,
    /// Protected resource describing the signed-in user, if the service has one.
    pub account_info_url: Option<String>,
}

impl Endpoints {
    pub fn new<R, A, T>(request_url: R, authorize_url: A, access_url: T) -> Self
    where
        R: Into<String>,
        A: Into<String>,
        T: Into<String>,
    {
        Endpoints {
            request_url: request_url.into(),
            authorize_url: authorize_url.into(),
            access_url: access_url.into(),
            account_info_url: None,
        }
    }

    pub fn with_account_info_url<U>(self, url: U) -> Self
    where
        U: Into<String>,
    {
        Endpoints {
            account_info_url: Some(url.into()),
            ..self
        }
    }

    fn validate(&self) -> Result<()> {
        for url in [&self.request_url, &self.authorize_url, &self.access_url]
            .into_iter()
            .chain(self.account_info_url.as_ref())
        {
            Url::parse(url)?;
        }
        Ok(())
    }
}

/// Services known out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Twitter,
    Vimeo,
}

impl ProviderKind {
    /// Name under which the service is looked up in the configuration.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Twitter => "twitter",
            ProviderKind::Vimeo => "vimeo",
        }
    }

    pub fn endpoints(&self) -> Endpoints {
        match self {
            ProviderKind::Twitter => Endpoints::new(
                "https://api.twitter.com/oauth/request_token",
                "https://api.twitter.com/oauth/authorize",
                "https://api.twitter.com/oauth/access_token",
            )
            .with_account_info_url("https://api.twitter.com/1.1/account/verify_credentials.json"),
            ProviderKind::Vimeo => Endpoints::new(
                "https://vimeo.com/oauth/request_token",
                "https://vimeo.com/oauth/authorize",
                "https://vimeo.com/oauth/access_token",
            )
            .with_account_info_url(
                "https://vimeo.com/api/rest/v2?method=vimeo.people.getInfo&format=json",
            ),
        }
    }

    /// Field of the access token response carrying the user id.
    pub fn uid_key(&self) -> &'static str {
        match self {
            ProviderKind::Twitter => "user_id",
            ProviderKind::Vimeo => DEFAULT_UID_KEY,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "twitter" => Ok(ProviderKind::Twitter),
            "vimeo" => Ok(ProviderKind::Vimeo),
            _ => Err(Error::UnknownProvider(s.to_string())),
        }
    }
}

/// Where a flow currently stands, with the credentials obtained so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Uninitialized,
    HasRequestToken(RequestToken),
    AwaitingUserAuthorization(RequestToken),
    Authorized(AccessToken),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Uninitialized => "uninitialized",
            FlowState::HasRequestToken(_) => "has_request_token",
            FlowState::AwaitingUserAuthorization(_) => "awaiting_user_authorization",
            FlowState::Authorized(_) => "authorized",
        }
    }

    /// The temporary credentials held between the request and access legs.
    pub fn request_token(&self) -> Option<&RequestToken> {
        match self {
            FlowState::HasRequestToken(t) | FlowState::AwaitingUserAuthorization(t) => Some(t),
            _ => None,
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        match self {
            FlowState::Authorized(t) => Some(t),
            _ => None,
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        FlowState::Uninitialized
    }
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One OAuth 1.0a flow against one service.
///
/// Transitions take `&mut self`; run independent flows on independent
/// providers.
#[derive(Debug)]
pub struct Provider<T> {
    name: String,
    consumer: Consumer,
    endpoints: Endpoints,
    signature: Box<dyn SignatureMethod>,
    uid_key: String,
    scope_separator: String,
    method: Method,
    placement: Option<ParameterPlacement>,
    transport: T,
    state: FlowState,
}

impl<T> Provider<T>
where
    T: Transport,
{
    /// Build a provider for a known service. Endpoints configured for the
    /// service replace the defaults.
    pub fn forge<C>(kind: ProviderKind, config: &C, transport: T) -> Result<Self>
    where
        C: ConfigSource + ?Sized,
    {
        Provider::from_config(
            kind.name().to_string(),
            kind.endpoints(),
            kind.uid_key(),
            config,
            transport,
        )
    }

    /// Build a provider for a service that has no [`ProviderKind`].
    pub fn custom<N, C>(name: N, endpoints: Endpoints, config: &C, transport: T) -> Result<Self>
    where
        N: Into<String>,
        C: ConfigSource + ?Sized,
    {
        Provider::from_config(name.into(), endpoints, DEFAULT_UID_KEY, config, transport)
    }

    fn from_config<C>(
        name: String,
        defaults: Endpoints,
        default_uid_key: &str,
        config: &C,
        transport: T,
    ) -> Result<Self>
    where
        C: ConfigSource + ?Sized,
    {
        let missing = |field| Error::MissingCredentials {
            service: name.clone(),
            field,
        };
        let service = config.service(&name).ok_or_else(|| missing("app_key"))?;
        let kind = service.signature_method()?;
        let key = service.app_key.ok_or_else(|| missing("app_key"))?;
        let secret = service.app_secret.ok_or_else(|| missing("app_secret"))?;
        let callback = config.callback_url().ok_or_else(|| missing("callback"))?;
        let consumer = Consumer::new(&name, key, secret, callback)?.with_scope(service.scope);

        let signature =
            signature::forge(kind, service.private_key.as_deref()).map_err(|e| match e {
                SignError::MissingPrivateKey => missing("private_key"),
                other => Error::Signer(other),
            })?;

        let endpoints = Endpoints {
            request_url: service.request_url.unwrap_or(defaults.request_url),
            authorize_url: service.authorize_url.unwrap_or(defaults.authorize_url),
            access_url: service.access_url.unwrap_or(defaults.access_url),
            account_info_url: service.account_info_url.or(defaults.account_info_url),
        };
        endpoints.validate()?;

        tracing::debug!(provider = %name, signature = %kind, "provider configured");
        Ok(Provider {
            name,
            consumer,
            endpoints,
            signature,
            uid_key: service
                .uid_key
                .unwrap_or_else(|| default_uid_key.to_string()),
            scope_separator: service
                .scope_separator
                .unwrap_or_else(|| DEFAULT_SCOPE_SEPARATOR.to_string()),
            method: Method::GET,
            placement: None,
            transport,
            state: FlowState::Uninitialized,
        })
    }

    /// HTTP method of the request and access legs. Defaults to GET.
    pub fn with_method(self, method: Method) -> Self {
        Provider { method, ..self }
    }

    /// Parameter placement of the request and access legs. Defaults to the
    /// query for GET and the body otherwise.
    pub fn with_placement(self, placement: ParameterPlacement) -> Self {
        Provider {
            placement: Some(placement),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn consumer(&self) -> &Consumer {
        &self.consumer
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub fn signature_method(&self) -> &dyn SignatureMethod {
        self.signature.as_ref()
    }

    pub fn uid_key(&self) -> &str {
        &self.uid_key
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forget the current flow.
    pub fn reset(&mut self) {
        self.state = FlowState::Uninitialized;
    }

    /// Obtain temporary credentials. Signed with the consumer secret only.
    pub async fn request_token(&mut self, extra: &[(&str, &str)]) -> Result<RequestToken> {
        let mut seed = vec![
            (OAUTH_CONSUMER_KEY.to_string(), self.consumer.key().to_string()),
            (
                OAUTH_CALLBACK_KEY.to_string(),
                self.consumer.callback().to_string(),
            ),
        ];
        if let Some(scope) = self.consumer.scope().join(&self.scope_separator) {
            seed.push((SCOPE_KEY.to_string(), scope));
        }

        let mut request = self.token_leg(Leg::Request, &self.endpoints.request_url, seed)?;
        request.add_params(extra.iter().copied())?;
        request.sign(self.signature.as_ref(), &self.consumer, None)?;

        tracing::debug!(provider = %self.name, "requesting temporary credentials");
        let response = request.execute(&self.transport).await?;
        let (token, secret) = self.read_credentials(Leg::Request, &response)?;
        match response.param(OAUTH_CALLBACK_CONFIRMED_KEY) {
            Some("true") | None => {}
            Some(other) => tracing::warn!(
                provider = %self.name,
                confirmed = other,
                "provider did not confirm the callback"
            ),
        }

        let token = RequestToken::new(token, secret)?;
        self.state = FlowState::HasRequestToken(token.clone());
        tracing::debug!(provider = %self.name, state = %self.state, "flow advanced");
        Ok(token)
    }

    /// Url to send the user agent to. Nothing is signed or sent.
    ///
    /// With `None` the request token held by the flow is used.
    pub fn authorize_url(
        &mut self,
        token: Option<&RequestToken>,
        extra: &[(&str, &str)],
    ) -> Result<String> {
        let token = self.resolve_request_token(token)?;
        let mut request = Request::build(
            Leg::Authorize,
            Method::GET,
            self.endpoints.authorize_url.as_str(),
            vec![(OAUTH_TOKEN_KEY, token.access_token())],
        )?;
        request.add_params(extra.iter().copied())?;
        let url = request.as_url();

        self.state = FlowState::AwaitingUserAuthorization(token);
        tracing::debug!(provider = %self.name, state = %self.state, "flow advanced");
        Ok(url)
    }

    /// Store the verifier handed back to the callback on the held request
    /// token.
    pub fn attach_verifier<V>(&mut self, verifier: V) -> Result<&RequestToken>
    where
        V: Into<String>,
    {
        let verifier = verifier.into();
        self.state = match std::mem::take(&mut self.state) {
            FlowState::HasRequestToken(t) => FlowState::HasRequestToken(t.with_verifier(verifier)),
            FlowState::AwaitingUserAuthorization(t) => {
                FlowState::AwaitingUserAuthorization(t.with_verifier(verifier))
            }
            other => {
                self.state = other;
                return Err(Error::MissingRequiredParameter(OAUTH_TOKEN_KEY.to_string()));
            }
        };
        self.state
            .request_token()
            .ok_or_else(|| Error::MissingRequiredParameter(OAUTH_TOKEN_KEY.to_string()))
    }

    /// Exchange the request token and its verifier for token credentials.
    ///
    /// With `None` the request token held by the flow is used.
    pub async fn access_token(
        &mut self,
        token: Option<&RequestToken>,
        extra: &[(&str, &str)],
    ) -> Result<AccessToken> {
        let token = self.resolve_request_token(token)?;
        let mut seed = vec![
            (OAUTH_CONSUMER_KEY.to_string(), self.consumer.key().to_string()),
            (OAUTH_TOKEN_KEY.to_string(), token.access_token().to_string()),
        ];
        if let Some(verifier) = token.verifier() {
            seed.push((OAUTH_VERIFIER_KEY.to_string(), verifier.to_string()));
        }

        let mut request = self.token_leg(Leg::Access, &self.endpoints.access_url, seed)?;
        request.add_params(extra.iter().copied())?;
        request.sign(self.signature.as_ref(), &self.consumer, Some(&token))?;

        tracing::debug!(provider = %self.name, "exchanging request token");
        let response = request.execute(&self.transport).await?;
        let (access, secret) = self.read_credentials(Leg::Access, &response)?;
        let access = AccessToken::new(access, secret)?.with_uid(response.param(&self.uid_key));

        self.state = FlowState::Authorized(access.clone());
        tracing::debug!(provider = %self.name, state = %self.state, "flow advanced");
        Ok(access)
    }

    /// A signed protected resource request, ready to execute.
    pub fn resource_request(
        &self,
        token: &AccessToken,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Request> {
        let mut request = Request::build(
            Leg::Resource,
            method,
            url,
            vec![
                (OAUTH_CONSUMER_KEY, self.consumer.key()),
                (OAUTH_TOKEN_KEY, token.access_token()),
            ],
        )?;
        request.add_params(params.iter().copied())?;
        request.sign(self.signature.as_ref(), &self.consumer, Some(token))?;
        Ok(request)
    }

    /// Sign and send a protected resource request. The body is returned
    /// untouched.
    pub async fn fetch_resource(
        &self,
        token: &AccessToken,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<TransportResponse> {
        let request = self.resource_request(token, method, url, params)?;
        request.execute_raw(&self.transport).await
    }

    /// Fetch the account info resource of the service with the access token.
    pub async fn fetch_account_info(&self, token: &AccessToken) -> Result<TransportResponse> {
        let url = self.endpoints.account_info_url.as_deref().ok_or_else(|| {
            Error::InvalidConfig(format!("{} has no account info url", self.name))
        })?;
        self.fetch_resource(token, Method::GET, url, &[]).await
    }

    fn token_leg(&self, leg: Leg, url: &str, seed: Vec<(String, String)>) -> Result<Request> {
        let mut builder = Request::builder(leg, self.method.clone(), url).params(seed);
        if let Some(placement) = &self.placement {
            builder = builder.placement(placement.clone());
        }
        builder.build()
    }

    fn resolve_request_token(&self, token: Option<&RequestToken>) -> Result<RequestToken> {
        token
            .or_else(|| self.state.request_token())
            .cloned()
            .ok_or_else(|| Error::MissingRequiredParameter(OAUTH_TOKEN_KEY.to_string()))
    }

    fn read_credentials(&self, leg: Leg, response: &Response) -> Result<(String, String)> {
        if !response.is_success() {
            tracing::warn!(provider = %self.name, leg = %leg, status = response.status(), "token exchange rejected");
            return Err(Error::InvalidProviderResponse(format!(
                "{} leg answered with status {} : {}",
                leg,
                response.status(),
                response.body()
            )));
        }
        let field = |key: &str| {
            response
                .param(key)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| {
                    tracing::warn!(provider = %self.name, leg = %leg, field = key, "token field missing");
                    Error::InvalidProviderResponse(format!("{} is missing from the {} leg", key, leg))
                })
        };
        Ok((field(OAUTH_TOKEN_KEY)?, field(OAUTH_TOKEN_SECRET_KEY)?))
    }
}

//! HTTP client for the radiko API
//!
//! [`RadikoClient`] owns a [`Transport`], the API root URL and the auth token
//! header. Every call goes through the same pipeline:
//!
//! 1. [`RadikoClient::new_request`] resolves a versioned path (see
//!    [`api_path`]), applies the [`Params`] and, when asked to, injects the
//!    current auth token header;
//! 2. [`RadikoClient::execute`] sends it over the transport, racing the
//!    request's [`RequestContext`].
//!
//! # Example
//!
//! ```no_run
//! use pmoradiko::{api_path, ApiVersion, Params, RadikoClient, RequestContext};
//! use reqwest::Method;
//!
//! # async fn example() -> pmoradiko::Result<()> {
//! let mut client = RadikoClient::new("")?;
//! let ctx = RequestContext::background();
//!
//! client.authorize_token(&ctx).await?;
//!
//! let path = api_path(ApiVersion::V3, "station/list/JP13.xml");
//! let request = client.new_request(Some(&ctx), Method::GET, &path, &Params::authenticated())?;
//! let response = client.execute(request).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use crate::config::{AppIdentity, RadikoConfig};
use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::transport::{default_transport, Transport};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Request, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default radiko API root
pub const DEFAULT_BASE_URL: &str = "https://radiko.jp/";

/// Header carrying the auth token
pub const RADIKO_AUTH_TOKEN_HEADER: &str = "X-Radiko-AuthToken";

/// Header name set on the client once authorization succeeds
pub(crate) fn default_auth_token_header() -> HeaderName {
    HeaderName::from_static("x-radiko-authtoken")
}

/// radiko API versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiVersion {
    /// `v2`: authorization, stream URLs, timeshift playlists
    V2,
    /// `v3`: stations and program listings
    V3,
}

impl ApiVersion {
    /// Base path segment of this version
    pub fn base(self) -> &'static str {
        match self {
            ApiVersion::V2 => "v2",
            ApiVersion::V3 => "v3",
        }
    }
}

/// Resolve `path` under the base segment of `version`
///
/// Empty segments are dropped, so the result never holds a doubled or a
/// leading `/`.
///
/// ```
/// use pmoradiko::{api_path, ApiVersion};
///
/// assert_eq!(api_path(ApiVersion::V2, "api/auth1"), "v2/api/auth1");
/// assert_eq!(api_path(ApiVersion::V3, "/station//list/"), "v3/station/list");
/// assert_eq!(api_path(ApiVersion::V3, ""), "v3");
/// ```
pub fn api_path(version: ApiVersion, path: &str) -> String {
    std::iter::once(version.base())
        .chain(path.split('/').filter(|segment| !segment.is_empty()))
        .collect::<Vec<_>>()
        .join("/")
}

/// Per-request options
///
/// Built fresh for each call with the consuming `with_*`/`query`/`header`
/// methods, then only read by [`RadikoClient::new_request`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    set_auth_token: bool,
    query: Vec<(String, String)>,
    form: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl Params {
    /// No auth token, no parameters
    pub fn new() -> Self {
        Self::default()
    }

    /// Params carrying the client's auth token
    pub fn authenticated() -> Self {
        Self::new().with_auth_token(true)
    }

    /// Whether the request must carry the auth token header
    pub fn with_auth_token(mut self, set_auth_token: bool) -> Self {
        self.set_auth_token = set_auth_token;
        self
    }

    /// Append a query parameter
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Append a form-encoded body parameter
    pub fn form(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.form.push((key.into(), value.into()));
        self
    }

    /// Add a request header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A fully built request bound to the context it was built with
#[derive(Debug)]
pub struct ApiRequest {
    request: Request,
    ctx: RequestContext,
}

impl ApiRequest {
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn url(&self) -> &Url {
        self.request.url()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn context(&self) -> &RequestContext {
        &self.ctx
    }

    /// Split into the raw `reqwest` request and its context
    pub fn into_parts(self) -> (Request, RequestContext) {
        (self.request, self.ctx)
    }
}

/// radiko HTTP client
///
/// The auth token and its header name are plain fields: mutating them takes
/// `&mut self`, so sharing a client across tasks while re-authorizing needs
/// external synchronization. Building and executing requests only borrow.
#[derive(Debug, Clone)]
pub struct RadikoClient {
    transport: Transport,
    base_url: Url,
    auth_token: String,
    auth_token_header: HeaderName,
    app: AppIdentity,
}

impl RadikoClient {
    /// Create a client on the default transport
    ///
    /// `auth_token` may be empty, meaning "not authorized yet".
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when no default transport is available.
    pub fn new(auth_token: impl Into<String>) -> Result<Self> {
        Self::builder().auth_token(auth_token).build()
    }

    /// Create a builder for configuring the client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Get the API root
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the transport
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        self.transport.http_client()
    }

    /// Identity headers sent during authorization
    pub fn app_identity(&self) -> &AppIdentity {
        &self.app
    }

    /// Current auth token (empty when not authorized)
    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Name of the header the auth token travels in
    pub fn auth_token_header_name(&self) -> &HeaderName {
        &self.auth_token_header
    }

    /// Replace the transport
    pub fn set_transport(&mut self, transport: Transport) {
        self.transport = transport;
    }

    /// Attach a cookie jar to this client's transport
    pub fn set_jar(&mut self, jar: Arc<Jar>) -> Result<()> {
        self.transport = self.transport.with_jar(jar)?;
        Ok(())
    }

    /// Cookie jar of the transport, if any
    pub fn jar(&self) -> Option<&Arc<Jar>> {
        self.transport.jar()
    }

    /// Set the auth token injected by authenticated requests
    pub fn set_auth_token_header(&mut self, token: impl Into<String>) {
        self.auth_token = token.into();
    }

    pub(crate) fn set_auth_token_header_name(&mut self, name: HeaderName) {
        self.auth_token_header = name;
    }

    /// Build a request for `path` relative to the API root
    ///
    /// `path` is normally produced by [`api_path`]. Its `/`-separated segments
    /// are appended to the API root path and percent-encoded one by one, so
    /// `?`, `#` or a scheme inside a segment stay part of the path. Empty,
    /// `.` and `..` segments are dropped. The auth token header is attached
    /// whenever `params` asks for it, even when the token is empty.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidContext`] - `ctx` is `None`
    /// * [`Error::InvalidHeader`] - a header name or value is not valid HTTP
    pub fn new_request(
        &self,
        ctx: Option<&RequestContext>,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<ApiRequest> {
        let ctx = ctx.ok_or(Error::InvalidContext)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config(format!("{} cannot be a base URL", self.base_url)))?
            .pop_if_empty()
            .extend(
                path.split('/')
                    .filter(|segment| !matches!(*segment, "" | "." | "..")),
            );
        if !params.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&params.query);
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &params.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::InvalidHeader(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }

        if params.set_auth_token {
            let value = HeaderValue::from_str(&self.auth_token).map_err(|e| {
                Error::InvalidHeader(format!("{}: {}", self.auth_token_header, e))
            })?;
            headers.insert(self.auth_token_header.clone(), value);
        }

        debug!(%method, %url, auth = params.set_auth_token, "Building radiko request");

        let mut builder = self.http_client().request(method, url).headers(headers);
        if !params.form.is_empty() {
            builder = builder.form(&params.form);
        }

        Ok(ApiRequest {
            request: builder.build()?,
            ctx: ctx.clone(),
        })
    }

    /// Execute a request over the transport
    ///
    /// The caller owns the returned response; dropping it releases the body.
    /// No retries are made.
    ///
    /// # Errors
    ///
    /// * [`Error::Context`] - the request context was cancelled or expired,
    ///   before or during the exchange
    /// * [`Error::Transport`] - DNS, TLS, connection or timeout failure
    pub async fn execute(&self, request: ApiRequest) -> Result<Response> {
        let (request, ctx) = request.into_parts();
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(%method, %url, "Executing radiko request");

        let response = ctx.run(self.http_client().execute(request)).await??;

        debug!(%method, %url, status = %response.status(), "radiko response");

        Ok(response)
    }

    /// Build, execute and read a text body, mapping error statuses
    pub(crate) async fn fetch_text(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<String> {
        let request = self.new_request(Some(ctx), method, path, params)?;
        let response = self.execute(request).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, path, "radiko API error");
            return Err(Error::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        Ok(ctx.run(response.text()).await??)
    }

    /// GET an XML document and deserialize it
    pub(crate) async fn fetch_xml<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &str,
        params: &Params,
    ) -> Result<T> {
        let body = self.fetch_text(ctx, Method::GET, path, params).await?;
        quick_xml::de::from_str(&body).map_err(|e| {
            warn!(path, "Failed to parse radiko XML: {}", e);
            Error::decode(format!("{}: {}", path, e))
        })
    }
}

/// Builder for configuring a RadikoClient
#[derive(Debug)]
pub struct ClientBuilder {
    transport: Option<Transport>,
    transport_settings: Option<(Duration, String)>,
    base_url: String,
    auth_token: String,
    app: AppIdentity,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            transport: None,
            transport_settings: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: String::new(),
            app: AppIdentity::default(),
        }
    }
}

impl ClientBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit transport instead of the process-wide default
    pub fn transport(mut self, transport: Transport) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Set the API root
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the initial auth token
    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = token.into();
        self
    }

    /// Set the handshake identity headers
    pub fn app_identity(mut self, app: AppIdentity) -> Self {
        self.app = app;
        self
    }

    /// Apply a loaded configuration
    ///
    /// The transport is built from the configured timeout and User-Agent
    /// unless an explicit transport is also given.
    pub fn config(mut self, config: &RadikoConfig) -> Self {
        self.base_url = config.base_url.clone();
        self.auth_token = config.auth_token.clone();
        self.app = config.app.clone();
        self.transport_settings = Some((
            Duration::from_secs(config.timeout_secs),
            config.user_agent.clone(),
        ));
        self
    }

    /// Build the client
    pub fn build(self) -> Result<RadikoClient> {
        let transport = match (self.transport, self.transport_settings) {
            (Some(transport), _) => transport,
            (None, Some((timeout, user_agent))) => Transport::builder()
                .timeout(timeout)
                .user_agent(user_agent)
                .build()?,
            (None, None) => default_transport()?,
        };

        let mut base_url = Url::parse(&self.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(format!(
                "base URL cannot hold paths: {}",
                self.base_url
            )));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(RadikoClient {
            transport,
            base_url,
            auth_token: self.auth_token,
            auth_token_header: default_auth_token_header(),
            app: self.app,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContextError;

    fn client(token: &str) -> RadikoClient {
        RadikoClient::builder()
            .transport(Transport::new().unwrap())
            .auth_token(token)
            .build()
            .unwrap()
    }

    #[test]
    fn test_new() {
        let client = RadikoClient::new("").unwrap();
        assert_eq!(client.auth_token(), "");
        assert_eq!(client.base_url().as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_api_path() {
        for version in [ApiVersion::V2, ApiVersion::V3] {
            for path in ["test", "/test", "a/b/test", "a//b/test/", "//test"] {
                let endpoint = api_path(version, path);
                assert!(
                    endpoint.starts_with(&format!("{}/", version.base())),
                    "invalid prefix: {}",
                    endpoint
                );
                assert!(endpoint.ends_with("/test"), "invalid suffix: {}", endpoint);
                assert!(!endpoint.contains("//"), "doubled separator: {}", endpoint);
            }
        }
    }

    #[test]
    fn test_new_request() {
        let client = client("");
        let ctx = RequestContext::background();
        let request = client
            .new_request(Some(&ctx), Method::GET, "", &Params::new())
            .unwrap();

        assert_eq!(*request.method(), Method::GET);
        assert_eq!(request.url().as_str(), DEFAULT_BASE_URL);
        assert!(request.headers().get(RADIKO_AUTH_TOKEN_HEADER).is_none());
    }

    #[test]
    fn test_new_request_resolves_versioned_path() {
        let client = client("");
        let ctx = RequestContext::background();
        let path = api_path(ApiVersion::V3, "station/list/JP13.xml");
        let request = client
            .new_request(Some(&ctx), Method::GET, &path, &Params::new())
            .unwrap();

        assert_eq!(request.url().path(), "/v3/station/list/JP13.xml");
    }

    #[test]
    fn test_new_request_keeps_reserved_characters_in_path() {
        let client = client("");
        let ctx = RequestContext::background();

        let path = api_path(ApiVersion::V3, "station/list/JP13?x=1.xml");
        let request = client
            .new_request(Some(&ctx), Method::GET, &path, &Params::new())
            .unwrap();
        assert_eq!(request.url().path(), "/v3/station/list/JP13%3Fx=1.xml");
        assert_eq!(request.url().query(), None);

        let path = api_path(ApiVersion::V3, "weekly/TBS#frag.xml");
        let request = client
            .new_request(Some(&ctx), Method::GET, &path, &Params::new())
            .unwrap();
        assert_eq!(request.url().path(), "/v3/weekly/TBS%23frag.xml");
        assert_eq!(request.url().fragment(), None);
    }

    #[test]
    fn test_new_request_stays_under_api_root() {
        let client = client("auth_token");
        let ctx = RequestContext::background();

        let path = api_path(ApiVersion::V3, "a/../../x");
        let request = client
            .new_request(Some(&ctx), Method::GET, &path, &Params::new())
            .unwrap();
        assert_eq!(request.url().path(), "/v3/a/x");

        let request = client
            .new_request(
                Some(&ctx),
                Method::GET,
                "http://elsewhere.example/steal",
                &Params::authenticated(),
            )
            .unwrap();
        assert_eq!(request.url().host_str(), Some("radiko.jp"));
        assert!(request.url().path().ends_with("/elsewhere.example/steal"));
    }

    #[test]
    fn test_new_request_under_base_path_prefix() {
        let client = RadikoClient::builder()
            .transport(Transport::new().unwrap())
            .base_url("http://localhost:8080/radiko")
            .build()
            .unwrap();
        let ctx = RequestContext::background();
        let path = api_path(ApiVersion::V2, "api/auth1");
        let request = client
            .new_request(Some(&ctx), Method::GET, &path, &Params::new())
            .unwrap();

        assert_eq!(request.url().path(), "/radiko/v2/api/auth1");
    }

    #[test]
    fn test_new_client_uses_radiko_token_header() {
        let client = client("");
        assert_eq!(client.auth_token_header_name().as_str(), "x-radiko-authtoken");
        assert_eq!(client.auth_token_header_name(), &default_auth_token_header());
    }

    #[test]
    fn test_new_request_with_auth_token() {
        let client = client("auth_token");
        let ctx = RequestContext::background();
        let request = client
            .new_request(Some(&ctx), Method::GET, "", &Params::authenticated())
            .unwrap();

        assert_eq!(
            request.headers().get(RADIKO_AUTH_TOKEN_HEADER).unwrap(),
            "auth_token"
        );
    }

    #[test]
    fn test_new_request_with_empty_auth_token() {
        let client = client("");
        let ctx = RequestContext::background();
        let request = client
            .new_request(Some(&ctx), Method::GET, "", &Params::authenticated())
            .unwrap();

        assert_eq!(request.headers().get(RADIKO_AUTH_TOKEN_HEADER).unwrap(), "");
    }

    #[test]
    fn test_new_request_with_empty_context() {
        let client = client("");
        let result = client.new_request(None, Method::GET, "", &Params::new());
        assert!(matches!(result, Err(Error::InvalidContext)));
    }

    #[test]
    fn test_new_request_query_and_headers() {
        let client = client("");
        let ctx = RequestContext::background();
        let params = Params::new()
            .query("station_id", "TBS")
            .query("l", "15")
            .header("X-Radiko-Device", "pc");
        let request = client
            .new_request(Some(&ctx), Method::POST, "v2/api/ts/playlist.m3u8", &params)
            .unwrap();

        assert_eq!(request.url().query(), Some("station_id=TBS&l=15"));
        assert_eq!(request.headers().get("x-radiko-device").unwrap(), "pc");
    }

    #[test]
    fn test_new_request_rejects_invalid_header() {
        let client = client("");
        let ctx = RequestContext::background();
        let params = Params::new().header("bad header", "value");
        let result = client.new_request(Some(&ctx), Method::GET, "", &params);
        assert!(matches!(result, Err(Error::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_new_request_with_context_deadline() {
        let client = client("");
        let ctx = RequestContext::with_timeout(Duration::from_millis(100));
        let request = client
            .new_request(Some(&ctx), Method::GET, "", &Params::new())
            .unwrap();

        let err = tokio::time::timeout(Duration::from_secs(3), request.context().done())
            .await
            .expect("context should expire");
        assert_eq!(err, ContextError::DeadlineExceeded);
        assert!(ctx.err().is_some());
    }

    #[tokio::test]
    async fn test_execute_with_cancelled_context() {
        let client = client("");
        let ctx = RequestContext::background();
        let request = client
            .new_request(Some(&ctx), Method::GET, "", &Params::new())
            .unwrap();
        ctx.cancel();

        let result = client.execute(request).await;
        assert!(matches!(
            result,
            Err(Error::Context(ContextError::Canceled))
        ));
    }

    #[test]
    fn test_set_auth_token_header() {
        let mut client = client("");
        client.set_auth_token_header("test_token");
        assert_eq!(client.auth_token(), "test_token");
    }

    #[test]
    fn test_set_jar() {
        let mut client = client("");
        assert!(client.jar().is_none());

        client.set_jar(Arc::new(Jar::default())).unwrap();
        assert!(client.jar().is_some());
    }

    #[test]
    fn test_set_transport() {
        let mut client = client("");
        let transport = Transport::builder()
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();
        client.set_transport(transport);
        assert_eq!(client.transport().timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_builder_normalizes_base_url() {
        let client = RadikoClient::builder()
            .transport(Transport::new().unwrap())
            .base_url("http://localhost:8080/prefix")
            .build()
            .unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:8080/prefix/");

        let ctx = RequestContext::background();
        let request = client
            .new_request(Some(&ctx), Method::GET, "v2/api/auth1", &Params::new())
            .unwrap();
        assert_eq!(request.url().path(), "/prefix/v2/api/auth1");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        let result = RadikoClient::builder()
            .transport(Transport::new().unwrap())
            .base_url("not a url")
            .build();
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_builder_from_config() {
        let config = RadikoConfig::from_yaml_str("timeout_secs: 3\nauth_token: tok\n").unwrap();
        let client = RadikoClient::builder().config(&config).build().unwrap();

        assert_eq!(client.transport().timeout(), Duration::from_secs(3));
        assert_eq!(client.auth_token(), "tok");
        assert_eq!(client.app_identity(), &AppIdentity::default());
    }
}

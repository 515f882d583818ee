// HTTP transport for the dashboard API.
//
// `TransportConfig` builds the `reqwest::Client` (TLS, timeout, cookie jar).
// `HttpTransport` resolves request paths against the configured origin and
// API prefix, carries the session cookies, and mirrors the `XSRF-TOKEN`
// cookie into the `X-XSRF-TOKEN` header the way browser clients do.
//
// The `Transport` trait is the seam the request pipeline is composed around.
// It returns raw responses for every HTTP status; only network failures are
// errors at this layer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, HeaderValue};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::request::{ApiResponse, FormPart, PathScope, PendingRequest, RequestBody};

/// Cookie the server uses to hand out the anti-forgery token.
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";

/// Header the anti-forgery token is echoed back in.
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// Something that can execute a `PendingRequest`.
pub trait Transport: Send + Sync {
    fn send<'a>(&'a self, request: &'a PendingRequest) -> BoxFuture<'a, Result<ApiResponse, Error>>;
}

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (local development servers).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
    pub cookie_jar: Option<Arc<Jar>>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            cookie_jar: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("partnerdash/", env!("CARGO_PKG_VERSION")));

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        if let Some(ref jar) = self.cookie_jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }

    /// Create a config with a fresh cookie jar (session auth needs one).
    pub fn with_cookie_jar(mut self) -> Self {
        self.cookie_jar = Some(Arc::new(Jar::default()));
        self
    }
}

/// `reqwest`-backed transport bound to one origin.
pub struct HttpTransport {
    http: reqwest::Client,
    origin: Url,
    api_base: Url,
    cookie_jar: Arc<Jar>,
}

impl HttpTransport {
    /// Create a transport for `origin`, with resource paths living under
    /// `api_prefix` (e.g. `api/`).
    ///
    /// A cookie jar is created if the config doesn't carry one; session and
    /// anti-forgery cookies are meaningless without it.
    pub fn new(origin: &Url, api_prefix: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config
            .cookie_jar
            .clone()
            .unwrap_or_else(|| Arc::new(Jar::default()));
        let http = config.build_client()?;
        let (origin, api_base) = Self::normalize_bases(origin, api_prefix)?;

        Ok(Self {
            http,
            origin,
            api_base,
            cookie_jar,
        })
    }

    /// Build `{origin}/` and `{origin}/{api_prefix}/`, both ending with a slash
    /// so relative joins append instead of replacing the last segment.
    fn normalize_bases(origin: &Url, api_prefix: &str) -> Result<(Url, Url), Error> {
        let mut origin = origin.clone();
        let path = origin.path().trim_end_matches('/').to_owned();
        origin.set_path(&format!("{path}/"));

        let prefix = api_prefix.trim_matches('/');
        let api_base = if prefix.is_empty() {
            origin.clone()
        } else {
            origin.join(&format!("{prefix}/"))?
        };
        Ok((origin, api_base))
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Resolve a request path. Leading slashes are relative to the scope's
    /// base, never to the host root.
    pub fn url_for(&self, request: &PendingRequest) -> Result<Url, Error> {
        let base = match request.scope() {
            PathScope::Api => &self.api_base,
            PathScope::Origin => &self.origin,
        };
        Ok(base.join(request.path().trim_start_matches('/'))?)
    }

    /// The `Cookie` header value the jar would send to the origin.
    pub fn cookie_header(&self) -> Option<String> {
        let cookies = self.cookie_jar.cookies(&self.origin)?;
        cookies.to_str().ok().map(String::from)
    }

    /// Current anti-forgery token, URL-decoded from the `XSRF-TOKEN` cookie.
    pub fn xsrf_token(&self) -> Option<String> {
        let header = self.cookie_header()?;
        header
            .split(';')
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == XSRF_COOKIE)
            .and_then(|(_, value)| urlencoding::decode(value).ok())
            .map(std::borrow::Cow::into_owned)
    }

    fn apply_xsrf(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.xsrf_token() {
            Some(token) => {
                trace!("attaching anti-forgery token");
                builder.header(XSRF_HEADER, token)
            }
            None => builder,
        }
    }

    async fn execute(&self, request: &PendingRequest) -> Result<ApiResponse, Error> {
        let url = self.url_for(request)?;
        debug!("{} {}", request.method(), url);

        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header("X-Requested-With", "XMLHttpRequest")
            .headers(request.headers().clone());

        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        match request.payload() {
            Some(RequestBody::Json(body)) => builder = builder.json(body),
            Some(RequestBody::Multipart(parts)) => builder = builder.multipart(build_form(parts)?),
            None => {}
        }
        builder = self.apply_xsrf(builder);

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        trace!(%status, bytes = body.len(), "response received");

        Ok(ApiResponse::new(status, headers, body))
    }
}

/// Rebuild a multipart form from stored parts. Called once per attempt,
/// since a `reqwest` form is consumed by sending it.
fn build_form(parts: &[FormPart]) -> Result<reqwest::multipart::Form, Error> {
    let mut form = reqwest::multipart::Form::new();
    for part in parts {
        form = match part {
            FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
            FormPart::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let mut file = reqwest::multipart::Part::bytes(bytes.to_vec()).file_name(file_name.clone());
                if let Some(mime) = mime {
                    file = file
                        .mime_str(mime)
                        .map_err(|e| Error::Serialization(format!("invalid content type {mime:?}: {e}")))?;
                }
                form.part(name.clone(), file)
            }
        };
    }
    Ok(form)
}

impl Transport for HttpTransport {
    fn send<'a>(&'a self, request: &'a PendingRequest) -> BoxFuture<'a, Result<ApiResponse, Error>> {
        Box::pin(self.execute(request))
    }
}

//! reqwest-backed transport

use std::error::Error as _;
use std::time::{Duration, Instant};

use futures::future::{self, FutureExt};
use reqwest::{redirect, Client, Method, Proxy};
use serde::{Deserialize, Serialize};
use wordstorm_core::{
    BodyStats, FuzzRequest, SubmitOptions, Transport, TransportError, TransportFuture,
    TransportResponse,
};

// ============================================================================
// Configuration
// ============================================================================

/// Client-wide HTTP settings
///
/// Per-request settings (the total timeout) travel with each submission;
/// everything here is fixed when the client is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpTransportConfig {
    /// Proxy URL for every request; `None` connects directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Connection timeout
    pub connect_timeout_ms: u64,

    /// Follow redirects instead of reporting the 3xx response
    pub follow_redirects: bool,

    /// Redirect hops allowed when following
    pub max_redirects: usize,

    /// Accept invalid TLS certificates
    pub insecure: bool,

    /// User agent string
    pub user_agent: String,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Idle connection timeout
    pub pool_idle_timeout_ms: u64,

    /// TCP keepalive interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive_ms: Option<u64>,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            connect_timeout_ms: 10_000,
            follow_redirects: false,
            max_redirects: 10,
            insecure: false,
            user_agent: format!("wordstorm/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 32,
            pool_idle_timeout_ms: 90_000,
            tcp_keepalive_ms: Some(60_000),
        }
    }
}

impl HttpTransportConfig {
    /// Route requests through `proxy`
    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Follow redirects
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Skip TLS certificate verification
    pub fn with_insecure(mut self, insecure: bool) -> Self {
        self.insecure = insecure;
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Connection timeout
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

// ============================================================================
// Transport
// ============================================================================

/// Transport backed by one pooled `reqwest::Client`
///
/// # Example
///
/// ```rust,ignore
/// let transport = HttpTransport::new(&HttpTransportConfig::default())?;
/// let engine = EngineBuilder::new().transport(Arc::new(transport)) /* ... */;
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns an error if the proxy URL is invalid or the TLS backend
    /// cannot be initialised.
    #[must_use = "this returns a Result that should be checked"]
    pub fn new(config: &HttpTransportConfig) -> Result<Self, reqwest::Error> {
        let redirect_policy = if config.follow_redirects {
            redirect::Policy::limited(config.max_redirects)
        } else {
            redirect::Policy::none()
        };

        let mut builder = Client::builder()
            .pool_idle_timeout(Duration::from_millis(config.pool_idle_timeout_ms))
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .connect_timeout(config.connect_timeout())
            .user_agent(&config.user_agent)
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(config.insecure);

        if let Some(keepalive) = config.tcp_keepalive_ms {
            builder = builder.tcp_keepalive(Duration::from_millis(keepalive));
        }

        builder = match &config.proxy {
            Some(proxy) => builder.proxy(Proxy::all(proxy.as_str())?),
            None => builder.no_proxy(),
        };

        let client = builder.build()?;
        tracing::debug!(
            proxy = ?config.proxy,
            follow_redirects = config.follow_redirects,
            insecure = config.insecure,
            "HTTP transport ready"
        );

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Configuration used to build the client
    pub fn config(&self) -> &HttpTransportConfig {
        &self.config
    }

    fn build_request(
        &self,
        request: &FuzzRequest,
        options: &SubmitOptions,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TransportError::InvalidRequest(format!("method {:?}", request.method)))?;

        let mut builder = self
            .client
            .request(method, request.url.as_str())
            .timeout(options.timeout);
        for (name, value) in request.header_pairs() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        Ok(builder)
    }
}

impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "reqwest"
    }

    fn submit(&self, request: &FuzzRequest, options: &SubmitOptions) -> TransportFuture {
        let builder = match self.build_request(request, options) {
            Ok(builder) => builder,
            Err(e) => return future::ready(Err(e)).boxed(),
        };
        let timeout = options.timeout;

        async move {
            let started = Instant::now();
            let mut response = builder
                .send()
                .await
                .map_err(|e| classify(&e, timeout))?;
            let status = response.status().as_u16();

            let mut body = BodyStats::new();
            while let Some(chunk) = response.chunk().await.map_err(|e| classify(&e, timeout))? {
                body.feed(&chunk);
            }

            Ok::<_, TransportError>(TransportResponse {
                status,
                body,
                elapsed: started.elapsed(),
            })
        }
        .boxed()
    }
}

/// Map a reqwest failure onto the engine's error kinds
fn classify(error: &reqwest::Error, timeout: Duration) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(timeout)
    } else if error.is_connect() {
        TransportError::Connect(describe(error))
    } else if error.is_builder() {
        TransportError::InvalidRequest(describe(error))
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(describe(error))
    } else {
        TransportError::Other(describe(error))
    }
}

/// Error text with its innermost cause, which carries the useful detail
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    let mut root = None;
    while let Some(cause) = source {
        root = Some(cause);
        source = cause.source();
    }
    if let Some(root) = root {
        message.push_str(": ");
        message.push_str(&root.to_string());
    }
    message
}

// ============================================================================
// Tests
// ============================================================================

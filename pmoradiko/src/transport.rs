//! HTTP transport shared by radiko clients
//!
//! A [`Transport`] wraps a `reqwest::Client` together with the settings it
//! was built from (timeout, User-Agent, cookie jar), so a client can report
//! its configuration and rebuild the transport when a cookie jar is attached.
//!
//! Clients built without an explicit transport take a clone of the
//! process-wide default. [`set_default_transport`] replaces it;
//! [`restore_default_transport`] puts the stock transport back and exists for
//! test isolation.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use reqwest::cookie::Jar;
use reqwest::Client;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for HTTP requests (60 seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Default User-Agent
pub const DEFAULT_USER_AGENT: &str = "PMOMusic/0.3.10 (pmoradiko)";

static DEFAULT_TRANSPORT: Lazy<RwLock<Option<Transport>>> = Lazy::new(|| {
    let transport = match Transport::new() {
        Ok(transport) => Some(transport),
        Err(e) => {
            warn!("Failed to build default HTTP transport: {}", e);
            None
        }
    };
    RwLock::new(transport)
});

/// HTTP transport: a `reqwest::Client` and the settings it was built from
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    jar: Option<Arc<Jar>>,
}

impl Transport {
    /// Build a transport with default settings
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for configuring a transport
    pub fn builder() -> TransportBuilder {
        TransportBuilder::default()
    }

    /// Get the internal HTTP client
    pub fn http_client(&self) -> &Client {
        &self.client
    }

    /// Request timeout applied by this transport
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// User-Agent sent by this transport
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Cookie jar attached to this transport, if any
    pub fn jar(&self) -> Option<&Arc<Jar>> {
        self.jar.as_ref()
    }

    /// Rebuild this transport with the same settings and a cookie jar
    pub fn with_jar(&self, jar: Arc<Jar>) -> Result<Self> {
        TransportBuilder {
            timeout: self.timeout,
            user_agent: self.user_agent.clone(),
            proxy: self.proxy.clone(),
            jar: Some(jar),
        }
        .build()
    }
}

/// Builder for configuring a [`Transport`]
#[derive(Debug)]
pub struct TransportBuilder {
    timeout: Duration,
    user_agent: String,
    proxy: Option<String>,
    jar: Option<Arc<Jar>>,
}

impl Default for TransportBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            jar: None,
        }
    }
}

impl TransportBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a proxy URL
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Attach a cookie jar
    pub fn jar(mut self, jar: Arc<Jar>) -> Self {
        self.jar = Some(jar);
        self
    }

    /// Build the transport
    pub fn build(self) -> Result<Transport> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .timeout(self.timeout);

        if let Some(jar) = &self.jar {
            builder = builder.cookie_provider(Arc::clone(jar));
        }

        if let Some(proxy_url) = &self.proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| Error::config(format!("Invalid proxy: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Cannot build HTTP transport: {}", e)))?;

        debug!(
            timeout_ms = self.timeout.as_millis() as u64,
            cookies = self.jar.is_some(),
            "Built HTTP transport"
        );

        Ok(Transport {
            client,
            timeout: self.timeout,
            user_agent: self.user_agent,
            proxy: self.proxy,
            jar: self.jar,
        })
    }
}

/// Clone of the process-wide default transport
///
/// Fails with [`Error::Config`] when the default was cleared with
/// `set_default_transport(None)` or could not be built.
pub fn default_transport() -> Result<Transport> {
    DEFAULT_TRANSPORT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
        .ok_or_else(|| Error::config("no usable default HTTP transport"))
}

/// Replace the process-wide default transport
///
/// Affects clients constructed afterwards, never existing ones.
pub fn set_default_transport(transport: Option<Transport>) {
    *DEFAULT_TRANSPORT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = transport;
}

/// Put the stock default transport back
///
/// Test isolation helper: tests that call [`set_default_transport`] must
/// restore the default before returning.
pub fn restore_default_transport() -> Result<()> {
    set_default_transport(Some(Transport::new()?));
    Ok(())
}

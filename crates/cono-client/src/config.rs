//! Client configuration

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::{ClientError, Result};

/// Query parameters appended to a request path
pub type Params = BTreeMap<String, String>;

/// Directory name used under the platform cache dir for token files
const APP_NAME: &str = "cono-storage";

/// Account credentials exchanged for a token
#[derive(Clone)]
pub struct Credentials {
    /// Identity service base URL, e.g. `https://identity.example.com/v2.0`
    pub auth_url: String,
    /// Tenant the credentials are scoped to
    pub tenant_id: String,
    /// API user name
    pub username: String,
    /// API user password
    pub password: String,
}

impl Credentials {
    pub fn new(
        auth_url: impl Into<String>,
        tenant_id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            auth_url: auth_url.into(),
            tenant_id: tenant_id.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("auth_url", &self.auth_url)
            .field("tenant_id", &self.tenant_id)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// Credentials used to obtain tokens
    pub credentials: Credentials,
    /// Object storage endpoint URL (tenant-scoped)
    pub endpoint: String,
    /// Mark containers and objects created through this client as world-readable
    pub web_mode: bool,
    /// Directory holding cached tokens; `None` uses the platform cache dir
    pub token_cache_dir: Option<PathBuf>,
    /// Request timeout applied by the transport
    pub timeout: Duration,
    /// User agent string
    pub user_agent: String,
}

impl Config {
    /// Create a new config with web mode disabled
    pub fn new(credentials: Credentials, endpoint: impl Into<String>) -> Self {
        Self {
            credentials,
            endpoint: endpoint.into(),
            web_mode: false,
            token_cache_dir: None,
            timeout: Duration::from_secs(30),
            user_agent: format!("cono-storage/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Enable or disable web mode
    pub fn with_web_mode(mut self, web_mode: bool) -> Self {
        self.web_mode = web_mode;
        self
    }

    /// Store cached tokens in `dir`
    pub fn with_token_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.token_cache_dir = Some(dir.into());
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Reject configurations that cannot produce a working client
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("endpoint", &self.endpoint),
            ("auth_url", &self.credentials.auth_url),
            ("tenant_id", &self.credentials.tenant_id),
            ("username", &self.credentials.username),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ClientError::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }

    /// Resolve the token cache directory
    pub fn resolved_token_cache_dir(&self) -> PathBuf {
        match &self.token_cache_dir {
            Some(dir) => dir.clone(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_NAME),
        }
    }

    /// Build the full URL for a storage path
    pub fn url_for(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if path.is_empty() || path.starts_with('/') || path.starts_with('?') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Append form-encoded `params` to `path` as a query string
pub fn with_query(path: &str, params: &Params) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params)
        .finish();
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", path, separator, query)
}

//! Main client implementation

use std::fmt;

use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::Authenticator,
    config::{with_query, Params},
    headers::{self, Headers},
    response::Response,
    token::{Token, TokenState},
    token_cache::TokenCache,
    upload::{self, UploadSource},
    Config, ClientError, Result,
};

/// HTTP verbs supported by the storage service
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Put,
    Delete,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Storage client.
///
/// Every operation first makes sure a valid token is held, consulting the
/// in-memory token, then the on-disk cache, and finally the identity service.
/// Token state is mutated through `&mut self`; share a client between tasks
/// only behind external synchronization.
pub struct StorageClient {
    config: Config,
    http: Client,
    authenticator: Authenticator,
    cache: TokenCache,
    state: TokenState,
}

impl StorageClient {
    /// Create a new client with the given configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Transport)?;
        let authenticator = Authenticator::new(
            http.clone(),
            config.credentials.clone(),
            config.user_agent.clone(),
        );
        let cache = TokenCache::new(config.resolved_token_cache_dir());

        Ok(Self {
            config,
            http,
            authenticator,
            cache,
            state: TokenState::new(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The token currently held in memory, valid or not
    pub fn token(&self) -> Option<&Token> {
        self.state.get()
    }

    /// Forget the in-memory token; the next call re-checks the cache
    pub fn invalidate_token(&mut self) {
        self.state.clear();
    }

    // ==================== Verbs ====================

    /// Fetch an account, container listing or object
    #[instrument(skip(self, params, headers))]
    pub async fn get(
        &mut self,
        path: &str,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        self.dispatch(Method::Get, path, params, None, headers).await
    }

    /// Fetch metadata without a body
    #[instrument(skip(self, params, headers))]
    pub async fn head(
        &mut self,
        path: &str,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        self.dispatch(Method::Head, path, params, None, headers).await
    }

    /// Create or replace a container or object
    #[instrument(skip(self, body, params, headers))]
    pub async fn put(
        &mut self,
        path: &str,
        body: impl Into<reqwest::Body>,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        self.dispatch(Method::Put, path, params, Some(body.into()), headers)
            .await
    }

    /// Delete a container or object
    #[instrument(skip(self, params, headers))]
    pub async fn delete(
        &mut self,
        path: &str,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        self.dispatch(Method::Delete, path, params, None, headers).await
    }

    /// Update container or object metadata
    #[instrument(skip(self, body, params, headers))]
    pub async fn post(
        &mut self,
        path: &str,
        body: impl Into<reqwest::Body>,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        self.dispatch(Method::Post, path, params, Some(body.into()), headers)
            .await
    }

    /// Upload content as a chunked PUT with a sniffed content type.
    ///
    /// `params` are sent in the query string. The source is read before any
    /// network activity, so an unreadable source fails without contacting
    /// the identity or storage service.
    #[instrument(skip(self, source, params, headers))]
    pub async fn upload(
        &mut self,
        path: &str,
        source: impl Into<UploadSource>,
        params: Option<&Params>,
        headers: &Headers,
    ) -> Result<Response> {
        let prepared = upload::prepare(source.into()).await?;

        let mut request_headers = headers::build_headers(&self.config, headers)?;
        upload::apply_upload_headers(&mut request_headers, &prepared.content_type)?;
        self.send(
            Method::Put,
            &request_path(path, params),
            Some(prepared.into_body()),
            request_headers,
        )
        .await
    }

    // ==================== Pipeline ====================

    /// Send an authenticated request to `{endpoint}{path}?{params}`
    #[instrument(skip(self, params, body, headers))]
    pub async fn dispatch(
        &mut self,
        method: Method,
        path: &str,
        params: Option<&Params>,
        body: Option<reqwest::Body>,
        headers: &Headers,
    ) -> Result<Response> {
        let request_headers = headers::build_headers(&self.config, headers)?;
        self.send(method, &request_path(path, params), body, request_headers)
            .await
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        body: Option<reqwest::Body>,
        mut request_headers: reqwest::header::HeaderMap,
    ) -> Result<Response> {
        let token_id = self.ensure_token().await?;
        headers::apply_auth_token(&mut request_headers, &token_id)?;

        let url = self.config.url_for(path);
        let mut req = self
            .http
            .request(method.into(), &url)
            .headers(request_headers);
        if let Some(body) = body {
            req = req.body(body);
        }

        debug!("Sending {} request to {}", method, url);
        let response = req.send().await?;
        debug!(status = %response.status(), "Received response");
        Ok(Response::new(response))
    }

    /// Return the id of a valid token, authenticating only when neither
    /// memory nor the cache holds one
    async fn ensure_token(&mut self) -> Result<String> {
        let now = Utc::now();
        if let Some(token) = self.state.valid_at(now) {
            return Ok(token.id.clone());
        }

        let tenant_id = &self.config.credentials.tenant_id;
        let username = &self.config.credentials.username;

        match self.cache.load(tenant_id, username) {
            Some(cached) if cached.is_valid_at(now) => {
                debug!(expires = %cached.expires, "Using cached token");
                return Ok(self.state.replace(cached).to_string());
            }
            Some(cached) => debug!(expires = %cached.expires, "Cached token expired"),
            None => debug!("No cached token"),
        }

        let token = self.authenticator.authenticate().await?;
        info!(expires = %token.expires, "Obtained new token");

        if let Err(e) = self.cache.save(tenant_id, username, &token) {
            warn!(
                dir = %self.cache.dir().display(),
                "Failed to cache token: {}", e
            );
        }

        Ok(self.state.replace(token).to_string())
    }
}

fn request_path(path: &str, params: Option<&Params>) -> String {
    match params {
        Some(params) => with_query(path, params),
        None => path.to_string(),
    }
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient")
            .field("config", &self.config)
            .field("token_cache", &self.cache.dir())
            .finish_non_exhaustive()
    }
}

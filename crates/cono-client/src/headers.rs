//! Header policy for storage requests

use std::collections::HashMap;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};

use crate::{ClientError, Config, Result};

/// Caller-supplied headers
pub type Headers = HashMap<String, String>;

pub const X_AUTH_TOKEN: &str = "x-auth-token";
pub const X_WEB_MODE: &str = "x-web-mode";
pub const X_CONTAINER_READ: &str = "x-container-read";
pub const X_DETECT_CONTENT_TYPE: &str = "x-detect-content-type";

/// Default headers for `config` with `caller` merged over them.
///
/// Header names are case-insensitive, so a caller's `content-type` replaces
/// the default `Content-Type`.
pub fn build_headers(config: &Config, caller: &Headers) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, header_value(&config.user_agent)?);
    if config.web_mode {
        headers.insert(X_WEB_MODE, HeaderValue::from_static("True"));
        headers.insert(X_CONTAINER_READ, HeaderValue::from_static(".r:*"));
    }
    merge(&mut headers, caller)?;
    Ok(headers)
}

/// Overwrite entries in `headers` with `extra`
pub fn merge(headers: &mut HeaderMap, extra: &Headers) -> Result<()> {
    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ClientError::InvalidHeader(name.clone()))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(())
}

/// Force the token header; always applied after every other merge
pub fn apply_auth_token(headers: &mut HeaderMap, token_id: &str) -> Result<()> {
    let mut value = header_value(token_id)?;
    value.set_sensitive(true);
    headers.insert(X_AUTH_TOKEN, value);
    Ok(())
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| ClientError::InvalidHeader(value.to_string()))
}

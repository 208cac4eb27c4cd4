//! # cono-client
//!
//! Client for token-authenticated, Swift-style object storage.
//!
//! ## Features
//!
//! - **Transparent authentication**: tokens are obtained with tenant
//!   credentials and refreshed before they expire; no request is ever sent
//!   with an expired token
//! - **Shared token cache**: tokens are cached on disk per tenant and user so
//!   separate processes reuse them
//! - **Web mode**: optionally marks created containers and objects as
//!   world-readable
//! - **Streaming uploads**: chunked uploads with the content type detected
//!   from the file's magic bytes
//!
//! ## Example
//!
//! ```rust,ignore
//! use cono_client::{Config, Credentials, Headers, Params, StorageClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let credentials = Credentials::new(
//!         "https://identity.tyo1.conoha.io/v2.0",
//!         "tenant-id",
//!         "api-user",
//!         "password",
//!     );
//!     let config = Config::new(credentials, "https://object-storage.tyo1.conoha.io/v1/nc_tenant-id")
//!         .with_web_mode(true);
//!     let mut client = StorageClient::new(config)?;
//!
//!     // Create a container
//!     client.put("/photos", "", None, &Headers::new()).await?;
//!
//!     // Upload a file; the content type is sniffed from its contents
//!     client.upload("/photos/cat", std::path::Path::new("cat.jpg"), None, &Headers::new()).await?;
//!
//!     let response = client.get("/photos/cat", None, &Headers::new()).await?;
//!     println!("{} {:?}", response.status(), response.header("content-type"));
//!
//!     // List the container as JSON
//!     let params = Params::from([("format".to_string(), "json".to_string())]);
//!     let listing: serde_json::Value = client
//!         .get("/photos", Some(&params), &Headers::new())
//!         .await?
//!         .json()
//!         .await?;
//!     println!("{}", listing);
//!
//!     Ok(())
//! }
//! ```

mod auth;
mod client;
mod config;
mod error;
mod headers;
mod response;
mod token;
mod token_cache;
mod upload;

pub use auth::Authenticator;
pub use client::{Method, StorageClient};
pub use config::{with_query, Config, Credentials, Params};
pub use error::{AuthError, ClientError, Result};
pub use headers::{
    apply_auth_token, build_headers, Headers, X_AUTH_TOKEN, X_CONTAINER_READ,
    X_DETECT_CONTENT_TYPE, X_WEB_MODE,
};
pub use response::Response;
pub use token::{is_valid, Token, TokenState};
pub use token_cache::TokenCache;
pub use upload::{sniff_content_type, UploadReader, UploadSource};

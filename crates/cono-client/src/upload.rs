//! Streaming uploads with magic-byte content type detection

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE, TRANSFER_ENCODING};
use tokio::io::{AsyncRead, AsyncReadExt, Chain};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::headers::X_DETECT_CONTENT_TYPE;
use crate::{ClientError, Result};

/// Number of leading bytes inspected when sniffing
pub const SNIFF_LEN: u64 = 8192;

/// Fallback when the content matches no known signature
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Boxed reader accepted as an upload source
pub type UploadReader = Box<dyn AsyncRead + Send + Sync + Unpin>;

/// Where upload content comes from
pub enum UploadSource {
    /// A file opened by the client for the duration of the upload
    Path(PathBuf),
    /// An already open byte stream
    Stream(UploadReader),
}

impl UploadSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn stream<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Sync + Unpin + 'static,
    {
        Self::Stream(Box::new(reader))
    }

    /// Open the source as a reader
    async fn open(self) -> Result<UploadReader> {
        match self {
            Self::Path(path) => {
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(ClientError::Sniff)?;
                debug!(path = %path.display(), "Opened upload source");
                Ok(Box::new(file))
            }
            Self::Stream(reader) => Ok(reader),
        }
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&std::path::Path> for UploadSource {
    fn from(path: &std::path::Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

/// Upload content with its detected type, ready to be streamed
pub struct PreparedUpload {
    pub content_type: String,
    reader: Chain<Cursor<Vec<u8>>, UploadReader>,
}

impl PreparedUpload {
    /// Turn the content into a chunked request body
    pub fn into_body(self) -> reqwest::Body {
        reqwest::Body::wrap_stream(ReaderStream::new(self.reader))
    }
}

impl fmt::Debug for PreparedUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedUpload")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Guess a MIME type from the leading bytes of some content
pub fn sniff_content_type(prefix: &[u8]) -> &'static str {
    if let Some(kind) = infer::get(prefix) {
        return kind.mime_type();
    }
    if !prefix.is_empty() && looks_like_text(prefix) {
        return "text/plain";
    }
    OCTET_STREAM
}

// The prefix may end in the middle of a multi-byte character.
fn looks_like_text(prefix: &[u8]) -> bool {
    match std::str::from_utf8(prefix) {
        Ok(text) => !text.contains('\0'),
        Err(e) => e.error_len().is_none() && !prefix[..e.valid_up_to()].contains(&0),
    }
}

/// Open `source`, sniff its type and wrap it as a streaming body.
///
/// The sniffed prefix is replayed ahead of the rest of the reader, so the
/// body carries every byte of the source.
pub async fn prepare(source: UploadSource) -> Result<PreparedUpload> {
    let mut reader = source.open().await?;

    let mut prefix = Vec::with_capacity(SNIFF_LEN as usize);
    (&mut reader)
        .take(SNIFF_LEN)
        .read_to_end(&mut prefix)
        .await
        .map_err(ClientError::Sniff)?;

    let content_type = sniff_content_type(&prefix).to_string();
    debug!(content_type = %content_type, sniffed = prefix.len(), "Sniffed upload content type");

    Ok(PreparedUpload {
        content_type,
        reader: Cursor::new(prefix).chain(reader),
    })
}

/// Force the upload headers onto `headers`
pub fn apply_upload_headers(headers: &mut HeaderMap, content_type: &str) -> Result<()> {
    let content_type = HeaderValue::from_str(content_type)
        .map_err(|_| ClientError::InvalidHeader(content_type.to_string()))?;
    headers.insert(CONTENT_TYPE, content_type);
    headers.insert(X_DETECT_CONTENT_TYPE, HeaderValue::from_static("True"));
    headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
    headers.remove(CONTENT_LENGTH);
    Ok(())
}

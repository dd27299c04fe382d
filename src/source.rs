use reqwest::{Client, Url};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::video::PageResult;

/// Path of the listing endpoint, relative to the API base URL.
const VIDEOS_PATH: &str = "api/v1/videos";

/// Why a page request failed. Every variant renders a message fit for the status line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
  #[error("Could not reach the video API: {0}")]
  Transport(String),
  #[error("Video API responded with HTTP {0}")]
  Status(u16),
  #[error("Video API returned a malformed page: {0}")]
  Decode(String),
}

/// A paginated listing of videos.
///
/// `cursor` is `None` for the first page, otherwise a token previously returned in
/// [`PageResult::next_cursor`]. Implementations do not retry.
pub trait VideoSource: Send + Sync {
  fn fetch_page(&self, cursor: Option<&str>) -> impl Future<Output = Result<PageResult, FetchError>> + Send;
}

/// [`VideoSource`] backed by the HTTP listing API (`GET /api/v1/videos?limit=N&cursor=C`).
#[derive(Debug, Clone)]
pub struct HttpVideoSource {
  client: Client,
  endpoint: Url,
  limit: usize,
}

impl HttpVideoSource {
  pub fn new(base_url: &str, limit: usize, timeout: Duration) -> anyhow::Result<Self> {
    let client = Client::builder().timeout(timeout).build()?;
    Self::with_client(base_url, limit, client)
  }

  pub fn with_client(base_url: &str, limit: usize, client: Client) -> anyhow::Result<Self> {
    // Url::join drops the last path segment unless the base ends with '/'.
    let base = if base_url.ends_with('/') { base_url.to_string() } else { format!("{}/", base_url) };
    let endpoint = Url::parse(&base)?.join(VIDEOS_PATH)?;
    Ok(Self { client, endpoint, limit: limit.max(1) })
  }

  fn page_url(&self, cursor: Option<&str>) -> Url {
    let mut url = self.endpoint.clone();
    {
      let mut query = url.query_pairs_mut();
      query.append_pair("limit", &self.limit.to_string());
      if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        query.append_pair("cursor", cursor);
      }
    }
    url
  }
}

impl VideoSource for HttpVideoSource {
  async fn fetch_page(&self, cursor: Option<&str>) -> Result<PageResult, FetchError> {
    let url = self.page_url(cursor);
    debug!(url = %url, "source: requesting page");

    let response = self.client.get(url).send().await.map_err(|e| {
      warn!(err = %e, "source: request failed");
      FetchError::Transport(e.to_string())
    })?;

    let status = response.status();
    if !status.is_success() {
      warn!(status = status.as_u16(), "source: non-success response");
      return Err(FetchError::Status(status.as_u16()));
    }

    let body = response.bytes().await.map_err(|e| FetchError::Transport(e.to_string()))?;
    let page: PageResult = serde_json::from_slice(&body).map_err(|e| {
      warn!(err = %e, "source: could not decode page");
      FetchError::Decode(e.to_string())
    })?;
    debug!(count = page.videos.len(), has_more = page.has_more, "source: page received");
    Ok(page)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;
  use tokio::task::JoinHandle;

  /// Serve exactly one HTTP response and hand back the raw request that was received.
  async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
      "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
      status_line,
      body.len(),
      body
    );
    let handle = tokio::spawn(async move {
      let (mut socket, _) = listener.accept().await.unwrap();
      let mut buf = vec![0u8; 8192];
      let n = socket.read(&mut buf).await.unwrap();
      socket.write_all(response.as_bytes()).await.unwrap();
      let _ = socket.shutdown().await;
      String::from_utf8_lossy(&buf[..n]).to_string()
    });
    (format!("http://{}", addr), handle)
  }

  fn source(base: &str) -> HttpVideoSource {
    let client = Client::builder().no_proxy().timeout(Duration::from_secs(5)).build().unwrap();
    HttpVideoSource::with_client(base, 12, client).unwrap()
  }

  #[test]
  fn page_url_omits_absent_cursor() {
    let src = source("http://localhost:8080");
    assert_eq!(src.page_url(None).as_str(), "http://localhost:8080/api/v1/videos?limit=12");
    assert_eq!(src.page_url(Some("")).as_str(), "http://localhost:8080/api/v1/videos?limit=12");
  }

  #[test]
  fn page_url_encodes_cursor() {
    let src = source("http://localhost:8080/");
    assert_eq!(src.page_url(Some("a b&c")).as_str(), "http://localhost:8080/api/v1/videos?limit=12&cursor=a+b%26c");
  }

  #[test]
  fn page_url_keeps_base_path() {
    let src = source("http://example.com/proxy");
    assert_eq!(src.page_url(None).as_str(), "http://example.com/proxy/api/v1/videos?limit=12");
  }

  #[tokio::test]
  async fn fetch_page_decodes_success() {
    let body = r#"{"videos":[{"id":"v1","title":"Go Tutorial","description":"d","thumbnail_url":"t","published_at":"2024-03-01T00:00:00Z","channel_title":"Acme"}],"next_cursor":"n1","has_more":true}"#;
    let (base, server) = serve_once("200 OK", body).await;
    let page = source(&base).fetch_page(Some("c0")).await.unwrap();
    assert_eq!(page.videos.len(), 1);
    assert_eq!(page.videos[0].id, "v1");
    assert_eq!(page.next_cursor.as_deref(), Some("n1"));

    let request = server.await.unwrap();
    let request_line = request.lines().next().unwrap_or_default();
    assert_eq!(request_line, "GET /api/v1/videos?limit=12&cursor=c0 HTTP/1.1");
  }

  #[tokio::test]
  async fn fetch_page_maps_error_status() {
    let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"Failed to fetch videos"}"#).await;
    let err = source(&base).fetch_page(None).await.unwrap_err();
    assert_eq!(err, FetchError::Status(500));
    assert!(err.to_string().contains("500"));
    server.await.unwrap();
  }

  #[tokio::test]
  async fn fetch_page_maps_malformed_body() {
    let (base, server) = serve_once("200 OK", "not json").await;
    let err = source(&base).fetch_page(None).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
    server.await.unwrap();
  }

  #[tokio::test]
  async fn fetch_page_maps_connection_failure() {
    // Bind then drop to get a port nobody is listening on.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = source(&format!("http://{}", addr)).fetch_page(None).await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
  }
}

//! Document fetching over HTTP.
//!
//! The pipeline never talks to `reqwest` directly. It goes through the
//! [`DocumentFetcher`] trait so that:
//! - the HTTP client is constructed once from an explicit [`ClientConfig`]
//!   and passed to whoever needs it
//! - tests can swap in a fetcher that serves canned markup
//!
//! Every fetch carries its own timeout: listing pages get a generous one,
//! detail pages fetched during enrichment a shorter one. A fetch future can
//! be dropped at any point; `reqwest` releases the connection when it is.

use crate::error::FetchError;
use reqwest::{Client, redirect};
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

/// Browser identity sent with every request; several sites reject the default
/// client identity outright.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Trait for fetching raw documents.
///
/// Implementors return the response body of a single GET, or a classified
/// [`FetchError`]. No retries: a failed fetch is reported once and the caller
/// decides what to skip.
pub trait DocumentFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Client identity and redirect policy for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub user_agent: String,
    /// Redirect hops followed before giving up.
    pub max_redirects: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 10,
        }
    }
}

/// [`DocumentFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()?;
        Ok(Self { client })
    }
}

impl DocumentFetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(timeout_ms = timeout.as_millis() as u64))]
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, FetchError> {
        let t0 = Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Non-success status");
            return Err(FetchError::StatusNotOk {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched document"
        );
        Ok(body.to_vec())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::StubFetcher;
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// Minimal HTTP/1.1 server on a random local port. Records the
    /// `User-Agent` of every request it reads.
    ///
    /// - `/moved` redirects to `/landing`
    /// - `/landing` answers 200 with a small page
    /// - `/hop/{n}` redirects to `/hop/{n+1}`, forever
    /// - `/unavailable` answers 503
    /// - `/stall` never answers
    async fn serve() -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let agents = Arc::new(Mutex::new(Vec::new()));

        let seen = Arc::clone(&agents);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(answer(stream, Arc::clone(&seen)));
            }
        });
        (base, agents)
    }

    async fn answer(mut stream: TcpStream, agents: Arc<Mutex<Vec<String>>>) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        let request = String::from_utf8_lossy(&buf).to_string();
        let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();
        if let Some(agent) = request
            .lines()
            .find_map(|l| l.strip_prefix("user-agent: ").or_else(|| l.strip_prefix("User-Agent: ")))
        {
            agents.lock().unwrap().push(agent.trim().to_string());
        }

        if let Some(n) = path.strip_prefix("/hop/").and_then(|n| n.parse::<u32>().ok()) {
            let _ = stream
                .write_all(redirect_to(&format!("/hop/{}", n + 1)).as_bytes())
                .await;
            return;
        }

        let response = match path.as_str() {
            "/moved" => redirect_to("/landing"),
            "/landing" => {
                let body = "<html><body>landed</body></html>";
                format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: text/html\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                )
            }
            "/unavailable" => {
                "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                    .to_string()
            }
            "/stall" => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                return;
            }
            _ => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                .to_string(),
        };
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }

    fn redirect_to(location: &str) -> String {
        format!(
            "HTTP/1.1 302 Found\r\nlocation: {location}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
        )
    }

    fn http_fetcher(max_redirects: usize) -> HttpFetcher {
        HttpFetcher::new(&ClientConfig {
            user_agent: "top-news-test/1.0".to_string(),
            max_redirects,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_http_fetch_follows_redirects_and_sends_user_agent() {
        let (base, agents) = serve().await;
        let fetcher = http_fetcher(10);

        let body = fetcher
            .fetch(&format!("{base}/moved"), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(body, b"<html><body>landed</body></html>");

        let agents = agents.lock().unwrap().clone();
        assert_eq!(agents.len(), 2);
        assert!(agents.iter().all(|a| a == "top-news-test/1.0"));
    }

    #[tokio::test]
    async fn test_http_fetch_non_success_status() {
        let (base, _) = serve().await;
        let url = format!("{base}/unavailable");

        let err = http_fetcher(10)
            .fetch(&url, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            FetchError::StatusNotOk { url: failed, status } => {
                assert_eq!(status, 503);
                assert_eq!(failed, url);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_http_fetch_times_out() {
        let (base, _) = serve().await;

        let t0 = Instant::now();
        let err = http_fetcher(10)
            .fetch(&format!("{base}/stall"), Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout { .. }), "{err}");
        assert!(t0.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_http_fetch_gives_up_after_redirect_limit() {
        let (base, agents) = serve().await;

        let err = http_fetcher(2)
            .fetch(&format!("{base}/hop/0"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }), "{err}");
        // The first request plus at most two followed hops.
        assert!(agents.lock().unwrap().len() <= 3);
    }

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::default();
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
        assert_eq!(config.max_redirects, 10);
        assert!(HttpFetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_stub_fetcher_classifies_failures() {
        let fetcher = StubFetcher::new()
            .page("https://example.com/", "<html></html>")
            .fail("https://down.example.com/");

        let ok = fetcher
            .fetch("https://example.com/", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(ok, b"<html></html>");

        let err = fetcher
            .fetch("https://down.example.com/", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));

        let err = fetcher
            .fetch("https://example.com/missing", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::StatusNotOk { status: 404, .. }));
        assert_eq!(fetcher.requests().len(), 3);
    }
}

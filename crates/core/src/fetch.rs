use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONNECTION};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::warn;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          Chrome/91.0.4472.124 Safari/537.36";

const RETRY_STATUSES: &[StatusCode] = &[
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

const MAX_RETRIES: u32 = 3;
const BACKOFF_FACTOR_MS: u64 = 500;

/// HTTP session for the scraping pipeline: browser-like headers, bounded
/// retries with exponential backoff on transient statuses. A failed fetch
/// is "page unavailable", never fatal to the surrounding search.
pub struct HtmlFetcher {
    client: reqwest::Client,
}

impl HtmlFetcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    /// Fetch a page body. Retries on {429, 500, 502, 503, 504} with
    /// exponential backoff (500 ms, 1 s, 2 s); returns None once the
    /// retry budget is spent or on any other failure.
    pub async fn fetch_text(&self, url: &str, params: &[(&str, String)]) -> Option<String> {
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let backoff = Duration::from_millis(BACKOFF_FACTOR_MS << (attempt - 1));
                tokio::time::sleep(backoff).await;
            }

            let request = self.client.get(url).query(params);
            let response = match request.send().await {
                Ok(response) => response,
                Err(error) => {
                    warn!(url, attempt, %error, "request failed");
                    return None;
                }
            };

            let status = response.status();
            if RETRY_STATUSES.contains(&status) {
                warn!(url, attempt, %status, "transient status, retrying");
                continue;
            }

            if !status.is_success() {
                warn!(url, %status, "request rejected");
                return None;
            }

            match response.text().await {
                Ok(body) => return Some(body),
                Err(error) => {
                    warn!(url, %error, "failed to read body");
                    return None;
                }
            }
        }

        warn!(url, "retry budget exhausted");
        None
    }
}

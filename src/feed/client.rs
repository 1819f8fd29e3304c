use super::model::{ApiErrorBody, Post};
use super::state::FetchRequest;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Public Qiita host; overridable from config for mirrors and tests.
pub const DEFAULT_BASE_URL: &str = "https://qiita.com";

const MAX_RESPONSE_SIZE: usize = 10 * 1024 * 1024; // 10MB
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Errors from a single page fetch.
///
/// `Display` is what the feed shows to the user, so `Api` renders the
/// upstream message verbatim.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-2xx response carrying a `message` body
    #[error("{message}")]
    Api { status: u16, message: String },
    /// Non-2xx response without a readable message
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// DNS, connection, TLS or body read failure
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Response too large")]
    ResponseTooLarge,
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// Tag that cannot be expressed as a single path segment
    #[error("Invalid tag: '{0}'")]
    InvalidTag(String),
}

/// True if `tag` can be sent as one path segment of the items URL.
///
/// Empty tags and dot-only tags (`.`, `..`) would be dropped or resolved
/// away by URL path normalization.
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.chars().all(|c| c == '.')
}

/// HTTP client for the tag items endpoint.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl FeedClient {
    pub fn new(http: reqwest::Client, base_url: &str) -> Result<Self, FetchError> {
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build `{base}/api/v2/tags/{tag}/items?page=..&per_page=..`.
    ///
    /// The tag is pushed as a single path segment so names like `.NET` or
    /// `C#` are percent-encoded instead of changing the path. Tags rejected
    /// by [`is_valid_tag`] return `FetchError::InvalidTag`.
    pub fn page_url(&self, tag: &str, page: u32, per_page: u32) -> Result<Url, FetchError> {
        if !is_valid_tag(tag) {
            return Err(FetchError::InvalidTag(tag.to_string()));
        }
        let mut url = self.base_url.clone();
        // Base URLs are http(s), which can always be a base.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "v2", "tags", tag, "items"]);
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &per_page.to_string());
        Ok(url)
    }

    /// Fetch one page of posts for `request`.
    pub async fn fetch_page(&self, request: &FetchRequest) -> Result<Vec<Post>, FetchError> {
        let url = self.page_url(&request.tag, request.page, request.per_page)?;
        tracing::debug!(
            url = %url,
            generation = request.generation,
            "Fetching tag page"
        );

        let response = tokio::time::timeout(self.timeout, self.http.get(url).send())
            .await
            .map_err(|_| FetchError::Timeout(self.timeout))?
            .map_err(FetchError::Network)?;

        let status = response.status();
        let bytes = tokio::time::timeout(
            self.timeout,
            read_limited_bytes(response, MAX_RESPONSE_SIZE),
        )
        .await
        .map_err(|_| FetchError::Timeout(self.timeout))??;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ApiErrorBody>(&bytes) {
                Ok(body) => FetchError::Api {
                    status: status.as_u16(),
                    message: body.message,
                },
                Err(_) => FetchError::HttpStatus(status.as_u16()),
            });
        }

        let posts: Vec<Post> = serde_json::from_slice(&bytes)?;
        tracing::debug!(
            tag = %request.tag,
            page = request.page,
            count = posts.len(),
            "Fetched tag page"
        );
        Ok(posts)
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(tag: &str, page: u32, per_page: u32) -> FetchRequest {
        FetchRequest {
            generation: 1,
            tag: tag.to_string(),
            page,
            per_page,
        }
    }

    fn post_json(id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": format!("Title {}", id),
            "url": format!("https://qiita.com/u/items/{}", id),
            "created_at": "2024-05-01T12:00:00+09:00",
            "likes_count": 3,
            "tags": [{"name": "React", "versions": []}],
            "user": {"id": "u", "profile_image_url": "https://example.com/a.png", "items_count": 10}
        })
    }

    #[test]
    fn test_page_url_shape() {
        let client = FeedClient::new(reqwest::Client::new(), DEFAULT_BASE_URL).unwrap();
        let url = client.page_url("React", 2, 20).unwrap();
        assert_eq!(
            url.as_str(),
            "https://qiita.com/api/v2/tags/React/items?page=2&per_page=20"
        );
    }

    #[test]
    fn test_page_url_encodes_tag_segment() {
        let client = FeedClient::new(reqwest::Client::new(), DEFAULT_BASE_URL).unwrap();
        let url = client.page_url("C#", 1, 20).unwrap();
        assert_eq!(
            url.as_str(),
            "https://qiita.com/api/v2/tags/C%23/items?page=1&per_page=20"
        );
        let url = client.page_url(".NET", 1, 20).unwrap();
        assert!(url.path().ends_with("/tags/.NET/items"));
    }

    #[test]
    fn test_page_url_rejects_dot_segments() {
        let client = FeedClient::new(reqwest::Client::new(), DEFAULT_BASE_URL).unwrap();
        for tag in ["", ".", "..", "..."] {
            assert!(
                matches!(client.page_url(tag, 1, 20), Err(FetchError::InvalidTag(_))),
                "tag {:?} should be rejected",
                tag
            );
        }
        assert!(is_valid_tag(".NET"));
        assert!(is_valid_tag("Next.js"));
    }

    #[tokio::test]
    async fn test_fetch_page_dot_tag_never_hits_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let err = client.fetch_page(&request("..", 1, 20)).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid tag: '..'");
    }

    #[test]
    fn test_page_url_keeps_base_path() {
        let client = FeedClient::new(reqwest::Client::new(), "https://mirror.example.com/qiita/")
            .unwrap();
        let url = client.page_url("Vim", 1, 5).unwrap();
        assert_eq!(url.path(), "/qiita/api/v2/tags/Vim/items");
    }

    #[tokio::test]
    async fn test_fetch_page_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/tags/React/items"))
            .and(query_param("page", "1"))
            .and(query_param("per_page", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!([post_json("a"), post_json("b")])),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let posts = client.fetch_page(&request("React", 1, 2)).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "a");
        assert_eq!(posts[1].user.items_count, 10);
    }

    #[tokio::test]
    async fn test_fetch_page_surfaces_upstream_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(
                serde_json::json!({"message": "rate limited", "type": "rate_limit_exceeded"}),
            ))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let err = client
            .fetch_page(&request("React", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Api { status: 403, .. }));
        assert_eq!(err.to_string(), "rate limited");
    }

    #[tokio::test]
    async fn test_fetch_page_status_without_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let err = client
            .fetch_page(&request("React", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::HttpStatus(502)));
    }

    #[tokio::test]
    async fn test_fetch_page_malformed_json() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let err = client
            .fetch_page(&request("React", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_fetch_page_empty_beyond_last_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri()).unwrap();
        let posts = client
            .fetch_page(&request("React", 9999, 20))
            .await
            .unwrap();
        assert!(posts.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_page_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("[]")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&mock_server)
            .await;

        let client = FeedClient::new(reqwest::Client::new(), &mock_server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(50));
        let err = client
            .fetch_page(&request("React", 1, 20))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }
}

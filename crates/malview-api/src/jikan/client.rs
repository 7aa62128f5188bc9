//! `JikanClient` - Jikan API client implementation.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalJikanApi;
use super::error::FetchError;
use super::rate_limiter::JikanRateLimiter;
use super::types::{AnimeRecord, ListPage};
use super::wire::{AnimeListResponse, AnimeResponse};

/// Default base URL for Jikan API v4.
pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4/";

/// Jikan API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct JikanClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for API requests (must end with `/`).
    base_url: Url,
    /// Rate limiter shared by every request of this client.
    rate_limiter: Arc<Mutex<JikanRateLimiter>>,
}

/// Builder for `JikanClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct JikanClientBuilder {
    base_url: Option<Url>,
    user_agent: Option<String>,
    min_interval: Option<Duration>,
}

impl JikanClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            base_url: None,
            user_agent: None,
            min_interval: None,
        }
    }

    /// Overrides the base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Sets the minimum request interval (default: 1s).
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = Some(interval);
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> Result<JikanClient> {
        let user_agent = self.user_agent.context("user_agent is required")?;

        let base_url = if let Some(url) = self.base_url {
            url
        } else {
            let result = Url::parse(DEFAULT_BASE_URL);
            result.context("invalid default base URL")?
        };

        let rate_limiter = self
            .min_interval
            .map_or_else(JikanRateLimiter::default, JikanRateLimiter::new);

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(JikanClient {
            http_client,
            base_url,
            rate_limiter: Arc::new(Mutex::new(rate_limiter)),
        })
    }
}

impl JikanClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> JikanClientBuilder {
        JikanClientBuilder::new()
    }

    /// Appends `segments` to the base URL, percent-encoding each one.
    ///
    /// A segment never introduces `/`, `?` or `#` into the request.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::Url {
                base: self.base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends a rate-limited GET request and decodes the JSON body.
    ///
    /// `page` is only used to label errors.
    #[instrument(skip_all, fields(page = page))]
    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
        page: u32,
    ) -> Result<T, FetchError> {
        let url = self.endpoint(segments)?;

        self.rate_limiter.lock().await.wait().await;

        tracing::debug!(url = %url, "Jikan API request");

        let response = self
            .http_client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<failed to read body>"));
            return Err(FetchError::Http {
                page,
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { page, source })?;
        serde_json::from_str(&body).map_err(|source| FetchError::Decode { page, source })
    }
}

impl LocalJikanApi for JikanClient {
    #[instrument(skip_all, fields(username = username, page = page))]
    async fn user_anime_list_page(&self, username: &str, page: u32) -> Result<ListPage, FetchError> {
        let query = [("page", page.to_string())];
        let response: AnimeListResponse = self
            .get_json(&["users", username, "animelist"], &query, page)
            .await?;
        Ok(response.into_page(page))
    }

    #[instrument(skip_all, fields(mal_id = mal_id))]
    async fn anime_by_id(&self, mal_id: u64) -> Result<AnimeRecord, FetchError> {
        let id = mal_id.to_string();
        let response: AnimeResponse = self.get_json(&["anime", &id], &[], 0).await?;
        let mut record = response.data;
        record.dedup_genres();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use super::*;
    use crate::jikan::{MediaType, WatchStatus};

    fn build_test_client(server: &wiremock::MockServer, interval: Duration) -> JikanClient {
        let base_url = format!("{}/v4/", server.uri());
        JikanClient::builder()
            .base_url(base_url.parse().unwrap())
            .user_agent("test/0.0.0")
            .min_interval(interval)
            .build()
            .unwrap()
    }

    #[test]
    fn test_builder_requires_user_agent() {
        // Arrange & Act
        let result = JikanClient::builder().build();

        // Assert
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("user_agent is required")
        );
    }

    #[test]
    fn test_builder_with_required_fields_succeeds() {
        // Arrange & Act
        let client = JikanClient::builder()
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url.as_str(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_builder_with_custom_base_url() {
        // Arrange
        let custom_url = Url::parse("http://localhost:8080/v4/").unwrap();

        // Act
        let client = JikanClient::builder()
            .base_url(custom_url.clone())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Assert
        assert_eq!(client.base_url, custom_url);
    }

    #[tokio::test]
    async fn test_user_anime_list_page_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/jikan/animelist_page_1.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/v4/users/KaizerAE/animelist"))
            .and(wiremock::matchers::query_param("page", "1"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let page = client.user_anime_list_page("KaizerAE", 1).await.unwrap();

        // Assert
        assert!(page.has_next_page);
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[0].anime.title, "Cowboy Bebop");
        assert_eq!(page.entries[0].status(), Some(WatchStatus::Completed));
    }

    #[tokio::test]
    async fn test_anime_by_id_via_http() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/jikan/anime_5114.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/v4/anime/5114"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let record = client.anime_by_id(5114).await.unwrap();

        // Assert
        assert_eq!(record.mal_id, 5114);
        assert_eq!(record.media_type, MediaType::Tv);
        assert_eq!(record.episodes, Some(64));
        assert_eq!(record.genres.len(), 4);
    }

    #[tokio::test]
    async fn test_http_error_returns_fetch_error_with_page() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404).set_body_string(
                r#"{"status":404,"type":"BadResponseException","message":"Resource does not exist"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let err = client
            .user_anime_list_page("nobody", 2)
            .await
            .unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Http { page: 2, status: 404, .. }));
        assert!(err.to_string().contains("Resource does not exist"));
    }

    #[tokio::test]
    async fn test_http_429_is_not_retried() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(429))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let err = client.user_anime_list_page("KaizerAE", 1).await.unwrap_err();

        // Assert
        assert_eq!(err.status(), Some(429));
    }

    #[tokio::test]
    async fn test_malformed_body_returns_decode_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let err = client.user_anime_list_page("KaizerAE", 4).await.unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Decode { page: 4, .. }));
    }

    #[tokio::test]
    async fn test_envelope_without_data_returns_decode_error() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"{"status":200,"message":"user list is private"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let err = client.user_anime_list_page("KaizerAE", 1).await.unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Decode { page: 1, .. }));
    }

    #[tokio::test]
    async fn test_username_is_sent_as_a_single_path_segment() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/jikan/animelist_page_2.json");

        for encoded in ["a%3Fb", "a%23b", "..%2Fanime%2F1"] {
            wiremock::Mock::given(wiremock::matchers::method("GET"))
                .and(wiremock::matchers::path(format!(
                    "/v4/users/{encoded}/animelist"
                )))
                .and(wiremock::matchers::query_param("page", "1"))
                .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let client = build_test_client(&mock_server, Duration::from_millis(0));

        // Act
        let results = [
            client.user_anime_list_page("a?b", 1).await,
            client.user_anime_list_page("a#b", 1).await,
            client.user_anime_list_page("../anime/1", 1).await,
        ];

        // Assert
        for result in results {
            assert_eq!(result.unwrap().entries.len(), 1);
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        // Arrange
        let client = JikanClient::builder()
            .base_url(Url::parse("http://localhost:8080/v4/").unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let url = client.endpoint(&["anime", "5114"]).unwrap();

        // Assert
        assert_eq!(url.as_str(), "http://localhost:8080/v4/anime/5114");
    }

    #[test]
    fn test_endpoint_rejects_opaque_base_url() {
        // Arrange
        let client = JikanClient::builder()
            .base_url(Url::parse("mailto:someone@example.com").unwrap())
            .user_agent("test/0.0.0")
            .build()
            .unwrap();

        // Act
        let err = client.endpoint(&["anime", "1"]).unwrap_err();

        // Assert
        assert!(matches!(err, FetchError::Url { .. }));
    }

    #[tokio::test]
    async fn test_rate_limiter_enforces_interval() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        let json_body = include_str!("../../../../fixtures/jikan/animelist_page_2.json");

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(json_body))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = build_test_client(&mock_server, Duration::from_millis(100));

        // Act
        let start = std::time::Instant::now();
        client.user_anime_list_page("KaizerAE", 1).await.unwrap();
        client.user_anime_list_page("KaizerAE", 2).await.unwrap();
        let elapsed = start.elapsed();

        // Assert: at least 100ms interval between two requests
        assert!(elapsed >= Duration::from_millis(100));
    }
}

//! Song metadata resolution
//!
//! The lifecycle service only sees the [`MetadataResolver`] trait; which
//! implementation backs it is decided at startup.

use async_trait::async_trait;
use songlib_common::{Error, Result, SongDetails};
use std::time::Duration;
use tracing::{debug, warn};

const STUB_RELEASE_DATE: &str = "11.11.2011";
const STUB_LINK: &str = "somelink.com";
const STUB_TEXT: &str = "Ooh baby, don't you know I suffer?\n\
Ooh baby, can you hear me moan?\n\
You caught me under false pretenses\n\
How long before you let me go?\n\
\n\
Ooh\n\
You set my soul alight\n\
Ooh\n\
You set my soul alight";

/// Looks up release details for a `(group, title)` pair
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    /// Fails with `MetadataUnavailable` when no details can be obtained
    async fn song_details(&self, group: &str, title: &str) -> Result<SongDetails>;
}

/// Returns the same fixed details for every song
#[derive(Debug, Clone, Copy, Default)]
pub struct StubMetadataResolver;

#[async_trait]
impl MetadataResolver for StubMetadataResolver {
    async fn song_details(&self, group: &str, title: &str) -> Result<SongDetails> {
        debug!(group = %group, title = %title, "Using stub song details");
        Ok(SongDetails {
            release_date: STUB_RELEASE_DATE.to_string(),
            text: STUB_TEXT.to_string(),
            link: STUB_LINK.to_string(),
        })
    }
}

/// Queries an external music info API: `GET {api_url}/info?group=..&song=..`
pub struct HttpMetadataResolver {
    http_client: reqwest::Client,
    api_url: String,
}

impl HttpMetadataResolver {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("songlib/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl MetadataResolver for HttpMetadataResolver {
    async fn song_details(&self, group: &str, title: &str) -> Result<SongDetails> {
        let url = format!("{}/info", self.api_url);
        debug!(url = %url, group = %group, title = %title, "Querying metadata API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("group", group), ("song", title)])
            .send()
            .await
            .map_err(|e| {
                warn!(group = %group, title = %title, error = %e, "Metadata request failed");
                Error::MetadataUnavailable(format!(
                    "request for '{}' by '{}' failed: {}",
                    title, group, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                group = %group,
                title = %title,
                status = %status,
                "Metadata API returned error status"
            );
            return Err(Error::MetadataUnavailable(format!(
                "metadata API returned {} for '{}' by '{}': {}",
                status.as_u16(),
                title,
                group,
                body
            )));
        }

        response.json::<SongDetails>().await.map_err(|e| {
            Error::MetadataUnavailable(format!(
                "undecodable metadata for '{}' by '{}': {}",
                title, group, e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_stub_returns_fixed_details() {
        let details = StubMetadataResolver.song_details("Muse", "Hysteria").await.unwrap();
        assert_eq!(details.release_date, "11.11.2011");
        assert_eq!(details.link, "somelink.com");
        assert_eq!(details.text.split("\n\n").count(), 2);
    }

    #[tokio::test]
    async fn test_http_resolver_sends_group_and_song() {
        let app = Router::new().route(
            "/info",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(serde_json::json!({
                    "releaseDate": "16.07.2006",
                    "text": format!("{} by {}", params["song"], params["group"]),
                    "link": "https://example.com"
                }))
            }),
        );
        let base = serve(app).await;

        let resolver =
            HttpMetadataResolver::new(format!("{}/", base), Duration::from_secs(5)).unwrap();
        let details = resolver.song_details("Muse", "Supermassive Black Hole").await.unwrap();

        assert_eq!(details.release_date, "16.07.2006");
        assert_eq!(details.text, "Supermassive Black Hole by Muse");
        assert_eq!(resolver.api_url(), base);
    }

    #[tokio::test]
    async fn test_http_resolver_maps_error_status() {
        let app = Router::new().route(
            "/info",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(app).await;

        let resolver = HttpMetadataResolver::new(base, Duration::from_secs(5)).unwrap();
        let err = resolver.song_details("Muse", "Hysteria").await.unwrap_err();

        assert!(matches!(err, Error::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_http_resolver_maps_bad_payload() {
        let app = Router::new().route("/info", get(|| async { "not json" }));
        let base = serve(app).await;

        let resolver = HttpMetadataResolver::new(base, Duration::from_secs(5)).unwrap();
        let err = resolver.song_details("Muse", "Hysteria").await.unwrap_err();

        assert!(matches!(err, Error::MetadataUnavailable(_)));
    }

    #[tokio::test]
    async fn test_http_resolver_maps_unreachable_host() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let resolver =
            HttpMetadataResolver::new(format!("http://{}", addr), Duration::from_secs(2)).unwrap();
        let err = resolver.song_details("Muse", "Hysteria").await.unwrap_err();

        assert!(matches!(err, Error::MetadataUnavailable(_)));
    }
}

//! One-shot country loader: fetch, normalize, replace.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use atlas_core::config::SourceConfig;
use atlas_core::country::{normalize, Country, RawCountry};
use atlas_core::error::{AtlasError, Result};

use crate::db::CountryStore;

/// Outcome of a successful load.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    /// Records returned by the source API.
    pub fetched: usize,
    /// Rows written to the table. `None` for a dry run.
    pub written: Option<u64>,
    pub elapsed: Duration,
    pub completed_at: DateTime<Utc>,
}

/// Fetches the country dataset and loads it into the database.
pub struct CountryLoader {
    client: reqwest::Client,
    source: SourceConfig,
}

impl CountryLoader {
    pub fn new(source: SourceConfig) -> Result<Self> {
        if source.url.trim().is_empty() {
            return Err(AtlasError::Config(
                "source.url (or COUNTRIES_API_URL) is required to load countries".to_string(),
            ));
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("atlas/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = source.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AtlasError::Http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, source })
    }

    /// Issue one GET against the source and decode the payload.
    pub async fn fetch(&self) -> Result<Vec<RawCountry>> {
        let url = &self.source.url;
        debug!(url = %url, "Fetching countries");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AtlasError::Http(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AtlasError::Http(format!("{} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AtlasError::Http(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&body)
            .map_err(|e| AtlasError::Decode(format!("Unexpected payload from {}: {}", url, e)))
    }

    /// Fetch and flatten into table rows.
    pub async fn fetch_countries(&self) -> Result<Vec<Country>> {
        let raw = self.fetch().await?;
        let fetched = raw.len();
        let countries = normalize(raw)?;
        info!(records = fetched, "Fetched countries");
        Ok(countries)
    }

    /// Run the full pipeline. Nothing is written unless fetch and normalize
    /// both succeed.
    pub async fn run(&self, store: &CountryStore) -> Result<LoadReport> {
        let started = Instant::now();
        let countries = self.fetch_countries().await?;
        let written = store.replace_all(&countries).await?;

        Ok(LoadReport {
            fetched: countries.len(),
            written: Some(written),
            elapsed: started.elapsed(),
            completed_at: Utc::now(),
        })
    }

    /// Fetch and normalize without touching the database.
    pub async fn dry_run(&self) -> Result<LoadReport> {
        let started = Instant::now();
        let countries = self.fetch_countries().await?;

        Ok(LoadReport {
            fetched: countries.len(),
            written: None,
            elapsed: started.elapsed(),
            completed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    const PAYLOAD: &str = r#"[
        {"name": {"common": "Canada", "official": "Canada"}, "capital": ["Ottawa"],
         "region": "Americas", "subregion": "North America", "population": 38005238,
         "area": 9984670.0, "flags": {"png": "https://flagcdn.com/w320/ca.png"}},
        {"name": {"common": "Antarctica", "official": "Antarctica"},
         "region": "Antarctic", "population": 1000, "area": 14000000.0,
         "flags": {"png": "https://flagcdn.com/w320/aq.png"}}
    ]"#;

    async fn serve(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn loader(addr: SocketAddr, path: &str) -> CountryLoader {
        CountryLoader::new(SourceConfig {
            url: format!("http://{}{}", addr, path),
            timeout_secs: Some(5),
        })
        .unwrap()
    }

    fn router() -> Router {
        Router::new()
            .route("/all", get(|| async { PAYLOAD }))
            .route(
                "/broken",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            )
            .route("/garbage", get(|| async { "<html>not json</html>" }))
            .route("/object", get(|| async { r#"{"status": 404}"# }))
    }

    #[tokio::test]
    async fn test_fetch_countries() {
        let addr = serve(router()).await;

        let countries = loader(addr, "/all").fetch_countries().await.unwrap();
        assert_eq!(countries.len(), 2);
        assert_eq!(countries[0].capital, "Ottawa");
        assert_eq!(countries[1].capital, "Unknown");
        assert!(countries[1].subregion.is_none());
    }

    #[tokio::test]
    async fn test_dry_run_reports_count() {
        let addr = serve(router()).await;

        let report = loader(addr, "/all").dry_run().await.unwrap();
        assert_eq!(report.fetched, 2);
        assert!(report.written.is_none());
    }

    #[tokio::test]
    async fn test_non_success_status_is_http_error() {
        let addr = serve(router()).await;

        let err = loader(addr, "/broken").fetch().await.unwrap_err();
        match err {
            AtlasError::Http(msg) => assert!(msg.contains("503")),
            other => panic!("expected http error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_bad_payloads_are_decode_errors() {
        let addr = serve(router()).await;

        for path in ["/garbage", "/object"] {
            let err = loader(addr, path).fetch().await.unwrap_err();
            assert!(matches!(err, AtlasError::Decode(_)), "{}: {:?}", path, err);
        }
    }

    #[test]
    fn test_empty_source_url_rejected() {
        let err = CountryLoader::new(SourceConfig::default()).err().unwrap();
        assert!(matches!(err, AtlasError::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_source() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = loader(addr, "/all").fetch().await.unwrap_err();
        assert!(matches!(err, AtlasError::Http(_)));
    }
}

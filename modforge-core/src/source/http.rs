//! HTTP package source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::{Error, Result};

use super::{PackageSource, Publication, PublicationIndex};

/// Package source served over HTTP.
///
/// Fetches `<base_url>/<module>/index.json`. A 404 means the module was never
/// published; any other failure is returned as an error without retrying.
pub struct HttpSource {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpSource {
    /// Creates a new HTTP source.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::PackageSource(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn index_url(&self, module: &str) -> String {
        format!("{}/{}/index.json", self.base_url, module)
    }
}

#[async_trait]
impl PackageSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    async fn latest(&self, module: &str) -> Result<Option<Publication>> {
        let url = self.index_url(module);

        let mut builder = self.client.get(&url);
        if let Some(ref token) = self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::PackageSource(format!("Lookup request to {} failed: {}", url, e)))?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await.map_err(|e| {
                    Error::PackageSource(format!("Failed to read response body from {}: {}", url, e))
                })?;
                Ok(PublicationIndex::parse(&body, &url)?.latest())
            }
            StatusCode::NOT_FOUND => Ok(None),
            status @ (StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => Err(Error::PackageSource(
                format!("Authentication failed for {} ({})", url, status),
            )),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(Error::PackageSource(format!(
                    "Lookup failed with status {}: {}",
                    status, text
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_url() {
        let source = HttpSource::new("https://feed.example.com/modules/", None).unwrap();
        assert_eq!(
            source.index_url("Greeter"),
            "https://feed.example.com/modules/Greeter/index.json"
        );
    }
}

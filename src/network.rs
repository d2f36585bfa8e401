use crate::error::AuditError;
use crate::options::Strategy;
use crate::pagespeed::PageSpeedResponse;
use std::future::Future;
use url::Url;

/// The result categories requested for every audit.
pub const CATEGORIES: [&str; 4] = ["best-practices", "performance", "seo", "accessibility"];

/// Builds the HTTP client shared by all audits.
///
/// No timeout is configured; a request takes as long as the API needs.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, AuditError> {
    Ok(reqwest::Client::builder().user_agent(user_agent).build()?)
}

/// Something that can audit a single URL.
///
/// [`PageSpeedClient`] is the real implementation; tests substitute their own.
pub trait AuditFetcher: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &str,
        api_key: &str,
        strategy: Strategy,
    ) -> impl Future<Output = Result<PageSpeedResponse, AuditError>> + Send;
}

/// Talks to the PageSpeed Insights API.
#[derive(Debug, Clone)]
pub struct PageSpeedClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl PageSpeedClient {
    pub fn new(client: reqwest::Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    /// The query string sent along with each audit.
    fn query<'a>(url: &'a str, api_key: &'a str, strategy: Strategy) -> Vec<(&'static str, &'a str)> {
        let mut query = vec![("url", url)];
        query.extend(CATEGORIES.iter().map(|c| ("category", *c)));
        query.push(("key", api_key));
        query.push(("strategy", strategy.as_str()));
        query
    }
}

impl AuditFetcher for PageSpeedClient {
    /// Sends one GET request for `url` and decodes the response.
    ///
    /// # Errors
    ///
    /// - [`AuditError::Network`] if the request fails or the body cannot be read.
    /// - [`AuditError::Status`] for any status other than `200 OK`.
    /// - [`AuditError::Decode`] if the body is not a PageSpeed result.
    async fn fetch(
        &self,
        url: &str,
        api_key: &str,
        strategy: Strategy,
    ) -> Result<PageSpeedResponse, AuditError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&Self::query(url, api_key, strategy))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AuditError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

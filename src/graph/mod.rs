pub mod auth;
pub mod devices;

use crate::error::{Inv365Error, Result};
use reqwest::Client;
use serde::Deserialize;

pub const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Read-only Microsoft Graph client.
///
/// Requests are issued one at a time and never retried: a failed call is
/// reported to the caller, which decides whether it is fatal.
pub struct GraphClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl GraphClient {
    pub fn new(access_token: String) -> Self {
        Self::with_base_url(access_token, GRAPH_API_BASE)
    }

    /// Point the client at a different Graph root (beta endpoint, sovereign cloud, test server)
    pub fn with_base_url(access_token: String, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            access_token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Make a GET request relative to the Graph root
    pub async fn get<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        self.get_raw_url(&self.endpoint_url(endpoint)).await
    }

    /// Make a GET request to an absolute URL (used for following nextLink)
    async fn get_raw_url<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        tracing::debug!(%url, "GET");

        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            let enhanced_error = crate::error::enhance_graph_error(&error_text);
            return Err(Inv365Error::GraphApiError(format!(
                "HTTP {}: {}",
                status, enhanced_error
            )));
        }

        let data = resp.json::<T>().await?;
        Ok(data)
    }
}

// ============================================================================
// Pagination Helpers
// ============================================================================

/// Generic paginated response from Graph API
///
/// Standard OData page: a `value` array plus an optional `@odata.nextLink`
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

impl GraphClient {
    /// Fetch all pages of a paginated Graph API endpoint
    ///
    /// Follows `@odata.nextLink` until the service stops returning one. Items
    /// keep the order in which the pages delivered them. Any page failure
    /// aborts the whole fetch.
    ///
    /// # Example
    /// ```ignore
    /// let devices: Vec<ManagedDeviceRecord> =
    ///     client.get_all_pages("deviceManagement/managedDevices").await?;
    /// ```
    pub async fn get_all_pages<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
    ) -> Result<Vec<T>> {
        let mut all_items: Vec<T> = Vec::new();
        let mut current_url = self.endpoint_url(endpoint);
        let mut page_count = 0usize;

        loop {
            let response: PaginatedResponse<T> = self.get_raw_url(&current_url).await?;
            page_count += 1;
            tracing::debug!(
                page = page_count,
                items = response.value.len(),
                "received page"
            );
            all_items.extend(response.value);

            match response.next_link {
                Some(next) => current_url = next,
                None => break,
            }
        }

        Ok(all_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        let client = GraphClient::with_base_url("t".into(), "https://example.test/v1.0/");
        assert_eq!(
            client.endpoint_url("/devices?$select=id"),
            "https://example.test/v1.0/devices?$select=id"
        );
        assert_eq!(client.base_url(), "https://example.test/v1.0");
    }

    #[test]
    fn test_paginated_response_without_value() {
        let page: PaginatedResponse<serde_json::Value> =
            serde_json::from_str(r#"{"@odata.context":"x"}"#).unwrap();
        assert!(page.value.is_empty());
        assert!(page.next_link.is_none());
    }
}

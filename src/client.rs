//! Client for the Check my Website status API.
//!
//! ```rust,no_run
//! use cmws_plugins::client::{CheckmywsClient, StatusApi};
//!
//! # fn main() -> cmws_plugins::Result<()> {
//! let client = CheckmywsClient::builder()
//!     .proxy("http://proxy.local:3128")
//!     .build()?;
//!
//! let status = client.status("5b6a3cf8-8a4e-4b5c-9c9f-0d1f8a1e2b3c")?;
//! println!("{}", status.summary());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

use crate::{CheckStatus, Error, Result};

pub const DEFAULT_API_URL: &str = "https://api.checkmy.ws/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything able to answer with the status of a check.
pub trait StatusApi {
    fn status(&self, check_id: &str) -> Result<CheckStatus>;
}

#[derive(Debug, Clone)]
pub struct CheckmywsClient {
    client: Client,
    endpoint: Url,
}

impl CheckmywsClient {
    pub fn builder() -> CheckmywsClientBuilder {
        CheckmywsClientBuilder::default()
    }

    fn status_url(&self, check_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        // the endpoint was checked to be a base url when building
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("status").push(check_id);
        }
        url
    }
}

impl StatusApi for CheckmywsClient {
    fn status(&self, check_id: &str) -> Result<CheckStatus> {
        let url = self.status_url(check_id);
        debug!(check_id, %url, "fetching status");

        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(Error::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let status: CheckStatus = response.json()?;
        debug!(check_id, ?status, "raw status");

        Ok(status)
    }
}

#[derive(Debug, Default)]
pub struct CheckmywsClientBuilder {
    endpoint: Option<String>,
    proxy: Option<String>,
    timeout: Option<Duration>,
}

impl CheckmywsClientBuilder {
    /// Base url of the API, [DEFAULT_API_URL] if unset.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Proxy used for every request, whatever the scheme.
    pub fn proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<CheckmywsClient> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_API_URL);
        let endpoint = Url::parse(raw).map_err(|e| Error::InvalidUrl {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidUrl {
                url: raw.to_owned(),
                reason: "not usable as a base url".to_owned(),
            });
        }

        let mut builder = Client::builder().timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));

        if let Some(proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(&proxy).map_err(|e| Error::InvalidUrl {
                url: proxy.clone(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        Ok(CheckmywsClient {
            client: builder.build()?,
            endpoint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_url() {
        let client = CheckmywsClient::builder().build().unwrap();
        assert_eq!(
            client.status_url("abc").as_str(),
            "https://api.checkmy.ws/api/status/abc"
        );

        let client = CheckmywsClient::builder()
            .endpoint("http://localhost:8080/api/")
            .build()
            .unwrap();
        assert_eq!(
            client.status_url("abc").as_str(),
            "http://localhost:8080/api/status/abc"
        );

        let client = CheckmywsClient::builder()
            .endpoint("http://localhost:8080")
            .build()
            .unwrap();
        assert_eq!(
            client.status_url("a b/c").as_str(),
            "http://localhost:8080/status/a%20b%2Fc"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        let err = CheckmywsClient::builder()
            .endpoint("api.checkmy.ws")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));

        let err = CheckmywsClient::builder()
            .endpoint("mailto:someone@example.com")
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUrl { .. }));
    }

    #[test]
    fn test_proxy() {
        assert!(CheckmywsClient::builder()
            .proxy("http://proxy.local:3128")
            .build()
            .is_ok());
    }

    #[test]
    fn test_connection_refused() {
        // nothing listens on port 9 of localhost
        let client = CheckmywsClient::builder()
            .endpoint("http://127.0.0.1:9/api")
            .timeout(Duration::from_secs(1))
            .build()
            .unwrap();

        let err = client.status("abc").unwrap_err();
        assert!(matches!(
            err,
            Error::Connection(_) | Error::Timeout | Error::Http(_)
        ));
    }
}

//! JSON-over-HTTP transport shared by the HTTP data sources.

use super::DataSourceError;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JsonClient {
    client: Client,
    base_url: String,
    max_elapsed: Duration,
}

impl JsonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_elapsed: Duration::from_secs(30),
        }
    }

    /// Cap on total retry time.
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON payload to `path` and decode the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &serde_json::Value,
    ) -> Result<T, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        self.send_with_retry(|| self.client.post(&url).json(payload))
            .await
    }

    /// GET `path` with query parameters and decode the JSON response.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, DataSourceError> {
        let url = format!("{}{}", self.base_url, path);
        self.send_with_retry(|| self.client.get(&url).query(query))
            .await
    }

    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, DataSourceError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(self.max_elapsed),
            ..Default::default()
        };

        retry(backoff, || async {
            let response = build().send().await.map_err(|e| {
                backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
            })?;
            let response = classify_status(response)?;

            response
                .json::<T>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await
    }
}

/// Rate limits and server errors are retried; other failures are permanent.
fn classify_status(response: Response) -> Result<Response, backoff::Error<DataSourceError>> {
    let status = response.status();
    if status == 429 {
        return Err(backoff::Error::transient(DataSourceError::RateLimited));
    }
    if status.is_server_error() {
        return Err(backoff::Error::transient(DataSourceError::HttpError {
            status: status.as_u16(),
            message: "Server error".to_string(),
        }));
    }
    if status == 404 {
        return Err(backoff::Error::permanent(DataSourceError::NotFound(
            response.url().path().to_string(),
        )));
    }
    if !status.is_success() {
        return Err(backoff::Error::permanent(DataSourceError::HttpError {
            status: status.as_u16(),
            message: "Client error".to_string(),
        }));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = JsonClient::new("http://indexer.local/");
        assert_eq!(client.base_url(), "http://indexer.local");
    }
}

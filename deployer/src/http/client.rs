//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, multipart, Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::errors::DeployerError;

/// Query string for requests that take none
pub const NO_QUERY: &[(&str, &str)] = &[];

/// HTTP client for the management API
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<SecretString>,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, DeployerError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new HTTP client that authenticates with a bearer token
    pub fn with_token(base_url: &str, timeout: Duration, token: &str) -> Result<Self, DeployerError> {
        let mut client = Self::new(base_url, timeout)?;
        client.token = Some(SecretString::from(token.to_string()));
        Ok(client)
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", token.expose_secret()),
            ),
            None => request,
        }
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request = self.authorize(self.client.get(&url).query(query));
        let response = check_status("GET", request.send().await?).await?;

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, Q: Serialize + ?Sized, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        body: &B,
    ) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let request = self.authorize(self.client.post(&url).query(query).json(body));
        let response = check_status("POST", request.send().await?).await?;

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a POST request with a multipart form body
    pub async fn post_multipart<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
        form: multipart::Form,
    ) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} (multipart)", url);

        let request = self.authorize(self.client.post(&url).query(query).multipart(form));
        let response = check_status("POST", request.send().await?).await?;

        let body = response.json().await?;
        Ok(body)
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, DeployerError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let request = self.authorize(self.client.put(&url).json(body));
        let response = check_status("PUT", request.send().await?).await?;

        let body = response.json().await?;
        Ok(body)
    }
}

/// Turn a non-2xx response into an `ApiError`, preferring the API's own message
async fn check_status(method: &str, response: Response) -> Result<Response, DeployerError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!("HTTP {} failed: {} - {}", method, status, body);

    Err(DeployerError::ApiError {
        status: status.as_u16(),
        body: api_message(&body),
    })
}

fn api_message(body: &str) -> String {
    #[derive(serde::Deserialize)]
    struct ApiErrorBody {
        #[serde(default)]
        message: String,
        #[serde(default)]
        details: String,
    }

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) if !parsed.details.is_empty() => parsed.details,
        Ok(parsed) if !parsed.message.is_empty() => parsed.message,
        _ => body.to_string(),
    }
}

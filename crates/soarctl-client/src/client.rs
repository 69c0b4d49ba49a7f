use std::time::Duration;

use reqwest::Method;
use serde_json::Value;

use crate::error::ClientError;

/// Client for the SOAR platform's REST administration API.
///
/// Paths passed to the scoped helpers (`get_json`, `search_json`,
/// `post_json`, `put_json`, `delete`) are prefixed with the tenant-account
/// segment when an account is configured. The `root_*` helpers always
/// address the main tenant; account management, host groups and content
/// synchronization live there regardless of the configured account.
#[derive(Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    account: Option<String>,
    dry_run: bool,
}

/// Builder for [`ApiClient`].
pub struct ApiClientBuilder {
    base_url: String,
    api_key: String,
    account: Option<String>,
    timeout: Option<Duration>,
    accept_invalid_certs: bool,
    dry_run: bool,
}

impl ApiClientBuilder {
    /// Sets the API key sent as the `Authorization` header.
    ///
    /// The platform expects the raw key as the header value, without a
    /// `Bearer` prefix.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Scopes resource paths to a tenant account (`/acc_<name>/...`).
    #[must_use]
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the overall per-request timeout.
    ///
    /// Account creation and purge are slow on the platform side; callers
    /// managing accounts typically raise this well above the default.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Disables TLS certificate verification.
    ///
    /// Only intended for self-signed deployments under the caller's
    /// control.
    #[must_use]
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Enables dry-run mode: mutating verbs are suppressed and report
    /// success without issuing a request.
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidBaseUrl`] if the base URL does not
    /// parse, or [`ClientError::Build`] if the HTTP client cannot be
    /// constructed.
    pub fn build(self) -> Result<ApiClient, ClientError> {
        url::Url::parse(&self.base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: self.base_url.clone(),
            source,
        })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if self.accept_invalid_certs {
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder.build().map_err(ClientError::Build)?;

        Ok(ApiClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            account: self.account,
            dry_run: self.dry_run,
        })
    }
}

impl ApiClient {
    /// Starts building a client for the given base URL.
    #[must_use]
    pub fn builder(base_url: impl Into<String>) -> ApiClientBuilder {
        ApiClientBuilder {
            base_url: base_url.into(),
            api_key: String::new(),
            account: None,
            timeout: None,
            accept_invalid_certs: false,
            dry_run: false,
        }
    }

    /// The tenant account this client is scoped to, if any.
    #[must_use]
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    /// Whether mutating verbs are suppressed.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn endpoint(&self, path: &str) -> String {
        match &self.account {
            Some(account) => format!("{}/acc_{}/{}", self.base_url, account, path),
            None => format!("{}/{}", self.base_url, path),
        }
    }

    fn root_endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// GET an account-scoped path.
    pub async fn get_json(&self, path: &str) -> Result<Value, ClientError> {
        self.send(Method::GET, self.endpoint(path), None, false).await
    }

    /// GET a root-scoped path.
    pub async fn root_get_json(&self, path: &str) -> Result<Value, ClientError> {
        self.send(Method::GET, self.root_endpoint(path), None, false).await
    }

    /// POST used as a query against an account-scoped path.
    ///
    /// Search endpoints on this API take their filter as a POST body; the
    /// call is a read and therefore always executes, dry-run or not.
    pub async fn search_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, self.endpoint(path), Some(body), false)
            .await
    }

    /// POST used as a query against a root-scoped path.
    pub async fn root_search_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, self.root_endpoint(path), Some(body), false)
            .await
    }

    /// POST a mutation to an account-scoped path. Suppressed by dry-run.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, self.endpoint(path), Some(body), true)
            .await
    }

    /// POST a mutation to a root-scoped path. Suppressed by dry-run.
    pub async fn root_post_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::POST, self.root_endpoint(path), Some(body), true)
            .await
    }

    /// PUT a mutation to an account-scoped path. Suppressed by dry-run.
    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.send(Method::PUT, self.endpoint(path), Some(body), true)
            .await
    }

    /// DELETE an account-scoped path. Suppressed by dry-run.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, self.endpoint(path), None, true)
            .await
            .map(|_| ())
    }

    /// DELETE a root-scoped path. Suppressed by dry-run.
    pub async fn root_delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(Method::DELETE, self.root_endpoint(path), None, true)
            .await
            .map(|_| ())
    }

    async fn send(
        &self,
        method: Method,
        url: String,
        body: Option<&Value>,
        mutating: bool,
    ) -> Result<Value, ClientError> {
        if mutating && self.dry_run {
            tracing::debug!(%method, %url, "dry run, skipping request");
            return Ok(Value::Null);
        }

        tracing::debug!(%method, %url, "sending request");

        let mut request = self
            .http
            .request(method, &url)
            .header("Authorization", &self.api_key)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ClientError::Request {
            url: url.clone(),
            source,
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| ClientError::Request {
                url: url.clone(),
                source,
            })?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                url,
                body: text,
            });
        }

        if text.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|source| ClientError::Decode { url, source })
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::{NetworkError, TransportError};
use crate::v1::{Config, Endpoint, MainContext, ReqwestTransport, TaskHandle, Transport};
use bytes::Bytes;
use futures::future::{Abortable, Aborted};
use log::{debug, error, warn};
use reqwest::header::{HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::runtime::Handle;
use url::Url;

// Default API host
pub const API_AUTHORITY: &str = "api.unsplash.com";

// Host serving the OAuth endpoints
pub const AUTH_AUTHORITY: &str = "unsplash.com";

/// Builds requests from [`Endpoint`] descriptors, executes them and decodes typed results.
///
/// Transport I/O and decoding run on the Tokio runtime the client was created in.
/// Completions always run on the [`MainContext`].
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    main: MainContext,
    runtime: Handle,
    scheme: String,
    default_authority: String,
}

impl ApiClient {
    /// Creates a client that sends requests through `transport`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        transport: Arc<dyn Transport>,
        main: MainContext,
        default_authority: &str,
    ) -> Result<Self, TransportError> {
        let runtime = Handle::try_current()
            .map_err(|e| TransportError::Other(format!("no Tokio runtime available: {e}")))?;
        Ok(Self {
            transport,
            main,
            runtime,
            scheme: "https".to_string(),
            default_authority: default_authority.to_string(),
        })
    }

    /// Creates a `reqwest` backed client from the configuration
    pub fn from_config(config: &Config, main: MainContext) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::new(Arc::new(transport), main, &config.api_authority)?.with_scheme(&config.scheme))
    }

    /// Overrides the URL scheme used for every request
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    pub fn main_context(&self) -> &MainContext {
        &self.main
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn default_authority(&self) -> &str {
        &self.default_authority
    }

    /// Turns `endpoint` into a wire request without sending it
    pub fn build_request(&self, endpoint: &Endpoint) -> Result<reqwest::Request, NetworkError> {
        let authority = endpoint.authority().unwrap_or(&self.default_authority);
        let mut url = Url::parse(&format!("{}://{}", self.scheme, authority)).map_err(|e| {
            NetworkError::InvalidRequest(format!("invalid authority '{authority}': {e}"))
        })?;
        let is_bare_authority = url.host_str().is_some_and(|h| !h.is_empty())
            && url.path() == "/"
            && url.query().is_none()
            && url.fragment().is_none()
            && url.username().is_empty();
        if !is_bare_authority {
            return Err(NetworkError::InvalidRequest(format!(
                "authority '{authority}' is not a bare host[:port]"
            )));
        }

        if !endpoint.path().starts_with('/') {
            return Err(NetworkError::InvalidRequest(format!(
                "path '{}' must start with '/'",
                endpoint.path()
            )));
        }
        url.set_path(endpoint.path());
        if !endpoint.query().is_empty() {
            url.query_pairs_mut().extend_pairs(endpoint.query());
        }

        let mut request = reqwest::Request::new(endpoint.method().into(), url);
        for (name, value) in endpoint.headers() {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                NetworkError::InvalidRequest(format!("invalid header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                NetworkError::InvalidRequest(format!("invalid value for header '{name}': {e}"))
            })?;
            request.headers_mut().insert(header_name, header_value);
        }
        if let Some(body) = endpoint.body() {
            *request.body_mut() = Some(body.clone().into());
        }
        Ok(request)
    }

    /// Executes `endpoint` and decodes a successful body as `T`.
    ///
    /// Returns immediately. `completion` runs exactly once on the main context,
    /// with `ConnectionError(Cancelled)` if the returned handle was cancelled first.
    pub fn execute<T, F>(&self, endpoint: &Endpoint, completion: F) -> TaskHandle
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<T, NetworkError>) + Send + 'static,
    {
        self.execute_tracked(endpoint, move |_, result| completion(result))
    }

    /// Like [`execute`](Self::execute), but `completion` also receives the handle
    /// of the task it belongs to, so callers can tell whether it is still the
    /// request they are waiting on.
    pub fn execute_tracked<T, F>(&self, endpoint: &Endpoint, completion: F) -> TaskHandle
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(&TaskHandle, Result<T, NetworkError>) + Send + 'static,
    {
        let (handle, registration) = TaskHandle::new();

        let request = match self.build_request(endpoint) {
            Ok(request) => request,
            Err(err) => {
                error!("Failed to build request for {}: {}", endpoint.path(), err);
                deliver(&self.main, handle.clone(), Err(err), completion);
                return handle;
            }
        };

        debug!("Sending {} request to {}", endpoint.method(), request.url());
        let send = self.transport.send(request);
        let main = self.main.clone();
        let task = handle.clone();
        self.runtime.spawn(async move {
            let result = match Abortable::new(send, registration).await {
                Ok(Ok(resp)) => {
                    debug!("Received status {} for task {}", resp.status, task.id());
                    classify::<T>(resp.status, resp.body)
                }
                Ok(Err(err)) => {
                    warn!("Connection error for task {}: {}", task.id(), err);
                    Err(NetworkError::ConnectionError(err))
                }
                Err(Aborted) => Err(NetworkError::ConnectionError(TransportError::Cancelled)),
            };
            deliver(&main, task, result, completion);
        });
        handle
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("scheme", &self.scheme)
            .field("default_authority", &self.default_authority)
            .finish()
    }
}

// Hands the result to the main context. Cancellation is checked again there so a
// response that raced with cancel() is never delivered as a success.
fn deliver<T, F>(main: &MainContext, task: TaskHandle, result: Result<T, NetworkError>, completion: F)
where
    T: Send + 'static,
    F: FnOnce(&TaskHandle, Result<T, NetworkError>) + Send + 'static,
{
    main.dispatch(move || {
        let result = if task.is_cancelled() {
            debug!("Task {} was cancelled", task.id());
            Err(NetworkError::ConnectionError(TransportError::Cancelled))
        } else {
            result
        };
        completion(&task, result)
    });
}

/// Classifies a response by status code and decodes successful bodies as `T`
pub fn classify<T: DeserializeOwned>(status: u16, body: Bytes) -> Result<T, NetworkError> {
    match status {
        200..=299 => {
            if body.is_empty() {
                return Err(NetworkError::NoDataReceived);
            }
            serde_json::from_slice(&body).map_err(NetworkError::DecodingError)
        }
        300..=399 => Err(NetworkError::Redirection(status)),
        400..=499 => Err(NetworkError::ClientError { code: status, body }),
        500..=599 => Err(NetworkError::ServerError(status)),
        _ => Err(NetworkError::UnknownStatusCode(status)),
    }
}

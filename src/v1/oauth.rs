/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! OAuth2 authorization code flow.
//!
//! The web UI opens [`OAuth2Service::authorization_url`], waits for the redirect
//! and hands the URL to [`OAuth2Service::code_from_callback`]. The extracted code
//! is exchanged for a bearer token with [`OAuth2Service::fetch_token`], which
//! stores the token in the [`TokenStore`] on success.

use crate::v1::errors::{NetworkError, OAuthError};
use crate::v1::macros::assert_main;
use crate::v1::{ApiClient, AuthConfig, Config, DuplicateCodePolicy, Endpoint, Guarded, TaskHandle, TokenStore};
use log::{debug, error, info, warn};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

// Path the authorization page redirects to once the user approves access
pub const CALLBACK_PATH: &str = "/oauth/authorize/native";

#[derive(Deserialize, Debug)]
struct OAuthTokenResponseBody {
    access_token: String,
    // #[serde(rename = "token_type")]
    // token_type: String,

    // #[serde(rename = "scope")]
    // scope: String,
}

// Structured error payload of the token endpoint
#[derive(Deserialize, Debug)]
struct OAuthErrorBody {
    error: String,
    error_description: String,
}

// The exchange currently in flight, keyed by its authorization code
struct ActiveAuthRequest {
    task: TaskHandle,
    code: String,
}

struct Inner {
    api_client: ApiClient,
    token_store: Arc<dyn TokenStore>,
    auth: AuthConfig,
    auth_authority: String,
    policy: DuplicateCodePolicy,
    current: Guarded<Option<ActiveAuthRequest>>,
}

/// Exchanges authorization codes for bearer tokens, one exchange at a time
#[derive(Clone)]
pub struct OAuth2Service {
    inner: Arc<Inner>,
}

impl OAuth2Service {
    pub fn new(api_client: ApiClient, token_store: Arc<dyn TokenStore>, config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_client,
                token_store,
                auth: config.auth.clone(),
                auth_authority: config.auth_authority.clone(),
                policy: config.duplicate_code_policy,
                current: Guarded::new(None),
            }),
        }
    }

    /// Page the user signs in on
    pub fn authorization_url(&self) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!(
            "{}://{}/oauth/authorize",
            self.inner.api_client.scheme(),
            self.inner.auth_authority
        ))?;
        // Scopes are '+' separated, which is a form-encoded space
        let scope = self.inner.auth.access_scope.replace('+', " ");
        url.query_pairs_mut()
            .append_pair("client_id", &self.inner.auth.access_key)
            .append_pair("redirect_uri", &self.inner.auth.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &scope);
        Ok(url)
    }

    /// Pulls the authorization code out of the redirect the web view landed on
    pub fn code_from_callback(url: &Url) -> Option<String> {
        if url.path() != CALLBACK_PATH {
            return None;
        }
        url.query_pairs()
            .find(|(name, _)| name == "code")
            .map(|(_, value)| value.into_owned())
    }

    /// True while an exchange is in flight
    pub fn is_exchanging(&self) -> bool {
        self.inner.current.read(|c| c.is_some())
    }

    /// Exchanges `code` for a bearer token and stores it.
    ///
    /// While an exchange is in flight, a call with a different code fails with
    /// [`OAuthError::InvalidRequest`] and leaves it running. A call with the same
    /// code also fails with `InvalidRequest`; under
    /// [`DuplicateCodePolicy::CancelAndReject`] it first cancels the running
    /// exchange, whose `completion` is then never called.
    pub fn fetch_token<F>(&self, code: &str, completion: F)
    where
        F: FnOnce(Result<String, OAuthError>) + Send + 'static,
    {
        assert_main!("OAuth2Service::fetch_token");

        let policy = self.inner.policy;
        let rejected = self.inner.current.update(|current| {
            let active = current.as_ref()?;
            if active.code == code && policy == DuplicateCodePolicy::CancelAndReject {
                if let Some(active) = current.take() {
                    active.task.cancel();
                }
                Some("cancelled the exchange already running for this code")
            } else {
                Some("an exchange is already in flight")
            }
        });
        if let Some(reason) = rejected {
            warn!("Rejecting token request: {}", reason);
            completion(Err(OAuthError::InvalidRequest));
            return;
        }

        let body = match self.token_request_body(code) {
            Ok(body) => body,
            Err(err) => {
                error!("Failed to encode token request: {}", err);
                completion(Err(OAuthError::InvalidRequest));
                return;
            }
        };
        let endpoint = Endpoint::post("/oauth/token")
            .with_authority(self.inner.auth_authority.as_str())
            .with_header("Content-Type", FORM_CONTENT_TYPE)
            .with_body(body);

        debug!("Requesting token");
        let weak = Arc::downgrade(&self.inner);
        let task = self
            .inner
            .api_client
            .execute_tracked::<OAuthTokenResponseBody, _>(&endpoint, move |task, result| {
                if let Some(inner) = weak.upgrade() {
                    inner.finish(task, result, completion);
                }
            });
        self.inner.current.write(Some(ActiveAuthRequest {
            task,
            code: code.to_string(),
        }));
    }

    fn token_request_body(&self, code: &str) -> Result<String, serde_urlencoded::ser::Error> {
        let auth = &self.inner.auth;
        serde_urlencoded::to_string([
            ("client_id", auth.access_key.as_str()),
            ("client_secret", auth.secret_key.as_str()),
            ("redirect_uri", auth.redirect_uri.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
        ])
    }
}

impl Inner {
    fn finish<F>(&self, task: &TaskHandle, result: Result<OAuthTokenResponseBody, NetworkError>, completion: F)
    where
        F: FnOnce(Result<String, OAuthError>),
    {
        let is_current = self.current.update(|current| {
            if current.as_ref().is_some_and(|active| active.task == *task) {
                *current = None;
                true
            } else {
                false
            }
        });
        if !is_current {
            // Superseded by a repeated code; the state already moved on
            debug!("Token request {} was superseded, suppressing its completion", task.id());
            return;
        }

        match result {
            Ok(body) => match self.token_store.set(&body.access_token) {
                Ok(()) => {
                    info!("Token exchange succeeded");
                    completion(Ok(body.access_token));
                }
                Err(err) => {
                    error!("Failed to store token: {}", err);
                    completion(Err(OAuthError::Other(format!("failed to store token: {err}"))));
                }
            },
            Err(err) => {
                let service_error = parse_network_error(err);
                error!("Token exchange failed: {}", service_error);
                completion(Err(service_error));
            }
        }
    }
}

fn parse_network_error(err: NetworkError) -> OAuthError {
    match err {
        NetworkError::ClientError { body, .. } => match serde_json::from_slice::<OAuthErrorBody>(&body) {
            Ok(payload) if payload.error == "invalid_grant" => {
                OAuthError::InvalidGrant(payload.error_description)
            }
            Ok(payload) => OAuthError::Other(payload.error_description),
            Err(_) => OAuthError::Other("unknown server error".to_string()),
        },
        NetworkError::DecodingError(err) => OAuthError::Other(format!("decoding error: {err}")),
        other => OAuthError::Other(format!("network error: {other}")),
    }
}

impl std::fmt::Debug for OAuth2Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Service")
            .field("auth", &self.inner.auth)
            .field("policy", &self.inner.policy)
            .field("exchanging", &self.is_exchanging())
            .finish()
    }
}

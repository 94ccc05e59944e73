/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::TransportError;
use bytes::Bytes;
use futures::future::BoxFuture;
use std::time::Duration;

/// Status and body of a received HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Issues a single HTTP request.
///
/// Implementations must not follow redirects; 3xx responses are classified by
/// the [`ApiClient`](crate::v1::ApiClient).
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<RawResponse, TransportError>>;
}

/// [`Transport`] backed by `reqwest`
#[derive(Clone)]
pub struct ReqwestTransport {
    https_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let https_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(timeout)
            .build()?;
        Ok(Self { https_client })
    }

    pub fn with_client(https_client: reqwest::Client) -> Self {
        Self { https_client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let client = self.https_client.clone();
        Box::pin(async move {
            let resp = client.execute(request).await?;
            let status = resp.status().as_u16();
            let body = resp.bytes().await?;
            Ok(RawResponse { status, body })
        })
    }
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport").finish()
    }
}

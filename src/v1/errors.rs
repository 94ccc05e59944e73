/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use bytes::Bytes;
use std::io;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::v1::Transport) when no response was received
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Request network error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request was cancelled")]
    Cancelled,

    #[error("Transport failure: {0}")]
    Other(String),
}

/// Error conditions returned by the [`ApiClient`](crate::v1::ApiClient)
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Connection error: {0}")]
    ConnectionError(#[source] TransportError),

    #[error("No data received")]
    NoDataReceived,

    #[error("Decoding error: {0}")]
    DecodingError(#[source] serde_json::Error),

    #[error("Redirection status code: {0}")]
    Redirection(u16),

    #[error("Client error: {code}")]
    ClientError { code: u16, body: Bytes },

    #[error("Server error: {0}")]
    ServerError(u16),

    #[error("Unknown status code: {0}")]
    UnknownStatusCode(u16),
}

impl NetworkError {
    /// True when the request was cancelled through its [`TaskHandle`](crate::v1::TaskHandle)
    pub fn is_cancelled(&self) -> bool {
        matches!(self, NetworkError::ConnectionError(TransportError::Cancelled))
    }
}

/// Errors surfaced by the photo, profile and profile image services
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Authentication required: no bearer token stored")]
    AuthenticationRequired,

    #[error("Profile image URL not found")]
    AvatarMissing,

    #[error(transparent)]
    Network(#[from] NetworkError),
}

impl ServiceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ServiceError::Network(err) if err.is_cancelled())
    }
}

/// Errors surfaced by the OAuth token exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OAuthError {
    #[error("Invalid request")]
    InvalidRequest,

    #[error("Authorization error: {0}")]
    InvalidGrant(String),

    #[error("{0}")]
    Other(String),
}

/// Errors from a durable token store
#[derive(Error, Debug)]
pub enum TokenStoreError {
    #[error("I/O error")]
    Io(#[from] io::Error),

    #[error("Token file is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors while assembling a [`Config`](crate::v1::Config)
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("No platform data directory available")]
    NoDataDir,
}

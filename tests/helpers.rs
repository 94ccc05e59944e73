/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
#![allow(dead_code)]

use bytes::Bytes;
use futures::future::BoxFuture;
use imagefeed::v1::{
    ApiClient, AuthConfig, Config, MainContext, MainLoop, MemoryTokenStore, NoSessionHooks, RawResponse,
    Services, SessionHooks, TokenStore, Transport, TransportError,
};
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use url::Url;

pub const TOKEN: &str = "test-bearer-token";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What the executor handed to the transport
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: reqwest::Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn form(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.body.as_deref().unwrap_or_default())
            .into_owned()
            .collect()
    }
}

type Reply = oneshot::Sender<Result<RawResponse, TransportError>>;

/// Transport that records requests and lets the test decide when and how each one completes
#[derive(Default)]
pub struct FakeTransport {
    requests: Mutex<Vec<(RecordedRequest, Option<Reply>)>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, index: usize) -> RecordedRequest {
        self.requests.lock().unwrap()[index].0.clone()
    }

    fn reply(&self, index: usize, result: Result<RawResponse, TransportError>) {
        let reply = self.requests.lock().unwrap()[index]
            .1
            .take()
            .expect("request was already answered");
        // The receiver is gone when the request was cancelled
        let _ = reply.send(result);
    }

    pub fn respond(&self, index: usize, status: u16, body: impl Into<Bytes>) {
        self.reply(
            index,
            Ok(RawResponse {
                status,
                body: body.into(),
            }),
        );
    }

    pub fn respond_json(&self, index: usize, status: u16, value: Value) {
        self.respond(index, status, serde_json::to_vec(&value).unwrap());
    }

    pub fn fail(&self, index: usize, message: &str) {
        self.reply(index, Err(TransportError::Other(message.to_string())));
    }

    pub fn fail_with(&self, index: usize, err: TransportError) {
        self.reply(index, Err(err));
    }
}

impl Transport for FakeTransport {
    fn send(&self, request: reqwest::Request) -> BoxFuture<'static, Result<RawResponse, TransportError>> {
        let recorded = RecordedRequest {
            method: request.method().clone(),
            url: request.url().clone(),
            headers: request.headers().clone(),
            body: request.body().and_then(|b| b.as_bytes()).map(|b| b.to_vec()),
        };
        let (tx, rx) = oneshot::channel();
        self.requests.lock().unwrap().push((recorded, Some(tx)));
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(TransportError::Other("fake transport dropped the request".into())))
        })
    }
}

/// Everything a test needs: a fake transport, the main loop and the services
pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub main_loop: MainLoop,
    pub client: ApiClient,
    pub token_store: Arc<MemoryTokenStore>,
    pub config: Config,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config(), Arc::new(NoSessionHooks))
    }

    pub fn with_config(config: Config, hooks: Arc<dyn SessionHooks>) -> Self {
        init_logger();
        let transport = FakeTransport::new();
        let (main, main_loop) = MainContext::new();
        let client = ApiClient::new(transport.clone(), main, &config.api_authority).unwrap();
        let token_store = Arc::new(MemoryTokenStore::new());
        let services = Services::new(&config, client.clone(), token_store.clone(), hooks);
        Self {
            transport,
            main_loop,
            client,
            token_store,
            config,
            services,
        }
    }

    pub fn authorized(self) -> Self {
        self.token_store.set(TOKEN).unwrap();
        self
    }

    /// Waits for the next main context job and runs it
    pub async fn pump(&mut self) {
        let ran = tokio::time::timeout(Duration::from_secs(2), self.main_loop.turn())
            .await
            .expect("no job reached the main context");
        assert!(ran, "main context closed");
    }

    /// Lets background tasks run, then asserts no job reached the main context
    pub async fn assert_idle(&mut self) {
        settle().await;
        assert_eq!(self.main_loop.run_pending(), 0, "unexpected main context job");
    }
}

pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub fn test_config() -> Config {
    Config::new(AuthConfig::new("test-access-key", "test-secret-key"))
}

pub fn photo_json(id: &str, liked: bool) -> Value {
    json!({
        "id": id,
        "width": 3000,
        "height": 2000,
        "created_at": "2024-05-01T10:20:30Z",
        "description": format!("photo {id}"),
        "urls": {
            "raw": format!("https://images.example/{id}?raw"),
            "full": format!("https://images.example/{id}?full"),
            "regular": format!("https://images.example/{id}?regular"),
            "thumb": format!("https://images.example/{id}?thumb")
        },
        "liked_by_user": liked
    })
}

pub fn page_json(ids: &[String]) -> Value {
    Value::Array(ids.iter().map(|id| photo_json(id, false)).collect())
}

pub fn page_ids(page: usize, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("p{page}-{i}")).collect()
}

/// Counts change notifications
pub fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let count = Arc::new(AtomicUsize::new(0));
    let listener = {
        let count = count.clone();
        move || {
            count.fetch_add(1, Ordering::SeqCst);
        }
    };
    (count, listener)
}

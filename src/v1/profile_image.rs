/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::{NetworkError, ServiceError};
use crate::v1::macros::{assert_main, require_token};
use crate::v1::{ApiClient, ChangeNotifier, Endpoint, Guarded, TaskHandle, TokenStore};
use log::{debug, error, info};
use serde::Deserialize;
use std::sync::Arc;

// Expected response from GET /users/{username}
#[derive(Deserialize, Debug)]
struct UserRecord {
    #[serde(default)]
    profile_image: Option<ProfileImageUrls>,
}

#[derive(Deserialize, Debug)]
struct ProfileImageUrls {
    small: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

impl UserRecord {
    fn avatar_url(self) -> Option<String> {
        let urls = self.profile_image?;
        urls.small.or(urls.medium).or(urls.large)
    }
}

#[derive(Default)]
struct ProfileImageState {
    avatar_url: Option<String>,
    current_task: Option<TaskHandle>,
}

struct Inner {
    api_client: ApiClient,
    token_store: Arc<dyn TokenStore>,
    state: Guarded<ProfileImageState>,
    did_change: ChangeNotifier,
}

/// Owns the URL of the user's avatar
#[derive(Clone)]
pub struct ProfileImageService {
    inner: Arc<Inner>,
}

impl ProfileImageService {
    pub const DID_CHANGE: &'static str = "avatar changed";

    pub fn new(api_client: ApiClient, token_store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_client,
                token_store,
                state: Guarded::default(),
                did_change: ChangeNotifier::new(Self::DID_CHANGE),
            }),
        }
    }

    pub fn did_change(&self) -> &ChangeNotifier {
        &self.inner.did_change
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.inner.state.read(|s| s.avatar_url.clone())
    }

    /// Fetches the public profile of `username` and stores its avatar URL
    pub fn fetch_profile_image_url<F>(&self, username: &str, completion: F)
    where
        F: FnOnce(Result<String, ServiceError>) + Send + 'static,
    {
        assert_main!("ProfileImageService::fetch_profile_image_url");
        let token = require_token!(self.inner.token_store, completion, "ProfileImageService");

        if let Some(previous) = self.inner.state.update(|s| s.current_task.take()) {
            debug!("Cancelling previous avatar fetch");
            previous.cancel();
        }

        let path = format!("/users/{}", urlencoding::encode(username));
        let endpoint = Endpoint::get(path).with_bearer(&token);
        let weak = Arc::downgrade(&self.inner);
        let handle = self
            .inner
            .api_client
            .execute_tracked::<UserRecord, _>(&endpoint, move |task, result| match weak.upgrade() {
                Some(inner) => inner.finish(task, result, completion),
                None => completion(Err(result.err().map_or(ServiceError::AvatarMissing, ServiceError::from))),
            });
        self.inner.state.update(|s| s.current_task = Some(handle));
    }

    pub fn clear(&self) {
        assert_main!("ProfileImageService::clear");
        let current = self.inner.state.write(ProfileImageState::default()).current_task;
        if let Some(task) = current {
            task.cancel();
        }
        info!("Cleared profile image");
        self.inner.did_change.emit();
    }
}

impl Inner {
    fn finish<F>(&self, task: &TaskHandle, result: Result<UserRecord, NetworkError>, completion: F)
    where
        F: FnOnce(Result<String, ServiceError>),
    {
        let is_current = self.state.update(|s| {
            if s.current_task.as_ref() != Some(task) {
                return false;
            }
            s.current_task = None;
            true
        });
        if !is_current {
            debug!("Avatar fetch {} was superseded", task.id());
            completion(Err(result.err().map_or(ServiceError::AvatarMissing, ServiceError::from)));
            return;
        }

        match result.map(UserRecord::avatar_url) {
            Ok(Some(url)) => {
                self.state.update(|s| s.avatar_url = Some(url.clone()));
                debug!("Avatar URL updated");
                self.did_change.emit();
                completion(Ok(url));
            }
            Ok(None) => {
                error!("Profile image URL missing from response");
                completion(Err(ServiceError::AvatarMissing));
            }
            Err(err) => {
                error!("Failed to fetch profile image: {}", err);
                completion(Err(err.into()));
            }
        }
    }
}

impl std::fmt::Debug for ProfileImageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileImageService")
            .field("avatar_url", &self.avatar_url())
            .finish()
    }
}

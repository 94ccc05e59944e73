/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::{NetworkError, ServiceError};
use crate::v1::macros::{assert_main, require_token};
use crate::v1::parsers::from_empty_str_to_none;
use crate::v1::{ApiClient, ChangeNotifier, Endpoint, Guarded, TaskHandle, TokenStore};
use log::{debug, error, info};
use serde::Deserialize;
use std::sync::Arc;

/// The authenticated user's profile as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    /// First and last name joined by a space
    pub name: String,
    /// `@username`
    pub login_name: String,
    pub bio: Option<String>,
}

impl From<ProfileRecord> for Profile {
    fn from(record: ProfileRecord) -> Self {
        let name = [record.first_name, record.last_name]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            login_name: format!("@{}", record.username),
            username: record.username,
            name,
            bio: record.bio,
        }
    }
}

// Expected response from GET /me
#[derive(Deserialize, Debug)]
pub(crate) struct ProfileRecord {
    username: String,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    first_name: Option<String>,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    last_name: Option<String>,

    #[serde(default, deserialize_with = "from_empty_str_to_none")]
    bio: Option<String>,
}

#[derive(Default)]
struct ProfileState {
    profile: Option<Profile>,
    current_task: Option<TaskHandle>,
}

struct Inner {
    api_client: ApiClient,
    token_store: Arc<dyn TokenStore>,
    state: Guarded<ProfileState>,
    did_change: ChangeNotifier,
}

/// Owns the authenticated user's profile
#[derive(Clone)]
pub struct ProfileService {
    inner: Arc<Inner>,
}

impl ProfileService {
    pub const DID_CHANGE: &'static str = "profile changed";

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

    pub fn profile(&self) -> Option<Profile> {
        self.inner.state.read(|s| s.profile.clone())
    }

    /// Fetches `/me` and replaces the cached profile. A fetch still in flight is cancelled.
    pub fn fetch_profile<F>(&self, completion: F)
    where
        F: FnOnce(Result<Profile, ServiceError>) + Send + 'static,
    {
        assert_main!("ProfileService::fetch_profile");
        let token = require_token!(self.inner.token_store, completion, "ProfileService");

        if let Some(previous) = self.inner.state.update(|s| s.current_task.take()) {
            debug!("Cancelling previous profile fetch");
            previous.cancel();
        }

        let endpoint = Endpoint::get("/me").with_bearer(&token);
        let weak = Arc::downgrade(&self.inner);
        let handle = self
            .inner
            .api_client
            .execute_tracked::<ProfileRecord, _>(&endpoint, move |task, result| match weak.upgrade() {
                Some(inner) => inner.finish(task, result, completion),
                None => completion(result.map(Profile::from).map_err(ServiceError::from)),
            });
        self.inner.state.update(|s| s.current_task = Some(handle));
    }

    /// Forgets the cached profile, cancels any fetch in flight and notifies listeners
    pub fn clear(&self) {
        assert_main!("ProfileService::clear");
        let current = self.inner.state.write(ProfileState::default()).current_task;
        if let Some(task) = current {
            task.cancel();
        }
        info!("Cleared profile");
        self.inner.did_change.emit();
    }
}

impl Inner {
    fn finish<F>(&self, task: &TaskHandle, result: Result<ProfileRecord, NetworkError>, completion: F)
    where
        F: FnOnce(Result<Profile, ServiceError>),
    {
        let is_current = self.state.update(|s| {
            if s.current_task.as_ref() != Some(task) {
                return false;
            }
            s.current_task = None;
            true
        });
        if !is_current {
            debug!("Profile fetch {} was superseded", task.id());
            completion(result.map(Profile::from).map_err(ServiceError::from));
            return;
        }

        match result {
            Ok(record) => {
                let profile = Profile::from(record);
                self.state.update(|s| s.profile = Some(profile.clone()));
                info!("Loaded profile for {}", profile.login_name);
                self.did_change.emit();
                completion(Ok(profile));
            }
            Err(err) => {
                error!("Failed to fetch profile: {}", err);
                completion(Err(err.into()));
            }
        }
    }
}

impl std::fmt::Debug for ProfileService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileService")
            .field("profile", &self.profile())
            .finish()
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::{NetworkError, ServiceError};
use crate::v1::macros::{assert_main, require_token};
use crate::v1::photo::{LikeResponse, PhotoRecord};
use crate::v1::{ApiClient, ChangeNotifier, Endpoint, Guarded, HttpMethod, Photo, TaskHandle, TokenStore};
use log::{debug, error, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

// Photos requested per page
pub const PHOTOS_PER_PAGE: usize = 10;

#[derive(Default)]
struct ImagesListState {
    photos: Vec<Photo>,
    last_loaded_page: u32,
    is_fetching: bool,
    current_task: Option<TaskHandle>,
    // In-flight like/unlike requests keyed by photo id
    like_tasks: HashMap<String, TaskHandle>,
}

struct Inner {
    api_client: ApiClient,
    token_store: Arc<dyn TokenStore>,
    state: Guarded<ImagesListState>,
    did_change: ChangeNotifier,
}

/// Owns the paginated photo feed.
///
/// Pages are appended in order and the cache only shrinks through [`clear`](Self::clear).
/// Every public method must be called on the main context.
#[derive(Clone)]
pub struct ImagesListService {
    inner: Arc<Inner>,
}

impl ImagesListService {
    pub const DID_CHANGE: &'static str = "photos changed";

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

    /// Fires after each page is appended and after each like change is applied
    pub fn did_change(&self) -> &ChangeNotifier {
        &self.inner.did_change
    }

    /// Snapshot of the cached photos in feed order
    pub fn photos(&self) -> Vec<Photo> {
        self.inner.state.read(|s| s.photos.clone())
    }

    pub fn photo(&self, id: &str) -> Option<Photo> {
        self.inner.state.read(|s| s.photos.iter().find(|p| p.id == id).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.state.read(|s| s.photos.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last_loaded_page(&self) -> u32 {
        self.inner.state.read(|s| s.last_loaded_page)
    }

    pub fn is_fetching(&self) -> bool {
        self.inner.state.read(|s| s.is_fetching)
    }

    /// Requests the page after the last loaded one.
    ///
    /// Returns `true` when a request was sent; `completion` then receives the
    /// number of photos appended. Returns `false` when nothing was sent: either
    /// a page fetch is already in flight (`completion` is dropped uncalled), or
    /// no token is stored (`completion` gets `AuthenticationRequired` right away).
    pub fn fetch_next_page<F>(&self, completion: F) -> bool
    where
        F: FnOnce(Result<usize, ServiceError>) + Send + 'static,
    {
        assert_main!("ImagesListService::fetch_next_page");
        let token = require_token!(self.inner.token_store, completion, "ImagesListService", false);

        let next_page = self.inner.state.update(|s| {
            if s.is_fetching {
                None
            } else {
                s.is_fetching = true;
                Some(s.last_loaded_page + 1)
            }
        });
        let Some(next_page) = next_page else {
            debug!("Page fetch already in flight, ignoring");
            return false;
        };

        let endpoint = Endpoint::get("/photos")
            .with_bearer(&token)
            .with_query("page", next_page.to_string())
            .with_query("per_page", PHOTOS_PER_PAGE.to_string());
        debug!("Fetching page {}", next_page);

        let weak = Arc::downgrade(&self.inner);
        let handle = self
            .inner
            .api_client
            .execute_tracked::<Vec<PhotoRecord>, _>(&endpoint, move |task, result| match weak.upgrade() {
                Some(inner) => inner.finish_page(task, next_page, result, completion),
                None => completion(result.map(|records| records.len()).map_err(ServiceError::from)),
            });
        self.inner.state.update(|s| s.current_task = Some(handle));
        true
    }

    /// Likes (`is_like == true`) or unlikes a photo.
    ///
    /// On success the cached photo with the same id is replaced by the server's
    /// version and `completion` receives it. On failure the cache is untouched.
    /// A second request for the same photo cancels the first.
    pub fn change_like<F>(&self, photo_id: &str, is_like: bool, completion: F)
    where
        F: FnOnce(Result<Photo, ServiceError>) + Send + 'static,
    {
        assert_main!("ImagesListService::change_like");
        let token = require_token!(self.inner.token_store, completion, "ImagesListService");

        let method = if is_like { HttpMethod::Post } else { HttpMethod::Delete };
        let path = format!("/photos/{}/like", urlencoding::encode(photo_id));
        let endpoint = Endpoint::new(path, method).with_bearer(&token);
        debug!("Sending {} like for photo {}", method, photo_id);

        let weak = Arc::downgrade(&self.inner);
        let id = photo_id.to_string();
        let handle = self
            .inner
            .api_client
            .execute_tracked::<LikeResponse, _>(&endpoint, move |task, result| match weak.upgrade() {
                Some(inner) => inner.finish_like(task, &id, result, completion),
                None => completion(result.map(|r| r.photo.into()).map_err(ServiceError::from)),
            });

        let previous = self
            .inner
            .state
            .update(|s| s.like_tasks.insert(photo_id.to_string(), handle));
        if let Some(previous) = previous {
            debug!("Cancelling earlier like request for photo {}", photo_id);
            previous.cancel();
        }
    }

    /// Drops every cached photo and resets pagination. Cancels in-flight requests
    /// and notifies listeners.
    pub fn clear(&self) {
        assert_main!("ImagesListService::clear");
        let (current, likes) = self.inner.state.update(|s| {
            s.photos.clear();
            s.last_loaded_page = 0;
            s.is_fetching = false;
            (s.current_task.take(), std::mem::take(&mut s.like_tasks))
        });
        for task in current.into_iter().chain(likes.into_values()) {
            task.cancel();
        }
        info!("Cleared photo list");
        self.inner.did_change.emit();
    }
}

impl Inner {
    // Only the task recorded in the state may touch it. Anything else was
    // superseded by clear() and just gets its result forwarded.
    fn finish_page<F>(
        &self,
        task: &TaskHandle,
        page: u32,
        result: Result<Vec<PhotoRecord>, NetworkError>,
        completion: F,
    ) where
        F: FnOnce(Result<usize, ServiceError>),
    {
        let is_current = self.state.update(|s| {
            if s.current_task.as_ref() != Some(task) {
                return false;
            }
            s.current_task = None;
            s.is_fetching = false;
            true
        });
        if !is_current {
            debug!("Page {} fetch was superseded", page);
            completion(result.map(|records| records.len()).map_err(ServiceError::from));
            return;
        }

        match result {
            Ok(records) => {
                let appended = self.state.update(|s| {
                    let mut known: HashSet<String> = s.photos.iter().map(|p| p.id.clone()).collect();
                    let before = s.photos.len();
                    for record in records {
                        if known.insert(record.id.clone()) {
                            s.photos.push(record.into());
                        }
                    }
                    s.last_loaded_page = page;
                    s.photos.len() - before
                });
                info!("Loaded {} photos from page {}", appended, page);
                self.did_change.emit();
                completion(Ok(appended));
            }
            Err(err) => {
                error!("Failed to fetch page {}: {}", page, err);
                completion(Err(err.into()));
            }
        }
    }

    fn finish_like<F>(
        &self,
        task: &TaskHandle,
        photo_id: &str,
        result: Result<LikeResponse, NetworkError>,
        completion: F,
    ) where
        F: FnOnce(Result<Photo, ServiceError>),
    {
        let is_current = self.state.update(|s| {
            if s.like_tasks.get(photo_id) != Some(task) {
                return false;
            }
            s.like_tasks.remove(photo_id);
            true
        });
        if !is_current {
            debug!("Like request for photo {} was superseded", photo_id);
            completion(result.map(|r| r.photo.into()).map_err(ServiceError::from));
            return;
        }

        match result {
            Ok(response) => {
                let photo: Photo = response.photo.into();
                let replaced = self.state.update(|s| match s.photos.iter_mut().find(|p| p.id == photo.id) {
                    Some(cached) => {
                        *cached = photo.clone();
                        true
                    }
                    None => false,
                });
                if replaced {
                    debug!("Photo {} is now liked: {}", photo.id, photo.is_liked);
                    self.did_change.emit();
                } else {
                    debug!("Photo {} is no longer cached", photo.id);
                }
                completion(Ok(photo));
            }
            Err(err) => {
                error!("Failed to change like for photo {}: {}", photo_id, err);
                completion(Err(err.into()));
            }
        }
    }
}

impl std::fmt::Debug for ImagesListService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.state.read(|s| {
            f.debug_struct("ImagesListService")
                .field("photos", &s.photos.len())
                .field("last_loaded_page", &s.last_loaded_page)
                .field("is_fetching", &s.is_fetching)
                .finish()
        })
    }
}

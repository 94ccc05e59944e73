/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::errors::TokenStoreError;
use crate::v1::macros::assert_main;
use crate::v1::{ImagesListService, ProfileImageService, ProfileService, TokenStore};
use log::{error, info};
use std::sync::Arc;

/// Session state owned by the UI layer that has to go away on logout
pub trait SessionHooks: Send + Sync {
    /// Drops cookies and website data held by the web authorization view
    fn clear_web_session(&self) {}

    /// Drops downloaded images
    fn clear_image_cache(&self) {}
}

/// [`SessionHooks`] for applications without a web view or image cache
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSessionHooks;

impl SessionHooks for NoSessionHooks {}

/// Tears the session down
#[derive(Clone)]
pub struct ProfileLogoutService {
    images_list: ImagesListService,
    profile: ProfileService,
    profile_image: ProfileImageService,
    token_store: Arc<dyn TokenStore>,
    hooks: Arc<dyn SessionHooks>,
}

impl ProfileLogoutService {
    pub fn new(
        images_list: ImagesListService,
        profile: ProfileService,
        profile_image: ProfileImageService,
        token_store: Arc<dyn TokenStore>,
        hooks: Arc<dyn SessionHooks>,
    ) -> Self {
        Self {
            images_list,
            profile,
            profile_image,
            token_store,
            hooks,
        }
    }

    /// Clears the web session, every entity cache, the token and the image cache, in that order.
    ///
    /// All steps run even if the token store fails; its error is returned afterwards.
    pub fn logout(&self) -> Result<(), TokenStoreError> {
        assert_main!("ProfileLogoutService::logout");
        info!("Logging out");

        self.hooks.clear_web_session();

        self.images_list.clear();
        self.profile.clear();
        self.profile_image.clear();

        let cleared = self.token_store.clear();
        if let Err(err) = &cleared {
            error!("Failed to clear token: {}", err);
        }

        self.hooks.clear_image_cache();
        cleared
    }
}

impl std::fmt::Debug for ProfileLogoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileLogoutService").finish()
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use crate::v1::{
    ApiClient, Config, ImagesListService, OAuth2Service, ProfileImageService, ProfileLogoutService,
    ProfileService, SessionHooks, TokenStore,
};
use std::sync::Arc;

/// One instance of every service, sharing a client and token store.
///
/// Build it once at startup and hand clones of the individual services to
/// whoever needs them.
#[derive(Clone, Debug)]
pub struct Services {
    pub oauth: OAuth2Service,
    pub images_list: ImagesListService,
    pub profile: ProfileService,
    pub profile_image: ProfileImageService,
    pub logout: ProfileLogoutService,
}

impl Services {
    pub fn new(
        config: &Config,
        api_client: ApiClient,
        token_store: Arc<dyn TokenStore>,
        hooks: Arc<dyn SessionHooks>,
    ) -> Self {
        let oauth = OAuth2Service::new(api_client.clone(), token_store.clone(), config);
        let images_list = ImagesListService::new(api_client.clone(), token_store.clone());
        let profile = ProfileService::new(api_client.clone(), token_store.clone());
        let profile_image = ProfileImageService::new(api_client, token_store.clone());
        let logout = ProfileLogoutService::new(
            images_list.clone(),
            profile.clone(),
            profile_image.clone(),
            token_store,
            hooks,
        );
        Self {
            oauth,
            images_list,
            profile,
            profile_image,
            logout,
        }
    }
}

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # ImageFeed
//!
//! Client core for a photo feed application talking to an Unsplash style API v1.
//!
//! ## Features
//!
//! - Typed request executor over a pluggable transport (reqwest by default)
//! - OAuth2 authorization code exchange
//!     - Builds the authorization URL and extracts the code from the callback
//!     - At most one exchange in flight
//! - Photo feed
//!     - Paginated fetching, one page at a time
//!     - Like / unlike
//! - Profile and avatar
//! - Logout that clears every cache and the stored token
//!
//! ## Threading
//!
//! All cache mutations and completion callbacks happen on one main context, a
//! [`v1::MainLoop`] that the application drives. Network I/O runs on Tokio workers
//! and is handed back to the main context when done. Public service methods must
//! be called from the main context as well, i.e. from inside a job or a
//! [`v1::MainLoop::enter`] block.
//!
//! ## Usage
//!
//! **You will need an access key/secret registered with the API**
//!
//! ```rust,no_run
//! use imagefeed::v1::{
//!     ApiClient, Config, FileTokenStore, MainContext, NoSessionHooks, Services,
//!     clear_on_first_launch,
//! };
//! use std::sync::Arc;
//!
//! async fn show_feed() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let token_store = Arc::new(FileTokenStore::open(config.token_path()?)?);
//!     clear_on_first_launch(token_store.as_ref(), &config.install_marker_path()?)?;
//!
//!     let (main, mut main_loop) = MainContext::new();
//!     let client = ApiClient::from_config(&config, main)?;
//!     let services = Services::new(&config, client, token_store, Arc::new(NoSessionHooks));
//!
//!     let _subscription = services.images_list.did_change().subscribe({
//!         let images_list = services.images_list.clone();
//!         move || println!("{} photos loaded", images_list.len())
//!     });
//!
//!     main_loop.enter(|| {
//!         services.images_list.fetch_next_page(|result| {
//!             if let Err(err) = result {
//!                 eprintln!("Failed to load photos: {err}");
//!             }
//!         });
//!     });
//!
//!     // Runs completions as they arrive
//!     main_loop.run().await;
//!     Ok(())
//! }
//! ```
//!
pub mod v1;

/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

mod macros;
mod parsers;
pub mod api;
pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod errors;
pub mod logout;
pub mod notify;
pub mod oauth;
pub mod photo;
pub mod photos;
pub mod profile;
pub mod profile_image;
pub mod properties;
pub mod services;
pub mod sync;
pub mod task;
pub mod token_store;
pub mod transport;

pub use api::*;
pub use config::*;
pub use dispatch::*;
pub use endpoint::*;
pub use errors::*;
pub use logout::*;
pub use notify::*;
pub use oauth::*;
pub use photo::*;
pub use photos::*;
pub use profile::*;
pub use profile_image::*;
pub use properties::*;
pub use services::*;
pub use sync::*;
pub use task::*;
pub use token_store::*;
pub use transport::*;

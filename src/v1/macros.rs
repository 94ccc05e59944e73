/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

// Traps calls made off the main context in debug builds
macro_rules! assert_main {
    ( $op: expr ) => {{
        debug_assert!(
            $crate::v1::MainContext::is_current(),
            "{} must be called on the main context",
            $op
        );
    }};
}

// Reads the bearer token or completes with AuthenticationRequired and returns early
macro_rules! require_token {
    ( $store: expr, $completion: expr, $op: expr $(, $ret: expr)? ) => {{
        match $store.get() {
            Some(token) => token,
            None => {
                log::warn!("{}: no bearer token stored", $op);
                $completion(Err($crate::v1::ServiceError::AuthenticationRequired));
                return $($ret)?;
            }
        }
    }};
}

pub(crate) use {assert_main, require_token};

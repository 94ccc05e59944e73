/*
 * Copyright (c) 2025 Craig Hamilton and Contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use futures::future::{AbortHandle, AbortRegistration};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to one in-flight request issued through the [`ApiClient`](crate::v1::ApiClient).
///
/// Cloning is cheap; every clone refers to the same request.
#[derive(Clone, Debug)]
pub struct TaskHandle {
    id: u64,
    abort: AbortHandle,
}

impl TaskHandle {
    pub(crate) fn new() -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
        (TaskHandle { id, abort }, registration)
    }

    /// Process-unique id of this request
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancels the request. Its completion will observe a cancellation error
    /// and never a success. Cancelling twice, or after completion, does nothing.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    pub fn is_cancelled(&self) -> bool {
        self.abort.is_aborted()
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for TaskHandle {}

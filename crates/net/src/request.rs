//! Requests, response callbacks and cooperative cancellation

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tokio::sync::Notify;

/// Callback hooks invoked by a transport for one request.
///
/// Ordering: `on_headers` precedes every `on_body_chunk`, and exactly one of
/// `on_complete`/`on_failure` ends the request.
pub trait ResponseHandler {
    fn url(&self) -> String;

    /// Response headers arrived; `content_length` is `None` when unknown
    fn on_headers(&self, content_length: Option<u64>);

    fn on_body_chunk(&self, chunk: &[u8]);

    /// The body was fully received with the given response status
    fn on_complete(&self, status: u16);

    /// The transfer ended without a response; `cancelled` is set when the
    /// request was cancelled through its [`CancelHandle`]
    fn on_failure(&self, cancelled: bool);
}

#[derive(Default)]
struct CancelState {
    cancelled: Cell<bool>,
    notify: Notify,
}

/// Shared cancellation flag for a single request.
///
/// Cancelling only records the request; the transport observes it later and
/// reports `on_failure(true)`.
#[derive(Clone, Default)]
pub struct CancelHandle(Rc<CancelState>);

impl CancelHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.0.cancelled.replace(true) {
            self.0.notify.notify_one();
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.cancelled.get()
    }

    /// Resolves once `cancel` has been called
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.0.notify.notified().await;
        }
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CancelHandle")
            .field(&self.is_cancelled())
            .finish()
    }
}

/// A handler paired with its cancellation handle
#[derive(Clone)]
pub struct Request {
    handler: Rc<dyn ResponseHandler>,
    cancel: CancelHandle,
}

impl Request {
    #[must_use]
    pub fn new(handler: Rc<dyn ResponseHandler>) -> Self {
        Self {
            handler,
            cancel: CancelHandle::new(),
        }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.handler.url()
    }

    #[must_use]
    pub fn handler(&self) -> &Rc<dyn ResponseHandler> {
        &self.handler
    }

    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("url", &self.url())
            .field("cancel", &self.cancel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let handle = CancelHandle::new();
        assert!(!handle.is_cancelled());

        let waiter = handle.clone();
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter.cancelled())
            .await
            .unwrap();
        assert!(waiter.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_pends_until_cancel() {
        let handle = CancelHandle::new();
        let res = tokio::time::timeout(Duration::from_millis(20), handle.cancelled()).await;
        assert!(res.is_err());
    }
}

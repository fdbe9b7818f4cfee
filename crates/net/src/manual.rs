//! A transport that queues requests for the caller to drive by hand

use std::cell::{Cell, RefCell};

use crate::{Request, Transport};

/// Records submitted requests instead of performing I/O.
///
/// Useful wherever the exact callback sequence matters: each queued request
/// can be answered from memory with [`ManualTransport::respond`] or failed
/// with [`ManualTransport::fail`].
#[derive(Default)]
pub struct ManualTransport {
    pending: RefCell<Vec<Request>>,
    submitted: Cell<usize>,
}

impl ManualTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests ever submitted
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.submitted.get()
    }

    #[must_use]
    pub fn pending_urls(&self) -> Vec<String> {
        self.pending.borrow().iter().map(Request::url).collect()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Remove and return the oldest pending request
    pub fn take_next(&self) -> Option<Request> {
        let mut pending = self.pending.borrow_mut();
        if pending.is_empty() {
            None
        } else {
            Some(pending.remove(0))
        }
    }

    /// Answer the oldest pending request with `status` and `body`, delivered
    /// in chunks of `chunk_size` bytes. A cancelled request is failed
    /// instead. Returns `false` when nothing was pending.
    pub fn respond(&self, status: u16, body: &[u8], chunk_size: usize) -> bool {
        let Some(request) = self.take_next() else {
            return false;
        };
        let handler = request.handler();
        if request.is_cancelled() {
            handler.on_failure(true);
            return true;
        }

        handler.on_headers(Some(body.len() as u64));
        for chunk in body.chunks(chunk_size.max(1)) {
            if request.is_cancelled() {
                handler.on_failure(true);
                return true;
            }
            handler.on_body_chunk(chunk);
        }
        handler.on_complete(status);
        true
    }

    /// Fail the oldest pending request, reporting it as cancelled if its
    /// handle was cancelled
    pub fn fail(&self) -> bool {
        let Some(request) = self.take_next() else {
            return false;
        };
        request.handler().on_failure(request.is_cancelled());
        true
    }

    /// Deliver `on_failure(true)` to every pending request whose handle was
    /// cancelled. Returns how many were resolved.
    pub fn flush_cancelled(&self) -> usize {
        let cancelled: Vec<Request> = {
            let mut pending = self.pending.borrow_mut();
            let (cancelled, kept): (Vec<Request>, Vec<Request>) =
                pending.drain(..).partition(Request::is_cancelled);
            *pending = kept;
            cancelled
        };
        for request in &cancelled {
            request.handler().on_failure(true);
        }
        cancelled.len()
    }
}

impl Transport for ManualTransport {
    fn submit(&self, request: Request) {
        self.submitted.set(self.submitted.get() + 1);
        self.pending.borrow_mut().push(request);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponseHandler;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
    }

    impl ResponseHandler for Recorder {
        fn url(&self) -> String {
            "mem://pkg.zip".into()
        }
        fn on_headers(&self, content_length: Option<u64>) {
            self.calls.borrow_mut().push(format!("headers {content_length:?}"));
        }
        fn on_body_chunk(&self, chunk: &[u8]) {
            self.calls.borrow_mut().push(format!("chunk {}", chunk.len()));
        }
        fn on_complete(&self, status: u16) {
            self.calls.borrow_mut().push(format!("complete {status}"));
        }
        fn on_failure(&self, cancelled: bool) {
            self.calls.borrow_mut().push(format!("failure {cancelled}"));
        }
    }

    #[test]
    fn respond_delivers_in_order() {
        let transport = ManualTransport::new();
        let recorder = Rc::new(Recorder::default());
        transport.submit(Request::new(recorder.clone()));
        assert_eq!(transport.pending_urls(), vec!["mem://pkg.zip".to_string()]);

        assert!(transport.respond(200, b"abcde", 2));
        assert_eq!(
            *recorder.calls.borrow(),
            vec![
                "headers Some(5)",
                "chunk 2",
                "chunk 2",
                "chunk 1",
                "complete 200"
            ]
        );
        assert!(!transport.respond(200, b"", 1));
        assert_eq!(transport.submitted(), 1);
    }

    #[test]
    fn flush_cancelled_only_touches_cancelled() {
        let transport = ManualTransport::new();
        let a = Rc::new(Recorder::default());
        let b = Rc::new(Recorder::default());
        let request_a = Request::new(a.clone());
        transport.submit(request_a.clone());
        transport.submit(Request::new(b.clone()));

        request_a.cancel();
        assert_eq!(transport.flush_cancelled(), 1);
        assert_eq!(*a.calls.borrow(), vec!["failure true"]);
        assert!(b.calls.borrow().is_empty());
        assert_eq!(transport.pending_len(), 1);
    }
}

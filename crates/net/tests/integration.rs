//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use hangar_net::*;
    use httpmock::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        url: String,
        headers: RefCell<Option<Option<u64>>>,
        body: RefCell<Vec<u8>>,
        chunks: RefCell<usize>,
        outcome: RefCell<Option<Result<u16, bool>>>,
    }

    impl Recorder {
        fn new(url: String) -> Rc<Self> {
            Rc::new(Self {
                url,
                ..Self::default()
            })
        }
    }

    impl ResponseHandler for Recorder {
        fn url(&self) -> String {
            self.url.clone()
        }
        fn on_headers(&self, content_length: Option<u64>) {
            assert!(self.headers.borrow().is_none(), "headers delivered twice");
            *self.headers.borrow_mut() = Some(content_length);
        }
        fn on_body_chunk(&self, chunk: &[u8]) {
            assert!(self.headers.borrow().is_some(), "chunk before headers");
            *self.chunks.borrow_mut() += 1;
            self.body.borrow_mut().extend_from_slice(chunk);
        }
        fn on_complete(&self, status: u16) {
            assert!(self.outcome.borrow().is_none());
            *self.outcome.borrow_mut() = Some(Ok(status));
        }
        fn on_failure(&self, cancelled: bool) {
            assert!(self.outcome.borrow().is_none());
            *self.outcome.borrow_mut() = Some(Err(cancelled));
        }
    }

    #[tokio::test]
    async fn test_streams_body_and_status() {
        let server = MockServer::start();
        let content = b"archive bytes";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/glider.zip");
            then.status(200).body(content);
        });

        let transport = HttpTransport::with_config(&NetConfig::default()).unwrap();
        let recorder = Recorder::new(server.url("/glider.zip"));
        transport.execute(Request::new(recorder.clone())).await;

        mock.assert();
        assert_eq!(*recorder.headers.borrow(), Some(Some(content.len() as u64)));
        assert_eq!(recorder.body.borrow().as_slice(), content);
        assert!(*recorder.chunks.borrow() >= 1);
        assert_eq!(*recorder.outcome.borrow(), Some(Ok(200)));
    }

    #[tokio::test]
    async fn test_not_found_still_completes() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.zip");
            then.status(404).body("nope");
        });

        let transport = HttpTransport::with_config(&NetConfig::default()).unwrap();
        let recorder = Recorder::new(server.url("/missing.zip"));
        transport.execute(Request::new(recorder.clone())).await;

        assert_eq!(*recorder.outcome.borrow(), Some(Ok(404)));
    }

    #[tokio::test]
    async fn test_cancel_before_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow.zip");
            then.status(200)
                .delay(std::time::Duration::from_secs(5))
                .body("late");
        });

        let transport = HttpTransport::with_config(&NetConfig::default()).unwrap();
        let recorder = Recorder::new(server.url("/slow.zip"));
        let request = Request::new(recorder.clone());
        request.cancel();
        transport.execute(request).await;

        assert!(recorder.headers.borrow().is_none());
        assert_eq!(*recorder.outcome.borrow(), Some(Err(true)));
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let transport = HttpTransport::with_config(&NetConfig::default()).unwrap();
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let recorder = Recorder::new(format!("http://127.0.0.1:{port}/pkg.zip"));
        transport.execute(Request::new(recorder.clone())).await;
        assert_eq!(*recorder.outcome.borrow(), Some(Err(false)));
    }

    #[tokio::test]
    async fn test_submit_runs_on_local_set() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/pkg.zip");
            then.status(200).body("x");
        });

        let local = tokio::task::LocalSet::new();
        let recorder = Recorder::new(server.url("/pkg.zip"));
        let transport = HttpTransport::with_config(&NetConfig::default()).unwrap();
        local
            .run_until(async {
                transport.submit(Request::new(recorder.clone()));
                // Nothing is delivered synchronously from submit
                assert!(recorder.headers.borrow().is_none());
                for _ in 0..200 {
                    if recorder.outcome.borrow().is_some() {
                        break;
                    }
                    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
                }
            })
            .await;
        assert_eq!(*recorder.outcome.borrow(), Some(Ok(200)));
    }
}

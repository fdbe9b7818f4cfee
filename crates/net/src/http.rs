//! reqwest-backed transport

use futures::StreamExt;
use hangar_errors::Error;
use tracing::{debug, warn};

use crate::client::{NetClient, NetConfig};
use crate::{Request, Transport};

/// Streams each request on its own local task.
///
/// `submit` calls [`tokio::task::spawn_local`], so it must run inside a
/// [`tokio::task::LocalSet`].
#[derive(Clone)]
pub struct HttpTransport {
    client: NetClient,
}

impl HttpTransport {
    #[must_use]
    pub fn new(client: NetClient) -> Self {
        Self { client }
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_config(config: &NetConfig) -> Result<Self, Error> {
        Ok(Self::new(NetClient::new(config)?))
    }

    /// Drive a request to its terminal callback on the current task
    pub async fn execute(&self, request: Request) {
        let handler = request.handler().clone();
        let cancel = request.cancel_handle();
        let url = handler.url();

        let response = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(%url, "request cancelled before response");
                handler.on_failure(true);
                return;
            }
            response = self.client.get(&url) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "request failed");
                handler.on_failure(false);
                return;
            }
        };

        let status = response.status().as_u16();
        debug!(%url, status, length = ?response.content_length(), "response headers");
        handler.on_headers(response.content_length());

        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(%url, "request cancelled mid-transfer");
                    handler.on_failure(true);
                    return;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(chunk)) => handler.on_body_chunk(&chunk),
                Some(Err(e)) => {
                    warn!(%url, error = %e, "body stream failed");
                    handler.on_failure(false);
                    return;
                }
                None => break,
            }
        }

        handler.on_complete(status);
    }
}

impl Transport for HttpTransport {
    fn submit(&self, request: Request) {
        let transport = self.clone();
        tokio::task::spawn_local(async move {
            transport.execute(request).await;
        });
    }
}

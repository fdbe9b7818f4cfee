#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network transport boundary for hangar
//!
//! An install session never talks to HTTP directly. It implements
//! [`ResponseHandler`] and is wrapped in a [`Request`], which a [`Transport`]
//! drives: headers first, then every body chunk, then exactly one of
//! `on_complete` or `on_failure`.
//!
//! Everything here is single-threaded. [`HttpTransport`] spawns one local
//! task per request and therefore must be used inside a
//! [`tokio::task::LocalSet`]. [`ManualTransport`] queues requests so callers
//! can drive them step by step.

mod client;
mod http;
mod manual;
mod request;

pub use client::{NetClient, NetConfig};
pub use http::HttpTransport;
pub use manual::ManualTransport;
pub use request::{CancelHandle, Request, ResponseHandler};

/// Something that can execute requests
pub trait Transport {
    /// Queue a request for execution. Implementations must not invoke any
    /// handler callback before this call returns.
    fn submit(&self, request: Request);
}

impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
    fn submit(&self, request: Request) {
        (**self).submit(request);
    }
}

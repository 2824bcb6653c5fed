//! Tower middleware that routes every call of a wrapped service.
//!
//! `RoutingLayer::fixed(key)` declares a whole service as running against one database (the
//! component-level selector for services). `RoutingLayer::from_header(name)` takes the key from
//! a request header; requests without the header run undeclared and reach the default.

use crate::context::ContextHolder;
use crate::key::DatabaseKey;
use axum::http::{HeaderMap, HeaderName, Request};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Header consulted by [`RoutingLayer::from_default_header`].
pub const DATASOURCE_HEADER: &str = "x-datasource";

#[derive(Clone, Debug)]
enum KeySelector {
    Fixed(DatabaseKey),
    Header(HeaderName),
}

impl KeySelector {
    fn select(&self, headers: &HeaderMap) -> Option<DatabaseKey> {
        match self {
            KeySelector::Fixed(key) => Some(key.clone()),
            KeySelector::Header(name) => headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(DatabaseKey::new),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoutingLayer {
    selector: KeySelector,
}

impl RoutingLayer {
    pub fn fixed(key: DatabaseKey) -> Self {
        RoutingLayer {
            selector: KeySelector::Fixed(key),
        }
    }

    pub fn from_header(name: HeaderName) -> Self {
        RoutingLayer {
            selector: KeySelector::Header(name),
        }
    }

    pub fn from_default_header() -> Self {
        Self::from_header(HeaderName::from_static(DATASOURCE_HEADER))
    }
}

impl<S> Layer<S> for RoutingLayer {
    type Service = RoutingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RoutingService {
            inner,
            selector: self.selector.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RoutingService<S> {
    inner: S,
    selector: KeySelector,
}

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

impl<S, B> Service<Request<B>> for RoutingService<S>
where
    S: Service<Request<B>>,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<Result<S::Response, S::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<B>) -> Self::Future {
        match self.selector.select(req.headers()) {
            Some(key) => {
                tracing::debug!(datasource = %key, uri = %req.uri(), "routing request");
                // Work done synchronously inside `call` must see the key too.
                let inner = &mut self.inner;
                let fut = ContextHolder::sync_scope(key.clone(), move || inner.call(req));
                Box::pin(ContextHolder::scope(key, fut))
            }
            None => Box::pin(self.inner.call(req)),
        }
    }
}

//! Generic request dispatch.
//!
//! Each registered target is wrapped in an [`Endpoint`], which erases the
//! concrete store or operation type behind a trait object while keeping the
//! decode, validate and invoke steps statically typed per binding:
//!
//! 1. **Store** (`store`): `POST /<name>` creates, `GET /<name>/<id>` reads
//! 2. **Operation** (`oper`): `POST <path>` processes one request
//! 3. **Errors** (`error`): the failure taxonomy and its HTTP rendering

pub mod error;
pub mod oper;
pub mod store;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use crudmux_core::{Oper, Shape, Store};
use serde::Serialize;
use tracing::{debug, info_span, warn, Instrument};

pub use error::DispatchError;

// ---------------------------------------------------------------------------
// Endpoint trait
// ---------------------------------------------------------------------------

/// A registered dispatch target with its concrete type erased.
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// `"store"` or `"oper"`.
    fn kind(&self) -> &'static str;

    /// Store name or operation path.
    fn label(&self) -> &str;

    /// Route paths this endpoint is bound to.
    fn routes(&self) -> Vec<String>;

    /// Runs the dispatch state machine for one request.
    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> Result<Response, DispatchError>;
}

/// Endpoint serving a [`Store`] under `/<name>` and its sub-paths.
pub struct StoreEndpoint<S>(pub S);

#[async_trait]
impl<S: Store> Endpoint for StoreEndpoint<S> {
    fn kind(&self) -> &'static str {
        "store"
    }

    fn label(&self) -> &str {
        self.0.name()
    }

    fn routes(&self) -> Vec<String> {
        let base = format!("/{}", self.0.name());
        vec![base.clone(), format!("{base}/"), format!("{base}/{{*rest}}")]
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> Result<Response, DispatchError> {
        store::handle(&self.0, method, path, body).await
    }
}

/// Endpoint serving an [`Oper`] at a single path.
pub struct OperEndpoint<O> {
    pub path: String,
    pub oper: O,
}

#[async_trait]
impl<O: Oper> Endpoint for OperEndpoint<O> {
    fn kind(&self) -> &'static str {
        "oper"
    }

    fn label(&self) -> &str {
        &self.path
    }

    fn routes(&self) -> Vec<String> {
        vec![self.path.clone()]
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Bytes,
    ) -> Result<Response, DispatchError> {
        oper::handle(&self.oper, method, path, body).await
    }
}

// ---------------------------------------------------------------------------
// Request entry point
// ---------------------------------------------------------------------------

/// Dispatches one request to `endpoint` and renders the outcome.
///
/// Runs inside a `dispatch` span carrying the endpoint, method, path,
/// resulting status and duration.
pub async fn serve(
    endpoint: Arc<dyn Endpoint>,
    method: Method,
    path: String,
    body: Bytes,
) -> Response {
    let span = info_span!(
        "dispatch",
        kind = endpoint.kind(),
        target = endpoint.label(),
        method = %method,
        path = %path,
        status = tracing::field::Empty,
        duration_ms = tracing::field::Empty,
    );

    async move {
        let start = Instant::now();
        let response = match endpoint.dispatch(&method, &path, body).await {
            Ok(response) => response,
            Err(err) => {
                if err.status().is_server_error() {
                    warn!(error = %err, "dispatch failed");
                } else {
                    debug!(error = %err, "request rejected");
                }
                err.into_response()
            }
        };

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        let current = tracing::Span::current();
        current.record("status", response.status().as_u16());
        current.record("duration_ms", duration_ms);
        response
    }
    .instrument(span)
    .await
}

// ---------------------------------------------------------------------------
// Shared pipeline steps
// ---------------------------------------------------------------------------

/// Decodes `body` as JSON into a fresh instance of `T`.
fn decode<T: Shape>(body: &[u8], target: &str) -> Result<T, DispatchError> {
    serde_json::from_slice(body).map_err(|source| DispatchError::Decode {
        target: target.to_string(),
        source,
    })
}

/// Invokes the validation capability through the handle form, then the
/// value form. The first failure wins.
fn validate<T: Shape>(value: &mut T, target: &str) -> Result<(), DispatchError> {
    let invalid = |source| DispatchError::Invalid {
        target: target.to_string(),
        source,
    };
    if let Some(result) = value.validate_handle() {
        result.map_err(invalid)?;
    }
    if let Some(result) = value.validate_value() {
        result.map_err(invalid)?;
    }
    Ok(())
}

/// Builds a 200 response with `value` as JSON and the given headers.
fn json_response<T: Serialize + ?Sized>(
    value: &T,
    mut headers: HeaderMap,
) -> Result<Response, DispatchError> {
    let body = serde_json::to_vec(value)?;
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let mut response = Response::new(Body::from(body));
    *response.headers_mut() = headers;
    Ok(response)
}

//! Operation dispatcher: `POST <path>` decodes, validates and processes one request.

use axum::http::{HeaderMap, Method};
use axum::response::Response;
use bytes::Bytes;
use crudmux_core::{Oper, Shape};

use super::error::DispatchError;
use super::{decode, json_response, validate};

/// Runs the operation state machine for one request.
///
/// # Errors
///
/// Returns the [`DispatchError`] to render when the method is not `POST`,
/// the body does not decode or validate, or the operation fails.
pub async fn handle<O: Oper>(
    oper: &O,
    method: &Method,
    path: &str,
    body: Bytes,
) -> Result<Response, DispatchError> {
    if *method != Method::POST {
        return Err(DispatchError::OperMethod {
            path: path.to_string(),
        });
    }

    let target = O::Request::shape_name();
    let mut request: O::Request = decode(&body, target)?;
    validate(&mut request, target)?;

    let response = oper.process(request).await.map_err(DispatchError::Oper)?;
    json_response(&response, HeaderMap::new())
}

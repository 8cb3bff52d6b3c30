//! Store dispatcher: create with `POST /<name>`, read with `GET /<name>/<id>`.

use std::borrow::Cow;

use axum::http::{HeaderMap, HeaderValue, Method};
use axum::response::Response;
use bytes::Bytes;
use crudmux_core::{ItemId, Store};
use percent_encoding::percent_decode_str;
use tracing::debug;

use super::error::DispatchError;
use super::{decode, json_response, validate};

/// Id assigned to a created item. Create responses only.
pub const ITEM_ID_HEADER: &str = "item-id";
/// User recorded as the item's owner. Create responses only.
pub const ITEM_USER_ID_HEADER: &str = "item-user-id";
/// Item timestamp, formatted with [`crudmux_core::TIMESTAMP_HEADER_FORMAT`].
pub const ITEM_TIMESTAMP_HEADER: &str = "item-timestamp";
/// Item revision as a decimal integer.
pub const ITEM_REVISION_HEADER: &str = "item-revision";

/// Runs the store state machine for one request.
///
/// `path` is the raw request path relative to where the registry router is
/// mounted. It is percent-decoded before it is matched against the store
/// name or split into an id.
///
/// # Errors
///
/// Returns the [`DispatchError`] to render when the request is rejected or
/// the store fails.
pub async fn handle<S: Store>(
    store: &S,
    method: &Method,
    path: &str,
    body: Bytes,
) -> Result<Response, DispatchError> {
    match *method {
        Method::POST => create(store, path, &body).await,
        Method::GET => read(store, path).await,
        _ => Err(DispatchError::CrudMethod),
    }
}

async fn create<S: Store>(store: &S, path: &str, body: &[u8]) -> Result<Response, DispatchError> {
    let name = store.name();
    let path = decode_path(path);
    if path.as_deref().and_then(|p| p.strip_prefix('/')) != Some(name) {
        return Err(DispatchError::CreatePath {
            name: name.to_string(),
        });
    }

    let mut item: S::Item = decode(body, name)?;
    validate(&mut item, name)?;

    let info = store.add(item).await.map_err(DispatchError::Add)?;
    debug!(store = name, id = %info.id, rev = info.rev, "item created");

    let mut headers = HeaderMap::new();
    headers.insert(ITEM_ID_HEADER, HeaderValue::from_str(info.id.as_str())?);
    headers.insert(
        ITEM_USER_ID_HEADER,
        HeaderValue::from_str(info.user_id.as_str())?,
    );
    headers.insert(
        ITEM_TIMESTAMP_HEADER,
        HeaderValue::from_str(&info.header_timestamp())?,
    );
    headers.insert(ITEM_REVISION_HEADER, HeaderValue::from(info.rev));
    json_response(&info, headers)
}

async fn read<S: Store>(store: &S, path: &str) -> Result<Response, DispatchError> {
    let not_found = || DispatchError::ReadPath {
        name: store.name().to_string(),
    };

    let Some(path) = decode_path(path) else {
        return Err(not_found());
    };
    let id = match path.splitn(4, '/').collect::<Vec<_>>().as_slice() {
        [_, _, id] if !id.is_empty() => ItemId::from(*id),
        _ => return Err(not_found()),
    };

    let (item, info) = store.get(&id).await.map_err(|err| {
        debug!(store = store.name(), %id, error = %err, "read failed");
        not_found()
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        ITEM_TIMESTAMP_HEADER,
        HeaderValue::from_str(&info.header_timestamp())?,
    );
    headers.insert(ITEM_REVISION_HEADER, HeaderValue::from(info.rev));
    json_response(&item, headers)
}

/// Percent-decodes a request path. `None` when the result is not UTF-8.
fn decode_path(path: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(path).decode_utf8().ok()
}

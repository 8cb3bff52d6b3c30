//! Dispatch failures and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use crudmux_core::{StoreError, ValidationError};

/// Fixed message for methods a store route does not serve.
pub const CRUD_METHOD_MESSAGE: &str =
    "CRUD: Create with POST, Read with GET, Update with PUT, Delete with DELETE.";

/// Every way a dispatched request can fail.
///
/// The `Display` text is the response body; [`DispatchError::status`] is the
/// response status.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Expecting POST /{name}")]
    CreatePath { name: String },
    #[error("Expecting GET /{name}/<id>")]
    ReadPath { name: String },
    #[error("Cannot parse body as JSON {target}")]
    Decode {
        target: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {target}: {source}")]
    Invalid {
        target: String,
        source: ValidationError,
    },
    #[error("failed to add: {0}")]
    Add(#[source] StoreError),
    #[error("{}", CRUD_METHOD_MESSAGE)]
    CrudMethod,
    #[error("{path} accepts only POST")]
    OperMethod { path: String },
    #[error("failed: {0:#}")]
    Oper(anyhow::Error),
    #[error("cannot encode response: {0}")]
    Encode(String),
}

impl DispatchError {
    /// HTTP status reported for this failure.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::CreatePath { .. }
            | Self::Decode { .. }
            | Self::Invalid { .. }
            | Self::Oper(_) => StatusCode::BAD_REQUEST,
            Self::ReadPath { .. } => StatusCode::NOT_FOUND,
            Self::CrudMethod | Self::OperMethod { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Add(_) | Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for DispatchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode(err.to_string())
    }
}

impl From<axum::http::header::InvalidHeaderValue> for DispatchError {
    fn from(err: axum::http::header::InvalidHeaderValue) -> Self {
        Self::Encode(err.to_string())
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        (self.status(), format!("{self}\n")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let decode_err = serde_json::from_str::<u8>("x").unwrap_err();
        let cases = [
            (DispatchError::CreatePath { name: "n".into() }, 400),
            (
                DispatchError::Decode {
                    target: "n".into(),
                    source: decode_err,
                },
                400,
            ),
            (
                DispatchError::Invalid {
                    target: "n".into(),
                    source: ValidationError::new("bad"),
                },
                400,
            ),
            (DispatchError::Oper(anyhow::anyhow!("nope")), 400),
            (DispatchError::ReadPath { name: "n".into() }, 404),
            (DispatchError::CrudMethod, 405),
            (DispatchError::OperMethod { path: "/op".into() }, 405),
            (
                DispatchError::Add(StoreError::Backend(anyhow::anyhow!("disk"))),
                500,
            ),
            (DispatchError::Encode("x".into()), 500),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{err}");
        }
    }

    #[test]
    fn messages_match_the_http_surface() {
        assert_eq!(
            DispatchError::CrudMethod.to_string(),
            "CRUD: Create with POST, Read with GET, Update with PUT, Delete with DELETE."
        );
        assert_eq!(
            DispatchError::OperMethod { path: "/sum".into() }.to_string(),
            "/sum accepts only POST"
        );
        assert_eq!(
            DispatchError::ReadPath { name: "notes".into() }.to_string(),
            "Expecting GET /notes/<id>"
        );
        assert_eq!(
            DispatchError::Invalid {
                target: "notes".into(),
                source: ValidationError::field("title", "empty"),
            }
            .to_string(),
            "invalid notes: title: empty"
        );
    }

    #[test]
    fn operation_failure_renders_context_chain() {
        let err = anyhow::anyhow!("division by zero").context("sum");
        assert_eq!(DispatchError::Oper(err).to_string(), "failed: sum: division by zero");
    }
}

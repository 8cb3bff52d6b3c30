use serde::de::DeserializeOwned;
use serde::Serialize;

/// Failure reported by a shape's validation capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", render(.field.as_deref(), .message))]
pub struct ValidationError {
    /// Offending field, when the failure is attributable to one.
    pub field: Option<String>,
    /// Human-readable description of the failure.
    pub message: String,
}

fn render(field: Option<&str>, message: &str) -> String {
    match field {
        Some(field) => format!("{field}: {message}"),
        None => message.to_string(),
    }
}

impl ValidationError {
    /// Creates an error not tied to a specific field.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            field: None,
            message: message.into(),
        }
    }

    /// Creates an error for the named field.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// A JSON-decodable payload shape: a store item or an operation request.
///
/// Each binding is parameterized by exactly one concrete shape, so decoding
/// into a fresh instance is statically typed per route.
///
/// # Validation capability
///
/// The capability is optional and probed per instance through two handle
/// forms. Returning `None` means the form does not expose the capability.
///
/// - [`validate_value`](Shape::validate_value) is the value form.
/// - [`validate_handle`](Shape::validate_handle) is the mutable-handle form
///   and may normalize the value in place. It defaults to the value form, so
///   a type that only overrides `validate_value` is validated through both
///   forms, once each.
///
/// The dispatcher invokes the handle form first, then the value form, and
/// stops at the first failure.
pub trait Shape: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Short type name used in decode and validation messages.
    #[must_use]
    fn shape_name() -> &'static str
    where
        Self: Sized,
    {
        short_type_name::<Self>()
    }

    /// Validation through the mutable handle.
    fn validate_handle(&mut self) -> Option<Result<(), ValidationError>> {
        self.validate_value()
    }

    /// Validation through the value.
    fn validate_value(&self) -> Option<Result<(), ValidationError>> {
        None
    }
}

/// Strips the module path and generic arguments from `type_name::<T>()`.
fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl Shape for serde_json::Value {}

impl Shape for String {}

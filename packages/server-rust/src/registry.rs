use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use axum::http::{Method, Uri};
use axum::routing::any;
use axum::Router;
use bytes::Bytes;
use crudmux_core::{Oper, Store};
use regex::Regex;
use tracing::debug;

use crate::dispatch::{self, Endpoint, OperEndpoint, StoreEndpoint};

static STORE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("store name pattern is valid")
});

// ---------------------------------------------------------------------------
// RegistryError
// ---------------------------------------------------------------------------

/// Startup-time contract violations. The owning process must not serve
/// requests after receiving one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("invalid operation path {path:?}: {reason}")]
    InvalidOperPath { path: String, reason: &'static str },
    #[error("invalid store name {name:?}: must match {}", STORE_NAME.as_str())]
    InvalidStoreName { name: String },
    #[error("route {route} is claimed by both {first} and {second}")]
    DuplicateRoute {
        route: String,
        first: String,
        second: String,
    },
    #[error("operation path {path} falls under store {store}")]
    ShadowedOperPath { path: String, store: String },
    #[error("route {route} is reserved by the server")]
    ReservedRoute { route: String },
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Append-only set of store and operation bindings.
///
/// Populated once at startup, then consumed by [`Registry::into_router`],
/// after which the bindings are only read while serving. Registration order
/// is preserved.
#[derive(Default)]
pub struct Registry {
    endpoints: Vec<Arc<dyn Endpoint>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a store binding. Names are checked when the registry is bound.
    pub fn register_store<S: Store>(&mut self, store: S) {
        self.endpoints.push(Arc::new(StoreEndpoint(store)));
    }

    /// Appends an operation binding served at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidOperPath`] if `path` is not a plain
    /// absolute route path.
    ///
    /// The one-request, response-or-error shape is checked by [`Oper`]
    /// itself, so an operation that takes two inputs does not register:
    ///
    /// ```compile_fail
    /// use async_trait::async_trait;
    /// use crudmux_core::Oper;
    /// use crudmux_server::Registry;
    ///
    /// struct Concat;
    ///
    /// #[async_trait]
    /// impl Oper for Concat {
    ///     type Request = String;
    ///     type Response = String;
    ///
    ///     async fn process(&self, left: String, right: String) -> anyhow::Result<String> {
    ///         Ok(left + &right)
    ///     }
    /// }
    ///
    /// let _ = Registry::new().with_oper("/concat", Concat);
    /// ```
    ///
    /// Neither does one whose failure output is not an error:
    ///
    /// ```compile_fail
    /// use async_trait::async_trait;
    /// use crudmux_core::Oper;
    /// use crudmux_server::Registry;
    ///
    /// struct Shout;
    ///
    /// #[async_trait]
    /// impl Oper for Shout {
    ///     type Request = String;
    ///     type Response = String;
    ///
    ///     async fn process(&self, request: String) -> String {
    ///         request.to_uppercase()
    ///     }
    /// }
    ///
    /// let _ = Registry::new().with_oper("/shout", Shout);
    /// ```
    ///
    /// The well-formed version of the same operation registers:
    ///
    /// ```
    /// use async_trait::async_trait;
    /// use crudmux_core::Oper;
    /// use crudmux_server::Registry;
    ///
    /// struct Shout;
    ///
    /// #[async_trait]
    /// impl Oper for Shout {
    ///     type Request = String;
    ///     type Response = String;
    ///
    ///     async fn process(&self, request: String) -> anyhow::Result<String> {
    ///         Ok(request.to_uppercase())
    ///     }
    /// }
    ///
    /// assert!(Registry::new().with_oper("/shout", Shout).is_ok());
    /// ```
    pub fn register_oper<O: Oper>(
        &mut self,
        path: impl Into<String>,
        oper: O,
    ) -> Result<(), RegistryError> {
        let path = path.into();
        check_oper_path(&path)?;
        self.endpoints.push(Arc::new(OperEndpoint { path, oper }));
        Ok(())
    }

    /// Builder form of [`Registry::register_store`].
    #[must_use]
    pub fn with_store<S: Store>(mut self, store: S) -> Self {
        self.register_store(store);
        self
    }

    /// Builder form of [`Registry::register_oper`].
    ///
    /// # Errors
    ///
    /// See [`Registry::register_oper`].
    pub fn with_oper<O: Oper>(
        mut self,
        path: impl Into<String>,
        oper: O,
    ) -> Result<Self, RegistryError> {
        self.register_oper(path, oper)?;
        Ok(self)
    }

    /// Names of the registered stores, in registration order.
    #[must_use]
    pub fn store_names(&self) -> Vec<&str> {
        self.labels("store")
    }

    /// Paths of the registered operations, in registration order.
    #[must_use]
    pub fn oper_paths(&self) -> Vec<&str> {
        self.labels("oper")
    }

    /// Every route path the registrations will be bound to.
    #[must_use]
    pub fn routes(&self) -> Vec<String> {
        self.endpoints.iter().flat_map(|e| e.routes()).collect()
    }

    fn labels(&self, kind: &str) -> Vec<&str> {
        self.endpoints
            .iter()
            .filter(|e| e.kind() == kind)
            .map(|e| e.label())
            .collect()
    }

    /// Binds every registration to an axum router.
    ///
    /// Each store is served at `/<name>` and every path below it; each
    /// operation at its own path. All methods reach the dispatcher, which
    /// answers unsupported ones with 405.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if a store name is malformed, two
    /// bindings claim the same route, or an operation path lies below a
    /// store.
    pub fn into_router<S>(self) -> Result<Router<S>, RegistryError>
    where
        S: Clone + Send + Sync + 'static,
    {
        self.check_routes()?;

        let mut router = Router::new();
        for endpoint in self.endpoints {
            for route in endpoint.routes() {
                debug!(kind = endpoint.kind(), target = endpoint.label(), %route, "binding route");
                let endpoint = Arc::clone(&endpoint);
                router = router.route(
                    &route,
                    any(move |method: Method, uri: Uri, body: Bytes| {
                        let endpoint = Arc::clone(&endpoint);
                        async move {
                            dispatch::serve(endpoint, method, uri.path().to_string(), body).await
                        }
                    }),
                );
            }
        }
        Ok(router)
    }

    fn check_routes(&self) -> Result<(), RegistryError> {
        for name in self.store_names() {
            if !STORE_NAME.is_match(name) {
                return Err(RegistryError::InvalidStoreName {
                    name: name.to_string(),
                });
            }
        }

        let mut claimed: HashMap<String, String> = HashMap::new();
        for endpoint in &self.endpoints {
            let owner = format!("{} {}", endpoint.kind(), endpoint.label());
            for route in endpoint.routes() {
                if let Some(first) = claimed.get(&route) {
                    return Err(RegistryError::DuplicateRoute {
                        route,
                        first: first.clone(),
                        second: owner,
                    });
                }
                claimed.insert(route, owner.clone());
            }
        }

        for path in self.oper_paths() {
            if let Some(store) = self
                .store_names()
                .into_iter()
                .find(|name| path.starts_with(&format!("/{name}/")) && path.len() > name.len() + 2)
            {
                return Err(RegistryError::ShadowedOperPath {
                    path: path.to_string(),
                    store: store.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_oper_path(path: &str) -> Result<(), RegistryError> {
    let reason = if !path.starts_with('/') {
        Some("must start with '/'")
    } else if path == "/" {
        Some("must name a resource below '/'")
    } else if path.chars().any(|c| c.is_whitespace() || c == '{' || c == '}') {
        Some("must not contain whitespace or braces")
    } else if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        Some("segments must not start with ':' or '*'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(RegistryError::InvalidOperPath {
            path: path.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Named routes and the per-scope route table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::dispatch::Handler;
use crate::routing::params::Params;
use crate::routing::pattern::{PatternError, RoutePattern};

/// Builds a fresh handler instance for each request.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn Handler> + Send + Sync>;

/// Wrap a typed constructor into a [`HandlerFactory`].
pub fn handler_factory<H, F>(factory: F) -> HandlerFactory
where
    H: Handler + 'static,
    F: Fn() -> H + Send + Sync + 'static,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Handler>)
}

/// Registration errors. All of them are fatal configuration errors.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("route `{name}` is already registered in {scope}")]
    DuplicateName { scope: String, name: String },

    #[error("name `{name}` must not contain `.`, it separates group and route names")]
    ReservedCharacter { name: String },

    #[error("route and group names must not be empty")]
    EmptyName,

    #[error("route group `{name}` must have a non-root prefix; register root routes at the top level")]
    RootPrefix { name: String },

    #[error("route group `{name}` is already mounted")]
    DuplicateGroup { name: String },

    #[error(transparent)]
    Pattern(#[from] PatternError),
}

pub(crate) fn validate_name(name: &str) -> Result<(), RoutingError> {
    if name.is_empty() {
        return Err(RoutingError::EmptyName);
    }
    if name.contains('.') {
        return Err(RoutingError::ReservedCharacter {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A compiled pattern bound to a handler factory.
pub struct Route {
    pattern: RoutePattern,
    name: String,
    display_name: String,
    factory: HandlerFactory,
}

impl Route {
    pub fn new(
        pattern: RoutePattern,
        name: impl Into<String>,
        display_name: impl Into<String>,
        factory: HandlerFactory,
    ) -> Self {
        Self {
            pattern,
            name: name.into(),
            display_name: display_name.into(),
            factory,
        }
    }

    /// Machine name used for reverse lookups.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Construct a new handler for one request.
    pub fn instantiate(&self) -> Box<dyn Handler> {
        (self.factory)()
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.raw())
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .finish()
    }
}

/// Routes of one scope (top level or a single group), in registration order.
#[derive(Debug, Default)]
pub(crate) struct RouteTable {
    routes: Vec<Route>,
    by_name: HashMap<String, usize>,
}

impl RouteTable {
    pub(crate) fn insert(&mut self, scope: &str, route: Route) -> Result<(), RoutingError> {
        validate_name(route.name())?;
        if self.by_name.contains_key(route.name()) {
            return Err(RoutingError::DuplicateName {
                scope: scope.to_string(),
                name: route.name().to_string(),
            });
        }
        self.by_name.insert(route.name().to_string(), self.routes.len());
        self.routes.push(route);
        Ok(())
    }

    /// First registered route whose pattern matches.
    pub(crate) fn find(&self, path: &str) -> Option<(&Route, Params)> {
        self.routes
            .iter()
            .find_map(|route| route.pattern().extract(path).map(|params| (route, params)))
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Route> {
        self.by_name.get(name).map(|&index| &self.routes[index])
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.routes.len()
    }
}

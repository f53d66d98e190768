//! Route groups ("blueprints"): a path prefix with its own routes and filters.

use std::fmt;

use crate::dispatch::filter::Filter;
use crate::dispatch::{DispatchError, Handler, RequestContext};
use crate::routing::matcher::PrefixMatcher;
use crate::routing::params::{ParamValue, Params};
use crate::routing::pattern::{ReverseError, RoutePattern};
use crate::routing::route::{handler_factory, Route, RouteTable, RoutingError};

/// A prefix-scoped bundle of routes and filters.
///
/// Group routes are written relative to the prefix: a group at `/admin`
/// with route `/users/:int:id` serves `/admin/users/7`.
pub struct RouteGroup {
    matcher: PrefixMatcher,
    routes: RouteTable,
    before: Vec<Filter>,
    after: Vec<Filter>,
}

impl RouteGroup {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            matcher: PrefixMatcher::new(prefix),
            routes: RouteTable::default(),
            before: Vec::new(),
            after: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    /// Register a route in this group. Names must be unique within the group.
    pub fn register<H, F>(
        &mut self,
        pattern: &str,
        name: &str,
        display_name: &str,
        factory: F,
    ) -> Result<&mut Self, RoutingError>
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let compiled = RoutePattern::compile(pattern)?;
        let route = Route::new(compiled, name, display_name, handler_factory(factory));
        let scope = format!("group `{}`", self.matcher.prefix());
        self.routes.insert(&scope, route)?;
        Ok(self)
    }

    /// Add a before-filter, run after the global before-filters.
    pub fn before<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.before.push(Filter::new(filter));
        self
    }

    /// Add an after-filter, run before the global after-filters.
    pub fn after<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.after.push(Filter::new(filter));
        self
    }

    /// Build the absolute URL for one of this group's routes.
    pub fn reverse(&self, name: &str, args: &[ParamValue]) -> Result<String, ReverseError> {
        let route = self.routes.get(name).ok_or_else(|| ReverseError::UnknownRoute {
            name: name.to_string(),
        })?;
        let relative = route.pattern().fill(args)?;
        Ok(self.matcher.join(&relative))
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    pub(crate) fn matcher(&self) -> &PrefixMatcher {
        &self.matcher
    }

    pub(crate) fn find(&self, relative: &str) -> Option<(&Route, Params)> {
        self.routes.find(relative)
    }

    pub(crate) fn before_filters(&self) -> &[Filter] {
        &self.before
    }

    pub(crate) fn after_filters(&self) -> &[Filter] {
        &self.after
    }
}

impl fmt::Debug for RouteGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteGroup")
            .field("prefix", &self.matcher.prefix())
            .field("routes", &self.routes.len())
            .field("before", &self.before.len())
            .field("after", &self.after.len())
            .finish()
    }
}

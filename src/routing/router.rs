//! Route lookup and reverse URL resolution.
//!
//! # Responsibilities
//! - Store top-level routes, mounted groups and global filters
//! - Look up the route for a request path
//! - Build URLs from machine names (`name` or `group.name`)
//!
//! # Design Decisions
//! - Immutable after the application is built (shared via `Arc`, no locks)
//! - Groups are consulted first, longest prefix first, mount order on ties
//! - Once a group prefix matches, top-level routes are not considered
//! - First registered match wins within a scope
//! - Explicit `None` rather than a silent default route

use crate::dispatch::filter::Filter;
use crate::dispatch::{DispatchError, Handler, RequestContext};
use crate::routing::group::RouteGroup;
use crate::routing::params::{ParamValue, Params};
use crate::routing::pattern::{ReverseError, RoutePattern};
use crate::routing::route::{handler_factory, validate_name, Route, RouteTable, RoutingError};

const TOP_LEVEL_SCOPE: &str = "top-level routes";

#[derive(Debug)]
struct MountedGroup {
    name: String,
    group: RouteGroup,
}

/// Result of a successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub route: &'a Route,
    pub group: Option<&'a RouteGroup>,
    pub group_name: Option<&'a str>,
    pub params: Params,
}

/// The application's route registry.
#[derive(Debug, Default)]
pub struct Router {
    routes: RouteTable,
    groups: Vec<MountedGroup>,
    before: Vec<Filter>,
    after: Vec<Filter>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a top-level route.
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
        self.routes.insert(TOP_LEVEL_SCOPE, route)?;
        Ok(self)
    }

    /// Mount a group under a name used for `name.route` reverse lookups.
    pub fn mount(&mut self, name: &str, group: RouteGroup) -> Result<&mut Self, RoutingError> {
        validate_name(name)?;
        if group.matcher().is_root() {
            return Err(RoutingError::RootPrefix {
                name: name.to_string(),
            });
        }
        if self.groups.iter().any(|g| g.name == name) {
            return Err(RoutingError::DuplicateGroup {
                name: name.to_string(),
            });
        }
        let specificity = group.matcher().specificity();
        let position = self
            .groups
            .partition_point(|g| g.group.matcher().specificity() >= specificity);
        self.groups.insert(
            position,
            MountedGroup {
                name: name.to_string(),
                group,
            },
        );
        Ok(self)
    }

    /// Add a global before-filter.
    pub fn before<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.before.push(Filter::new(filter));
        self
    }

    /// Add a global after-filter.
    pub fn after<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.after.push(Filter::new(filter));
        self
    }

    /// Find the route serving `path`.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut prefixed = false;
        for mounted in &self.groups {
            let Some(relative) = mounted.group.matcher().strip(path) else {
                continue;
            };
            prefixed = true;
            if let Some((route, params)) = mounted.group.find(relative) {
                return Some(RouteMatch {
                    route,
                    group: Some(&mounted.group),
                    group_name: Some(&mounted.name),
                    params,
                });
            }
        }
        if prefixed {
            return None;
        }

        self.routes.find(path).map(|(route, params)| RouteMatch {
            route,
            group: None,
            group_name: None,
            params,
        })
    }

    /// Build a URL for a machine name. `group.route` addresses group routes.
    pub fn reverse(&self, name: &str, args: &[ParamValue]) -> Result<String, ReverseError> {
        if let Some((group_name, route_name)) = name.split_once('.') {
            let group = self.group(group_name).ok_or_else(|| ReverseError::UnknownGroup {
                group: group_name.to_string(),
            })?;
            return group.reverse(route_name, args);
        }

        let route = self.routes.get(name).ok_or_else(|| ReverseError::UnknownRoute {
            name: name.to_string(),
        })?;
        route.pattern().fill(args)
    }

    pub fn group(&self, name: &str) -> Option<&RouteGroup> {
        self.groups
            .iter()
            .find(|g| g.name == name)
            .map(|g| &g.group)
    }

    /// Top-level routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    /// Mounted groups in lookup order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &RouteGroup)> {
        self.groups.iter().map(|g| (g.name.as_str(), &g.group))
    }

    pub(crate) fn before_filters(&self) -> &[Filter] {
        &self.before
    }

    pub(crate) fn after_filters(&self) -> &[Filter] {
        &self.after
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Noop;

    impl Handler for Noop {}

    fn router() -> Router {
        let mut router = Router::new();
        router
            .register("/", "index", "Index", Noop::default)
            .unwrap()
            .register("/home/:str:name/:int:id", "home", "Home", Noop::default)
            .unwrap();
        router
    }

    #[test]
    fn test_match_top_level() {
        let router = router();
        let matched = router.match_path("/home/frank/42").unwrap();
        assert_eq!(matched.route.name(), "home");
        assert_eq!(matched.route.display_name(), "Home");
        assert!(matched.group.is_none());
        assert_eq!(matched.params.str("name"), Some("frank"));
        assert_eq!(matched.params.int("id"), Some(42));

        assert!(router.match_path("/nope").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut router = router();
        let err = router
            .register("/other", "home", "Other", Noop::default)
            .unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateName { .. }));
    }

    #[test]
    fn test_dotted_name_rejected() {
        let mut router = Router::new();
        let err = router
            .register("/a", "admin.users", "Users", Noop::default)
            .unwrap_err();
        assert!(matches!(err, RoutingError::ReservedCharacter { .. }));

        let err = router.mount("a.b", RouteGroup::new("/a")).unwrap_err();
        assert!(matches!(err, RoutingError::ReservedCharacter { .. }));
    }

    #[test]
    fn test_root_group_prefix_rejected() {
        let mut router = router();
        for prefix in ["/", ""] {
            let err = router.mount("root", RouteGroup::new(prefix)).unwrap_err();
            assert!(matches!(err, RoutingError::RootPrefix { .. }));
        }
        assert_eq!(router.match_path("/").unwrap().route.name(), "index");
    }

    #[test]
    fn test_bad_pattern_rejected_at_registration() {
        let mut router = Router::new();
        let err = router
            .register("/x/:float:v", "x", "X", Noop::default)
            .unwrap_err();
        assert!(matches!(err, RoutingError::Pattern(_)));
    }

    #[test]
    fn test_same_name_allowed_in_different_scopes() {
        let mut router = router();
        let mut admin = RouteGroup::new("/admin");
        admin.register("/", "index", "Admin", Noop::default).unwrap();
        router.mount("admin", admin).unwrap();

        assert_eq!(router.reverse("index", &[]).unwrap(), "/");
        assert_eq!(router.reverse("admin.index", &[]).unwrap(), "/admin/");
    }

    #[test]
    fn test_first_registered_match_wins() {
        let mut router = Router::new();
        router
            .register("/post/:int:id", "by_id", "By id", Noop::default)
            .unwrap()
            .register("/post/:slug", "by_slug", "By slug", Noop::default)
            .unwrap();

        assert_eq!(router.match_path("/post/12").unwrap().route.name(), "by_id");
        assert_eq!(router.match_path("/post/hello").unwrap().route.name(), "by_slug");
    }

    #[test]
    fn test_group_prefix_shadows_top_level() {
        let mut router = Router::new();
        router
            .register("/admin/:str:page", "page", "Page", Noop::default)
            .unwrap();
        let mut admin = RouteGroup::new("/admin");
        admin.register("/users", "users", "Users", Noop::default).unwrap();
        router.mount("admin", admin).unwrap();

        let matched = router.match_path("/admin/users").unwrap();
        assert_eq!(matched.group_name, Some("admin"));
        assert_eq!(matched.route.name(), "users");

        // The prefix is present, so the overlapping top-level route is never used.
        assert!(router.match_path("/admin/settings").is_none());

        // Without the prefix, top-level routes still apply.
        assert!(router.match_path("/administrator").is_none());
    }

    #[test]
    fn test_longest_prefix_first() {
        let mut router = Router::new();
        let mut api = RouteGroup::new("/api");
        api.register("/:path:rest", "catch_all", "Catch all", Noop::default)
            .unwrap();
        let mut v2 = RouteGroup::new("/api/v2");
        v2.register("/items", "items", "Items", Noop::default).unwrap();
        router.mount("api", api).unwrap().mount("v2", v2).unwrap();

        let matched = router.match_path("/api/v2/items").unwrap();
        assert_eq!(matched.group_name, Some("v2"));

        // The shorter prefix still serves what the longer one does not.
        let matched = router.match_path("/api/v2/other").unwrap();
        assert_eq!(matched.group_name, Some("api"));
        assert_eq!(matched.params.str("rest"), Some("v2/other"));
    }

    #[test]
    fn test_reverse_errors() {
        let router = router();
        assert_eq!(
            router.reverse("home", &["frank".into(), 42.into()]).unwrap(),
            "/home/frank/42"
        );
        assert!(matches!(
            router.reverse("home", &["frank".into()]),
            Err(ReverseError::ArgumentCount { expected: 2, given: 1, .. })
        ));
        assert!(matches!(
            router.reverse("missing", &[]),
            Err(ReverseError::UnknownRoute { .. })
        ));
        assert!(matches!(
            router.reverse("nogroup.home", &[]),
            Err(ReverseError::UnknownGroup { .. })
        ));
    }

    #[test]
    fn test_duplicate_group_rejected() {
        let mut router = Router::new();
        router.mount("blog", RouteGroup::new("/blog")).unwrap();
        let err = router.mount("blog", RouteGroup::new("/news")).unwrap_err();
        assert!(matches!(err, RoutingError::DuplicateGroup { .. }));
    }
}

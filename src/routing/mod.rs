//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     pattern string
//!     → pattern.rs (compile placeholders into an anchored regex)
//!     → route.rs (bind name + handler factory, reject duplicates)
//!     → group.rs / router.rs (store in top-level or group scope)
//!
//! Incoming request path
//!     → router.rs (groups by prefix via matcher.rs, then top level)
//!     → pattern.rs (extract typed params)
//!     → Return: RouteMatch or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Deterministic: same path always matches the same route
//! - First registered match wins within a scope
//! - Reverse lookups return errors as values, never panic

pub mod group;
pub mod matcher;
pub mod params;
pub mod pattern;
pub mod route;
pub mod router;

pub use group::RouteGroup;
pub use params::{ParamValue, Params};
pub use pattern::{ParamKind, PatternError, Placeholder, ReverseError, RoutePattern};
pub use route::{Route, RoutingError};
pub use router::{RouteMatch, Router};

//! Application assembly.
//!
//! # Responsibilities
//! - Collect routes, groups, filters and error handlers at startup
//! - Build the immutable [`App`] shared by every request
//! - Pick the session store and template engine from configuration
//!
//! # Design Decisions
//! - Every registration mistake is a `ConfigError` before serving starts
//! - The built `App` is read-only; per-request state lives in the context
//! - One session store per application

use axum::http::StatusCode;
use axum::response::Response;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{validate_config, AppConfig, ConfigError, SessionBackend};
use crate::dispatch::{DispatchError, Handler, RequestContext};
use crate::http::static_files::StaticFiles;
use crate::recovery::{ErrorHandler, ErrorInfo, Recovery};
use crate::routing::{ParamValue, ReverseError, RouteGroup, Router};
use crate::session::{CookieSessionStore, MemorySessionStore, SecureCookie, SessionStore};
use crate::template::{TemplateEngine, TeraTemplates};

/// Builder for an [`App`].
pub struct Application {
    config: AppConfig,
    router: Router,
    error_handlers: Vec<(StatusCode, ErrorHandler)>,
    templates: Option<Arc<dyn TemplateEngine>>,
    sessions: Option<Arc<dyn SessionStore>>,
}

impl Application {
    /// Start from a validated configuration.
    pub fn new(config: AppConfig) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(Self {
            config,
            router: Router::new(),
            error_handlers: Vec::new(),
            templates: None,
            sessions: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Register a top-level route.
    pub fn register<H, F>(
        &mut self,
        pattern: &str,
        name: &str,
        display_name: &str,
        factory: F,
    ) -> Result<&mut Self, ConfigError>
    where
        H: Handler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.router.register(pattern, name, display_name, factory)?;
        Ok(self)
    }

    /// Mount a route group under `name`.
    pub fn mount(&mut self, name: &str, group: RouteGroup) -> Result<&mut Self, ConfigError> {
        self.router.mount(name, group)?;
        Ok(self)
    }

    /// Global before-filter.
    pub fn before<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.router.before(filter);
        self
    }

    /// Global after-filter.
    pub fn after<F>(&mut self, filter: F) -> &mut Self
    where
        F: Fn(&mut RequestContext) -> Result<(), DispatchError> + Send + Sync + 'static,
    {
        self.router.after(filter);
        self
    }

    /// Custom page for `status`. The response status is forced to `status`.
    pub fn error_handler<F>(&mut self, status: StatusCode, handler: F) -> &mut Self
    where
        F: Fn(&ErrorInfo<'_>) -> Response + Send + Sync + 'static,
    {
        self.error_handlers.retain(|(s, _)| *s != status);
        self.error_handlers.push((status, Arc::new(handler)));
        self
    }

    /// Custom 404 page.
    pub fn not_found<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&ErrorInfo<'_>) -> Response + Send + Sync + 'static,
    {
        self.error_handler(StatusCode::NOT_FOUND, handler)
    }

    /// Use `engine` instead of loading `app.template_dir` with Tera.
    pub fn templates(&mut self, engine: impl TemplateEngine + 'static) -> &mut Self {
        self.templates = Some(Arc::new(engine));
        self
    }

    /// Use `store` instead of the configured backend.
    pub fn session_store(&mut self, store: impl SessionStore + 'static) -> &mut Self {
        self.sessions = Some(Arc::new(store));
        self
    }

    /// Reverse a route registered so far.
    pub fn reverse(&self, name: &str, args: &[ParamValue]) -> Result<String, ReverseError> {
        self.router.reverse(name, args)
    }

    /// Freeze the application.
    pub fn build(self) -> Result<App, ConfigError> {
        let config = self.config;
        let codec = SecureCookie::new(&config.app.secret)?;
        let router = Arc::new(self.router);
        let statics = StaticFiles::new(&config.app.root, &config.app.static_dir);

        let templates: Option<Arc<dyn TemplateEngine>> = match (self.templates, &config.app.template_dir) {
            (Some(engine), _) => Some(engine),
            (None, Some(dir)) => Some(Arc::new(TeraTemplates::load(
                &config.app.root.join(dir),
                router.clone(),
                config.app.root.clone(),
                &config.app.static_dir,
            )?)),
            (None, None) => None,
        };

        let sessions: Arc<dyn SessionStore> = match self.sessions {
            Some(store) => store,
            None => match config.session.backend {
                SessionBackend::Cookie => Arc::new(CookieSessionStore::new(
                    codec.clone(),
                    config.cookies.session.clone(),
                    config.session.max_age_secs,
                )),
                SessionBackend::Memory => Arc::new(MemorySessionStore::new(
                    config.cookies.session_id.clone(),
                    config.session.max_age_secs,
                    Duration::from_secs(config.session.idle_timeout_secs),
                )),
            },
        };

        let recovery = self
            .error_handlers
            .into_iter()
            .fold(Recovery::new(config.app.debug), |recovery, (status, handler)| {
                recovery.with_handler(status, handler)
            });

        tracing::info!(
            routes = router.routes().count(),
            groups = router.groups().count(),
            session_backend = ?config.session.backend,
            templates = templates.is_some(),
            debug = config.app.debug,
            "Application built"
        );

        Ok(App {
            config,
            router,
            codec,
            sessions,
            templates,
            recovery,
            statics,
        })
    }
}

/// The built application, shared by all requests.
pub struct App {
    config: AppConfig,
    router: Arc<Router>,
    codec: SecureCookie,
    sessions: Arc<dyn SessionStore>,
    templates: Option<Arc<dyn TemplateEngine>>,
    recovery: Recovery,
    statics: StaticFiles,
}

impl App {
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn codec(&self) -> &SecureCookie {
        &self.codec
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub fn templates(&self) -> Option<&Arc<dyn TemplateEngine>> {
        self.templates.as_ref()
    }

    pub fn recovery(&self) -> &Recovery {
        &self.recovery
    }

    pub fn statics(&self) -> &StaticFiles {
        &self.statics
    }

    pub fn reverse(&self, name: &str, args: &[ParamValue]) -> Result<String, ReverseError> {
        self.router.reverse(name, args)
    }
}

//! Cinder demo server.
//!
//! Loads a TOML config, registers a handful of routes that exercise
//! templates, sessions, flash messages, form validation and xsrf, and serves until SIGINT or
//! SIGTERM.

use async_trait::async_trait;
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use cinder::config::{load_config, AppConfig};
use cinder::dispatch::require_xsrf;
use cinder::form::{Field, Form, Regexp, Required};
use cinder::lifecycle::{listen_for_signals, Shutdown};
use cinder::observability::{init_logging, init_metrics};
use cinder::{
    Application, ConfigError, Handler, HandlerResult, HttpServer, Params, RequestContext,
    RouteGroup,
};

#[derive(Parser, Debug)]
#[command(name = "cinder", version, about = "Cinder demo server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "demos/cinder.toml")]
    config: PathBuf,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[derive(Default)]
struct Index;

#[async_trait]
impl Handler for Index {
    async fn get(&mut self, ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        let visits = ctx.session().get::<u64>("visits").unwrap_or(0) + 1;
        ctx.session_mut().set("visits", visits)?;
        ctx.assign("visits", visits)?;
        ctx.xsrf_token();
        ctx.render("index.html")
    }
}

#[derive(Default)]
struct Hello;

#[async_trait]
impl Handler for Hello {
    async fn get(&mut self, ctx: &mut RequestContext, params: &Params) -> HandlerResult {
        let name = params.str("name").unwrap_or("stranger");
        ctx.text(format!("Hello, {name}!"));
        Ok(())
    }
}

#[derive(Default)]
struct Message;

#[async_trait]
impl Handler for Message {
    async fn post(&mut self, ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        let mut form = Form::new().field(
            Field::new("message", "Message")
                .validator(Required)
                .validator(
                    Regexp::new(r"^.{1,140}$", "must be at most 140 characters")
                        .map_err(cinder::DispatchError::handler)?,
                ),
        );
        if ctx.validate_form(&mut form)? {
            let text = form.value("message").unwrap_or_default().to_string();
            ctx.flash("info", format!("Posted: {text}"));
        } else {
            for error in form.all_errors() {
                ctx.flash("error", error);
            }
        }
        let home = ctx.reverse("index", &[]).map_err(cinder::DispatchError::handler)?;
        ctx.redirect(&home, false)
    }
}

#[derive(Default)]
struct Status;

#[async_trait]
impl Handler for Status {
    async fn get(&mut self, ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        let body = serde_json::json!({
            "route": ctx.route_name(),
            "group": ctx.group_name(),
            "session_keys": ctx.session().len(),
            "elapsed_us": ctx.elapsed().as_micros() as u64,
        });
        ctx.json(&body)
    }
}

fn build_app(config: AppConfig) -> Result<Application, ConfigError> {
    let mut app = Application::new(config)?;
    app.register("/", "index", "Home", Index::default)?
        .register("/hello/:str:name", "hello", "Hello", Hello::default)?
        .register("/message", "message", "Post Message", Message::default)?;
    app.before(require_xsrf);

    let mut api = RouteGroup::new("/api");
    api.register("/status", "status", "Status", Status::default)?;
    app.mount("api", api)?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "cinder starting");

    tracing::info!(
        bind_address = %config.server.bind_address,
        request_timeout_secs = config.server.request_timeout_secs,
        session_backend = ?config.session.backend,
        debug = config.app.debug,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let app = build_app(config)?.build()?;

    let shutdown = Shutdown::new();
    tokio::spawn(listen_for_signals(shutdown.clone()));

    let server = HttpServer::new(app);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

//! Handler lifecycle.

use async_trait::async_trait;
use axum::http::Method;

use crate::dispatch::{DispatchError, RequestContext};
use crate::routing::Params;

pub type HandlerResult = Result<(), DispatchError>;

/// A request handler. A fresh instance is built for every request.
///
/// Override the verbs the route serves; the rest answer with
/// [`DispatchError::MethodNotImplemented`], traced at the default method.
#[async_trait]
pub trait Handler: Send {
    /// Runs before any filter.
    async fn initialize(&mut self, _ctx: &mut RequestContext) -> HandlerResult {
        Ok(())
    }

    async fn get(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::GET))
    }

    async fn post(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::POST))
    }

    async fn put(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::PUT))
    }

    async fn delete(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::DELETE))
    }

    async fn patch(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::PATCH))
    }

    async fn head(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::HEAD))
    }

    async fn options(&mut self, _ctx: &mut RequestContext, _params: &Params) -> HandlerResult {
        Err(DispatchError::method_not_implemented(Method::OPTIONS))
    }

    /// Runs last, after cookies are flushed.
    async fn finish(&mut self, ctx: &mut RequestContext) {
        ctx.close_connection();
    }
}

/// Call the action named by the request method.
pub(crate) async fn invoke(handler: &mut dyn Handler, ctx: &mut RequestContext, params: &Params) -> HandlerResult {
    let method = ctx.method().clone();
    match method {
        Method::GET => handler.get(ctx, params).await,
        Method::POST => handler.post(ctx, params).await,
        Method::PUT => handler.put(ctx, params).await,
        Method::DELETE => handler.delete(ctx, params).await,
        Method::PATCH => handler.patch(ctx, params).await,
        Method::HEAD => handler.head(ctx, params).await,
        Method::OPTIONS => handler.options(ctx, params).await,
        other => Err(DispatchError::method_not_implemented(other)),
    }
}

//! Per-request context handed to filters and handlers.
//!
//! # Responsibilities
//! - Expose the decoded request (method, path, headers, arguments, uploads)
//! - Carry the template data bag, session, flash messages and xsrf token
//! - Accumulate the response until the dispatcher sends it
//!
//! # Design Decisions
//! - Created fresh for every request, never shared or reused
//! - Session and flash are restored once here and flushed once at the end
//! - Result helpers (`text`, `html`, `json`, `render`) set the body but do
//!   not finish the response; `redirect` and `finish_response` do

use axum::body::Bytes;
use axum::http::header::{HeaderName, CONTENT_TYPE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, Version};
use axum::response::Response;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::App;
use crate::dispatch::DispatchError;
use crate::form::Form;
use crate::http::cookies::CookieJar;
use crate::http::request::{self, DecodedRequest, FormData, UploadedFile};
use crate::http::response::ResponseState;
use crate::routing::{ParamValue, Params, ReverseError, RouteMatch};
use crate::session::xsrf::{self, XSRF_FIELD, XSRF_HEADER, XSRF_MAX_AGE};
use crate::session::{Flash, Session};
use crate::template::TemplateError;

pub struct RequestContext {
    app: Arc<App>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    request_id: Option<String>,
    form: FormData,
    files: Vec<UploadedFile>,
    body: Bytes,
    params: Params,
    route_name: String,
    display_name: String,
    group_name: Option<String>,
    data: Map<String, Value>,
    cookies: CookieJar,
    session: Session,
    flash: Flash,
    xsrf: Option<String>,
    response: ResponseState,
    started: Instant,
}

impl RequestContext {
    pub(crate) async fn new(app: Arc<App>, parts: Parts, decoded: DecodedRequest, matched: &RouteMatch<'_>) -> Self {
        let mut cookies = CookieJar::from_headers(&parts.headers);
        let session = app.sessions().restore(&cookies).await;
        let flash = Flash::restore(&mut cookies, app.codec(), &app.config().cookies.flash);

        Self {
            request_id: request::request_id(&parts.headers),
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            form: decoded.form,
            files: decoded.files,
            body: decoded.body,
            params: matched.params.clone(),
            route_name: matched.route.name().to_string(),
            display_name: matched.route.display_name().to_string(),
            group_name: matched.group_name.map(str::to_string),
            data: Map::new(),
            cookies,
            session,
            flash,
            xsrf: None,
            response: ResponseState::new(),
            started: Instant::now(),
            app,
        }
    }

    pub fn app(&self) -> &Arc<App> {
        &self.app
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    pub fn is_post(&self) -> bool {
        self.method == Method::POST
    }

    /// `X-Requested-With: XMLHttpRequest`
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with")
            .is_some_and(|v| v.eq_ignore_ascii_case("XMLHttpRequest"))
    }

    /// When dispatch started for this request.
    pub fn started(&self) -> Instant {
        self.started
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn group_name(&self) -> Option<&str> {
        self.group_name.as_deref()
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Build a URL for `name` (`route` or `group.route`).
    pub fn reverse(&self, name: &str, args: &[ParamValue]) -> Result<String, ReverseError> {
        self.app.router().reverse(name, args)
    }

    /// First query/form value for `name`, or `default`.
    pub fn query_arg(&self, name: &str, default: &str) -> String {
        self.form.get(name).unwrap_or(default).to_string()
    }

    /// Every query/form value for `name`.
    pub fn query_args(&self, name: &str) -> &[String] {
        self.form.get_all(name)
    }

    pub fn has_query_args(&self) -> bool {
        !self.form.is_empty()
    }

    pub fn form(&self) -> &FormData {
        &self.form
    }

    /// Bind `form` to the submitted fields, validate it and expose it to
    /// templates as `form`. Returns whether it is valid.
    pub fn validate_form(&mut self, form: &mut Form) -> Result<bool, DispatchError> {
        form.bind(&self.form);
        let valid = form.validate();
        self.assign("form", &*form)?;
        Ok(valid)
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Raw body for requests that are neither form encoded nor multipart.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn assign<T: Serialize>(&mut self, name: &str, value: T) -> Result<(), DispatchError> {
        let value = serde_json::to_value(value).map_err(DispatchError::handler)?;
        self.data.insert(name.to_string(), value);
        Ok(())
    }

    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name)
    }

    /// `age` 0 means a browser-session cookie; negative deletes it.
    pub fn set_cookie(&mut self, name: &str, value: &str, age: i64) {
        self.cookies.set(name, value, age);
    }

    pub fn secure_cookie(&self, name: &str) -> Option<String> {
        self.cookies.get_secure(self.app.codec(), name)
    }

    pub fn set_secure_cookie(&mut self, name: &str, value: &str, age: i64) -> Result<(), DispatchError> {
        self.cookies.set_secure(self.app.codec(), name, value, age)?;
        Ok(())
    }

    pub fn cookies(&self) -> &CookieJar {
        &self.cookies
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Queue a message for the next request.
    pub fn flash(&mut self, kind: &str, message: impl Into<String>) {
        self.flash.push(kind, message);
    }

    /// Messages carried in from the previous request.
    pub fn flashed(&self, kind: &str) -> &[String] {
        self.flash.messages(kind)
    }

    pub fn has_flashed_messages(&self) -> bool {
        self.flash.has_messages()
    }

    /// The xsrf token for this request. Reuses the client's token while its
    /// cookie is valid, otherwise generates one.
    pub fn xsrf_token(&mut self) -> &str {
        if self.xsrf.is_none() {
            let existing = self.incoming_xsrf();
            self.xsrf = Some(existing.unwrap_or_else(xsrf::generate_token));
        }
        self.xsrf.as_deref().unwrap_or_default()
    }

    /// Hidden `_xsrf` input for forms.
    pub fn xsrf_form_html(&mut self) -> String {
        xsrf::form_html(self.xsrf_token())
    }

    /// Compare the submitted token (form field or header) with the cookie.
    pub fn verify_xsrf(&self) -> bool {
        let Some(expected) = self.incoming_xsrf() else {
            return false;
        };
        let given = self
            .form
            .get(XSRF_FIELD)
            .or_else(|| self.header(XSRF_HEADER));
        given.is_some_and(|given| xsrf::tokens_match(&expected, given))
    }

    fn incoming_xsrf(&self) -> Option<String> {
        self.cookies
            .get_secure(self.app.codec(), &self.app.config().cookies.xsrf)
    }

    pub fn response(&self) -> &ResponseState {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseState {
        &mut self.response
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.response.set_status(status);
    }

    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.set_header(name, value);
    }

    /// Set `Content-Type` from a short kind (`html`, `json`, `text`, ...).
    pub fn set_content_type(&mut self, kind: &str) {
        self.response.set_content_type(kind);
    }

    /// Append to the response body.
    pub fn write(&mut self, chunk: impl AsRef<[u8]>) {
        self.response.write(chunk);
    }

    pub fn text(&mut self, body: impl AsRef<str>) {
        self.response.set_content_type("text");
        self.response.set_body(body.as_ref());
    }

    pub fn html(&mut self, body: impl AsRef<str>) {
        self.response.set_content_type("html");
        self.response.set_body(body.as_ref());
    }

    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), DispatchError> {
        let body = serde_json::to_vec(value).map_err(DispatchError::handler)?;
        self.response.set_content_type("json");
        self.response.set_body(body);
        Ok(())
    }

    /// Render a template with the assigned data plus `flash`, `route`,
    /// `params` and, when a token exists, `xsrf`.
    pub fn render(&mut self, template: &str) -> Result<(), DispatchError> {
        let engine = self
            .app
            .templates()
            .cloned()
            .ok_or(TemplateError::NotConfigured)?;
        let html = engine.render(template, &self.render_data())?;
        if !self.response.headers().contains_key(CONTENT_TYPE) {
            self.response.set_content_type("html");
        }
        self.response.set_body(html);
        Ok(())
    }

    fn render_data(&self) -> Value {
        let mut data = self.data.clone();
        let flash = serde_json::to_value(self.flash.incoming()).unwrap_or_default();
        data.entry("flash").or_insert(flash);
        data.entry("route").or_insert_with(|| {
            serde_json::json!({
                "name": self.route_name,
                "display_name": self.display_name,
                "group": self.group_name,
            })
        });
        data.entry("params").or_insert_with(|| self.params.to_json());
        if let Some(token) = &self.xsrf {
            data.entry("xsrf").or_insert_with(|| Value::String(token.clone()));
            data.entry("xsrf_form_html")
                .or_insert_with(|| Value::String(xsrf::form_html(token)));
        }
        Value::Object(data)
    }

    /// 302 (or 301 when `permanent`) to `url`. Finishes the response.
    pub fn redirect(&mut self, url: &str, permanent: bool) -> Result<(), DispatchError> {
        self.response
            .redirect(url, permanent)
            .map_err(|_| DispatchError::internal(format!("invalid redirect target `{url}`")))
    }

    /// Mark the response complete; remaining before-filters and the action
    /// are skipped.
    pub fn finish_response(&mut self) {
        self.response.finish();
    }

    pub fn is_finished(&self) -> bool {
        self.response.is_finished()
    }

    /// Ask HTTP/1 clients to close the connection after this response.
    pub fn close_connection(&mut self) {
        if self.version <= Version::HTTP_11 {
            self.response.close_connection();
        }
    }

    /// Write session, flash and xsrf state into response cookies.
    pub(crate) async fn flush_state(&mut self) -> Result<(), DispatchError> {
        let app = self.app.clone();
        let names = &app.config().cookies;

        app.sessions().flush(&mut self.session, &mut self.cookies).await?;
        self.flash.flush(&mut self.cookies, app.codec(), &names.flash)?;
        if let Some(token) = &self.xsrf {
            self.cookies
                .set_secure(app.codec(), &names.xsrf, token, XSRF_MAX_AGE)?;
        }
        Ok(())
    }

    pub(crate) fn into_response(self) -> Response {
        let mut response = self.response.into_response();
        self.cookies.write_headers(response.headers_mut());
        response
    }
}

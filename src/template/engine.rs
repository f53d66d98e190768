//! Tera-backed template engine.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tera::{Context, Tera};

use crate::routing::{ParamValue, Router};
use crate::template::{TemplateEngine, TemplateError};

/// Templates loaded from a directory, with `url` and `static_url` helpers.
#[derive(Debug)]
pub struct TeraTemplates {
    tera: Tera,
}

impl TeraTemplates {
    /// Load every non-hidden file below `dir`. Template names are paths
    /// relative to `dir`, separated by `/`.
    pub fn load(dir: &Path, router: Arc<Router>, static_root: PathBuf, static_dir: &str) -> Result<Self, TemplateError> {
        if !dir.is_dir() {
            return Err(TemplateError::MissingDirectory(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        collect_files(dir, dir, &mut files).map_err(|e| TemplateError::Load(e.to_string()))?;

        let mut tera = Tera::default();
        tera.add_template_files(files.iter().map(|(path, name)| (path, Some(name.as_str()))))
            .map_err(|e| TemplateError::Load(error_chain(&e)))?;
        tracing::info!(dir = %dir.display(), templates = files.len(), "Templates loaded");

        Ok(Self::with_helpers(tera, router, static_root, static_dir))
    }

    /// Build from in-memory `(name, source)` pairs.
    pub fn from_raw(
        templates: &[(&str, &str)],
        router: Arc<Router>,
        static_root: PathBuf,
        static_dir: &str,
    ) -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates.iter().copied())
            .map_err(|e| TemplateError::Load(error_chain(&e)))?;
        Ok(Self::with_helpers(tera, router, static_root, static_dir))
    }

    fn with_helpers(mut tera: Tera, router: Arc<Router>, static_root: PathBuf, static_dir: &str) -> Self {
        tera.register_function("url", UrlFunction { router });
        tera.register_function(
            "static_url",
            StaticUrlFunction {
                root: static_root,
                dir: static_dir.trim_matches('/').to_string(),
            },
        );
        Self { tera }
    }

    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }
}

impl TemplateEngine for TeraTemplates {
    fn render(&self, name: &str, data: &Value) -> Result<String, TemplateError> {
        let context = Context::from_serialize(data).map_err(|e| TemplateError::Render {
            name: name.to_string(),
            message: error_chain(&e),
        })?;
        self.tera.render(name, &context).map_err(|e| match e.kind {
            tera::ErrorKind::TemplateNotFound(_) => TemplateError::NotFound(name.to_string()),
            _ => TemplateError::Render {
                name: name.to_string(),
                message: error_chain(&e),
            },
        })
    }
}

fn collect_files(base: &Path, dir: &Path, out: &mut Vec<(PathBuf, String)>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            collect_files(base, &path, out)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push((path, name));
        }
    }
    Ok(())
}

/// Tera's top-level message omits the cause; include the whole chain.
fn error_chain(error: &tera::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// `url(name="group.route", args=[...])`
struct UrlFunction {
    router: Arc<Router>,
}

impl tera::Function for UrlFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let name = args
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("url() requires a string `name`"))?;

        let values = match args.get("args") {
            None => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(to_param).collect::<Result<_, _>>()?,
            Some(single) => vec![to_param(single)?],
        };

        let url = self
            .router
            .reverse(name, &values)
            .unwrap_or_else(|error| error.to_string());
        Ok(Value::String(url))
    }
}

fn to_param(value: &Value) -> tera::Result<ParamValue> {
    match value {
        Value::String(s) => Ok(ParamValue::Str(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(ParamValue::Int)
            .ok_or_else(|| tera::Error::msg(format!("url() argument `{n}` is not an integer"))),
        other => Err(tera::Error::msg(format!(
            "url() arguments must be strings or integers, got `{other}`"
        ))),
    }
}

/// `static_url(path="css/site.css")` → `/static/css/site.css?v=1a2b3c4d`
struct StaticUrlFunction {
    root: PathBuf,
    dir: String,
}

impl tera::Function for StaticUrlFunction {
    fn call(&self, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| tera::Error::msg("static_url() requires a string `path`"))?
            .trim_start_matches('/');

        let file = self.root.join(&self.dir).join(path);
        let modified = std::fs::metadata(&file)
            .and_then(|m| m.modified())
            .map_err(|e| tera::Error::msg(format!("static file `{}`: {e}", file.display())))?;
        let stamp = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();

        let digest = Sha256::digest(stamp.to_string().as_bytes());
        let version = &hex::encode(digest)[..8];
        Ok(Value::String(format!("/{}/{}?v={}", self.dir, path, version)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Handler;
    use serde_json::json;

    #[derive(Default)]
    struct Noop;

    impl Handler for Noop {}

    fn router() -> Arc<Router> {
        let mut router = Router::new();
        router
            .register("/home/:str:name/:int:id", "home", "Home", Noop::default)
            .unwrap();
        Arc::new(router)
    }

    #[test]
    fn test_render_with_url_helper() {
        let engine = TeraTemplates::from_raw(
            &[("link.txt", r#"<a href="{{ url(name="home", args=[who, 42]) }}">{{ who }}</a>"#)],
            router(),
            PathBuf::from("."),
            "static",
        )
        .unwrap();
        let html = engine.render("link.txt", &json!({"who": "frank"})).unwrap();
        assert_eq!(html, r#"<a href="/home/frank/42">frank</a>"#);
    }

    #[test]
    fn test_url_mismatch_renders_error_text() {
        let engine = TeraTemplates::from_raw(
            &[("bad.txt", r#"{{ url(name="home", args=["frank"]) }}"#)],
            router(),
            PathBuf::from("."),
            "static",
        )
        .unwrap();
        let out = engine.render("bad.txt", &json!({})).unwrap();
        assert!(out.contains("takes 2 argument(s)"), "{out}");
    }

    #[test]
    fn test_missing_template() {
        let engine = TeraTemplates::from_raw(&[], router(), PathBuf::from("."), "static").unwrap();
        assert!(matches!(
            engine.render("nope.html", &json!({})),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_directory_and_static_url() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        std::fs::create_dir_all(templates.join("admin")).unwrap();
        std::fs::write(templates.join("admin/index.txt"), r#"{{ static_url(path="site.css") }}"#).unwrap();
        std::fs::write(templates.join(".swap"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("static")).unwrap();
        std::fs::write(dir.path().join("static/site.css"), "body{}").unwrap();

        let engine = TeraTemplates::load(&templates, router(), dir.path().to_path_buf(), "static").unwrap();
        assert_eq!(engine.template_names().count(), 1);

        let out = engine.render("admin/index.txt", &json!({})).unwrap();
        let (path, version) = out.split_once("?v=").unwrap();
        assert_eq!(path, "/static/site.css");
        assert_eq!(version.len(), 8);
        assert!(version.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_missing_directory() {
        let err = TeraTemplates::load(Path::new("/definitely/not/here"), router(), PathBuf::from("."), "static")
            .unwrap_err();
        assert!(matches!(err, TemplateError::MissingDirectory(_)));
    }
}

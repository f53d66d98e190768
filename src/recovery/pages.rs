//! Built-in error pages.

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::Response;
use crate::http::response::SERVER_NAME;
use crate::recovery::trace::Trace;

const GENERIC_APOLOGY: &str = "Sorry, the application encountered an error.";

/// Render the themed page. Every interpolated string is HTML-escaped.
pub fn error_page(status: StatusCode, title: &str, messages: &[String]) -> String {
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", tera::escape_html(m)))
        .collect();
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | {server}</title>
<style>
body {{ background: #dfdfdf; font-family: Helvetica, Arial, sans-serif; margin: 0; }}
main {{ width: 600px; margin: 0 auto; padding-top: 8%; }}
h1 {{ font-size: 72px; color: #0061a5; text-shadow: 2px 2px #f7f7f7; text-align: center; margin: 0; }}
section {{ background: #fff; box-shadow: 0 0 0 1px #a2a2a2, 0 0 20px rgba(0,0,0,.15); padding: 12px 20px; }}
h2 {{ font-size: 20px; color: #8e8e8e; text-align: center; }}
ul {{ list-style: none; padding: 0; font-size: 13px; line-height: 1.4em; color: #888; }}
footer {{ text-align: right; font-size: 11px; color: #aaa; padding-top: 6px; }}
</style>
</head>
<body>
<main>
<h1>{code}</h1>
<section>
<h2>{title}</h2>
<ul>{items}</ul>
</section>
<footer>{server}</footer>
</main>
</body>
</html>
"#,
        code = status.as_u16(),
        title = tera::escape_html(title),
        items = items,
        server = SERVER_NAME,
    )
}

/// Built-in page for `status`. Server errors show `detail` and the trace
/// of the failure site only when `debug` is on.
pub fn default_response(
    status: StatusCode,
    detail: &str,
    trace: Option<&Trace>,
    debug: bool,
) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    let (title, messages) = if status == StatusCode::NOT_FOUND {
        (
            "Page Not Found".to_string(),
            vec![
                "The page you requested does not exist.".to_string(),
                "If you followed a link, check that the address is correct.".to_string(),
            ],
        )
    } else if status.is_server_error() {
        if debug {
            (detail.to_string(), trace_lines(trace))
        } else {
            (reason.to_string(), vec![GENERIC_APOLOGY.to_string()])
        }
    } else {
        (reason.to_string(), vec![detail.to_string()])
    };

    html_response(status, error_page(status, &title, &messages))
}

pub(crate) fn html_response(status: StatusCode, body: String) -> Response {
    let mut response = Response::new(body.into());
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

fn trace_lines(trace: Option<&Trace>) -> Vec<String> {
    match trace {
        Some(trace) if !trace.is_empty() => trace.frames().to_vec(),
        _ => vec!["No stack information available.".to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_escapes_messages() {
        let page = error_page(
            StatusCode::INTERNAL_SERVER_ERROR,
            "<script>alert(1)</script>",
            &["a & b".to_string()],
        );
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(page.contains("a &amp; b"));
        assert!(page.contains("<h1>500</h1>"));
    }

    #[test]
    fn test_production_hides_detail() {
        let trace = Trace::force();
        let response = default_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "secret detail",
            Some(&trace),
            false,
        );
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html; charset=utf-8");
    }

    #[test]
    fn test_trace_lines() {
        let trace = Trace::force();
        assert_eq!(trace_lines(Some(&trace)), trace.frames());
        assert_eq!(trace_lines(None), vec!["No stack information available.".to_string()]);
        assert_eq!(
            trace_lines(Some(&Trace::default())),
            vec!["No stack information available.".to_string()]
        );
    }
}

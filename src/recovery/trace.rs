//! Failure-site stack traces for debug error pages.
//!
//! # Responsibilities
//! - Capture the call stack where a dispatch error is raised
//! - Capture the call stack of a panic before it unwinds
//! - Reduce a raw backtrace to application frames (`file:line`)
//!
//! # Design Decisions
//! - Capturing is off until a debug `Recovery` or `PanicResponder` turns it
//!   on; production builds never pay for backtraces
//! - Once on, capturing stays on for the process
//! - Panic traces are handed from the hook to the responder through a
//!   thread-local, since both run on the panicking thread

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

static CAPTURE: AtomicBool = AtomicBool::new(false);
static PANIC_HOOK: Once = Once::new();

thread_local! {
    static LAST_PANIC: RefCell<Option<Trace>> = const { RefCell::new(None) };
}

/// Symbol prefixes of runtime and library frames.
const FOREIGN_SYMBOLS: &[&str] = &[
    "std::", "core::", "alloc::", "<std::", "<core::", "<alloc::", "tokio::", "<tokio::",
    "tower::", "<tower::", "tower_http::", "<tower_http::", "axum::", "<axum::", "hyper::",
    "<hyper::", "futures", "<futures", "test::", "__rust",
];

/// Paths of toolchain and dependency frames.
const FOREIGN_PATHS: &[&str] = &["/rustc/", "/.cargo/registry/", "/cargo/registry/", "/.cargo/git/"];

/// Capture machinery and error constructors; their callers are the raise site.
const CAPTURE_SYMBOLS: &[&str] = &[
    "cinder::recovery::trace::",
    "cinder::dispatch::error::DispatchError::",
    "<cinder::dispatch::error::DispatchError as ",
];

/// Application frames, innermost first.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Trace {
    frames: Vec<String>,
}

impl Trace {
    /// Capture here when capturing is on, otherwise an empty trace.
    pub fn capture() -> Self {
        if CAPTURE.load(Ordering::Relaxed) {
            Self::force()
        } else {
            Self::default()
        }
    }

    /// Capture here unconditionally.
    pub fn force() -> Self {
        Self::parse(&Backtrace::force_capture().to_string())
    }

    /// Keep the located application frames of a rendered backtrace.
    pub fn parse(rendered: &str) -> Self {
        let mut frames = Vec::new();
        let mut symbol: Option<&str> = None;

        for line in rendered.lines().map(str::trim) {
            if let Some(location) = line.strip_prefix("at ") {
                let Some(name) = symbol.take() else {
                    continue;
                };
                if FOREIGN_SYMBOLS.iter().any(|p| name.starts_with(p))
                    || FOREIGN_PATHS.iter().any(|p| location.contains(p))
                    || (CAPTURE_SYMBOLS.iter().any(|p| name.starts_with(p))
                        && !name.contains("::tests::"))
                {
                    continue;
                }
                frames.push(format_frame(name, location));
            } else if let Some((index, name)) = line.split_once(": ") {
                if index.chars().all(|c| c.is_ascii_digit()) {
                    symbol = Some(name);
                }
            }
        }
        Self { frames }
    }

    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl fmt::Debug for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Trace({} frames)", self.frames.len())
    }
}

fn format_frame(symbol: &str, location: &str) -> String {
    match location.rsplitn(3, ':').collect::<Vec<_>>().as_slice() {
        [_column, line, file] => format!("File: {file} Line: {line} ({symbol})"),
        _ => format!("File: {location} ({symbol})"),
    }
}

/// Turn on failure-site capturing and the panic hook.
pub fn enable_capture() {
    CAPTURE.store(true, Ordering::Relaxed);
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let trace = Trace::force();
            LAST_PANIC.with(|slot| *slot.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

/// The trace recorded by the most recent panic on this thread.
pub fn take_panic_trace() -> Trace {
    LAST_PANIC
        .with(|slot| slot.borrow_mut().take())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERED: &str = "\
   0: std::backtrace::Backtrace::force_capture
             at /rustc/abc/library/std/src/backtrace.rs:310:9
   1: cinder::recovery::trace::Trace::force
             at ./src/recovery/trace.rs:62:21
   2: <app::Broken as cinder::dispatch::handler::Handler>::get::{{closure}}
             at ./src/handlers.rs:40:9
   3: tokio::runtime::task::raw::poll
             at /home/u/.cargo/registry/src/index/tokio-1.40.0/src/runtime/task/raw.rs:255:5
   4: cinder::dispatch::dispatcher::handle::{{closure}}
             at ./src/dispatch/dispatcher.rs:95:9
   5: __libc_start_main
";

    #[test]
    fn test_parse_keeps_application_frames() {
        let trace = Trace::parse(RENDERED);
        assert_eq!(
            trace.frames(),
            &[
                "File: ./src/handlers.rs Line: 40 (<app::Broken as cinder::dispatch::handler::Handler>::get::{{closure}})".to_string(),
                "File: ./src/dispatch/dispatcher.rs Line: 95 (cinder::dispatch::dispatcher::handle::{{closure}})".to_string(),
            ]
        );
    }

    #[test]
    fn test_force_includes_caller() {
        let trace = Trace::force();
        assert!(trace.frames().iter().any(|f| f.contains("test_force_includes_caller")));
    }

    #[test]
    fn test_panic_hook_records_trace() {
        enable_capture();
        let result = std::panic::catch_unwind(|| panic!("recorded"));
        assert!(result.is_err());
        let trace = take_panic_trace();
        assert!(trace.frames().iter().any(|f| f.contains("test_panic_hook_records_trace")));
        assert!(take_panic_trace().is_empty());
    }
}

//! Session, flash and xsrf state carried between requests.
//!
//! # Data Flow
//! ```text
//! Request cookies
//!     → http::cookies::CookieJar (parse)
//!     → store.rs / memory.rs (restore Session once)
//!     → flash.rs (read flash cookie, queue its removal)
//!     → handler and filters mutate Session / Flash
//!     → store.rs / memory.rs (flush Session once)
//!     → flash.rs (write queued messages, 2 s cookie)
//!     → Set-Cookie headers
//! ```
//!
//! # Design Decisions
//! - Every cookie value is sealed by codec.rs (AES-256-GCM)
//! - Decode failures reset to empty state, never reach the client
//! - One store per application, shared behind `Arc<dyn SessionStore>`

pub mod codec;
pub mod flash;
pub mod memory;
pub mod state;
pub mod store;
pub mod xsrf;

pub use codec::{CodecError, SecureCookie};
pub use flash::{Flash, FlashMessages};
pub use memory::MemorySessionStore;
pub use state::{Session, SessionError};
pub use store::{CookieSessionStore, SessionStore};

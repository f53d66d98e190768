//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers)
//!     → static_files.rs (asset and favicon paths, served directly)
//!     → request.rs (query, urlencoded and multipart decoding)
//!     → cookies.rs (incoming cookie map, outgoing Set-Cookie list)
//!     → [dispatch runs filters and the handler]
//!     → response.rs (status, headers, buffered body)
//!     → Send to client
//! ```

pub mod cookies;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use cookies::CookieJar;
pub use request::{DecodedRequest, FormData, UploadedFile, X_REQUEST_ID};
pub use response::{ResponseState, SERVER_NAME};
pub use server::HttpServer;
pub use static_files::StaticFiles;

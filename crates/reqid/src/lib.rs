//! Request identifier assignment for axum services.
//!
//! Mount an [`Assigner`] in front of a router and every request gets a
//! [`RequestId`]: taken from the incoming `x-request-id` header when the
//! client supplied one, generated otherwise. Handlers read it with the
//! `RequestId` extractor, and it is echoed on the response by default.
//!
//! ```rust,ignore
//! let app = Router::new().route("/", get(|id: RequestId| async move { id.to_string() }));
//! let app = Assigner::new().layer(app);
//! ```

pub mod assign;
pub mod config;
pub mod error;
pub mod extract;
pub mod server;

pub use assign::{default_id, Assigner, AssignerBuilder, Generator, IdSource, Resolution};
pub use config::{AppConfig, RequestIdConfig, ServerConfig, DEFAULT_HEADER_NAME};
pub use error::RequestIdError;
pub use extract::RequestId;

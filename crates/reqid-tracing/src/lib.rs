//! Tracing setup shared by request-id services.
//!
//! Provides fmt logging with an optional OTLP exporter, plus the span macro
//! used to correlate every log line of a request with its identifier.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{OtlpProtocol, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};

//! Request identifier assignment.
//!
//! An [`Assigner`] is built once from configuration and mounted in front of a
//! router. For every request it resolves a single identifier with a fixed
//! precedence:
//!
//! 1. The first value of the configured header, if present and non-empty.
//! 2. Otherwise the custom generator, if one was configured.
//! 3. Otherwise a fresh UUID v4.
//!
//! The resolved identifier is attached to the request as a [`RequestId`]
//! extension, optionally echoed on the response under the same header, and
//! recorded on the request span so every downstream log line carries it.
//!
//! The generator only runs when no usable incoming value exists. A custom
//! generator that returns an error is logged and replaced by the default
//! generator; the request always proceeds down the chain.

use std::fmt;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::{BoxError, Router};
use http::request::Parts;
use http::{HeaderName, HeaderValue};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{RequestIdConfig, DEFAULT_HEADER_NAME};
use crate::error::RequestIdError;
use crate::extract::RequestId;

/// Caller-supplied identifier generator.
///
/// Receives the request head (method, URI, headers, extensions).
pub type Generator = Arc<dyn Fn(&Parts) -> Result<String, BoxError> + Send + Sync>;

/// Where a resolved identifier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdSource {
    /// Taken verbatim from the incoming request header.
    Header,
    /// Produced by the configured (or default) generator.
    Generated,
    /// The custom generator failed; the default generator was used instead.
    Fallback,
}

impl IdSource {
    pub fn as_str(self) -> &'static str {
        match self {
            IdSource::Header => "header",
            IdSource::Generated => "generated",
            IdSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for IdSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of resolving one request's identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    pub source: IdSource,
    /// Incoming header bytes, echoed verbatim so non-ASCII ids round-trip.
    header_value: Option<HeaderValue>,
}

impl Resolution {
    fn from_header(value: &HeaderValue) -> Self {
        Self {
            id: decode_latin1(value.as_bytes()),
            source: IdSource::Header,
            header_value: Some(value.clone()),
        }
    }

    fn generated(id: String, source: IdSource) -> Self {
        Self {
            id,
            source,
            header_value: None,
        }
    }
}

/// Map each byte to the code point of the same value, so no header byte is
/// ever rejected or replaced.
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

struct AssignerInner {
    header_name: HeaderName,
    set_response_header: bool,
    generator: Option<Generator>,
}

/// Resolves and attaches a request identifier. Cheap to clone (Arc).
///
/// Configuration is fixed at construction; a single assigner can serve any
/// number of concurrent requests.
#[derive(Clone)]
pub struct Assigner {
    inner: Arc<AssignerInner>,
}

impl fmt::Debug for Assigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assigner")
            .field("header_name", &self.inner.header_name)
            .field("set_response_header", &self.inner.set_response_header)
            .field("custom_generator", &self.inner.generator.is_some())
            .finish()
    }
}

impl Default for Assigner {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Assigner`]. All options are optional.
#[derive(Default)]
pub struct AssignerBuilder {
    header_name: Option<String>,
    set_response_header: Option<bool>,
    generator: Option<Generator>,
}

impl AssignerBuilder {
    pub fn header_name(mut self, name: impl Into<String>) -> Self {
        self.header_name = Some(name.into());
        self
    }

    pub fn set_response_header(mut self, enabled: bool) -> Self {
        self.set_response_header = Some(enabled);
        self
    }

    /// Replace the default UUID v4 generator.
    ///
    /// An `Err` from the generator is not surfaced to the request chain: it is
    /// logged and a UUID is used for that request instead.
    pub fn generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&Parts) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    pub fn build(self) -> Result<Assigner, RequestIdError> {
        let name = self
            .header_name
            .unwrap_or_else(|| DEFAULT_HEADER_NAME.to_string());
        let header_name = HeaderName::try_from(name.as_str())
            .map_err(|source| RequestIdError::InvalidHeaderName { name, source })?;

        Ok(Assigner {
            inner: Arc::new(AssignerInner {
                header_name,
                set_response_header: self.set_response_header.unwrap_or(true),
                generator: self.generator,
            }),
        })
    }
}

impl Assigner {
    /// Assigner with all defaults: `x-request-id`, echo enabled, UUID v4.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AssignerInner {
                header_name: HeaderName::from_static(DEFAULT_HEADER_NAME),
                set_response_header: true,
                generator: None,
            }),
        }
    }

    pub fn builder() -> AssignerBuilder {
        AssignerBuilder::default()
    }

    pub fn from_config(config: &RequestIdConfig) -> Result<Self, RequestIdError> {
        Self::builder()
            .header_name(config.header_name.as_str())
            .set_response_header(config.set_response_header)
            .build()
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.inner.header_name
    }

    pub fn sets_response_header(&self) -> bool {
        self.inner.set_response_header
    }

    /// Resolve the identifier for a request without modifying it.
    ///
    /// Only the first value of a repeated header is considered, and only an
    /// empty value falls through to generation. Bytes outside ASCII are kept
    /// and decoded as latin1.
    pub fn resolve(&self, parts: &Parts) -> Resolution {
        let incoming = parts
            .headers
            .get_all(&self.inner.header_name)
            .iter()
            .next()
            .filter(|value| !value.is_empty());

        if let Some(value) = incoming {
            return Resolution::from_header(value);
        }

        self.generate(parts)
    }

    fn generate(&self, parts: &Parts) -> Resolution {
        let Some(generator) = &self.inner.generator else {
            return Resolution::generated(default_id(), IdSource::Generated);
        };

        match generator(parts) {
            Ok(id) => Resolution::generated(id, IdSource::Generated),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %parts.method,
                    uri = %parts.uri,
                    "Request id generator failed, falling back to UUID"
                );
                Resolution::generated(default_id(), IdSource::Fallback)
            }
        }
    }

    /// Resolve the identifier and attach it to the request's extensions.
    ///
    /// The incoming header map is left untouched.
    pub fn assign<B>(&self, request: http::Request<B>) -> (http::Request<B>, Resolution) {
        let (mut parts, body) = request.into_parts();
        let resolution = self.resolve(&parts);
        parts
            .extensions
            .insert(RequestId::new(resolution.id.clone()));
        (http::Request::from_parts(parts, body), resolution)
    }

    /// Write the resolved identifier onto the response, replacing any value a
    /// downstream handler set under the same header. No-op when echoing is
    /// disabled.
    pub fn echo<B>(&self, resolution: &Resolution, response: &mut http::Response<B>) {
        if !self.inner.set_response_header {
            return;
        }
        let value = match &resolution.header_value {
            Some(value) => Ok(value.clone()),
            None => HeaderValue::from_str(&resolution.id),
        };
        match value {
            Ok(value) => {
                response
                    .headers_mut()
                    .insert(self.inner.header_name.clone(), value);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    header = %self.inner.header_name,
                    "Generated request id is not a valid header value, not echoing"
                );
            }
        }
    }

    /// Mount the assigner on every route of `router`.
    pub fn layer<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router.layer(axum::middleware::from_fn_with_state(
            self,
            request_id_middleware,
        ))
    }
}

/// Default generator: hyphenated lower-case UUID v4.
pub fn default_id() -> String {
    Uuid::new_v4().to_string()
}

/// Per-request middleware: assign, run the rest of the chain inside the
/// request span, then echo the identifier on the response.
pub async fn request_id_middleware(
    State(assigner): State<Assigner>,
    request: Request,
    next: Next,
) -> Response {
    let (request, resolution) = assigner.assign(request);

    let span = reqid_tracing::request_span!(
        resolution.id,
        resolution.source,
        request.method(),
        request.uri()
    );

    async {
        tracing::debug!("Request id assigned");

        let mut response = next.run(request).await;
        tracing::Span::current().record("status", response.status().as_u16());

        assigner.echo(&resolution, &mut response);
        response
    }
    .instrument(span)
    .await
}
